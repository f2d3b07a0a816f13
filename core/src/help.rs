//! Terminal help rendering.
//!
//! A command help is a fixed chapter sequence: usage line, description,
//! `Arguments:`, `Request:`, `Response:`, `Examples:`, `Errors:`. Chapters
//! with no content print a literal `\tnone` marker. Argument and shape
//! lines are padded to a fixed summary column that widens in fixed steps
//! when a format overflows it.
//!
//! Usage formats encode the field type: `$k$` double, `*k*` bool, `"k"`
//! string, `{k}` object, `[k]` array, bare for int and uint. Required
//! fields wrap in `< >`, optional in `( )`, and consecutive conditional
//! fields join with `|`.

use crate::registry::{CommandTable, TypeRegistry};
use crate::types::{Command, Field, FieldDefault, ModeDoc, Payload, Primitive, TypeKind};

const FORMAT_COLUMN: usize = 40;
const FORMAT_STEP: usize = 20;

const USAGE_INDENT: &str = "        ";
const ARGUMENT_INDENT: &str = " ";
const SUB_ARGUMENT_INDENT: &str = "  ";
const COMMANDS_INDENT: &str = "  ";
const EXAMPLE_REQUEST_PREFIX: &str = ">> ";
const EXAMPLE_RESPONSE_PREFIX: &str = "<< ";
const ERROR_PREFIX: &str = "* ";

/// A chapter line: a format column and optional flowed text lines.
type Entry = (String, Option<Vec<String>>);

/// Renders the full help text of one command.
pub fn render_command_help(registry: &TypeRegistry, command: &Command) -> String {
    let fields = payload_fields(registry, &command.request);
    let mut out = String::new();

    out.push_str("\nUsage:\n");
    out.push_str(USAGE_INDENT);
    out.push_str(&usage_line(command, fields));
    out.push_str("\n\n");

    if !command.desc.is_empty() {
        for line in flow_lines(&command.desc, "") {
            out.push_str(&line);
        }
        out.push('\n');
    }

    push_chapter(&mut out, "Arguments:\n", &argument_entries(fields));
    push_chapter(
        &mut out,
        "Request:\n",
        &request_entries(registry, &command.request),
    );
    push_chapter(
        &mut out,
        "Response:\n",
        &response_entries(registry, command.response.as_ref()),
    );
    push_chapter(&mut out, "Examples:\n", &example_entries(command));
    push_chapter(&mut out, "Errors:\n", &error_entries(command));

    out
}

/// Renders mode-level help.
///
/// Non-console modes print their usage, description and the caller-supplied
/// options text. The console mode adds a command list when no sub command
/// is given (prefixing the overview only when options are non-empty),
/// expands `all` to every command help, and returns an empty string for an
/// unknown sub command.
pub fn render_mode_help(
    registry: &TypeRegistry,
    commands: &CommandTable,
    mode: &ModeDoc,
    sub: Option<&str>,
    options: &str,
) -> String {
    if !mode.is_console() {
        return mode_overview(mode, options);
    }
    match sub {
        None | Some("") => {
            let mut out = String::new();
            if !options.is_empty() {
                out.push_str(&mode_overview(mode, options));
            }
            out.push_str("Commands:\n");
            for command in commands.commands() {
                let label = format!("{COMMANDS_INDENT}{}", command.name);
                out.push_str(&label);
                out.push_str(&column_pad(&label));
                for line in flow_lines(&command.introduction, &" ".repeat(FORMAT_COLUMN)) {
                    out.push_str(&line);
                }
            }
            out
        }
        Some("all") => {
            let mut out = String::new();
            for command in commands.commands() {
                out.push_str(&render_command_help(registry, command));
            }
            out
        }
        Some(name) => match commands.get(name) {
            Some(command) => render_command_help(registry, command),
            None => String::new(),
        },
    }
}

fn mode_overview(mode: &ModeDoc, options: &str) -> String {
    let mut out = String::new();
    out.push_str("\nUsage:\n");
    out.push_str(USAGE_INDENT);
    out.push_str(&mode.usage);
    out.push_str("\n\n");
    if !mode.desc.is_empty() {
        for line in flow_lines(&mode.desc, "") {
            out.push_str(&line);
        }
        out.push('\n');
    }
    out.push_str("Options:\n");
    out.push_str(options);
    out.push('\n');
    out
}

fn payload_fields<'a>(registry: &'a TypeRegistry, payload: &'a Payload) -> &'a [Field] {
    match payload {
        Payload::Object { target } => registry.fields(target).unwrap_or(&[]),
        Payload::Single { field } => std::slice::from_ref(field),
    }
}

fn object_fields<'a>(registry: &'a TypeRegistry, kind: &'a TypeKind) -> &'a [Field] {
    match kind {
        TypeKind::Object { fields } => fields,
        TypeKind::Reference { target } => registry.fields(target).unwrap_or(&[]),
        _ => &[],
    }
}

/// Pads a format column out to the summary column, widening in fixed steps
/// when the format is too long. A format exactly at the column gets no
/// separator.
fn column_pad(s: &str) -> String {
    let len = s.chars().count();
    let mut target = FORMAT_COLUMN;
    if len > target {
        target += ((len - target) / FORMAT_STEP + 1) * FORMAT_STEP;
    }
    " ".repeat(target - len)
}

/// Splits text at embedded newlines. The first line carries no prefix,
/// continuations take `indent`, blank lines collapse, and every line is
/// newline terminated.
fn flow_lines(text: &str, indent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for segment in text.split('\n') {
        let segment = segment.trim_start();
        if segment.is_empty() {
            continue;
        }
        if lines.is_empty() {
            lines.push(format!("{segment}\n"));
        } else {
            lines.push(format!("{indent}{segment}\n"));
        }
    }
    if lines.is_empty() {
        lines.push("\n".to_string());
    }
    lines
}

fn push_chapter(out: &mut String, title: &str, entries: &[Entry]) {
    out.push_str(title);
    if entries.is_empty() {
        out.push_str("\tnone\n\n");
        return;
    }
    for (format, lines) in entries {
        out.push_str(format);
        if let Some(lines) = lines {
            for line in lines {
                out.push_str(line);
            }
        }
    }
    out.push('\n');
}

fn usage_format(field: &Field) -> String {
    let base = match &field.kind {
        TypeKind::Primitive(Primitive::Double) => format!("${}$", field.key),
        TypeKind::Primitive(Primitive::Bool) => format!("*{}*", field.key),
        TypeKind::Primitive(Primitive::String) => format!("\"{}\"", field.key),
        TypeKind::Primitive(_) => field.key.clone(),
        TypeKind::Array { .. } => format!("[{}]", field.key),
        TypeKind::Object { .. } | TypeKind::Reference { .. } => format!("{{{}}}", field.key),
    };
    match &field.opt {
        Some(opt) if matches!(field.kind, TypeKind::Primitive(Primitive::Bool)) => {
            format!("-{opt}|-no{opt}{base}")
        }
        Some(opt) => format!("-{opt}={base}"),
        None => base,
    }
}

fn usage_line(command: &Command, fields: &[Field]) -> String {
    let mut usage = command.name.clone();
    let mut previous_conditional = false;
    for field in fields {
        let format = usage_format(field);
        let (open, close) = if field.required { ("<", ">") } else { ("(", ")") };
        let conditional = field
            .condition
            .as_ref()
            .is_some_and(|c| !c.terms.is_empty());
        if conditional && previous_conditional {
            usage.push('|');
        } else {
            usage.push(' ');
        }
        usage.push_str(&format!("{open}{format}{close}"));
        previous_conditional = conditional;
    }
    usage
}

fn summary_text(kind: &TypeKind, required: bool, default: &FieldDefault, desc: &str) -> String {
    let mut tips = vec![
        kind.wire_name().to_string(),
        if required { "required" } else { "optional" }.to_string(),
    ];
    if let Some(literal) = default.literal() {
        tips.push(format!("default={literal}"));
    }
    format!("({}) {}", tips.join(", "), desc)
}

fn argument_entries(fields: &[Field]) -> Vec<Entry> {
    let mut entries = Vec::new();
    for field in fields {
        if let Some(condition) = &field.condition {
            entries.push((
                format!("{ARGUMENT_INDENT}{ARGUMENT_INDENT}(if {})\n", condition.raw),
                None,
            ));
        }
        let format = format!("{ARGUMENT_INDENT}{}", usage_format(field));
        let padded = format!("{format}{}", column_pad(&format));
        let summary = summary_text(&field.kind, field.required, &field.default, &field.desc);
        entries.push((padded, Some(flow_lines(&summary, &" ".repeat(FORMAT_COLUMN)))));
    }
    entries
}

fn placeholder(primitive: Primitive, name: Option<&str>) -> String {
    match name {
        Some(name) => match primitive {
            Primitive::String => format!("\"{name}\""),
            _ => name.to_string(),
        },
        None => match primitive {
            Primitive::Int | Primitive::Uint => "0".to_string(),
            Primitive::Double => "0.0".to_string(),
            Primitive::Bool => "true|false".to_string(),
            Primitive::String => "\"\"".to_string(),
        },
    }
}

/// One shape line for a field. Array fields contribute only their condition
/// marker; their brackets come from [`sub_shape`]. Pod fields show a sample
/// placeholder and a trailing comma when they are not last.
fn field_param_entry(entries: &mut Vec<Entry>, field: &Field, indent: &str, trailing_comma: bool) {
    if let Some(condition) = &field.condition {
        entries.push((format!("{indent}(if {})\n", condition.raw), None));
    }
    if matches!(field.kind, TypeKind::Array { .. }) {
        return;
    }
    let mut key_fmt = format!("\"{}\": ", field.key);
    if let Some(primitive) = field.kind.as_primitive() {
        key_fmt.push_str(&placeholder(primitive, None));
        if trailing_comma {
            key_fmt.push(',');
        }
    }
    let line = format!("{indent}{key_fmt}");
    let padded = format!("{line}{}", column_pad(&line));
    let summary = summary_text(&field.kind, field.required, &field.default, &field.desc);
    entries.push((padded, Some(flow_lines(&summary, &" ".repeat(FORMAT_COLUMN)))));
}

fn sub_shape(registry: &TypeRegistry, kind: &TypeKind, indent: &str, entries: &mut Vec<Entry>) {
    let next = format!("{indent}{SUB_ARGUMENT_INDENT}");
    match kind {
        TypeKind::Array { element } => {
            entries.push((format!("{indent}[\n"), None));
            if matches!(element.kind, TypeKind::Array { .. }) {
                sub_shape(registry, &element.kind, &next, entries);
            } else {
                field_param_entry(entries, element, &next, false);
                if !element.kind.is_primitive() {
                    sub_shape(registry, &element.kind, &next, entries);
                }
            }
            entries.push((format!("{indent}]\n"), None));
        }
        TypeKind::Object { .. } | TypeKind::Reference { .. } => {
            entries.push((format!("{indent}{{\n"), None));
            let fields = object_fields(registry, kind);
            for (index, field) in fields.iter().enumerate() {
                field_param_entry(entries, field, &next, index + 1 != fields.len());
                if !field.kind.is_primitive() {
                    sub_shape(registry, &field.kind, &next, entries);
                }
            }
            entries.push((format!("{indent}}}\n"), None));
        }
        TypeKind::Primitive(_) => {}
    }
}

fn shape_body(registry: &TypeRegistry, fields: &[Field], entries: &mut Vec<Entry>) {
    let next = format!("{ARGUMENT_INDENT}{SUB_ARGUMENT_INDENT}");
    for (index, field) in fields.iter().enumerate() {
        field_param_entry(entries, field, &next, index + 1 != fields.len());
        if !field.kind.is_primitive() {
            sub_shape(registry, &field.kind, &next, entries);
        }
    }
}

fn is_array_root(payload: &Payload) -> bool {
    matches!(payload, Payload::Single { field } if matches!(field.kind, TypeKind::Array { .. }))
}

fn request_entries(registry: &TypeRegistry, payload: &Payload) -> Vec<Entry> {
    let fields = payload_fields(registry, payload);
    let mut entries = Vec::new();
    if fields.is_empty() {
        entries.push((format!("{ARGUMENT_INDENT}\"param\" : {{}}\n"), None));
        return entries;
    }
    entries.push((format!("{ARGUMENT_INDENT}\"param\" :\n"), None));
    let array_root = is_array_root(payload);
    if !array_root {
        entries.push((format!("{ARGUMENT_INDENT}{{\n"), None));
    }
    shape_body(registry, fields, &mut entries);
    if !array_root {
        entries.push((format!("{ARGUMENT_INDENT}}}\n"), None));
    }
    entries
}

fn response_entries(registry: &TypeRegistry, response: Option<&Payload>) -> Vec<Entry> {
    let Some(payload) = response else {
        return Vec::new();
    };
    if let Payload::Single { field } = payload {
        if let Some(primitive) = field.kind.as_primitive() {
            // A pod result shows its declared name in place of a sample.
            let mut entries = Vec::new();
            if let Some(condition) = &field.condition {
                entries.push((format!("{ARGUMENT_INDENT}(if {})\n", condition.raw), None));
            }
            let line = format!(
                "{ARGUMENT_INDENT}\"result\": {}",
                placeholder(primitive, Some(&field.key))
            );
            let padded = format!("{line}{}", column_pad(&line));
            let summary =
                summary_text(&field.kind, field.required, &field.default, &field.desc);
            entries.push((padded, Some(flow_lines(&summary, &" ".repeat(FORMAT_COLUMN)))));
            return entries;
        }
    }
    let fields = payload_fields(registry, payload);
    if fields.is_empty() {
        return Vec::new();
    }
    let mut entries = vec![(format!("{ARGUMENT_INDENT}\"result\" :\n"), None)];
    let array_root = is_array_root(payload);
    if !array_root {
        entries.push((format!("{ARGUMENT_INDENT}{{\n"), None));
    }
    shape_body(registry, fields, &mut entries);
    if !array_root {
        entries.push((format!("{ARGUMENT_INDENT}}}\n"), None));
    }
    entries
}

fn example_entries(command: &Command) -> Vec<Entry> {
    let mut entries = Vec::new();
    for (index, example) in command.examples.iter().enumerate() {
        let lead = if index == 0 { "" } else { "\n" };
        if let Some(request) = &example.request {
            let prefix = format!("{lead}{EXAMPLE_REQUEST_PREFIX}");
            let continuation = " ".repeat(prefix.chars().count());
            entries.push((prefix, Some(flow_lines(request, &continuation))));
        }
        if let Some(response) = &example.response {
            let continuation = " ".repeat(EXAMPLE_RESPONSE_PREFIX.len());
            entries.push((
                EXAMPLE_RESPONSE_PREFIX.to_string(),
                Some(flow_lines(response, &continuation)),
            ));
        }
    }
    entries
}

fn error_entries(command: &Command) -> Vec<Entry> {
    command
        .errors
        .iter()
        .map(|note| {
            (
                ERROR_PREFIX.to_string(),
                Some(flow_lines(note, &" ".repeat(ERROR_PREFIX.len()))),
            )
        })
        .collect()
}
