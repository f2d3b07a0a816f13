use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rpckit_compiler::Protocol;
use rpckit_core::{BindingError, ValidationError};
use serde_json::Value as Json;

#[derive(Debug, Parser)]
#[command(name = "rpckit")]
#[command(about = "Compile RPC schema documents and exercise their commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a schema document and report what it declares.
    Check(CheckArgs),
    /// List the commands a schema declares.
    List(ListArgs),
    /// Render the help page of a command or an invocation mode.
    Describe(DescribeArgs),
    /// Bind console arguments into a request and print its wire form.
    Call(CallArgs),
    /// Validate a wire message and reprint it in normalized key order.
    Decode(DecodeArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Schema JSON file.
    schema: PathBuf,
    /// Invocation-mode JSON file to compile alongside the schema.
    #[arg(long)]
    modes: Option<PathBuf>,
    /// Print the compiled model as JSON instead of the summary line.
    #[arg(long)]
    dump: bool,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Schema JSON file.
    schema: PathBuf,
}

#[derive(Debug, Args)]
struct DescribeArgs {
    /// Schema JSON file.
    schema: PathBuf,
    /// Command or mode name.
    name: String,
    /// Invocation-mode JSON file; mode pages need one.
    #[arg(long)]
    modes: Option<PathBuf>,
    /// Console sub-page: one command's name, or `all` for every page.
    #[arg(long)]
    sub: Option<String>,
}

#[derive(Debug, Args)]
struct CallArgs {
    /// Schema JSON file.
    schema: PathBuf,
    /// Command to invoke.
    command: String,
    /// Console arguments, `-opt=value` by name or bare values by position.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct DecodeArgs {
    /// Schema JSON file.
    schema: PathBuf,
    /// Command the message belongs to.
    command: String,
    /// Read the message from a file instead of stdin.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Treat the message as a response instead of a request.
    #[arg(long)]
    response: bool,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::List(args) => run_list(args),
        Command::Describe(args) => run_describe(args),
        Command::Call(args) => run_call(args),
        Command::Decode(args) => run_decode(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let protocol = load_protocol(&args.schema, args.modes.as_deref())?;
    if args.dump {
        println!("{}", pretty(&model_dump(&protocol)?)?);
        return Ok(());
    }
    println!(
        "Compiled '{}': {} type(s), {} command(s), {} mode(s).",
        args.schema.display(),
        protocol.registry.len(),
        protocol.commands.len(),
        protocol.modes.len()
    );
    Ok(())
}

fn run_list(args: ListArgs) -> Result<(), String> {
    let protocol = load_protocol(&args.schema, None)?;
    for command in protocol.commands.commands() {
        println!("{}", summary_line(&command.name, &command.introduction));
    }
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<(), String> {
    let protocol = load_protocol(&args.schema, args.modes.as_deref())?;

    // A plain name is looked up as a command first; `--sub` only makes
    // sense inside a mode, so it skips straight to the mode pages.
    if args.sub.is_none() {
        if let Some(page) = protocol.help(&args.name) {
            print!("{page}");
            return Ok(());
        }
    }
    match protocol.mode_help(&args.name, args.sub.as_deref(), "") {
        Some(page) => {
            print!("{page}");
            Ok(())
        }
        None => Err(format!(
            "No command or mode named '{}' in '{}'",
            args.name,
            args.schema.display()
        )),
    }
}

fn run_call(args: CallArgs) -> Result<(), String> {
    let protocol = load_protocol(&args.schema, None)?;
    let record = protocol
        .bind_request(&args.command, &args.args)
        .map_err(bind_failure)?;
    let wire = protocol
        .encode_request(&args.command, &record)
        .map_err(rpc_failure)?;
    println!("{}", pretty(&wire)?);
    Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<(), String> {
    let raw = match &args.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            buffer
        }
    };
    let wire: Json =
        serde_json::from_str(&raw).map_err(|err| format!("Message is not valid JSON: {err}"))?;

    let protocol = load_protocol(&args.schema, None)?;
    let normalized = if args.response {
        match protocol
            .decode_response(&args.command, &wire)
            .map_err(rpc_failure)?
        {
            Some(record) => protocol
                .encode_response(&args.command, &record)
                .map_err(rpc_failure)?
                .unwrap_or(wire),
            // Commands without a declared response keep their payload as-is.
            None => wire,
        }
    } else {
        let record = protocol
            .decode_request(&args.command, &wire)
            .map_err(rpc_failure)?;
        protocol
            .encode_request(&args.command, &record)
            .map_err(rpc_failure)?
    };
    println!("{}", pretty(&normalized)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_protocol(schema: &Path, modes: Option<&Path>) -> Result<Protocol, String> {
    let schema_text = fs::read_to_string(schema)
        .map_err(|err| format!("Failed to read '{}': {err}", schema.display()))?;
    let compiled = match modes {
        Some(modes_path) => {
            let modes_text = fs::read_to_string(modes_path)
                .map_err(|err| format!("Failed to read '{}': {err}", modes_path.display()))?;
            rpckit_compiler::compile_with_modes(&schema_text, &modes_text)
        }
        None => rpckit_compiler::compile(&schema_text),
    };
    compiled.map_err(|err| format!("Failed to compile '{}': {err}", schema.display()))
}

/// One line for the command listing: the name, padded, then the first
/// line of its introduction.
fn summary_line(name: &str, introduction: &str) -> String {
    let first = introduction.lines().next().unwrap_or_default();
    if first.is_empty() {
        name.to_string()
    } else {
        format!("{name:<24} {first}")
    }
}

/// Compiled model as one JSON document: registered types in registration
/// order, then commands in declaration order. Modes appear only when a
/// mode document was compiled in.
fn model_dump(protocol: &Protocol) -> Result<Json, String> {
    let mut types = serde_json::Map::new();
    for (id, kind) in protocol.registry.iter() {
        types.insert(id.to_string(), serde_json::to_value(kind).map_err(dump_failure)?);
    }

    let mut dump = serde_json::Map::new();
    dump.insert("types".to_string(), Json::Object(types));
    dump.insert(
        "commands".to_string(),
        serde_json::to_value(protocol.commands.commands().collect::<Vec<_>>())
            .map_err(dump_failure)?,
    );
    if !protocol.modes.is_empty() {
        dump.insert(
            "modes".to_string(),
            serde_json::to_value(&protocol.modes).map_err(dump_failure)?,
        );
    }
    Ok(Json::Object(dump))
}

fn rpc_failure(err: ValidationError) -> String {
    format!("{err} (rpc code {})", err.code())
}

fn dump_failure(err: serde_json::Error) -> String {
    format!("Failed to serialize model: {err}")
}

fn bind_failure(err: BindingError) -> String {
    format!("{err} (rpc code {})", err.code())
}

fn pretty(json: &Json) -> Result<String, String> {
    serde_json::to_string_pretty(json).map_err(|err| format!("Failed to serialize output: {err}"))
}
