//! Two-phase type resolution.
//!
//! Pass one walks the document's declarations in order and only triages:
//! every `class` name is recorded before any body is parsed, so a field
//! may reference a class declared later in the document. Pass two parses
//! class bodies into the registry; pass three parses commands. Nested
//! object fields register under their `-`-joined declaration path, and a
//! duplicate path anywhere is a compile failure.
//!
//! Request and response roots follow the same field grammar. An object
//! root registers its fields under `<cmd>-request` or `<cmd>-response`
//! and may be empty; a reference root borrows the named class outright.
//! Array and primitive roots wrap themselves in one synthetic field whose
//! key is the root's `name`, so the wire value travels bare while the
//! binder and help renderer still have a key to talk about.

use std::collections::HashSet;

use tracing::debug;

use rpckit_core::{
    Command, CommandTable, Field, Payload, Primitive, SchemaError, TypeId, TypeKind, TypeRegistry,
};

use crate::loader::{self, JsonMap};
use crate::normalize;

/// Resolves a parsed schema document into its type registry and command
/// table.
pub(crate) fn resolve(doc: &JsonMap) -> Result<(TypeRegistry, CommandTable), SchemaError> {
    Resolver::new().run(doc)
}

struct Resolver {
    registry: TypeRegistry,
    commands: CommandTable,
    /// Names usable as reference targets, complete before any body parse.
    classes: HashSet<String>,
}

impl Resolver {
    fn new() -> Self {
        Resolver {
            registry: TypeRegistry::new(),
            commands: CommandTable::new(),
            classes: HashSet::new(),
        }
    }

    fn run(mut self, doc: &JsonMap) -> Result<(TypeRegistry, CommandTable), SchemaError> {
        let mut class_decls: Vec<(&str, &JsonMap)> = Vec::new();
        let mut command_decls: Vec<(&str, &JsonMap)> = Vec::new();

        for (name, value) in doc {
            let detail = loader::as_object(name, value)?;
            match loader::str_or(name, detail, "type", "command")? {
                "class" => {
                    let content = loader::get_object(name, detail, "content")?;
                    self.classes.insert(name.clone());
                    class_decls.push((name.as_str(), content));
                }
                "command" => command_decls.push((name.as_str(), detail)),
                other => {
                    return Err(SchemaError::UnknownDeclaration {
                        path: name.clone(),
                        name: other.to_string(),
                    });
                }
            }
        }

        for (name, content) in class_decls {
            let id = TypeId::new(name);
            let fields = self.parse_fields(&id, content, false)?;
            self.registry.insert(id, TypeKind::Object { fields })?;
        }

        for (name, detail) in command_decls {
            let command = self.parse_command(name, detail)?;
            self.commands.insert(command)?;
        }

        debug!(
            types = self.registry.len(),
            commands = self.commands.len(),
            "Resolved schema document"
        );
        Ok((self.registry, self.commands))
    }

    /// Parses one object content map into normalized fields.
    fn parse_fields(
        &mut self,
        owner: &TypeId,
        content: &JsonMap,
        allow_empty: bool,
    ) -> Result<Vec<Field>, SchemaError> {
        if content.is_empty() && !allow_empty {
            return Err(SchemaError::EmptyContent {
                path: owner.as_str().to_string(),
            });
        }

        let mut fields = Vec::with_capacity(content.len());
        for (key, value) in content {
            let path = owner.child(key);
            let detail = loader::as_object(path.as_str(), value)?;
            fields.push(self.build_field(path, key, detail, content)?);
        }
        normalize::sort_required_first(&mut fields);
        Ok(fields)
    }

    fn build_field(
        &mut self,
        path: TypeId,
        key: &str,
        detail: &JsonMap,
        siblings: &JsonMap,
    ) -> Result<Field, SchemaError> {
        let type_name = loader::get_str(path.as_str(), detail, "type")?;
        let kind = self.resolve_kind(&path, type_name, detail)?;
        let meta = normalize::field_meta(&path, detail, siblings, &kind)?;
        Ok(Field {
            key: key.to_string(),
            kind,
            required: meta.required,
            default: meta.default,
            opt: meta.opt,
            condition: meta.condition,
            desc: meta.desc,
        })
    }

    /// Resolves a declared type name at `path` into a concrete kind,
    /// registering any object it defines along the way.
    fn resolve_kind(
        &mut self,
        path: &TypeId,
        type_name: &str,
        detail: &JsonMap,
    ) -> Result<TypeKind, SchemaError> {
        if let Some(primitive) = Primitive::from_name(type_name) {
            return Ok(TypeKind::Primitive(primitive));
        }
        match type_name {
            "object" => {
                let content = loader::get_object(path.as_str(), detail, "content")?;
                let fields = self.parse_fields(path, content, false)?;
                self.registry
                    .insert(path.clone(), TypeKind::Object { fields })?;
                Ok(TypeKind::Reference {
                    target: path.clone(),
                })
            }
            "array" => {
                let element = self.resolve_element(path, detail)?;
                Ok(TypeKind::Array {
                    element: Box::new(element),
                })
            }
            name if self.classes.contains(name) => Ok(TypeKind::Reference {
                target: TypeId::new(name),
            }),
            _ => Err(SchemaError::UnknownType {
                path: path.as_str().to_string(),
                name: type_name.to_string(),
            }),
        }
    }

    /// Parses an array's single content entry into its element field.
    ///
    /// The element keeps its declared key and description for shape
    /// illustrations but carries none of the other field metadata.
    fn resolve_element(&mut self, path: &TypeId, detail: &JsonMap) -> Result<Field, SchemaError> {
        let content = loader::get_object(path.as_str(), detail, "content")?;
        if content.len() != 1 {
            return Err(SchemaError::MalformedArrayContent {
                path: path.as_str().to_string(),
                count: content.len(),
            });
        }
        let Some((key, value)) = content.iter().next() else {
            return Err(SchemaError::MalformedArrayContent {
                path: path.as_str().to_string(),
                count: 0,
            });
        };
        let element_path = path.child(key);
        let element_detail = loader::as_object(element_path.as_str(), value)?;
        let type_name = loader::get_str(element_path.as_str(), element_detail, "type")?;
        let kind = self.resolve_kind(&element_path, type_name, element_detail)?;
        let desc = loader::desc_text(element_path.as_str(), element_detail)?;
        Ok(Field::new(key.clone(), kind).with_desc(desc))
    }

    fn parse_command(&mut self, name: &str, detail: &JsonMap) -> Result<Command, SchemaError> {
        let desc = loader::desc_text(name, detail)?;

        let request_root = loader::get_object(name, detail, "request")?;
        let request = self.parse_request(name, request_root)?;
        let mut command = Command::new(name, request, desc);

        if let Some(response_root) = loader::opt_object(name, detail, "response")? {
            command = command.with_response(self.parse_response(name, response_root)?);
        }

        let introduction = loader::text_block(name, detail, "introduction")?;
        if !introduction.is_empty() {
            command = command.with_introduction(introduction);
        }

        if let Some(value) = detail.get("example") {
            for example in loader::parse_examples(name, value)? {
                command = command.with_example(example);
            }
        }
        if let Some(value) = detail.get("error") {
            for note in loader::parse_error_notes(name, value)? {
                command = command.with_error(note);
            }
        }

        Ok(command)
    }

    fn parse_request(&mut self, cmd: &str, root: &JsonMap) -> Result<Payload, SchemaError> {
        let path = TypeId::from_segments(&[cmd, "request"]);
        let type_name = loader::get_str(path.as_str(), root, "type")?;

        if Primitive::from_name(type_name).is_some() {
            return Err(SchemaError::PrimitiveRequestRoot {
                path: path.as_str().to_string(),
                name: type_name.to_string(),
            });
        }
        if type_name == "object" {
            let content = loader::get_object(path.as_str(), root, "content")?;
            let fields = self.parse_fields(&path, content, true)?;
            self.registry
                .insert(path.clone(), TypeKind::Object { fields })?;
            return Ok(Payload::Object { target: path });
        }
        if type_name == "array" {
            let name = loader::str_or(path.as_str(), root, "name", "data")?;
            return self.wrap_single(&path, name, root);
        }
        if self.classes.contains(type_name) {
            return Ok(Payload::Object {
                target: TypeId::new(type_name),
            });
        }
        Err(SchemaError::UnknownType {
            path: path.as_str().to_string(),
            name: type_name.to_string(),
        })
    }

    fn parse_response(&mut self, cmd: &str, root: &JsonMap) -> Result<Payload, SchemaError> {
        let path = TypeId::from_segments(&[cmd, "response"]);
        let type_name = loader::get_str(path.as_str(), root, "type")?;

        if type_name == "object" {
            let content = loader::get_object(path.as_str(), root, "content")?;
            let fields = self.parse_fields(&path, content, true)?;
            self.registry
                .insert(path.clone(), TypeKind::Object { fields })?;
            return Ok(Payload::Object { target: path });
        }
        if self.classes.contains(type_name) {
            return Ok(Payload::Object {
                target: TypeId::new(type_name),
            });
        }
        // Primitive and array roots travel bare; `name` keys the wrapper.
        let name = loader::get_str(path.as_str(), root, "name")?;
        self.wrap_single(&path, name, root)
    }

    /// Builds the synthetic single-field payload for a bare root.
    ///
    /// The root map doubles as the field declaration, so `required`,
    /// `default`, and the other metadata keys are read from it directly.
    fn wrap_single(
        &mut self,
        path: &TypeId,
        name: &str,
        root: &JsonMap,
    ) -> Result<Payload, SchemaError> {
        let mut wrapper = JsonMap::new();
        wrapper.insert(name.to_string(), serde_json::Value::Object(root.clone()));
        let field = self.build_field(path.child(name), name, root, &wrapper)?;
        Ok(Payload::Single {
            field: Box::new(field),
        })
    }
}
