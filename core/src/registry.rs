//! Type and command registries.
//!
//! Both registries preserve declaration order: iteration yields entries in
//! the order they were inserted, which downstream consumers (codec, binder,
//! help renderer) rely on for stable output.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::types::{Command, Field, TypeId, TypeKind};

/// All resolved types of one compilation.
///
/// Lookups go through the map; ordered walks go through the insertion log.
/// Registration rejects duplicate ids instead of silently overwriting.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<TypeId, TypeKind>,
    order: Vec<TypeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resolved type under `id`.
    ///
    /// A second registration of the same id is a [`SchemaError::NameCollision`].
    pub fn insert(&mut self, id: TypeId, kind: TypeKind) -> Result<(), SchemaError> {
        if self.types.contains_key(&id) {
            return Err(SchemaError::NameCollision { id });
        }
        self.order.push(id.clone());
        self.types.insert(id, kind);
        Ok(())
    }

    pub fn get(&self, id: &TypeId) -> Option<&TypeKind> {
        self.types.get(id)
    }

    pub fn contains(&self, id: &TypeId) -> bool {
        self.types.contains_key(id)
    }

    /// Field list of an object type, following reference indirection.
    pub fn fields(&self, id: &TypeId) -> Option<&[Field]> {
        match self.types.get(id)? {
            TypeKind::Object { fields } => Some(fields),
            TypeKind::Reference { target } => self.fields(target),
            _ => None,
        }
    }

    /// Resolves reference indirection to a concrete kind.
    pub fn resolve<'a>(&'a self, kind: &'a TypeKind) -> Option<&'a TypeKind> {
        match kind {
            TypeKind::Reference { target } => {
                let next = self.get(target)?;
                self.resolve(next)
            }
            other => Some(other),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &TypeId> {
        self.order.iter()
    }

    /// `(id, kind)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeId, &TypeKind)> {
        self.order.iter().map(|id| (id, &self.types[id]))
    }
}

/// Dispatch table of one compilation, ordered by declaration.
#[derive(Debug, Default)]
pub struct CommandTable {
    commands: HashMap<String, Command>,
    order: Vec<String>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, command: Command) -> Result<(), SchemaError> {
        if self.commands.contains_key(&command.name) {
            return Err(SchemaError::NameCollision {
                id: TypeId::new(command.name.clone()),
            });
        }
        self.order.push(command.name.clone());
        self.commands.insert(command.name.clone(), command);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Command names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Commands in declaration order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.order.iter().map(|name| &self.commands[name])
    }
}
