//! Per-call traversal state: the registry and options every schema sees, plus
//! the scope of the object or union body currently being processed.

use std::collections::HashMap;

use crate::{
    bytes::Cursor,
    errors::{Error, Result},
    options::Options,
    registry::Registry,
    schema::{Candidate, Layout, SchemaRef},
    value::{Map, Value},
};

/// Sibling fields visible to `depend`, `link` and `exit` inside an object or
/// union body.
pub struct Scope<'s> {
    layout: &'s Layout,
    target: Target<'s>,
    offsets: HashMap<String, usize>,
    exit: bool,
}

enum Target<'s> {
    /// Unpack: the value under construction.
    Building(Value),
    /// Pack: the caller's input.
    Packing(&'s Value),
}

impl<'s> Scope<'s> {
    pub(crate) fn unpacking(layout: &'s Layout) -> Self {
        let target = if layout.is_positional() {
            Value::Array(Vec::with_capacity(layout.len()))
        } else {
            Value::Object(Map::with_capacity(layout.len()))
        };
        Self {
            layout,
            target: Target::Building(target),
            offsets: HashMap::new(),
            exit: false,
        }
    }

    pub(crate) fn packing(layout: &'s Layout, value: &'s Value) -> Self {
        Self {
            layout,
            target: Target::Packing(value),
            offsets: HashMap::new(),
            exit: false,
        }
    }

    /// Value of a sibling field: already unpacked, or taken from the input
    /// being packed.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match &self.target {
            Target::Building(value) => value.get(key),
            Target::Packing(value) => value.get(key),
        }
    }

    /// Declared schema of a sibling field.
    pub fn field_schema(&self, key: &str) -> Option<&'s Candidate> {
        self.layout.get(key)
    }

    /// Output position at which a sibling field started packing.
    pub fn offset(&self, key: &str) -> Option<usize> {
        self.offsets.get(key).copied()
    }

    /// Stops processing of the remaining fields of this body.
    pub fn exit(&mut self) {
        self.exit = true;
    }

    pub fn is_exited(&self) -> bool {
        self.exit
    }

    pub(crate) fn mark(&mut self, key: &str, offset: usize) {
        self.offsets.insert(key.to_string(), offset);
    }

    pub(crate) fn push(&mut self, key: &str, value: Value) {
        if let Target::Building(target) = &mut self.target {
            match target {
                Value::Array(items) => items.push(value),
                Value::Object(map) => {
                    map.insert(key.to_string(), value);
                }
                _ => {}
            }
        }
    }

    pub(crate) fn into_value(self) -> Value {
        match self.target {
            Target::Building(value) => value,
            Target::Packing(value) => value.clone(),
        }
    }
}

/// What a schema sees while it packs or unpacks.
///
/// A context is cheap to create: it only borrows the registry, the options and
/// the enclosing scope. Entering an object body produces a new context through
/// [`Context::enter`] instead of mutating this one.
pub struct Context<'c, 's> {
    registry: &'c Registry,
    options: &'c Options,
    scope: Option<&'c mut Scope<'s>>,
}

impl<'c> Context<'c, 'static> {
    pub fn new(registry: &'c Registry, options: &'c Options) -> Self {
        Self {
            registry,
            options,
            scope: None,
        }
    }
}

impl<'c, 's> Context<'c, 's> {
    pub fn registry(&self) -> &'c Registry {
        self.registry
    }

    pub fn options(&self) -> &'c Options {
        self.options
    }

    pub fn little_endian(&self) -> bool {
        self.options.little_endian
    }

    pub fn scope(&self) -> Option<&Scope<'s>> {
        self.scope.as_deref()
    }

    /// The enclosing scope, or [`Error::MissingScope`] naming the schema kind
    /// that required it.
    pub fn require_scope(&mut self, namespace: &'static str) -> Result<&mut Scope<'s>> {
        self.scope
            .as_deref_mut()
            .ok_or(Error::MissingScope(namespace))
    }

    /// A context for the body of a nested object or union.
    pub fn enter<'n, 't>(&'n self, scope: &'n mut Scope<'t>) -> Context<'n, 't> {
        Context {
            registry: self.registry,
            options: self.options,
            scope: Some(scope),
        }
    }

    pub fn resolve(&self, candidate: &Candidate) -> Result<SchemaRef> {
        self.registry.resolve(candidate)
    }

    pub fn unpack(&mut self, candidate: &Candidate, cursor: &mut Cursor<'_>) -> Result<Value> {
        let schema = self.resolve(candidate)?;
        schema.unpack(self, cursor)
    }

    pub fn pack(&mut self, candidate: &Candidate, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        let schema = self.resolve(candidate)?;
        schema.pack(self, value, out)
    }
}
