//! Registry of queryable fields for a record type.
//!
//! Populated once at startup and read-only afterwards. The registry is
//! passed by reference to the builder and the filter front end; there is no
//! process-wide instance.

use std::collections::HashMap;

use crate::error::{Result, SiftError};
use crate::field::{Field, FieldDescriptor, FieldType};

/// Maps field names to descriptors for record type `R`.
///
/// # Example
///
/// ```
/// use sift::{FieldDescriptor, FieldRegistry, Value, ValueType};
///
/// struct Book {
///     title: String,
/// }
///
/// let registry = FieldRegistry::new()
///     .with(FieldDescriptor::new("title", ValueType::String, |b: &Book| {
///         Value::String(&b.title)
///     }))
///     .unwrap();
///
/// assert!(registry.lookup("title").is_ok());
/// assert!(registry.lookup("author").is_err());
/// ```
pub struct FieldRegistry<R> {
    fields: HashMap<&'static str, FieldDescriptor<R>>,
}

impl<R> FieldRegistry<R> {
    pub fn new() -> Self {
        FieldRegistry {
            fields: HashMap::new(),
        }
    }

    /// Registers a field. Names must be unique.
    pub fn register(&mut self, descriptor: FieldDescriptor<R>) -> Result<()> {
        if self.fields.contains_key(descriptor.name()) {
            return Err(SiftError::DuplicateField {
                name: descriptor.name().to_string(),
            });
        }
        self.fields.insert(descriptor.name(), descriptor);
        Ok(())
    }

    /// Registers a field, builder style.
    pub fn with(mut self, descriptor: FieldDescriptor<R>) -> Result<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Looks up a field by name.
    pub fn lookup(&self, name: &str) -> Result<&FieldDescriptor<R>> {
        self.fields.get(name).ok_or_else(|| SiftError::UnknownField {
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.get(name)
    }

    /// Looks up a field and tags it with its Rust value type.
    pub fn typed<T: FieldType>(&self, name: &str) -> Result<Field<R, T>> {
        Field::new(*self.lookup(name)?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Registered field names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.fields.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<R> Default for FieldRegistry<R> {
    fn default() -> Self {
        FieldRegistry::new()
    }
}
