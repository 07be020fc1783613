//! Sort specifications.
//!
//! Provides [`Dir`] for sort direction and [`SortSpec`], an ordered list of
//! field/direction keys attached to a root query.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};
use crate::field::FieldDescriptor;
use crate::registry::FieldRegistry;
use crate::value::{compare_values, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    pub fn is_asc(self) -> bool {
        matches!(self, Dir::Asc)
    }

    pub fn is_desc(self) -> bool {
        matches!(self, Dir::Desc)
    }

    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sort key: field and direction.
pub struct SortKey<R> {
    pub field: FieldDescriptor<R>,
    pub dir: Dir,
}

impl<R> SortKey<R> {
    pub fn new(field: impl Into<FieldDescriptor<R>>, dir: Dir) -> Self {
        SortKey {
            field: field.into(),
            dir,
        }
    }

    /// Compares two records on this key.
    ///
    /// Missing values sort last in both directions.
    pub fn compare(&self, a: &R, b: &R) -> Ordering {
        compare_nulls_last(&self.field.read(a), &self.field.read(b), self.dir)
    }
}

/// Orders two field values, placing `None` after everything else.
///
/// Values that cannot be compared (type mismatch, NaN) are treated as equal.
pub fn compare_nulls_last(a: &Value<'_>, b: &Value<'_>, dir: Dir) -> Ordering {
    match (a.is_none(), b.is_none()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_values(a, b)
            .map(|o| dir.apply(o))
            .unwrap_or(Ordering::Equal),
    }
}

impl<R> Clone for SortKey<R> {
    fn clone(&self) -> Self {
        SortKey {
            field: self.field,
            dir: self.dir,
        }
    }
}

impl<R> PartialEq for SortKey<R> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.dir == other.dir
    }
}

impl<R> fmt::Debug for SortKey<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field.name(), self.dir)
    }
}

/// Ordered list of sort keys. The first key is the primary sort, later keys
/// break ties.
///
/// # Example
///
/// ```
/// use sift::{Dir, FieldDescriptor, SortSpec, Value, ValueType};
///
/// struct Book {
///     title: String,
/// }
///
/// let title = FieldDescriptor::new("title", ValueType::String, |b: &Book| {
///     Value::String(&b.title)
/// });
/// let spec = SortSpec::new().desc(title);
/// assert_eq!(spec.keys()[0].dir, Dir::Desc);
/// ```
pub struct SortSpec<R> {
    keys: Vec<SortKey<R>>,
}

impl<R> SortSpec<R> {
    pub fn new() -> Self {
        SortSpec { keys: Vec::new() }
    }

    /// Appends a key with the given direction.
    pub fn by(mut self, field: impl Into<FieldDescriptor<R>>, dir: Dir) -> Self {
        self.keys.push(SortKey::new(field, dir));
        self
    }

    pub fn asc(self, field: impl Into<FieldDescriptor<R>>) -> Self {
        self.by(field, Dir::Asc)
    }

    pub fn desc(self, field: impl Into<FieldDescriptor<R>>) -> Self {
        self.by(field, Dir::Desc)
    }

    /// Parses a comma-separated key list such as `-year,title`.
    ///
    /// A leading `-` sorts descending, a leading `+` or no prefix ascending.
    /// Every name is resolved through the registry.
    pub fn parse(registry: &FieldRegistry<R>, input: &str) -> Result<Self> {
        let mut spec = SortSpec::new();
        for part in input.split(',').map(str::trim) {
            if part.is_empty() {
                return Err(SiftError::malformed(format!("empty sort key in '{input}'")));
            }
            let (dir, name) = match part.as_bytes()[0] {
                b'-' => (Dir::Desc, &part[1..]),
                b'+' => (Dir::Asc, &part[1..]),
                _ => (Dir::Asc, part),
            };
            spec = spec.by(*registry.lookup(name.trim())?, dir);
        }
        Ok(spec)
    }

    pub fn keys(&self) -> &[SortKey<R>] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compares two records key by key.
    pub fn compare(&self, a: &R, b: &R) -> Ordering {
        for key in &self.keys {
            let ordering = key.compare(a, b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl<R> Default for SortSpec<R> {
    fn default() -> Self {
        SortSpec::new()
    }
}

impl<R> Clone for SortSpec<R> {
    fn clone(&self) -> Self {
        SortSpec {
            keys: self.keys.clone(),
        }
    }
}

impl<R> PartialEq for SortSpec<R> {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl<R> fmt::Debug for SortSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.keys).finish()
    }
}
