//! Aggregate specifications.
//!
//! An [`AggregateSpec`] is an ordered list of [`Aggregate`]s: a function
//! applied to one field, optionally grouped by other fields and ordered by
//! the aggregate result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};
use crate::field::FieldDescriptor;
use crate::sort::Dir;
use crate::value::ValueType;

/// Aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    /// Checks that this function can be applied to a field of `value_type`.
    ///
    /// `Sum` and `Avg` need numbers, `Min` and `Max` need an orderable type,
    /// `Count` takes anything.
    fn accepts(self, value_type: ValueType) -> std::result::Result<(), &'static str> {
        match self {
            AggregateFunction::Count => Ok(()),
            AggregateFunction::Sum | AggregateFunction::Avg => match value_type {
                ValueType::Number => Ok(()),
                _ => Err("number"),
            },
            AggregateFunction::Min | AggregateFunction::Max => {
                if value_type.is_orderable() {
                    Ok(())
                } else {
                    Err("orderable")
                }
            }
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One aggregate: `function(field)`, grouped and optionally ordered.
pub struct Aggregate<R> {
    field: FieldDescriptor<R>,
    function: AggregateFunction,
    group_by: Vec<FieldDescriptor<R>>,
    order_by: Option<Dir>,
}

impl<R> Aggregate<R> {
    pub fn new(function: AggregateFunction, field: impl Into<FieldDescriptor<R>>) -> Self {
        Aggregate {
            field: field.into(),
            function,
            group_by: Vec::new(),
            order_by: None,
        }
    }

    pub fn count(field: impl Into<FieldDescriptor<R>>) -> Self {
        Aggregate::new(AggregateFunction::Count, field)
    }

    pub fn sum(field: impl Into<FieldDescriptor<R>>) -> Self {
        Aggregate::new(AggregateFunction::Sum, field)
    }

    pub fn avg(field: impl Into<FieldDescriptor<R>>) -> Self {
        Aggregate::new(AggregateFunction::Avg, field)
    }

    pub fn min(field: impl Into<FieldDescriptor<R>>) -> Self {
        Aggregate::new(AggregateFunction::Min, field)
    }

    pub fn max(field: impl Into<FieldDescriptor<R>>) -> Self {
        Aggregate::new(AggregateFunction::Max, field)
    }

    /// Adds a grouping field. Groups are keyed by all grouping fields in
    /// the order they were added.
    pub fn group_by(mut self, field: impl Into<FieldDescriptor<R>>) -> Self {
        self.group_by.push(field.into());
        self
    }

    /// Orders result rows by the aggregate value.
    pub fn order_by(mut self, dir: Dir) -> Self {
        self.order_by = Some(dir);
        self
    }

    pub fn field(&self) -> &FieldDescriptor<R> {
        &self.field
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    pub fn group_fields(&self) -> &[FieldDescriptor<R>] {
        &self.group_by
    }

    pub fn ordering(&self) -> Option<Dir> {
        self.order_by
    }

    /// Checks the function against the field's value type.
    pub fn validate(&self) -> Result<()> {
        self.function
            .accepts(self.field.value_type())
            .map_err(|expected| SiftError::TypeMismatch {
                field: self.field.name().to_string(),
                operator: None,
                value_type: self.field.value_type(),
                expected,
            })
    }
}

impl<R> Clone for Aggregate<R> {
    fn clone(&self) -> Self {
        Aggregate {
            field: self.field,
            function: self.function,
            group_by: self.group_by.clone(),
            order_by: self.order_by,
        }
    }
}

impl<R> PartialEq for Aggregate<R> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.function == other.function
            && self.group_by == other.group_by
            && self.order_by == other.order_by
    }
}

impl<R> fmt::Debug for Aggregate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("function", &self.function)
            .field("field", &self.field.name())
            .field(
                "group_by",
                &self.group_by.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .field("order_by", &self.order_by)
            .finish()
    }
}

/// Ordered list of aggregates attached to a root query.
pub struct AggregateSpec<R> {
    aggregates: Vec<Aggregate<R>>,
}

impl<R> AggregateSpec<R> {
    pub fn new() -> Self {
        AggregateSpec {
            aggregates: Vec::new(),
        }
    }

    pub fn with(mut self, aggregate: Aggregate<R>) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    pub fn push(&mut self, aggregate: Aggregate<R>) {
        self.aggregates.push(aggregate);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Aggregate<R>> {
        self.aggregates.iter()
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Validates every aggregate, stopping at the first failure.
    pub fn validate(&self) -> Result<()> {
        self.aggregates.iter().try_for_each(Aggregate::validate)
    }
}

impl<R> Default for AggregateSpec<R> {
    fn default() -> Self {
        AggregateSpec::new()
    }
}

impl<R> Clone for AggregateSpec<R> {
    fn clone(&self) -> Self {
        AggregateSpec {
            aggregates: self.aggregates.clone(),
        }
    }
}

impl<R> fmt::Debug for AggregateSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.aggregates).finish()
    }
}

impl<'a, R> IntoIterator for &'a AggregateSpec<R> {
    type Item = &'a Aggregate<R>;
    type IntoIter = std::slice::Iter<'a, Aggregate<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.aggregates.iter()
    }
}
