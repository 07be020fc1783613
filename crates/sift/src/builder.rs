//! Fluent builder for condition trees.
//!
//! [`ConditionBuilder`] offers two families of operations:
//!
//! - **Typed** operations take a [`Field<R, T>`] handle. Ordering operators
//!   require `T: Ordered` and pattern operators `T: Text`, so misuse is a
//!   compile error:
//!
//!   ```compile_fail
//!   use sift::{ConditionBuilder, Field, FieldDescriptor, FieldRegistry, Value, ValueType};
//!
//!   struct Book {
//!       in_print: bool,
//!   }
//!
//!   let registry = FieldRegistry::new()
//!       .with(FieldDescriptor::new("in_print", ValueType::Bool, |b: &Book| {
//!           Value::Bool(b.in_print)
//!       }))
//!       .unwrap();
//!   let in_print: Field<Book, bool> = registry.typed("in_print").unwrap();
//!
//!   // bool is not Ordered
//!   ConditionBuilder::new(&registry).greater_than(&in_print, false);
//!   ```
//!
//! - **Loose** operations take a field name and untyped operands. They are
//!   checked when the tree is built: the first failure is kept and returned
//!   by [`build`](ConditionBuilder::build), and later calls do nothing.
//!
//! The root of a builder is an AND group ([`ConditionBuilder::new`]) or an
//! OR group ([`ConditionBuilder::any`]); [`and`](ConditionBuilder::and) and
//! [`or`](ConditionBuilder::or) open nested groups.
//!
//! # Example
//!
//! ```
//! use sift::{ConditionBuilder, Field, FieldDescriptor, FieldRegistry, Number, Value, ValueType};
//!
//! struct Book {
//!     title: String,
//!     year: i64,
//! }
//!
//! let registry = FieldRegistry::new()
//!     .with(FieldDescriptor::new("title", ValueType::String, |b: &Book| {
//!         Value::String(&b.title)
//!     }))
//!     .unwrap()
//!     .with(FieldDescriptor::new("year", ValueType::Number, |b: &Book| {
//!         Value::Number(Number::I64(b.year))
//!     }))
//!     .unwrap();
//! let title: Field<Book, String> = registry.typed("title").unwrap();
//! let year: Field<Book, i64> = registry.typed("year").unwrap();
//!
//! // year < 1970 AND (title LIKE 'Dune%' OR title = 'Foundation')
//! let condition = ConditionBuilder::new(&registry)
//!     .less_than(&year, 1970)
//!     .or(|b| b.like(&title, "Dune%").loose_equal("title", "Foundation"))
//!     .build()
//!     .unwrap();
//!
//! let dune = Book { title: "Dune".into(), year: 1965 };
//! assert!(condition.matches(&dune));
//! ```

use crate::condition::Condition;
use crate::error::{Result, SiftError};
use crate::field::{Field, FieldDescriptor, FieldType, Ordered, Text};
use crate::op::{Connective, Operator};
use crate::registry::FieldRegistry;
use crate::value::Operand;

/// Builds a [`Condition`] tree against a field registry.
pub struct ConditionBuilder<'r, R> {
    registry: &'r FieldRegistry<R>,
    connective: Connective,
    children: Vec<Condition<R>>,
    error: Option<SiftError>,
}

impl<'r, R> ConditionBuilder<'r, R> {
    /// A builder whose children are ANDed.
    pub fn new(registry: &'r FieldRegistry<R>) -> Self {
        ConditionBuilder::with_connective(registry, Connective::And)
    }

    /// A builder whose children are ORed.
    pub fn any(registry: &'r FieldRegistry<R>) -> Self {
        ConditionBuilder::with_connective(registry, Connective::Or)
    }

    fn with_connective(registry: &'r FieldRegistry<R>, connective: Connective) -> Self {
        ConditionBuilder {
            registry,
            connective,
            children: Vec::new(),
            error: None,
        }
    }

    fn push(mut self, condition: Result<Condition<R>>) -> Self {
        if self.error.is_none() {
            match condition {
                Ok(condition) => self.children.push(condition),
                Err(err) => self.error = Some(err),
            }
        }
        self
    }

    fn leaf(self, field: &FieldDescriptor<R>, operator: Operator, operands: Vec<Operand>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let condition = Condition::leaf(*field, operator, operands);
        self.push(condition)
    }

    // ========================================================================
    // Typed operations
    // ========================================================================

    pub fn equal<T: FieldType>(self, field: &Field<R, T>, value: impl Into<T>) -> Self {
        self.leaf(field.descriptor(), Operator::Equal, vec![value.into().into_operand()])
    }

    pub fn not_equal<T: FieldType>(self, field: &Field<R, T>, value: impl Into<T>) -> Self {
        self.leaf(field.descriptor(), Operator::NotEqual, vec![value.into().into_operand()])
    }

    pub fn less_than<T: Ordered>(self, field: &Field<R, T>, value: impl Into<T>) -> Self {
        self.leaf(field.descriptor(), Operator::LessThan, vec![value.into().into_operand()])
    }

    pub fn greater_than<T: Ordered>(self, field: &Field<R, T>, value: impl Into<T>) -> Self {
        self.leaf(field.descriptor(), Operator::GreaterThan, vec![value.into().into_operand()])
    }

    pub fn less_than_or_equal<T: Ordered>(self, field: &Field<R, T>, value: impl Into<T>) -> Self {
        self.leaf(
            field.descriptor(),
            Operator::LessThanOrEqual,
            vec![value.into().into_operand()],
        )
    }

    pub fn greater_than_or_equal<T: Ordered>(
        self,
        field: &Field<R, T>,
        value: impl Into<T>,
    ) -> Self {
        self.leaf(
            field.descriptor(),
            Operator::GreaterThanOrEqual,
            vec![value.into().into_operand()],
        )
    }

    /// Inclusive range.
    pub fn between<T: Ordered>(
        self,
        field: &Field<R, T>,
        lower: impl Into<T>,
        upper: impl Into<T>,
    ) -> Self {
        self.leaf(
            field.descriptor(),
            Operator::Between,
            vec![lower.into().into_operand(), upper.into().into_operand()],
        )
    }

    /// SQL-style pattern match: `%` is any run, `_` a single character.
    pub fn like<T: Text>(self, field: &Field<R, T>, pattern: &str) -> Self {
        self.leaf(field.descriptor(), Operator::Like, vec![Operand::from(pattern)])
    }

    pub fn not_like<T: Text>(self, field: &Field<R, T>, pattern: &str) -> Self {
        self.leaf(field.descriptor(), Operator::NotLike, vec![Operand::from(pattern)])
    }

    /// Membership; an empty list is an error.
    pub fn is_in<T, I>(self, field: &Field<R, T>, values: I) -> Self
    where
        T: FieldType,
        I: IntoIterator,
        I::Item: Into<T>,
    {
        let operands = values.into_iter().map(|v| v.into().into_operand()).collect();
        self.leaf(field.descriptor(), Operator::In, operands)
    }

    pub fn not_in<T, I>(self, field: &Field<R, T>, values: I) -> Self
    where
        T: FieldType,
        I: IntoIterator,
        I::Item: Into<T>,
    {
        let operands = values.into_iter().map(|v| v.into().into_operand()).collect();
        self.leaf(field.descriptor(), Operator::NotIn, operands)
    }

    pub fn is_null<T>(self, field: &Field<R, T>) -> Self {
        self.leaf(field.descriptor(), Operator::IsNull, Vec::new())
    }

    pub fn not_null<T>(self, field: &Field<R, T>) -> Self {
        self.leaf(field.descriptor(), Operator::NotNull, Vec::new())
    }

    // ========================================================================
    // Loose operations
    // ========================================================================

    /// Adds a comparison on a field looked up by name.
    pub fn loose(self, name: &str, operator: Operator, operands: Vec<Operand>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let registry = self.registry;
        match registry.lookup(name) {
            Ok(field) => self.leaf(field, operator, operands),
            Err(err) => self.push(Err(err)),
        }
    }

    pub fn loose_equal(self, name: &str, value: impl Into<Operand>) -> Self {
        self.loose(name, Operator::Equal, vec![value.into()])
    }

    pub fn loose_not_equal(self, name: &str, value: impl Into<Operand>) -> Self {
        self.loose(name, Operator::NotEqual, vec![value.into()])
    }

    pub fn loose_less_than(self, name: &str, value: impl Into<Operand>) -> Self {
        self.loose(name, Operator::LessThan, vec![value.into()])
    }

    pub fn loose_greater_than(self, name: &str, value: impl Into<Operand>) -> Self {
        self.loose(name, Operator::GreaterThan, vec![value.into()])
    }

    pub fn loose_less_than_or_equal(self, name: &str, value: impl Into<Operand>) -> Self {
        self.loose(name, Operator::LessThanOrEqual, vec![value.into()])
    }

    pub fn loose_greater_than_or_equal(self, name: &str, value: impl Into<Operand>) -> Self {
        self.loose(name, Operator::GreaterThanOrEqual, vec![value.into()])
    }

    pub fn loose_between(
        self,
        name: &str,
        lower: impl Into<Operand>,
        upper: impl Into<Operand>,
    ) -> Self {
        self.loose(name, Operator::Between, vec![lower.into(), upper.into()])
    }

    pub fn loose_like(self, name: &str, pattern: &str) -> Self {
        self.loose(name, Operator::Like, vec![Operand::from(pattern)])
    }

    pub fn loose_not_like(self, name: &str, pattern: &str) -> Self {
        self.loose(name, Operator::NotLike, vec![Operand::from(pattern)])
    }

    pub fn loose_in<I>(self, name: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        self.loose(name, Operator::In, values.into_iter().map(Into::into).collect())
    }

    pub fn loose_not_in<I>(self, name: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        self.loose(name, Operator::NotIn, values.into_iter().map(Into::into).collect())
    }

    pub fn loose_is_null(self, name: &str) -> Self {
        self.loose(name, Operator::IsNull, Vec::new())
    }

    pub fn loose_not_null(self, name: &str) -> Self {
        self.loose(name, Operator::NotNull, Vec::new())
    }

    // ========================================================================
    // Grouping
    // ========================================================================

    /// Opens a nested AND group, appended when `scope` returns.
    pub fn and<F>(self, scope: F) -> Self
    where
        F: FnOnce(ConditionBuilder<'r, R>) -> ConditionBuilder<'r, R>,
    {
        let nested = scope(ConditionBuilder::new(self.registry));
        self.nest(nested)
    }

    /// Opens a nested OR group, appended when `scope` returns.
    pub fn or<F>(self, scope: F) -> Self
    where
        F: FnOnce(ConditionBuilder<'r, R>) -> ConditionBuilder<'r, R>,
    {
        let nested = scope(ConditionBuilder::any(self.registry));
        self.nest(nested)
    }

    fn nest(self, nested: ConditionBuilder<'r, R>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let condition = nested.build();
        self.push(condition)
    }

    /// Appends an already-built condition, such as a parsed filter.
    pub fn condition(self, condition: Condition<R>) -> Self {
        self.push(Ok(condition))
    }

    /// Finishes the tree, or returns the first error recorded.
    pub fn build(self) -> Result<Condition<R>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(match self.connective {
            Connective::And => Condition::And(self.children),
            Connective::Or => Condition::Or(self.children),
        })
    }
}
