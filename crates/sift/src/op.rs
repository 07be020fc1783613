//! Comparison operators for condition leaves.
//!
//! Every [`Operator`] carries its arity and the class of values it accepts
//! as plain data. Leaf construction checks both once, so backends can rely
//! on well-formed operand lists.

use std::fmt;

use serde::Serialize;

use crate::value::ValueType;

/// Comparison operator for a condition leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    /// SQL-style pattern: `%` matches any run, `_` a single character.
    Like,
    NotLike,
    IsNull,
    NotNull,
    /// Inclusive range, `lower <= value <= upper`.
    Between,
}

/// How many operands an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No operands (null checks).
    Nullary,
    /// Exactly one operand.
    Unary,
    /// Exactly two operands.
    Binary,
    /// One or more operands.
    Variadic,
}

impl Arity {
    /// Returns `true` if `count` operands satisfy this arity.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Nullary => count == 0,
            Arity::Unary => count == 1,
            Arity::Binary => count == 2,
            Arity::Variadic => count >= 1,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arity::Nullary => "no operands",
            Arity::Unary => "exactly one operand",
            Arity::Binary => "exactly two operands",
            Arity::Variadic => "at least one operand",
        })
    }
}

/// The class of field types an operator applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// Any field type.
    Any,
    /// Types with a total order.
    Ordered,
    /// String types.
    Text,
}

impl ValueClass {
    /// Returns `true` if a field of `value_type` belongs to this class.
    pub fn admits(self, value_type: ValueType) -> bool {
        match self {
            ValueClass::Any => true,
            ValueClass::Ordered => value_type.is_orderable(),
            ValueClass::Text => value_type.is_text(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueClass::Any => "any",
            ValueClass::Ordered => "orderable",
            ValueClass::Text => "string",
        }
    }
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::NotLike,
        Operator::IsNull,
        Operator::NotNull,
        Operator::Between,
    ];

    pub fn arity(self) -> Arity {
        match self {
            Operator::IsNull | Operator::NotNull => Arity::Nullary,
            Operator::Between => Arity::Binary,
            Operator::In | Operator::NotIn => Arity::Variadic,
            _ => Arity::Unary,
        }
    }

    pub fn value_class(self) -> ValueClass {
        match self {
            Operator::GreaterThan
            | Operator::GreaterThanOrEqual
            | Operator::LessThan
            | Operator::LessThanOrEqual
            | Operator::Between => ValueClass::Ordered,
            Operator::Like | Operator::NotLike => ValueClass::Text,
            _ => ValueClass::Any,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "not_equal",
            Operator::GreaterThan => "greater_than",
            Operator::GreaterThanOrEqual => "greater_than_or_equal",
            Operator::LessThan => "less_than",
            Operator::LessThanOrEqual => "less_than_or_equal",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Like => "like",
            Operator::NotLike => "not_like",
            Operator::IsNull => "is_null",
            Operator::NotNull => "not_null",
            Operator::Between => "between",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connective joining the children of a composite condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_str(self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
        }
    }
}
