//! Error types for the sift crate.

use thiserror::Error;

use crate::op::Operator;
use crate::value::ValueType;

/// Errors raised while building, parsing or compiling conditions.
///
/// All of them describe bad input or programmer error; none is transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SiftError {
    /// Field name not present in the registry.
    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    /// A field with this name is already registered.
    #[error("field '{name}' is already registered")]
    DuplicateField { name: String },

    /// Comparator symbol has no operator mapping.
    #[error("unsupported operator '{symbol}'")]
    UnsupportedOperator { symbol: String },

    /// A raw filter argument could not be coerced to the field's type.
    #[error("cannot convert '{raw}' to {target} for field '{field}'")]
    ArgumentConversion {
        field: String,
        raw: String,
        target: ValueType,
    },

    /// Operator or operand incompatible with the field's value type.
    #[error("{}", type_mismatch_message(field, operator, value_type, expected))]
    TypeMismatch {
        field: String,
        operator: Option<Operator>,
        value_type: ValueType,
        expected: &'static str,
    },

    /// The filter text is syntactically invalid, or a comparison has the
    /// wrong number of arguments.
    #[error("malformed filter{}: {message}", position_suffix(position))]
    MalformedFilter {
        message: String,
        position: Option<usize>,
    },

    /// A write-once slot of a root query was assigned twice.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// Compiler configuration could not be loaded.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The predicate factory rejected a condition.
    #[error("backend error: {message}")]
    Backend { message: String },
}

fn type_mismatch_message(
    field: &str,
    operator: &Option<Operator>,
    value_type: &ValueType,
    expected: &str,
) -> String {
    match operator {
        Some(op) => format!(
            "operator '{op}' requires {expected} values, but field '{field}' is {value_type}"
        ),
        None => format!("field '{field}' is {value_type}, expected {expected}"),
    }
}

fn position_suffix(position: &Option<usize>) -> String {
    position.map(|p| format!(" at position {p}")).unwrap_or_default()
}

impl SiftError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        SiftError::MalformedFilter {
            message: message.into(),
            position: None,
        }
    }
}

impl From<sift_rsql::ParseError> for SiftError {
    fn from(err: sift_rsql::ParseError) -> Self {
        SiftError::MalformedFilter {
            message: err.message,
            position: Some(err.position),
        }
    }
}

/// Result type for sift operations.
pub type Result<T> = std::result::Result<T, SiftError>;
