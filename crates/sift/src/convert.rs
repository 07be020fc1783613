//! Argument conversion for the filter language.
//!
//! Filter arguments arrive as raw strings. [`ArgumentConverter`] turns them
//! into typed operands for a given field and operator, applying two
//! rewrites on the way:
//!
//! - `*` in an equality argument on a string field becomes a `LIKE`
//!   pattern (`title==Dune*` is `title LIKE 'Dune%'`).
//! - An equality against the literal `null` becomes a null check.
//!
//! Both are controlled by [`CompilerConfig`].

use tracing::trace;

use crate::config::CompilerConfig;
use crate::error::{Result, SiftError};
use crate::field::FieldDescriptor;
use crate::op::Operator;
use crate::value::{Operand, ValueType};

/// The operator and typed operands for one comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub operator: Operator,
    pub operands: Vec<Operand>,
}

/// Converts raw filter arguments into typed operands.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentConverter {
    config: CompilerConfig,
}

impl ArgumentConverter {
    pub fn new(config: CompilerConfig) -> Self {
        ArgumentConverter { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn convert<R>(
        &self,
        field: &FieldDescriptor<R>,
        operator: Operator,
        raw: &[String],
    ) -> Result<Converted> {
        if matches!(operator, Operator::IsNull | Operator::NotNull) {
            return Ok(Converted {
                operator,
                operands: Vec::new(),
            });
        }

        if let (Operator::Equal | Operator::NotEqual, [arg]) = (operator, raw) {
            if let Some(converted) = self.rewrite_equality(field, operator, arg) {
                return Ok(converted);
            }
        }

        let arity = operator.arity();
        if !arity.accepts(raw.len()) {
            return Err(SiftError::malformed(format!(
                "operator '{operator}' on field '{}' takes {arity}, got {}",
                field.name(),
                raw.len()
            )));
        }

        let class = operator.value_class();
        if !class.admits(field.value_type()) {
            return Err(SiftError::TypeMismatch {
                field: field.name().to_string(),
                operator: Some(operator),
                value_type: field.value_type(),
                expected: class.as_str(),
            });
        }

        let operands = raw
            .iter()
            .map(|arg| {
                field.parse(arg).ok_or_else(|| SiftError::ArgumentConversion {
                    field: field.name().to_string(),
                    raw: arg.clone(),
                    target: field.value_type(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Converted { operator, operands })
    }

    fn rewrite_equality<R>(
        &self,
        field: &FieldDescriptor<R>,
        operator: Operator,
        arg: &str,
    ) -> Option<Converted> {
        let negated = operator == Operator::NotEqual;

        if self.config.wildcard_equality
            && field.value_type() == ValueType::String
            && arg.contains('*')
        {
            let pattern = arg.replace('*', "%");
            trace!(field = field.name(), %pattern, "equality with wildcard becomes like");
            return Some(Converted {
                operator: if negated { Operator::NotLike } else { Operator::Like },
                operands: vec![Operand::String(pattern)],
            });
        }

        if self.config.null_literal && arg == "null" {
            trace!(field = field.name(), "equality with null becomes null check");
            return Some(Converted {
                operator: if negated { Operator::NotNull } else { Operator::IsNull },
                operands: Vec::new(),
            });
        }

        None
    }
}
