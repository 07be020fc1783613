//! The condition tree.
//!
//! A [`Condition`] is either a [`Leaf`] comparison or an AND/OR group of
//! child conditions. It is the single intermediate representation produced
//! by both the builder DSL and the filter language, and it is independent
//! of any storage backend: [`Condition::compile`] hands it to a
//! [`PredicateFactory`] to obtain a backend predicate.
//!
//! # Composition rules
//!
//! - Children are compiled in order and their order is kept.
//! - Children that compile to no restriction are skipped.
//! - A group left with a single predicate compiles to that predicate alone.
//! - A group left with nothing compiles to `None` (no restriction), never to
//!   a vacuous true or false.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::backend::PredicateFactory;
use crate::error::{Result, SiftError};
use crate::field::FieldDescriptor;
use crate::op::{Connective, Operator};
use crate::pattern::like_matches;
use crate::value::{compare_values, Operand, Value};

/// A single comparison: field, operator and operands.
///
/// Leaves are validated on construction: the operand count matches the
/// operator's arity, the operator applies to the field's value type, and
/// every operand has that type.
#[derive(Serialize)]
#[serde(bound = "")]
pub struct Leaf<R> {
    field: FieldDescriptor<R>,
    operator: Operator,
    operands: Vec<Operand>,
}

impl<R> Leaf<R> {
    pub fn new(
        field: FieldDescriptor<R>,
        operator: Operator,
        operands: Vec<Operand>,
    ) -> Result<Self> {
        let arity = operator.arity();
        if !arity.accepts(operands.len()) {
            return Err(SiftError::malformed(format!(
                "operator '{operator}' on field '{}' takes {arity}, got {}",
                field.name(),
                operands.len()
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

        for operand in &operands {
            field.check_operand(operand)?;
        }

        Ok(Leaf {
            field,
            operator,
            operands,
        })
    }

    pub fn field(&self) -> &FieldDescriptor<R> {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Evaluates this comparison against a record.
    pub fn matches(&self, record: &R) -> bool {
        evaluate(self.operator, &self.field.read(record), &self.operands)
    }
}

/// Evaluates `value <operator> operands`.
///
/// A null field value only satisfies `IsNull`; every other comparison,
/// negative ones included, fails on it.
pub fn evaluate(operator: Operator, value: &Value<'_>, operands: &[Operand]) -> bool {
    match operator {
        Operator::IsNull => return value.is_none(),
        Operator::NotNull => return !value.is_none(),
        _ if value.is_none() => return false,
        _ => {}
    }

    let ordering = |operand: &Operand| compare_values(value, &operand.as_value());
    let first = match operands.first() {
        Some(operand) => operand,
        None => return false,
    };

    match operator {
        Operator::Equal => ordering(first) == Some(Ordering::Equal),
        Operator::NotEqual => matches!(ordering(first), Some(o) if o != Ordering::Equal),
        Operator::GreaterThan => ordering(first) == Some(Ordering::Greater),
        Operator::GreaterThanOrEqual => {
            matches!(ordering(first), Some(Ordering::Greater | Ordering::Equal))
        }
        Operator::LessThan => ordering(first) == Some(Ordering::Less),
        Operator::LessThanOrEqual => {
            matches!(ordering(first), Some(Ordering::Less | Ordering::Equal))
        }
        Operator::Between => match operands.get(1) {
            Some(upper) => {
                matches!(ordering(first), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(ordering(upper), Some(Ordering::Less | Ordering::Equal))
            }
            None => false,
        },
        Operator::In => operands
            .iter()
            .any(|operand| ordering(operand) == Some(Ordering::Equal)),
        Operator::NotIn => operands
            .iter()
            .all(|operand| matches!(ordering(operand), Some(o) if o != Ordering::Equal)),
        Operator::Like | Operator::NotLike => {
            let (Some(text), Some(pattern)) = (value.as_str(), first.as_str()) else {
                return false;
            };
            like_matches(text, pattern) == (operator == Operator::Like)
        }
        Operator::IsNull => false,
        Operator::NotNull => true,
    }
}

impl<R> Clone for Leaf<R> {
    fn clone(&self) -> Self {
        Leaf {
            field: self.field,
            operator: self.operator,
            operands: self.operands.clone(),
        }
    }
}

impl<R> PartialEq for Leaf<R> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.operator == other.operator
            && self.operands == other.operands
    }
}

impl<R> fmt::Debug for Leaf<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("field", &self.field.name())
            .field("operator", &self.operator)
            .field("operands", &self.operands)
            .finish()
    }
}

/// A node of the condition tree.
#[derive(Serialize)]
#[serde(bound = "", rename_all = "lowercase")]
pub enum Condition<R> {
    Leaf(Leaf<R>),
    And(Vec<Condition<R>>),
    Or(Vec<Condition<R>>),
}

impl<R> Condition<R> {
    /// Builds a validated leaf condition.
    pub fn leaf(
        field: FieldDescriptor<R>,
        operator: Operator,
        operands: Vec<Operand>,
    ) -> Result<Self> {
        Leaf::new(field, operator, operands).map(Condition::Leaf)
    }

    /// An AND group with no children: no restriction.
    pub fn all() -> Self {
        Condition::And(Vec::new())
    }

    pub fn and(children: Vec<Condition<R>>) -> Self {
        Condition::And(children)
    }

    pub fn or(children: Vec<Condition<R>>) -> Self {
        Condition::Or(children)
    }

    /// Returns `true` if this condition compiles to no restriction.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Leaf(_) => false,
            Condition::And(children) | Condition::Or(children) => {
                children.iter().all(Condition::is_empty)
            }
        }
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Condition::Leaf(_) => 1,
            Condition::And(children) | Condition::Or(children) => {
                children.iter().map(Condition::leaf_count).sum()
            }
        }
    }

    /// Compiles this tree with a backend predicate factory.
    ///
    /// Returns `Ok(None)` when the tree places no restriction. Any factory
    /// error aborts the whole compilation.
    pub fn compile<F>(&self, factory: &F) -> Result<Option<F::Predicate>>
    where
        F: PredicateFactory<R> + ?Sized,
    {
        match self {
            Condition::Leaf(leaf) => factory
                .comparison(leaf.field(), leaf.operator(), leaf.operands())
                .map(Some),
            Condition::And(children) => compile_group(children, Connective::And, factory),
            Condition::Or(children) => compile_group(children, Connective::Or, factory),
        }
    }

    /// Evaluates this tree directly against a record.
    ///
    /// Agrees with compiling through a backend: groups that place no
    /// restriction match everything.
    pub fn matches(&self, record: &R) -> bool {
        match self {
            Condition::Leaf(leaf) => leaf.matches(record),
            Condition::And(children) => children.iter().all(|c| c.matches(record)),
            Condition::Or(children) => {
                let mut restricted = children.iter().filter(|c| !c.is_empty()).peekable();
                restricted.peek().is_none() || restricted.any(|c| c.matches(record))
            }
        }
    }

    /// Structural JSON form of the tree, for logging and inspection.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

pub(crate) fn compile_group<R, F>(
    children: &[Condition<R>],
    connective: Connective,
    factory: &F,
) -> Result<Option<F::Predicate>>
where
    F: PredicateFactory<R> + ?Sized,
{
    let mut predicates = Vec::with_capacity(children.len());
    for child in children {
        if let Some(predicate) = child.compile(factory)? {
            predicates.push(predicate);
        }
    }

    Ok(match predicates.len() {
        0 => None,
        1 => predicates.pop(),
        _ => Some(factory.combine(connective, predicates)),
    })
}

impl<R> Clone for Condition<R> {
    fn clone(&self) -> Self {
        match self {
            Condition::Leaf(leaf) => Condition::Leaf(leaf.clone()),
            Condition::And(children) => Condition::And(children.clone()),
            Condition::Or(children) => Condition::Or(children.clone()),
        }
    }
}

impl<R> PartialEq for Condition<R> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Condition::Leaf(a), Condition::Leaf(b)) => a == b,
            (Condition::And(a), Condition::And(b)) | (Condition::Or(a), Condition::Or(b)) => a == b,
            _ => false,
        }
    }
}

impl<R> fmt::Debug for Condition<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Leaf(leaf) => leaf.fmt(f),
            Condition::And(children) => f.debug_tuple("And").field(children).finish(),
            Condition::Or(children) => f.debug_tuple("Or").field(children).finish(),
        }
    }
}

impl<R> From<Leaf<R>> for Condition<R> {
    fn from(leaf: Leaf<R>) -> Self {
        Condition::Leaf(leaf)
    }
}
