//! Backend predicate factories.
//!
//! A condition tree is backend-agnostic. Turning it into something that can
//! be executed is the job of a [`PredicateFactory`], which knows how to
//! build one comparison, how to combine predicates under AND/OR, and how to
//! assemble the final criteria for a root query.
//!
//! Two factories ship with the crate:
//!
//! - [`MemoryBackend`] evaluates criteria against in-memory records.
//! - [`SqlBackend`] renders SQL fragments with positional bind parameters.

pub mod memory;
pub mod sql;

pub use memory::{
    AggregateRow, MemoryBackend, MemoryCriteria, MemoryPredicate, MemoryScope, MemorySort,
};
pub use sql::{SqlAggregate, SqlBackend, SqlCriteria, SqlPredicate, SqlSort};

use crate::aggregate::Aggregate;
use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::op::{Connective, Operator};
use crate::query::Page;
use crate::sort::SortSpec;
use crate::value::Operand;

/// Builds backend predicates and criteria for record type `R`.
///
/// Operands handed to [`comparison`](PredicateFactory::comparison) are
/// already validated against the field and operator: arity, value class and
/// operand types hold.
pub trait PredicateFactory<R> {
    /// Restriction applied to every query regardless of its condition.
    type Scope;
    type Predicate;
    type Aggregate;
    type Sort;
    /// The final, executable form of a root query.
    type Criteria;

    /// Builds the predicate for a single comparison.
    fn comparison(
        &self,
        field: &FieldDescriptor<R>,
        operator: Operator,
        operands: &[Operand],
    ) -> Result<Self::Predicate>;

    /// Combines two or more predicates, preserving their order.
    fn combine(&self, connective: Connective, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    fn aggregate(&self, aggregate: &Aggregate<R>) -> Result<Self::Aggregate>;

    fn sort(&self, sort: &SortSpec<R>) -> Result<Self::Sort>;

    /// Assembles the criteria for a root query.
    ///
    /// `predicate` is `None` when the condition tree places no restriction.
    fn criteria(
        &self,
        scope: &Self::Scope,
        predicate: Option<Self::Predicate>,
        aggregates: Vec<Self::Aggregate>,
        page: Option<Page>,
    ) -> Result<Self::Criteria>;
}
