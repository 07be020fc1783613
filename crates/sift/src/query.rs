//! Root query compiler.
//!
//! A [`RootQuery`] owns everything that goes into one backend query: an
//! opaque scope, the top-level AND of all conditions added to it, and the
//! optional aggregate, sort and page settings. It is the only component
//! that asks a [`PredicateFactory`] for final criteria.
//!
//! # Example
//!
//! ```
//! use sift::backend::MemoryBackend;
//! use sift::{FieldDescriptor, FieldRegistry, Number, RootQuery, SortSpec, Value, ValueType};
//!
//! struct Book {
//!     title: String,
//!     year: i64,
//! }
//!
//! let year = FieldDescriptor::new("year", ValueType::Number, |b: &Book| {
//!     Value::Number(Number::I64(b.year))
//! });
//! let registry = FieldRegistry::new()
//!     .with(FieldDescriptor::new("title", ValueType::String, |b: &Book| {
//!         Value::String(&b.title)
//!     }))
//!     .unwrap()
//!     .with(year)
//!     .unwrap();
//!
//! let mut query = RootQuery::new(Vec::new())
//!     .filter(&registry, "year=lt=1970")
//!     .unwrap();
//! query.set_sort(SortSpec::new().asc(year)).unwrap();
//!
//! let books = vec![
//!     Book { title: "Neuromancer".into(), year: 1984 },
//!     Book { title: "Dune".into(), year: 1965 },
//!     Book { title: "Foundation".into(), year: 1951 },
//! ];
//! let criteria = query.compile(&MemoryBackend, false).unwrap();
//! let sort = query.to_sort(&MemoryBackend).unwrap();
//! let titles: Vec<_> = criteria
//!     .filter_sorted(&books, sort.as_ref())
//!     .iter()
//!     .map(|b| b.title.as_str())
//!     .collect();
//! assert_eq!(titles, vec!["Foundation", "Dune"]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::AggregateSpec;
use crate::backend::PredicateFactory;
use crate::condition::{compile_group, Condition};
use crate::config::CompilerConfig;
use crate::error::{Result, SiftError};
use crate::filter::FilterVisitor;
use crate::op::Connective;
use crate::registry::FieldRegistry;
use crate::sort::SortSpec;

/// Row window applied to a non-aggregate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    /// Number of rows to skip.
    pub offset: usize,
    /// Maximum number of rows to return; `None` is unbounded.
    pub limit: Option<usize>,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Page {
            offset,
            limit: Some(limit),
        }
    }

    /// The first `limit` rows.
    pub fn first(limit: usize) -> Self {
        Page::new(0, limit)
    }

    /// Page `number` (starting at 1) of `size` rows each.
    pub fn numbered(number: usize, size: usize) -> Self {
        Page::new(number.saturating_sub(1).saturating_mul(size), size)
    }

    /// Applies offset then limit to an iterator.
    pub fn apply<I: IntoIterator>(&self, items: I) -> impl Iterator<Item = I::Item> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
    }
}

/// A query under construction: scope, conditions and the write-once
/// aggregate, sort and page settings.
///
/// `S` is the backend's scope type (see [`PredicateFactory::Scope`]).
pub struct RootQuery<R, S = ()> {
    scope: S,
    conditions: Vec<Condition<R>>,
    aggregates: Option<AggregateSpec<R>>,
    sort: Option<SortSpec<R>>,
    page: Option<Page>,
}

impl<R, S> RootQuery<R, S> {
    pub fn new(scope: S) -> Self {
        RootQuery {
            scope,
            conditions: Vec::new(),
            aggregates: None,
            sort: None,
            page: None,
        }
    }

    /// AND-appends a condition to the top-level tree.
    pub fn where_condition(mut self, condition: Condition<R>) -> Self {
        self.push_condition(condition);
        self
    }

    pub fn push_condition(&mut self, condition: Condition<R>) {
        self.conditions.push(condition);
    }

    /// Parses a filter expression and AND-appends it.
    pub fn filter(self, registry: &FieldRegistry<R>, input: &str) -> Result<Self> {
        self.filter_with(registry, CompilerConfig::default(), input)
    }

    /// Like [`filter`](RootQuery::filter), with an explicit configuration.
    pub fn filter_with(
        mut self,
        registry: &FieldRegistry<R>,
        config: CompilerConfig,
        input: &str,
    ) -> Result<Self> {
        let condition = FilterVisitor::with_config(registry, config).parse(input)?;
        self.push_condition(condition);
        Ok(self)
    }

    /// Sets the aggregate spec. May be called once.
    pub fn set_aggregates(&mut self, aggregates: AggregateSpec<R>) -> Result<()> {
        if self.aggregates.is_some() {
            return Err(SiftError::IllegalState("aggregates already set"));
        }
        aggregates.validate()?;
        self.aggregates = Some(aggregates);
        Ok(())
    }

    /// Sets the sort spec. May be called once.
    pub fn set_sort(&mut self, sort: SortSpec<R>) -> Result<()> {
        if self.sort.is_some() {
            return Err(SiftError::IllegalState("sort already set"));
        }
        self.sort = Some(sort);
        Ok(())
    }

    /// Sets the row window. May be called once.
    pub fn set_page(&mut self, page: Page) -> Result<()> {
        if self.page.is_some() {
            return Err(SiftError::IllegalState("page already set"));
        }
        self.page = Some(page);
        Ok(())
    }

    pub fn scope(&self) -> &S {
        &self.scope
    }

    pub fn conditions(&self) -> &[Condition<R>] {
        &self.conditions
    }

    /// The top-level tree: an AND of every condition added so far.
    pub fn condition(&self) -> Condition<R> {
        Condition::and(self.conditions.clone())
    }

    pub fn aggregates(&self) -> Option<&AggregateSpec<R>> {
        self.aggregates.as_ref()
    }

    pub fn sort(&self) -> Option<&SortSpec<R>> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> Option<Page> {
        self.page
    }

    /// Compiles scope, conditions and, when `include_aggregates` is set, the
    /// aggregate spec into backend criteria.
    ///
    /// Scope and conditions compile the same way in both modes. The page
    /// only applies to row queries, so it is dropped in aggregate mode.
    pub fn compile<F>(&self, factory: &F, include_aggregates: bool) -> Result<F::Criteria>
    where
        F: PredicateFactory<R, Scope = S> + ?Sized,
    {
        let predicate = compile_group(&self.conditions, Connective::And, factory)?;

        let (aggregates, page) = if include_aggregates {
            let aggregates = self
                .aggregates
                .iter()
                .flatten()
                .map(|aggregate| factory.aggregate(aggregate))
                .collect::<Result<Vec<_>>>()?;
            (aggregates, None)
        } else {
            (Vec::new(), self.page)
        };

        debug!(
            mode = if include_aggregates { "aggregate" } else { "rows" },
            conditions = self.conditions.len(),
            restricted = predicate.is_some(),
            aggregates = aggregates.len(),
            "compiled root query"
        );

        factory.criteria(&self.scope, predicate, aggregates, page)
    }

    /// Renders the sort spec, if one was set.
    pub fn to_sort<F>(&self, factory: &F) -> Result<Option<F::Sort>>
    where
        F: PredicateFactory<R, Scope = S> + ?Sized,
    {
        self.sort.as_ref().map(|sort| factory.sort(sort)).transpose()
    }
}

impl<R, S: Default> Default for RootQuery<R, S> {
    fn default() -> Self {
        RootQuery::new(S::default())
    }
}

impl<R, S: fmt::Debug> fmt::Debug for RootQuery<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootQuery")
            .field("scope", &self.scope)
            .field("conditions", &self.conditions)
            .field("aggregates", &self.aggregates)
            .field("sort", &self.sort)
            .field("page", &self.page)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::op::Operator;
    use crate::sort::Dir;
    use crate::testing::{Book, Fields, Trace};
    use crate::value::Operand;

    fn query() -> RootQuery<Book, Vec<String>> {
        RootQuery::new(vec!["tenant = 7".to_string()])
    }

    #[test]
    fn empty_query_has_no_predicate() {
        let criteria = query().compile(&Trace, false).unwrap();
        assert_eq!(criteria.scope, vec!["tenant = 7"]);
        assert_eq!(criteria.predicate, None);
        assert!(criteria.aggregates.is_empty());
    }

    #[test]
    fn conditions_are_anded_in_order() {
        let f = Fields::new();
        let registry = Fields::registry();
        let query = query()
            .where_condition(
                Condition::leaf(f.year, Operator::GreaterThan, vec![Operand::from(1950i64)])
                    .unwrap(),
            )
            .filter(&registry, "title==Dune,genre==fantasy")
            .unwrap();
        let criteria = query.compile(&Trace, false).unwrap();
        assert_eq!(
            criteria.predicate.unwrap(),
            "(year greater_than 1950 and (title equal Dune or genre equal #1))"
        );
    }

    #[test]
    fn aggregates_are_write_once() {
        let f = Fields::new();
        let mut query = query();
        query
            .set_aggregates(AggregateSpec::new().with(Aggregate::count(f.title)))
            .unwrap();
        let err = query
            .set_aggregates(AggregateSpec::new().with(Aggregate::sum(f.year)))
            .unwrap_err();
        assert_eq!(err, SiftError::IllegalState("aggregates already set"));
        assert_eq!(query.aggregates().unwrap().len(), 1);
    }

    #[test]
    fn sort_and_page_are_write_once() {
        let f = Fields::new();
        let mut query = query();
        query.set_sort(SortSpec::new().asc(f.year)).unwrap();
        assert!(matches!(
            query.set_sort(SortSpec::new()),
            Err(SiftError::IllegalState(_))
        ));
        query.set_page(Page::first(2)).unwrap();
        assert!(matches!(
            query.set_page(Page::first(3)),
            Err(SiftError::IllegalState(_))
        ));
    }

    #[test]
    fn invalid_aggregate_is_rejected_and_slot_stays_free() {
        let f = Fields::new();
        let mut query = query();
        let err = query
            .set_aggregates(AggregateSpec::new().with(Aggregate::avg(f.title)))
            .unwrap_err();
        assert!(matches!(err, SiftError::TypeMismatch { .. }));
        assert!(query
            .set_aggregates(AggregateSpec::new().with(Aggregate::avg(f.rating)))
            .is_ok());
    }

    #[test]
    fn aggregate_mode_adds_aggregates_and_drops_page() {
        let f = Fields::new();
        let mut query = query().where_condition(
            Condition::leaf(f.in_print, Operator::Equal, vec![Operand::from(true)]).unwrap(),
        );
        query
            .set_aggregates(
                AggregateSpec::new()
                    .with(Aggregate::count(f.title).group_by(f.genre).order_by(Dir::Desc)),
            )
            .unwrap();
        query.set_page(Page::new(10, 5)).unwrap();

        let rows = query.compile(&Trace, false).unwrap();
        let grouped = query.compile(&Trace, true).unwrap();

        assert_eq!(rows.scope, grouped.scope);
        assert_eq!(rows.predicate, grouped.predicate);
        assert_eq!(rows.page, Some(Page::new(10, 5)));
        assert!(rows.aggregates.is_empty());
        assert_eq!(grouped.page, None);
        assert_eq!(grouped.aggregates, vec!["count(title) by genre desc"]);
    }

    #[test]
    fn to_sort_is_independent_of_compile() {
        let f = Fields::new();
        let mut query = query();
        assert_eq!(query.to_sort(&Trace).unwrap(), None);
        query.set_sort(SortSpec::new().desc(f.year).asc(f.title)).unwrap();
        assert_eq!(query.to_sort(&Trace).unwrap().unwrap(), "year desc, title asc");
    }

    #[test]
    fn filter_errors_propagate() {
        let registry = Fields::registry();
        let err = query().filter(&registry, "pages=gt=100").unwrap_err();
        assert_eq!(err, SiftError::UnknownField { name: "pages".into() });
    }

    #[test]
    fn page_windows() {
        assert_eq!(Page::numbered(1, 10), Page::new(0, 10));
        assert_eq!(Page::numbered(3, 10), Page::new(20, 10));
        assert_eq!(Page::numbered(0, 10), Page::new(0, 10));
        let window: Vec<_> = Page::new(1, 2).apply(1..=5).collect();
        assert_eq!(window, vec![2, 3]);
        let rest: Vec<_> = Page::default().apply(1..=3).collect();
        assert_eq!(rest, vec![1, 2, 3]);
    }
}
