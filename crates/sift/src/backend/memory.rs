//! In-memory backend.
//!
//! Compiles conditions to boxed closures over `&R` and runs criteria
//! against record slices: filter, sort, page, count and aggregate.
//!
//! Processing order for row queries is scope and predicate, then sort, then
//! offset, then limit. Aggregates ignore the page.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::aggregate::{Aggregate, AggregateFunction};
use crate::backend::PredicateFactory;
use crate::condition::evaluate;
use crate::error::{Result, SiftError};
use crate::field::FieldDescriptor;
use crate::op::{Connective, Operator};
use crate::pattern::like_to_regex;
use crate::query::Page;
use crate::sort::{compare_nulls_last, Dir, SortSpec};
use crate::value::{compare_values, Number, Operand, Value};

/// Scope for the memory backend: plain record tests ANDed with the
/// condition tree.
pub type MemoryScope<R> = Vec<fn(&R) -> bool>;

/// Predicate factory for in-memory evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackend;

/// A compiled record test.
pub struct MemoryPredicate<R> {
    test: Box<dyn Fn(&R) -> bool + Send + Sync>,
}

impl<R> MemoryPredicate<R> {
    pub fn new(test: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        MemoryPredicate {
            test: Box::new(test),
        }
    }

    pub fn test(&self, record: &R) -> bool {
        (self.test)(record)
    }
}

impl<R> fmt::Debug for MemoryPredicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MemoryPredicate")
    }
}

impl<R: 'static> PredicateFactory<R> for MemoryBackend {
    type Scope = MemoryScope<R>;
    type Predicate = MemoryPredicate<R>;
    type Aggregate = Aggregate<R>;
    type Sort = MemorySort<R>;
    type Criteria = MemoryCriteria<R>;

    fn comparison(
        &self,
        field: &FieldDescriptor<R>,
        operator: Operator,
        operands: &[Operand],
    ) -> Result<MemoryPredicate<R>> {
        let field = *field;
        match operator {
            Operator::Like | Operator::NotLike => {
                let pattern = operands
                    .first()
                    .and_then(Operand::as_str)
                    .ok_or_else(|| SiftError::Backend {
                        message: format!(
                            "'{operator}' on '{}' needs a string pattern",
                            field.name()
                        ),
                    })?;
                let regex = like_to_regex(pattern).map_err(|e| SiftError::Backend {
                    message: e.to_string(),
                })?;
                let expected = operator == Operator::Like;
                Ok(MemoryPredicate::new(move |record| {
                    match field.read(record).as_str() {
                        Some(text) => regex.is_match(text) == expected,
                        None => false,
                    }
                }))
            }
            _ => {
                let operands = operands.to_vec();
                Ok(MemoryPredicate::new(move |record| {
                    evaluate(operator, &field.read(record), &operands)
                }))
            }
        }
    }

    fn combine(
        &self,
        connective: Connective,
        predicates: Vec<MemoryPredicate<R>>,
    ) -> MemoryPredicate<R> {
        match connective {
            Connective::And => {
                MemoryPredicate::new(move |record| predicates.iter().all(|p| p.test(record)))
            }
            Connective::Or => {
                MemoryPredicate::new(move |record| predicates.iter().any(|p| p.test(record)))
            }
        }
    }

    fn aggregate(&self, aggregate: &Aggregate<R>) -> Result<Aggregate<R>> {
        Ok(aggregate.clone())
    }

    fn sort(&self, sort: &SortSpec<R>) -> Result<MemorySort<R>> {
        Ok(MemorySort { spec: sort.clone() })
    }

    fn criteria(
        &self,
        scope: &MemoryScope<R>,
        predicate: Option<MemoryPredicate<R>>,
        aggregates: Vec<Aggregate<R>>,
        page: Option<Page>,
    ) -> Result<MemoryCriteria<R>> {
        Ok(MemoryCriteria {
            scope: scope.clone(),
            predicate,
            aggregates,
            page,
        })
    }
}

/// Orders records by a sort spec. Missing values sort last.
pub struct MemorySort<R> {
    spec: SortSpec<R>,
}

impl<R> MemorySort<R> {
    /// Sorts in place. The sort is stable.
    pub fn sort(&self, items: &mut [&R]) {
        items.sort_by(|a, b| self.spec.compare(a, b));
    }

    pub fn spec(&self) -> &SortSpec<R> {
        &self.spec
    }
}

impl<R> fmt::Debug for MemorySort<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MemorySort").field(&self.spec).finish()
    }
}

/// One result row of an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub function: AggregateFunction,
    pub field: &'static str,
    /// Values of the grouping fields, in grouping order. `None` is a null
    /// group key.
    pub group: Vec<Option<Operand>>,
    /// `None` when the group has no non-null values (except for `Count`,
    /// which is then zero).
    pub value: Option<Operand>,
}

/// Executable criteria over in-memory records.
pub struct MemoryCriteria<R> {
    scope: MemoryScope<R>,
    predicate: Option<MemoryPredicate<R>>,
    aggregates: Vec<Aggregate<R>>,
    page: Option<Page>,
}

impl<R> MemoryCriteria<R> {
    /// Returns `true` if the record passes the scope and the predicate.
    pub fn matches(&self, record: &R) -> bool {
        self.scope.iter().all(|test| test(record))
            && self.predicate.as_ref().map_or(true, |p| p.test(record))
    }

    /// Matching records in input order, paged.
    pub fn filter<'a>(&self, items: &'a [R]) -> Vec<&'a R> {
        self.filter_sorted(items, None)
    }

    /// Matching records, sorted then paged.
    pub fn filter_sorted<'a>(&self, items: &'a [R], sort: Option<&MemorySort<R>>) -> Vec<&'a R> {
        let mut matching: Vec<&R> = items.iter().filter(|r| self.matches(r)).collect();
        if let Some(sort) = sort {
            sort.sort(&mut matching);
        }
        match self.page {
            Some(page) => page.apply(matching).collect(),
            None => matching,
        }
    }

    /// Number of matching records, ignoring the page.
    pub fn count(&self, items: &[R]) -> usize {
        items.iter().filter(|r| self.matches(r)).count()
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    pub fn page(&self) -> Option<Page> {
        self.page
    }

    pub fn aggregates(&self) -> &[Aggregate<R>] {
        &self.aggregates
    }

    /// Computes every aggregate over the matching records.
    ///
    /// Rows of one aggregate appear in first-seen group order unless the
    /// aggregate asks to be ordered by its value. Without grouping fields an
    /// aggregate yields exactly one row, even over no records.
    pub fn aggregate(&self, items: &[R]) -> Vec<AggregateRow> {
        let matching: Vec<&R> = items.iter().filter(|r| self.matches(r)).collect();
        let mut rows = Vec::new();
        for aggregate in &self.aggregates {
            let before = rows.len();
            rows.extend(aggregate_rows(aggregate, &matching));
            trace!(
                function = %aggregate.function(),
                field = aggregate.field().name(),
                rows = rows.len() - before,
                "computed aggregate"
            );
        }
        rows
    }
}

impl<R> fmt::Debug for MemoryCriteria<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCriteria")
            .field("scope", &self.scope.len())
            .field("predicate", &self.predicate.is_some())
            .field("aggregates", &self.aggregates)
            .field("page", &self.page)
            .finish()
    }
}

type Group<'a> = (Vec<Option<Operand>>, Vec<Value<'a>>);

fn aggregate_rows<R>(aggregate: &Aggregate<R>, records: &[&R]) -> Vec<AggregateRow> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for record in records {
        let key: Vec<Option<Operand>> = aggregate
            .group_fields()
            .iter()
            .map(|g| g.read(record).to_operand())
            .collect();
        let slot = match groups.iter().position(|(k, _)| *k == key) {
            Some(slot) => slot,
            None => {
                groups.push((key, Vec::new()));
                groups.len() - 1
            }
        };
        let value = aggregate.field().read(record);
        if !value.is_none() {
            groups[slot].1.push(value);
        }
    }
    if groups.is_empty() && aggregate.group_fields().is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(group, values)| AggregateRow {
            function: aggregate.function(),
            field: aggregate.field().name(),
            group,
            value: compute(aggregate.function(), &values),
        })
        .collect();

    if let Some(dir) = aggregate.ordering() {
        rows.sort_by(|a, b| compare_nulls_last(&row_value(a), &row_value(b), dir));
    }
    rows
}

fn row_value(row: &AggregateRow) -> Value<'_> {
    row.value.as_ref().map_or(Value::None, Operand::as_value)
}

fn compute(function: AggregateFunction, values: &[Value<'_>]) -> Option<Operand> {
    match function {
        AggregateFunction::Count => Some(Operand::Number(Number::U64(values.len() as u64))),
        AggregateFunction::Sum => sum(values).map(Operand::Number),
        AggregateFunction::Avg => {
            let numbers: Vec<f64> = values
                .iter()
                .filter_map(Value::as_number)
                .map(Number::to_f64)
                .collect();
            if numbers.is_empty() {
                None
            } else {
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                Some(Operand::Number(Number::F64(mean)))
            }
        }
        AggregateFunction::Min => extreme(values, Dir::Asc),
        AggregateFunction::Max => extreme(values, Dir::Desc),
    }
}

// Integer sums stay integral until they overflow or meet a non-I64 value.
fn sum(values: &[Value<'_>]) -> Option<Number> {
    let numbers: Vec<Number> = values.iter().filter_map(Value::as_number).collect();
    if numbers.is_empty() {
        return None;
    }
    let integral = numbers.iter().try_fold(0i64, |acc, n| match n {
        Number::I64(n) => acc.checked_add(*n),
        _ => None,
    });
    Some(match integral {
        Some(total) => Number::I64(total),
        None => Number::F64(numbers.iter().map(|n| n.to_f64()).sum()),
    })
}

// The first value that no other value precedes in `dir` order.
fn extreme(values: &[Value<'_>], dir: Dir) -> Option<Operand> {
    values
        .iter()
        .reduce(|best, candidate| {
            match compare_values(candidate, best).map(|o| dir.apply(o)) {
                Some(std::cmp::Ordering::Less) => candidate,
                _ => best,
            }
        })
        .and_then(Value::to_operand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateSpec;
    use crate::condition::Condition;
    use crate::filter::parse_filter;
    use crate::query::RootQuery;
    use crate::testing::{books, Book, Fields};

    fn titles(records: &[&Book]) -> Vec<String> {
        records.iter().map(|b| b.title.clone()).collect()
    }

    fn run(filter: &str) -> Vec<String> {
        let registry = Fields::registry();
        let books = books();
        let criteria = RootQuery::new(Vec::new())
            .filter(&registry, filter)
            .unwrap()
            .compile(&MemoryBackend, false)
            .unwrap();
        titles(&criteria.filter(&books))
    }

    #[test]
    fn filters_with_every_operator_family() {
        assert_eq!(run("year=lt=1960"), vec!["Foundation", "The Hobbit"]);
        assert_eq!(run("title==The*"), vec!["The Hobbit", "The Name of the Wind"]);
        assert_eq!(run("title=notlike='%e%'"), vec!["Foundation"]);
        assert_eq!(
            run("genre=in=(fantasy,mystery);in_print==true"),
            vec!["The Hobbit", "Gone Girl"]
        );
        assert_eq!(run("subtitle=notnull="), vec!["Foundation"]);
        assert_eq!(run("rating=ge=4.4"), vec!["The Hobbit", "The Name of the Wind"]);
    }

    #[test]
    fn missing_values_only_match_null_checks() {
        assert_eq!(run("subtitle!=x"), vec!["Foundation"]);
        assert_eq!(run("subtitle=out=(x)"), vec!["Foundation"]);
        assert_eq!(run("subtitle=unlike=x%"), vec!["Foundation"]);
        assert_eq!(run("subtitle=isnull=").len(), 5);
    }

    #[test]
    fn agrees_with_direct_evaluation() {
        let registry = Fields::registry();
        let books = books();
        for filter in ["year=gt=1950,in_print==false", "title==*o*;rating=lt=4.4", "genre!=scifi"] {
            let condition: Condition<Book> = parse_filter(&registry, filter).unwrap();
            let predicate = condition.compile(&MemoryBackend).unwrap().unwrap();
            for book in &books {
                assert_eq!(
                    predicate.test(book),
                    condition.matches(book),
                    "{filter} on {}",
                    book.title
                );
            }
        }
    }

    #[test]
    fn scope_restricts_every_query() {
        let registry = Fields::registry();
        let books = books();
        fn in_print(book: &Book) -> bool {
            book.in_print
        }
        let scope: MemoryScope<Book> = vec![in_print];
        let criteria = RootQuery::new(scope)
            .filter(&registry, "genre==scifi")
            .unwrap()
            .compile(&MemoryBackend, false)
            .unwrap();
        assert_eq!(titles(&criteria.filter(&books)), vec!["Dune", "Foundation"]);
        assert_eq!(criteria.count(&books), 2);
    }

    #[test]
    fn sort_then_page() {
        let f = Fields::new();
        let books = books();
        let mut query: RootQuery<Book, MemoryScope<Book>> = RootQuery::default();
        query.set_sort(SortSpec::new().desc(f.rating)).unwrap();
        query.set_page(Page::new(1, 3)).unwrap();
        let criteria = query.compile(&MemoryBackend, false).unwrap();
        let sort = query.to_sort(&MemoryBackend).unwrap();
        assert_eq!(
            titles(&criteria.filter_sorted(&books, sort.as_ref())),
            vec!["The Hobbit", "Dune", "Foundation"]
        );
        assert_eq!(criteria.count(&books), 6);
    }

    #[test]
    fn missing_values_sort_last() {
        let f = Fields::new();
        let books = books();
        let sort = MemoryBackend.sort(&SortSpec::new().desc(f.subtitle)).unwrap();
        let mut all: Vec<&Book> = books.iter().collect();
        sort.sort(&mut all);
        assert_eq!(all[0].title, "Foundation");
        assert_eq!(all[1].title, "Dune");
    }

    #[test]
    fn grouped_counts_ordered_by_value() {
        let f = Fields::new();
        let books = books();
        let mut query: RootQuery<Book, MemoryScope<Book>> = RootQuery::default();
        query
            .set_aggregates(
                AggregateSpec::new()
                    .with(Aggregate::count(f.title).group_by(f.genre).order_by(Dir::Desc)),
            )
            .unwrap();
        let rows = query.compile(&MemoryBackend, true).unwrap().aggregate(&books);
        let summary: Vec<_> = rows
            .iter()
            .map(|row| (row.group[0].clone(), row.value.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Some(Operand::Enum(0)), Some(Operand::from(3u64))),
                (Some(Operand::Enum(1)), Some(Operand::from(2u64))),
                (Some(Operand::Enum(2)), Some(Operand::from(1u64))),
            ]
        );
    }

    #[test]
    fn ungrouped_aggregates() {
        let f = Fields::new();
        let registry = Fields::registry();
        let books = books();
        let mut query = RootQuery::new(Vec::new()).filter(&registry, "genre==scifi").unwrap();
        query
            .set_aggregates(
                AggregateSpec::new()
                    .with(Aggregate::sum(f.year))
                    .with(Aggregate::avg(f.year))
                    .with(Aggregate::min(f.title))
                    .with(Aggregate::max(f.rating))
                    .with(Aggregate::count(f.subtitle)),
            )
            .unwrap();
        let rows = query.compile(&MemoryBackend, true).unwrap().aggregate(&books);
        let values: Vec<_> = rows.into_iter().map(|row| row.value).collect();
        assert_eq!(
            values,
            vec![
                Some(Operand::from(5900i64)),
                Some(Operand::Number(Number::F64(5900.0 / 3.0))),
                Some(Operand::from("Dune")),
                Some(Operand::from(4.3)),
                Some(Operand::from(1u64)),
            ]
        );
    }

    #[test]
    fn aggregates_over_nothing() {
        let f = Fields::new();
        let registry = Fields::registry();
        let books = books();
        let mut query = RootQuery::new(Vec::new()).filter(&registry, "year=gt=3000").unwrap();
        query
            .set_aggregates(
                AggregateSpec::new()
                    .with(Aggregate::count(f.title))
                    .with(Aggregate::sum(f.year))
                    .with(Aggregate::count(f.title).group_by(f.genre)),
            )
            .unwrap();
        let rows = query.compile(&MemoryBackend, true).unwrap().aggregate(&books);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, Some(Operand::from(0u64)));
        assert_eq!(rows[1].value, None);
    }

    #[test]
    fn integer_sum_falls_back_to_float_on_overflow() {
        let values = [Value::Number(Number::I64(i64::MAX)), Value::Number(Number::I64(1))];
        assert!(matches!(sum(&values), Some(Number::F64(_))));
        let values = [Value::Number(Number::I64(2)), Value::Number(Number::F64(0.5))];
        assert_eq!(sum(&values), Some(Number::F64(2.5)));
    }
}
