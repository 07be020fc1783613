//! SQL rendering backend.
//!
//! Renders conditions as SQL fragments with `?` placeholders and a separate
//! list of bind parameters, in placeholder order. Identifiers are double
//! quoted. Field names map to columns of the same name unless overridden
//! with [`SqlBackend::with_column`].
//!
//! The scope is a list of trusted raw SQL fragments (for example a tenant
//! restriction) ANDed in front of the compiled predicate.

use std::collections::HashMap;
use std::fmt;

use crate::aggregate::{Aggregate, AggregateFunction};
use crate::backend::PredicateFactory;
use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::op::{Connective, Operator};
use crate::query::Page;
use crate::sort::{Dir, SortSpec};
use crate::value::Operand;

/// Predicate factory producing SQL fragments.
#[derive(Debug, Clone, Default)]
pub struct SqlBackend {
    columns: HashMap<&'static str, String>,
}

impl SqlBackend {
    pub fn new() -> Self {
        SqlBackend::default()
    }

    /// Maps a field to a column with a different name.
    pub fn with_column(mut self, field: &'static str, column: impl Into<String>) -> Self {
        self.columns.insert(field, column.into());
        self
    }

    fn column(&self, field: &str) -> String {
        quote_identifier(self.columns.get(field).map_or(field, String::as_str))
    }
}

/// Double-quotes an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// A `WHERE` fragment and its bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
    pub sql: String,
    pub params: Vec<Operand>,
}

impl fmt::Display for SqlPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// An aggregate select expression with its grouping columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlAggregate {
    pub expression: String,
    pub group_by: Vec<String>,
    pub order_by: Option<Dir>,
}

/// An `ORDER BY` key list.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlSort {
    pub keys: Vec<String>,
}

impl SqlSort {
    /// The full clause, or an empty string when there are no keys.
    pub fn clause(&self) -> String {
        if self.keys.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", self.keys.join(", "))
        }
    }
}

impl<R> PredicateFactory<R> for SqlBackend {
    type Scope = Vec<String>;
    type Predicate = SqlPredicate;
    type Aggregate = SqlAggregate;
    type Sort = SqlSort;
    type Criteria = SqlCriteria;

    fn comparison(
        &self,
        field: &FieldDescriptor<R>,
        operator: Operator,
        operands: &[Operand],
    ) -> Result<SqlPredicate> {
        let column = self.column(field.name());
        let sql = match operator {
            Operator::Equal => format!("{column} = ?"),
            Operator::NotEqual => format!("{column} <> ?"),
            Operator::GreaterThan => format!("{column} > ?"),
            Operator::GreaterThanOrEqual => format!("{column} >= ?"),
            Operator::LessThan => format!("{column} < ?"),
            Operator::LessThanOrEqual => format!("{column} <= ?"),
            Operator::In => format!("{column} IN ({})", placeholders(operands.len())),
            Operator::NotIn => format!("{column} NOT IN ({})", placeholders(operands.len())),
            Operator::Like => format!("{column} LIKE ?"),
            Operator::NotLike => format!("{column} NOT LIKE ?"),
            Operator::IsNull => format!("{column} IS NULL"),
            Operator::NotNull => format!("{column} IS NOT NULL"),
            Operator::Between => format!("{column} BETWEEN ? AND ?"),
        };
        Ok(SqlPredicate {
            sql,
            params: operands.to_vec(),
        })
    }

    fn combine(&self, connective: Connective, predicates: Vec<SqlPredicate>) -> SqlPredicate {
        let separator = match connective {
            Connective::And => " AND ",
            Connective::Or => " OR ",
        };
        let mut parts = Vec::with_capacity(predicates.len());
        let mut params = Vec::new();
        for predicate in predicates {
            parts.push(predicate.sql);
            params.extend(predicate.params);
        }
        SqlPredicate {
            sql: format!("({})", parts.join(separator)),
            params,
        }
    }

    fn aggregate(&self, aggregate: &Aggregate<R>) -> Result<SqlAggregate> {
        let function = match aggregate.function() {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        };
        Ok(SqlAggregate {
            expression: format!("{function}({})", self.column(aggregate.field().name())),
            group_by: aggregate
                .group_fields()
                .iter()
                .map(|g| self.column(g.name()))
                .collect(),
            order_by: aggregate.ordering(),
        })
    }

    fn sort(&self, sort: &SortSpec<R>) -> Result<SqlSort> {
        Ok(SqlSort {
            keys: sort
                .keys()
                .iter()
                .map(|key| {
                    let dir = if key.dir.is_desc() { "DESC" } else { "ASC" };
                    format!("{} {dir}", self.column(key.field.name()))
                })
                .collect(),
        })
    }

    fn criteria(
        &self,
        scope: &Vec<String>,
        predicate: Option<SqlPredicate>,
        aggregates: Vec<SqlAggregate>,
        page: Option<Page>,
    ) -> Result<SqlCriteria> {
        let mut conditions: Vec<String> = scope.iter().map(|s| format!("({s})")).collect();
        let mut params = Vec::new();
        if let Some(predicate) = predicate {
            conditions.push(predicate.sql);
            params = predicate.params;
        }
        Ok(SqlCriteria {
            where_clause: (!conditions.is_empty()).then(|| conditions.join(" AND ")),
            params,
            aggregates,
            page,
        })
    }
}

/// Rendered criteria for one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCriteria {
    where_clause: Option<String>,
    params: Vec<Operand>,
    aggregates: Vec<SqlAggregate>,
    page: Option<Page>,
}

impl SqlCriteria {
    /// The `WHERE` condition without the keyword, if anything restricts
    /// the query.
    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    /// Bind parameters in placeholder order.
    pub fn params(&self) -> &[Operand] {
        &self.params
    }

    pub fn aggregates(&self) -> &[SqlAggregate] {
        &self.aggregates
    }

    pub fn page(&self) -> Option<Page> {
        self.page
    }

    /// Renders a complete `SELECT` against `table`.
    ///
    /// Without aggregates this selects whole rows, ordered by `sort` and
    /// windowed by the page. With aggregates it selects the grouping
    /// columns and aggregate expressions, grouped by every grouping column
    /// and ordered by the aggregates that ask for it; `sort` is not used.
    pub fn to_select(&self, table: &str, sort: Option<&SqlSort>) -> String {
        let (select, group) = if self.aggregates.is_empty() {
            ("*".to_string(), String::new())
        } else {
            let mut groups: Vec<&str> = Vec::new();
            for column in self.aggregates.iter().flat_map(|a| &a.group_by) {
                if !groups.contains(&column.as_str()) {
                    groups.push(column);
                }
            }
            let group = if groups.is_empty() {
                String::new()
            } else {
                format!(" GROUP BY {}", groups.join(", "))
            };
            let mut select = groups;
            select.extend(self.aggregates.iter().map(|a| a.expression.as_str()));
            (select.join(", "), group)
        };

        let mut sql = format!("SELECT {select} FROM {}", quote_identifier(table));
        if let Some(condition) = &self.where_clause {
            sql.push_str(&format!(" WHERE {condition}"));
        }
        sql.push_str(&group);

        let order = if self.aggregates.is_empty() {
            sort.map(SqlSort::clause).unwrap_or_default()
        } else {
            self.aggregate_order().clause()
        };
        if !order.is_empty() {
            sql.push(' ');
            sql.push_str(&order);
        }

        if let Some(page) = self.page {
            if let Some(limit) = page.limit {
                sql.push_str(&format!(" LIMIT {limit}"));
            }
            if page.offset > 0 {
                sql.push_str(&format!(" OFFSET {}", page.offset));
            }
        }
        sql
    }

    fn aggregate_order(&self) -> SqlSort {
        SqlSort {
            keys: self
                .aggregates
                .iter()
                .filter_map(|a| {
                    a.order_by.map(|dir| {
                        let dir = if dir.is_desc() { "DESC" } else { "ASC" };
                        format!("{} {dir}", a.expression)
                    })
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateSpec;
    use crate::condition::Condition;
    use crate::filter::parse_filter;
    use crate::query::RootQuery;
    use crate::testing::{Book, Fields};
    use insta::assert_snapshot;

    fn render(filter: &str) -> SqlPredicate {
        let registry = Fields::registry();
        let condition: Condition<Book> = parse_filter(&registry, filter).unwrap();
        condition.compile(&SqlBackend::new()).unwrap().unwrap()
    }

    #[test]
    fn comparison_fragments() {
        assert_snapshot!(render("year=ge=1950").sql, @r#""year" >= ?"#);
        assert_snapshot!(render("year!=1950").sql, @r#""year" <> ?"#);
        assert_snapshot!(render("genre=out=(scifi,fantasy)").sql, @r#""genre" NOT IN (?, ?)"#);
        assert_snapshot!(render("title==Dune*").sql, @r#""title" LIKE ?"#);
        assert_snapshot!(render("subtitle=notnull=").sql, @r#""subtitle" IS NOT NULL"#);
    }

    #[test]
    fn groups_are_parenthesized_with_params_in_order() {
        let predicate = render("year=lt=1970;(title=like=D%,genre=in=(fantasy,mystery))");
        assert_snapshot!(
            predicate.sql,
            @r#"("year" < ? AND ("title" LIKE ? OR "genre" IN (?, ?)))"#
        );
        assert_eq!(
            predicate.params,
            vec![
                Operand::from(1970i64),
                Operand::from("D%"),
                Operand::Enum(1),
                Operand::Enum(2),
            ]
        );
    }

    #[test]
    fn between_binds_both_bounds() {
        let f = Fields::new();
        let condition = Condition::leaf(
            f.year,
            Operator::Between,
            vec![Operand::from(1950i64), Operand::from(1970i64)],
        )
        .unwrap();
        let predicate = condition.compile(&SqlBackend::new()).unwrap().unwrap();
        assert_snapshot!(predicate.sql, @r#""year" BETWEEN ? AND ?"#);
        assert_eq!(predicate.params.len(), 2);
    }

    #[test]
    fn column_overrides_are_quoted() {
        let backend = SqlBackend::new().with_column("in_print", "Print\"Status");
        let registry = Fields::registry();
        let condition = parse_filter(&registry, "in_print==true").unwrap();
        let predicate = condition.compile(&backend).unwrap().unwrap();
        assert_snapshot!(predicate.sql, @r#""Print""Status" = ?"#);
    }

    #[test]
    fn row_select_with_scope_sort_and_page() {
        let f = Fields::new();
        let registry = Fields::registry();
        let mut query = RootQuery::new(vec!["deleted_at IS NULL".to_string()])
            .filter(&registry, "rating=gt=4;author!=null")
            .unwrap();
        query.set_sort(SortSpec::new().desc(f.rating).asc(f.title)).unwrap();
        query.set_page(Page::new(20, 10)).unwrap();

        let backend = SqlBackend::new();
        let criteria = query.compile(&backend, false).unwrap();
        let sort = query.to_sort(&backend).unwrap();
        assert_snapshot!(
            criteria.to_select("books", sort.as_ref()),
            @r#"SELECT * FROM "books" WHERE (deleted_at IS NULL) AND ("rating" > ? AND "author" IS NOT NULL) ORDER BY "rating" DESC, "title" ASC LIMIT 10 OFFSET 20"#
        );
        assert_eq!(criteria.params(), &[Operand::from(4i64)]);
    }

    #[test]
    fn aggregate_select() {
        let f = Fields::new();
        let registry = Fields::registry();
        let mut query = RootQuery::new(Vec::new())
            .filter(&registry, "in_print==true")
            .unwrap();
        query
            .set_aggregates(
                AggregateSpec::new()
                    .with(Aggregate::count(f.title).group_by(f.genre).order_by(Dir::Desc))
                    .with(Aggregate::avg(f.rating).group_by(f.genre)),
            )
            .unwrap();
        query.set_page(Page::first(5)).unwrap();

        let criteria = query.compile(&SqlBackend::new(), true).unwrap();
        assert_snapshot!(
            criteria.to_select("books", None),
            @r#"SELECT "genre", COUNT("title"), AVG("rating") FROM "books" WHERE "in_print" = ? GROUP BY "genre" ORDER BY COUNT("title") DESC"#
        );
    }

    #[test]
    fn unrestricted_query_has_no_where_clause() {
        let query: RootQuery<Book, Vec<String>> = RootQuery::default();
        let criteria = query.compile(&SqlBackend::new(), false).unwrap();
        assert_eq!(criteria.where_clause(), None);
        assert_snapshot!(criteria.to_select("books", None), @r#"SELECT * FROM "books""#);
    }
}
