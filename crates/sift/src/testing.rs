//! Shared fixtures for unit tests.

use crate::aggregate::Aggregate;
use crate::backend::PredicateFactory;
use crate::error::Result;
use crate::field::{FieldDescriptor, FieldType};
use crate::op::{Connective, Operator};
use crate::query::Page;
use crate::registry::FieldRegistry;
use crate::sort::SortSpec;
use crate::value::{Number, Operand, Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Genre {
    SciFi = 0,
    Fantasy = 1,
    Mystery = 2,
}

impl FieldType for Genre {
    const VALUE_TYPE: ValueType = ValueType::Enum;

    fn into_operand(self) -> Operand {
        Operand::Enum(self as u32)
    }
}

pub const GENRES: &[(&str, u32)] = &[("scifi", 0), ("fantasy", 1), ("mystery", 2)];

#[derive(Debug, Clone)]
pub struct Book {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
    pub year: i64,
    pub rating: f64,
    pub in_print: bool,
    pub genre: Genre,
}

fn book(
    title: &str,
    subtitle: Option<&str>,
    author: &str,
    year: i64,
    rating: f64,
    in_print: bool,
    genre: Genre,
) -> Book {
    Book {
        title: title.into(),
        subtitle: subtitle.map(String::from),
        author: author.into(),
        year,
        rating,
        in_print,
        genre,
    }
}

pub fn books() -> Vec<Book> {
    vec![
        book("Dune", None, "Frank Herbert", 1965, 4.3, true, Genre::SciFi),
        book("Foundation", Some("The First Novel"), "Isaac Asimov", 1951, 4.2, true, Genre::SciFi),
        book("The Hobbit", None, "J. R. R. Tolkien", 1937, 4.4, true, Genre::Fantasy),
        book("Gone Girl", None, "Gillian Flynn", 2012, 4.0, true, Genre::Mystery),
        book("The Name of the Wind", None, "Patrick Rothfuss", 2007, 4.5, false, Genre::Fantasy),
        book("Neuromancer", None, "William Gibson", 1984, 3.9, false, Genre::SciFi),
    ]
}

/// Descriptors for every [`Book`] field.
pub struct Fields {
    pub title: FieldDescriptor<Book>,
    pub subtitle: FieldDescriptor<Book>,
    pub author: FieldDescriptor<Book>,
    pub year: FieldDescriptor<Book>,
    pub rating: FieldDescriptor<Book>,
    pub in_print: FieldDescriptor<Book>,
    pub genre: FieldDescriptor<Book>,
}

impl Fields {
    pub fn new() -> Self {
        Fields {
            title: FieldDescriptor::new("title", ValueType::String, |b| Value::String(&b.title)),
            subtitle: FieldDescriptor::new("subtitle", ValueType::String, |b| {
                b.subtitle.as_deref().map_or(Value::None, Value::String)
            }),
            author: FieldDescriptor::new("author", ValueType::String, |b| Value::String(&b.author)),
            year: FieldDescriptor::new("year", ValueType::Number, |b| {
                Value::Number(Number::I64(b.year))
            }),
            rating: FieldDescriptor::new("rating", ValueType::Number, |b| {
                Value::Number(Number::F64(b.rating))
            }),
            in_print: FieldDescriptor::new("in_print", ValueType::Bool, |b| {
                Value::Bool(b.in_print)
            }),
            genre: FieldDescriptor::enumeration("genre", GENRES, |b| Value::Enum(b.genre as u32)),
        }
    }

    pub fn registry() -> FieldRegistry<Book> {
        let f = Fields::new();
        let mut registry = FieldRegistry::new();
        for descriptor in [f.title, f.subtitle, f.author, f.year, f.rating, f.in_print, f.genre] {
            registry.register(descriptor).unwrap();
        }
        registry
    }
}

/// A factory that renders predicates as readable strings.
pub struct Trace;

#[derive(Debug, PartialEq)]
pub struct Traced {
    pub scope: Vec<String>,
    pub predicate: Option<String>,
    pub aggregates: Vec<String>,
    pub page: Option<Page>,
}

impl<R> PredicateFactory<R> for Trace {
    type Scope = Vec<String>;
    type Predicate = String;
    type Aggregate = String;
    type Sort = String;
    type Criteria = Traced;

    fn comparison(
        &self,
        field: &FieldDescriptor<R>,
        operator: Operator,
        operands: &[Operand],
    ) -> Result<String> {
        let operands: Vec<_> = operands.iter().map(Operand::to_string).collect();
        let mut out = format!("{} {}", field.name(), operator);
        if !operands.is_empty() {
            out.push(' ');
            out.push_str(&operands.join(","));
        }
        Ok(out)
    }

    fn combine(&self, connective: Connective, predicates: Vec<String>) -> String {
        format!("({})", predicates.join(&format!(" {} ", connective.as_str())))
    }

    fn aggregate(&self, aggregate: &Aggregate<R>) -> Result<String> {
        let mut out = format!("{}({})", aggregate.function(), aggregate.field().name());
        if !aggregate.group_fields().is_empty() {
            let groups: Vec<_> = aggregate.group_fields().iter().map(|g| g.name()).collect();
            out.push_str(&format!(" by {}", groups.join(",")));
        }
        if let Some(dir) = aggregate.ordering() {
            out.push_str(&format!(" {dir}"));
        }
        Ok(out)
    }

    fn sort(&self, sort: &SortSpec<R>) -> Result<String> {
        let keys: Vec<_> = sort
            .keys()
            .iter()
            .map(|k| format!("{} {}", k.field.name(), k.dir))
            .collect();
        Ok(keys.join(", "))
    }

    fn criteria(
        &self,
        scope: &Vec<String>,
        predicate: Option<String>,
        aggregates: Vec<String>,
        page: Option<Page>,
    ) -> Result<Traced> {
        Ok(Traced {
            scope: scope.clone(),
            predicate,
            aggregates,
            page,
        })
    }
}
