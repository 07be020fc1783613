//! Sift - query-condition compiler.
//!
//! Sift turns query conditions into backend criteria. Conditions come from
//! two front ends that produce the same [`Condition`] tree:
//!
//! - a fluent [`ConditionBuilder`] with typed and name-keyed operations
//! - an RSQL/FIQL filter language (`year=lt=1970;title==Dune*`)
//!
//! A [`RootQuery`] then combines conditions with a backend scope, an
//! optional aggregate and sort spec and a page, and compiles everything
//! through a [`PredicateFactory`]. Two factories are included: an
//! in-memory evaluator and a SQL fragment renderer.
//!
//! # Quick Start
//!
//! ```rust
//! use sift::backend::MemoryBackend;
//! use sift::{FieldDescriptor, FieldRegistry, Number, RootQuery, Value, ValueType};
//!
//! // Define your data
//! struct Book {
//!     title: String,
//!     subtitle: Option<String>,
//!     year: i64,
//! }
//!
//! // Register the queryable fields once
//! let registry = FieldRegistry::new()
//!     .with(FieldDescriptor::new("title", ValueType::String, |b: &Book| {
//!         Value::String(&b.title)
//!     }))
//!     .unwrap()
//!     .with(FieldDescriptor::new("subtitle", ValueType::String, |b: &Book| {
//!         b.subtitle.as_deref().map_or(Value::None, Value::String)
//!     }))
//!     .unwrap()
//!     .with(FieldDescriptor::new("year", ValueType::Number, |b: &Book| {
//!         Value::Number(Number::I64(b.year))
//!     }))
//!     .unwrap();
//!
//! let books = vec![
//!     Book { title: "Dune".into(), subtitle: None, year: 1965 },
//!     Book { title: "Dune Messiah".into(), subtitle: None, year: 1969 },
//!     Book { title: "Neuromancer".into(), subtitle: None, year: 1984 },
//! ];
//!
//! // Compile a filter and run it
//! let criteria = RootQuery::new(Vec::new())
//!     .filter(&registry, "title==Dune*;year=lt=1968;subtitle=isnull=")
//!     .unwrap()
//!     .compile(&MemoryBackend, false)
//!     .unwrap();
//!
//! let results = criteria.filter(&books);
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].title, "Dune");
//! ```
//!
//! # Filter Language
//!
//! | Symbol | Operator |
//! |--------|----------|
//! | `==`, `!=` | `Equal`, `NotEqual` |
//! | `=gt=`, `=ge=`, `=lt=`, `=le=` | ordering comparisons |
//! | `=in=`, `=out=` | `In`, `NotIn` |
//! | `=like=` | `Like` |
//! | `=unlike=`, `=notlike=`, `=nonlike=` | `NotLike` |
//! | `=null=`, `=isnull=` | `IsNull` |
//! | `=notnull=`, `=nonnull=` | `NotNull` |
//!
//! `;` (or `and`) is AND, `,` (or `or`) is OR, and AND binds tighter.
//! `title==Dune*` is a pattern match and `title==null` a null check.
//!
//! # Field Types and Operators
//!
//! | Type | Operators |
//! |------|-----------|
//! | String | all |
//! | Number | all except `Like`, `NotLike` |
//! | Timestamp | all except `Like`, `NotLike` |
//! | Enum | `Equal`, `NotEqual`, `In`, `NotIn`, null checks |
//! | Bool | `Equal`, `NotEqual`, `In`, `NotIn`, null checks |
//!
//! A null field value only satisfies `IsNull`.

pub mod backend;

mod aggregate;
mod builder;
mod condition;
mod config;
mod convert;
mod error;
mod field;
mod filter;
mod op;
mod pattern;
mod query;
mod registry;
mod sort;
mod value;

#[cfg(test)]
mod testing;

// Re-export public API
pub use aggregate::{Aggregate, AggregateFunction, AggregateSpec};
pub use backend::PredicateFactory;
pub use builder::ConditionBuilder;
pub use condition::{evaluate, Condition, Leaf};
pub use config::CompilerConfig;
pub use convert::{ArgumentConverter, Converted};
pub use error::{Result, SiftError};
pub use field::{Accessor, Field, FieldDescriptor, FieldType, Ordered, Text, ValueParser};
pub use filter::{parse_filter, preprocess, resolve_operator, FilterVisitor, OPERATORS};
pub use op::{Arity, Connective, Operator, ValueClass};
pub use pattern::{like_matches, like_to_regex};
pub use query::{Page, RootQuery};
pub use registry::FieldRegistry;
pub use sort::{compare_nulls_last, Dir, SortKey, SortSpec};
pub use value::{compare_values, Number, Operand, Timestamp, Value, ValueType};
