//! RSQL/FIQL filter expression parser.
//!
//! Turns a filter string such as `genre==scifi;(year=gt=1990,title==Dune*)`
//! into a generic [`Node`] tree. The parser checks syntax only: selectors,
//! operator symbols and arguments are kept as text, and any `=name=`
//! operator is accepted. Giving them meaning is the job of a [`Visitor`].
//!
//! # Grammar
//!
//! - `;` or ` and ` combines constraints with AND
//! - `,` or ` or ` combines constraints with OR (AND binds tighter)
//! - parentheses group constraints
//! - operators are `==`, `!=` or `=name=`
//! - arguments are unreserved text, `'quoted'` / `"quoted"` strings with
//!   backslash escapes, or a non-empty `(a,b,c)` group
//!
//! ```rust
//! use sift_rsql::{parse, Node};
//!
//! let node = parse("year=in=(1999,2001);title=='The Matrix'").unwrap();
//! match node {
//!     Node::And(children) => assert_eq!(children.len(), 2),
//!     _ => unreachable!(),
//! }
//! ```

mod ast;
mod error;
mod parser;

pub use ast::{Comparison, Node, Visitor};
pub use error::{ParseError, Result};
pub use parser::{parse, Parser};
