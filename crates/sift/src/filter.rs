//! Filter-language front end.
//!
//! Turns an RSQL/FIQL expression such as
//!
//! ```text
//! year=lt=1970;(title==Dune*,subtitle=notnull=)
//! ```
//!
//! into a [`Condition`]. The pipeline is:
//!
//! 1. [`preprocess`] gives null-check operators an explicit `null` argument
//!    and trims trailing separators.
//! 2. `sift_rsql` parses the text into a generic node tree.
//! 3. [`FilterVisitor`] walks that tree, resolving selectors through the
//!    [`FieldRegistry`], comparator symbols through [`OPERATORS`], and
//!    arguments through the [`ArgumentConverter`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use sift_rsql::{Comparison, Node, Visitor};
use tracing::{debug, trace};

use crate::condition::Condition;
use crate::config::CompilerConfig;
use crate::convert::ArgumentConverter;
use crate::error::{Result, SiftError};
use crate::op::Operator;
use crate::registry::FieldRegistry;

/// Comparator symbols and the operators they map to.
pub const OPERATORS: &[(&str, Operator)] = &[
    ("==", Operator::Equal),
    ("!=", Operator::NotEqual),
    ("=gt=", Operator::GreaterThan),
    ("=ge=", Operator::GreaterThanOrEqual),
    ("=lt=", Operator::LessThan),
    ("=le=", Operator::LessThanOrEqual),
    ("=in=", Operator::In),
    ("=out=", Operator::NotIn),
    ("=like=", Operator::Like),
    ("=unlike=", Operator::NotLike),
    ("=notlike=", Operator::NotLike),
    ("=nonlike=", Operator::NotLike),
    ("=null=", Operator::IsNull),
    ("=isnull=", Operator::IsNull),
    ("=notnull=", Operator::NotNull),
    ("=nonnull=", Operator::NotNull),
];

/// Looks up the operator for a comparator symbol.
pub fn resolve_operator(symbol: &str) -> Result<Operator> {
    OPERATORS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, op)| *op)
        .ok_or_else(|| SiftError::UnsupportedOperator {
            symbol: symbol.to_string(),
        })
}

// A null-check operator with no argument: followed by a separator, a
// closing paren, whitespace, or the end of input. Quoted arguments are
// matched first so their contents are never rewritten.
static BARE_NULL_CHECK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|(=(?:null|isnull|notnull|nonnull)=)([;,)\s]|$)"#,
    )
    .expect("null-check pattern is valid")
});

/// Normalizes null-check comparisons so every one carries an argument.
///
/// `field=isnull=` becomes `field=isnull=null`; trailing `;`, `,` and
/// whitespace are trimmed. Quoted arguments are left as they are. The
/// function is idempotent.
pub fn preprocess(input: &str) -> String {
    let rewritten = BARE_NULL_CHECK.replace_all(input, |caps: &Captures<'_>| {
        match (caps.get(1), caps.get(2)) {
            (Some(operator), Some(next)) => {
                format!("{}null{}", operator.as_str(), next.as_str())
            }
            _ => caps[0].to_string(),
        }
    });
    let trimmed = rewritten
        .trim_end_matches(|c: char| c == ';' || c == ',' || c.is_whitespace())
        .to_string();
    if trimmed != input {
        trace!(input, output = %trimmed, "preprocessed filter");
    }
    trimmed
}

/// Builds conditions from parsed filter expressions.
pub struct FilterVisitor<'r, R> {
    registry: &'r FieldRegistry<R>,
    converter: ArgumentConverter,
}

impl<'r, R> FilterVisitor<'r, R> {
    pub fn new(registry: &'r FieldRegistry<R>) -> Self {
        FilterVisitor::with_config(registry, CompilerConfig::default())
    }

    pub fn with_config(registry: &'r FieldRegistry<R>, config: CompilerConfig) -> Self {
        FilterVisitor {
            registry,
            converter: ArgumentConverter::new(config),
        }
    }

    /// Parses a filter expression into a condition.
    ///
    /// Blank input places no restriction and yields an empty AND group.
    pub fn parse(&mut self, input: &str) -> Result<Condition<R>> {
        let prepared = preprocess(input);
        if prepared.trim().is_empty() {
            return Ok(Condition::all());
        }
        let node = sift_rsql::parse(&prepared)?;
        let condition = node.accept(self)?;
        debug!(
            input_len = input.len(),
            leaves = condition.leaf_count(),
            "parsed filter"
        );
        Ok(condition)
    }

    fn visit_children(&mut self, children: &[Node]) -> Result<Vec<Condition<R>>> {
        children.iter().map(|child| child.accept(self)).collect()
    }
}

impl<R> Visitor for FilterVisitor<'_, R> {
    type Output = Condition<R>;
    type Error = SiftError;

    fn visit_and(&mut self, children: &[Node]) -> Result<Condition<R>> {
        self.visit_children(children).map(Condition::And)
    }

    fn visit_or(&mut self, children: &[Node]) -> Result<Condition<R>> {
        self.visit_children(children).map(Condition::Or)
    }

    fn visit_comparison(&mut self, comparison: &Comparison) -> Result<Condition<R>> {
        let field = self.registry.lookup(&comparison.selector)?;
        let operator = resolve_operator(&comparison.operator)?;
        let converted = self
            .converter
            .convert(field, operator, &comparison.arguments)?;
        Condition::leaf(*field, converted.operator, converted.operands)
    }
}

/// Parses a filter expression with the default configuration.
pub fn parse_filter<R>(registry: &FieldRegistry<R>, input: &str) -> Result<Condition<R>> {
    FilterVisitor::new(registry).parse(input)
}
