//! Generic parse tree for RSQL expressions.
//!
//! The tree carries no semantics: selectors, operator symbols and arguments
//! are kept exactly as written (quotes removed). Interpreting them is left
//! to a [`Visitor`].

use std::fmt;

/// A node of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Conjunction of two or more nodes (`;` or `and`).
    And(Vec<Node>),
    /// Disjunction of two or more nodes (`,` or `or`).
    Or(Vec<Node>),
    /// A single `selector op argument` constraint.
    Comparison(Comparison),
}

/// A single comparison constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// The selector, usually a field name.
    pub selector: String,
    /// The operator symbol, e.g. `==` or `=in=`.
    pub operator: String,
    /// Arguments; more than one only when written as a group.
    pub arguments: Vec<String>,
}

impl Comparison {
    pub fn new<I, S>(selector: impl Into<String>, operator: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Comparison {
            selector: selector.into(),
            operator: operator.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Walks a [`Node`] tree, one method per node kind.
///
/// [`Node::accept`] dispatches to the matching method; implementations
/// recurse into children by calling `accept` on them.
pub trait Visitor {
    type Output;
    type Error;

    fn visit_and(&mut self, children: &[Node]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, children: &[Node]) -> Result<Self::Output, Self::Error>;
    fn visit_comparison(&mut self, comparison: &Comparison) -> Result<Self::Output, Self::Error>;
}

impl Node {
    /// Dispatches this node to the visitor.
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        match self {
            Node::And(children) => visitor.visit_and(children),
            Node::Or(children) => visitor.visit_or(children),
            Node::Comparison(comparison) => visitor.visit_comparison(comparison),
        }
    }

    /// Number of comparison nodes in the tree.
    pub fn comparison_count(&self) -> usize {
        match self {
            Node::And(children) | Node::Or(children) => {
                children.iter().map(Node::comparison_count).sum()
            }
            Node::Comparison(_) => 1,
        }
    }
}

pub(crate) fn is_reserved(c: char) -> bool {
    matches!(
        c,
        '"' | '\'' | '(' | ')' | ';' | ',' | '=' | '!' | '~' | '<' | '>'
    ) || c.is_whitespace()
}

fn write_argument(f: &mut fmt::Formatter<'_>, arg: &str) -> fmt::Result {
    if !arg.is_empty() && !arg.chars().any(is_reserved) {
        return f.write_str(arg);
    }
    f.write_str("'")?;
    for c in arg.chars() {
        if c == '\'' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("'")
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.selector, self.operator)?;
        if let [single] = self.arguments.as_slice() {
            return write_argument(f, single);
        }
        f.write_str("(")?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write_argument(f, arg)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Comparison(c) => c.fmt(f),
            Node::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    // OR binds looser than AND, so it needs parentheses here
                    if matches!(child, Node::Or(_)) {
                        write!(f, "({child})")?;
                    } else {
                        child.fmt(f)?;
                    }
                }
                Ok(())
            }
            Node::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    child.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}
