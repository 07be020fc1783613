//! Property-based tests for the RSQL parser.

use proptest::prelude::*;
use sift_rsql::{parse, Comparison, Node};

fn comparison_strategy() -> impl Strategy<Value = Node> {
    (
        "[a-z][a-z0-9_.]{0,6}",
        prop::sample::select(vec!["==", "!=", "=gt=", "=in=", "=like="]),
        prop::collection::vec("[a-zA-Z0-9 ,;()'\"=!*%\\\\-]{0,8}", 1..4),
    )
        .prop_map(|(selector, op, args)| Node::Comparison(Comparison::new(selector, op, args)))
}

// AND children are never AND nodes and OR children are never OR nodes,
// matching the flattened shape the parser produces.
fn tree_strategy() -> impl Strategy<Value = Node> {
    comparison_strategy().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(|children| {
                Node::And(children.into_iter().flat_map(flatten_and).collect())
            }),
            prop::collection::vec(inner, 2..4).prop_map(|children| {
                Node::Or(children.into_iter().flat_map(flatten_or).collect())
            }),
        ]
    })
}

fn flatten_and(node: Node) -> Vec<Node> {
    match node {
        Node::And(children) => children,
        other => vec![other],
    }
}

fn flatten_or(node: Node) -> Vec<Node> {
    match node {
        Node::Or(children) => children,
        other => vec![other],
    }
}

proptest! {
    /// Rendering a tree and parsing it back yields the same tree.
    #[test]
    fn display_then_parse_is_identity(tree in tree_strategy()) {
        let rendered = tree.to_string();
        let parsed = parse(&rendered);
        prop_assert_eq!(parsed, Ok(tree), "rendered: {}", rendered);
    }

    /// The parser never panics, whatever the input.
    #[test]
    fn parser_never_panics(input in "\\PC{0,40}") {
        let _ = parse(&input);
    }

    /// Comparison count is preserved by a render/parse cycle.
    #[test]
    fn comparison_count_survives_rendering(tree in tree_strategy()) {
        let parsed = parse(&tree.to_string()).unwrap();
        prop_assert_eq!(parsed.comparison_count(), tree.comparison_count());
    }
}
