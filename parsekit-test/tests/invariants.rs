//! End-to-end checks of the invariants any well-formed grammar should
//! satisfy, run against the example grammars in `src/`: round-trip, position
//! monotonicity, memoization determinism, EOF handling, and a couple of
//! concrete parsing scenarios.

use parsekit_test::{braces, expression, tags};

#[test]
fn empty_input_against_mandatory_literal_fails_at_position_zero() {
    // A single mandatory literal `"a"` against an empty input has nothing
    // to backtrack to: the failure is recorded at position 0 and no tree
    // is produced.
    use parsekit::builder::{mandatory, GrammarBuilder};
    use parsekit::config::GrammarConfig;

    let mut builder = GrammarBuilder::new(GrammarConfig::new());
    let a = builder.text("a", "a");
    let root = builder.series("root", vec![mandatory(a)], None);
    builder.define("root", root);
    let grammar = builder.finalize().unwrap();

    let outcome = parsekit::parse(&grammar, "", None, true).unwrap();
    assert!(outcome.tree.is_none());
    assert!(!outcome.errors.is_empty());
    assert_eq!(outcome.errors[0].position, 0);
}

#[test]
fn failed_parse_with_no_mandatory_marker_names_the_expected_literal() {
    // `root = "a"` (no `§`) against "" has no series-level error to
    // surface, so `parsekit::parse` synthesizes a fallback error. It
    // should still name what was expected, not just where parsing gave up.
    use parsekit::builder::GrammarBuilder;
    use parsekit::config::GrammarConfig;

    let mut builder = GrammarBuilder::new(GrammarConfig::new());
    let root = builder.text("root", "a");
    builder.define("root", root);
    let grammar = builder.finalize().unwrap();

    let outcome = parsekit::parse(&grammar, "", None, true).unwrap();
    assert!(outcome.tree.is_none());
    assert_eq!(outcome.errors[0].position, 0);
    assert!(
        outcome.errors[0].message.contains("\"a\""),
        "message {:?} should reference the expected literal",
        outcome.errors[0].message
    );
}

#[test]
fn nested_braces_have_two_levels_of_depth() {
    let grammar = braces::grammar();
    let outcome = parsekit::parse(&grammar, "{ { } }", None, true).unwrap();
    let tree = outcome.tree.unwrap();

    let outer = tree.find("brace").unwrap();
    let inner = outer.find("brace");
    assert!(inner.is_some(), "the outer brace must contain a nested brace");
}

#[test]
fn determinism_same_input_same_tree() {
    let grammar = expression::grammar();
    let first = parsekit::parse(&grammar, "1 + 2 * (3 + 4)", None, true).unwrap();
    let second = parsekit::parse(&grammar, "1 + 2 * (3 + 4)", None, true).unwrap();

    assert_eq!(
        first.tree.unwrap().serialize_sexpr(),
        second.tree.unwrap().serialize_sexpr()
    );
}

#[test]
fn position_is_monotonic_through_a_whole_tree() {
    let grammar = expression::grammar();
    let outcome = parsekit::parse(&grammar, "1 + 2 + 3 + 4", None, true).unwrap();
    let tree = outcome.tree.unwrap();

    fn check_monotonic(node: &parsekit::Node) {
        let mut last = None;
        for child in node.children() {
            if let Some(prev) = last {
                assert!(prev <= child.position, "children must be position-monotonic");
            }
            last = Some(child.position);
            check_monotonic(child);
        }
    }
    check_monotonic(&tree);
}

#[test]
fn eof_behavior_complete_match_requires_full_consumption() {
    let grammar = expression::grammar();
    let partial = parsekit::parse(&grammar, "1 + 2 !!!", None, true).unwrap();
    assert!(!partial.errors.is_empty());

    let permitted = parsekit::parse(&grammar, "1 + 2 !!!", None, false).unwrap();
    assert!(permitted.errors.is_empty());
}

#[test]
fn sexpr_round_trips_through_tag_and_content() {
    let grammar = tags::grammar();
    let outcome = parsekit::parse(&grammar, "<div>hello</div>", None, true).unwrap();
    let tree = outcome.tree.unwrap();

    let rendered = tree.serialize_sexpr();
    assert!(rendered.contains("div"));
    assert!(rendered.contains("hello"));
}
