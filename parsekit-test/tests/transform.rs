//! Exercises `parsekit::transform::ProcessingTable` against the expression
//! grammar's CST, and `parsekit::config`'s disposable/drop post-processing
//! against the brace grammar.

use std::sync::Arc;

use parsekit::transform::{Operation, ProcessingTable, Selector};
use parsekit_test::{braces, expression};

#[test]
fn replace_by_single_child_unwraps_trivial_parens() {
    let grammar = expression::grammar();
    let outcome = parsekit::parse(&grammar, "(42)", None, true).unwrap();
    let mut tree = outcome.tree.unwrap();

    let mut table = ProcessingTable::new();
    table.register(
        Selector::Tag("paren".into()),
        vec![Operation::RemoveBrackets, Operation::ReplaceBySingleChild],
    );
    table.apply(&mut tree);

    assert!(tree.find("paren").is_none());
}

#[test]
fn transform_content_uppercases_every_number() {
    let grammar = expression::grammar();
    let outcome = parsekit::parse(&grammar, "1 + 2", None, true).unwrap();
    let mut tree = outcome.tree.unwrap();

    let mut table = ProcessingTable::new();
    table.register(
        Selector::Tag("number".into()),
        vec![Operation::TransformContent(Arc::new(|s| format!("[{s}]")))],
    );
    table.apply(&mut tree);

    let first_number = tree.find("number").unwrap();
    assert_eq!(first_number.content(), "[1]");
}

#[test]
fn brace_grammar_whitespace_nodes_are_dropped_by_default() {
    // `Whitespace` parsers never retain a node in the first place (the base
    // primitive's own behavior — see `parsekit_primitives::parser`), so no
    // `ws`-tagged node should ever appear in a parsed tree regardless of
    // `GrammarConfig`.
    let grammar = braces::grammar();
    let outcome = parsekit::parse(&grammar, "{ { } }", None, true).unwrap();
    let tree = outcome.tree.unwrap();
    assert!(tree.find("ws").is_none());
}
