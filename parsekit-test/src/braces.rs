/*!
A nested-brace grammar, `B = "{" B* "}"`, rooted at a top-level `B*` — a
good scenario for exercising tree depth and repetition directly (one
`OneOrMore` production over a recursive `B`, whose recursion passes through
a `Forward` to stay structurally acyclic).
*/

use parsekit::builder::{element, mandatory, GrammarBuilder};
use parsekit::config::{GrammarConfig, LiteralWhitespace};
use parsekit::grammar::Grammar;
use regex::Regex;

/// Build the nested-brace grammar, rooted at `"document"`
/// (`B+` over the top level).
pub fn grammar() -> Grammar {
    let mut config = GrammarConfig::new();
    config.literal_whitespace = LiteralWhitespace::Both;
    let mut builder = GrammarBuilder::new(config);

    let ws = builder.whitespace("ws", Regex::new(r"\A\s*").unwrap());
    let open = builder.lit("open", "{", ws);
    let close = builder.lit("close", "}", ws);

    let brace_forward = builder.forward("brace");
    let inner_rep = builder.zero_or_more("inner_rep", brace_forward);
    let brace = builder.series(
        "brace",
        vec![element(open, false), element(inner_rep, false), mandatory(close)],
        Some("unbalanced braces, found {1}"),
    );
    builder.set_forward(brace_forward, brace);

    let document = builder.one_or_more("document", brace);
    builder.define("document", document);
    builder.define("root", document);

    builder.finalize().expect("brace grammar is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pair_produces_one_brace_node() {
        let grammar = grammar();
        let outcome = parsekit::parse(&grammar, "{}", None, true).unwrap();
        assert!(outcome.is_success());
        let tree = outcome.tree.unwrap();
        assert_eq!(tree.walk().filter(|n| &*n.tag_name == "brace").count(), 1);
    }

    #[test]
    fn nested_braces_report_expected_depth_and_count() {
        let grammar = grammar();
        let outcome = parsekit::parse(&grammar, "{ { } }", None, true).unwrap();
        assert!(outcome.is_success());
        let tree = outcome.tree.unwrap();
        let braces: Vec<_> = tree.walk().filter(|n| &*n.tag_name == "brace").collect();
        assert_eq!(braces.len(), 2);
    }

    #[test]
    fn unbalanced_braces_are_reported_as_an_error() {
        let grammar = grammar();
        let outcome = parsekit::parse(&grammar, "{ { }", None, true).unwrap();
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn position_is_monotonic_across_children() {
        let grammar = grammar();
        let outcome = parsekit::parse(&grammar, "{ } { }", None, true).unwrap();
        let tree = outcome.tree.unwrap();
        let positions: Vec<usize> = tree.children().iter().map(|c| c.position).collect();
        assert!(positions.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
