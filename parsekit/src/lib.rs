/*!
A grammar-driven parsing toolkit: build a [`grammar::Grammar`] out of
[`builder::GrammarBuilder`] primitives and combinators, then [`parse`]
source text against it to get a concrete syntax tree plus an error/warning
log, optionally post-processed by a [`transform::ProcessingTable`].

This crate is the engine; the EBNF-like grammar *source* syntax and any
code-generator that compiles it down to [`builder::GrammarBuilder`] calls are
out of scope — a caller either builds a [`grammar::Grammar`] by hand, as
`parsekit-test`'s example grammars do, or plugs in an external front end
that emits the same calls.
*/

#![deny(missing_docs)]

pub mod builder;
pub mod config;
pub mod error;
pub mod grammar;
pub mod history;
pub mod recovery;
pub mod reduce;
pub mod transform;

pub use parsekit_primitives::{Node, XmlTagKind};

use parsekit_primitives::{eval, EvalContext, ParseState};

use crate::error::{partition_records, GrammarError, ParseError, Warning};
use crate::grammar::Grammar;

/// The result of a [`parse`] call: the tree built so far (complete if
/// `errors` is empty or every error was recovered), plus the errors and
/// warnings recorded along the way.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The root node, if the start parser matched at all. `None` only when
    /// the start production itself failed outright with no recorded
    /// recovery (a totally unrecognizable input) — see `errors` for why.
    pub tree: Option<Node>,
    /// Recorded, non-fatal parse errors: a mandatory element failed and
    /// parsing recovered at a resume point.
    pub errors: Vec<ParseError>,
    /// Recorded grammar-level warnings (e.g. a resume notice).
    pub warnings: Vec<Warning>,
}

impl ParseOutcome {
    /// `true` if parsing produced a tree with no unrecovered errors — the
    /// "succeeded outright" case, as opposed to a partial tree salvaged by
    /// mandatory-marker recovery.
    pub fn is_success(&self) -> bool {
        self.tree.is_some() && self.errors.is_empty()
    }
}

/// Parse `source` against `grammar`'s production named `start_name`
/// (`"root"` if not given), applying the grammar's configured
/// disposable/drop/reduction postprocessing to the resulting tree.
///
/// If `complete_match` is `true`, the parse additionally requires that the
/// start production consume the entire input; any remaining bytes are
/// reported as an error at the first unconsumed position rather than
/// silently ignored.
pub fn parse(
    grammar: &Grammar,
    source: &str,
    start_name: Option<&str>,
    complete_match: bool,
) -> Result<ParseOutcome, GrammarError> {
    let start_name = start_name.unwrap_or("root");
    let start = grammar.lookup(start_name).ok_or_else(|| GrammarError::UnknownStartParser {
        name: start_name.into(),
    })?;

    let ctx = EvalContext {
        arena: grammar.arena(),
        context_sensitive: grammar.context_sensitive(),
    };
    let mut state = ParseState::new(source, grammar, grammar.config().history_tracking);

    let result = eval(&ctx, &mut state, start, 0);

    let (matched, mut tree, end_position) = match result {
        parsekit_primitives::EvalResult::Match { node, pos } => (true, node, pos),
        parsekit_primitives::EvalResult::NoMatch => (false, None, 0),
    };

    let farthest_failure = state.farthest_failure();
    let farthest_expected = state.farthest_expected().map(str::to_string);
    let mut records = state.into_errors();

    if !matched && records.is_empty() {
        // No mandatory marker was ever crossed, so nothing was recorded
        // along the way — this is the "S = \"a\"" case, a bare failed
        // literal/backtrack with no series-level diagnostic to surface.
        // `farthest_failure`/`farthest_expected` are the best available
        // "where did it give up, and what was it looking for" diagnostic.
        let message = match farthest_expected {
            Some(expected) => format!("failed to parse {start_name:?}: expected {expected}"),
            None => format!("failed to parse {start_name:?}"),
        };
        records.push(parsekit_primitives::ErrorRecord::new(
            farthest_failure,
            parsekit_primitives::Severity::Fatal,
            message,
        ));
    } else if matched && complete_match && end_position < source.len() {
        records.push(parsekit_primitives::ErrorRecord::new(
            end_position,
            parsekit_primitives::Severity::Error,
            format!("unexpected trailing input after {start_name:?}"),
        ));
    }

    if let Some(node) = &mut tree {
        crate::reduce::postprocess(node, grammar.config(), grammar.categories());
    }

    let (errors, warnings) = partition_records(records);

    Ok(ParseOutcome { tree, errors, warnings })
}

/// Serialize `node` to XML using `grammar`'s configured tag classification
/// (`inline_tags`/`empty_tags`/`string_tags`).
pub fn serialize_xml(grammar: &Grammar, node: &Node) -> String {
    node.serialize_xml(&mut |tag| grammar.classify_xml_tag(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{element, mandatory, GrammarBuilder};
    use crate::config::GrammarConfig;
    use regex::Regex;

    fn digits_grammar() -> Grammar {
        let mut builder = GrammarBuilder::new(GrammarConfig::new());
        let ws = builder.whitespace("ws", Regex::new(r"\A\s*").unwrap());
        let digits = builder.regexp("digits", Regex::new(r"\A[0-9]+").unwrap());
        builder.define("root", digits);
        let _ = ws;
        builder.finalize().expect("grammar should finalize")
    }

    #[test]
    fn parses_a_simple_match() {
        let grammar = digits_grammar();
        let outcome = parse(&grammar, "42", None, true).expect("known start parser");
        assert!(outcome.is_success());
        assert_eq!(outcome.tree.unwrap().content(), "42");
    }

    #[test]
    fn empty_input_against_mandatory_literal_records_fatal_error() {
        let mut builder = GrammarBuilder::new(GrammarConfig::new());
        let ws = builder.whitespace("ws", Regex::new(r"\A\s*").unwrap());
        let lit_a = builder.lit("lit_a", "a", ws);
        let series = builder.series("root", vec![mandatory(lit_a)], None);
        builder.define("root", series);
        let grammar = builder.finalize().expect("grammar should finalize");

        let outcome = parse(&grammar, "", None, true).expect("known start parser");
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn complete_match_rejects_trailing_input() {
        let grammar = digits_grammar();
        let outcome = parse(&grammar, "42abc", None, true).expect("known start parser");
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn incomplete_match_allows_trailing_input() {
        let grammar = digits_grammar();
        let outcome = parse(&grammar, "42abc", None, false).expect("known start parser");
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn unknown_start_parser_is_a_grammar_error() {
        let grammar = digits_grammar();
        let err = parse(&grammar, "42", Some("nope"), true).unwrap_err();
        assert!(matches!(err, GrammarError::UnknownStartParser { .. }));
    }

    #[test]
    fn nested_braces_produce_the_expected_depth() {
        let mut builder = GrammarBuilder::new(GrammarConfig::new());
        let ws = builder.whitespace("ws", Regex::new(r"\A\s*").unwrap());
        let open = builder.lit("open", "{", ws);
        let close = builder.lit("close", "}", ws);
        let body_forward = builder.forward("body");
        let brace = builder.series(
            "brace",
            vec![element(open, false), element(body_forward, false), mandatory(close)],
            None,
        );
        let body = builder.zero_or_more("body_rep", brace);
        builder.set_forward(body_forward, body);
        builder.define("root", body);
        let grammar = builder.finalize().expect("grammar should finalize");

        let outcome = parse(&grammar, "{ { } }", None, true).expect("known start parser");
        let tree = outcome.tree.expect("should match");
        let braces: Vec<_> = tree.walk().filter(|n| &*n.tag_name == "brace").collect();
        assert_eq!(braces.len(), 2);
    }
}
