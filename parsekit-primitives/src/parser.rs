/*!
The evaluator: a single recursive function that dispatches on
[`ParserKind`](crate::arena::ParserKind) and drives a parse forward. This is
the one place in the crate that actually walks the parser graph; every other
module describes data the evaluator consults or produces.
*/

use std::collections::HashSet;

use crate::arena::{Arena, ParserId, ParserKind};
use crate::memo::CacheEntry;
use crate::node::Node;
use crate::primitive::{match_eof, match_lookbehind, match_regex, match_text, AtomicMatch};
use crate::state::ParseState;

/// The outcome of evaluating a parser at a position.
#[derive(Debug, Clone)]
pub enum EvalResult {
    /// The parser matched. `node` is `None` for a zero-width or
    /// intentionally dropped match (the `EMPTY_NODE` sentinel), distinct
    /// from `Some(leaf)` holding an empty string.
    Match { node: Option<Node>, pos: usize },
    /// The parser did not match at this position.
    NoMatch,
}

/// Static, grammar-wide metadata the evaluator needs alongside the mutable
/// [`ParseState`]: the parser graph itself, and the set of parsers whose
/// result depends on capture-stack contents and so must never be
/// memoized. Computed once at `Grammar::finalize` and borrowed for the
/// lifetime of every parse against that grammar.
pub struct EvalContext<'a> {
    /// The grammar's parser graph.
    pub arena: &'a Arena,
    /// Parsers excluded from memoization because their result depends on
    /// capture-stack contents in addition to `(parser, position)`.
    pub context_sensitive: &'a HashSet<ParserId>,
}

/// Evaluate `parser` against `state.input` starting at `pos`.
///
/// When the grammar's `history_tracking` flag is set, every invocation —
/// including ones served straight from the memo cache — opens a `tracing`
/// span and emits an outcome event, giving `parsekit::history` a complete
/// per-call trace without this crate depending on how (or whether) a host
/// application collects it. The span/event calls are skipped entirely when
/// tracking is off, so the cost of tracing is one boolean check per call.
pub fn eval(ctx: &EvalContext<'_>, state: &mut ParseState<'_, '_>, parser: ParserId, pos: usize) -> EvalResult {
    let parser = ctx.arena.resolve(parser);
    let tracking = state.history_tracking();

    let span = tracking.then(|| {
        let name = &ctx.arena.get(parser).name;
        tracing::span!(tracing::Level::TRACE, "parsekit::history::call", parser = %name, position = pos).entered()
    });

    let result = eval_tracked(ctx, state, parser, pos);

    if tracking {
        let (outcome, consumed) = match &result {
            EvalResult::Match { pos: end, .. } => ("match", state.input.get(pos..*end).unwrap_or("")),
            EvalResult::NoMatch => ("no_match", ""),
        };
        tracing::event!(tracing::Level::TRACE, outcome = outcome, consumed = consumed);
    }

    drop(span);
    result
}

fn eval_tracked(ctx: &EvalContext<'_>, state: &mut ParseState<'_, '_>, parser: ParserId, pos: usize) -> EvalResult {
    let cacheable = !ctx.context_sensitive.contains(&parser);

    if cacheable {
        if let Some(entry) = state.memo().get(parser, pos) {
            return match entry.clone() {
                CacheEntry::Success { end_position, node } => EvalResult::Match {
                    node,
                    pos: end_position,
                },
                CacheEntry::Failure => EvalResult::NoMatch,
            };
        }
    }

    if !state.try_enter(parser, pos) {
        // Left recursion: the same parser was already being evaluated at
        // this exact position further up the call stack. Treat it as an
        // ordinary failure rather than recursing forever; `Grammar::finalize`
        // separately rejects grammars where this would be the *only* way a
        // rule ever succeeds, so reaching this path at runtime means some
        // other alternative is expected to win instead.
        state.note_failure_point(pos, None);
        return EvalResult::NoMatch;
    }

    let result = eval_uncached(ctx, state, parser, pos);

    state.leave(parser, pos);

    if cacheable {
        let entry = match &result {
            EvalResult::Match { node, pos: end } => CacheEntry::Success {
                end_position: *end,
                node: node.clone(),
            },
            EvalResult::NoMatch => CacheEntry::Failure,
        };
        state.memo().insert(parser, pos, entry);
    }

    if matches!(result, EvalResult::NoMatch) {
        state.note_failure_point(pos, None);
    }

    result
}

fn eval_uncached(
    ctx: &EvalContext<'_>,
    state: &mut ParseState<'_, '_>,
    id: ParserId,
    pos: usize,
) -> EvalResult {
    let node = ctx.arena.get(id);
    let name = &node.name;

    match &node.kind {
        ParserKind::RegExp(pattern) => match match_regex(pattern, &state.input[pos..]) {
            AtomicMatch::Matched { len } => EvalResult::Match {
                node: Some(Node::leaf(name.clone(), &state.input[pos..pos + len], pos)),
                pos: pos + len,
            },
            AtomicMatch::NoMatch => {
                state.note_failure_point(pos, Some(&format!("pattern /{}/", pattern.as_str())));
                EvalResult::NoMatch
            }
        },

        ParserKind::Text(literal) => match match_text(literal, &state.input[pos..]) {
            AtomicMatch::Matched { len } => EvalResult::Match {
                node: Some(Node::leaf(name.clone(), &state.input[pos..pos + len], pos)),
                pos: pos + len,
            },
            AtomicMatch::NoMatch => {
                state.note_failure_point(pos, Some(&format!("{literal:?}")));
                EvalResult::NoMatch
            }
        },

        ParserKind::Whitespace(pattern) => match match_regex(pattern, &state.input[pos..]) {
            AtomicMatch::Matched { len } => EvalResult::Match {
                node: None,
                pos: pos + len,
            },
            AtomicMatch::NoMatch => {
                state.note_failure_point(pos, Some(&format!("pattern /{}/", pattern.as_str())));
                EvalResult::NoMatch
            }
        },

        ParserKind::Eof => {
            if match_eof(state.input, pos) {
                EvalResult::Match { node: None, pos }
            } else {
                state.note_failure_point(pos, Some("end of input"));
                EvalResult::NoMatch
            }
        }

        ParserKind::Option(child) => match eval(ctx, state, *child, pos) {
            EvalResult::Match { node, pos: end } => EvalResult::Match { node, pos: end },
            EvalResult::NoMatch => EvalResult::Match { node: None, pos },
        },

        ParserKind::Drop(child) => match eval(ctx, state, *child, pos) {
            EvalResult::Match { pos: end, .. } => EvalResult::Match { node: None, pos: end },
            EvalResult::NoMatch => EvalResult::NoMatch,
        },

        ParserKind::ZeroOrMore(child) => eval_repetition(ctx, state, *child, pos, name),
        ParserKind::OneOrMore(child) => {
            let repeated = eval_repetition(ctx, state, *child, pos, name);
            match &repeated {
                EvalResult::Match { pos: end, .. } if *end > pos => repeated,
                _ => EvalResult::NoMatch,
            }
        }

        ParserKind::Lookahead(child) => {
            let snapshot = state.snapshot_captures();
            let result = eval(ctx, state, *child, pos);
            state.restore_captures(&snapshot);
            match result {
                EvalResult::Match { .. } => EvalResult::Match { node: None, pos },
                EvalResult::NoMatch => EvalResult::NoMatch,
            }
        }

        ParserKind::NegativeLookahead(child) => {
            let snapshot = state.snapshot_captures();
            let result = eval(ctx, state, *child, pos);
            state.restore_captures(&snapshot);
            match result {
                EvalResult::Match { .. } => EvalResult::NoMatch,
                EvalResult::NoMatch => EvalResult::Match { node: None, pos },
            }
        }

        ParserKind::Lookbehind(pattern) => {
            if match_lookbehind(pattern, state.input, pos) {
                EvalResult::Match { node: None, pos }
            } else {
                EvalResult::NoMatch
            }
        }

        ParserKind::NegativeLookbehind(pattern) => {
            if match_lookbehind(pattern, state.input, pos) {
                EvalResult::NoMatch
            } else {
                EvalResult::Match { node: None, pos }
            }
        }

        ParserKind::Synonym(child) => match eval(ctx, state, *child, pos) {
            EvalResult::Match { node: Some(mut inner), pos: end } => {
                inner.tag_name = name.clone();
                EvalResult::Match {
                    node: Some(inner),
                    pos: end,
                }
            }
            other => other,
        },

        ParserKind::Capture { name: cap_name, child } => match eval(ctx, state, *child, pos) {
            EvalResult::Match { node, pos: end } => {
                let text = node
                    .as_ref()
                    .map(Node::content)
                    .unwrap_or_else(|| state.input[pos..end].to_string());
                state.captures().push(cap_name, text);
                EvalResult::Match { node, pos: end }
            }
            EvalResult::NoMatch => EvalResult::NoMatch,
        },

        ParserKind::Pop(cap_name) => match state.captures_ref().peek(cap_name).map(str::to_string) {
            Some(expected) => match match_text(&expected, &state.input[pos..]) {
                AtomicMatch::Matched { len } if len == expected.len() => {
                    state.captures().pop(cap_name);
                    EvalResult::Match {
                        node: Some(Node::leaf(name.clone(), &expected, pos)),
                        pos: pos + len,
                    }
                }
                _ => EvalResult::NoMatch,
            },
            None => EvalResult::NoMatch,
        },

        ParserKind::Retrieve(cap_name) => match state.captures_ref().peek(cap_name).map(str::to_string) {
            Some(expected) => match match_text(&expected, &state.input[pos..]) {
                AtomicMatch::Matched { len } if len == expected.len() => EvalResult::Match {
                    node: Some(Node::leaf(name.clone(), &expected, pos)),
                    pos: pos + len,
                },
                _ => EvalResult::NoMatch,
            },
            None => EvalResult::NoMatch,
        },

        ParserKind::Alternative(children) => {
            for child in children.iter() {
                let snapshot = state.snapshot_captures();
                match eval(ctx, state, *child, pos) {
                    EvalResult::Match { node, pos: end } => {
                        return EvalResult::Match { node, pos: end };
                    }
                    EvalResult::NoMatch => state.restore_captures(&snapshot),
                }
            }
            EvalResult::NoMatch
        }

        ParserKind::Series {
            children,
            error_template,
        } => crate::series::eval_series(ctx, state, name, children, error_template.as_ref(), pos),

        ParserKind::Forward(_) => unreachable!("Forward ids are resolved before dispatch"),
    }
}

/// `ZeroOrMore`/`OneOrMore` share this loop: match the child repeatedly,
/// collecting non-dropped nodes, stopping either on the first failure or
/// the first zero-width match (an unconditionally-succeeding child would
/// otherwise loop forever).
fn eval_repetition(
    ctx: &EvalContext<'_>,
    state: &mut ParseState<'_, '_>,
    child: ParserId,
    start: usize,
    tag: &str,
) -> EvalResult {
    let mut children = Vec::new();
    let mut pos = start;

    loop {
        match eval(ctx, state, child, pos) {
            EvalResult::Match { node, pos: end } if end > pos => {
                if let Some(node) = node {
                    children.push(node);
                }
                pos = end;
            }
            // A zero-width match would loop forever; stop here instead of
            // treating it as a failure, so `x*` around an always-succeeding
            // zero-width parser still terminates (and still counts as a
            // single successful, empty repetition).
            EvalResult::Match { .. } | EvalResult::NoMatch => break,
        }
    }

    if children.is_empty() {
        EvalResult::Match { node: None, pos }
    } else {
        EvalResult::Match {
            node: Some(Node::branch(tag, children, start)),
            pos,
        }
    }
}
