/*!
The `Series` combinator's mandatory-marker (`§`) error recovery: the one
piece of evaluation logic substantial enough to deserve its own module
rather than living inline in `crate::parser`'s big match.

Before the first mandatory element, a failing child causes the whole series
to fail silently (a plain backtrack — some *other* alternative might still
match). At or after the first mandatory element, a failing child is a real
syntax error: it is recorded, and the parser attempts to resynchronize by
scanning forward for the nearest position the grammar has registered as a
resume point for this series (via [`crate::capture::ResumeLookup`]). If no
resume point is found before the end of input, the error is escalated to
[`Severity::Fatal`] and the series still fails as a whole — but, unlike the
pre-marker case, the already-recorded error is not discarded.
*/

use crate::arena::SeriesElement;
use crate::error::{ErrorRecord, ErrorTemplate, Severity};
use crate::node::Node;
use crate::parser::{eval, EvalContext, EvalResult};
use crate::state::ParseState;

const DEFAULT_RESUME_SCAN_LIMIT: usize = usize::MAX;

pub fn eval_series(
    ctx: &EvalContext<'_>,
    state: &mut ParseState<'_, '_>,
    series_name: &str,
    elements: &[SeriesElement],
    error_template: Option<&ErrorTemplate>,
    start: usize,
) -> EvalResult {
    let mut children = Vec::new();
    let mut pos = start;
    let mut past_marker = false;

    let mut index = 0;
    while index < elements.len() {
        let element = elements[index];
        if element.mandatory {
            past_marker = true;
        }

        match eval(ctx, state, element.child, pos) {
            EvalResult::Match { node, pos: end } => {
                if let Some(node) = node {
                    children.push(node);
                }
                pos = end;
                index += 1;
            }
            EvalResult::NoMatch if !past_marker => {
                // No element has been mandatory yet: this is an ordinary
                // backtrack, the series as a whole simply didn't match here.
                return EvalResult::NoMatch;
            }
            EvalResult::NoMatch => {
                let offending = lookahead_snippet(state.input, pos);
                let message = match error_template {
                    Some(template) => template.render(&[&offending]),
                    None => format!("expected more input, found {offending:?}"),
                };

                match find_resume_point(ctx, state, series_name, pos) {
                    Some(resume_pos) => {
                        state.record_error(
                            ErrorRecord::new(pos, Severity::Error, message)
                                .with_parser(series_name)
                                .with_offending_token(offending),
                        );
                        pos = resume_pos;
                        index += 1;
                    }
                    None => {
                        state.record_error(
                            ErrorRecord::new(pos, Severity::Fatal, message)
                                .with_parser(series_name)
                                .with_offending_token(offending),
                        );
                        return EvalResult::NoMatch;
                    }
                }
            }
        }
    }

    let node = if children.is_empty() {
        None
    } else {
        Some(Node::branch(series_name, children, start))
    };

    EvalResult::Match { node, pos }
}

/// Scan forward from `pos` for the nearest position the grammar has
/// registered as a resume point for `series_name`. Bounded by input length;
/// `DEFAULT_RESUME_SCAN_LIMIT` exists so a future configuration knob can cap
/// the scan without changing this function's shape.
fn find_resume_point(
    ctx: &EvalContext<'_>,
    state: &ParseState<'_, '_>,
    series_name: &str,
    pos: usize,
) -> Option<usize> {
    let _ = ctx;
    let limit = state.input.len().min(DEFAULT_RESUME_SCAN_LIMIT);
    (pos..=limit).find(|&candidate| state.resume().is_resume_point(series_name, state.input, candidate))
}

/// A short, human-readable snippet of what actually appeared at a failure
/// position, for substitution into error templates and default messages.
fn lookahead_snippet(input: &str, pos: usize) -> String {
    match input.get(pos..) {
        Some(rest) if rest.is_empty() => "end of input".to_string(),
        Some(rest) => rest.chars().take(16).collect(),
        None => "end of input".to_string(),
    }
}
