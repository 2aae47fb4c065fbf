/*!
Per-parse mutable state: the input, the memo cache, the capture stacks, the
left-recursion guard, and the accumulated error log. One [`ParseState`] is
built per call to `parsekit::parse`, threaded by `&mut` through every
[`crate::eval`] call, and discarded once parsing finishes.
*/

use std::collections::HashSet;

use crate::arena::ParserId;
use crate::capture::{CaptureSnapshot, CaptureStacks, ResumeLookup};
use crate::error::ErrorRecord;
use crate::memo::MemoCache;

/// Everything a single parse needs beyond the (immutable) parser graph
/// itself.
pub struct ParseState<'input, 'grammar> {
    /// The full source text. Parsers only ever read from this; it is never
    /// mutated over the course of a parse.
    pub input: &'input str,

    memo: MemoCache,
    captures: CaptureStacks,
    in_progress: HashSet<(ParserId, usize)>,
    errors: Vec<ErrorRecord>,
    farthest_failure: usize,
    farthest_expected: Option<String>,
    resume: &'grammar dyn ResumeLookup,
    history_tracking: bool,
}

impl<'input, 'grammar> ParseState<'input, 'grammar> {
    /// Build a fresh parse state over `input`.
    ///
    /// `resume` supplies the grammar's mandatory-marker recovery
    /// configuration (see [`ResumeLookup`]); `history_tracking` toggles
    /// whether [`crate::eval`] emits `tracing` spans for each parser
    /// invocation, since a span per call is not free and most callers do not
    /// inspect the history.
    pub fn new(
        input: &'input str,
        resume: &'grammar dyn ResumeLookup,
        history_tracking: bool,
    ) -> Self {
        ParseState {
            input,
            memo: MemoCache::new(),
            captures: CaptureStacks::new(),
            in_progress: HashSet::new(),
            errors: Vec::new(),
            farthest_failure: 0,
            farthest_expected: None,
            resume,
            history_tracking,
        }
    }

    /// The memo cache, for read/write access from [`crate::eval`].
    pub fn memo(&mut self) -> &mut MemoCache {
        &mut self.memo
    }

    /// The named capture stacks, for read/write access from
    /// [`crate::eval`].
    pub fn captures(&mut self) -> &mut CaptureStacks {
        &mut self.captures
    }

    /// A read-only view of the capture stacks, e.g. for `Retrieve`.
    pub fn captures_ref(&self) -> &CaptureStacks {
        &self.captures
    }

    /// The grammar's resume-point lookup, consulted by `Series`'s
    /// mandatory-marker recovery.
    pub fn resume(&self) -> &'grammar dyn ResumeLookup {
        self.resume
    }

    /// `true` if `tracing` spans should be emitted for parser invocations.
    pub fn history_tracking(&self) -> bool {
        self.history_tracking
    }

    /// Enter a `(parser, position)` pair for left-recursion detection.
    /// Returns `false` (and does not enter) if this pair is already on the
    /// call stack — the short-circuit that turns left recursion into an
    /// ordinary, reportable parse failure instead of a stack overflow.
    pub fn try_enter(&mut self, parser: ParserId, position: usize) -> bool {
        self.in_progress.insert((parser, position))
    }

    /// Leave a `(parser, position)` pair previously entered via
    /// [`ParseState::try_enter`]. Must be called exactly once per successful
    /// `try_enter`; `crate::eval`'s `eval_tracked` pairs the two calls by
    /// hand around its single non-early-returning call to `eval_uncached`.
    pub fn leave(&mut self, parser: ParserId, position: usize) {
        self.in_progress.remove(&(parser, position));
    }

    /// Record a parse error or warning, and update the farthest-failure
    /// high-water mark used for the "expected X" diagnostic at a totally
    /// failed parse.
    pub fn record_error(&mut self, error: ErrorRecord) {
        self.farthest_failure = self.farthest_failure.max(error.position);
        self.errors.push(error);
    }

    /// Note a bare backtrack (no recorded error) at `position`, still
    /// contributing to the farthest-failure high-water mark so that a
    /// grammar with no mandatory markers at all still produces a useful
    /// "parsing failed at byte N" report. `expected`, when given, describes
    /// what the failing atomic parser was looking for (e.g. a literal or
    /// pattern), and is kept only for the position that ends up farthest:
    /// it's overwritten when a later call strictly advances the high-water
    /// mark, and otherwise only fills in a gap left by an earlier
    /// non-descriptive call at the same position.
    pub fn note_failure_point(&mut self, position: usize, expected: Option<&str>) {
        match position.cmp(&self.farthest_failure) {
            std::cmp::Ordering::Greater => {
                self.farthest_failure = position;
                self.farthest_expected = expected.map(str::to_string);
            }
            std::cmp::Ordering::Equal if self.farthest_expected.is_none() => {
                self.farthest_expected = expected.map(str::to_string);
            }
            _ => {}
        }
    }

    /// The rightmost position any parser failed to match at, win or lose —
    /// the best available "where did parsing actually give up" diagnostic.
    pub fn farthest_failure(&self) -> usize {
        self.farthest_failure
    }

    /// A description of what was expected at [`ParseState::farthest_failure`],
    /// if any atomic parser that failed there supplied one.
    pub fn farthest_expected(&self) -> Option<&str> {
        self.farthest_expected.as_deref()
    }

    /// Consume the state, returning the accumulated error log.
    pub fn into_errors(self) -> Vec<ErrorRecord> {
        self.errors
    }

    /// A snapshot sufficient to fully undo a speculative parse attempt:
    /// capture stack lengths. Position is tracked by the caller (it's just
    /// a `usize`); the memo cache and error log are never rolled back,
    /// since a recorded memo entry or error remains valid regardless of
    /// which enclosing alternative ultimately wins.
    pub fn snapshot_captures(&self) -> CaptureSnapshot {
        self.captures.snapshot()
    }

    /// Undo capture stack pushes made since `snapshot` was taken.
    pub fn restore_captures(&mut self, snapshot: &CaptureSnapshot) {
        self.captures.restore(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::NoResume;

    #[test]
    fn try_enter_rejects_reentry_at_same_position() {
        let mut state = ParseState::new("abc", &NoResume, false);
        let id = ParserId(0);
        assert!(state.try_enter(id, 0));
        assert!(!state.try_enter(id, 0));
        state.leave(id, 0);
        assert!(state.try_enter(id, 0));
    }

    #[test]
    fn farthest_failure_tracks_high_water_mark() {
        let mut state = ParseState::new("abc", &NoResume, false);
        state.note_failure_point(2, None);
        state.note_failure_point(1, None);
        assert_eq!(state.farthest_failure(), 2);
    }

    #[test]
    fn farthest_expected_tracks_the_farthest_position_only() {
        let mut state = ParseState::new("abc", &NoResume, false);
        state.note_failure_point(1, Some("\"x\""));
        state.note_failure_point(2, Some("\"y\""));
        state.note_failure_point(1, Some("\"z\""));
        assert_eq!(state.farthest_failure(), 2);
        assert_eq!(state.farthest_expected(), Some("\"y\""));
    }

    #[test]
    fn farthest_expected_fills_gap_left_by_non_descriptive_call_at_same_position() {
        let mut state = ParseState::new("abc", &NoResume, false);
        state.note_failure_point(2, None);
        state.note_failure_point(2, Some("\"a\""));
        assert_eq!(state.farthest_expected(), Some("\"a\""));
    }
}
