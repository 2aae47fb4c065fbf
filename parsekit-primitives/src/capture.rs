/*!
Named capture stacks, backing the `Capture`/`Pop`/`Retrieve` combinators used
to express context-sensitive grammars (matching a previously-seen tag name,
balancing a custom bracket pair, and so on).

Each stack is a LIFO `Vec<String>` keyed by capture name. Backtracking out of
a `Capture` must undo its push; rather than unwind pushes one at a time on
every backtrack, [`CaptureStacks::snapshot`] records the current length of
every stack once, and [`CaptureStacks::restore`] truncates back to it — a
single `O(1)` snapshot and a single `truncate` per stack on restore, mirroring
how the memo cache and position are already saved and restored around
backtracking attempts.
*/

use std::collections::HashMap;

/// The full set of named capture stacks live during a parse.
#[derive(Debug, Default, Clone)]
pub struct CaptureStacks {
    stacks: HashMap<Box<str>, Vec<String>>,
}

/// A snapshot of every stack's length, taken before a speculative parse
/// attempt so it can be undone if that attempt backtracks.
#[derive(Debug, Clone)]
pub struct CaptureSnapshot {
    lengths: HashMap<Box<str>, usize>,
}

impl CaptureStacks {
    /// An empty set of capture stacks.
    pub fn new() -> Self {
        CaptureStacks::default()
    }

    /// Push `value` onto the named stack.
    pub fn push(&mut self, name: &str, value: String) {
        match self.stacks.get_mut(name) {
            Some(stack) => stack.push(value),
            None => {
                self.stacks.insert(name.into(), vec![value]);
            }
        }
    }

    /// Peek at the top of the named stack, without removing it.
    pub fn peek(&self, name: &str) -> Option<&str> {
        self.stacks.get(name)?.last().map(String::as_str)
    }

    /// Remove and return the top of the named stack.
    pub fn pop(&mut self, name: &str) -> Option<String> {
        self.stacks.get_mut(name)?.pop()
    }

    /// Snapshot every stack's current length.
    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            lengths: self
                .stacks
                .iter()
                .map(|(name, stack)| (name.clone(), stack.len()))
                .collect(),
        }
    }

    /// Undo every push made since `snapshot` was taken, in every stack —
    /// including stacks created after the snapshot, which are truncated to
    /// empty.
    pub fn restore(&mut self, snapshot: &CaptureSnapshot) {
        for (name, stack) in self.stacks.iter_mut() {
            let target_len = snapshot.lengths.get(name).copied().unwrap_or(0);
            stack.truncate(target_len);
        }
    }
}

/// A seam crossed from `parsekit-primitives` into the higher-level grammar
/// container: the `Series` combinator's mandatory-marker recovery needs to
/// ask "what are the resume points reachable from here", but that
/// configuration is grammar-level state that would otherwise require
/// `parsekit` to depend back on `parsekit-primitives`'s internals in a
/// cycle. Implemented by `parsekit::grammar::Grammar` and injected into
/// `ParseState` as `&dyn ResumeLookup`; the one dynamic-dispatch seam in an
/// otherwise monomorphic design, justified by being the only place the two
/// crates' responsibilities genuinely need to talk to each other.
pub trait ResumeLookup {
    /// Return `true` if `position` in `input` matches one of the resume
    /// points registered for the series parser named `series_name`.
    fn is_resume_point(&self, series_name: &str, input: &str, position: usize) -> bool;
}

/// A [`ResumeLookup`] that never resumes, used where no grammar-level
/// recovery configuration is available (e.g. in unit tests of the
/// primitives crate in isolation).
pub struct NoResume;

impl ResumeLookup for NoResume {
    fn is_resume_point(&self, _series_name: &str, _input: &str, _position: usize) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_peek_returns_last_pushed() {
        let mut stacks = CaptureStacks::new();
        stacks.push("tag", "div".to_string());
        stacks.push("tag", "span".to_string());
        assert_eq!(stacks.peek("tag"), Some("span"));
    }

    #[test]
    fn pop_removes_top() {
        let mut stacks = CaptureStacks::new();
        stacks.push("tag", "div".to_string());
        assert_eq!(stacks.pop("tag"), Some("div".to_string()));
        assert_eq!(stacks.pop("tag"), None);
    }

    #[test]
    fn restore_undoes_pushes_since_snapshot() {
        let mut stacks = CaptureStacks::new();
        stacks.push("tag", "div".to_string());
        let snapshot = stacks.snapshot();
        stacks.push("tag", "span".to_string());
        stacks.push("tag", "em".to_string());
        stacks.restore(&snapshot);
        assert_eq!(stacks.peek("tag"), Some("div"));
    }

    #[test]
    fn restore_empties_stacks_created_after_snapshot() {
        let mut stacks = CaptureStacks::new();
        let snapshot = stacks.snapshot();
        stacks.push("brand_new", "x".to_string());
        stacks.restore(&snapshot);
        assert_eq!(stacks.peek("brand_new"), None);
    }
}
