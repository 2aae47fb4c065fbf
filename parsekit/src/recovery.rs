/*!
Resume-point registration: the `@ <name>_error = '<resume_regex>', '<message>'`
directive from the external grammar syntax, expressed here as a typed table
a [`crate::builder::GrammarBuilder`] populates and a finalized
[`crate::grammar::Grammar`] consults through
[`parsekit_primitives::ResumeLookup`].

A resume point is "the nearest position matching one of a `Series`'s
registered patterns"; [`ResumeTable::is_resume_point`] is the predicate the
evaluator's mandatory-marker recovery logic scans forward with, one byte at
a time, until it finds a hit or runs out of input.
*/

use std::collections::HashMap;

use parsekit_primitives::primitive::match_regex;
use parsekit_primitives::ResumeLookup;
use regex::Regex;

/// The resume patterns registered for every series name that declares any.
/// A series with no entry here never resynchronizes: its mandatory-marker
/// failures are always fatal.
#[derive(Debug, Default)]
pub struct ResumeTable {
    patterns: HashMap<Box<str>, Vec<Regex>>,
}

impl ResumeTable {
    /// An empty table: no series has any registered resume points.
    pub fn new() -> Self {
        ResumeTable::default()
    }

    /// Register `pattern` as a resume point for the series named
    /// `series_name`. A series may have more than one; the first
    /// registered pattern that matches at a scanned position wins.
    pub fn register(&mut self, series_name: impl Into<Box<str>>, pattern: Regex) {
        self.patterns.entry(series_name.into()).or_default().push(pattern);
    }
}

impl ResumeLookup for ResumeTable {
    fn is_resume_point(&self, series_name: &str, input: &str, position: usize) -> bool {
        let Some(rest) = input.get(position..) else {
            return false;
        };

        self.patterns
            .get(series_name)
            .into_iter()
            .flatten()
            .any(|pattern| matches!(match_regex(pattern, rest), parsekit_primitives::primitive::AtomicMatch::Matched { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_series_never_resumes() {
        let table = ResumeTable::new();
        assert!(!table.is_resume_point("tag", "abc", 0));
    }

    #[test]
    fn registered_pattern_matches_at_position() {
        let mut table = ResumeTable::new();
        table.register("tag", Regex::new(r"^>").unwrap());
        assert!(table.is_resume_point("tag", "x>y", 1));
        assert!(!table.is_resume_point("tag", "x>y", 0));
    }
}
