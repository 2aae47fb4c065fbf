/*!
The public error taxonomy. These wrap the lower-level
`parsekit_primitives::error::ErrorRecord`/`Severity` types for callers: a
`GrammarError` is raised once, at [`crate::grammar::Grammar::finalize`], and
is fatal; a `ParseError`/`Warning` is one entry of the error list returned
alongside a parse's (possibly partial) tree; an `InternalError` should never
occur and indicates a bug in this library, not in a caller's grammar.
*/

use parsekit_primitives::{ErrorRecord, Severity};
use thiserror::Error;

/// The grammar itself is malformed. Raised at [`crate::grammar::Grammar::finalize`];
/// a grammar that fails to finalize cannot be parsed against.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A `Forward` parser was never given a target via `set_forward`.
    #[error("forward reference {name:?} was never resolved")]
    UnresolvedForward {
        /// The unresolved forward's declared name.
        name: Box<str>,
    },

    /// Two parsers were registered under the same name.
    #[error("parser name {name:?} is defined more than once")]
    Redefinition {
        /// The name registered more than once.
        name: Box<str>,
    },

    /// A parser reaches itself at the same position without first crossing
    /// a `Forward` indirection or consuming input — this arena has no
    /// seed-growing support, so such a grammar can never succeed via that
    /// path and is rejected up front instead of silently degrading to
    /// always-fails at parse time.
    #[error("{name:?} is left-recursive without an intervening Forward reference")]
    LeftRecursion {
        /// The name of the left-recursive parser.
        name: Box<str>,
    },

    /// `start_name` does not name any parser registered in the grammar.
    #[error("no parser named {name:?} is registered in this grammar")]
    UnknownStartParser {
        /// The requested, unregistered name.
        name: Box<str>,
    },
}

/// One error encountered while parsing: a mandatory element failed to
/// match, and either recovery succeeded (parsing continued at a resume
/// point) or did not (the enclosing `Series` failed as a whole).
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{position}: {message}")]
pub struct ParseError {
    /// Byte offset of the failure.
    pub position: usize,
    /// The rendered message (template placeholders already substituted).
    pub message: String,
    /// The name of the parser that raised the error.
    pub originating_parser: Option<Box<str>>,
    /// `true` if a resume point was found and parsing continued past this
    /// error; `false` if the enclosing `Series` failed outright.
    pub recovered: bool,
}

/// A grammar-declared soft violation: recorded, but does not make a parse
/// unsuccessful by itself.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{position}: {message}")]
pub struct Warning {
    /// Byte offset of the warning.
    pub position: usize,
    /// The rendered message.
    pub message: String,
}

/// An invariant was violated inside this library itself (cache corruption,
/// a `Forward` rebinding past construction). Should never occur; if it
/// does, it indicates a bug in `parsekit`, not in the caller's grammar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InternalError {
    /// A `Forward` reference was set more than once.
    #[error("forward reference {name:?} was set more than once")]
    ForwardRebinding {
        /// The offending forward's name.
        name: Box<str>,
    },

    /// A memo cache entry was read back with a shape inconsistent with the
    /// parser it was recorded against.
    #[error("memo cache entry for {name:?} at byte {position} was malformed")]
    CacheCorruption {
        /// The parser name whose cache entry was malformed.
        name: Box<str>,
        /// The position the malformed entry was recorded at.
        position: usize,
    },
}

/// Maps a byte offset back to a 1-indexed `(line, column)` pair, for
/// rendering diagnostics as `<file>:<line>:<col>: <severity>: <message>`
/// rather than a bare byte offset. Built once per source text; `line_col` is
/// a binary search over precomputed line-start offsets, so formatting many
/// diagnostics against the same source is cheap.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line; `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Scan `source` once, recording where each line begins.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        LineIndex { line_starts }
    }

    /// The 1-indexed `(line, column)` of byte offset `position`. Column is
    /// counted in UTF-8 bytes since the start of the line, not characters —
    /// adequate for pointing an editor at a location, not for display
    /// width. `position` past the end of the source is clamped to the last
    /// line.
    pub fn line_col(&self, position: usize) -> (usize, usize) {
        let line_index = match self.line_starts.binary_search(&position) {
            Ok(exact) => exact,
            Err(insertion) => insertion - 1,
        };
        let column = position - self.line_starts[line_index];
        (line_index + 1, column + 1)
    }

    /// Render `severity: message` at `position` as
    /// `<file>:<line>:<col>: <severity>: <message>`.
    pub fn format_diagnostic(&self, file: &str, position: usize, severity: &str, message: &str) -> String {
        let (line, col) = self.line_col(position);
        format!("{file}:{line}:{col}: {severity}: {message}")
    }
}

/// Split a parse's raw [`ErrorRecord`] log into the public `ParseError`/
/// `Warning` shapes, in the order they were recorded.
pub fn partition_records(
    records: Vec<ErrorRecord>,
) -> (Vec<ParseError>, Vec<Warning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for record in records {
        match record.severity {
            Severity::Warning => warnings.push(Warning {
                position: record.position,
                message: record.message,
            }),
            Severity::Error | Severity::Fatal => errors.push(ParseError {
                position: record.position,
                message: record.message,
                originating_parser: record.originating_parser,
                recovered: record.severity != Severity::Fatal,
            }),
        }
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsekit_primitives::ErrorRecord;

    #[test]
    fn partitions_by_severity() {
        let records = vec![
            ErrorRecord::new(0, Severity::Warning, "soft"),
            ErrorRecord::new(1, Severity::Error, "recovered"),
            ErrorRecord::new(2, Severity::Fatal, "unrecovered"),
        ];

        let (errors, warnings) = partition_records(records);
        assert_eq!(warnings.len(), 1);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].recovered);
        assert!(!errors[1].recovered);
    }

    #[test]
    fn line_index_finds_line_and_column() {
        let index = LineIndex::new("abc\ndef\nghi");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(2), (1, 3));
        assert_eq!(index.line_col(4), (2, 1));
        assert_eq!(index.line_col(9), (3, 2));
    }

    #[test]
    fn format_diagnostic_matches_file_line_col_style() {
        let index = LineIndex::new("one\ntwo");
        let rendered = index.format_diagnostic("grammar.txt", 4, "error", "unexpected token");
        assert_eq!(rendered, "grammar.txt:2:1: error: unexpected token");
    }
}
