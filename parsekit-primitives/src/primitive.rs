/*!
Atomic parsers: the leaves of the parser graph, which match directly against
the input string rather than delegating to child parsers.

Literal text matching (`Text`) is built on [`nom`] and [`nom_supreme`], the
same combinator crates the primitives in this workspace have always used for
byte-level lexing; `RegExp` and `Whitespace` delegate to a compiled
[`regex::Regex`], since nom has no first-class regex combinator and this
toolkit is not in the business of writing its own regex engine.
*/

use nom::Parser;
use nom_supreme::tag::complete::tag;
use regex::Regex;

/// The result of attempting to match an atomic parser at a position.
pub enum AtomicMatch {
    /// Matched the given byte length of input starting at the given
    /// position.
    Matched { len: usize },
    /// Did not match.
    NoMatch,
}

/// Match a literal string at the start of `input`. Uses `nom_supreme`'s
/// `tag` combinator, matching the convention established by this crate's
/// other literal matchers.
pub fn match_text(literal: &str, input: &str) -> AtomicMatch {
    let result: Result<_, nom::Err<nom_supreme::error::ErrorTree<&str>>> =
        tag::<_, _, nom_supreme::error::ErrorTree<&str>>(literal).parse(input);

    match result {
        Ok((_rest, matched)) => AtomicMatch::Matched { len: matched.len() },
        Err(_) => AtomicMatch::NoMatch,
    }
}

/// Match a compiled regex anchored at the start of `input`. Shared by
/// `RegExp` and `Whitespace`, which differ only in whether their resulting
/// node is retained.
pub fn match_regex(pattern: &Regex, input: &str) -> AtomicMatch {
    match pattern.find(input) {
        Some(found) if found.start() == 0 => AtomicMatch::Matched { len: found.end() },
        _ => AtomicMatch::NoMatch,
    }
}

/// `true` if `position` equals the length of `input`, the `Eof` primitive's
/// condition.
pub fn match_eof(input: &str, position: usize) -> bool {
    position == input.len()
}

/// Build a regex that is implicitly anchored to the start of the match
/// region by virtue of [`match_regex`] only accepting `start() == 0` hits;
/// callers should still prefer `^`-anchoring patterns that contain
/// alternation, since an unanchored alternative can otherwise match later in
/// the string faster than the anchored branch, silently skipping input.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)
}

/// Match a fixed-width lookbehind: `true` if `pattern` matches the text
/// immediately preceding `position`.
pub fn match_lookbehind(pattern: &Regex, input: &str, position: usize) -> bool {
    input
        .get(..position)
        .map(|prefix| pattern.is_match(prefix) && ends_at(pattern, prefix, position))
        .unwrap_or(false)
}

fn ends_at(pattern: &Regex, prefix: &str, position: usize) -> bool {
    pattern
        .find_iter(prefix)
        .any(|found| found.end() == position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_matches_prefix() {
        match match_text("hello", "hello world") {
            AtomicMatch::Matched { len } => assert_eq!(len, 5),
            AtomicMatch::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn text_rejects_non_prefix() {
        assert!(matches!(match_text("world", "hello world"), AtomicMatch::NoMatch));
    }

    #[test]
    fn regex_matches_anchored_only() {
        let re = compile_pattern(r"^[0-9]+").unwrap();
        match match_regex(&re, "123abc") {
            AtomicMatch::Matched { len } => assert_eq!(len, 3),
            AtomicMatch::NoMatch => panic!("expected a match"),
        }
        assert!(matches!(match_regex(&re, "abc123"), AtomicMatch::NoMatch));
    }

    #[test]
    fn eof_only_at_end() {
        assert!(!match_eof("abc", 0));
        assert!(match_eof("abc", 3));
    }

    #[test]
    fn lookbehind_checks_immediately_preceding_text() {
        let re = compile_pattern(r"[0-9]+").unwrap();
        assert!(match_lookbehind(&re, "abc123", 6));
        assert!(!match_lookbehind(&re, "abc123x", 7));
    }
}
