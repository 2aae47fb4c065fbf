/*!
The low-level error record accumulated on a [`crate::state::ParseState`]
during a single parse. This is distinct from the public error taxonomy
(`parsekit::error::{GrammarError, ParseError, Warning, InternalError}`),
which wraps these records for the caller.
*/

/// How serious an [`ErrorRecord`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// A grammar-declared soft violation. Non-fatal; recorded but does not
    /// affect the exit status a hosting tool reports.
    Warning,
    /// A mandatory element failed. Recorded and recovery is attempted.
    Error,
    /// No resume point existed, or an invariant was violated. The
    /// enclosing `Series` cannot continue.
    Fatal,
}

/// One error or warning produced during a parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    /// Byte offset in the source where the error was raised.
    pub position: usize,

    /// How serious the error is.
    pub severity: Severity,

    /// The rendered message (placeholders already substituted).
    pub message: String,

    /// The name of the parser that raised the error, if it had one.
    pub originating_parser: Option<Box<str>>,

    /// The offending token, if one could be identified (the lookahead
    /// snippet at the point of failure).
    pub offending_token: Option<Box<str>>,
}

impl ErrorRecord {
    /// Build a new error record.
    pub fn new(position: usize, severity: Severity, message: impl Into<String>) -> Self {
        ErrorRecord {
            position,
            severity,
            message: message.into(),
            originating_parser: None,
            offending_token: None,
        }
    }

    /// Attach the name of the parser that raised this error.
    pub fn with_parser(mut self, name: impl Into<Box<str>>) -> Self {
        self.originating_parser = Some(name.into());
        self
    }

    /// Attach the offending token (lookahead snippet) for this error.
    pub fn with_offending_token(mut self, token: impl Into<Box<str>>) -> Self {
        self.offending_token = Some(token.into());
        self
    }
}

/// A template for a `Series`-level error message, parsed once at grammar
/// load time (`@ <name>_error = '<resume_regex>', '<message>'`) and
/// substituted at error time. Placeholders are `{1}`, `{2}`, ... referring
/// to positional arguments (conventionally `{1}` is the offending
/// lookahead snippet). A placeholder with no corresponding argument is
/// left in the output literally, per spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorTemplate {
    segments: Vec<TemplateSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateSegment {
    Literal(String),
    Placeholder(usize),
}

/// Parse a run of ASCII digits as a placeholder index. Returns `None` for
/// an empty run or one that overflows `usize` (e.g. a malformed template
/// with `{99999999999999999999}`), so the caller can fall back to treating
/// the braces as literal text instead of panicking.
fn parse_placeholder_index(digits: &str) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

impl ErrorTemplate {
    /// Parse a template string containing `{N}` placeholders.
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if c == '{' {
                let mut digits = String::new();
                let mut consumed = Vec::new();
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_ascii_digit() {
                        digits.push(d);
                        consumed.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if matches!(chars.peek(), Some((_, '}'))) {
                    if let Some(n) = parse_placeholder_index(&digits) {
                        chars.next();
                        if !literal.is_empty() {
                            segments.push(TemplateSegment::Literal(std::mem::take(&mut literal)));
                        }
                        segments.push(TemplateSegment::Placeholder(n));
                        continue;
                    }
                }
                literal.push('{');
                literal.extend(consumed);
            } else {
                literal.push(c);
            }
        }

        if !literal.is_empty() {
            segments.push(TemplateSegment::Literal(literal));
        }

        ErrorTemplate { segments }
    }

    /// Render the template, substituting `args[n - 1]` for `{n}`. A
    /// placeholder whose index has no matching argument is rendered
    /// literally (`{n}`), per spec.
    pub fn render(&self, args: &[&str]) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Placeholder(n) => match args.get(n.wrapping_sub(1)) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(&n.to_string());
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_placeholder() {
        let template = ErrorTemplate::parse("expected a tag name, found {1}");
        assert_eq!(
            template.render(&["</y>"]),
            "expected a tag name, found </y>"
        );
    }

    #[test]
    fn leaves_missing_placeholder_literal() {
        let template = ErrorTemplate::parse("saw {1} then {2}");
        assert_eq!(template.render(&["a"]), "saw a then {2}");
    }

    #[test]
    fn literal_braces_without_digits_pass_through() {
        let template = ErrorTemplate::parse("a set {like this}");
        assert_eq!(template.render(&[]), "a set {like this}");
    }

    #[test]
    fn overflowing_placeholder_index_passes_through_literally() {
        let template = ErrorTemplate::parse("found {99999999999999999999}");
        assert_eq!(
            template.render(&[]),
            "found {99999999999999999999}"
        );
    }
}
