/*!
An HTML-style balanced-tag grammar exercising `Capture`/`Pop`:

```text
element = "<" capture(tag_name, identifier) ">" text "</" pop(tag_name) ">"
```

The opening tag's name is pushed onto the `tag_name` capture stack;
the closing tag must match (and pop) the same name literally, so `<b>hi</i>`
fails to parse while `<b>hi</b>` succeeds.
*/

use parsekit::builder::{element, mandatory, GrammarBuilder};
use parsekit::config::GrammarConfig;
use parsekit::grammar::Grammar;
use regex::Regex;

/// Build the tag-matching grammar, rooted at `"element"`.
pub fn grammar() -> Grammar {
    let mut builder = GrammarBuilder::new(GrammarConfig::new());

    let identifier = builder.regexp("identifier", Regex::new(r"\A[a-zA-Z][a-zA-Z0-9]*").unwrap());
    let text = builder.regexp("text", Regex::new(r"\A[^<]*").unwrap());

    let open_bracket = builder.text("open_bracket", "<");
    let close_bracket = builder.text("close_bracket", ">");
    let close_open_bracket = builder.text("close_open_bracket", "</");

    let captured_name = builder.capture("captured_name", "tag_name", identifier);
    let popped_name = builder.pop("popped_name", "tag_name");

    let element_rule = builder.series(
        "element",
        vec![
            element(open_bracket, false),
            element(captured_name, false),
            mandatory(close_bracket),
            mandatory(text),
            mandatory(close_open_bracket),
            mandatory(popped_name),
            mandatory(close_bracket),
        ],
        Some("malformed tag, found {1}"),
    );

    builder.define("element", element_rule);
    builder.define("root", element_rule);

    builder.finalize().expect("tag grammar is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_tags_parse_successfully() {
        let grammar = grammar();
        let outcome = parsekit::parse(&grammar, "<b>hi</b>", None, true).unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn mismatched_closing_tag_fails_to_pop() {
        let grammar = grammar();
        let outcome = parsekit::parse(&grammar, "<b>hi</i>", None, true).unwrap();
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn repeated_parses_against_the_same_grammar_are_independent() {
        // Each `parse` call gets a fresh `ParseState`, so capture stack
        // contents never carry over between calls — a differently-named
        // tag on the next parse must not spuriously resolve against a name
        // captured by a previous, unrelated parse.
        let grammar = grammar();
        let first = parsekit::parse(&grammar, "<b>hi</b>", None, true).unwrap();
        let second = parsekit::parse(&grammar, "<i>bye</i>", None, true).unwrap();
        assert!(first.is_success());
        assert!(second.is_success());
    }
}
