/*!
The programmatic grammar construction API: the Rust-native equivalent of
"compiled externally into parser trees this core consumes" (the EBNF-like
source syntax in the external interfaces is, per scope, somebody else's
front end). A [`GrammarBuilder`] accumulates parsers into an
[`parsekit_primitives::Arena`] and, on [`GrammarBuilder::finalize`],
validates and freezes them into a [`crate::grammar::Grammar`].
*/

use std::collections::HashMap;

use parsekit_primitives::{Arena, ParserId, ParserKind, SeriesElement};
use regex::Regex;

use crate::config::{GrammarConfig, LiteralWhitespace};
use crate::error::GrammarError;
use crate::grammar::Grammar;

/// Accumulates a parser graph before it is validated and frozen into a
/// [`Grammar`].
pub struct GrammarBuilder {
    arena: Arena,
    names: HashMap<Box<str>, ParserId>,
    redefinitions: Vec<Box<str>>,
    config: GrammarConfig,
}

impl GrammarBuilder {
    /// Start a new builder with the given configuration.
    pub fn new(config: GrammarConfig) -> Self {
        GrammarBuilder {
            arena: Arena::new(),
            names: HashMap::new(),
            redefinitions: Vec::new(),
            config,
        }
    }

    /// Register `id` as a top-level production named `name`. Calling this
    /// twice with the same name is a [`GrammarError::Redefinition`],
    /// surfaced at [`GrammarBuilder::finalize`].
    pub fn define(&mut self, name: impl Into<Box<str>>, id: ParserId) -> ParserId {
        let name = name.into();
        if self.names.contains_key(&name) {
            self.redefinitions.push(name);
        } else {
            self.names.insert(name, id);
        }
        id
    }

    /// Insert a `RegExp` parser matching `pattern` anchored at the current
    /// position.
    pub fn regexp(&mut self, name: impl Into<Box<str>>, pattern: Regex) -> ParserId {
        let name = name.into();
        self.arena.insert(name, ParserKind::RegExp(pattern))
    }

    /// Insert a `Whitespace` parser: like [`GrammarBuilder::regexp`], but
    /// its match is never retained as a node.
    pub fn whitespace(&mut self, name: impl Into<Box<str>>, pattern: Regex) -> ParserId {
        self.arena.insert(name, ParserKind::Whitespace(pattern))
    }

    /// Insert a bare `Text` parser with no whitespace absorption (the
    /// backtick literal in the external grammar syntax). Prefer
    /// [`GrammarBuilder::lit`] for ordinary quoted-string literals, which
    /// additionally honors the grammar's configured
    /// [`LiteralWhitespace`] policy.
    pub fn text(&mut self, name: impl Into<Box<str>>, literal: impl Into<Box<str>>) -> ParserId {
        self.arena.insert(name, ParserKind::Text(literal.into()))
    }

    /// Insert a literal matching `text`, absorbing adjacent whitespace per
    /// the grammar's configured [`LiteralWhitespace`] policy. This is the
    /// `"…"` quoted-string literal of the external grammar syntax; building
    /// the absorption in at construction time (rather than as a flag
    /// carried on `ParserKind::Text` itself) keeps the atomic parser kinds
    /// free of grammar-level configuration.
    pub fn lit(&mut self, name: impl Into<Box<str>>, text: impl Into<Box<str>>, whitespace: ParserId) -> ParserId {
        let name = name.into();
        let literal = self.arena.insert(format!("{name}#literal"), ParserKind::Text(text.into()));

        match self.config.literal_whitespace {
            LiteralWhitespace::None => literal,
            LiteralWhitespace::Right => self.series_named(
                name,
                vec![element(literal, false), element(whitespace, false)],
                None,
            ),
            LiteralWhitespace::Left => self.series_named(
                name,
                vec![element(whitespace, false), element(literal, false)],
                None,
            ),
            LiteralWhitespace::Both => self.series_named(
                name,
                vec![
                    element(whitespace, false),
                    element(literal, false),
                    element(whitespace, false),
                ],
                None,
            ),
        }
    }

    /// Insert an `EOF` parser.
    pub fn eof(&mut self, name: impl Into<Box<str>>) -> ParserId {
        self.arena.insert(name, ParserKind::Eof)
    }

    /// Insert an `Option` combinator.
    pub fn option(&mut self, name: impl Into<Box<str>>, child: ParserId) -> ParserId {
        self.arena.insert(name, ParserKind::Option(child))
    }

    /// Insert a `ZeroOrMore` combinator.
    pub fn zero_or_more(&mut self, name: impl Into<Box<str>>, child: ParserId) -> ParserId {
        self.arena.insert(name, ParserKind::ZeroOrMore(child))
    }

    /// Insert a `OneOrMore` combinator.
    pub fn one_or_more(&mut self, name: impl Into<Box<str>>, child: ParserId) -> ParserId {
        self.arena.insert(name, ParserKind::OneOrMore(child))
    }

    /// Insert a `Drop` combinator: matches `child` but never retains its
    /// node.
    pub fn drop(&mut self, name: impl Into<Box<str>>, child: ParserId) -> ParserId {
        self.arena.insert(name, ParserKind::Drop(child))
    }

    /// Insert a positive `Lookahead`.
    pub fn lookahead(&mut self, name: impl Into<Box<str>>, child: ParserId) -> ParserId {
        self.arena.insert(name, ParserKind::Lookahead(child))
    }

    /// Insert a `NegativeLookahead`.
    pub fn negative_lookahead(&mut self, name: impl Into<Box<str>>, child: ParserId) -> ParserId {
        self.arena.insert(name, ParserKind::NegativeLookahead(child))
    }

    /// Insert a `Lookbehind`, matching `pattern` against the text
    /// immediately preceding the current position.
    pub fn lookbehind(&mut self, name: impl Into<Box<str>>, pattern: Regex) -> ParserId {
        self.arena.insert(name, ParserKind::Lookbehind(pattern))
    }

    /// Insert a `NegativeLookbehind`.
    pub fn negative_lookbehind(&mut self, name: impl Into<Box<str>>, pattern: Regex) -> ParserId {
        self.arena.insert(name, ParserKind::NegativeLookbehind(pattern))
    }

    /// Insert a `Synonym`: transparent indirection that renames `child`'s
    /// result for tree reporting.
    pub fn synonym(&mut self, name: impl Into<Box<str>>, child: ParserId) -> ParserId {
        self.arena.insert(name, ParserKind::Synonym(child))
    }

    /// Insert a `Capture`: on `child`'s success, pushes its matched content
    /// onto the named stack.
    pub fn capture(&mut self, name: impl Into<Box<str>>, stack: impl Into<Box<str>>, child: ParserId) -> ParserId {
        self.arena.insert(
            name,
            ParserKind::Capture {
                name: stack.into(),
                child,
            },
        )
    }

    /// Insert a `Pop`: matches (and removes) the top of the named stack.
    pub fn pop(&mut self, name: impl Into<Box<str>>, stack: impl Into<Box<str>>) -> ParserId {
        self.arena.insert(name, ParserKind::Pop(stack.into()))
    }

    /// Insert a `Retrieve`: matches the top of the named stack without
    /// removing it.
    pub fn retrieve(&mut self, name: impl Into<Box<str>>, stack: impl Into<Box<str>>) -> ParserId {
        self.arena.insert(name, ParserKind::Retrieve(stack.into()))
    }

    /// Insert an `Alternative` over `children`, tried in order.
    pub fn alternative(&mut self, name: impl Into<Box<str>>, children: Vec<ParserId>) -> ParserId {
        self.arena
            .insert(name, ParserKind::Alternative(children.into_boxed_slice()))
    }

    /// Insert a `Series`. `elements` pairs each child with whether it (and
    /// everything after it) is past the `§` mandatory marker; build these
    /// with [`element`] and [`mandatory`].
    pub fn series(
        &mut self,
        name: impl Into<Box<str>>,
        elements: Vec<SeriesElement>,
        error_template: Option<&str>,
    ) -> ParserId {
        self.series_named(name, elements, error_template)
    }

    fn series_named(
        &mut self,
        name: impl Into<Box<str>>,
        elements: Vec<SeriesElement>,
        error_template: Option<&str>,
    ) -> ParserId {
        self.arena.insert(
            name,
            ParserKind::Series {
                children: elements.into_boxed_slice(),
                error_template: error_template.map(parsekit_primitives::ErrorTemplate::parse),
            },
        )
    }

    /// Reserve a `Forward` slot, to be patched later with
    /// [`GrammarBuilder::set_forward`]. Used to express cyclic productions
    /// (e.g. `paragraph → text_element → paragraph`).
    pub fn forward(&mut self, name: impl Into<Box<str>>) -> ParserId {
        self.arena.insert_forward(name)
    }

    /// Patch a previously reserved forward reference.
    pub fn set_forward(&mut self, forward_id: ParserId, target: ParserId) {
        self.arena.set_forward(forward_id, target);
    }

    /// Validate and freeze the accumulated parser graph into a [`Grammar`].
    pub fn finalize(self) -> Result<Grammar, GrammarError> {
        Grammar::finalize(self.arena, self.names, self.redefinitions, self.config)
    }
}

/// Build a [`SeriesElement`] that is not past the mandatory marker.
pub fn element(child: ParserId, mandatory: bool) -> SeriesElement {
    SeriesElement { child, mandatory }
}

/// Build a [`SeriesElement`] that is at or past the `§` mandatory marker —
/// a convenience over [`element`] for the common case of marking the first
/// mandatory element.
pub fn mandatory(child: ParserId) -> SeriesElement {
    SeriesElement {
        child,
        mandatory: true,
    }
}
