/*!
The parser graph arena.

A grammar's parsers are stored in a flat `Vec`, addressed by small integer
[`ParserId`]s rather than shared-ownership pointers. This is the
arena-of-indices design called for in preference to the reference
implementation's assignable-later placeholder objects: [`Forward`]
references become an index patched once during grammar finalization, cycles
are just indices pointing backward or forward in the same `Vec`, and the
whole graph is `Copy`-cheap to reference from anywhere without borrow-checker
friction.
*/

use std::cell::OnceCell;

use regex::Regex;

use crate::error::ErrorTemplate;

/// An index into a [`Arena`]. Cheap to copy, meaningless outside the arena
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParserId(pub(crate) u32);

impl ParserId {
    /// The raw index backing this id, for diagnostics.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One parser in the graph: its declared name (if any) and its variant.
#[derive(Debug)]
pub struct ParserNode {
    /// The name assigned at grammar finalization. Anonymous inline parsers
    /// (e.g. an un-named alternative nested inside a series) get a
    /// synthesized name such as `"series#3"`.
    pub name: Box<str>,

    /// The parser's behavior.
    pub kind: ParserKind,
}

/// A single element of a [`ParserKind::Series`]: the child parser, plus
/// whether reaching it should promote subsequent failures from plain
/// backtracks into recorded, recovered errors (the `§` mandatory marker).
#[derive(Debug, Clone, Copy)]
pub struct SeriesElement {
    /// The element's parser.
    pub child: ParserId,
    /// `true` once the `§` marker has been reached, inclusive of the
    /// element it is attached to.
    pub mandatory: bool,
}

/// The parser variant. Dispatch over this enum (in `crate::eval`) replaces
/// the reference implementation's duck-typed `parse()` method with a single
/// match arm per combinator kind — the small, closed set of combinators
/// (~15) makes this both clearer to read and friendlier to the optimizer
/// than dynamic dispatch would be.
#[derive(Debug)]
pub enum ParserKind {
    // --- Atomic -----------------------------------------------------
    /// Match a compiled regex, anchored at the current position.
    RegExp(Regex),
    /// Match an exact literal string.
    Text(Box<str>),
    /// Like `RegExp`, but the resulting node is dropped by default.
    Whitespace(Regex),
    /// Succeed iff the position equals the input length. Zero-width.
    Eof,

    // --- Unary --------------------------------------------------------
    /// Optionally match the child; always succeeds.
    Option(ParserId),
    /// Match the child zero or more times.
    ZeroOrMore(ParserId),
    /// Match the child one or more times.
    OneOrMore(ParserId),
    /// Match the child, but never retain its output node.
    Drop(ParserId),
    /// Zero-width positive lookahead.
    Lookahead(ParserId),
    /// Zero-width negative lookahead.
    NegativeLookahead(ParserId),
    /// Zero-width positive lookbehind against a pattern.
    Lookbehind(Regex),
    /// Zero-width negative lookbehind against a pattern.
    NegativeLookbehind(Regex),
    /// Transparent indirection that preserves a name for tree reporting.
    Synonym(ParserId),
    /// Push the child's matched content onto a named capture stack.
    Capture { name: Box<str>, child: ParserId },
    /// Match (and remove) the top of a named capture stack, literally.
    Pop(Box<str>),
    /// Match the top of a named capture stack, literally, without removing.
    Retrieve(Box<str>),

    // --- N-ary ----------------------------------------------------------
    /// Ordered concatenation. Failure before the first mandatory element
    /// backtracks; failure at or after it is recorded and recovery is
    /// attempted.
    Series {
        children: Box<[SeriesElement]>,
        error_template: Option<ErrorTemplate>,
    },
    /// Ordered choice; first success wins.
    Alternative(Box<[ParserId]>),

    // --- Reference --------------------------------------------------
    /// A one-time-settable indirection, permitting cycles in the graph.
    /// Patched exactly once during `Grammar::finalize`.
    Forward(OnceCell<ParserId>),
}

impl ParserKind {
    /// The ids this parser refers to directly (not transitively), used by
    /// the static analysis passes (context-sensitivity, droppability) run
    /// once at `Grammar::finalize`. Owned rather than borrowed since a
    /// `Series`'s children live behind `SeriesElement`, not as bare ids.
    pub fn direct_children(&self) -> Vec<ParserId> {
        match self {
            ParserKind::Option(id)
            | ParserKind::ZeroOrMore(id)
            | ParserKind::OneOrMore(id)
            | ParserKind::Drop(id)
            | ParserKind::Lookahead(id)
            | ParserKind::NegativeLookahead(id)
            | ParserKind::Synonym(id)
            | ParserKind::Capture { child: id, .. } => vec![*id],
            ParserKind::Alternative(ids) => ids.to_vec(),
            ParserKind::Series { children, .. } => {
                children.iter().map(|element| element.child).collect()
            }
            ParserKind::RegExp(_)
            | ParserKind::Text(_)
            | ParserKind::Whitespace(_)
            | ParserKind::Eof
            | ParserKind::Lookbehind(_)
            | ParserKind::NegativeLookbehind(_)
            | ParserKind::Pop(_)
            | ParserKind::Retrieve(_)
            | ParserKind::Forward(_) => Vec::new(),
        }
    }
}

/// Owns every parser in a grammar, addressed by [`ParserId`].
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<ParserNode>,
}

impl Arena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Arena { nodes: Vec::new() }
    }

    /// Insert a new parser, returning its id.
    pub fn insert(&mut self, name: impl Into<Box<str>>, kind: ParserKind) -> ParserId {
        let id = ParserId(self.nodes.len() as u32);
        self.nodes.push(ParserNode {
            name: name.into(),
            kind,
        });
        id
    }

    /// Reserve a [`Forward`][ParserKind::Forward] slot, to be patched later
    /// via [`Arena::set_forward`].
    pub fn insert_forward(&mut self, name: impl Into<Box<str>>) -> ParserId {
        self.insert(name, ParserKind::Forward(OnceCell::new()))
    }

    /// Patch a previously reserved forward reference. Panics if `id` is not
    /// a `Forward` node, or if it has already been set — forward
    /// references are one-time-settable by design.
    pub fn set_forward(&mut self, id: ParserId, target: ParserId) {
        match &self.nodes[id.index()].kind {
            ParserKind::Forward(cell) => cell
                .set(target)
                .expect("forward reference is already set; forwards are one-time-settable"),
            _ => panic!("set_forward called on a non-Forward parser"),
        }
    }

    /// Look up a parser's node by id.
    pub fn get(&self, id: ParserId) -> &ParserNode {
        &self.nodes[id.index()]
    }

    /// The number of parsers in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if the arena holds no parsers.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over every `(id, node)` pair in insertion order. Used by
    /// grammar finalization to precompute static metadata.
    pub fn iter(&self) -> impl Iterator<Item = (ParserId, &ParserNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (ParserId(i as u32), node))
    }

    /// Follow a `Forward` node to its (possibly further-forwarded) target.
    /// Non-`Forward` ids are returned unchanged. Panics on an unresolved
    /// forward — this should have been rejected at `Grammar::finalize`.
    pub fn resolve(&self, mut id: ParserId) -> ParserId {
        loop {
            match &self.nodes[id.index()].kind {
                ParserKind::Forward(cell) => {
                    id = *cell
                        .get()
                        .expect("unresolved forward reference escaped grammar finalization");
                }
                _ => return id,
            }
        }
    }
}
