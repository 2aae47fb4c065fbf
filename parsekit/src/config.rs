/*!
Grammar-wide configuration. This is a typed, constructible Rust value rather
than a parsed file format: the grammar *source* syntax (`@ literalws = ...`
directives and the like) is the external code generator's concern, out of
scope for this core — a `GrammarConfig` is what that front end (or a caller
embedding this library directly) would ultimately produce.
*/

use std::collections::BTreeSet;

use derive_new::new;

use parsekit_primitives::XmlTagKind;

/// Automatic whitespace absorption around `Text` literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiteralWhitespace {
    /// No absorption; a literal matches only its exact characters.
    #[default]
    None,
    /// Absorb whitespace immediately following the literal.
    Right,
    /// Absorb whitespace immediately preceding the literal.
    Left,
    /// Absorb whitespace on both sides.
    Both,
}

/// CST compression policy applied while building the tree (distinct from
/// the post-parse `parsekit::transform` table, which runs once parsing has
/// finished).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReductionPolicy {
    /// Retain every node exactly as parsed.
    #[default]
    None,
    /// Merge a disposable node's single child into its parent's child list.
    MergeTreetops,
    /// Aggressively flatten anonymous single-child chains.
    Flatten,
}

/// Categories of node that [`GrammarConfig::drop`] can remove wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropCategory {
    /// Every node produced by a `Text` literal.
    Strings,
    /// Every node produced by a `Whitespace` parser (already the default
    /// via `Whitespace`'s own node-free match, but listed explicitly so a
    /// grammar can opt a particular regex-backed token out of the default).
    Whitespace,
    /// Every node produced by a bare `RegExp` parser.
    Regexps,
}

/// Which tags are treated as disposable: their node is inlined (children
/// promoted into the parent) rather than retained.
#[derive(Debug, Clone, Default)]
pub enum Disposable {
    /// No tag is disposable beyond the `_`-prefix convention every grammar
    /// gets for free.
    #[default]
    None,
    /// An explicit set of tag names, in addition to the `_`-prefix
    /// convention.
    Names(BTreeSet<Box<str>>),
}

impl Disposable {
    /// `true` if `tag` should be treated as disposable: either `_`-prefixed
    /// (the universal convention) or present in an explicit name set.
    pub fn is_disposable(&self, tag: &str) -> bool {
        tag.starts_with('_')
            || matches!(self, Disposable::Names(names) if names.contains(tag))
    }
}

/// The full configuration set enumerated in the grammar container's
/// responsibilities: literal whitespace handling, CST reduction policy,
/// disposable tags, drop categories, and the two debug toggles.
#[derive(Debug, Clone, new)]
pub struct GrammarConfig {
    /// Whitespace absorption around `Text` literals.
    #[new(default)]
    pub literal_whitespace: LiteralWhitespace,

    /// CST compression policy.
    #[new(default)]
    pub reduction: ReductionPolicy,

    /// Which tags are disposable (inlined rather than retained).
    #[new(default)]
    pub disposable: Disposable,

    /// Node categories dropped wholesale during parsing.
    #[new(default)]
    pub drop: BTreeSet<DropCategory>,

    /// Specific parser names dropped wholesale, in addition to `drop`'s
    /// categories.
    #[new(default)]
    pub drop_names: BTreeSet<Box<str>>,

    /// Whether `parsekit::history` records a call trace for every parser
    /// invocation. Checked once per call rather than per `tracing`
    /// subscriber state, so toggling a subscriber off still leaves
    /// well-defined (just undelivered) trace events, while toggling this
    /// off skips the recording work entirely.
    #[new(value = "false")]
    pub history_tracking: bool,

    /// Whether a `Series`'s recovery attempts additionally emit a
    /// `Warning`-severity notice when they succeed (as opposed to staying
    /// silent about having resynchronized at all).
    #[new(value = "false")]
    pub resume_notices: bool,

    /// Tags whose `serialize_xml` rendering keeps children on the same line
    /// as the opening tag, instead of one indented line per child.
    #[new(default)]
    pub inline_tags: BTreeSet<Box<str>>,

    /// Tags rendered as a self-closing element (`<tag/>`), dropping their
    /// content, regardless of whether they actually have any.
    #[new(default)]
    pub empty_tags: BTreeSet<Box<str>>,

    /// Tags whose content is always serialized as a single run of escaped
    /// text, even if the node is a branch (its children's own text is
    /// concatenated first) — for leaf-like tags the grammar happens to build
    /// as branches (e.g. a merged string body after `Collapse`).
    #[new(default)]
    pub string_tags: BTreeSet<Box<str>>,
}

impl GrammarConfig {
    /// `true` if `category` is in the configured drop set.
    pub fn drops_category(&self, category: DropCategory) -> bool {
        self.drop.contains(&category)
    }

    /// `true` if `name` is specifically configured to be dropped.
    pub fn drops_name(&self, name: &str) -> bool {
        self.drop_names.contains(name)
    }

    /// How [`parsekit_primitives::Node::serialize_xml`] should render `tag`,
    /// per this configuration's `empty_tags`/`inline_tags` sets. Checked in
    /// that order: a tag in both is rendered empty (content is dropped
    /// outright, so inlining it would be moot).
    pub fn classify_xml_tag(&self, tag: &str) -> XmlTagKind {
        if self.empty_tags.contains(tag) {
            XmlTagKind::Empty
        } else if self.inline_tags.contains(tag) || self.string_tags.contains(tag) {
            XmlTagKind::Inline
        } else {
            XmlTagKind::Block
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_disposes_only_underscore_prefixed_tags() {
        let config = GrammarConfig::new();
        assert!(config.disposable.is_disposable("_hidden"));
        assert!(!config.disposable.is_disposable("visible"));
    }

    #[test]
    fn explicit_disposable_names_are_honored_alongside_prefix() {
        let mut names = BTreeSet::new();
        names.insert(Box::from("comment"));
        let disposable = Disposable::Names(names);
        assert!(disposable.is_disposable("comment"));
        assert!(disposable.is_disposable("_anything"));
        assert!(!disposable.is_disposable("keep"));
    }

    #[test]
    fn classify_xml_tag_prefers_empty_over_inline() {
        let mut config = GrammarConfig::new();
        config.empty_tags.insert(Box::from("br"));
        config.inline_tags.insert(Box::from("br"));
        config.inline_tags.insert(Box::from("span"));

        assert_eq!(config.classify_xml_tag("br"), XmlTagKind::Empty);
        assert_eq!(config.classify_xml_tag("span"), XmlTagKind::Inline);
        assert_eq!(config.classify_xml_tag("div"), XmlTagKind::Block);
    }
}
