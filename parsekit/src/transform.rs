/*!
The transformation engine: a table-driven rewrite applied to a completed
CST to produce a reduced AST suitable for compiling to arbitrary output.
This runs once, after parsing and the [`crate::grammar`] container's own
disposable/drop/reduction postprocessing, as a separate pass a caller
drives explicitly — unlike that earlier postprocessing, which is bound to
a `Grammar`'s configuration, a [`ProcessingTable`] is an independent,
reusable value a caller can build several of (different tables for
different output shapes from the same tree).

Selectors and operations are a typed list of pairs rather than a dict of
callables: a [`Selector`] is either a tag name, a set of tag names, or one
of the two wildcards (`<` pre-order-all, `*` post-order-all), and an
[`Operation`] is either one of the closed set of built-ins (the fast path)
or a boxed callback (the escape hatch named [`Operation::Custom`]).
*/

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parsekit_primitives::node::Content;
use parsekit_primitives::Node;

/// Which nodes an [`Operation`] list applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Selector {
    /// Nodes with exactly this tag.
    Tag(Box<str>),
    /// Nodes with any tag in this set.
    TagSet(BTreeSet<Box<str>>),
    /// Every node, visited pre-order (before its children are processed) —
    /// the `<` wildcard.
    PreOrderAll,
    /// Every node, visited post-order (after its children and any
    /// tag-specific operations have run) — the `*` wildcard.
    PostOrderAll,
}

impl Selector {
    fn matches_tag(&self, tag: &str) -> bool {
        match self {
            Selector::Tag(name) => &**name == tag,
            Selector::TagSet(names) => names.contains(tag),
            Selector::PreOrderAll | Selector::PostOrderAll => false,
        }
    }
}

/// A predicate over a node, used by [`Operation::RemoveChildrenIf`],
/// [`Operation::Strip`], and [`Operation::ApplyUnless`].
pub type Predicate = Arc<dyn Fn(&Node) -> bool + Send + Sync>;

/// A leaf-content rewrite, used by [`Operation::TransformContent`].
pub type ContentFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// The escape-hatch general callback, given the node and the tag names of
/// its ancestors (root-to-parent order) for context a built-in operation
/// can't express.
pub type CustomFn = Arc<dyn Fn(&mut Node, &[Box<str>]) + Send + Sync>;

/// One rewrite step, applied to a node matching a [`Selector`].
///
/// The eleven built-ins cover the common tree-reshaping operations a
/// transformation pass needs; [`Operation::Custom`] is the general-purpose
/// escape hatch for anything they can't express.
#[derive(Clone)]
pub enum Operation {
    /// Replace an anonymous (`_`-prefixed) child with its own children, in
    /// place in the parent's child list.
    Flatten,
    /// If the node has exactly one child, replace its content with that
    /// child's content, preserving the node's own tag.
    ReduceSingleChild,
    /// If the node has exactly one child, replace the node with that child
    /// entirely (tag and all).
    ReplaceBySingleChild,
    /// Remove direct children matching `predicate`.
    RemoveChildrenIf(Predicate),
    /// Remove direct children whose entire content is whitespace.
    RemoveWhitespace,
    /// Remove direct children whose content is the empty string.
    RemoveEmpty,
    /// Remove direct children whose tag is in `tags`.
    RemoveTokens(BTreeSet<Box<str>>),
    /// Merge adjacent leaf children into a single leaf, concatenating their
    /// text (taking the first merged leaf's tag and position).
    Collapse,
    /// Drop the first and last child (a node with fewer than two children
    /// is left alone).
    RemoveBrackets,
    /// Remove leading and trailing children matching `predicate`, stopping
    /// at the first (from each end) that doesn't match.
    Strip(Predicate),
    /// Rewrite a leaf's text through `f`. A no-op on a branch node.
    TransformContent(ContentFn),
    /// Replace the node's content outright with a fixed string, turning a
    /// branch into a leaf if necessary.
    ReplaceContentWith(Box<str>),
    /// Run `op` unless `predicate(node)` holds.
    ApplyUnless(Box<Operation>, Predicate),
    /// The general escape hatch.
    Custom(CustomFn),
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Flatten => "Flatten",
            Operation::ReduceSingleChild => "ReduceSingleChild",
            Operation::ReplaceBySingleChild => "ReplaceBySingleChild",
            Operation::RemoveChildrenIf(_) => "RemoveChildrenIf",
            Operation::RemoveWhitespace => "RemoveWhitespace",
            Operation::RemoveEmpty => "RemoveEmpty",
            Operation::RemoveTokens(_) => "RemoveTokens",
            Operation::Collapse => "Collapse",
            Operation::RemoveBrackets => "RemoveBrackets",
            Operation::Strip(_) => "Strip",
            Operation::TransformContent(_) => "TransformContent",
            Operation::ReplaceContentWith(_) => "ReplaceContentWith",
            Operation::ApplyUnless(..) => "ApplyUnless",
            Operation::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}

impl Operation {
    fn run(&self, node: &mut Node, ancestors: &[Box<str>]) {
        match self {
            Operation::Flatten => flatten(node),
            Operation::ReduceSingleChild => reduce_single_child(node),
            Operation::ReplaceBySingleChild => replace_by_single_child(node),
            Operation::RemoveChildrenIf(pred) => remove_children_if(node, |n| pred(n)),
            Operation::RemoveWhitespace => remove_children_if(node, |n| n.is_leaf() && n.content().trim().is_empty() && !n.content().is_empty()),
            Operation::RemoveEmpty => remove_children_if(node, |n| n.content().is_empty()),
            Operation::RemoveTokens(tags) => remove_children_if(node, |n| tags.contains(&*n.tag_name)),
            Operation::Collapse => collapse(node),
            Operation::RemoveBrackets => remove_brackets(node),
            Operation::Strip(pred) => strip(node, |n| pred(n)),
            Operation::TransformContent(f) => transform_content(node, |s| f(s)),
            Operation::ReplaceContentWith(s) => node.content = Content::Leaf(s.clone()),
            Operation::ApplyUnless(op, pred) => {
                if !pred(node) {
                    op.run(node, ancestors);
                }
            }
            Operation::Custom(f) => f(node, ancestors),
        }
    }
}

fn flatten(node: &mut Node) {
    let Content::Branch(children) = &mut node.content else {
        return;
    };

    let mut result = Vec::with_capacity(children.len());
    for child in std::mem::take(children) {
        if child.tag_name.starts_with('_') {
            match child.content {
                Content::Branch(grandchildren) => result.extend(grandchildren),
                Content::Leaf(_) => {}
            }
        } else {
            result.push(child);
        }
    }
    *children = result;
}

fn reduce_single_child(node: &mut Node) {
    if node.children().len() == 1 {
        let only = node.take_children().pop().expect("checked len == 1 above");
        node.content = only.content;
        node.position = only.position;
    }
}

fn replace_by_single_child(node: &mut Node) {
    if node.children().len() == 1 {
        let only = node.take_children().pop().expect("checked len == 1 above");
        *node = only;
    }
}

fn remove_children_if(node: &mut Node, pred: impl Fn(&Node) -> bool) {
    if let Content::Branch(children) = &mut node.content {
        children.retain(|child| !pred(child));
    }
}

fn collapse(node: &mut Node) {
    let Content::Branch(children) = &mut node.content else {
        return;
    };

    let mut result: Vec<Node> = Vec::with_capacity(children.len());
    for child in std::mem::take(children) {
        match (result.last_mut(), child.is_leaf()) {
            (Some(last), true) if last.is_leaf() => {
                let merged = format!("{}{}", last.content(), child.content());
                last.content = Content::Leaf(merged.into_boxed_str());
            }
            _ => result.push(child),
        }
    }
    *children = result;
}

fn remove_brackets(node: &mut Node) {
    if let Content::Branch(children) = &mut node.content {
        if children.len() >= 2 {
            children.remove(children.len() - 1);
            children.remove(0);
        }
    }
}

fn strip(node: &mut Node, pred: impl Fn(&Node) -> bool) {
    let Content::Branch(children) = &mut node.content else {
        return;
    };

    let mut start = 0;
    while start < children.len() && pred(&children[start]) {
        start += 1;
    }
    let mut end = children.len();
    while end > start && pred(&children[end - 1]) {
        end -= 1;
    }
    *children = children[start..end].to_vec();
}

fn transform_content(node: &mut Node, f: impl Fn(&str) -> String) {
    if let Content::Leaf(text) = &node.content {
        let rewritten = f(text);
        node.content = Content::Leaf(rewritten.into_boxed_str());
    }
}

/// A mapping from tag-name (or tag-set, or wildcard) to an ordered list of
/// [`Operation`]s, applied to a completed CST by [`ProcessingTable::apply`].
#[derive(Default)]
pub struct ProcessingTable {
    entries: Vec<(Selector, Vec<Operation>)>,
}

impl ProcessingTable {
    /// An empty table.
    pub fn new() -> Self {
        ProcessingTable::default()
    }

    /// Register `ops` to run, in order, on every node matching `selector`.
    /// Calling this more than once for the same selector appends a second
    /// entry rather than replacing the first; both run, in registration
    /// order.
    pub fn register(&mut self, selector: Selector, ops: Vec<Operation>) -> &mut Self {
        self.entries.push((selector, ops));
        self
    }

    /// Apply this table to `node` and every descendant, depth-first.
    ///
    /// For each node: pre-order (`<`) operations run before descending into
    /// children; then children are visited (post-order, so a child's own
    /// rewrite is complete before its parent's tag-specific operations run);
    /// then this node's tag-specific operations run, followed by
    /// post-order-all (`*`) operations. Within each of those three passes,
    /// matching entries are re-checked against the node's *current* tag as
    /// each one's operations complete — since an earlier operation may
    /// itself retag the node (`ReplaceBySingleChild` being the obvious
    /// example), a later entry in the same pass can end up matching (or no
    /// longer matching) as a result.
    pub fn apply(&self, node: &mut Node) {
        let mut ancestors = Vec::new();
        self.apply_with_ancestors(node, &mut ancestors);
    }

    fn apply_with_ancestors(&self, node: &mut Node, ancestors: &mut Vec<Box<str>>) {
        for (selector, ops) in &self.entries {
            if matches!(selector, Selector::PreOrderAll) {
                for op in ops {
                    op.run(node, ancestors.as_slice());
                }
            }
        }

        if let Content::Branch(_) = &node.content {
            ancestors.push(node.tag_name.clone());
            if let Content::Branch(children) = &mut node.content {
                for child in children.iter_mut() {
                    self.apply_with_ancestors(child, ancestors);
                }
            }
            ancestors.pop();
        }

        for (selector, ops) in &self.entries {
            if selector.matches_tag(&node.tag_name) {
                for op in ops {
                    op.run(node, ancestors.as_slice());
                }
            }
        }

        for (selector, ops) in &self.entries {
            if matches!(selector, Selector::PostOrderAll) {
                for op in ops {
                    op.run(node, ancestors.as_slice());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_inlines_anonymous_children() {
        let mut node = Node::branch(
            "sentence",
            vec![
                Node::leaf("word", "a", 0),
                Node::branch("_group", vec![Node::leaf("word", "b", 1), Node::leaf("word", "c", 2)], 1),
            ],
            0,
        );
        flatten(&mut node);
        let tags: Vec<&str> = node.children().iter().map(|c| &*c.tag_name).collect();
        assert_eq!(tags, vec!["word", "word", "word"]);
    }

    #[test]
    fn reduce_single_child_keeps_parent_tag() {
        let mut node = Node::branch("wrapper", vec![Node::leaf("inner", "x", 0)], 0);
        reduce_single_child(&mut node);
        assert_eq!(&*node.tag_name, "wrapper");
        assert_eq!(node.content(), "x");
        assert!(node.is_leaf());
    }

    #[test]
    fn replace_by_single_child_adopts_child_tag() {
        let mut node = Node::branch("wrapper", vec![Node::leaf("inner", "x", 3)], 0);
        replace_by_single_child(&mut node);
        assert_eq!(&*node.tag_name, "inner");
        assert_eq!(node.position, 3);
    }

    #[test]
    fn remove_brackets_drops_first_and_last() {
        let mut node = Node::branch(
            "group",
            vec![
                Node::leaf("open", "(", 0),
                Node::leaf("body", "x", 1),
                Node::leaf("close", ")", 2),
            ],
            0,
        );
        remove_brackets(&mut node);
        let tags: Vec<&str> = node.children().iter().map(|c| &*c.tag_name).collect();
        assert_eq!(tags, vec!["body"]);
    }

    #[test]
    fn collapse_merges_adjacent_leaves() {
        let mut node = Node::branch(
            "word",
            vec![Node::leaf("char", "a", 0), Node::leaf("char", "b", 1)],
            0,
        );
        collapse(&mut node);
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].content(), "ab");
    }

    #[test]
    fn strip_trims_matching_ends_only() {
        let mut node = Node::branch(
            "line",
            vec![
                Node::leaf("ws", " ", 0),
                Node::leaf("word", "hi", 1),
                Node::leaf("ws", " ", 3),
            ],
            0,
        );
        strip(&mut node, |n| &*n.tag_name == "ws");
        let tags: Vec<&str> = node.children().iter().map(|c| &*c.tag_name).collect();
        assert_eq!(tags, vec!["word"]);
    }

    #[test]
    fn processing_table_runs_tag_then_wildcard_then_postorder_siblings_already_done() {
        let mut table = ProcessingTable::new();
        table.register(
            Selector::Tag("wrapper".into()),
            vec![Operation::ReplaceBySingleChild],
        );
        table.register(
            Selector::PostOrderAll,
            vec![Operation::TransformContent(Arc::new(|s| s.to_uppercase()))],
        );

        let mut tree = Node::branch(
            "root",
            vec![Node::branch("wrapper", vec![Node::leaf("inner", "x", 0)], 0)],
            0,
        );
        table.apply(&mut tree);

        assert_eq!(&*tree.children()[0].tag_name, "inner");
        assert_eq!(tree.children()[0].content(), "X");
    }
}
