/*!
CST post-processing driven by [`crate::config::GrammarConfig`]: disposable
inlining, category/name-based dropping, and the `ReductionPolicy` single-child
collapse. This runs once, immediately after a successful parse and before
[`crate::transform`] ever sees the tree — it's a property of the grammar's
own configuration rather than something a caller opts into per-tree the way a
[`crate::transform::ProcessingTable`] is.

Kept deliberately separate from `transform`: a `GrammarConfig` is fixed at
`Grammar::finalize` time and applies uniformly to every parse against that
grammar, whereas a `ProcessingTable` is an independent value a caller builds
and applies explicitly, possibly differently for different output shapes from
the same grammar.
*/

use std::collections::HashMap;

use parsekit_primitives::node::Content;
use parsekit_primitives::{Arena, Node, ParserKind};

use crate::config::{DropCategory, GrammarConfig};

/// Postprocess `node` in place per `config`: drop configured categories and
/// names, inline disposable nodes, then apply the reduction policy.
///
/// `categories` maps a parser name to the [`DropCategory`] its `ParserKind`
/// belongs to (see [`compute_categories`]), letting this function decide
/// "was this node produced by a `Text` parser" without re-consulting the
/// arena for every node in the tree.
pub fn postprocess(node: &mut Node, config: &GrammarConfig, categories: &HashMap<Box<str>, DropCategory>) {
    drop_and_inline(node, config, categories);
    match config.reduction {
        crate::config::ReductionPolicy::None => {}
        crate::config::ReductionPolicy::MergeTreetops => collapse_single_child(node, false),
        crate::config::ReductionPolicy::Flatten => collapse_single_child(node, true),
    }
}

/// Walk `node`'s children bottom-up, dropping any that are configured away
/// (by category or by name) and inlining any that are disposable (promoting
/// their own children into this position). A node that is itself disposable
/// or dropped is handled by the caller (the parent), since a node can't
/// remove itself from a list it isn't holding.
fn drop_and_inline(node: &mut Node, config: &GrammarConfig, categories: &HashMap<Box<str>, DropCategory>) {
    let Content::Branch(children) = &mut node.content else {
        return;
    };

    let mut result = Vec::with_capacity(children.len());
    for mut child in std::mem::take(children) {
        drop_and_inline(&mut child, config, categories);

        if should_drop(&child, config, categories) {
            continue;
        }

        if config.disposable.is_disposable(&child.tag_name) {
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

fn should_drop(node: &Node, config: &GrammarConfig, categories: &HashMap<Box<str>, DropCategory>) -> bool {
    if config.drops_name(&node.tag_name) {
        return true;
    }
    match categories.get(&node.tag_name) {
        Some(category) => config.drops_category(*category),
        None => false,
    }
}

/// `ReductionPolicy::MergeTreetops` (single pass) / `Flatten` (repeated until
/// no single-child branch remains): replace a branch with exactly one child
/// by that child, recursively. `Flatten` additionally re-checks the node
/// after collapsing, so a chain of single-child wrappers reduces to the
/// innermost meaningful node in one call rather than one layer per pass.
fn collapse_single_child(node: &mut Node, repeat: bool) {
    if let Content::Branch(children) = &mut node.content {
        for child in children.iter_mut() {
            collapse_single_child(child, repeat);
        }
    }

    loop {
        let collapsed = collapse_single_child_once(node);
        if !collapsed || !repeat {
            break;
        }
    }
}

/// If `node` is a branch with exactly one child, replace it with that child
/// (tag, position, attributes, errors — all of it), reporting whether a
/// collapse happened so a caller can decide whether to retry.
fn collapse_single_child_once(node: &mut Node) -> bool {
    let is_single_child_branch = matches!(&node.content, Content::Branch(children) if children.len() == 1);
    if !is_single_child_branch {
        return false;
    }

    let Content::Branch(children) = &mut node.content else {
        unreachable!("checked above");
    };
    let only = children.pop().expect("checked len == 1 above");
    *node = only;
    true
}

/// Classify every named parser in `arena` by the [`DropCategory`] its
/// `ParserKind` belongs to, for [`postprocess`] to consult without having to
/// walk the arena once per tree. Parsers with no matching category (anything
/// but `Text`/`Whitespace`/bare `RegExp`) are simply absent from the map.
pub fn compute_categories(arena: &Arena) -> HashMap<Box<str>, DropCategory> {
    let mut categories = HashMap::new();
    for (_, node) in arena.iter() {
        let category = match &node.kind {
            ParserKind::Text(_) => Some(DropCategory::Strings),
            ParserKind::Whitespace(_) => Some(DropCategory::Whitespace),
            ParserKind::RegExp(_) => Some(DropCategory::Regexps),
            _ => None,
        };
        if let Some(category) = category {
            categories.insert(node.name.clone(), category);
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Disposable;
    use std::collections::BTreeSet;

    #[test]
    fn disposable_children_are_inlined() {
        let mut config = GrammarConfig::new();
        config.disposable = Disposable::Names({
            let mut set = BTreeSet::new();
            set.insert(Box::from("group"));
            set
        });

        let mut tree = Node::branch(
            "sentence",
            vec![
                Node::leaf("word", "a", 0),
                Node::branch("group", vec![Node::leaf("word", "b", 1), Node::leaf("word", "c", 2)], 1),
            ],
            0,
        );

        drop_and_inline(&mut tree, &config, &HashMap::new());
        let tags: Vec<&str> = tree.children().iter().map(|c| &*c.tag_name).collect();
        assert_eq!(tags, vec!["word", "word", "word"]);
    }

    #[test]
    fn category_drop_removes_matching_nodes() {
        let mut config = GrammarConfig::new();
        config.drop.insert(DropCategory::Strings);

        let mut categories = HashMap::new();
        categories.insert(Box::from("paren"), DropCategory::Strings);

        let mut tree = Node::branch(
            "group",
            vec![
                Node::leaf("paren", "(", 0),
                Node::leaf("body", "x", 1),
                Node::leaf("paren", ")", 2),
            ],
            0,
        );

        drop_and_inline(&mut tree, &config, &categories);
        let tags: Vec<&str> = tree.children().iter().map(|c| &*c.tag_name).collect();
        assert_eq!(tags, vec!["body"]);
    }

    #[test]
    fn merge_treetops_collapses_one_layer() {
        let mut tree = Node::branch(
            "outer",
            vec![Node::branch("wrapper", vec![Node::leaf("inner", "x", 0)], 0)],
            0,
        );
        collapse_single_child(&mut tree, false);
        assert_eq!(&*tree.tag_name, "wrapper");
    }

    #[test]
    fn flatten_collapses_a_chain_fully() {
        let mut tree = Node::branch(
            "outer",
            vec![Node::branch(
                "middle",
                vec![Node::branch("inner", vec![Node::leaf("leaf", "x", 0)], 0)],
                0,
            )],
            0,
        );
        collapse_single_child(&mut tree, true);
        assert_eq!(&*tree.tag_name, "leaf");
        assert_eq!(tree.content(), "x");
    }
}
