/*!
The grammar container: registry, finalization, and the per-thread singleton
convenience wrapper.

[`Grammar::finalize`] is where the [`crate::builder::GrammarBuilder`]'s
accumulated parser graph is validated — every [`GrammarError`] case is
raised here, eagerly, rather than lazily at first parse, since a library
consumer builds a grammar once and reuses it across many parses.
*/

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};

use parsekit_primitives::{Arena, ParserId, ParserKind, ResumeLookup};

use crate::config::{DropCategory, GrammarConfig};
use crate::error::GrammarError;
use crate::recovery::ResumeTable;

/// A validated, immutable parser graph together with its configuration and
/// resume-point table. Safe to share read-only across threads; reuse across
/// parses is expected (and required for regex-compilation warm-up).
pub struct Grammar {
    arena: Arena,
    names: HashMap<Box<str>, ParserId>,
    context_sensitive: HashSet<ParserId>,
    categories: HashMap<Box<str>, DropCategory>,
    resume: ResumeTable,
    config: GrammarConfig,
}

impl Grammar {
    pub(crate) fn finalize(
        arena: Arena,
        names: HashMap<Box<str>, ParserId>,
        redefinitions: Vec<Box<str>>,
        config: GrammarConfig,
    ) -> Result<Grammar, GrammarError> {
        if let Some(name) = redefinitions.into_iter().next() {
            return Err(GrammarError::Redefinition { name });
        }

        check_forwards_resolved(&arena)?;
        check_no_left_recursion(&arena)?;

        let context_sensitive = compute_context_sensitive(&arena);
        let categories = crate::reduce::compute_categories(&arena);

        Ok(Grammar {
            arena,
            names,
            context_sensitive,
            categories,
            resume: ResumeTable::new(),
            config,
        })
    }

    /// Register a resume pattern for mandatory-marker recovery in the
    /// series parser named `series_name`. Must be called before parsing;
    /// `Grammar` does not expose a way to mutate resume points afterward,
    /// to keep the "immutable after finalize" guarantee simple.
    pub fn with_resume_point(mut self, series_name: impl Into<Box<str>>, pattern: regex::Regex) -> Self {
        self.resume.register(series_name, pattern);
        self
    }

    /// Look up a named parser's id.
    pub fn lookup(&self, name: &str) -> Option<ParserId> {
        self.names.get(name).copied()
    }

    /// The grammar's parser graph.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The configuration this grammar was built with.
    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    /// The precomputed context-sensitivity set, for the evaluator's memo
    /// exclusion check.
    pub fn context_sensitive(&self) -> &HashSet<ParserId> {
        &self.context_sensitive
    }

    /// The precomputed parser-name → [`DropCategory`] map, for
    /// [`crate::reduce::postprocess`].
    pub fn categories(&self) -> &HashMap<Box<str>, DropCategory> {
        &self.categories
    }

    /// Classify how [`parsekit_primitives::Node::serialize_xml`] should
    /// render `tag`, per this grammar's configuration.
    pub fn classify_xml_tag(&self, tag: &str) -> parsekit_primitives::XmlTagKind {
        self.config.classify_xml_tag(tag)
    }
}

impl ResumeLookup for Grammar {
    fn is_resume_point(&self, series_name: &str, input: &str, position: usize) -> bool {
        self.resume.is_resume_point(series_name, input, position)
    }
}

fn check_forwards_resolved(arena: &Arena) -> Result<(), GrammarError> {
    for (_, node) in arena.iter() {
        if let ParserKind::Forward(cell) = &node.kind {
            if cell.get().is_none() {
                return Err(GrammarError::UnresolvedForward {
                    name: node.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Detect direct left recursion: a parser reachable from itself by
/// following `direct_children` edges alone. `Forward` nodes have no
/// outgoing edges in this graph (their target is only followed via
/// `Arena::resolve`, not `direct_children`), so any cycle found here is
/// necessarily a non-`Forward` cycle — exactly the case the design
/// rejects, while legitimate cyclic grammars (which always route through a
/// `Forward`) never appear as a cycle in this traversal at all.
fn check_no_left_recursion(arena: &Arena) -> Result<(), GrammarError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: HashMap<ParserId, Mark> = HashMap::new();

    fn visit(
        arena: &Arena,
        id: ParserId,
        marks: &mut HashMap<ParserId, Mark>,
    ) -> Result<(), GrammarError> {
        match marks.get(&id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(GrammarError::LeftRecursion {
                    name: arena.get(id).name.clone(),
                });
            }
            None => {}
        }

        marks.insert(id, Mark::Visiting);
        for child in arena.get(id).kind.direct_children() {
            visit(arena, child, marks)?;
        }
        marks.insert(id, Mark::Done);
        Ok(())
    }

    for (id, _) in arena.iter() {
        visit(arena, id, &mut marks)?;
    }
    Ok(())
}

/// Fixpoint over `direct_children`: a parser is context-sensitive if it is
/// itself `Capture`/`Pop`/`Retrieve`, or if any of its direct children are.
/// Iterates to a fixpoint rather than a single recursive walk since the
/// graph may be cyclic through `Forward`.
fn compute_context_sensitive(arena: &Arena) -> HashSet<ParserId> {
    let mut sensitive: HashSet<ParserId> = arena
        .iter()
        .filter(|(_, node)| {
            matches!(
                node.kind,
                ParserKind::Capture { .. } | ParserKind::Pop(_) | ParserKind::Retrieve(_)
            )
        })
        .map(|(id, _)| id)
        .collect();

    loop {
        let mut changed = false;
        for (id, node) in arena.iter() {
            if sensitive.contains(&id) {
                continue;
            }
            if node
                .kind
                .direct_children()
                .into_iter()
                .any(|child| sensitive.contains(&arena.resolve(child)))
            {
                sensitive.insert(id);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    sensitive
}

/// An opt-in, lazily-initialized `Grammar` holder, for callers whose
/// surrounding tool wants the same singleton ergonomics the reference
/// implementation's process-wide singleton had. Intended usage is to place
/// one inside a `std::thread_local!` static, giving each thread its own
/// lazily-built grammar and its own warmed-up compiled regexes — not a
/// process-wide global, and not required for ordinary use of `Grammar`
/// (which is just a value you build once and share by reference or `Arc`).
pub struct ThreadLocalGrammar<F> {
    init: F,
    cell: OnceCell<Grammar>,
}

impl<F> ThreadLocalGrammar<F>
where
    F: Fn() -> Grammar,
{
    /// Wrap a grammar-construction closure for lazy initialization.
    pub const fn new(init: F) -> Self {
        ThreadLocalGrammar {
            init,
            cell: OnceCell::new(),
        }
    }

    /// Run `f` with the lazily-initialized `Grammar`, building it on first
    /// access.
    pub fn with<R>(&self, f: impl FnOnce(&Grammar) -> R) -> R {
        let grammar = self.cell.get_or_init(|| (self.init)());
        f(grammar)
    }
}
