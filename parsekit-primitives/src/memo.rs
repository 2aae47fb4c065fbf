/*!
Packrat memoization: every `(parser, position)` pair is evaluated at most
once per parse, guaranteeing the linear-time bound on the cost of
backtracking that makes recursive-descent parsing with unbounded lookahead
tractable.

Parsers that touch a [`crate::capture::CaptureStacks`] (`Capture`, `Pop`,
`Retrieve`, and anything that contains one) are excluded from the cache: their
result depends on capture-stack state in addition to `(parser, position)`,
so memoizing them would return stale results the first time the same
position is reached with different stack contents. `Grammar::finalize`
precomputes this exclusion set once by a reachability walk over the graph,
and it is threaded down into the evaluator rather than re-derived per call.
*/

use std::collections::HashMap;

use crate::arena::ParserId;
use crate::node::Node;

/// The outcome of a previously-evaluated `(parser, position)` pair.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    /// The parser matched, consuming up to `end_position`, optionally
    /// producing a node. `None` distinguishes a zero-width, node-free match
    /// (e.g. a successful `Drop` or `Lookahead`) from a node that merely
    /// holds empty text.
    Success {
        end_position: usize,
        node: Option<Node>,
    },
    /// The parser failed to match at this position.
    Failure,
}

/// The packrat memo table.
#[derive(Debug, Default)]
pub struct MemoCache {
    entries: HashMap<(ParserId, usize), CacheEntry>,
}

impl MemoCache {
    /// An empty cache.
    pub fn new() -> Self {
        MemoCache::default()
    }

    /// Look up a previously-recorded result, if any.
    pub fn get(&self, parser: ParserId, position: usize) -> Option<&CacheEntry> {
        self.entries.get(&(parser, position))
    }

    /// Record a result for later lookups at the same `(parser, position)`.
    pub fn insert(&mut self, parser: ParserId, position: usize, entry: CacheEntry) {
        self.entries.insert((parser, position), entry);
    }

    /// The number of entries currently cached, exposed for diagnostics and
    /// tests asserting on memoization behavior.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_until_inserted() {
        let cache = MemoCache::new();
        assert!(cache.get(ParserId(0), 0).is_none());
    }

    #[test]
    fn insert_then_hit() {
        let mut cache = MemoCache::new();
        let id = ParserId(3);
        cache.insert(id, 7, CacheEntry::Failure);
        assert!(matches!(cache.get(id, 7), Some(CacheEntry::Failure)));
        assert!(cache.get(id, 8).is_none());
    }
}
