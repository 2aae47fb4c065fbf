/*!
Optional per-call parse tracing, built on top of the `tracing` crate rather
than a bespoke log format: `parsekit_primitives::eval` already opens a span
and emits an outcome event for every parser invocation whenever
[`crate::config::GrammarConfig::history_tracking`] is set, so a host
application that already routes its own logs through `tracing` gets parse
traces for free just by installing its usual subscriber.

This module additionally provides [`HistoryRecorder`], a minimal in-memory
`tracing::Subscriber` for callers who just want a serializable log suitable
for post-mortem inspection, without pulling in the `tracing-subscriber`
crate or writing their own. [`record`] installs one for the duration of a
closure and hands back the collected [`HistoryEvent`]s.

Tracing must never alter parse results: every span/event call in the
evaluator is gated behind the same `history_tracking` check already used to
skip the memo/capture bookkeeping it would otherwise disturb, so disabling
tracking (at the grammar level) or simply not installing a subscriber (at the
process level) leaves parsing bit-for-bit identical.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Metadata, Subscriber};

/// The outcome of one traced parser invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The parser matched.
    Matched,
    /// The parser did not match.
    NoMatch,
}

/// One entry in a collected parse trace: a single call into
/// `parsekit_primitives::eval`, with its nesting depth (how many enclosing
/// parser calls were in progress), the position it was called at, and what
/// it consumed on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
    /// How many parser invocations enclose this one.
    pub depth: usize,
    /// The name of the parser invoked.
    pub parser_name: Box<str>,
    /// The byte offset this invocation was attempted at.
    pub position: usize,
    /// Whether it matched.
    pub outcome: Outcome,
    /// The slice of input consumed, if it matched (empty otherwise, or for a
    /// zero-width match).
    pub consumed: Box<str>,
}

/// A `tracing::Subscriber` that collects [`HistoryEvent`]s emitted by
/// `parsekit_primitives::eval` into an in-memory log, keyed on nothing more
/// than "what span am I currently inside" — depth is simply the length of
/// the per-thread span stack, since a parse is single-threaded cooperative
/// recursion and spans nest exactly the way parser calls do.
#[derive(Clone)]
pub struct HistoryRecorder {
    inner: Arc<Inner>,
}

struct Inner {
    next_id: AtomicU64,
    events: Mutex<Vec<HistoryEvent>>,
    /// Maps a span's id to its index in `events`, so that the outcome event
    /// fired just before a span closes can be matched back to the entry its
    /// own span created — a child span's entries and events are always
    /// pushed and patched in between, so "the last pushed entry" is not
    /// reliably "the currently-open span"'s entry.
    indices: Mutex<HashMap<u64, usize>>,
}

thread_local! {
    static SPAN_STACK: RefCell<Vec<Id>> = RefCell::new(Vec::new());
}

impl HistoryRecorder {
    /// A fresh recorder with no events collected yet.
    pub fn new() -> Self {
        HistoryRecorder {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                events: Mutex::new(Vec::new()),
                indices: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Take every event collected so far, in the order they were emitted.
    pub fn take_events(&self) -> Vec<HistoryEvent> {
        std::mem::take(&mut self.inner.events.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Default for HistoryRecorder {
    fn default() -> Self {
        HistoryRecorder::new()
    }
}

/// Extracts the `parser`/`position` fields a span was opened with, or the
/// `outcome`/`consumed` fields an event was emitted with — both just format
/// every field to a string, since this collector doesn't need typed values.
#[derive(Default)]
struct FieldCollector {
    values: Vec<(&'static str, String)>,
}

impl FieldCollector {
    fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let mut rendered = String::new();
        let _ = write!(rendered, "{value:?}");
        self.values.push((field.name(), rendered));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.values.push((field.name(), value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.values.push((field.name(), value.to_string()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.values.push((field.name(), value.to_string()));
    }
}

impl Subscriber for HistoryRecorder {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, attrs: &Attributes<'_>) -> Id {
        let mut fields = FieldCollector::default();
        attrs.record(&mut fields);

        let parser_name = fields.get("parser").unwrap_or_default().to_string();
        let position: usize = fields.get("position").and_then(|v| v.parse().ok()).unwrap_or(0);

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let mut events = self.inner.events.lock().unwrap_or_else(|e| e.into_inner());
        let index = events.len();
        events.push(HistoryEvent {
            depth: SPAN_STACK.with(|stack| stack.borrow().len()),
            parser_name: parser_name.into_boxed_str(),
            position,
            // Placeholder outcome, overwritten once the matching event
            // arrives via `event`; a span that is entered but never
            // completes (a panic mid-parse) keeps this as-is.
            outcome: Outcome::NoMatch,
            consumed: "".into(),
        });
        drop(events);

        self.inner
            .indices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, index);

        Id::from_u64(id)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let Some(outcome) = fields.get("outcome") else {
            return; // not one of ours
        };
        let outcome = match outcome {
            "match" => Outcome::Matched,
            _ => Outcome::NoMatch,
        };
        let consumed = fields.get("consumed").unwrap_or_default().to_string();

        let Some(current) = SPAN_STACK.with(|stack| stack.borrow().last().map(Id::clone)) else {
            return; // event fired outside any span; nothing to patch
        };

        let index = self
            .inner
            .indices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&current.into_u64())
            .copied();

        if let Some(index) = index {
            let mut events = self.inner.events.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = events.get_mut(index) {
                entry.outcome = outcome;
                entry.consumed = consumed.into_boxed_str();
            }
        }
    }

    fn enter(&self, span: &Id) {
        SPAN_STACK.with(|stack| stack.borrow_mut().push(span.clone()));
    }

    fn exit(&self, _span: &Id) {
        SPAN_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Run `f` with a [`HistoryRecorder`] installed as the default `tracing`
/// subscriber for its duration, returning both `f`'s result and the
/// collected trace. If `f` doesn't actually run a parse with
/// `history_tracking` enabled, the returned log is simply empty.
pub fn record<R>(f: impl FnOnce() -> R) -> (R, Vec<HistoryEvent>) {
    let recorder = HistoryRecorder::new();
    let dispatch = tracing::Dispatch::new(recorder.clone());
    let result = tracing::subscriber::with_default(dispatch, f);
    (result, recorder.take_events())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_nested_spans_with_increasing_depth() {
        let (_, events) = record(|| {
            let outer = tracing::span!(tracing::Level::TRACE, "parsekit::history::call", parser = "outer", position = 0usize)
                .entered();
            tracing::event!(tracing::Level::TRACE, outcome = "match", consumed = "ab");
            {
                let _inner = tracing::span!(tracing::Level::TRACE, "parsekit::history::call", parser = "inner", position = 0usize)
                    .entered();
                tracing::event!(tracing::Level::TRACE, outcome = "match", consumed = "a");
            }
            drop(outer);
        });

        assert_eq!(events.len(), 2);
        assert_eq!(&*events[0].parser_name, "outer");
        assert_eq!(events[0].depth, 0);
        assert_eq!(&*events[0].consumed, "ab");
        assert_eq!(&*events[1].parser_name, "inner");
        assert_eq!(events[1].depth, 1);
        assert_eq!(&*events[1].consumed, "a");
    }
}
