/*!
Low-level, grammar-agnostic building blocks for [`parsekit`](https://docs.rs/parsekit):
the parser graph arena, the packrat memo cache, capture stacks, the
concrete/abstract syntax tree type, and the evaluator that ties them
together. Unless you're building a grammar container of your own, you
probably want the `parsekit` crate instead of this one directly.
*/

#![deny(missing_docs)]

pub mod arena;
pub mod capture;
pub mod error;
pub mod memo;
pub mod node;
pub mod parser;
pub mod primitive;
mod series;

pub use arena::{Arena, ParserId, ParserKind, ParserNode, SeriesElement};
pub use capture::{CaptureSnapshot, CaptureStacks, NoResume, ResumeLookup};
pub use error::{ErrorRecord, ErrorTemplate, Severity};
pub use memo::{CacheEntry, MemoCache};
pub use node::{Content, Node, Walk, XmlTagKind};
pub use parser::{eval, EvalContext, EvalResult};
pub use state::ParseState;

mod state;
