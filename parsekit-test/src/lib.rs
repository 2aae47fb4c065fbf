/*!
Example grammars exercised by this crate's integration tests
(`tests/`): a small arithmetic expression grammar, an HTML-style
tag-matching grammar (`Capture`/`Pop`), and a nested-brace grammar —
covering, between them, every combinator `parsekit` offers.
*/

pub mod braces;
pub mod expression;
pub mod tags;
