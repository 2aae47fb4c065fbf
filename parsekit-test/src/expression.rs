/*!
A small left-recursion-free arithmetic expression grammar:

```text
sum    = product  ("+" product)*
product = atom    ("*" atom)*
atom   = number | "(" §sum ")"
```

`atom`'s parenthesized case recurses back into `sum` through a `Forward`
reference, the only way this arena permits a cycle — `product` and `sum`
themselves are plain, non-recursive series, so no rule ever calls itself at
the same input position without first crossing either a literal (consuming
input) or the `Forward` indirection.
*/

use parsekit::builder::{element, mandatory, GrammarBuilder};
use parsekit::config::{GrammarConfig, LiteralWhitespace};
use parsekit::grammar::Grammar;
use regex::Regex;

/// Build the expression grammar, rooted at `"sum"`.
pub fn grammar() -> Grammar {
    let mut config = GrammarConfig::new();
    config.literal_whitespace = LiteralWhitespace::Both;
    let mut builder = GrammarBuilder::new(config);

    let ws = builder.whitespace("ws", Regex::new(r"\A[ \t\r\n]*").unwrap());
    let number = builder.regexp("number", Regex::new(r"\A[0-9]+").unwrap());
    let lparen = builder.lit("lparen", "(", ws);
    let rparen = builder.lit("rparen", ")", ws);
    let plus = builder.lit("plus", "+", ws);
    let star = builder.lit("star", "*", ws);

    let sum_forward = builder.forward("sum");

    let paren = builder.series(
        "paren",
        vec![
            element(lparen, false),
            mandatory(sum_forward),
            mandatory(rparen),
        ],
        Some("expected closing parenthesis, found {1}"),
    );
    let atom = builder.alternative("atom", vec![number, paren]);

    let star_atom = builder.series("star_atom", vec![element(star, false), mandatory(atom)], None);
    let star_atom_rep = builder.zero_or_more("star_atom_rep", star_atom);
    let product = builder.series(
        "product",
        vec![element(atom, false), element(star_atom_rep, false)],
        None,
    );

    let plus_product = builder.series(
        "plus_product",
        vec![element(plus, false), mandatory(product)],
        None,
    );
    let plus_product_rep = builder.zero_or_more("plus_product_rep", plus_product);
    let sum = builder.series(
        "sum",
        vec![element(product, false), element(plus_product_rep, false)],
        None,
    );

    builder.set_forward(sum_forward, sum);
    builder.define("sum", sum);
    builder.define("root", sum);

    builder.finalize().expect("expression grammar is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_asserts::assert_matches;

    #[test]
    fn parses_flat_sum() {
        let grammar = grammar();
        let outcome = parsekit::parse(&grammar, "1 + 2 + 3", None, true).unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.tree.unwrap().content(), "1+2+3");
    }

    #[test]
    fn honors_parenthesized_precedence() {
        let grammar = grammar();
        let outcome = parsekit::parse(&grammar, "2 * (3 + 4)", None, true).unwrap();
        assert!(outcome.is_success());
        let tree = outcome.tree.unwrap();
        assert!(tree.find("paren").is_some());
    }

    #[test]
    fn unterminated_parenthesis_is_recorded_as_an_error() {
        let grammar = grammar();
        let outcome = parsekit::parse(&grammar, "(1 + 2", None, true).unwrap();
        assert_matches!(outcome.errors.as_slice(), [error] => {
            assert!(error.message.contains("closing parenthesis"));
        });
    }
}
