//! Grammar expressions
//!
//! `Expr` is the EBNF surface used to write rules. It is lowered to plain
//! productions by [`BnfGrammar::lower`](crate::grammar::BnfGrammar::lower).

use crate::grammar::TokenDescriptor;
use compact_str::CompactString;
use std::ops::BitOr;

/// Grammar expression representing the right-hand side of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// Match a single token
    Token(TokenDescriptor),
    /// Reference a rule by name
    Rule(CompactString),
    /// Match nothing
    Empty,
    /// Match all expressions in order
    Seq(Vec<Expr>),
    /// Match any one of the expressions
    Choice(Vec<Expr>),
    /// Match zero or one occurrence
    Opt(Box<Expr>),
    /// Match at least `min` occurrences
    Repeat { expr: Box<Expr>, min: usize },
    /// Match at least `min` items with a separator between consecutive items
    Separated {
        item: Box<Expr>,
        separator: Box<Expr>,
        min: usize,
    },
}

impl Expr {
    /// A keyword or key-character token, chosen by the first character of
    /// `text`.
    #[must_use]
    pub fn literal(text: &str) -> Self {
        Self::Token(TokenDescriptor::literal(text))
    }

    #[must_use]
    pub fn keyword(word: &str) -> Self {
        Self::Token(TokenDescriptor::Keyword(word.into()))
    }

    #[must_use]
    pub fn key_char(text: &str) -> Self {
        Self::Token(TokenDescriptor::KeyChar(text.into()))
    }

    #[must_use]
    pub const fn identifier() -> Self {
        Self::Token(TokenDescriptor::Identifier)
    }

    #[must_use]
    pub const fn integer() -> Self {
        Self::Token(TokenDescriptor::Integer)
    }

    #[must_use]
    pub const fn float() -> Self {
        Self::Token(TokenDescriptor::Float)
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::Token(TokenDescriptor::String)
    }

    #[must_use]
    pub fn rule(name: &str) -> Self {
        Self::Rule(name.into())
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::Empty
    }

    /// A sequence; a single expression is returned unwrapped.
    #[must_use]
    pub fn seq<I>(exprs: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut exprs: Vec<_> = exprs.into_iter().collect();
        if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Self::Seq(exprs)
        }
    }

    /// A choice; a single alternative is returned unwrapped.
    #[must_use]
    pub fn choice<I>(exprs: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut exprs: Vec<_> = exprs.into_iter().collect();
        if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Self::Choice(exprs)
        }
    }

    #[must_use]
    pub fn opt(expr: Self) -> Self {
        Self::Opt(Box::new(expr))
    }

    /// Zero or more occurrences.
    #[must_use]
    pub fn many(expr: Self) -> Self {
        Self::Repeat {
            expr: Box::new(expr),
            min: 0,
        }
    }

    /// One or more occurrences.
    #[must_use]
    pub fn some(expr: Self) -> Self {
        Self::Repeat {
            expr: Box::new(expr),
            min: 1,
        }
    }

    #[must_use]
    pub fn repeat(expr: Self, min: usize) -> Self {
        Self::Repeat {
            expr: Box::new(expr),
            min,
        }
    }

    /// Zero or more `item`s separated by `separator`.
    #[must_use]
    pub fn sep_by(item: Self, separator: Self) -> Self {
        Self::Separated {
            item: Box::new(item),
            separator: Box::new(separator),
            min: 0,
        }
    }

    /// One or more `item`s separated by `separator`.
    #[must_use]
    pub fn sep_by1(item: Self, separator: Self) -> Self {
        Self::Separated {
            item: Box::new(item),
            separator: Box::new(separator),
            min: 1,
        }
    }

    /// Visit every rule name this expression references.
    pub fn for_each_rule<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Self::Rule(name) => f(name),
            Self::Seq(exprs) | Self::Choice(exprs) => {
                for expr in exprs {
                    expr.for_each_rule(f);
                }
            }
            Self::Opt(expr) | Self::Repeat { expr, .. } => expr.for_each_rule(f),
            Self::Separated {
                item, separator, ..
            } => {
                item.for_each_rule(f);
                separator.for_each_rule(f);
            }
            Self::Token(_) | Self::Empty => {}
        }
    }
}

impl BitOr for Expr {
    type Output = Self;

    /// `a | b` builds a choice, flattening nested choices.
    fn bitor(self, rhs: Self) -> Self {
        let mut alternatives = match self {
            Self::Choice(alternatives) => alternatives,
            other => vec![other],
        };
        match rhs {
            Self::Choice(more) => alternatives.extend(more),
            other => alternatives.push(other),
        }
        Self::Choice(alternatives)
    }
}

impl From<TokenDescriptor> for Expr {
    fn from(descriptor: TokenDescriptor) -> Self {
        Self::Token(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_seq_and_choice_unwrap() {
        assert_eq!(Expr::seq([Expr::rule("A")]), Expr::rule("A"));
        assert_eq!(Expr::choice([Expr::identifier()]), Expr::identifier());
        assert_eq!(Expr::seq([]), Expr::Seq(Vec::new()));
    }

    #[test]
    fn bitor_flattens_choices() {
        let expr = Expr::literal("a") | Expr::literal("b") | Expr::literal("c");
        let Expr::Choice(alternatives) = expr else {
            panic!("expected a choice");
        };
        assert_eq!(alternatives.len(), 3);
    }

    #[test]
    fn literal_picks_keyword_or_key_char() {
        assert_eq!(Expr::literal("if"), Expr::keyword("if"));
        assert_eq!(Expr::literal("=="), Expr::key_char("=="));
    }

    #[test]
    fn referenced_rules_are_visited_in_order() {
        let expr = Expr::seq([
            Expr::rule("A"),
            Expr::opt(Expr::rule("B")),
            Expr::sep_by(Expr::rule("C"), Expr::rule("D")),
        ]);
        let mut seen = Vec::new();
        expr.for_each_rule(&mut |name| seen.push(name));
        assert_eq!(seen, vec!["A", "B", "C", "D"]);
    }
}
