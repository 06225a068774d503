//! # Error Types
//!
//! Errors raised while building grammars and tables, while scanning text, and
//! while parsing.
//!
//! ## Overview
//!
//! - [`GrammarError`]: a grammar is malformed; raised before any table is
//!   generated, so the generator only ever sees well-formed input
//! - [`LexError`]: the [`Scanner`](crate::lexer::Scanner) could not tokenize
//!   its input
//! - [`ParseError`]: the token stream is not in the language, an ambiguity
//!   was found in strict mode, or an engine invariant broke
//!
//! ## Usage
//!
//! ```rust
//! use tomita::ParserEngine;
//! use tomita::error::ParseError;
//! use tomita::grammar::{Expr, Grammar};
//! use tomita::table::ParserConfiguration;
//!
//! let grammar = Grammar::builder()
//!     .start("Pair")
//!     .rule("Pair", Expr::seq([Expr::literal("("), Expr::literal(")")]))
//!     .build()?;
//! let configuration = ParserConfiguration::build(&grammar)?;
//! let engine = ParserEngine::new(&configuration);
//!
//! match engine.parse_str("Pair", "(") {
//!     Err(error @ ParseError::UnexpectedEof { .. }) => {
//!         assert_eq!(error.format_expected(), "\")\"");
//!     }
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Diagnostics Support
//!
//! With the `diagnostics` feature the error types derive
//! [`miette::Diagnostic`], with the failing [`Position`] as label.

use crate::grammar::{ProductionId, TokenDescriptor};
use crate::lexer::Position;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// A grammar that cannot be turned into a parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("grammar has no start rule")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::no_start)))]
    NoStart,

    #[error("start rule `{0}` is not defined")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::unknown_start)))]
    UnknownStart(String),

    #[error("start rule `{0}` is declared twice")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_start)))]
    DuplicateStart(String),

    #[error("rule `{rule}` references undefined rule `{referenced}`")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(grammar::undefined_rule), help("define `{referenced}` or fix the reference"))
    )]
    UndefinedRule { rule: String, referenced: String },

    #[error("rule `{0}` contains a choice without alternatives")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty_rule)))]
    EmptyRule(String),

    #[error("nonterminal `{0}` has no productions")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::no_productions)))]
    NonterminalWithoutProductions(String),

    #[error("production {production} references a symbol outside the grammar")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::dangling_reference)))]
    DanglingReference { production: ProductionId },

    #[error("`{0}` is a reserved name")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(grammar::reserved_name), help("rule names may not contain `@` or `#`"))
    )]
    ReservedName(String),

    #[error("rule `{0}` contains an empty literal")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty_literal)))]
    EmptyLiteral(String),
}

/// Text that could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum LexError {
    #[error("unexpected character '{ch}' at {position}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(lexer::unexpected_char)))]
    UnexpectedChar {
        ch: char,
        #[cfg_attr(feature = "diagnostics", label("not part of any token"))]
        position: Position,
    },

    #[error("unterminated string literal starting at {position}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(lexer::unterminated_string)))]
    UnterminatedString {
        #[cfg_attr(feature = "diagnostics", label("string starts here"))]
        position: Position,
    },

    #[error("`{word}` at {position} is not a keyword of this grammar")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(lexer::unknown_word)))]
    UnknownWord {
        word: String,
        #[cfg_attr(feature = "diagnostics", label("unknown word"))]
        position: Position,
    },
}

impl LexError {
    #[must_use]
    pub const fn position(&self) -> Position {
        match self {
            Self::UnexpectedChar { position, .. }
            | Self::UnterminatedString { position }
            | Self::UnknownWord { position, .. } => *position,
        }
    }
}

/// A failed parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    /// No live stack can shift the current token.
    #[error("unexpected {found} at {position}, expected {}", format_expected_list(.expected))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::unexpected_token)))]
    UnexpectedToken {
        found: String,
        #[cfg_attr(feature = "diagnostics", label("unexpected token"))]
        position: Position,
        expected: Vec<TokenDescriptor>,
    },

    /// Input ended while every stack still needed more tokens.
    #[error("unexpected end of input at {position}, expected {}", format_expected_list(.expected))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::unexpected_eof)))]
    UnexpectedEof {
        #[cfg_attr(feature = "diagnostics", label("input ends here"))]
        position: Position,
        expected: Vec<TokenDescriptor>,
    },

    /// Two derivations of the same fragment, reported in strict mode.
    #[error("ambiguous input before {position}: {}", .alternatives.join(" vs "))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::ambiguous)))]
    Ambiguity {
        #[cfg_attr(feature = "diagnostics", label("ambiguous here"))]
        position: Position,
        alternatives: Vec<String>,
    },

    #[error("`{0}` is not a start nonterminal of this configuration")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::unknown_start)))]
    UnknownStart(String),

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Lex(#[from] LexError),

    /// An engine invariant was violated.
    #[error("internal parser error: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::internal)))]
    Internal(String),
}

impl ParseError {
    /// Where the error was detected, when it has a location.
    #[must_use]
    pub const fn position(&self) -> Option<Position> {
        match self {
            Self::UnexpectedToken { position, .. }
            | Self::UnexpectedEof { position, .. }
            | Self::Ambiguity { position, .. } => Some(*position),
            Self::Lex(error) => Some(error.position()),
            Self::UnknownStart(_) | Self::Internal(_) => None,
        }
    }

    /// Tokens that would have been accepted at the error position.
    #[must_use]
    pub fn expected(&self) -> &[TokenDescriptor] {
        match self {
            Self::UnexpectedToken { expected, .. } | Self::UnexpectedEof { expected, .. } => {
                expected
            }
            _ => &[],
        }
    }

    /// Format expected tokens as a human-readable string
    #[must_use]
    pub fn format_expected(&self) -> String {
        format_expected_list(self.expected())
    }
}

/// Format a list of expected tokens as `a, b, or c`.
#[must_use]
pub fn format_expected_list(expected: &[TokenDescriptor]) -> String {
    match expected {
        [] => "nothing".to_string(),
        [only] => only.to_string(),
        [first, second] => format!("{first} or {second}"),
        [init @ .., last] => {
            let mut result = init
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            result.push_str(", or ");
            result.push_str(&last.to_string());
            result
        }
    }
}

#[cfg(feature = "diagnostics")]
impl From<Position> for miette::SourceSpan {
    fn from(position: Position) -> Self {
        (position.offset, 0).into()
    }
}
