//! # Lexer Module
//!
//! Tokens, source positions, and the pull-based [`TokenStream`] the parse
//! engine reads from.
//!
//! ## Overview
//!
//! The engine never looks at characters. It pulls [`Token`]s one at a time
//! and only inspects their interned kind. Two streams are provided:
//!
//! - [`VecTokenStream`]: replays tokens built by the caller
//! - [`Scanner`]: tokenizes text against a configuration's token table
//!   (keywords, key characters, identifiers, numbers, strings)
//!
//! ## Usage
//!
//! ```rust
//! use tomita::grammar::{Expr, Grammar};
//! use tomita::lexer::{Scanner, TokenStream};
//! use tomita::table::ParserConfiguration;
//!
//! let grammar = Grammar::builder()
//!     .start("Assign")
//!     .rule("Assign", Expr::seq([Expr::identifier(), Expr::literal("="), Expr::integer()]))
//!     .build()?;
//! let configuration = ParserConfiguration::build(&grammar)?;
//!
//! let tokens = Scanner::new("answer = 42", configuration.tokens()).tokenize()?;
//! assert_eq!(tokens.len(), 4); // including end-of-file
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{Position, Token};

use crate::error::LexError;

/// Pull-based source of tokens.
///
/// After the end of input the stream keeps returning end-of-file tokens.
pub trait TokenStream {
    /// Advance to and return the next token.
    ///
    /// # Errors
    ///
    /// Returns a [`LexError`] if the input cannot be tokenized.
    fn next_token(&mut self) -> Result<Token, LexError>;
}

/// A [`TokenStream`] over tokens that were produced up front.
///
/// An end-of-file token is synthesized after the last token unless the
/// input already ends with one.
#[derive(Debug, Clone)]
pub struct VecTokenStream {
    tokens: std::vec::IntoIter<Token>,
    eof: Token,
}

impl VecTokenStream {
    #[must_use]
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let eof = match tokens.pop() {
            Some(last) if last.is_eof() => last,
            Some(last) => {
                let eof = Token::eof(last.end());
                tokens.push(last);
                eof
            }
            None => Token::eof(Position::start()),
        };
        Self {
            tokens: tokens.into_iter(),
            eof,
        }
    }
}

impl TokenStream for VecTokenStream {
    fn next_token(&mut self) -> Result<Token, LexError> {
        Ok(self.tokens.next().unwrap_or_else(|| self.eof.clone()))
    }
}

impl<S: TokenStream + ?Sized> TokenStream for &mut S {
    fn next_token(&mut self) -> Result<Token, LexError> {
        (**self).next_token()
    }
}
