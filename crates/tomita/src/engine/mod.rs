//! # Parse Engine
//!
//! A generalized LR parser over a [`ParserConfiguration`].
//!
//! ## Overview
//!
//! The engine keeps every stack that is still consistent with the tokens read
//! so far. For each token position it
//!
//! 1. applies every reduction available on every live stack, including the
//!    stacks those reductions create, until no new stack appears
//! 2. remembers the stack whose top state is final, if any; it completes the
//!    parse when the next token is end-of-file
//! 3. shifts the token on every live stack that has a transition for it and
//!    drops the rest
//!
//! Two stacks that reach the same sequence of states are the same parse
//! state reached two ways. The engine keeps one of them: the one whose
//! derivation of the differing part covers more tokens in its leftmost
//! constituents (see [`AmbiguityNode::compare`]), or fails with
//! [`ParseError::Ambiguity`] in [strict](EngineConfig::strict) mode.
//! Reductions that would recreate a stack they were derived from, or that
//! revisit a state among the elements reduced since the last shift, are
//! dropped, so empty and mutually recursive rules cannot loop.
//!
//! Output nodes are built once, for the accepted derivation only, by a
//! [`NodeBuilder`].
//!
//! ## Usage
//!
//! ```rust
//! use tomita::ParserEngine;
//! use tomita::grammar::{Expr, Grammar};
//! use tomita::table::ParserConfiguration;
//!
//! let grammar = Grammar::builder()
//!     .start("Sum")
//!     .rule("Sum", Expr::seq([Expr::rule("Sum"), Expr::literal("+"), Expr::rule("Sum")]))
//!     .rule("Sum", Expr::integer())
//!     .build()?;
//! let configuration = ParserConfiguration::build(&grammar)?;
//! let engine = ParserEngine::new(&configuration);
//!
//! let output = engine.parse_str("Sum", "1 + 2 + 3")?;
//! assert_eq!(output.root.to_string(), "(Sum (Sum (Sum 1) + (Sum 2)) + (Sum 3))");
//! assert_eq!(output.stats.tokens_consumed, 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ambiguity;
mod parser;
pub mod stack;

pub use ambiguity::AmbiguityNode;

use crate::error::ParseError;
use crate::lexer::{Position, Scanner, TokenStream};
use crate::table::ParserConfiguration;
use crate::tree::{NodeBuilder, ParseNode, TreeBuilder};
use parser::Run;
use std::time::Duration;

/// Engine options.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Fail with [`ParseError::Ambiguity`] instead of resolving ambiguities
    pub strict_ambiguity: bool,
}

impl EngineConfig {
    /// Configuration that reports every ambiguity as an error.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            strict_ambiguity: true,
        }
    }
}

/// Counters collected during one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Tokens shifted, end-of-file excluded
    pub tokens_consumed: usize,
    /// Position of the end-of-file token
    pub end_position: Position,
    /// Most stacks that shifted the same token
    pub peak_stacks: usize,
    pub ambiguities_resolved: usize,
    pub reductions: usize,
    pub parse_time: Duration,
}

/// Result of a successful parse.
#[derive(Debug, Clone)]
pub struct ParseOutput<N> {
    pub root: N,
    pub stats: ParseStats,
}

/// Parser over shared, immutable tables.
///
/// Creating an engine is free; each [`parse`](Self::parse) call owns all of
/// its working state, so one configuration can serve any number of engines
/// and threads.
#[derive(Debug, Clone)]
pub struct ParserEngine<'c> {
    configuration: &'c ParserConfiguration,
    config: EngineConfig,
}

impl<'c> ParserEngine<'c> {
    #[must_use]
    pub fn new(configuration: &'c ParserConfiguration) -> Self {
        Self::with_config(configuration, EngineConfig::default())
    }

    #[must_use]
    pub const fn with_config(configuration: &'c ParserConfiguration, config: EngineConfig) -> Self {
        Self {
            configuration,
            config,
        }
    }

    #[must_use]
    pub const fn configuration(&self) -> &'c ParserConfiguration {
        self.configuration
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse `tokens` as the start nonterminal `start`, building output
    /// nodes with `builder`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::UnknownStart`] if `start` is not a start nonterminal
    /// - [`ParseError::UnexpectedToken`] / [`ParseError::UnexpectedEof`] if
    ///   the tokens are not in the language
    /// - [`ParseError::Ambiguity`] in strict mode
    /// - [`ParseError::Lex`] if the stream fails
    pub fn parse<B, S>(
        &self,
        start: &str,
        tokens: &mut S,
        builder: &B,
    ) -> Result<ParseOutput<B::Node>, ParseError>
    where
        B: NodeBuilder,
        S: TokenStream + ?Sized,
    {
        let state = self
            .configuration
            .start_state(start)
            .ok_or_else(|| ParseError::UnknownStart(start.to_string()))?;
        Run::new(self.configuration, &self.config).parse(state, tokens, builder)
    }

    /// [`parse`](Self::parse) with the default [`TreeBuilder`].
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_tree<S>(
        &self,
        start: &str,
        tokens: &mut S,
    ) -> Result<ParseOutput<ParseNode>, ParseError>
    where
        S: TokenStream + ?Sized,
    {
        self.parse(start, tokens, &TreeBuilder)
    }

    /// Scan and parse `text` into a [`ParseNode`] tree.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_str(&self, start: &str, text: &str) -> Result<ParseOutput<ParseNode>, ParseError> {
        let mut scanner = Scanner::new(text, self.configuration.tokens());
        self.parse_tree(start, &mut scanner)
    }
}
