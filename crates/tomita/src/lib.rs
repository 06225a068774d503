//! # Tomita
//!
//! A generalized LR parsing engine.
//!
//! ## Overview
//!
//! Tomita turns an EBNF grammar into LR(0) tables and parses token streams
//! with them, following every viable parse at once:
//!
//! - **Grammars**: rules are built from [`Expr`] combinators (sequences,
//!   choices, options, repetitions and separated lists) and lowered to plain
//!   BNF productions with node-building [`Action`]s
//! - **Tables**: the [`ParserConfiguration`] is generated once per grammar
//!   and is immutable afterwards, so it can be shared freely
//! - **Engine**: the [`ParserEngine`] keeps multiple stacks alive where the
//!   tables have conflicts, merges stacks that reach the same state, and
//!   resolves ambiguities with a deterministic preference for the derivation
//!   whose leftmost constituents cover the most input (so a dangling `else`
//!   binds to the innermost `if`)
//! - **Output**: the accepted derivation is handed to a [`NodeBuilder`]; the
//!   default [`TreeBuilder`] produces [`ParseNode`] trees
//!
//! ## Quick Start
//!
//! ```rust
//! use tomita::{Expr, Grammar, ParserConfiguration, ParserEngine};
//!
//! let grammar = Grammar::builder()
//!     .start("Stmt")
//!     .rule(
//!         "Stmt",
//!         Expr::seq([
//!             Expr::literal("if"),
//!             Expr::identifier(),
//!             Expr::literal("then"),
//!             Expr::rule("Stmt"),
//!             Expr::opt(Expr::seq([Expr::literal("else"), Expr::rule("Stmt")])),
//!         ]),
//!     )
//!     .rule("Stmt", Expr::identifier())
//!     .build()?;
//! let configuration = ParserConfiguration::build(&grammar)?;
//! let engine = ParserEngine::new(&configuration);
//!
//! let output = engine.parse_str("Stmt", "if a then if b then x else y")?;
//! assert_eq!(
//!     output.root.to_string(),
//!     "(Stmt if a then (Stmt if b then (Stmt x) {else (Stmt y)}) _)"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `diagnostics`: derive [`miette::Diagnostic`] for the error types
//! - `serialize`: serde support for grammars, tokens and generated tables

pub mod engine;
pub mod error;
pub mod grammar;
pub mod index;
pub mod lexer;
pub mod table;
pub mod tree;

pub use engine::{EngineConfig, ParseOutput, ParseStats, ParserEngine};
pub use error::{GrammarError, LexError, ParseError};
pub use grammar::{BnfGrammar, Expr, Grammar, GrammarBuilder, TokenDescriptor};
pub use lexer::{Position, Scanner, Token, TokenStream, VecTokenStream};
pub use table::ParserConfiguration;
pub use tree::{Action, NodeBuilder, ParseNode, TreeBuilder};
