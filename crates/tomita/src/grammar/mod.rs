//! # Grammar Module
//!
//! Grammar definition, validation and lowering.
//!
//! ## Overview
//!
//! Grammars are written as EBNF rules over [`Expr`] and collected by
//! [`GrammarBuilder`]. Before table generation they are lowered into a
//! [`BnfGrammar`]: a flat list of productions over dense nonterminal and
//! token ids, each production carrying the [`Action`](crate::tree::Action)
//! that builds its output node.
//!
//! ## Usage
//!
//! ```rust
//! use tomita::grammar::{BnfGrammar, Expr, GrammarBuilder};
//!
//! let grammar = GrammarBuilder::new()
//!     .start("Expr")
//!     .rule("Expr", Expr::seq([Expr::rule("Expr"), Expr::literal("+"), Expr::rule("Term")]))
//!     .rule("Expr", Expr::rule("Term"))
//!     .rule("Term", Expr::integer() | Expr::identifier())
//!     .build()?;
//!
//! let bnf = BnfGrammar::lower(&grammar)?;
//! assert_eq!(bnf.productions().len(), 4);
//! # Ok::<(), tomita::error::GrammarError>(())
//! ```
//!
//! ## Expression Types
//!
//! - **Primitives**: `Token`, `Rule`, `Empty`
//! - **Combinators**: `Seq`, `Choice`, `Opt`
//! - **Lists**: `Repeat`, `Separated`

pub mod bnf;
pub mod builder;
pub mod expr;
pub mod lower;
pub mod token;
pub mod validate;

pub use bnf::*;
pub use builder::*;
pub use expr::*;
pub use token::*;
pub use validate::*;
