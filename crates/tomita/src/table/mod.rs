//! # Parser Tables
//!
//! The LR(0) automaton the engine runs on.
//!
//! ## Overview
//!
//! [`ParserConfigurator`] turns a [`BnfGrammar`] into a [`ParserConfiguration`]:
//!
//! 1. an extended production `@Start : Start` is added for every start
//!    nonterminal; its closure seeds the start state
//! 2. closures are computed from per-nonterminal direct and indirect item
//!    caches
//! 3. states are discovered breadth first by partitioning each state's
//!    items by the element after the dot; item sets that were seen before
//!    reuse their state
//!
//! The finished configuration is immutable and can be shared between any
//! number of parses.
//!
//! ## Usage
//!
//! ```rust
//! use tomita::grammar::{Expr, Grammar};
//! use tomita::table::ParserConfiguration;
//!
//! let grammar = Grammar::builder()
//!     .start("Sum")
//!     .rule("Sum", Expr::seq([Expr::rule("Sum"), Expr::literal("+"), Expr::integer()]))
//!     .rule("Sum", Expr::integer())
//!     .build()?;
//! let configuration = ParserConfiguration::build(&grammar)?;
//!
//! let start = configuration.start_state("Sum").expect("declared start");
//! assert!(!configuration.state(start).shifts().is_empty());
//! println!("{configuration}");
//! # Ok::<(), tomita::error::GrammarError>(())
//! ```

pub mod configurator;
pub mod item;

pub use configurator::ParserConfigurator;
pub use item::{ItemId, ParserItem, ParserItemSet};

use crate::error::GrammarError;
use crate::grammar::{BnfGrammar, BnfProduction, Grammar, NonterminalId, ProductionId, TokenId, TokenTable};
use crate::index::dense_id;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt;

dense_id! {
    /// Dense id of a [`ParserState`].
    pub struct StateId => "s";
}

/// Transition on a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Shift {
    pub token: TokenId,
    pub target: StateId,
}

/// Transition on a nonterminal, taken after a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Goto {
    pub nonterminal: NonterminalId,
    pub target: StateId,
}

/// A start nonterminal and the state parsing it begins in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct StartState {
    pub name: CompactString,
    /// The extended `@Start` nonterminal
    pub nonterminal: NonterminalId,
    pub state: StateId,
}

/// A state of the automaton.
///
/// Shifts are sorted by token and gotos by nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserState {
    id: StateId,
    items: ParserItemSet,
    reduces: SmallVec<[ProductionId; 2]>,
    shifts: Vec<Shift>,
    gotos: Vec<Goto>,
    is_final: bool,
}

impl ParserState {
    #[must_use]
    pub const fn id(&self) -> StateId {
        self.id
    }

    /// Target of the shift on `token`.
    #[must_use]
    pub fn shift(&self, token: TokenId) -> Option<StateId> {
        self.shifts
            .binary_search_by_key(&token, |shift| shift.token)
            .ok()
            .map(|index| self.shifts[index].target)
    }

    /// Target of the goto on `nonterminal`.
    #[must_use]
    pub fn goto(&self, nonterminal: NonterminalId) -> Option<StateId> {
        self.gotos
            .binary_search_by_key(&nonterminal, |goto| goto.nonterminal)
            .ok()
            .map(|index| self.gotos[index].target)
    }

    #[must_use]
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    #[must_use]
    pub fn gotos(&self) -> &[Goto] {
        &self.gotos
    }

    /// Productions whose items are complete in this state.
    #[must_use]
    pub fn reduces(&self) -> &[ProductionId] {
        &self.reduces
    }

    #[must_use]
    pub const fn items(&self) -> &ParserItemSet {
        &self.items
    }

    /// True when an extended start production can be reduced here, i.e.
    /// a complete start nonterminal sits on top of the stack.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.is_final
    }
}

/// The generated tables for one grammar.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserConfiguration {
    grammar: BnfGrammar,
    items: Vec<ParserItem>,
    states: Vec<ParserState>,
    starts: SmallVec<[StartState; 2]>,
}

impl ParserConfiguration {
    /// Lower, validate and generate tables for `grammar`.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] if the grammar is malformed.
    pub fn build(grammar: &Grammar) -> Result<Self, GrammarError> {
        let bnf = BnfGrammar::lower(grammar)?;
        Ok(ParserConfigurator::new(bnf)?.configure())
    }

    /// Start state for the start nonterminal called `name`.
    #[must_use]
    pub fn start_state(&self, name: &str) -> Option<StateId> {
        self.starts
            .iter()
            .find(|start| start.name == name)
            .map(|start| start.state)
    }

    pub fn start_names(&self) -> impl Iterator<Item = &str> {
        self.starts.iter().map(|start| start.name.as_str())
    }

    #[must_use]
    pub fn starts(&self) -> &[StartState] {
        &self.starts
    }

    /// Token descriptors used by the grammar.
    #[must_use]
    pub const fn tokens(&self) -> &TokenTable {
        self.grammar.tokens()
    }

    #[must_use]
    pub fn states(&self) -> &[ParserState] {
        &self.states
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this configuration.
    #[must_use]
    pub fn state(&self, id: StateId) -> &ParserState {
        &self.states[id.index()]
    }

    #[must_use]
    pub fn items(&self) -> &[ParserItem] {
        &self.items
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this configuration.
    #[must_use]
    pub fn item(&self, id: ItemId) -> &ParserItem {
        &self.items[id.index()]
    }

    /// The BNF grammar, including the extended start productions.
    #[must_use]
    pub const fn grammar(&self) -> &BnfGrammar {
        &self.grammar
    }

    #[must_use]
    pub fn production(&self, id: ProductionId) -> &BnfProduction {
        self.grammar.production(id)
    }
}

/// Dump of the automaton: items, shifts, gotos and reduces per state.
impl fmt::Display for ParserConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for start in &self.starts {
            writeln!(f, "start {} -> {}", start.name, start.state)?;
        }
        for state in &self.states {
            writeln!(f)?;
            write!(f, "state {}", state.id)?;
            if state.is_final {
                f.write_str(" (final)")?;
            }
            writeln!(f)?;
            for item in state.items.iter() {
                let item = self.item(item);
                f.write_str("  ")?;
                self.grammar
                    .write_production(f, item.production, Some(item.position))?;
                writeln!(f)?;
            }
            for shift in &state.shifts {
                writeln!(
                    f,
                    "  shift {} -> {}",
                    self.tokens().descriptor(shift.token),
                    shift.target
                )?;
            }
            for goto in &state.gotos {
                writeln!(
                    f,
                    "  goto {} -> {}",
                    self.grammar.nonterminal(goto.nonterminal).name,
                    goto.target
                )?;
            }
            for &production in &state.reduces {
                writeln!(f, "  reduce {}", self.grammar.describe_production(production))?;
            }
        }
        Ok(())
    }
}
