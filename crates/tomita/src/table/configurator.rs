//! Table generation: LR(0) closures and state construction.

use crate::error::GrammarError;
use crate::grammar::{
    BnfGrammar, Element, NonterminalId, NonterminalKind, ProductionId, TokenId,
};
use crate::index::{IndexMap, IndexSet, Indexed};
use crate::table::{
    Goto, ItemId, ParserConfiguration, ParserItem, ParserItemSet, ParserState, Shift, StartState,
    StateId,
};
use crate::tree::Action;
use compact_str::{CompactString, format_compact};
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Builds a [`ParserConfiguration`] from one BNF grammar.
///
/// A configurator is single use: [`configure`](Self::configure) consumes it
/// together with its closure caches.
///
/// ```rust
/// use tomita::grammar::{BnfGrammar, Expr, Grammar};
/// use tomita::table::ParserConfigurator;
///
/// let grammar = Grammar::builder()
///     .start("S")
///     .rule("S", Expr::seq([Expr::literal("("), Expr::rule("S"), Expr::literal(")")]))
///     .rule("S", Expr::empty())
///     .build()?;
/// let configuration = ParserConfigurator::new(BnfGrammar::lower(&grammar)?)?.configure();
/// assert!(configuration.start_state("S").is_some());
/// # Ok::<(), tomita::error::GrammarError>(())
/// ```
#[derive(Debug)]
pub struct ParserConfigurator {
    grammar: BnfGrammar,
    items: Vec<ParserItem>,
    first_items: IndexMap<ProductionId, ItemId>,
    direct_items: IndexMap<NonterminalId, SmallVec<[ItemId; 4]>>,
    indirect_items: IndexMap<NonterminalId, Vec<ItemId>>,
    starts: Vec<(CompactString, NonterminalId, ProductionId)>,
}

/// A state under construction; transitions are filled in once its item
/// set has been partitioned.
struct PendingState {
    items: ParserItemSet,
    shifts: Vec<Shift>,
    gotos: Vec<Goto>,
}

impl ParserConfigurator {
    /// Validate `grammar` and add an extended `@Start : Start` production
    /// for every start nonterminal.
    ///
    /// # Errors
    ///
    /// Returns the [`GrammarError`] from [`BnfGrammar::validate`].
    pub fn new(mut grammar: BnfGrammar) -> Result<Self, GrammarError> {
        grammar.validate()?;

        let mut starts = Vec::with_capacity(grammar.starts().len());
        for start in grammar.starts().to_vec() {
            let name = grammar.nonterminal(start).name.clone();
            let extended =
                grammar.add_nonterminal(&format_compact!("@{name}"), NonterminalKind::Extended);
            let production =
                grammar.add_production(extended, [Element::Nonterminal(start)], Action::Accept);
            starts.push((name, extended, production));
        }

        let mut items = Vec::new();
        let mut first_items = IndexMap::with_capacity(grammar.productions().len());
        for production in grammar.productions() {
            first_items.insert(production.id, ItemId::from_index(items.len()));
            for position in 0..=production.len() {
                let id = ItemId::from_index(items.len());
                let complete = position == production.len();
                items.push(ParserItem {
                    id,
                    production: production.id,
                    position,
                    next: (!complete).then(|| ItemId::from_index(id.index() + 1)),
                    expected: production.elements.get(position).copied(),
                });
            }
        }

        Ok(Self {
            grammar,
            items,
            first_items,
            direct_items: IndexMap::new(),
            indirect_items: IndexMap::new(),
            starts,
        })
    }

    #[must_use]
    pub const fn grammar(&self) -> &BnfGrammar {
        &self.grammar
    }

    #[must_use]
    pub fn items(&self) -> &[ParserItem] {
        &self.items
    }

    /// Items at position 0 of every production of `nonterminal`.
    pub fn direct_items(&mut self, nonterminal: NonterminalId) -> &[ItemId] {
        let Self {
            grammar,
            first_items,
            direct_items,
            ..
        } = self;
        direct_items.get_or_insert_with(nonterminal, || {
            grammar
                .nonterminal(nonterminal)
                .productions
                .iter()
                .filter_map(|&production| first_items.get(production).copied())
                .collect()
        })
        .as_slice()
    }

    /// Direct items of `nonterminal` and of every nonterminal reachable from
    /// it through items expecting a nonterminal at position 0.
    pub fn indirect_items(&mut self, nonterminal: NonterminalId) -> &[ItemId] {
        if !self.indirect_items.contains_key(nonterminal) {
            let mut visited = IndexSet::new();
            visited.insert(nonterminal);
            let mut result = Vec::new();
            let mut next = 0;
            while let Some(&current) = visited.as_slice().get(next) {
                next += 1;
                let direct = self.direct_items(current).to_vec();
                for item in direct {
                    if let Some(Element::Nonterminal(expected)) = self.items[item.index()].expected {
                        visited.insert(expected);
                    }
                    result.push(item);
                }
            }
            self.indirect_items.insert(nonterminal, result);
        }
        self.indirect_items
            .get(nonterminal)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `seed` plus the indirect items of every nonterminal a seed item
    /// expects next.
    pub fn closure(&mut self, seed: impl IntoIterator<Item = ItemId>) -> ParserItemSet {
        let mut closure = IndexSet::new();
        let mut expected = IndexSet::new();
        for item in seed {
            if closure.insert(item)
                && let Some(Element::Nonterminal(nonterminal)) = self.items[item.index()].expected
            {
                expected.insert(nonterminal);
            }
        }
        for nonterminal in expected.iter() {
            closure.extend(self.indirect_items(nonterminal).iter().copied());
        }
        closure.into()
    }

    /// Build every state reachable from the start states.
    #[must_use]
    pub fn configure(mut self) -> ParserConfiguration {
        let mut pending: Vec<PendingState> = Vec::new();
        let mut lookup: HashMap<ParserItemSet, StateId, ahash::RandomState> = HashMap::default();

        let mut starts = SmallVec::new();
        for (name, extended, production) in self.starts.clone() {
            let Some(&seed) = self.first_items.get(production) else {
                continue;
            };
            let items = self.closure([seed]);
            let state = Self::intern(&mut pending, &mut lookup, items);
            starts.push(StartState {
                name,
                nonterminal: extended,
                state,
            });
        }

        let mut next = 0;
        while next < pending.len() {
            let mut by_token: IndexMap<TokenId, Vec<ItemId>> = IndexMap::new();
            let mut by_nonterminal: IndexMap<NonterminalId, Vec<ItemId>> = IndexMap::new();
            for item in pending[next].items.iter() {
                let item = &self.items[item.index()];
                match (item.expected, item.next) {
                    (Some(Element::Terminal(token)), Some(advanced)) => {
                        by_token.get_or_insert_with(token, Vec::new).push(advanced);
                    }
                    (Some(Element::Nonterminal(nonterminal)), Some(advanced)) => {
                        by_nonterminal
                            .get_or_insert_with(nonterminal, Vec::new)
                            .push(advanced);
                    }
                    _ => {}
                }
            }

            let mut shifts = Vec::with_capacity(by_token.len());
            for (token, advanced) in by_token.iter() {
                let items = self.closure(advanced.iter().copied());
                let target = Self::intern(&mut pending, &mut lookup, items);
                shifts.push(Shift { token, target });
            }
            let mut gotos = Vec::with_capacity(by_nonterminal.len());
            for (nonterminal, advanced) in by_nonterminal.iter() {
                let items = self.closure(advanced.iter().copied());
                let target = Self::intern(&mut pending, &mut lookup, items);
                gotos.push(Goto { nonterminal, target });
            }
            pending[next].shifts = shifts;
            pending[next].gotos = gotos;
            next += 1;
        }

        let states: Vec<ParserState> = pending
            .into_iter()
            .enumerate()
            .map(|(index, state)| self.finish(StateId::from_index(index), state))
            .collect();

        log::debug!(
            "generated {} states from {} items for {} start(s)",
            states.len(),
            self.items.len(),
            starts.len()
        );

        ParserConfiguration {
            grammar: self.grammar,
            items: self.items,
            states,
            starts,
        }
    }

    fn intern(
        pending: &mut Vec<PendingState>,
        lookup: &mut HashMap<ParserItemSet, StateId, ahash::RandomState>,
        items: ParserItemSet,
    ) -> StateId {
        if let Some(&state) = lookup.get(&items) {
            return state;
        }
        let state = StateId::from_index(pending.len());
        lookup.insert(items.clone(), state);
        pending.push(PendingState {
            items,
            shifts: Vec::new(),
            gotos: Vec::new(),
        });
        state
    }

    fn finish(&self, id: StateId, state: PendingState) -> ParserState {
        let reduces: SmallVec<[ProductionId; 2]> = state
            .items
            .iter()
            .map(|item| &self.items[item.index()])
            .filter(|item| item.is_complete())
            .map(|item| item.production)
            .collect();
        let is_final = reduces.iter().any(|&production| {
            let owner = self.grammar.production(production).nonterminal;
            self.grammar.nonterminal(owner).kind == NonterminalKind::Extended
        });
        ParserState {
            id,
            items: state.items,
            reduces,
            shifts: state.shifts,
            gotos: state.gotos,
            is_final,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Expr, GrammarBuilder};

    fn configurator(grammar: &crate::grammar::Grammar) -> ParserConfigurator {
        ParserConfigurator::new(BnfGrammar::lower(grammar).unwrap()).unwrap()
    }

    #[test]
    fn indirect_items_follow_leading_nonterminals() {
        // A : B "x" ; B : C | "b" ; C : "c"
        let grammar = GrammarBuilder::new()
            .start("A")
            .rule("A", Expr::seq([Expr::rule("B"), Expr::literal("x")]))
            .rule("B", Expr::rule("C") | Expr::literal("b"))
            .rule("C", Expr::literal("c"))
            .build()
            .unwrap();
        let mut configurator = configurator(&grammar);
        let a = configurator.grammar().nonterminal_by_name("A").unwrap();
        let c = configurator.grammar().nonterminal_by_name("C").unwrap();
        assert_eq!(configurator.direct_items(a).len(), 1);
        assert_eq!(configurator.indirect_items(a).len(), 4);
        assert_eq!(configurator.indirect_items(c).len(), 1);
    }

    #[test]
    fn extended_start_is_added_per_start() {
        let grammar = GrammarBuilder::new()
            .start("A")
            .start("B")
            .rule("A", Expr::literal("a"))
            .rule("B", Expr::literal("b"))
            .build()
            .unwrap();
        let configurator = configurator(&grammar);
        let extended = configurator.grammar().nonterminal_by_name("@B").unwrap();
        let extended = configurator.grammar().nonterminal(extended);
        assert_eq!(extended.kind, NonterminalKind::Extended);
        let production = configurator.grammar().production(extended.productions[0]);
        assert_eq!(production.action, Action::Accept);
        // 2 items for each of the four productions
        assert_eq!(configurator.items().len(), 8);
    }

    #[test]
    fn epsilon_production_is_complete_at_position_zero() {
        let grammar = GrammarBuilder::new()
            .start("S")
            .rule("S", Expr::empty())
            .build()
            .unwrap();
        let configuration = configurator(&grammar).configure();
        let start = configuration.start_state("S").unwrap();
        let state = configuration.state(start);
        assert_eq!(state.reduces().len(), 1);
        assert!(!state.is_final());
        let goto = state.gotos()[0].target;
        assert!(configuration.state(goto).is_final());
    }
}
