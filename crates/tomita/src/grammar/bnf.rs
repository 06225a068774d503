//! Flattened BNF grammars.
//!
//! A [`BnfGrammar`] is what the table generator consumes: nonterminals with
//! plain productions, every symbol addressed by a dense id.

use crate::error::GrammarError;
use crate::grammar::{TokenDescriptor, TokenId, TokenTable};
use crate::index::{Indexed, dense_id};
use crate::tree::Action;
use compact_str::CompactString;
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::fmt;

dense_id! {
    /// Dense id of a [`BnfNonterminal`].
    pub struct NonterminalId => "n";
}

dense_id! {
    /// Dense id of a [`BnfProduction`].
    pub struct ProductionId => "p";
}

/// One symbol on the right-hand side of a production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Element {
    Terminal(TokenId),
    Nonterminal(NonterminalId),
}

/// Where a nonterminal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum NonterminalKind {
    /// Declared by the user as a grammar rule
    Rule,
    /// Introduced while lowering optional, repeated or nested constructs
    Synthetic,
    /// `@Start : Start`, added by the table generator as acceptance marker
    Extended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BnfNonterminal {
    pub id: NonterminalId,
    pub name: CompactString,
    pub kind: NonterminalKind,
    pub productions: Vec<ProductionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BnfProduction {
    pub id: ProductionId,
    /// Owning nonterminal, set once by [`BnfGrammar::add_production`].
    pub nonterminal: NonterminalId,
    pub elements: SmallVec<[Element; 4]>,
    pub action: Action,
}

impl BnfProduction {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True for epsilon productions.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub const fn action(&self) -> &Action {
        &self.action
    }
}

/// A flattened grammar.
///
/// Ids are handed out in insertion order and never reused; the owning
/// nonterminal of a production is recorded when the production is added.
///
/// ```rust
/// use tomita::grammar::{BnfGrammar, Element, NonterminalKind, TokenDescriptor};
/// use tomita::tree::Action;
///
/// let mut grammar = BnfGrammar::new();
/// let x = grammar.intern_token(TokenDescriptor::literal("x"));
/// let list = grammar.add_nonterminal("List", NonterminalKind::Rule);
/// grammar.add_production(list, [Element::Nonterminal(list), Element::Terminal(x)], Action::Node("List".into()));
/// grammar.add_production(list, [], Action::Node("List".into()));
/// grammar.add_start(list);
/// assert!(grammar.validate().is_ok());
/// assert_eq!(grammar.nonterminal(list).productions.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BnfGrammar {
    tokens: TokenTable,
    nonterminals: Vec<BnfNonterminal>,
    productions: Vec<BnfProduction>,
    names: HashMap<CompactString, NonterminalId, ahash::RandomState>,
    starts: SmallVec<[NonterminalId; 2]>,
}

impl BnfGrammar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_token(&mut self, descriptor: TokenDescriptor) -> TokenId {
        self.tokens.intern(descriptor)
    }

    /// Register a nonterminal. Names are expected to be unique; a later
    /// registration shadows an earlier one in [`nonterminal_by_name`](Self::nonterminal_by_name).
    pub fn add_nonterminal(&mut self, name: &str, kind: NonterminalKind) -> NonterminalId {
        let id = NonterminalId::from_index(self.nonterminals.len());
        self.nonterminals.push(BnfNonterminal {
            id,
            name: name.into(),
            kind,
            productions: Vec::new(),
        });
        self.names.insert(name.into(), id);
        id
    }

    /// Add a production to `nonterminal` and link it back.
    ///
    /// # Panics
    ///
    /// Panics if `nonterminal` was not issued by this grammar.
    pub fn add_production(
        &mut self,
        nonterminal: NonterminalId,
        elements: impl IntoIterator<Item = Element>,
        action: Action,
    ) -> ProductionId {
        let id = ProductionId::from_index(self.productions.len());
        self.productions.push(BnfProduction {
            id,
            nonterminal,
            elements: elements.into_iter().collect(),
            action,
        });
        self.nonterminals[nonterminal.index()].productions.push(id);
        id
    }

    pub fn add_start(&mut self, nonterminal: NonterminalId) {
        if !self.starts.contains(&nonterminal) {
            self.starts.push(nonterminal);
        }
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    #[must_use]
    pub fn nonterminals(&self) -> &[BnfNonterminal] {
        &self.nonterminals
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this grammar.
    #[must_use]
    pub fn nonterminal(&self, id: NonterminalId) -> &BnfNonterminal {
        &self.nonterminals[id.index()]
    }

    #[must_use]
    pub fn nonterminal_by_name(&self, name: &str) -> Option<NonterminalId> {
        self.names.get(name).copied()
    }

    #[must_use]
    pub fn productions(&self) -> &[BnfProduction] {
        &self.productions
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this grammar.
    #[must_use]
    pub fn production(&self, id: ProductionId) -> &BnfProduction {
        &self.productions[id.index()]
    }

    #[must_use]
    pub fn starts(&self) -> &[NonterminalId] {
        &self.starts
    }

    /// Check that the grammar can be handed to the table generator.
    ///
    /// # Errors
    ///
    /// - [`GrammarError::NoStart`] without start nonterminals
    /// - [`GrammarError::NonterminalWithoutProductions`] for a nonterminal
    ///   that derives nothing
    /// - [`GrammarError::DanglingReference`] for a production whose owner or
    ///   elements point outside the grammar
    pub fn validate(&self) -> Result<(), GrammarError> {
        if self.starts.is_empty() {
            return Err(GrammarError::NoStart);
        }
        if let Some(start) = self
            .starts
            .iter()
            .find(|start| start.index() >= self.nonterminals.len())
        {
            return Err(GrammarError::UnknownStart(start.to_string()));
        }
        for nonterminal in &self.nonterminals {
            if nonterminal.productions.is_empty() {
                return Err(GrammarError::NonterminalWithoutProductions(
                    nonterminal.name.to_string(),
                ));
            }
        }
        for production in &self.productions {
            let owner_links_back = self
                .nonterminals
                .get(production.nonterminal.index())
                .is_some_and(|owner| owner.productions.contains(&production.id));
            let elements_resolve = production.elements.iter().all(|element| match element {
                Element::Terminal(token) => token.index() < self.tokens.len(),
                Element::Nonterminal(nonterminal) => nonterminal.index() < self.nonterminals.len(),
            });
            if !owner_links_back || !elements_resolve {
                return Err(GrammarError::DanglingReference {
                    production: production.id,
                });
            }
        }
        Ok(())
    }

    /// Name of an element for dumps: quoted literal, `<class>`, or rule name.
    #[must_use]
    pub fn element_name(&self, element: Element) -> String {
        match element {
            Element::Terminal(token) => self.tokens.descriptor(token).to_string(),
            Element::Nonterminal(nonterminal) => self.nonterminal(nonterminal).name.to_string(),
        }
    }

    /// Render a production, with an optional dot before `position`.
    pub(crate) fn write_production(
        &self,
        f: &mut impl fmt::Write,
        id: ProductionId,
        dot: Option<usize>,
    ) -> fmt::Result {
        let production = self.production(id);
        write!(f, "{} :", self.nonterminal(production.nonterminal).name)?;
        for (position, &element) in production.elements.iter().enumerate() {
            if dot == Some(position) {
                f.write_str(" .")?;
            }
            write!(f, " {}", self.element_name(element))?;
        }
        if dot == Some(production.len()) {
            f.write_str(" .")?;
        }
        Ok(())
    }

    /// A production rendered as `Name : a b c`.
    #[must_use]
    pub fn describe_production(&self, id: ProductionId) -> String {
        let mut out = String::new();
        let _ = self.write_production(&mut out, id, None);
        out
    }
}

impl fmt::Display for BnfGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for production in &self.productions {
            self.write_production(f, production.id, None)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
