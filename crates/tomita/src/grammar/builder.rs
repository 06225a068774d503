use crate::error::GrammarError;
use crate::grammar::{Expr, validate_grammar};
use compact_str::CompactString;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// An EBNF grammar: named rules plus the names parsing may start from.
///
/// Rules keep their declaration order, which also fixes the order of the
/// nonterminals after lowering.
///
/// # Example
///
/// ```rust
/// use tomita::grammar::{Expr, GrammarBuilder};
///
/// let grammar = GrammarBuilder::new()
///     .start("List")
///     .rule("List", Expr::sep_by(Expr::integer(), Expr::literal(",")))
///     .build()
///     .expect("valid grammar");
/// assert_eq!(grammar.rules().len(), 1);
/// assert_eq!(grammar.starts(), ["List"]);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Grammar {
    rules: Vec<Rule>,
    index: HashMap<CompactString, usize, ahash::RandomState>,
    starts: SmallVec<[CompactString; 2]>,
}

/// A named rule with its alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    pub name: CompactString,
    pub alternatives: Vec<Expr>,
}

impl Grammar {
    #[must_use]
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&index| &self.rules[index])
    }

    /// Declaration index of the rule called `name`.
    #[must_use]
    pub fn rule_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn starts(&self) -> &[CompactString] {
        &self.starts
    }
}

/// Builder for [`Grammar`].
///
/// Calling [`rule`](Self::rule) again with the same name adds alternatives
/// to the existing rule. A top-level [`Expr::Choice`] contributes one
/// alternative per branch.
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    rules: Vec<Rule>,
    index: HashMap<CompactString, usize, ahash::RandomState>,
    starts: SmallVec<[CompactString; 2]>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` as a start rule. A grammar may have several.
    #[must_use]
    pub fn start(mut self, name: &str) -> Self {
        self.starts.push(name.into());
        self
    }

    #[must_use]
    pub fn rule(mut self, name: &str, expr: Expr) -> Self {
        let index = match self.index.get(name) {
            Some(&index) => index,
            None => {
                self.rules.push(Rule {
                    name: name.into(),
                    alternatives: Vec::new(),
                });
                self.index.insert(name.into(), self.rules.len() - 1);
                self.rules.len() - 1
            }
        };
        let alternatives = &mut self.rules[index].alternatives;
        match expr {
            Expr::Choice(branches) => alternatives.extend(branches),
            other => alternatives.push(other),
        }
        self
    }

    /// Validate and finish the grammar.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] if no start rule is declared, a start or a
    /// referenced rule is undefined, a choice has no alternatives, or a rule
    /// name uses a reserved character.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        let grammar = Grammar {
            rules: self.rules,
            index: self.index,
            starts: self.starts,
        };
        validate_grammar(&grammar)?;
        Ok(grammar)
    }
}
