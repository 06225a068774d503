//! Lowering of EBNF rules to BNF productions.
//!
//! Every rule becomes one nonterminal with one production per top-level
//! alternative. Nested constructs are moved into synthetic nonterminals
//! named `Rule#n`:
//!
//! | construct | productions |
//! |---|---|
//! | `e?` | `N : e` \| `N : ε` (`Absent`) |
//! | `a \| b` nested | `N : a` \| `N : b` |
//! | `e*` | `N : ε` (`ListEmpty`) \| `N : N e` (`ListAppend`) |
//! | `e{n,}` | `N : e … e` (`ListNew`) \| `N : N e` (`ListAppend`) |
//! | `e (s e)*` | `N : e` (`ListNew`) \| `N : N s e` (`ListAppend`) |
//!
//! Lists are left-recursive so the engine never holds more than one open
//! list element per nesting level.

use crate::error::GrammarError;
use crate::grammar::{
    BnfGrammar, Element, Expr, Grammar, NonterminalId, NonterminalKind, validate_grammar,
};
use crate::index::Indexed;
use crate::tree::Action;
use smallvec::SmallVec;

type Elements = SmallVec<[Element; 4]>;

impl BnfGrammar {
    /// Lower a validated EBNF grammar.
    ///
    /// Rule `i` of `grammar` becomes nonterminal `n{i}`.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] if `grammar` does not validate.
    pub fn lower(grammar: &Grammar) -> Result<Self, GrammarError> {
        validate_grammar(grammar)?;

        let mut lowering = Lowering {
            bnf: Self::new(),
            synthetic: 0,
        };
        for rule in grammar.rules() {
            lowering.bnf.add_nonterminal(&rule.name, NonterminalKind::Rule);
        }
        for start in grammar.starts() {
            let id = lowering.resolve("", start)?;
            lowering.bnf.add_start(id);
        }
        for (index, rule) in grammar.rules().iter().enumerate() {
            let id = NonterminalId::from_index(index);
            for alternative in &rule.alternatives {
                let mut elements = Elements::new();
                lowering.lower_into(&rule.name, alternative, &mut elements)?;
                lowering
                    .bnf
                    .add_production(id, elements, Action::Node(rule.name.clone()));
            }
        }

        log::debug!(
            "lowered {} rules into {} nonterminals and {} productions",
            grammar.rules().len(),
            lowering.bnf.nonterminals().len(),
            lowering.bnf.productions().len()
        );
        Ok(lowering.bnf)
    }
}

struct Lowering {
    bnf: BnfGrammar,
    synthetic: usize,
}

impl Lowering {
    fn resolve(&self, owner: &str, name: &str) -> Result<NonterminalId, GrammarError> {
        self.bnf
            .nonterminal_by_name(name)
            .ok_or_else(|| GrammarError::UndefinedRule {
                rule: owner.to_string(),
                referenced: name.to_string(),
            })
    }

    fn fresh(&mut self, owner: &str) -> NonterminalId {
        self.synthetic += 1;
        let name = format!("{owner}#{}", self.synthetic);
        self.bnf.add_nonterminal(&name, NonterminalKind::Synthetic)
    }

    fn lower_into(
        &mut self,
        owner: &str,
        expr: &Expr,
        out: &mut Elements,
    ) -> Result<(), GrammarError> {
        match expr {
            Expr::Token(descriptor) => {
                out.push(Element::Terminal(self.bnf.intern_token(descriptor.clone())));
            }
            Expr::Rule(name) => out.push(Element::Nonterminal(self.resolve(owner, name)?)),
            Expr::Empty => {}
            Expr::Seq(exprs) => {
                for expr in exprs {
                    self.lower_into(owner, expr, out)?;
                }
            }
            Expr::Choice(alternatives) => {
                let id = self.fresh(owner);
                for alternative in alternatives {
                    self.alternative(owner, id, alternative)?;
                }
                out.push(Element::Nonterminal(id));
            }
            Expr::Opt(inner) => {
                let id = self.fresh(owner);
                self.alternative(owner, id, inner)?;
                self.bnf.add_production(id, [], Action::Absent);
                out.push(Element::Nonterminal(id));
            }
            Expr::Repeat { expr, min } => {
                let item = self.single(owner, expr)?;
                let id = self.fresh(owner);
                if *min == 0 {
                    self.bnf.add_production(id, [], Action::ListEmpty);
                } else {
                    self.bnf.add_production(
                        id,
                        std::iter::repeat_n(item, *min),
                        Action::ListNew { separated: false },
                    );
                }
                self.bnf.add_production(
                    id,
                    [Element::Nonterminal(id), item],
                    Action::ListAppend { separated: false },
                );
                out.push(Element::Nonterminal(id));
            }
            Expr::Separated {
                item,
                separator,
                min,
            } => {
                let item = self.single(owner, item)?;
                let separator = self.single(owner, separator)?;
                let list = self.fresh(owner);
                let mut first = Elements::from_elem(item, 1);
                for _ in 1..(*min).max(1) {
                    first.push(separator);
                    first.push(item);
                }
                self.bnf
                    .add_production(list, first, Action::ListNew { separated: true });
                self.bnf.add_production(
                    list,
                    [Element::Nonterminal(list), separator, item],
                    Action::ListAppend { separated: true },
                );
                if *min == 0 {
                    let wrapper = self.fresh(owner);
                    self.bnf.add_production(wrapper, [], Action::ListEmpty);
                    self.bnf
                        .add_production(wrapper, [Element::Nonterminal(list)], Action::PassThrough);
                    out.push(Element::Nonterminal(wrapper));
                } else {
                    out.push(Element::Nonterminal(list));
                }
            }
        }
        Ok(())
    }

    /// Add `expr` as one production of `id`.
    fn alternative(
        &mut self,
        owner: &str,
        id: NonterminalId,
        expr: &Expr,
    ) -> Result<(), GrammarError> {
        let mut elements = Elements::new();
        self.lower_into(owner, expr, &mut elements)?;
        let action = if elements.len() == 1 {
            Action::PassThrough
        } else {
            Action::Group
        };
        self.bnf.add_production(id, elements, action);
        Ok(())
    }

    /// Lower `expr` to exactly one element, grouping longer sequences.
    fn single(&mut self, owner: &str, expr: &Expr) -> Result<Element, GrammarError> {
        let mut elements = Elements::new();
        self.lower_into(owner, expr, &mut elements)?;
        if let [element] = elements.as_slice() {
            return Ok(*element);
        }
        let id = self.fresh(owner);
        self.bnf.add_production(id, elements, Action::Group);
        Ok(Element::Nonterminal(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, TokenDescriptor};

    fn actions(bnf: &BnfGrammar, name: &str) -> Vec<Action> {
        let id = bnf.nonterminal_by_name(name).unwrap();
        bnf.nonterminal(id)
            .productions
            .iter()
            .map(|&production| bnf.production(production).action.clone())
            .collect()
    }

    #[test]
    fn rules_keep_declaration_order() {
        let grammar = GrammarBuilder::new()
            .start("B")
            .rule("A", Expr::literal("a"))
            .rule("B", Expr::rule("A") | Expr::literal("b"))
            .build()
            .unwrap();
        let bnf = BnfGrammar::lower(&grammar).unwrap();
        assert_eq!(bnf.nonterminal_by_name("A"), Some(NonterminalId::from_index(0)));
        assert_eq!(bnf.nonterminal_by_name("B"), Some(NonterminalId::from_index(1)));
        assert_eq!(bnf.starts(), &[NonterminalId::from_index(1)]);
        assert_eq!(bnf.nonterminal(NonterminalId::from_index(1)).productions.len(), 2);
        assert!(bnf.validate().is_ok());
    }

    #[test]
    fn optional_becomes_synthetic_with_absent_branch() {
        let grammar = GrammarBuilder::new()
            .start("S")
            .rule(
                "S",
                Expr::seq([
                    Expr::literal("a"),
                    Expr::opt(Expr::seq([Expr::literal("b"), Expr::literal("c")])),
                ]),
            )
            .build()
            .unwrap();
        let bnf = BnfGrammar::lower(&grammar).unwrap();
        assert_eq!(actions(&bnf, "S#1"), vec![Action::Group, Action::Absent]);
        // nested productions are added before the production that uses them
        assert_eq!(bnf.to_string(), "S#1 : \"b\" \"c\"\nS#1 :\nS : \"a\" S#1\n");
    }

    #[test]
    fn separated_list_with_zero_minimum_is_wrapped() {
        let grammar = GrammarBuilder::new()
            .start("L")
            .rule("L", Expr::sep_by(Expr::keyword("E"), Expr::literal(",")))
            .build()
            .unwrap();
        let bnf = BnfGrammar::lower(&grammar).unwrap();
        assert_eq!(
            actions(&bnf, "L#1"),
            vec![
                Action::ListNew { separated: true },
                Action::ListAppend { separated: true }
            ]
        );
        assert_eq!(actions(&bnf, "L#2"), vec![Action::ListEmpty, Action::PassThrough]);
        let comma = bnf.tokens().get(&TokenDescriptor::literal(",")).unwrap();
        let list = bnf.nonterminal_by_name("L#1").unwrap();
        let append = bnf.nonterminal(list).productions[1];
        assert_eq!(bnf.production(append).elements[1], Element::Terminal(comma));
    }

    #[test]
    fn repetition_with_minimum_repeats_the_item() {
        let grammar = GrammarBuilder::new()
            .start("R")
            .rule(
                "R",
                Expr::repeat(Expr::seq([Expr::literal("x"), Expr::literal("y")]), 2),
            )
            .build()
            .unwrap();
        let bnf = BnfGrammar::lower(&grammar).unwrap();
        // the two-token item is grouped first, then repeated
        let group = bnf.nonterminal_by_name("R#1").unwrap();
        let list = bnf.nonterminal_by_name("R#2").unwrap();
        let first = bnf.production(bnf.nonterminal(list).productions[0]);
        assert_eq!(
            first.elements.as_slice(),
            &[Element::Nonterminal(group), Element::Nonterminal(group)]
        );
        assert_eq!(first.action, Action::ListNew { separated: false });
    }
}
