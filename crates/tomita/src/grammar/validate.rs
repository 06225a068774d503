use crate::error::GrammarError;
use crate::grammar::{Expr, Grammar};
use hashbrown::HashSet;

/// Characters reserved for generated nonterminal names.
pub const RESERVED_CHARS: [char; 2] = ['@', '#'];

/// Validate an EBNF grammar.
///
/// # Errors
///
/// Returns the first problem found: a missing, duplicated or undefined start
/// rule, a reserved rule name, a choice without alternatives, an empty
/// literal, or a reference to an undefined rule.
pub fn validate_grammar(grammar: &Grammar) -> Result<(), GrammarError> {
    if grammar.starts().is_empty() {
        return Err(GrammarError::NoStart);
    }

    let mut seen = HashSet::with_capacity(grammar.starts().len());
    for start in grammar.starts() {
        if !seen.insert(start.as_str()) {
            return Err(GrammarError::DuplicateStart(start.to_string()));
        }
        if grammar.rule(start).is_none() {
            return Err(GrammarError::UnknownStart(start.to_string()));
        }
    }

    for rule in grammar.rules() {
        if rule.name.contains(RESERVED_CHARS) || rule.name.is_empty() {
            return Err(GrammarError::ReservedName(rule.name.to_string()));
        }
        if rule.alternatives.is_empty() {
            return Err(GrammarError::EmptyRule(rule.name.to_string()));
        }
        for alternative in &rule.alternatives {
            if has_empty_choice(alternative) {
                return Err(GrammarError::EmptyRule(rule.name.to_string()));
            }
            if has_empty_literal(alternative) {
                return Err(GrammarError::EmptyLiteral(rule.name.to_string()));
            }
            let mut undefined = None;
            alternative.for_each_rule(&mut |name| {
                if undefined.is_none() && grammar.rule(name).is_none() {
                    undefined = Some(name);
                }
            });
            if let Some(referenced) = undefined {
                return Err(GrammarError::UndefinedRule {
                    rule: rule.name.to_string(),
                    referenced: referenced.to_string(),
                });
            }
        }
    }

    Ok(())
}

fn has_empty_choice(expr: &Expr) -> bool {
    match expr {
        Expr::Choice(exprs) => exprs.is_empty() || exprs.iter().any(has_empty_choice),
        Expr::Seq(exprs) => exprs.iter().any(has_empty_choice),
        Expr::Opt(expr) | Expr::Repeat { expr, .. } => has_empty_choice(expr),
        Expr::Separated {
            item, separator, ..
        } => has_empty_choice(item) || has_empty_choice(separator),
        Expr::Token(_) | Expr::Rule(_) | Expr::Empty => false,
    }
}

fn has_empty_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Token(descriptor) => descriptor.text().is_some_and(str::is_empty),
        Expr::Seq(exprs) | Expr::Choice(exprs) => exprs.iter().any(has_empty_literal),
        Expr::Opt(expr) | Expr::Repeat { expr, .. } => has_empty_literal(expr),
        Expr::Separated {
            item, separator, ..
        } => has_empty_literal(item) || has_empty_literal(separator),
        Expr::Rule(_) | Expr::Empty => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GrammarError;
    use crate::grammar::{Expr, GrammarBuilder};

    #[test]
    fn undefined_reference_is_reported_with_its_rule() {
        let error = GrammarBuilder::new()
            .start("S")
            .rule("S", Expr::seq([Expr::literal("a"), Expr::opt(Expr::rule("Missing"))]))
            .build()
            .unwrap_err();
        assert_eq!(
            error,
            GrammarError::UndefinedRule {
                rule: "S".into(),
                referenced: "Missing".into(),
            }
        );
    }

    #[test]
    fn start_checks() {
        let unknown = GrammarBuilder::new()
            .start("Nope")
            .rule("S", Expr::literal("a"))
            .build()
            .unwrap_err();
        assert_eq!(unknown, GrammarError::UnknownStart("Nope".into()));

        let duplicate = GrammarBuilder::new()
            .start("S")
            .start("S")
            .rule("S", Expr::literal("a"))
            .build()
            .unwrap_err();
        assert_eq!(duplicate, GrammarError::DuplicateStart("S".into()));
    }

    #[test]
    fn reserved_names_and_empty_choices() {
        let reserved = GrammarBuilder::new()
            .start("@S")
            .rule("@S", Expr::literal("a"))
            .build()
            .unwrap_err();
        assert_eq!(reserved, GrammarError::ReservedName("@S".into()));

        let empty = GrammarBuilder::new()
            .start("S")
            .rule("S", Expr::seq([Expr::literal("a"), Expr::Choice(Vec::new())]))
            .build()
            .unwrap_err();
        assert_eq!(empty, GrammarError::EmptyRule("S".into()));
    }

    #[test]
    fn empty_literals_are_rejected() {
        let error = GrammarBuilder::new()
            .start("S")
            .rule("S", Expr::many(Expr::literal("")))
            .build()
            .unwrap_err();
        assert_eq!(error, GrammarError::EmptyLiteral("S".into()));

        let nested = GrammarBuilder::new()
            .start("S")
            .rule("S", Expr::sep_by(Expr::identifier(), Expr::keyword("")))
            .build()
            .unwrap_err();
        assert_eq!(nested, GrammarError::EmptyLiteral("S".into()));
    }
}
