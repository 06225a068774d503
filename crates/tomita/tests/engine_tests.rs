//! End-to-end tests for the parse engine

use tomita::grammar::{BnfProduction, TokenId};
use tomita::index::Indexed;
use tomita::{
    Action, EngineConfig, Expr, Grammar, GrammarBuilder, NodeBuilder, ParseError, ParseNode,
    ParserConfiguration, ParserEngine, Position, Token, TokenDescriptor, VecTokenStream,
};

fn tables(builder: GrammarBuilder) -> ParserConfiguration {
    let grammar: Grammar = builder.build().expect("valid grammar");
    ParserConfiguration::build(&grammar).expect("tables")
}

fn parse(configuration: &ParserConfiguration, start: &str, text: &str) -> ParseNode {
    ParserEngine::new(configuration)
        .parse_str(start, text)
        .unwrap_or_else(|error| panic!("{text:?} failed: {error}"))
        .root
}

fn dangling_else() -> ParserConfiguration {
    // Stmt : "if" "(" Cond ")" Stmt ["else" Stmt] | "other"
    tables(
        GrammarBuilder::new()
            .start("Stmt")
            .rule(
                "Stmt",
                Expr::seq([
                    Expr::literal("if"),
                    Expr::literal("("),
                    Expr::rule("Cond"),
                    Expr::literal(")"),
                    Expr::rule("Stmt"),
                    Expr::opt(Expr::seq([Expr::literal("else"), Expr::rule("Stmt")])),
                ]),
            )
            .rule("Stmt", Expr::literal("other"))
            .rule("Cond", Expr::identifier()),
    )
}

fn ambiguous_sum() -> ParserConfiguration {
    tables(
        GrammarBuilder::new()
            .start("Sum")
            .rule(
                "Sum",
                Expr::seq([Expr::rule("Sum"), Expr::literal("+"), Expr::rule("Sum")]),
            )
            .rule("Sum", Expr::integer()),
    )
}

#[test]
fn test_dangling_else_binds_to_innermost_if() {
    let configuration = dangling_else();
    let root = parse(&configuration, "Stmt", "if (a) if (b) other else other");

    assert_eq!(root.name(), Some("Stmt"));
    assert_eq!(root.children().len(), 6);
    assert!(root.child(5).is_some_and(ParseNode::is_absent));

    let inner = root.child(4).expect("inner statement");
    assert_eq!(inner.name(), Some("Stmt"));
    match inner.child(5) {
        Some(ParseNode::Group(children)) => {
            assert_eq!(children[0].text(), Some("else"));
            assert_eq!(children[1].name(), Some("Stmt"));
        }
        other => panic!("else branch should belong to the inner if: {other:?}"),
    }
    assert_eq!(
        root.to_string(),
        "(Stmt if ( (Cond a) ) (Stmt if ( (Cond b) ) (Stmt other) {else (Stmt other)}) _)"
    );
}

#[test]
fn test_dangling_else_records_resolution() {
    let configuration = dangling_else();
    let output = ParserEngine::new(&configuration)
        .parse_str("Stmt", "if (a) if (b) other else other")
        .unwrap();
    assert!(output.stats.ambiguities_resolved >= 1);
    assert!(output.stats.peak_stacks >= 2);
    assert_eq!(output.stats.tokens_consumed, 11);
}

#[test]
fn test_unambiguous_if_else() {
    let configuration = dangling_else();
    let root = parse(&configuration, "Stmt", "if (a) other else other");
    assert!(matches!(root.child(5), Some(ParseNode::Group(_))));
    let root = parse(&configuration, "Stmt", "if (a) other");
    assert!(root.child(5).is_some_and(ParseNode::is_absent));
}

#[test]
fn test_strict_mode_reports_ambiguity() {
    let configuration = dangling_else();
    let engine = ParserEngine::with_config(&configuration, EngineConfig::strict());
    match engine.parse_str("Stmt", "if (a) if (b) other else other") {
        Err(ParseError::Ambiguity { alternatives, .. }) => {
            assert_eq!(alternatives.len(), 2);
            assert_ne!(alternatives[0], alternatives[1]);
        }
        other => panic!("expected an ambiguity error, got {other:?}"),
    }
    // Unambiguous input is fine in strict mode
    assert!(engine.parse_str("Stmt", "if (a) other else other").is_ok());
}

#[test]
fn test_ambiguous_sum_is_left_associative() {
    let configuration = ambiguous_sum();
    let root = parse(&configuration, "Sum", "1 + 2 + 3 + 4");
    assert_eq!(
        root.to_string(),
        "(Sum (Sum (Sum (Sum 1) + (Sum 2)) + (Sum 3)) + (Sum 4))"
    );
}

#[test]
fn test_mutually_recursive_unit_rules_terminate() {
    // A : B ; B : A | ε
    let configuration = tables(
        GrammarBuilder::new()
            .start("A")
            .rule("A", Expr::rule("B"))
            .rule("B", Expr::rule("A") | Expr::empty()),
    );
    let root = parse(&configuration, "A", "");
    assert_eq!(root.to_string(), "(A (B))");

    let engine = ParserEngine::new(&configuration);
    assert!(matches!(
        engine.parse_str("A", "x"),
        Err(ParseError::Lex(tomita::LexError::UnknownWord { .. }))
    ));

    let mut tokens = VecTokenStream::new(vec![Token::new(
        TokenId::from_index(7),
        "x",
        Position::start(),
    )]);
    match engine.parse_tree("A", &mut tokens) {
        Err(ParseError::UnexpectedToken {
            found, expected, ..
        }) => {
            assert_eq!(found, "token `x`");
            assert_eq!(expected, vec![TokenDescriptor::Eof]);
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn test_empty_prefix_loops_are_cut() {
    // A : B A | "x" ; B : ε
    let configuration = tables(
        GrammarBuilder::new()
            .start("A")
            .rule("A", Expr::seq([Expr::rule("B"), Expr::rule("A")]))
            .rule("A", Expr::literal("x"))
            .rule("B", Expr::empty()),
    );
    let output = ParserEngine::new(&configuration)
        .parse_str("A", "x")
        .unwrap();
    assert_eq!(output.root.to_string(), "(A x)");
    assert_eq!(output.stats.ambiguities_resolved, 1);
}

#[test]
fn test_reductions_continue_from_final_state() {
    // A : B "z" | "q" ; B : A
    let configuration = tables(
        GrammarBuilder::new()
            .start("A")
            .rule("A", Expr::seq([Expr::rule("B"), Expr::literal("z")]))
            .rule("A", Expr::literal("q"))
            .rule("B", Expr::rule("A")),
    );
    assert_eq!(parse(&configuration, "A", "q").to_string(), "(A q)");
    assert_eq!(
        parse(&configuration, "A", "q z z").to_string(),
        "(A (B (A (B (A q)) z)) z)"
    );
}

#[test]
fn test_separated_lists() {
    let configuration = tables(
        GrammarBuilder::new()
            .start("L")
            .rule("L", Expr::sep_by(Expr::literal("E"), Expr::literal(","))),
    );
    let lengths: Vec<usize> = ["", "E, E, E", "E"]
        .iter()
        .map(|text| {
            parse(&configuration, "L", text)
                .child(0)
                .and_then(ParseNode::as_list)
                .map(<[ParseNode]>::len)
                .expect("list child")
        })
        .collect();
    assert_eq!(lengths, vec![0, 3, 1]);

    let engine = ParserEngine::new(&configuration);
    match engine.parse_str("L", "E, E,") {
        Err(ParseError::UnexpectedEof { expected, .. }) => {
            assert_eq!(expected, vec![TokenDescriptor::literal("E")]);
        }
        other => panic!("expected end-of-input error, got {other:?}"),
    }
}

#[test]
fn test_expected_set_after_partial_sequence() {
    // X : "a" "b" ";"
    let configuration = tables(
        GrammarBuilder::new()
            .start("X")
            .rule("X", Expr::seq([Expr::literal("a"), Expr::literal("b"), Expr::literal(";")])),
    );
    let error = ParserEngine::new(&configuration)
        .parse_str("X", "a b")
        .unwrap_err();
    assert!(matches!(error, ParseError::UnexpectedEof { .. }));
    assert_eq!(error.expected(), &[TokenDescriptor::literal(";")]);
    assert_eq!(error.position(), Some(Position::new(3, 1, 4)));
}

#[test]
fn test_expected_set_of_choice() {
    let configuration = tables(
        GrammarBuilder::new()
            .start("Foo")
            .start("Other")
            .rule("Foo", Expr::literal("x") | Expr::literal("y") | Expr::literal("z"))
            .rule("Other", Expr::literal("w")),
    );
    let error = ParserEngine::new(&configuration)
        .parse_str("Foo", "w")
        .unwrap_err();
    match &error {
        ParseError::UnexpectedToken {
            found, position, ..
        } => {
            assert_eq!(found, "\"w\"");
            assert_eq!(*position, Position::start());
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
    assert_eq!(
        error.expected(),
        &[
            TokenDescriptor::literal("x"),
            TokenDescriptor::literal("y"),
            TokenDescriptor::literal("z"),
        ]
    );
    assert_eq!(error.format_expected(), "\"x\", \"y\", or \"z\"");
    assert_eq!(parse(&configuration, "Other", "w").to_string(), "(Other w)");
}

#[test]
fn test_long_left_recursive_list() {
    let configuration = tables(
        GrammarBuilder::new()
            .start("Words")
            .rule("Words", Expr::many(Expr::identifier())),
    );
    let text = "word ".repeat(20_000);
    let output = ParserEngine::new(&configuration)
        .parse_str("Words", &text)
        .unwrap();
    let items = output.root.child(0).and_then(ParseNode::as_list).unwrap();
    assert_eq!(items.len(), 20_000);
    assert_eq!(output.stats.tokens_consumed, 20_000);
    assert_eq!(output.stats.peak_stacks, 1);
}

/// Evaluates arithmetic without building a tree.
struct Evaluator;

impl NodeBuilder for Evaluator {
    type Node = i64;

    fn terminal(&self, token: &Token) -> i64 {
        token.text.parse().unwrap_or(0)
    }

    fn reduce(&self, production: &BnfProduction, children: Vec<i64>) -> i64 {
        match (&production.action, children.as_slice()) {
            (Action::Node(name), [left, _, right]) if name.as_str() == "Expr" => left + right,
            (Action::Node(name), [left, _, right]) if name.as_str() == "Term" => left * right,
            (Action::Node(_), [_, inner, _]) => *inner,
            (_, [single]) => *single,
            _ => 0,
        }
    }
}

#[test]
fn test_custom_node_builder() {
    let configuration = tables(
        GrammarBuilder::new()
            .start("Expr")
            .rule("Expr", Expr::seq([Expr::rule("Expr"), Expr::literal("+"), Expr::rule("Term")]))
            .rule("Expr", Expr::rule("Term"))
            .rule("Term", Expr::seq([Expr::rule("Term"), Expr::literal("*"), Expr::rule("Factor")]))
            .rule("Term", Expr::rule("Factor"))
            .rule("Factor", Expr::integer())
            .rule("Factor", Expr::seq([Expr::literal("("), Expr::rule("Expr"), Expr::literal(")")])),
    );
    let engine = ParserEngine::new(&configuration);
    let mut scanner = tomita::Scanner::new("2 * (3 + 4) + 5", configuration.tokens());
    let output = engine.parse("Expr", &mut scanner, &Evaluator).unwrap();
    assert_eq!(output.root, 19);
    assert_eq!(output.stats.ambiguities_resolved, 0);
}

#[test]
fn test_multiple_starts_share_tables() {
    let configuration = tables(
        GrammarBuilder::new()
            .start("Pair")
            .start("Item")
            .rule("Pair", Expr::seq([Expr::rule("Item"), Expr::literal(":"), Expr::rule("Item")]))
            .rule("Item", Expr::identifier() | Expr::integer()),
    );
    assert_eq!(
        parse(&configuration, "Pair", "a : 1").to_string(),
        "(Pair (Item a) : (Item 1))"
    );
    assert_eq!(parse(&configuration, "Item", "7").to_string(), "(Item 7)");
    assert!(ParserEngine::new(&configuration).parse_str("Item", "a : 1").is_err());
}

#[test]
fn test_lex_errors_propagate() {
    let configuration = tables(
        GrammarBuilder::new()
            .start("S")
            .rule("S", Expr::many(Expr::string())),
    );
    let engine = ParserEngine::new(&configuration);
    assert_eq!(
        parse(&configuration, "S", r#""a" "b\"c""#)
            .child(0)
            .and_then(ParseNode::as_list)
            .map(<[ParseNode]>::len),
        Some(2)
    );
    let error = engine.parse_str("S", "\"a\" \"open").unwrap_err();
    assert_eq!(error.position(), Some(Position::new(4, 1, 5)));
    assert!(matches!(error, ParseError::Lex(_)));
}

#[test]
fn test_digit_literals_parse() {
    // S : "x" "1"
    let configuration = tables(
        GrammarBuilder::new()
            .start("S")
            .rule("S", Expr::seq([Expr::literal("x"), Expr::literal("1")])),
    );
    assert_eq!(parse(&configuration, "S", "x 1").to_string(), "(S x 1)");

    let error = ParserEngine::new(&configuration)
        .parse_str("S", "x 2")
        .unwrap_err();
    assert!(matches!(error, ParseError::Lex(tomita::LexError::UnknownWord { .. })), "{error:?}");
}

#[test]
fn test_empty_literal_is_rejected_before_parsing() {
    let error = GrammarBuilder::new()
        .start("S")
        .rule("S", Expr::many(Expr::literal("")))
        .build()
        .unwrap_err();
    assert_eq!(error, tomita::GrammarError::EmptyLiteral("S".into()));
}

#[test]
fn test_long_ambiguous_sum() {
    let configuration = ambiguous_sum();
    let terms = 150;
    let text = (0..terms).map(|n| n.to_string()).collect::<Vec<_>>().join(" + ");
    let expected = (1..terms).fold("(Sum 0)".to_string(), |left, term| {
        format!("(Sum {left} + (Sum {term}))")
    });

    let output = ParserEngine::new(&configuration).parse_str("Sum", &text).unwrap();
    assert_eq!(output.root.to_string(), expected);
    assert_eq!(output.stats.tokens_consumed, terms * 2 - 1);
    assert!(output.stats.ambiguities_resolved > 0);
}
