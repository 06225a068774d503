use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tomita::engine::AmbiguityNode;
use tomita::{Expr, Grammar, GrammarBuilder, ParserConfiguration, ParserEngine, Scanner};

fn expression_grammar() -> Grammar {
    GrammarBuilder::new()
        .start("Expr")
        .rule("Expr", Expr::seq([Expr::rule("Expr"), Expr::literal("+"), Expr::rule("Term")]))
        .rule("Expr", Expr::rule("Term"))
        .rule("Term", Expr::seq([Expr::rule("Term"), Expr::literal("*"), Expr::rule("Factor")]))
        .rule("Term", Expr::rule("Factor"))
        .rule(
            "Factor",
            Expr::integer()
                | Expr::identifier()
                | Expr::seq([Expr::literal("("), Expr::rule("Expr"), Expr::literal(")")]),
        )
        .build()
        .unwrap()
}

fn expression_text(terms: usize) -> String {
    (0..terms)
        .map(|n| {
            if n % 3 == 0 {
                format!("({n} + x{n})")
            } else {
                n.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" * 2 + ")
}

fn bench_table_generation(c: &mut Criterion) {
    let grammar = expression_grammar();
    c.bench_function("table_generation_expr", |b| {
        b.iter(|| black_box(ParserConfiguration::build(black_box(&grammar)).unwrap()));
    });
}

fn bench_scanner(c: &mut Criterion) {
    let configuration = ParserConfiguration::build(&expression_grammar()).unwrap();
    let text = expression_text(500);
    c.bench_function("scanner_expr_500", |b| {
        b.iter(|| {
            black_box(
                Scanner::new(black_box(&text), configuration.tokens())
                    .tokenize()
                    .unwrap(),
            )
        });
    });
}

fn bench_deterministic_parse(c: &mut Criterion) {
    let configuration = ParserConfiguration::build(&expression_grammar()).unwrap();
    let engine = ParserEngine::new(&configuration);
    let mut group = c.benchmark_group("parse_expr");
    for terms in [10, 100, 1000] {
        let text = expression_text(terms);
        group.bench_with_input(BenchmarkId::from_parameter(terms), &text, |b, text| {
            b.iter(|| black_box(engine.parse_str("Expr", black_box(text)).unwrap()));
        });
    }
    group.finish();
}

fn bench_ambiguous_parse(c: &mut Criterion) {
    let grammar = GrammarBuilder::new()
        .start("Sum")
        .rule("Sum", Expr::seq([Expr::rule("Sum"), Expr::literal("+"), Expr::rule("Sum")]))
        .rule("Sum", Expr::integer())
        .build()
        .unwrap();
    let configuration = ParserConfiguration::build(&grammar).unwrap();
    let engine = ParserEngine::new(&configuration);
    let mut group = c.benchmark_group("parse_ambiguous_sum");
    for terms in [4, 8, 16] {
        let text = (0..terms).map(|n| n.to_string()).collect::<Vec<_>>().join(" + ");
        group.bench_with_input(BenchmarkId::from_parameter(terms), &text, |b, text| {
            b.iter(|| black_box(engine.parse_str("Sum", black_box(text)).unwrap()));
        });
    }
    group.finish();
}

fn bench_ambiguity_comparison(c: &mut Criterion) {
    fn balanced(depth: usize) -> AmbiguityNode {
        if depth == 0 {
            AmbiguityNode::terminal()
        } else {
            AmbiguityNode::node(vec![balanced(depth - 1), balanced(depth - 1)])
        }
    }

    let left = balanced(12);
    let right = balanced(12);
    c.bench_function("ambiguity_compare_equal_trees", |b| {
        b.iter(|| black_box(black_box(&left).compare(black_box(&right))));
    });
}

criterion_group!(
    benches,
    bench_table_generation,
    bench_scanner,
    bench_deterministic_parse,
    bench_ambiguous_parse,
    bench_ambiguity_comparison
);
criterion_main!(benches);
