//! End-to-end LR parsing of the left-recursive expression grammar

use std::collections::HashMap;

use dent::combinators::{char_if, literal, rep1, set_kind};
use dent::lr::driver::{build_lr_parsers, LrParsers};
use dent::lr::grammar::{Grammar, GrammarBuilder};
use dent::lr::terminals::{or_terminal_parsers, terminal};
use dent::position::{Position, Span};
use dent::text::model::TextModel;
use dent::tree::{collect, text_of, NodeKind, ResultTree};

fn grammar() -> Grammar {
    let mut b = GrammarBuilder::new();
    b.rule("E", &["E", "+", "T"]);
    b.rule("E", &["T"]);
    b.rule("T", &["num"]);
    b.build("E")
}

fn parsers(invalid: Option<&'static str>) -> LrParsers<(), &'static str> {
    let g = grammar();
    let num = g.symbol("num").unwrap();
    let plus = g.symbol("+").unwrap();
    let e = g.symbol("E").unwrap();
    let t = g.symbol("T").unwrap();
    let readers = or_terminal_parsers(vec![
        terminal(
            num,
            set_kind(
                rep1(vec![char_if(|c: char| c.is_ascii_digit())]),
                NodeKind::Labeled("num"),
            ),
        ),
        terminal(plus, literal("+", NodeKind::Labeled("+"))),
    ]);
    build_lr_parsers(&g, HashMap::from([(e, "E"), (t, "T")]), readers, invalid)
}

fn span(a: (usize, usize), b: (usize, usize)) -> Span {
    Span::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
}

fn labels_of(children: &[ResultTree<&'static str>]) -> Vec<&'static str> {
    children.iter().filter_map(|c| c.label().copied()).collect()
}

#[test]
fn test_single_number() {
    let lr = parsers(None);
    let model = TextModel::of("1");
    let out = lr.maximum_valid.parse((), &model, 0, 0).unwrap();
    assert_eq!(out.tree.kind, NodeKind::Labeled("E"));
    assert_eq!(out.tree.span, span((0, 0), (0, 1)));
    assert!(lr.conflicts.is_empty());
}

#[test]
fn test_left_associative_shape() {
    let lr = parsers(None);
    let model = TextModel::of("1+2+3");
    let out = lr.maximum_valid.parse((), &model, 0, 0).unwrap();

    // E = [E, +, T], recursively E = [E, +, T]
    assert_eq!(out.tree.kind, NodeKind::Labeled("E"));
    assert_eq!(labels_of(&out.tree.children), ["E", "+", "T"]);
    let inner = &out.tree.children[0];
    assert_eq!(labels_of(&inner.children), ["E", "+", "T"]);

    let leaves = collect(&out.tree, &|l| *l == "num");
    let texts: Vec<String> = leaves.iter().map(|n| text_of(&model, n)).collect();
    assert_eq!(texts, ["1", "2", "3"]);
}

#[test]
fn test_multi_digit_numbers() {
    let lr = parsers(None);
    let model = TextModel::of("12+345");
    let out = lr.maximum_valid.parse((), &model, 0, 0).unwrap();
    assert_eq!(out.tree.span, span((0, 0), (0, 6)));
    let leaves = collect(&out.tree, &|l| *l == "num");
    assert_eq!(leaves[1].span, span((0, 3), (0, 6)));
}

#[test]
fn test_maximum_valid_restarts_from_last_valid_prefix() {
    let lr = parsers(Some("invalid"));
    let model = TextModel::of("1+2+");
    let out = lr.maximum_valid.parse((), &model, 0, 0).unwrap();

    // the restart reparses "1+2", the longest accepted prefix
    assert_eq!(out.tree.kind, NodeKind::Labeled("E"));
    assert_eq!(out.tree.span, span((0, 0), (0, 3)));

    // and it agrees with the non-restarting parser on the truncated input
    let truncated = TextModel::of("1+2");
    let reference = lr.maximum_invalid.parse((), &truncated, 0, 0).unwrap();
    assert_eq!(out.tree, reference.tree);
}

#[test]
fn test_maximum_invalid_covers_the_whole_input() {
    let lr = parsers(Some("invalid"));
    let model = TextModel::of("1+2+");
    let out = lr.maximum_invalid.parse((), &model, 0, 0).unwrap();
    assert_eq!(out.tree.kind, NodeKind::Labeled("invalid"));
    assert_eq!(out.tree.span, span((0, 0), (0, 4)));
    assert_eq!(labels_of(&out.tree.children), ["E", "+"]);
}

#[test]
fn test_failure_without_invalid_label_is_plain() {
    let lr = parsers(None);
    // nothing valid was ever accepted, so there is no prefix to restart on
    let model = TextModel::of("zzz");
    assert!(lr.maximum_valid.parse((), &model, 0, 0).is_none());
    assert!(lr.maximum_invalid.parse((), &model, 0, 0).is_none());

    // a valid prefix still lets maximum-valid answer
    let model = TextModel::of("1+2+");
    assert!(lr.maximum_valid.parse((), &model, 0, 0).is_some());
    assert!(lr.maximum_invalid.parse((), &model, 0, 0).is_none());
}

#[test]
fn test_conflicted_grammar_reports_and_stays_callable() {
    let mut b = GrammarBuilder::new();
    b.rule("E", &["E", "+", "E"]);
    b.rule("E", &["num"]);
    let g = b.build("E");
    let num = g.symbol("num").unwrap();
    let plus = g.symbol("+").unwrap();
    let e = g.symbol("E").unwrap();
    let readers = or_terminal_parsers(vec![
        terminal(
            num,
            set_kind(
                rep1(vec![char_if(|c: char| c.is_ascii_digit())]),
                NodeKind::Labeled("num"),
            ),
        ),
        terminal(plus, literal("+", NodeKind::Labeled("+"))),
    ]);
    let lr = build_lr_parsers(&g, HashMap::from([(e, "E")]), readers, Some("invalid"));

    assert!(lr.conflicts.contains(&e));

    // unambiguous inputs still parse
    let model = TextModel::of("1+1");
    let out = lr.maximum_valid.parse((), &model, 0, 0).unwrap();
    assert_eq!(out.tree.kind, NodeKind::Labeled("E"));

    // the conflicted lookahead errors at runtime; maximum-valid falls
    // back to the accepted prefix
    let model = TextModel::of("1+1+1");
    let out = lr.maximum_valid.parse((), &model, 0, 0).unwrap();
    assert_eq!(out.tree.span, span((0, 0), (0, 3)));
}
