//! End-to-end scenarios exercising the engine through the public surface:
//! context-sensitive matching, cached longest-match tokenization, and
//! left-associative folding, each driven the way a grammar would drive
//! them.

use std::sync::Arc;
use thicket::parsers::{
    Bindings, LeftAssoc, Literal, Reduce, Repeat, Satisfy, Seq, StackAction,
};
use thicket::tokens::TokenSet;
use thicket::{Parse, Parser, ParserRef};

fn alpha_word<V: thicket::Value>() -> ParserRef<V> {
    Arc::new(Repeat::new(Arc::new(Satisfy::alpha()), 1))
}

/// `seq(learn("id", alpha+), "-", recall("id"))`
fn learn_recall_grammar() -> Seq<()> {
    let bindings = Bindings::new("ids");
    let children: Vec<ParserRef<()>> = vec![
        Arc::new(bindings.learn("id", alpha_word())),
        Arc::new(Literal::new("-")),
        Arc::new(bindings.recall("id")),
    ];
    Seq::new(children)
}

#[test]
fn learn_then_recall_accepts_a_repeated_identifier() {
    let root = learn_recall_grammar();
    let mut parse: Parse<()> = Parse::new("abc-abc");
    assert!(root.parse(&mut parse));
    assert_eq!(parse.pos(), 7);
}

#[test]
fn learn_then_recall_rejects_a_changed_identifier() {
    let root = learn_recall_grammar();
    let mut parse: Parse<()> = Parse::new("abc-abd");
    assert!(!root.parse(&mut parse));
    assert_eq!(parse.pos(), 0);
}

#[test]
fn token_choice_resolves_by_longest_match_with_declaration_tie_break() {
    let bases: Vec<ParserRef<()>> = vec![
        Arc::new(Literal::new("if")),
        Arc::new(Literal::new("iff")),
        alpha_word(),
    ];
    let tokens = TokenSet::new(bases.clone());
    let choice = tokens.token_choice(&[Arc::clone(&bases[1]), Arc::clone(&bases[2])]);

    // "iff" and the word tie at end 3; the earlier declaration wins and is
    // in the caller's target set.
    let mut parse: Parse<()> = Parse::new("iff ");
    assert!(choice.parse(&mut parse));
    assert_eq!(parse.pos(), 3);

    // With a trailing letter the word out-reaches both keywords.
    tokens.flush();
    let mut parse: Parse<()> = Parse::new("iffy ");
    assert!(choice.parse(&mut parse));
    assert_eq!(parse.pos(), 4);
}

#[test]
fn token_parser_fails_when_a_longer_token_owns_the_position() {
    let bases: Vec<ParserRef<()>> = vec![
        Arc::new(Literal::new("if")),
        Arc::new(Literal::new("iff")),
        alpha_word(),
    ];
    let tokens = TokenSet::new(bases.clone());
    let just_if = tokens.token_parser(&bases[0]);

    let mut parse: Parse<()> = Parse::new("iff ");
    assert!(!just_if.parse(&mut parse));
    assert_eq!(parse.pos(), 0);
}

fn digit() -> ParserRef<String> {
    Arc::new(Reduce::new(
        Arc::new(Satisfy::digit()),
        |parse, _items, pos0, _size0| {
            let text = parse.text(pos0, parse.pos()).to_owned();
            parse.push(text);
        },
    ))
}

fn fold() -> StackAction<String> {
    Arc::new(|parse, items, _pos0, _size0| {
        parse.push(format!("({}+{})", items[0], items[1]));
    })
}

#[test]
fn left_assoc_folds_into_a_single_left_leaning_value() {
    let sum = LeftAssoc::new(
        digit(),
        Arc::new(Literal::new("+")),
        digit(),
        false,
        Some(fold()),
    );
    let mut parse: Parse<String> = Parse::new("1+2+3");
    assert!(sum.parse(&mut parse));
    assert!(parse.at_end());
    assert_eq!(parse.into_stack(), vec!["((1+2)+3)".to_owned()]);
}

#[test]
fn left_assoc_with_required_operator_rejects_a_lone_operand() {
    let sum = LeftAssoc::new(
        digit(),
        Arc::new(Literal::new("+")),
        digit(),
        true,
        Some(fold()),
    );
    let mut parse: Parse<String> = Parse::new("1");
    assert!(!sum.parse(&mut parse));
    assert_eq!(parse.pos(), 0);
    assert!(parse.stack().is_empty());
}
