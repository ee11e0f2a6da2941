//! The polymorphic parser protocol.
//!
//! Every parser, leaf or composite, implements [`Parser`]. The protocol has
//! one load-bearing rule: **failure is inert**. A parser that returns
//! `false` from [`Parser::parse`] must leave the cursor, the journal, the
//! stack, and every cell exactly as they were at entry. Composites rely on
//! this to try alternatives without any defensive snapshotting of their
//! own.
//!
//! The rule is enforced structurally: implementors write [`Parser::run`],
//! the raw match attempt, which is free to leave the state dirty on
//! failure. The provided [`Parser::parse`] wraps it with the speculation
//! discipline, recording `(pos, journal length)` at entry and restoring
//! both when `run` reports failure. Because stack and cell mutation are
//! journaled, one rollback restores everything.
//!
//! [`Visitor`] is the double-dispatch hook for grammar analysis; [`walk`]
//! drives it over a parser graph, tolerating the cycles that recursive
//! grammars create.

use crate::parse::Parse;
use crate::parsers::{
    Choice, LeftAssoc, Learn, Literal, Not, Opt, Peek, Recall, Recursive, Reduce, Repeat, Satisfy,
    Seq,
};
use crate::tokens::{TokenChoice, TokenParser};
use crate::{stack_guard, Value};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;

/// A shared, immutable parser node.
///
/// Parsers form (possibly cyclic) graphs and may be shared across parses
/// and threads.
pub type ParserRef<V> = Arc<dyn Parser<V>>;

/// The uniform speculative-matching contract.
pub trait Parser<V: Value>: fmt::Debug + Send + Sync {
    /// The raw match attempt.
    ///
    /// On success, advance the cursor past the match and journal any side
    /// effects. On failure, the state may be left dirty; [`Parser::parse`]
    /// cleans up. Implementors that speculate internally (trying one
    /// alternative, then another) must restore between attempts themselves,
    /// which calling children through their `parse` method does for free.
    fn run(&self, parse: &mut Parse<V>) -> bool;

    /// Attempt a match at the current position.
    ///
    /// Returns `true` with the cursor advanced and effects journaled, or
    /// `false` with the state restored to its value at entry. Do not
    /// override; implement [`Parser::run`].
    fn parse(&self, parse: &mut Parse<V>) -> bool {
        let pos0 = parse.pos();
        let log0 = parse.log_len();
        let size0 = parse.stack_len();
        let matched = stack_guard::ensure_sufficient_stack(|| self.run(parse));
        if !matched {
            parse.rollback(log0);
            parse.set_pos(pos0);
            debug_assert_eq!(
                parse.stack_len(),
                size0,
                "child left unjournaled stack values behind on failure"
            );
        }
        matched
    }

    /// The ordered child parsers, for traversal.
    fn children(&self) -> Vec<ParserRef<V>>;

    /// Dispatch to the matching [`Visitor`] method.
    fn accept(&self, visitor: &mut dyn Visitor<V>);
}

/// Double-dispatch receiver for grammar analysis.
///
/// One method per shipped parser type, each defaulting to
/// [`Visitor::visit_default`], so a visitor only overrides the cases it
/// cares about.
pub trait Visitor<V: Value> {
    /// Fallback for parser types the visitor does not handle specially.
    fn visit_default(&mut self, parser: &dyn Parser<V>);

    fn visit_satisfy(&mut self, parser: &Satisfy) {
        self.visit_default(parser);
    }

    fn visit_literal(&mut self, parser: &Literal) {
        self.visit_default(parser);
    }

    fn visit_seq(&mut self, parser: &Seq<V>) {
        self.visit_default(parser);
    }

    fn visit_choice(&mut self, parser: &Choice<V>) {
        self.visit_default(parser);
    }

    fn visit_repeat(&mut self, parser: &Repeat<V>) {
        self.visit_default(parser);
    }

    fn visit_opt(&mut self, parser: &Opt<V>) {
        self.visit_default(parser);
    }

    fn visit_peek(&mut self, parser: &Peek<V>) {
        self.visit_default(parser);
    }

    fn visit_not(&mut self, parser: &Not<V>) {
        self.visit_default(parser);
    }

    fn visit_recursive(&mut self, parser: &Recursive<V>) {
        self.visit_default(parser);
    }

    fn visit_reduce(&mut self, parser: &Reduce<V>) {
        self.visit_default(parser);
    }

    fn visit_learn(&mut self, parser: &Learn<V>) {
        self.visit_default(parser);
    }

    fn visit_recall(&mut self, parser: &Recall) {
        self.visit_default(parser);
    }

    fn visit_left_assoc(&mut self, parser: &LeftAssoc<V>) {
        self.visit_default(parser);
    }

    fn visit_token_parser(&mut self, parser: &TokenParser<V>) {
        self.visit_default(parser);
    }

    fn visit_token_choice(&mut self, parser: &TokenChoice<V>) {
        self.visit_default(parser);
    }
}

/// Visit every parser reachable from `root` exactly once.
///
/// Cycle-safe: nodes are deduplicated by pointer identity, so recursive
/// grammars terminate. Visit order is unspecified beyond starting at
/// `root`.
pub fn walk<V: Value>(root: &ParserRef<V>, visitor: &mut dyn Visitor<V>) {
    let mut seen: FxHashSet<*const ()> = FxHashSet::default();
    let mut pending: Vec<ParserRef<V>> = vec![Arc::clone(root)];
    while let Some(parser) = pending.pop() {
        if !seen.insert(Arc::as_ptr(&parser).cast::<()>()) {
            continue;
        }
        parser.accept(visitor);
        pending.extend(parser.children());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{Literal, Satisfy, Seq};

    #[derive(Default)]
    struct Census {
        literals: usize,
        total: usize,
    }

    impl<V: Value> Visitor<V> for Census {
        fn visit_default(&mut self, _parser: &dyn Parser<V>) {
            self.total += 1;
        }

        fn visit_literal(&mut self, parser: &Literal) {
            self.literals += 1;
            <Census as Visitor<V>>::visit_default(self, parser);
        }
    }

    #[test]
    fn walk_visits_each_node_once() {
        let shared: ParserRef<()> = Arc::new(Literal::new("x"));
        let children: Vec<ParserRef<()>> = vec![
            Arc::clone(&shared),
            Arc::clone(&shared),
            Arc::new(Satisfy::alpha()),
        ];
        let root: ParserRef<()> = Arc::new(Seq::new(children));

        let mut census = Census::default();
        walk(&root, &mut census);
        // Root, the shared literal (once), and the predicate.
        assert_eq!(census.total, 3);
        assert_eq!(census.literals, 1);
    }

    #[test]
    fn walk_terminates_on_cycles() {
        let rule = Recursive::<()>::declare();
        let body: Vec<ParserRef<()>> = vec![Arc::new(Literal::new("(")), rule.clone()];
        rule.define(Arc::new(Seq::new(body)));

        let root: ParserRef<()> = rule;
        let mut census = Census::default();
        walk(&root, &mut census);
        assert_eq!(census.total, 3);
    }
}
