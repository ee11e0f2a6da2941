//! Composite parsers.
//!
//! Composites never move the cursor themselves; they sequence, alternate,
//! and repeat children through [`Parser::parse`], whose contract guarantees
//! that a failed child has already restored the state. The two lookahead
//! forms additionally restore on success, since they only inspect.

use crate::parse::Parse;
use crate::parser::{Parser, ParserRef, Visitor};
use crate::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Matches its children one after another; fails if any child fails.
#[derive(Debug)]
pub struct Seq<V> {
    children: Vec<ParserRef<V>>,
}

impl<V: Value> Seq<V> {
    pub fn new(children: Vec<ParserRef<V>>) -> Self {
        Seq { children }
    }
}

impl<V: Value> Parser<V> for Seq<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        self.children.iter().all(|child| child.parse(parse))
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        self.children.clone()
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_seq(self);
    }
}

/// Matches the first child that succeeds, trying them in order.
#[derive(Debug)]
pub struct Choice<V> {
    children: Vec<ParserRef<V>>,
}

impl<V: Value> Choice<V> {
    pub fn new(children: Vec<ParserRef<V>>) -> Self {
        Choice { children }
    }
}

impl<V: Value> Parser<V> for Choice<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        self.children.iter().any(|child| child.parse(parse))
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        self.children.clone()
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_choice(self);
    }
}

/// Matches the child as many times as possible, greedily.
///
/// Succeeds when at least `min` repetitions matched. A repetition that
/// succeeds without consuming input ends the loop, so a nullable child
/// cannot spin forever.
#[derive(Debug)]
pub struct Repeat<V> {
    child: ParserRef<V>,
    min: usize,
}

impl<V: Value> Repeat<V> {
    pub fn new(child: ParserRef<V>, min: usize) -> Self {
        Repeat { child, min }
    }
}

impl<V: Value> Parser<V> for Repeat<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        let mut count = 0;
        loop {
            let before = parse.pos();
            if !self.child.parse(parse) {
                break;
            }
            count += 1;
            if parse.pos() == before {
                break;
            }
        }
        count >= self.min
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        vec![Arc::clone(&self.child)]
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_repeat(self);
    }
}

/// Matches the child if possible; succeeds either way.
#[derive(Debug)]
pub struct Opt<V> {
    child: ParserRef<V>,
}

impl<V: Value> Opt<V> {
    pub fn new(child: ParserRef<V>) -> Self {
        Opt { child }
    }
}

impl<V: Value> Parser<V> for Opt<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        let _ = self.child.parse(parse);
        true
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        vec![Arc::clone(&self.child)]
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_opt(self);
    }
}

/// Succeeds iff the child matches here, consuming nothing.
#[derive(Debug)]
pub struct Peek<V> {
    child: ParserRef<V>,
}

impl<V: Value> Peek<V> {
    pub fn new(child: ParserRef<V>) -> Self {
        Peek { child }
    }
}

impl<V: Value> Parser<V> for Peek<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        let pos0 = parse.pos();
        let log0 = parse.log_len();
        let matched = self.child.parse(parse);
        if matched {
            parse.rollback(log0);
            parse.set_pos(pos0);
        }
        matched
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        vec![Arc::clone(&self.child)]
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_peek(self);
    }
}

/// Succeeds iff the child does not match here, consuming nothing.
#[derive(Debug)]
pub struct Not<V> {
    child: ParserRef<V>,
}

impl<V: Value> Not<V> {
    pub fn new(child: ParserRef<V>) -> Self {
        Not { child }
    }
}

impl<V: Value> Parser<V> for Not<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        let pos0 = parse.pos();
        let log0 = parse.log_len();
        if self.child.parse(parse) {
            parse.rollback(log0);
            parse.set_pos(pos0);
            false
        } else {
            true
        }
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        vec![Arc::clone(&self.child)]
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_not(self);
    }
}

/// Forward declaration for recursive grammars.
///
/// Grammars are commonly cyclic: an expression contains a parenthesized
/// expression. Declare the node first, wire it into the graph, then
/// [`define`](Recursive::define) it once the body exists.
///
/// ```
/// use std::sync::Arc;
/// use thicket::{Parse, Parser, ParserRef};
/// use thicket::parsers::{Choice, Literal, Recursive, Seq};
///
/// // nested = "()" | "(" nested ")"
/// let nested = Recursive::<()>::declare();
/// let wrapped: Vec<ParserRef<()>> = vec![
///     Arc::new(Literal::new("(")),
///     nested.clone(),
///     Arc::new(Literal::new(")")),
/// ];
/// let body: Vec<ParserRef<()>> = vec![
///     Arc::new(Literal::new("()")),
///     Arc::new(Seq::new(wrapped)),
/// ];
/// nested.define(Arc::new(Choice::new(body)));
///
/// assert!(nested.parse(&mut Parse::new("((()))")));
/// ```
pub struct Recursive<V> {
    target: OnceLock<ParserRef<V>>,
}

impl<V: Value> Recursive<V> {
    /// Create an undefined placeholder.
    pub fn declare() -> Arc<Self> {
        Arc::new(Recursive {
            target: OnceLock::new(),
        })
    }

    /// Resolve the placeholder to its actual parser.
    ///
    /// # Panics
    ///
    /// Panics if the placeholder was already defined.
    pub fn define(&self, parser: ParserRef<V>) {
        if self.target.set(parser).is_err() {
            panic!("recursive parser defined twice");
        }
    }
}

impl<V: Value> Parser<V> for Recursive<V> {
    /// # Panics
    ///
    /// Panics if the placeholder was never defined.
    fn run(&self, parse: &mut Parse<V>) -> bool {
        match self.target.get() {
            Some(target) => target.parse(parse),
            None => panic!("recursive parser used before being defined"),
        }
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        self.target.get().map(Arc::clone).into_iter().collect()
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_recursive(self);
    }
}

// Printing the target would recurse through the cycle the node exists to
// close, so the placeholder renders opaquely.
impl<V> fmt::Debug for Recursive<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.target.get().is_some() {
            "Recursive(defined)"
        } else {
            "Recursive(undefined)"
        })
    }
}
