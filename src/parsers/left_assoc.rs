//! Left-associative binary expressions without left recursion.

use crate::parse::Parse;
use crate::parser::{Parser, ParserRef, Visitor};
use crate::parsers::StackAction;
use crate::Value;
use std::fmt;
use std::sync::Arc;

/// Matches `left (operator right)*`, folding as it goes.
///
/// After each successful `right`, the optional `step` action receives the
/// stack values pushed since entry (drained off the stack) together with
/// the entry position and entry stack size. Pushing one combined value back
/// builds a left-leaning tree iteratively, which a recursive grammar for
/// the same shape cannot do without right-associating.
///
/// When `operator_required` is set, a lone `left` with no operator is a
/// failure.
///
/// An operator with no `right` after it is not consumed: each
/// `operator right` round is speculated as a unit and unwound if `right`
/// fails.
pub struct LeftAssoc<V> {
    left: ParserRef<V>,
    operator: ParserRef<V>,
    right: ParserRef<V>,
    operator_required: bool,
    step: Option<StackAction<V>>,
}

impl<V: Value> LeftAssoc<V> {
    pub fn new(
        left: ParserRef<V>,
        operator: ParserRef<V>,
        right: ParserRef<V>,
        operator_required: bool,
        step: Option<StackAction<V>>,
    ) -> Self {
        LeftAssoc {
            left,
            operator,
            right,
            operator_required,
            step,
        }
    }
}

impl<V: Value> Parser<V> for LeftAssoc<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        let pos0 = parse.pos();
        let size0 = parse.stack_len();

        if !self.left.parse(parse) {
            return false;
        }

        let mut count = 0;
        loop {
            let mark_pos = parse.pos();
            let mark_log = parse.log_len();
            if !self.operator.parse(parse) {
                break;
            }
            if !self.right.parse(parse) {
                parse.rollback(mark_log);
                parse.set_pos(mark_pos);
                break;
            }
            count += 1;
            if let Some(step) = &self.step {
                let items = parse.pop_from(size0);
                step(parse, items, pos0, size0);
            }
        }

        count > 0 || !self.operator_required
    }

    /// Order: left, operator, right.
    fn children(&self) -> Vec<ParserRef<V>> {
        vec![
            Arc::clone(&self.left),
            Arc::clone(&self.operator),
            Arc::clone(&self.right),
        ]
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_left_assoc(self);
    }
}

impl<V: fmt::Debug> fmt::Debug for LeftAssoc<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeftAssoc")
            .field("left", &self.left)
            .field("operator", &self.operator)
            .field("right", &self.right)
            .field("operator_required", &self.operator_required)
            .finish()
    }
}
