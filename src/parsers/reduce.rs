//! Stack actions: turning matched input into values.
//!
//! A [`Reduce`] wraps a child parser. When the child succeeds, the values
//! it pushed beyond the entry stack size are drained off and handed to the
//! action along with the entry position, and the action typically pushes a
//! single combined value back. Both the drain and any pushes are journaled,
//! so a later rollback past the reduction restores the stack exactly.

use crate::parse::Parse;
use crate::parser::{Parser, ParserRef, Visitor};
use crate::Value;
use std::fmt;
use std::sync::Arc;

/// A callback fed the drained stack tail.
///
/// Arguments: the parse state, the values pushed beyond the entry stack
/// size (oldest first, already removed from the stack), the cursor position
/// at entry, and the stack size at entry.
pub type StackAction<V> = Arc<dyn Fn(&mut Parse<V>, Vec<V>, usize, usize) + Send + Sync>;

/// Runs a stack action after its child succeeds.
pub struct Reduce<V> {
    child: ParserRef<V>,
    action: StackAction<V>,
}

impl<V: Value> Reduce<V> {
    pub fn new(
        child: ParserRef<V>,
        action: impl Fn(&mut Parse<V>, Vec<V>, usize, usize) + Send + Sync + 'static,
    ) -> Self {
        Reduce {
            child,
            action: Arc::new(action),
        }
    }
}

impl<V: Value> Parser<V> for Reduce<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        let pos0 = parse.pos();
        let size0 = parse.stack_len();
        if !self.child.parse(parse) {
            return false;
        }
        let items = parse.pop_from(size0);
        (self.action)(parse, items, pos0, size0);
        true
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        vec![Arc::clone(&self.child)]
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_reduce(self);
    }
}

impl<V: fmt::Debug> fmt::Debug for Reduce<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reduce").field("child", &self.child).finish()
    }
}
