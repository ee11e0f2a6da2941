//! The mutable state of one parse attempt.
//!
//! A [`Parse`] bundles the input text, the byte cursor, the value stack,
//! the journal of applied side effects, and lazily materialized cell
//! storage. Parsers speculate freely against it: the journal makes every
//! mutation reversible, so abandoning an alternative is a matter of rolling
//! back to a recorded journal length and restoring the cursor.
//!
//! # Journaled stack
//!
//! Stack mutation goes through the journal. [`Parse::push`] and
//! [`Parse::pop_from`] record replayable effects, which buys two things at
//! once: rollback restores the stack without any parser-side bookkeeping,
//! and token deltas captured by the cache reproduce stack pushes when they
//! are replayed at a cached position.

use crate::cell::CellKey;
use crate::effect::{Applied, Delta, Effect};
use crate::Value;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt;

/// Shared mutable parse state: input, cursor, value stack, journal, cells.
///
/// `V` is the caller's stack value type. One `Parse` serves exactly one
/// parse attempt; create a fresh one per input.
pub struct Parse<V> {
    input: Box<str>,
    pos: usize,
    stack: Vec<V>,
    log: Vec<Applied<V>>,
    cells: FxHashMap<CellKey, Box<dyn Any + Send>>,
}

impl<V: Value> Parse<V> {
    /// Create a parse state positioned at the start of `input`.
    pub fn new(input: impl Into<Box<str>>) -> Self {
        Parse {
            input: input.into(),
            pos: 0,
            stack: Vec::new(),
            log: Vec::new(),
            cells: FxHashMap::default(),
        }
    }

    // --- Input & cursor ---

    /// The full input text.
    #[inline]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Current cursor position, a byte offset into the input.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor to an absolute position.
    ///
    /// Used by parsers restoring a snapshot after speculation and by token
    /// replay jumping to a cached end position.
    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(
            pos <= self.input.len(),
            "cursor position {pos} out of bounds (input length {})",
            self.input.len()
        );
        self.pos = pos;
    }

    /// Advance the cursor by `n` bytes.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.set_pos(self.pos + n);
    }

    /// Whether the cursor has consumed the whole input.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    /// The character starting at byte offset `pos`, if any.
    ///
    /// Returns `None` at the end of input or when `pos` is not a character
    /// boundary.
    #[inline]
    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.input.get(pos..).and_then(|rest| rest.chars().next())
    }

    /// Whether the input at byte offset `pos` starts with `text`.
    #[inline]
    pub fn matches_at(&self, pos: usize, text: &str) -> bool {
        self.input
            .as_bytes()
            .get(pos..pos + text.len())
            .is_some_and(|window| window == text.as_bytes())
    }

    /// The input slice between two byte offsets.
    ///
    /// # Panics
    ///
    /// Panics if the offsets are out of bounds or not character boundaries.
    #[inline]
    pub fn text(&self, from: usize, to: usize) -> &str {
        &self.input[from..to]
    }

    // --- Value stack ---

    /// The values pushed so far, oldest first.
    #[inline]
    pub fn stack(&self) -> &[V] {
        &self.stack
    }

    /// Number of values on the stack.
    #[inline]
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Push a value, journaling the push so rollback removes it.
    pub fn push(&mut self, value: V) {
        self.apply(Effect::new(move |p: &mut Parse<V>| {
            p.stack.push(value.clone());
            Box::new(|p: &mut Parse<V>| {
                p.stack.pop();
            })
        }));
    }

    /// Remove and return every value past index `from`, oldest first.
    ///
    /// The removal is journaled: rollback restores the drained values, and
    /// a captured delta repeats the truncation on replay.
    pub fn pop_from(&mut self, from: usize) -> Vec<V> {
        debug_assert!(
            from <= self.stack.len(),
            "drain index {from} past stack length {}",
            self.stack.len()
        );
        let removed = self.stack.split_off(from);
        let restored = removed.clone();
        let effect = Effect::new(move |p: &mut Parse<V>| {
            let removed = p.stack.split_off(from);
            Box::new(move |p: &mut Parse<V>| p.stack.extend(removed))
        });
        self.log.push(Applied {
            effect,
            undo: Box::new(move |p: &mut Parse<V>| p.stack.extend(restored)),
        });
        removed
    }

    /// Consume the parse, returning the final stack contents.
    pub fn into_stack(self) -> Vec<V> {
        self.stack
    }

    // --- Journal ---

    /// Number of journal entries so far. Record this before speculating.
    #[inline]
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Apply an effect now and journal its undo.
    pub fn apply(&mut self, effect: Effect<V>) {
        let undo = effect.call(self);
        self.log.push(Applied { effect, undo });
    }

    /// Undo every journal entry past `to`, newest first.
    ///
    /// After the call the journal has length `to` and all reversed
    /// mutations (stack, cells) are restored. The cursor is not touched;
    /// callers restore it from their own snapshot.
    pub fn rollback(&mut self, to: usize) {
        debug_assert!(
            to <= self.log.len(),
            "rollback target {to} past journal length {}",
            self.log.len()
        );
        while self.log.len() > to {
            let Some(entry) = self.log.pop() else { break };
            let remaining = self.log.len();
            (entry.undo)(self);
            debug_assert_eq!(
                self.log.len(),
                remaining,
                "undo thunks must not journal new effects"
            );
        }
    }

    /// Detach the effects journaled since `from`, in application order.
    ///
    /// Replaying the result through [`Parse::apply`] on an equivalent state
    /// reproduces the mutations; the token cache relies on this.
    pub fn delta(&self, from: usize) -> Delta<V> {
        self.log[from..].iter().map(|a| a.effect.clone()).collect()
    }

    // --- Cells ---

    /// Storage slot for a cell, materialized on first access.
    pub(crate) fn cell_slot(
        &mut self,
        key: CellKey,
        init: impl FnOnce() -> Box<dyn Any + Send>,
    ) -> &mut (dyn Any + Send) {
        self.cells.entry(key).or_insert_with(init).as_mut()
    }
}

impl<V: fmt::Debug> fmt::Debug for Parse<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parse")
            .field("pos", &self.pos)
            .field("stack", &self.stack)
            .field("log_len", &self.log.len())
            .field("cells", &self.cells.len())
            .finish()
    }
}
