//! Reversible side effects and the journal entry type.
//!
//! An [`Effect`] is a mutation of the parse state paired with the ability to
//! produce, at apply time, a thunk that exactly reverses it. The parse
//! journal stores `(effect, undo)` pairs: rollback runs the undo halves in
//! reverse order, while the effect halves stay replayable so the token
//! cache can detach a [`Delta`] and re-apply it at a later visit to the same
//! input position.
//!
//! Undo thunks must be pure with respect to the values they captured when
//! the effect was applied, and must not journal further effects.

use crate::parse::Parse;
use crate::Value;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// A thunk that reverses one applied [`Effect`].
///
/// Created fresh on every application, capturing whatever pre-images the
/// reversal needs. Consumed exactly once, by [`Parse::rollback`].
pub type UndoFn<V> = Box<dyn FnOnce(&mut Parse<V>) + Send>;

/// A detached, replayable run of journal effects.
///
/// Produced by [`Parse::delta`]; re-applying each element in order through
/// [`Parse::apply`] reproduces the original mutations. Most deltas are a
/// handful of entries, hence the inline capacity.
pub type Delta<V> = SmallVec<[Effect<V>; 4]>;

/// A reversible mutation of the parse state.
///
/// The closure performs the mutation and returns the undo thunk. It may run
/// more than once: once when first applied, and again each time a cached
/// token delta containing it is replayed. Cloning is cheap (shared
/// reference).
pub struct Effect<V> {
    run: Arc<dyn Fn(&mut Parse<V>) -> UndoFn<V> + Send + Sync>,
}

impl<V: Value> Effect<V> {
    /// Wrap a mutation closure.
    ///
    /// The closure must capture everything it needs by value; it can be
    /// invoked on any parse that is in a state equivalent to the one it was
    /// first applied in.
    pub fn new(run: impl Fn(&mut Parse<V>) -> UndoFn<V> + Send + Sync + 'static) -> Self {
        Effect { run: Arc::new(run) }
    }

    /// Perform the mutation, returning the thunk that reverses it.
    pub(crate) fn call(&self, parse: &mut Parse<V>) -> UndoFn<V> {
        (self.run)(parse)
    }
}

impl<V> Clone for Effect<V> {
    fn clone(&self) -> Self {
        Effect {
            run: Arc::clone(&self.run),
        }
    }
}

impl<V> fmt::Debug for Effect<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Effect")
    }
}

/// One journal entry: an applied effect and its pending undo.
pub(crate) struct Applied<V> {
    pub(crate) effect: Effect<V>,
    pub(crate) undo: UndoFn<V>,
}

impl<V> fmt::Debug for Applied<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Applied")
    }
}
