//! Named, typed storage cells on the parse state.
//!
//! A [`ParseCell`] is declared once when the grammar is built and carries a
//! process-unique key, so clones of the handle address the same slot on any
//! parse. The slot itself materializes lazily, on first access, by running
//! the cell's initializer.
//!
//! # Mutation contract
//!
//! Reads go through [`ParseCell::data`]. Writes must happen inside the body
//! of a journaled [`Effect`](crate::Effect), using [`ParseCell::data_mut`],
//! with the returned undo restoring the pre-image. Mutating a cell outside
//! an effect leaves rollback unable to restore it and breaks the engine's
//! restoration guarantee.

use crate::parse::Parse;
use crate::Value;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_KEY: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a cell slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct CellKey(u64);

/// Handle to a named per-parse storage slot of type `T`.
///
/// Cloning shares identity: all clones read and write the same slot. The
/// name is for diagnostics only.
pub struct ParseCell<T> {
    key: CellKey,
    name: Arc<str>,
    init: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T: Send + 'static> ParseCell<T> {
    /// Declare a cell with a diagnostic name and an initializer.
    ///
    /// The initializer runs once per parse, on the first access.
    pub fn new(name: &str, init: impl Fn() -> T + Send + Sync + 'static) -> Self {
        ParseCell {
            key: CellKey(NEXT_KEY.fetch_add(1, Ordering::Relaxed)),
            name: Arc::from(name),
            init: Arc::new(init),
        }
    }

    /// The diagnostic name the cell was declared with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the cell's current value on `parse`, materializing if needed.
    pub fn data<'p, V: Value>(&self, parse: &'p mut Parse<V>) -> &'p T {
        self.slot(parse)
    }

    /// Mutable access to the cell's value on `parse`.
    ///
    /// Only for use inside the body of a journaled effect whose undo
    /// restores the previous value; see the module docs.
    pub fn data_mut<'p, V: Value>(&self, parse: &'p mut Parse<V>) -> &'p mut T {
        self.slot(parse)
    }

    fn slot<'p, V: Value>(&self, parse: &'p mut Parse<V>) -> &'p mut T {
        let slot = parse.cell_slot(self.key, || Box::new((self.init)()) as Box<dyn Any + Send>);
        match slot.downcast_mut::<T>() {
            Some(data) => data,
            None => unreachable!("cell `{}` materialized with a foreign type", self.name),
        }
    }
}

impl<T> Clone for ParseCell<T> {
    fn clone(&self) -> Self {
        ParseCell {
            key: self.key,
            name: Arc::clone(&self.name),
            init: Arc::clone(&self.init),
        }
    }
}

impl<T> fmt::Debug for ParseCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseCell")
            .field("name", &self.name)
            .field("key", &self.key.0)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Effect;

    #[test]
    fn materializes_lazily_and_once() {
        let cell: ParseCell<Vec<u32>> = ParseCell::new("numbers", || vec![42]);
        let mut parse: Parse<()> = Parse::new("");
        assert_eq!(cell.data(&mut parse), &[42]);

        // A second access sees the same slot, not a fresh initialization.
        cell.data_mut(&mut parse).push(7);
        assert_eq!(cell.data(&mut parse), &[42, 7]);
    }

    #[test]
    fn clones_share_identity_but_new_cells_do_not() {
        let cell: ParseCell<u32> = ParseCell::new("counter", || 0);
        let alias = cell.clone();
        let other: ParseCell<u32> = ParseCell::new("counter", || 100);

        let mut parse: Parse<()> = Parse::new("");
        *cell.data_mut(&mut parse) = 5;
        assert_eq!(*alias.data(&mut parse), 5);
        assert_eq!(*other.data(&mut parse), 100);
    }

    #[test]
    fn journaled_mutation_rolls_back() {
        let cell: ParseCell<u32> = ParseCell::new("counter", || 1);
        let mut parse: Parse<()> = Parse::new("");
        let log0 = parse.log_len();

        let target = cell.clone();
        parse.apply(Effect::new(move |p: &mut Parse<()>| {
            let slot = target.data_mut(p);
            let prior = *slot;
            *slot = 99;
            let target = target.clone();
            Box::new(move |p: &mut Parse<()>| *target.data_mut(p) = prior)
        }));
        assert_eq!(*cell.data(&mut parse), 99);

        parse.rollback(log0);
        assert_eq!(*cell.data(&mut parse), 1);
    }
}
