//! Context-sensitive matching: learn a string, require it again later.
//!
//! A [`Bindings`] store is a map cell on the parse state. [`Learn`] wraps a
//! child parser and, on success, journals an effect binding a key to the
//! text the child consumed; the undo restores whatever binding (or absence)
//! it replaced. [`Recall`] matches exactly the bound text. Because the
//! binding lives in the journal, abandoning a speculative branch past a
//! `Learn` restores the previous binding with no extra machinery.

use crate::cell::ParseCell;
use crate::effect::Effect;
use crate::parse::Parse;
use crate::parser::{Parser, ParserRef, Visitor};
use crate::Value;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A named store of learned strings, backed by a map cell.
///
/// Clones share the store. One grammar typically declares one `Bindings`
/// and derives all its `Learn` / `Recall` parsers from it.
#[derive(Clone, Debug)]
pub struct Bindings {
    cell: ParseCell<FxHashMap<String, String>>,
}

impl Bindings {
    /// Create a store; the name is for diagnostics only.
    pub fn new(name: &str) -> Self {
        Bindings {
            cell: ParseCell::new(name, FxHashMap::default),
        }
    }

    /// Wrap `child` so that its matched text is bound to `key` on success.
    pub fn learn<V: Value>(&self, key: &str, child: ParserRef<V>) -> Learn<V> {
        Learn {
            key: key.to_owned(),
            child,
            cell: self.cell.clone(),
        }
    }

    /// A parser matching exactly the text currently bound to `key`.
    pub fn recall(&self, key: &str) -> Recall {
        Recall {
            key: key.to_owned(),
            cell: self.cell.clone(),
        }
    }
}

/// Binds the text matched by its child to a key in the store.
pub struct Learn<V> {
    key: String,
    child: ParserRef<V>,
    cell: ParseCell<FxHashMap<String, String>>,
}

impl<V: Value> Parser<V> for Learn<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        let pos0 = parse.pos();
        if !self.child.parse(parse) {
            return false;
        }
        let text = parse.text(pos0, parse.pos()).to_owned();
        let key = self.key.clone();
        let cell = self.cell.clone();
        parse.apply(Effect::new(move |p: &mut Parse<V>| {
            let prior = cell.data_mut(p).insert(key.clone(), text.clone());
            let cell = cell.clone();
            let key = key.clone();
            Box::new(move |p: &mut Parse<V>| {
                let map = cell.data_mut(p);
                match prior {
                    Some(value) => {
                        map.insert(key, value);
                    }
                    None => {
                        map.remove(&key);
                    }
                }
            })
        }));
        true
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        vec![Arc::clone(&self.child)]
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_learn(self);
    }
}

impl<V: fmt::Debug> fmt::Debug for Learn<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Learn")
            .field("key", &self.key)
            .field("child", &self.child)
            .finish()
    }
}

/// Matches exactly the text currently bound to a key.
///
/// Journals nothing: a successful recall only advances the cursor.
#[derive(Debug)]
pub struct Recall {
    key: String,
    cell: ParseCell<FxHashMap<String, String>>,
}

impl<V: Value> Parser<V> for Recall {
    /// # Panics
    ///
    /// Panics if nothing has been learned under the key. Recalling before
    /// learning is a grammar bug, not a match failure.
    fn run(&self, parse: &mut Parse<V>) -> bool {
        let bound = self.cell.data(parse).get(&self.key).cloned();
        let Some(text) = bound else {
            panic!(
                "no learned text for key `{}` in bindings `{}`",
                self.key,
                self.cell.name()
            );
        };
        if parse.matches_at(parse.pos(), &text) {
            parse.advance(text.len());
            true
        } else {
            false
        }
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        Vec::new()
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_recall(self);
    }
}
