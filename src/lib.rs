//! Backtracking parser-combinator runtime with journaled side effects.
//!
//! Three pieces fit together around a shared mutable [`Parse`] state:
//!
//! - **The engine contract.** Every parser implements [`Parser`]: attempt a
//!   match at the current cursor, and either advance (journaling any side
//!   effects) or restore the state exactly as it was. Restoration is driven
//!   by the journal, an ordered log of reversible [`Effect`]s that is rolled
//!   back in reverse order whenever an alternative is abandoned.
//! - **Context-sensitive matching.** [`ParseCell`]s are named, typed storage
//!   slots on the parse state, mutated only through journaled effects, so
//!   speculative bindings (see [`parsers::Bindings`]) unwind for free.
//! - **Cached tokenization.** A [`tokens::TokenSet`] resolves a fixed array
//!   of base parsers by longest match at each input offset and memoizes the
//!   result (winner, end position, detached effect list) in an
//!   open-addressed position cache, so many parsers probing the same offset
//!   pay for tokenization once.
//!
//! # Example
//!
//! A grammar that matches an identifier, a dash, then *the same* identifier
//! again, which no context-free grammar can express:
//!
//! ```
//! use std::sync::Arc;
//! use thicket::{Parse, Parser, ParserRef};
//! use thicket::parsers::{Bindings, Literal, Repeat, Satisfy, Seq};
//!
//! let ident: ParserRef<()> = Arc::new(Repeat::new(Arc::new(Satisfy::alpha()), 1));
//! let bindings = Bindings::new("ids");
//! let children: Vec<ParserRef<()>> = vec![
//!     Arc::new(bindings.learn("id", Arc::clone(&ident))),
//!     Arc::new(Literal::new("-")),
//!     Arc::new(bindings.recall("id")),
//! ];
//! let root = Seq::new(children);
//!
//! let mut parse = Parse::new("abc-abc");
//! assert!(root.parse(&mut parse));
//! assert_eq!(parse.pos(), 7);
//!
//! let mut parse = Parse::new("abc-abd");
//! assert!(!root.parse(&mut parse));
//! assert_eq!(parse.pos(), 0);
//! ```
//!
//! # Failure semantics
//!
//! Match failure is an ordinary `false` return, never a panic and never an
//! error value. Contract violations (recalling an unbound key, wrapping a
//! parser that is not part of a token set, parsing an undefined
//! [`parsers::Recursive`]) are programming errors and panic; each is
//! documented under `# Panics` on the method that raises it.
//!
//! # Sharing
//!
//! Parsers are immutable after construction and may be shared across parses
//! and threads. A [`Parse`] belongs to exactly one parse attempt. A
//! [`tokens::TokenSet`] owns a cache keyed by input position and is bound to
//! one parse at a time; call [`tokens::TokenSet::flush`] before reusing it.

mod cell;
mod effect;
mod parse;
mod parser;
pub mod parsers;
mod stack_guard;
pub mod tokens;

pub use cell::ParseCell;
pub use effect::{Delta, Effect, UndoFn};
pub use parse::Parse;
pub use parser::{walk, Parser, ParserRef, Visitor};

use std::fmt;

/// Bound on the values a parse stack can hold.
///
/// Stack mutation is journaled so that rollback can restore it, which
/// requires cloning pushed values into replayable effects, and token caches
/// holding captured effects are shareable, which requires `Send + Sync`.
/// Implemented automatically for every eligible type.
pub trait Value: Clone + Send + Sync + fmt::Debug + 'static {}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> Value for T {}
