//! The shipped parser types.
//!
//! Leaves advance the cursor; composites combine children through the
//! speculative [`Parser::parse`](crate::Parser::parse) contract and never
//! move the cursor themselves. Everything here is a plain immutable struct
//! wrapped in an `Arc` at grammar build time.

mod bind;
mod combine;
mod leaf;
mod left_assoc;
mod reduce;

pub use bind::{Bindings, Learn, Recall};
pub use combine::{Choice, Not, Opt, Peek, Recursive, Repeat, Seq};
pub use leaf::{Literal, Satisfy};
pub use left_assoc::LeftAssoc;
pub use reduce::{Reduce, StackAction};
