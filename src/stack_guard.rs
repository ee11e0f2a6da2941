//! Machine-stack headroom for deeply recursive grammars.
//!
//! Parser graphs recurse through [`Parser::parse`](crate::Parser::parse),
//! so pathological inputs (thousands of nested alternatives) would
//! otherwise overflow the thread stack. The speculation wrapper routes
//! every call through [`ensure_sufficient_stack`], which grows the stack on
//! demand when the remaining headroom drops below the red zone.

/// Remaining stack space below which a new segment is allocated.
const RED_ZONE: usize = 64 * 1024;

/// Size of each additionally allocated stack segment.
const STACK_PER_GROWTH: usize = 1024 * 1024;

/// Run `f`, growing the machine stack first if headroom is low.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_GROWTH, f)
}
