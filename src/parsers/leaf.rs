//! Leaf matchers: the only parsers that advance the cursor directly.

use crate::parse::Parse;
use crate::parser::{Parser, ParserRef, Visitor};
use crate::Value;
use std::fmt;
use std::sync::Arc;

/// Matches a single character satisfying a predicate.
pub struct Satisfy {
    name: &'static str,
    pred: Arc<dyn Fn(char) -> bool + Send + Sync>,
}

impl Satisfy {
    /// Match one character for which `pred` returns `true`.
    ///
    /// The name appears in debug output only.
    pub fn new(name: &'static str, pred: impl Fn(char) -> bool + Send + Sync + 'static) -> Self {
        Satisfy {
            name,
            pred: Arc::new(pred),
        }
    }

    /// Match any single character.
    pub fn any() -> Self {
        Satisfy::new("any", |_| true)
    }

    /// Match one ASCII letter.
    pub fn alpha() -> Self {
        Satisfy::new("alpha", |c| c.is_ascii_alphabetic())
    }

    /// Match one ASCII digit.
    pub fn digit() -> Self {
        Satisfy::new("digit", |c| c.is_ascii_digit())
    }

    /// Match one ASCII letter or digit.
    pub fn alnum() -> Self {
        Satisfy::new("alnum", |c| c.is_ascii_alphanumeric())
    }
}

impl fmt::Debug for Satisfy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Satisfy({})", self.name)
    }
}

impl<V: Value> Parser<V> for Satisfy {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        match parse.char_at(parse.pos()) {
            Some(c) if (self.pred)(c) => {
                parse.advance(c.len_utf8());
                true
            }
            _ => false,
        }
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        Vec::new()
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_satisfy(self);
    }
}

/// Matches an exact string.
#[derive(Debug)]
pub struct Literal {
    text: Box<str>,
}

impl Literal {
    pub fn new(text: &str) -> Self {
        Literal { text: text.into() }
    }

    /// The string this parser matches.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl<V: Value> Parser<V> for Literal {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        if parse.matches_at(parse.pos(), &self.text) {
            parse.advance(self.text.len());
            true
        } else {
            false
        }
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        Vec::new()
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_literal(self);
    }
}
