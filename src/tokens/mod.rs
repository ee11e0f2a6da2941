//! Longest-match tokenization with a position-indexed result cache.
//!
//! A [`TokenSet`] turns an ordered array of base parsers into a family of
//! mutually exclusive recognizers: at any input position, at most one base
//! parser "owns" the token, chosen by longest match with ties going to the
//! earlier declaration. Many parsers in a grammar probe the same position
//! (one per alternative that starts with a token), so the set memoizes the
//! outcome per position: the winning index, the end position, and the
//! detached list of effects the winner journaled. A cache hit re-applies
//! the effects and jumps the cursor, skipping the base parsers entirely.
//!
//! The cache is observable only as latency. For a fixed base array, the
//! winner at a position is a pure function of the input, whether the cache
//! starts cold, warm, or is flushed between calls.
//!
//! # Binding to a parse
//!
//! Cached end positions and deltas are only meaningful against the input
//! they were computed from, so a set is bound to one parse at a time. Call
//! [`TokenSet::flush`] before reusing it for another input. The cache sits
//! behind a mutex so the wrapper parsers stay shareable; the lock is never
//! held while base parsers execute.

mod cache;

use crate::parse::Parse;
use crate::parser::{Parser, ParserRef, Visitor};
use crate::Value;
use self::cache::{TokenCache, TokenMatch, TokenResult};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// A fixed array of base parsers resolved by longest match, with a cache.
pub struct TokenSet<V> {
    parsers: Vec<ParserRef<V>>,
    cache: Mutex<TokenCache<V>>,
}

impl<V: Value> TokenSet<V> {
    /// Build a set over `parsers`, in declaration order.
    ///
    /// Order matters: when two bases match to the same end position, the
    /// one declared earlier wins.
    pub fn new(parsers: Vec<ParserRef<V>>) -> Arc<Self> {
        Arc::new(TokenSet {
            parsers,
            cache: Mutex::new(TokenCache::new()),
        })
    }

    /// The base parsers, in declaration order.
    pub fn parsers(&self) -> &[ParserRef<V>] {
        &self.parsers
    }

    /// Empty the cache so the set can serve a new parse.
    pub fn flush(&self) {
        self.lock().flush();
        debug!("token cache flushed");
    }

    /// A recognizer for the single token owned by `base`.
    ///
    /// # Panics
    ///
    /// Panics if `base` is not one of the set's base parsers (compared by
    /// identity).
    pub fn token_parser(self: &Arc<Self>, base: &ParserRef<V>) -> TokenParser<V> {
        let Some(target) = self.index_of(base) else {
            panic!("parser {base:?} is not one of the token set's base parsers");
        };
        TokenParser {
            tokens: Arc::clone(self),
            target,
        }
    }

    /// A recognizer accepting whichever of `bases` owns the next token.
    ///
    /// Funnels through the same cache as the singleton recognizers.
    ///
    /// # Panics
    ///
    /// Panics if any of `bases` is not one of the set's base parsers.
    pub fn token_choice(self: &Arc<Self>, bases: &[ParserRef<V>]) -> TokenChoice<V> {
        let targets = bases
            .iter()
            .map(|base| match self.index_of(base) {
                Some(index) => index,
                None => {
                    panic!("parser {base:?} is not one of the token set's base parsers")
                }
            })
            .collect();
        TokenChoice {
            tokens: Arc::clone(self),
            targets,
        }
    }

    fn index_of(&self, base: &ParserRef<V>) -> Option<u32> {
        self.parsers
            .iter()
            .position(|candidate| Arc::ptr_eq(candidate, base))
            .map(|index| index as u32)
    }

    fn lock(&self) -> MutexGuard<'_, TokenCache<V>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Determine the token at the current position, from cache or by
    /// running the longest-match resolution, and match it against
    /// `targets`.
    fn parse_token(&self, parse: &mut Parse<V>, targets: &[u32]) -> bool {
        assert!(
            !self.parsers.is_empty(),
            "token parse against an empty base-parser array"
        );
        let cached = self.lock().get(parse.pos()).cloned();
        let result = match cached {
            Some(result) => result,
            None => self.fill(parse),
        };
        let Some(token) = result else {
            return false;
        };
        if !targets.contains(&token.index) {
            return false;
        }
        parse.set_pos(token.end);
        for effect in token.delta {
            parse.apply(effect);
        }
        true
    }

    /// Longest-match resolution at the current position (the miss path).
    ///
    /// Tries every base parser in declaration order, keeping the result
    /// with the greatest end position; a later base must match strictly
    /// longer to displace an earlier one, and a match that consumes nothing
    /// never wins. Leaves the parse state as it found it and caches what it
    /// determined, sentinel included.
    fn fill(&self, parse: &mut Parse<V>) -> TokenResult<V> {
        let pos0 = parse.pos();
        let log0 = parse.log_len();
        let mut best: TokenResult<V> = None;

        for (index, parser) in self.parsers.iter().enumerate() {
            if parser.parse(parse) {
                let end = parse.pos();
                if end > pos0 && best.as_ref().map_or(true, |b| end > b.end) {
                    best = Some(TokenMatch {
                        index: index as u32,
                        end,
                        delta: parse.delta(log0),
                    });
                }
                parse.rollback(log0);
                parse.set_pos(pos0);
            }
        }

        trace!(
            pos = pos0,
            winner = ?best.as_ref().map(|b| b.index),
            end = ?best.as_ref().map(|b| b.end),
            "token resolved"
        );
        self.lock().insert(pos0, best.clone());
        best
    }
}

impl<V> fmt::Debug for TokenSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("parsers", &self.parsers.len())
            .finish()
    }
}

/// Recognizer for a single base parser's token.
///
/// Succeeds iff the token at the current position, resolved by longest
/// match over the whole set, belongs to this recognizer's base.
pub struct TokenParser<V> {
    tokens: Arc<TokenSet<V>>,
    target: u32,
}

impl<V: Value> Parser<V> for TokenParser<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        self.tokens
            .parse_token(parse, std::slice::from_ref(&self.target))
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        vec![Arc::clone(&self.tokens.parsers[self.target as usize])]
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_token_parser(self);
    }
}

impl<V> fmt::Debug for TokenParser<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenParser")
            .field("target", &self.target)
            .finish()
    }
}

/// Recognizer for any of several base parsers' tokens.
pub struct TokenChoice<V> {
    tokens: Arc<TokenSet<V>>,
    targets: Vec<u32>,
}

impl<V: Value> Parser<V> for TokenChoice<V> {
    fn run(&self, parse: &mut Parse<V>) -> bool {
        self.tokens.parse_token(parse, &self.targets)
    }

    fn children(&self) -> Vec<ParserRef<V>> {
        self.targets
            .iter()
            .map(|&target| Arc::clone(&self.tokens.parsers[target as usize]))
            .collect()
    }

    fn accept(&self, visitor: &mut dyn Visitor<V>) {
        visitor.visit_token_choice(self);
    }
}

impl<V> fmt::Debug for TokenChoice<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenChoice")
            .field("targets", &self.targets)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{Choice, Literal, Reduce, Repeat, Satisfy, Seq};

    fn word() -> ParserRef<i64> {
        Arc::new(Repeat::new(Arc::new(Satisfy::alpha()), 1))
    }

    /// Bases: "if", "iff", then a catch-all word.
    fn keyword_set() -> (Arc<TokenSet<i64>>, Vec<ParserRef<i64>>) {
        let bases: Vec<ParserRef<i64>> = vec![
            Arc::new(Literal::new("if")),
            Arc::new(Literal::new("iff")),
            word(),
        ];
        (TokenSet::new(bases.clone()), bases)
    }

    #[test]
    fn ties_go_to_the_earlier_declaration() {
        // On "iff " both the "iff" literal and the word end at 3; the
        // literal is declared first and owns the token.
        let (tokens, bases) = keyword_set();
        let choice = tokens.token_choice(&[Arc::clone(&bases[1]), Arc::clone(&bases[2])]);
        let mut parse: Parse<i64> = Parse::new("iff ");
        assert!(choice.parse(&mut parse));
        assert_eq!(parse.pos(), 3);

        tokens.flush();
        let keyword = tokens.token_parser(&bases[1]);
        let mut parse: Parse<i64> = Parse::new("iff ");
        assert!(keyword.parse(&mut parse));
        assert_eq!(parse.pos(), 3);
    }

    #[test]
    fn shorter_prefix_loses_the_position() {
        let (tokens, bases) = keyword_set();
        let keyword = tokens.token_parser(&bases[0]);
        let mut parse: Parse<i64> = Parse::new("iff ");
        assert!(!keyword.parse(&mut parse));
        assert_eq!(parse.pos(), 0);
    }

    #[test]
    fn longer_match_displaces_earlier_declarations() {
        // On "iffy " the word parser reaches 4, beating both literals.
        let (tokens, bases) = keyword_set();
        let mut parse: Parse<i64> = Parse::new("iffy ");

        let keyword = tokens.token_parser(&bases[1]);
        assert!(!keyword.parse(&mut parse));
        assert_eq!(parse.pos(), 0);

        let any_word = tokens.token_parser(&bases[2]);
        assert!(any_word.parse(&mut parse));
        assert_eq!(parse.pos(), 4);
    }

    #[test]
    fn no_token_is_cached_as_a_miss_for_every_target() {
        let (tokens, bases) = keyword_set();
        let mut parse: Parse<i64> = Parse::new("123");
        for base in &bases {
            assert!(!tokens.token_parser(base).parse(&mut parse));
        }
        assert_eq!(parse.pos(), 0);
        assert_eq!(tokens.lock().occupied(), 1);
    }

    #[test]
    fn cache_hit_replays_the_winners_effects() {
        // The number token pushes its value; the push must also happen on
        // the cached path taken by the second alternative.
        let number: ParserRef<i64> = Arc::new(Reduce::new(
            Arc::new(Repeat::new(Arc::new(Satisfy::digit()), 1)),
            |parse: &mut Parse<i64>, _items, pos0, _size0| {
                let value: i64 = parse.text(pos0, parse.pos()).parse().unwrap();
                parse.push(value);
            },
        ));
        let tokens = TokenSet::new(vec![Arc::clone(&number)]);

        let first: Vec<ParserRef<i64>> = vec![
            Arc::new(tokens.token_parser(&number)),
            Arc::new(Literal::new("!")),
        ];
        let second: Vec<ParserRef<i64>> = vec![
            Arc::new(tokens.token_parser(&number)),
            Arc::new(Literal::new("?")),
        ];
        let root = Choice::new(vec![
            Arc::new(Seq::new(first)) as ParserRef<i64>,
            Arc::new(Seq::new(second)),
        ]);

        let mut parse: Parse<i64> = Parse::new("42?");
        assert!(root.parse(&mut parse));
        assert!(parse.at_end());
        assert_eq!(parse.stack(), &[42]);
        // One fill: the second alternative was served from the cache.
        assert_eq!(tokens.lock().occupied(), 1);
    }

    #[test]
    fn flush_allows_reuse_on_a_new_input() {
        let (tokens, bases) = keyword_set();
        let keyword = tokens.token_parser(&bases[0]);

        let mut parse: Parse<i64> = Parse::new("if ");
        assert!(keyword.parse(&mut parse));

        tokens.flush();
        let mut parse: Parse<i64> = Parse::new("xy ");
        assert!(!keyword.parse(&mut parse));
        let any_word = tokens.token_parser(&bases[2]);
        let mut parse: Parse<i64> = Parse::new("xy ");
        assert!(any_word.parse(&mut parse));
        assert_eq!(parse.pos(), 2);
    }

    #[test]
    fn empty_match_never_wins_the_position() {
        let nullable: ParserRef<i64> = Arc::new(Repeat::new(Arc::new(Satisfy::alpha()), 0));
        let tokens = TokenSet::new(vec![Arc::clone(&nullable)]);
        let recognizer = tokens.token_parser(&nullable);
        let mut parse: Parse<i64> = Parse::new("123");
        assert!(!recognizer.parse(&mut parse));
        assert_eq!(parse.pos(), 0);
    }

    #[test]
    #[should_panic(expected = "not one of the token set's base parsers")]
    fn foreign_base_parser_is_fatal() {
        let (tokens, _bases) = keyword_set();
        let foreign: ParserRef<i64> = Arc::new(Literal::new("if"));
        tokens.token_parser(&foreign);
    }

    #[test]
    #[should_panic(expected = "empty base-parser array")]
    fn empty_base_array_is_fatal_at_parse_time() {
        let tokens: Arc<TokenSet<i64>> = TokenSet::new(Vec::new());
        let mut parse: Parse<i64> = Parse::new("x");
        tokens.parse_token(&mut parse, &[]);
    }
}
