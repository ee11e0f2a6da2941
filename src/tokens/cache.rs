//! Open-addressed position cache with Robin-Hood probing.
//!
//! Maps input positions to tokenization results. Each slot packs
//! `(displacement << 32) | (position + 1)` into one word, with zero
//! reserved for "empty", and a parallel array holds the results. Insertion
//! evicts residents that sit closer to their home slot than the incoming
//! entry (then continues placing the evictee), which keeps probe sequences
//! short and uniform. `max_displacement` is an upper bound on every live
//! entry's probe distance, so lookups touch at most
//! `max_displacement + 1` slots; growth rebuilds the bound from scratch so
//! it stays tight.

use crate::effect::Delta;
use crate::Value;
use tracing::debug;

/// Starting slot count; the table doubles past the load factor.
const INITIAL_SLOTS: usize = 1024;

/// Occupancy fraction beyond which the table grows.
const LOAD_FACTOR: f64 = 0.8;

/// A winning tokenization at some position.
#[derive(Clone, Debug)]
pub(crate) struct TokenMatch<V> {
    /// Index of the winning base parser.
    pub(crate) index: u32,
    /// Cursor position just past the token.
    pub(crate) end: usize,
    /// Effects the winning parser journaled, in application order.
    pub(crate) delta: Delta<V>,
}

/// A cached tokenization outcome: a winner, or `None` for "no token here".
pub(crate) type TokenResult<V> = Option<TokenMatch<V>>;

pub(crate) struct TokenCache<V> {
    /// Packed `(displacement, position + 1)` words; zero means empty.
    slots: Vec<u64>,
    /// Results parallel to `slots`; meaningful only where the slot is live.
    results: Vec<TokenResult<V>>,
    occupied: usize,
    max_displacement: u64,
}

impl<V: Value> TokenCache<V> {
    pub(crate) fn new() -> Self {
        TokenCache {
            slots: vec![0; INITIAL_SLOTS],
            results: (0..INITIAL_SLOTS).map(|_| None).collect(),
            occupied: 0,
            max_displacement: 0,
        }
    }

    /// Drop every entry, returning to the initial capacity.
    pub(crate) fn flush(&mut self) {
        *self = TokenCache::new();
    }

    pub(crate) fn occupied(&self) -> usize {
        self.occupied
    }

    /// Look up the result cached for `pos`, if any.
    pub(crate) fn get(&self, pos: usize) -> Option<&TokenResult<V>> {
        let mask = self.slots.len() - 1;
        let key = pos as u64 + 1;
        let mut i = pos & mask;
        for _ in 0..=self.max_displacement {
            let word = self.slots[i];
            let stored = word & 0xFFFF_FFFF;
            if stored == 0 {
                return None;
            }
            if stored == key {
                return Some(&self.results[i]);
            }
            i = (i + 1) & mask;
        }
        None
    }

    /// Cache `result` under `pos`, growing the table if needed.
    ///
    /// Positions are assumed distinct: the caller only fills on a miss.
    pub(crate) fn insert(&mut self, pos: usize, result: TokenResult<V>) {
        debug_assert!(
            pos < u32::MAX as usize,
            "cache positions must fit the packed 32-bit encoding"
        );
        self.place(pos, result);
        self.occupied += 1;
        #[allow(clippy::cast_precision_loss)]
        if self.occupied as f64 > LOAD_FACTOR * self.slots.len() as f64 {
            self.grow();
        }
    }

    /// Robin-Hood insertion: walk the probe sequence, swapping with any
    /// resident that is closer to home than the entry being placed.
    fn place(&mut self, pos: usize, result: TokenResult<V>) {
        let mask = self.slots.len() - 1;
        let mut key = pos as u64 + 1;
        let mut pending = result;
        let mut displacement = 0u64;
        let mut i = pos & mask;
        loop {
            let word = self.slots[i];
            if word & 0xFFFF_FFFF == 0 {
                self.slots[i] = (displacement << 32) | key;
                self.results[i] = pending;
                self.max_displacement = self.max_displacement.max(displacement);
                return;
            }
            let resident_displacement = word >> 32;
            if resident_displacement < displacement {
                let resident_key = word & 0xFFFF_FFFF;
                self.slots[i] = (displacement << 32) | key;
                self.max_displacement = self.max_displacement.max(displacement);
                pending = std::mem::replace(&mut self.results[i], pending);
                key = resident_key;
                displacement = resident_displacement;
            }
            displacement += 1;
            i = (i + 1) & mask;
        }
    }

    /// Double the table and reinsert every live entry.
    ///
    /// `max_displacement` restarts at zero and is rebuilt by the
    /// reinsertions, so the lookup bound stays tight after growth.
    fn grow(&mut self) {
        let doubled = self.slots.len() * 2;
        let old_slots = std::mem::replace(&mut self.slots, vec![0; doubled]);
        let mut old_results =
            std::mem::replace(&mut self.results, (0..doubled).map(|_| None).collect());
        self.max_displacement = 0;
        for (i, &word) in old_slots.iter().enumerate() {
            let stored = word & 0xFFFF_FFFF;
            if stored != 0 {
                self.place(stored as usize - 1, old_results[i].take());
            }
        }
        debug!(slots = doubled, occupied = self.occupied, "token cache grown");
    }
}
