//! A fixed-capacity transposition table keyed on the Zobrist hash of a
//! position, storing turn-search results so repeated positions (very
//! common once both sides start shuffling pieces) are not re-searched.
//!
//! Direct-mapped: each hash indexes exactly one slot, so a colliding
//! position simply competes with whatever is already there under the
//! replacement policy below, rather than being chained or probed to a
//! second slot. Replacement policy: an incoming entry overwrites its
//! slot when the slot is empty, holds a shallower (or equal) depth, or
//! is left over from a previous search generation; an incoming entry
//! that is shallower than a same-generation resident is dropped so the
//! deeper result survives.

use value::Value;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy)]
struct Slot {
    key: u64,
    depth: u32,
    score: Value,
    bound: Bound,
    generation: u8,
    occupied: bool,
}

const EMPTY_SLOT: Slot = Slot {
    key: 0,
    depth: 0,
    score: 0,
    bound: Bound::Exact,
    generation: 0,
    occupied: false,
};

/// A probe result: what to do with a lookup against `alpha`/`beta`.
pub enum Probe {
    /// The stored score is usable as-is at the requested depth.
    Hit(Value),
    /// No usable entry; `best_move_hint` may still help move ordering
    /// in a future iteration (not populated by this minimal table).
    Miss,
}

pub struct TranspositionTable {
    slots: Vec<Slot>,
    mask: u64,
    generation: u8,
}

impl TranspositionTable {
    /// Creates a table with room for roughly `capacity_pow2` entries
    /// (rounded up to the next power of two).
    pub fn with_capacity(capacity_pow2: usize) -> TranspositionTable {
        let size = capacity_pow2.next_power_of_two().max(1024);
        TranspositionTable {
            slots: vec![EMPTY_SLOT; size],
            mask: (size - 1) as u64,
            generation: 0,
        }
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key & self.mask) as usize
    }

    /// Clears every entry and resets the generation counter; called at
    /// the start of a new game.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = EMPTY_SLOT;
        }
        self.generation = 0;
    }

    /// Marks the start of a new search so entries from prior searches
    /// can be distinguished from fresh ones for eviction purposes.
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn probe(&self, key: u64, depth: u32, alpha: Value, beta: Value) -> Probe {
        let slot = &self.slots[self.index(key)];
        if !slot.occupied || slot.key != key || slot.depth < depth {
            return Probe::Miss;
        }
        match slot.bound {
            Bound::Exact => Probe::Hit(slot.score),
            Bound::Lower if slot.score >= beta => Probe::Hit(slot.score),
            Bound::Upper if slot.score <= alpha => Probe::Hit(slot.score),
            _ => Probe::Miss,
        }
    }

    /// Looks up any entry for `key` regardless of depth sufficiency,
    /// used by move ordering to seed with a previously-best line. Not
    /// exposed as a score hint yet; returns only whether one exists.
    pub fn contains(&self, key: u64) -> bool {
        let slot = &self.slots[self.index(key)];
        slot.occupied && slot.key == key
    }

    pub fn store(&mut self, key: u64, depth: u32, score: Value, bound: Bound) {
        let idx = self.index(key);
        let slot = &mut self.slots[idx];
        let should_replace = !slot.occupied
            || slot.generation != self.generation
            || slot.depth <= depth;
        if should_replace {
            *slot = Slot {
                key,
                depth,
                score,
                bound,
                generation: self.generation,
                occupied: true,
            };
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.occupied).count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
