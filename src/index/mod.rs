//! Multi-index Hamming search (MIH).
//!
//! Stores 256-bit fingerprints and answers radius-bounded Hamming queries
//! far below linear scan for small radii. The engine is the pigeonhole
//! argument: split a code into 16 disjoint 16-bit slots, and two codes
//! within distance `d` must agree to within `d/16` bits in at least one
//! slot. So each slot position keeps a table from slot value to the entries
//! carrying it, a query enumerates the small Hamming ball around each of
//! its own slot values, and only the union of those bins is verified with
//! the full 256-bit distance.
//!
//! At the working radius d ≤ 32 the per-slot ball has
//! `C(16,0)+C(16,1)+C(16,2) = 137` values, so a query probes at most
//! 16·137 bins; on a 10M-entry corpus that verifies ~3·10⁴ candidates,
//! three orders of magnitude under a scan.
//!
//! Entries are append-only and bins record entry indexes in insertion
//! order, so bins stay sorted by construction and no build/serve
//! compaction step is needed; inserts and queries may interleave freely
//! on one owner.

pub mod flat;

pub use flat::Flat256;

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use smallvec::SmallVec;

use crate::hash::Hash256;
use crate::{Error, Result};

/// Slots per code: one per 16-bit word of the fingerprint.
pub const NUM_SLOTS: usize = 16;

/// Largest meaningful query radius on 256-bit codes.
pub const MAX_RADIUS: u32 = 256;

/// Bins hold compact indexes into the entries array; most bins on real
/// corpora stay within the inline capacity.
type SlotBin = SmallVec<[u32; 4]>;

// ============================================================================
// Query result
// ============================================================================

/// One hit from a radius query.
#[derive(Debug)]
pub struct QueryMatch<'a, M> {
    /// Position in insertion order.
    pub index: usize,
    /// Full 256-bit Hamming distance to the needle.
    pub distance: u32,
    pub hash: &'a Hash256,
    pub metadata: &'a M,
}

impl<M> Clone for QueryMatch<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for QueryMatch<'_, M> {}

// ============================================================================
// Mih256
// ============================================================================

/// Multi-index Hamming searcher over 256-bit fingerprints.
///
/// Append-only: inserts and queries, no deletes. Fingerprints are stored
/// once in the entries array; the sixteen slot tables hold `u32` indexes
/// into it.
pub struct Mih256<M> {
    entries: Vec<(Hash256, M)>,
    slots: [HashMap<u16, SlotBin>; NUM_SLOTS],
}

impl<M> Mih256<M> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            slots: std::array::from_fn(|_| HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index` in insertion order.
    pub fn get(&self, index: usize) -> Option<(&Hash256, &M)> {
        self.entries.get(index).map(|(h, m)| (h, m))
    }

    /// Append an entry and register it in its 16 slot bins. O(16) plus
    /// amortized table cost. Duplicate fingerprints are legal.
    pub fn insert(&mut self, hash: Hash256, metadata: M) {
        let n = u32::try_from(self.entries.len()).expect("index capacity exceeded");
        for (s, table) in self.slots.iter_mut().enumerate() {
            table.entry(hash.word(s)).or_default().push(n);
        }
        self.entries.push((hash, metadata));
    }

    pub fn insert_all(&mut self, pairs: impl IntoIterator<Item = (Hash256, M)>) {
        for (hash, metadata) in pairs {
            self.insert(hash, metadata);
        }
    }

    /// Every entry within `radius` bits of `needle`, ordered by ascending
    /// entry index.
    pub fn query(&self, needle: &Hash256, radius: u32) -> Result<Vec<QueryMatch<'_, M>>> {
        let candidates = self.candidates(needle, radius)?;
        Ok(candidates
            .into_iter()
            .filter_map(|n| {
                let index = n as usize;
                let (hash, metadata) = &self.entries[index];
                let distance = needle.hamming_distance(hash);
                (distance <= radius).then_some(QueryMatch { index, distance, hash, metadata })
            })
            .collect())
    }

    /// First `k` matches ordered by ascending distance, ties by entry index.
    pub fn query_nearest(
        &self,
        needle: &Hash256,
        radius: u32,
        k: usize,
    ) -> Result<Vec<QueryMatch<'_, M>>> {
        let mut matches = self.query(needle, radius)?;
        matches.sort_by_key(|m| (m.distance, m.index));
        matches.truncate(k);
        Ok(matches)
    }

    /// Does anything lie within `radius` of `needle`? Early-exits on the
    /// first verified candidate.
    pub fn query_any(&self, needle: &Hash256, radius: u32) -> Result<bool> {
        if radius > MAX_RADIUS {
            return Err(Error::BadRadius { radius });
        }
        let slot_radius = radius / NUM_SLOTS as u32;
        for (s, table) in self.slots.iter().enumerate() {
            for key in slot_neighbors(needle.word(s), slot_radius) {
                let Some(bin) = table.get(&key) else { continue };
                for &n in bin {
                    if needle.hamming_distance(&self.entries[n as usize].0) <= radius {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// Candidate entry indexes: the union of all probed bins, de-duplicated
    /// and ascending.
    fn candidates(&self, needle: &Hash256, radius: u32) -> Result<Vec<u32>> {
        if radius > MAX_RADIUS {
            return Err(Error::BadRadius { radius });
        }
        let slot_radius = radius / NUM_SLOTS as u32;
        let mut candidates = Vec::new();
        for (s, table) in self.slots.iter().enumerate() {
            for key in slot_neighbors(needle.word(s), slot_radius) {
                if let Some(bin) = table.get(&key) {
                    candidates.extend_from_slice(bin);
                }
            }
        }
        candidates.sort_unstable();
        candidates.dedup();
        Ok(candidates)
    }
}

impl<M> Default for Mih256<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// All 16-bit values within Hamming distance `radius` of `word`: the word
/// itself, then each popcount class walked with Gosper's next-combination
/// step.
fn slot_neighbors(word: u16, radius: u32) -> Vec<u16> {
    let r = radius.min(16);
    let mut out = Vec::new();
    out.push(word);
    for c in 1..=r {
        let mut v: u32 = (1u32 << c) - 1;
        while v < 1 << 16 {
            out.push(word ^ v as u16);
            let lowest = v & v.wrapping_neg();
            let ripple = v + lowest;
            v = (((ripple ^ v) >> 2) / lowest) | ripple;
        }
    }
    out
}

// ============================================================================
// SharedMih256
// ============================================================================

/// Shared-reader / exclusive-writer wrapper for use across threads.
///
/// The core index is a single mutable owner; this is the straightforward
/// multi-thread discipline layered on top. Clone the handle freely;
/// clones share one index.
pub struct SharedMih256<M> {
    inner: Arc<RwLock<Mih256<M>>>,
}

impl<M> SharedMih256<M> {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(Mih256::new())) }
    }

    /// Insert under the write lock.
    pub fn insert(&self, hash: Hash256, metadata: M) {
        self.inner.write().insert(hash, metadata);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Shared read access for querying.
    pub fn read(&self) -> RwLockReadGuard<'_, Mih256<M>> {
        self.inner.read()
    }

    /// Exclusive access for bulk loading.
    pub fn write(&self) -> RwLockWriteGuard<'_, Mih256<M>> {
        self.inner.write()
    }
}

impl<M> Clone for SharedMih256<M> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<M> Default for SharedMih256<M> {
    fn default() -> Self {
        Self::new()
    }
}
