//! Linear-scan index.
//!
//! Same contract as the multi-index structure, with none of the machinery:
//! every query walks the whole corpus. Right for small corpora and the
//! oracle the multi-index is checked against.

use super::{MAX_RADIUS, QueryMatch};
use crate::hash::Hash256;
use crate::{Error, Result};

/// Brute-force radius-bounded Hamming search.
pub struct Flat256<M> {
    entries: Vec<(Hash256, M)>,
}

impl<M> Flat256<M> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry. Duplicates are legal.
    pub fn insert(&mut self, hash: Hash256, metadata: M) {
        self.entries.push((hash, metadata));
    }

    pub fn insert_all(&mut self, pairs: impl IntoIterator<Item = (Hash256, M)>) {
        self.entries.extend(pairs);
    }

    /// Every entry within `radius` bits of `needle`, in insertion order.
    pub fn query(&self, needle: &Hash256, radius: u32) -> Result<Vec<QueryMatch<'_, M>>> {
        if radius > MAX_RADIUS {
            return Err(Error::BadRadius { radius });
        }
        Ok(self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, (hash, metadata))| {
                let distance = needle.hamming_distance(hash);
                (distance <= radius).then_some(QueryMatch { index, distance, hash, metadata })
            })
            .collect())
    }
}

impl<M> Default for Flat256<M> {
    fn default() -> Self {
        Self::new()
    }
}
