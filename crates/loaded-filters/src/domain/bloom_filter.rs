//! Bloom filter over beneficiary ids
//!
//! An id that was inserted is always reported as possibly present. Ids
//! that were never inserted are reported as absent except at the false
//! positive rate the filter was sized for.

use bitvec::prelude::*;

use super::hash_functions::probes;
use super::sizing::FilterSizing;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    bits: BitVec<u64, Lsb0>,
    sizing: FilterSizing,
    /// Insert calls, repeated ids included
    inserts: usize,
}

impl BloomFilter {
    /// Empty filter with the given bit length and probe count
    pub fn with_sizing(sizing: FilterSizing) -> Self {
        Self {
            bits: bitvec![u64, Lsb0; 0; sizing.bits],
            sizing,
            inserts: 0,
        }
    }

    /// Empty filter holding `expected` ids under `fpr`
    pub fn for_capacity(expected: usize, fpr: f64) -> Self {
        Self::with_sizing(FilterSizing::for_capacity(expected, fpr))
    }

    pub fn insert(&mut self, id: &str) {
        for position in probes(id, self.sizing.probes, self.sizing.bits) {
            self.bits.set(position, true);
        }
        self.inserts += 1;
    }

    /// `false` means `id` was never inserted
    pub fn might_contain(&self, id: &str) -> bool {
        probes(id, self.sizing.probes, self.sizing.bits).all(|position| self.bits[position])
    }

    pub fn sizing(&self) -> FilterSizing {
        self.sizing
    }

    /// Set bits in the array
    pub fn ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts
    }

    /// Expected false positive rate given the insert calls so far
    pub fn false_positive_rate(&self) -> f64 {
        self.sizing.false_positive_rate(self.inserts)
    }

    /// Distinct ids estimated from the fill ratio
    pub fn approximate_element_count(&self) -> usize {
        self.sizing.estimate_distinct(self.ones())
    }
}
