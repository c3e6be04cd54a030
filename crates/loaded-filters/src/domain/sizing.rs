//! Bloom filter sizing
//!
//! For `n` expected ids at false positive rate `p`:
//!
//! ```text
//! bits   = ceil(-n * ln(p) / ln(2)^2)
//! probes = round(bits / n * ln(2))
//! fpr(n) = (1 - e^(-probes * n / bits))^probes
//! ```

use std::f64::consts::LN_2;

/// Upper limit on probes per id
const MAX_PROBES: usize = 32;

/// Bit array length and probe count of one filter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterSizing {
    pub bits: usize,
    pub probes: usize,
}

impl FilterSizing {
    /// Sizing with both values raised to at least 1
    pub fn new(bits: usize, probes: usize) -> Self {
        Self {
            bits: bits.max(1),
            probes: probes.max(1),
        }
    }

    /// Smallest sizing that keeps `expected` ids under `fpr`
    ///
    /// Zero expected ids is sized as one.
    pub fn for_capacity(expected: usize, fpr: f64) -> Self {
        let n = expected.max(1) as f64;
        let bits = (-n * fpr.ln() / (LN_2 * LN_2)).ceil() as usize;
        let probes = (bits as f64 / n * LN_2).round() as usize;

        Self::new(bits, probes.min(MAX_PROBES))
    }

    /// Expected false positive rate once `inserted` ids are in the filter
    pub fn false_positive_rate(&self, inserted: usize) -> f64 {
        let fill = (-(self.probes as f64) * inserted as f64 / self.bits as f64).exp();
        (1.0 - fill).powi(self.probes as i32)
    }

    /// Distinct ids implied by `ones` set bits (Swamidass & Baldi)
    ///
    /// A saturated filter reports `usize::MAX`.
    pub fn estimate_distinct(&self, ones: usize) -> usize {
        if ones >= self.bits {
            return usize::MAX;
        }
        let empty_share = 1.0 - ones as f64 / self.bits as f64;
        (-(self.bits as f64) / self.probes as f64 * empty_share.ln()).round() as usize
    }
}
