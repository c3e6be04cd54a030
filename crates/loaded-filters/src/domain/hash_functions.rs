//! Probe positions for beneficiary ids
//!
//! Each id is hashed twice with MurmurHash3 (x64, 128-bit, low 64 bits
//! kept) and the probes are derived as `h1 + i * h2 (mod bits)`.

use std::io::Cursor;

const SEED_H1: u32 = 0;
const SEED_H2: u32 = 0x9747_b28c;

fn murmur64(bytes: &[u8], seed: u32) -> u64 {
    // An in-memory cursor never fails to read
    murmur3::murmur3_x64_128(&mut Cursor::new(bytes), seed).map_or(0, |h| h as u64)
}

/// Iterator over the bit positions of one id
#[derive(Clone, Debug)]
pub struct Probes {
    h1: u64,
    h2: u64,
    next: u64,
    count: u64,
    bits: u64,
}

/// Probe positions of `id` in a filter of `bits` bits
pub fn probes(id: &str, probes: usize, bits: usize) -> Probes {
    let bytes = id.as_bytes();
    Probes {
        h1: murmur64(bytes, SEED_H1),
        // Odd, so probes cycle through every residue of an even bit count
        h2: murmur64(bytes, SEED_H2) | 1,
        next: 0,
        count: probes as u64,
        bits: bits.max(1) as u64,
    }
}

impl Iterator for Probes {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.count {
            return None;
        }
        let hash = self.h1.wrapping_add(self.next.wrapping_mul(self.h2));
        self.next += 1;
        Some((hash % self.bits) as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.count - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Probes {}
