//! Constant-time software multiplier for targets without carry-less
//! multiplication.
//!
//! The key schedule precomputes a 256-entry table of 64-bit words from
//! `H`: the sequence `H·x^0, H·x^1, …, H·x^63` for each 64-bit half of
//! the operand, stored interleaved (`H^1, H^65, H^2, H^66, …`) so the
//! folding loop indexes it with a fixed stride. One multiplication then
//! folds 128 operand bits in 128 masked XOR steps whose control flow and
//! memory accesses do not depend on the operand.

use crate::{taint, Block};
use zeroize::Zeroize;

/// Reduction constant for GCM's polynomial `x^128 + x^7 + x^2 + x + 1`.
///
/// GCM's bit ordering is reflected, so reduction carries out of the
/// bottom bit and folds back into the top byte.
const R: u64 = 0xE100_0000_0000_0000;

/// Precomputed multiples of `H`, rebuilt exactly once per key.
pub(crate) struct MultTable {
    hm: [u64; 256],
}

impl MultTable {
    pub(crate) fn new(h: &Block) -> Self {
        let mut h0 = u64::from_be_bytes(h[..8].try_into().expect("8-byte half"));
        let mut h1 = u64::from_be_bytes(h[8..].try_into().expect("8-byte half"));

        let mut hm = [0u64; 256];
        for i in 0..2 {
            for j in 0..64 {
                hm[4 * j + 2 * i] = h0;
                hm[4 * j + 2 * i + 1] = h1;

                let carry = R * (h1 & 1);
                h1 = (h1 >> 1) | (h0 << 63);
                h0 = (h0 >> 1) ^ carry;
            }
        }

        h0.zeroize();
        h1.zeroize();

        Self { hm }
    }

    /// Multiply `x` by `H` in place.
    ///
    /// Each operand bit contributes via an all-ones/all-zeroes mask; no
    /// branch or table index depends on the operand's value.
    pub(crate) fn mul(&self, x: &mut Block) {
        let mut x0 = u64::from_be_bytes(x[..8].try_into().expect("8-byte half"));
        let mut x1 = u64::from_be_bytes(x[8..].try_into().expect("8-byte half"));

        {
            let _scope = taint::scope();

            let mut z = [0u64; 2];
            for i in 0..64 {
                let x0_mask = 0u64.wrapping_sub((x0 >> (63 - i)) & 1);
                let x1_mask = 0u64.wrapping_sub((x1 >> (63 - i)) & 1);

                z[0] ^= self.hm[4 * i] & x0_mask;
                z[1] ^= self.hm[4 * i + 1] & x0_mask;
                z[0] ^= self.hm[4 * i + 2] & x1_mask;
                z[1] ^= self.hm[4 * i + 3] & x1_mask;
            }

            x0 = z[0];
            x1 = z[1];
            z.zeroize();
        }

        x[..8].copy_from_slice(&x0.to_be_bytes());
        x[8..].copy_from_slice(&x1.to_be_bytes());
    }
}

impl Zeroize for MultTable {
    fn zeroize(&mut self) {
        self.hm.zeroize();
    }
}
