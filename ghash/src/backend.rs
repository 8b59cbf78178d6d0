//! Multiplier backends and runtime strategy selection.
//!
//! The set of strategies is closed: the carry-less-multiply fast path on
//! x86/x86_64 when the CPU supports it, and the constant-time table
//! fallback everywhere else. Capability detection runs once, the first
//! time a key is scheduled, and the chosen strategy is fixed for the
//! lifetime of the key.

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "force-soft")
))]
pub(crate) mod clmul;

pub(crate) mod soft;

use crate::Block;
use zeroize::Zeroize;

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "force-soft")
))]
cpufeatures::new!(clmul_token, "pclmulqdq", "sse2");

/// One GF(2^128) multiplication by the fixed hash key `H`, in GCM's
/// bit-reflected convention.
pub(crate) enum Multiplier {
    /// Hardware carry-less multiplication.
    #[cfg(all(
        any(target_arch = "x86", target_arch = "x86_64"),
        not(feature = "force-soft")
    ))]
    Clmul(clmul::Clmul),

    /// Constant-time table-driven fallback.
    Soft(soft::MultTable),
}

impl Multiplier {
    /// Build the multiplier for `H`, selecting the fast path when the
    /// host supports it.
    pub(crate) fn new(h: &Block) -> Self {
        #[cfg(all(
            any(target_arch = "x86", target_arch = "x86_64"),
            not(feature = "force-soft")
        ))]
        if clmul_token::init().get() {
            return Multiplier::Clmul(clmul::Clmul::new(h));
        }

        Multiplier::Soft(soft::MultTable::new(h))
    }

    /// Multiply `x` by `H` in place.
    #[inline]
    pub(crate) fn mul(&self, x: &mut Block) {
        match self {
            #[cfg(all(
                any(target_arch = "x86", target_arch = "x86_64"),
                not(feature = "force-soft")
            ))]
            Multiplier::Clmul(m) => m.mul(x),
            Multiplier::Soft(m) => m.mul(x),
        }
    }

    pub(crate) fn provider(&self) -> &'static str {
        match self {
            #[cfg(all(
                any(target_arch = "x86", target_arch = "x86_64"),
                not(feature = "force-soft")
            ))]
            Multiplier::Clmul(_) => "clmul",
            Multiplier::Soft(_) => "soft",
        }
    }
}

impl Zeroize for Multiplier {
    fn zeroize(&mut self) {
        match self {
            #[cfg(all(
                any(target_arch = "x86", target_arch = "x86_64"),
                not(feature = "force-soft")
            ))]
            Multiplier::Clmul(m) => m.zeroize(),
            Multiplier::Soft(m) => m.zeroize(),
        }
    }
}

/// Backend that `Multiplier::new` would select on this host.
pub(crate) fn active_provider() -> &'static str {
    #[cfg(all(
        any(target_arch = "x86", target_arch = "x86_64"),
        not(feature = "force-soft")
    ))]
    if clmul_token::init().get() {
        return "clmul";
    }

    "soft"
}
