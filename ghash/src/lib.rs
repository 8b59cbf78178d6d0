//! **GHASH**: universal hash over GF(2^128) used by the Galois/Counter Mode
//! (GCM) for message authentication.
//!
//! ## Implementation Notes
//!
//! Multiplication by the hash key `H` is performed by one of two
//! interchangeable backends, selected once at key-schedule time:
//!
//! - a carry-less-multiply fast path (`pclmulqdq`) on x86/x86_64 CPUs that
//!   support it, detected at runtime;
//! - a constant-time software fallback driven by a 256-entry table of
//!   64-bit words precomputed from `H`, whose control flow and memory
//!   access pattern are independent of the data being hashed.
//!
//! Both backends produce bit-identical results for every input.
//!
//! Unlike a generic universal hash, this accumulator carries the state GCM
//! needs around the hash itself: the associated-data baseline, the running
//! byte counters consumed by the final length block, and the nonce-derived
//! mask that is folded into the returned authenticator.

#![no_std]
#![warn(missing_docs, rust_2018_idioms)]

mod backend;
mod taint;

use backend::Multiplier;
use zeroize::Zeroize;

/// Size of a GHASH block in bytes.
pub const BLOCK_SIZE: usize = 16;

/// GHASH blocks (16 bytes).
pub type Block = [u8; BLOCK_SIZE];

/// Name of the multiplier backend that would be selected on this host.
///
/// Returns `"clmul"` when the carry-less-multiply fast path is available
/// and enabled, `"soft"` otherwise.
pub fn provider() -> &'static str {
    backend::active_provider()
}

/// GHASH accumulator keyed by the field element `H = E_K(0^128)`.
///
/// The accumulator is keyed once per cipher key and reused across
/// messages: `set_associated_data` fixes the associated-data baseline,
/// `start` begins a message from that baseline, `update` absorbs
/// ciphertext, and `finalize` appends the length block and returns the
/// masked authenticator.
pub struct GHash {
    mult: Multiplier,

    /// Hash of the associated data alone; copied into `ghash` by `start`.
    h_ad: Block,

    /// Running hash state for the current message.
    ghash: Block,

    /// Encrypted initial counter block, XORed into the final hash.
    nonce_mask: Block,

    ad_len: u64,
    text_len: u64,
}

impl GHash {
    /// Initialize GHASH with the given `H` field element, building the
    /// multiplication table for the fallback path (or loading the key for
    /// the carry-less-multiply path) exactly once.
    #[must_use]
    pub fn new(h: &Block) -> Self {
        Self {
            mult: Multiplier::new(h),
            h_ad: [0u8; BLOCK_SIZE],
            ghash: [0u8; BLOCK_SIZE],
            nonce_mask: [0u8; BLOCK_SIZE],
            ad_len: 0,
            text_len: 0,
        }
    }

    /// Set the associated data for subsequent messages.
    ///
    /// The baseline is hashed once here and reused by every following
    /// [`GHash::start`]; if the associated data changes this must be
    /// called again. Never calling it is equivalent to empty associated
    /// data.
    pub fn set_associated_data(&mut self, ad: &[u8]) {
        self.h_ad.zeroize();
        hash_into(&self.mult, &mut self.h_ad, ad);
        self.ad_len = ad.len() as u64;
    }

    /// Begin a message: reset the running state to the associated-data
    /// baseline and latch the encrypted initial counter block, which
    /// [`GHash::finalize`] folds into the returned authenticator.
    pub fn start(&mut self, enc_y0: &Block) {
        self.ghash = self.h_ad;
        self.nonce_mask = *enc_y0;
        self.text_len = 0;
    }

    /// Absorb message text (ciphertext, in GCM's case).
    ///
    /// Full 16-byte blocks are hashed directly. A trailing partial block
    /// is zero-padded before its multiplication, so only the last call
    /// for a given message may supply a length that is not a multiple of
    /// 16 bytes.
    pub fn update(&mut self, input: &[u8]) {
        self.text_len += input.len() as u64;
        hash_into(&self.mult, &mut self.ghash, input);
    }

    /// Append the length block, apply the nonce-derived mask and return
    /// the 128-bit authenticator.
    ///
    /// Message-scoped state (running hash, mask, text counter) is cleared;
    /// the key schedule and associated-data baseline persist for the next
    /// message.
    pub fn finalize(&mut self) -> Block {
        let footer = length_block(self.ad_len, self.text_len);
        hash_into(&self.mult, &mut self.ghash, &footer);

        let mut mac = self.ghash;
        for (m, n) in mac.iter_mut().zip(self.nonce_mask.iter()) {
            *m ^= n;
        }

        self.ghash.zeroize();
        self.nonce_mask.zeroize();
        self.text_len = 0;
        mac
    }

    /// Derive the initial counter block `Y0` for a nonce that is not 96
    /// bits long.
    ///
    /// The nonce is hashed as message data followed by a length block
    /// whose associated-data count is zero and whose text count is the
    /// nonce's bit length, independent of any message in flight.
    #[must_use]
    pub fn nonce_hash(&self, nonce: &[u8]) -> Block {
        let mut y0 = [0u8; BLOCK_SIZE];
        hash_into(&self.mult, &mut y0, nonce);
        let footer = length_block(0, nonce.len() as u64);
        hash_into(&self.mult, &mut y0, &footer);
        y0
    }

    /// Clear all message- and associated-data-scoped state, keeping the
    /// key schedule.
    pub fn reset(&mut self) {
        self.h_ad.zeroize();
        self.ghash.zeroize();
        self.nonce_mask.zeroize();
        self.ad_len = 0;
        self.text_len = 0;
    }

    /// Name of the multiplier backend in use (`"clmul"` or `"soft"`).
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.mult.provider()
    }
}

impl Drop for GHash {
    fn drop(&mut self) {
        self.mult.zeroize();
        self.h_ad.zeroize();
        self.ghash.zeroize();
        self.nonce_mask.zeroize();
        self.ad_len = 0;
        self.text_len = 0;
    }
}

opaque_debug::implement!(GHash);

/// Hash `input` into `state`: XOR each block then multiply by `H`.
///
/// A trailing partial block is zero-padded; it is assumed to be the last
/// input of the message.
fn hash_into(mult: &Multiplier, state: &mut Block, input: &[u8]) {
    let mut chunks = input.chunks_exact(BLOCK_SIZE);

    for block in &mut chunks {
        for (s, b) in state.iter_mut().zip(block.iter()) {
            *s ^= b;
        }
        mult.mul(state);
    }

    let rem = chunks.remainder();
    if !rem.is_empty() {
        let mut last = [0u8; BLOCK_SIZE];
        last[..rem.len()].copy_from_slice(rem);
        for (s, b) in state.iter_mut().zip(last.iter()) {
            *s ^= b;
        }
        mult.mul(state);
        last.zeroize();
    }
}

/// The 16-byte length block: big-endian 64-bit *bit* counts of the
/// associated data and the text.
fn length_block(ad_len: u64, text_len: u64) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block[..8].copy_from_slice(&(8 * ad_len).to_be_bytes());
    block[8..].copy_from_slice(&(8 * text_len).to_be_bytes());
    block
}
