//! The GCM mode controller and its encryption/decryption wrappers.
//!
//! [`Gcm`] owns the counter-mode generator (which in turn owns the block
//! cipher) and the GHASH accumulator, and performs key and nonce setup.
//! [`GcmEncryption`] and [`GcmDecryption`] fix the direction-specific
//! order of operations: encryption applies the keystream first and hashes
//! the resulting ciphertext, decryption hashes the ciphertext first and
//! then applies the keystream. In both directions it is the ciphertext
//! that is authenticated.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::cipher::BlockCipher;
use crate::ctr::CtrBe;
use crate::error::{Error, Result};
use crate::registry::BlockCipherRegistry;
use crate::BLOCK_SIZE;

use ghash::GHash;

/// Per-message lifecycle of a mode instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MsgState {
    /// Constructed, no key scheduled.
    Unkeyed,
    /// Key scheduled, no message in flight.
    KeyedIdle,
    /// Nonce processed, no data yet.
    NonceStarted,
    /// At least one `process` call absorbed.
    Streaming,
    /// `finish` consumed the message; a new `start` begins the next one.
    Finalized,
}

/// GCM mode controller: key/nonce setup shared by both directions.
pub struct Gcm {
    ctr: CtrBe,
    ghash: Option<GHash>,
    cipher_name: &'static str,
    tag_size: usize,
    state: MsgState,
}

impl Gcm {
    /// Wrap `cipher` in GCM with the given tag size in bytes.
    ///
    /// Accepted tag sizes are 12 through 16 bytes, and 8 bytes for
    /// compatibility with legacy peers. 8-byte tags offer sharply reduced
    /// forgery resistance and should not be chosen for new designs.
    pub fn new(cipher: Box<dyn BlockCipher>, tag_size: usize) -> Result<Self> {
        if cipher.block_size() != BLOCK_SIZE {
            return Err(Error::InvalidBlockSize {
                cipher: cipher.name(),
                size: cipher.block_size(),
            });
        }

        if tag_size != 8 && !(12..=16).contains(&tag_size) {
            return Err(Error::InvalidTagSize(tag_size));
        }

        let cipher_name = cipher.name();
        Ok(Self {
            // Only the low 32 bits of the counter block participate in
            // the increment.
            ctr: CtrBe::new(cipher, 4),
            ghash: None,
            cipher_name,
            tag_size,
            state: MsgState::Unkeyed,
        })
    }

    /// Resolve `name` in `registry` and wrap the result in GCM.
    pub fn for_algorithm(
        registry: &BlockCipherRegistry,
        name: &str,
        tag_size: usize,
    ) -> Result<Self> {
        Self::new(registry.lookup_block_cipher(name)?, tag_size)
    }

    /// Schedule `key` for the cipher and derive the hash key
    /// `H = E_K(0^128)`, rebuilding the GHASH key schedule.
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        self.ctr.set_key(key)?;

        self.ctr.set_counter_block(&[0u8; BLOCK_SIZE])?;
        let mut h = [0u8; BLOCK_SIZE];
        self.ctr.apply_keystream(&mut h)?;

        self.ghash = Some(GHash::new(&h));
        h.zeroize();
        self.state = MsgState::KeyedIdle;
        Ok(())
    }

    /// Set the associated data authenticated alongside every following
    /// message. Must be called before `start` to take effect for that
    /// message; omitting it means empty associated data.
    pub fn set_associated_data(&mut self, ad: &[u8]) -> Result<()> {
        let ghash = self.ghash.as_mut().ok_or(Error::InvalidState {
            operation: "set_associated_data",
            expected: "set_key",
        })?;
        ghash.set_associated_data(ad);
        Ok(())
    }

    /// Begin a message under `nonce`.
    ///
    /// A 96-bit nonce becomes the initial counter block directly
    /// (`nonce || 0^31 || 1`); any other nonzero length is hashed into
    /// the counter block via GHASH. The nonce must never repeat under
    /// the same key; the mode has no defense against reuse.
    pub fn start(&mut self, nonce: &[u8]) -> Result<()> {
        let ghash = self.ghash.as_mut().ok_or(Error::InvalidState {
            operation: "start",
            expected: "set_key",
        })?;

        if nonce.is_empty() {
            return Err(Error::InvalidNonceLength(0));
        }

        let mut y0 = [0u8; BLOCK_SIZE];
        if nonce.len() == 12 {
            y0[..12].copy_from_slice(nonce);
            y0[15] = 1;
        } else {
            y0 = ghash.nonce_hash(nonce);
        }

        self.ctr.set_counter_block(&y0)?;

        // The generator's first keystream block is E(Y0); latch it as the
        // tag mask and leave the stream positioned at Y0 + 1 for the
        // message body.
        let mut enc_y0 = [0u8; BLOCK_SIZE];
        self.ctr.apply_keystream(&mut enc_y0)?;
        ghash.start(&enc_y0);

        y0.zeroize();
        enc_y0.zeroize();
        self.state = MsgState::NonceStarted;
        Ok(())
    }

    /// Tag size in bytes.
    #[must_use]
    pub fn tag_size(&self) -> usize {
        self.tag_size
    }

    /// Required alignment for non-final `process` calls, in bytes.
    #[must_use]
    pub fn update_granularity(&self) -> usize {
        BLOCK_SIZE
    }

    /// Mode name, e.g. `"AES-128/GCM(128)"`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}/GCM({})", self.cipher_name, self.tag_size * 8)
    }

    /// Name of the active field-multiplier backend (`"clmul"` or
    /// `"soft"`).
    #[must_use]
    pub fn provider(&self) -> &'static str {
        match &self.ghash {
            Some(g) => g.backend(),
            None => ghash::provider(),
        }
    }

    /// Abandon any message in flight, keeping the key schedule.
    pub fn reset(&mut self) {
        if let Some(ghash) = self.ghash.as_mut() {
            ghash.reset();
        }
        if self.state != MsgState::Unkeyed {
            self.state = MsgState::KeyedIdle;
        }
    }

    /// Wipe all key material and message state.
    pub fn clear(&mut self) {
        self.ctr.clear();
        // Dropping the accumulator zeroizes its table and state.
        self.ghash = None;
        self.state = MsgState::Unkeyed;
    }

    /// Validate a non-final `process` call and mark the stream active.
    fn begin_update(&mut self, len: usize) -> Result<()> {
        match self.state {
            MsgState::NonceStarted | MsgState::Streaming => {}
            _ => {
                return Err(Error::InvalidState {
                    operation: "process",
                    expected: "start",
                })
            }
        }

        if len % BLOCK_SIZE != 0 {
            return Err(Error::UnalignedUpdate {
                length: len,
                granularity: BLOCK_SIZE,
            });
        }

        self.state = MsgState::Streaming;
        Ok(())
    }

    /// Validate a `finish` call against the state machine and `offset`.
    fn begin_finish(&self, buffer_len: usize, offset: usize) -> Result<()> {
        match self.state {
            MsgState::NonceStarted | MsgState::Streaming => {}
            _ => {
                return Err(Error::InvalidState {
                    operation: "finish",
                    expected: "start",
                })
            }
        }

        if offset > buffer_len {
            return Err(Error::InsufficientInput {
                needed: offset,
                available: buffer_len,
            });
        }

        Ok(())
    }

    /// The accumulator, which is always present while a message is in
    /// flight (guarded by `begin_update`/`begin_finish`).
    fn ghash_mut(&mut self) -> &mut GHash {
        self.ghash.as_mut().expect("message in flight implies key")
    }
}

// Debug output reveals nothing: these types carry key material.
impl fmt::Debug for Gcm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Gcm { ... }")
    }
}

impl fmt::Debug for GcmEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GcmEncryption { ... }")
    }
}

impl fmt::Debug for GcmDecryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GcmDecryption { ... }")
    }
}

/// GCM encryption: produces `ciphertext || tag`.
pub struct GcmEncryption {
    mode: Gcm,
}

impl GcmEncryption {
    /// Wrap `cipher` for encryption with the given tag size in bytes.
    pub fn new(cipher: Box<dyn BlockCipher>, tag_size: usize) -> Result<Self> {
        Ok(Self {
            mode: Gcm::new(cipher, tag_size)?,
        })
    }

    /// Resolve `name` in `registry` and wrap the result for encryption.
    pub fn for_algorithm(
        registry: &BlockCipherRegistry,
        name: &str,
        tag_size: usize,
    ) -> Result<Self> {
        Ok(Self {
            mode: Gcm::for_algorithm(registry, name, tag_size)?,
        })
    }

    /// Encrypt `buf` in place and authenticate the resulting ciphertext.
    ///
    /// Every call except the last in a message must supply a multiple of
    /// [`Gcm::update_granularity`] bytes.
    pub fn process(&mut self, buf: &mut [u8]) -> Result<()> {
        self.mode.begin_update(buf.len())?;
        self.mode.ctr.apply_keystream(buf)?;
        self.mode.ghash_mut().update(buf);
        Ok(())
    }

    /// Encrypt any remaining bytes past `offset` (the only place a
    /// partial block is allowed) and append the tag to `buffer`.
    pub fn finish(&mut self, buffer: &mut Vec<u8>, offset: usize) -> Result<()> {
        self.mode.begin_finish(buffer.len(), offset)?;

        let tail = &mut buffer[offset..];
        self.mode.ctr.apply_keystream(tail)?;
        let ghash = self.mode.ghash_mut();
        ghash.update(tail);

        let mut mac = ghash.finalize();
        buffer.extend_from_slice(&mac[..self.mode.tag_size]);
        mac.zeroize();

        self.mode.state = MsgState::Finalized;
        Ok(())
    }
}

/// GCM decryption: consumes `ciphertext || tag`, verifying the tag in
/// constant time before any plaintext is released.
pub struct GcmDecryption {
    mode: Gcm,
}

impl GcmDecryption {
    /// Wrap `cipher` for decryption with the given tag size in bytes.
    pub fn new(cipher: Box<dyn BlockCipher>, tag_size: usize) -> Result<Self> {
        Ok(Self {
            mode: Gcm::new(cipher, tag_size)?,
        })
    }

    /// Resolve `name` in `registry` and wrap the result for decryption.
    pub fn for_algorithm(
        registry: &BlockCipherRegistry,
        name: &str,
        tag_size: usize,
    ) -> Result<Self> {
        Ok(Self {
            mode: Gcm::for_algorithm(registry, name, tag_size)?,
        })
    }

    /// Authenticate and decrypt `buf` in place.
    ///
    /// The ciphertext is hashed before the keystream touches it. Every
    /// call except the last in a message must supply a multiple of
    /// [`Gcm::update_granularity`] bytes.
    pub fn process(&mut self, buf: &mut [u8]) -> Result<()> {
        self.mode.begin_update(buf.len())?;
        self.mode.ghash_mut().update(buf);
        self.mode.ctr.apply_keystream(buf)?;
        Ok(())
    }

    /// Decrypt the remaining ciphertext past `offset` and verify the tag
    /// occupying the end of `buffer`.
    ///
    /// On success the tag is stripped from `buffer`. On mismatch the
    /// decrypted region is wiped and [`Error::IntegrityFailure`] is
    /// returned; the buffer contents must be discarded.
    pub fn finish(&mut self, buffer: &mut Vec<u8>, offset: usize) -> Result<()> {
        self.mode.begin_finish(buffer.len(), offset)?;

        let tag_size = self.mode.tag_size;
        let sz = buffer.len() - offset;
        if sz < tag_size {
            return Err(Error::InsufficientInput {
                needed: tag_size,
                available: sz,
            });
        }
        let remaining = sz - tag_size;

        let tail = &mut buffer[offset..offset + remaining];
        let ghash = self.mode.ghash_mut();
        ghash.update(tail);
        self.mode.ctr.apply_keystream(tail)?;

        let mut mac = self.mode.ghash_mut().finalize();
        let included_tag = &buffer[offset + remaining..];
        let tag_ok = bool::from(mac[..tag_size].ct_eq(included_tag));
        mac.zeroize();

        self.mode.state = MsgState::Finalized;

        if !tag_ok {
            buffer[offset..offset + remaining].zeroize();
            buffer.truncate(offset);
            return Err(Error::IntegrityFailure);
        }

        buffer.truncate(offset + remaining);
        Ok(())
    }
}

macro_rules! forward_mode_api {
    ($wrapper:ty) => {
        impl $wrapper {
            /// See [`Gcm::set_key`].
            pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
                self.mode.set_key(key)
            }

            /// See [`Gcm::set_associated_data`].
            pub fn set_associated_data(&mut self, ad: &[u8]) -> Result<()> {
                self.mode.set_associated_data(ad)
            }

            /// See [`Gcm::start`].
            pub fn start(&mut self, nonce: &[u8]) -> Result<()> {
                self.mode.start(nonce)
            }

            /// See [`Gcm::tag_size`].
            #[must_use]
            pub fn tag_size(&self) -> usize {
                self.mode.tag_size()
            }

            /// See [`Gcm::update_granularity`].
            #[must_use]
            pub fn update_granularity(&self) -> usize {
                self.mode.update_granularity()
            }

            /// See [`Gcm::name`].
            #[must_use]
            pub fn name(&self) -> String {
                self.mode.name()
            }

            /// See [`Gcm::provider`].
            #[must_use]
            pub fn provider(&self) -> &'static str {
                self.mode.provider()
            }

            /// See [`Gcm::reset`].
            pub fn reset(&mut self) {
                self.mode.reset()
            }

            /// See [`Gcm::clear`].
            pub fn clear(&mut self) {
                self.mode.clear()
            }
        }
    };
}

forward_mode_api!(GcmEncryption);
forward_mode_api!(GcmDecryption);
