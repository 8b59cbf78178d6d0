//! Galois/Counter Mode (GCM) built from a pluggable 128-bit block
//! cipher, a big-endian counter-mode generator and the [`ghash`]
//! authenticator.
//!
//! # Usage
//!
//! ```
//! # #[cfg(feature = "aes")] {
//! use gcm::{BlockCipherRegistry, GcmDecryption, GcmEncryption};
//!
//! let registry = BlockCipherRegistry::default();
//! let key = [0x42u8; 16];
//! let nonce = [0x24u8; 12];
//!
//! let mut enc = GcmEncryption::for_algorithm(&registry, "AES-128", 16).unwrap();
//! enc.set_key(&key).unwrap();
//! enc.set_associated_data(b"header").unwrap();
//! enc.start(&nonce).unwrap();
//!
//! let mut buffer = b"attack at dawn".to_vec();
//! enc.finish(&mut buffer, 0).unwrap();
//!
//! let mut dec = GcmDecryption::for_algorithm(&registry, "AES-128", 16).unwrap();
//! dec.set_key(&key).unwrap();
//! dec.set_associated_data(b"header").unwrap();
//! dec.start(&nonce).unwrap();
//! dec.finish(&mut buffer, 0).unwrap();
//!
//! assert_eq!(buffer, b"attack at dawn");
//! # }
//! ```
//!
//! # Security Notes
//!
//! Nonces must never repeat under the same key; GCM offers no
//! protection against nonce reuse. Tag verification is constant-time
//! and on failure the decrypted buffer is wiped before the error is
//! returned.

#![no_std]
#![warn(missing_docs, rust_2018_idioms)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod error;

mod cipher;
mod ctr;
mod mode;
mod registry;

pub use crate::cipher::BlockCipher;
pub use crate::error::{Error, Result};
pub use crate::mode::{Gcm, GcmDecryption, GcmEncryption};
pub use crate::registry::{BlockCipherConstructor, BlockCipherRegistry};

#[cfg(feature = "aes")]
pub use crate::cipher::{Aes128, Aes192, Aes256};

/// GCM operates on 128-bit blocks.
pub const BLOCK_SIZE: usize = 16;
