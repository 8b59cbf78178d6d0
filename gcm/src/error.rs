//! Error types for GCM construction and use.
//!
//! The taxonomy separates construction-time configuration errors,
//! per-message usage errors, input errors and the integrity failure.
//! Integrity failure is its own variant so callers can reject a
//! ciphertext without learning anything beyond "authentication failed".

use alloc::string::String;
use core::fmt;

/// The error type for GCM operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The block cipher handed to the mode does not have a 128-bit block.
    InvalidBlockSize {
        /// Name of the offending cipher.
        cipher: &'static str,
        /// Its block size in bytes.
        size: usize,
    },

    /// The requested tag size is not 8 (deprecated) or 12..=16 bytes.
    InvalidTagSize(usize),

    /// The key length is outside the cipher's accepted range.
    InvalidKeyLength {
        /// Name of the cipher that rejected the key.
        cipher: &'static str,
        /// The rejected length in bytes.
        length: usize,
    },

    /// The nonce length is not accepted by the mode.
    InvalidNonceLength(usize),

    /// A non-final `process` call supplied a length that is not a
    /// multiple of the update granularity.
    UnalignedUpdate {
        /// The offending buffer length in bytes.
        length: usize,
        /// The required granularity in bytes.
        granularity: usize,
    },

    /// An operation was invoked outside its valid state-machine window.
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// What must happen first.
        expected: &'static str,
    },

    /// `finish` on decryption was handed fewer bytes than the tag.
    InsufficientInput {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// Tag verification failed. The output buffer must be discarded.
    IntegrityFailure,

    /// No algorithm registered under the requested name.
    AlgorithmNotFound(String),
}

/// Result type for GCM operations.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidBlockSize { cipher, size } => {
                write!(f, "{} has a {}-byte block; GCM requires 16", cipher, size)
            }
            Error::InvalidTagSize(size) => {
                write!(f, "bad GCM tag size {}", size)
            }
            Error::InvalidKeyLength { cipher, length } => {
                write!(f, "invalid key length {} for {}", length, cipher)
            }
            Error::InvalidNonceLength(length) => {
                write!(f, "invalid nonce length {}", length)
            }
            Error::UnalignedUpdate {
                length,
                granularity,
            } => {
                write!(
                    f,
                    "update length {} is not a multiple of {}",
                    length, granularity
                )
            }
            Error::InvalidState {
                operation,
                expected,
            } => {
                write!(f, "{} called before {}", operation, expected)
            }
            Error::InsufficientInput { needed, available } => {
                write!(
                    f,
                    "insufficient input: needed {}, got {}",
                    needed, available
                )
            }
            // Deliberately carries no detail about where the mismatch was.
            Error::IntegrityFailure => write!(f, "authentication failed"),
            Error::AlgorithmNotFound(name) => {
                write!(f, "algorithm not found: {}", name)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
