//! The block-cipher collaborator interface and the bundled AES adapters.
//!
//! The mode only ever sees this trait; the actual ciphers come from the
//! [registry](crate::registry) or are handed in directly by the caller.

use crate::error::{Error, Result};
use crate::BLOCK_SIZE;

/// A block cipher usable underneath the mode.
///
/// GCM requires [`BlockCipher::block_size`] to be 16; anything else is
/// rejected when the mode is constructed.
pub trait BlockCipher {
    /// Schedule `key`, replacing any previous key.
    fn set_key(&mut self, key: &[u8]) -> Result<()>;

    /// Encrypt one block in place. Fails if no key is scheduled.
    fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) -> Result<()>;

    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Human-readable cipher name, e.g. `"AES-128"`.
    fn name(&self) -> &'static str;

    /// Discard and zero any scheduled key material.
    fn clear(&mut self);
}

#[cfg(feature = "aes")]
mod aes_impl {
    use super::{BlockCipher, Error, Result, BLOCK_SIZE};
    use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};

    macro_rules! aes_cipher {
        ($(#[doc = $doc:expr])* $name:ident, $inner:ty, $cipher_name:expr) => {
            $(#[doc = $doc])*
            #[derive(Default)]
            pub struct $name {
                // `None` until a key is scheduled; the `aes` crate's
                // `zeroize` feature wipes the schedule when it is dropped
                // or replaced.
                keyed: Option<$inner>,
            }

            impl $name {
                /// Create the cipher with no key scheduled.
                #[must_use]
                pub fn new() -> Self {
                    Self::default()
                }
            }

            impl BlockCipher for $name {
                fn set_key(&mut self, key: &[u8]) -> Result<()> {
                    let cipher =
                        <$inner>::new_from_slice(key).map_err(|_| Error::InvalidKeyLength {
                            cipher: $cipher_name,
                            length: key.len(),
                        })?;
                    self.keyed = Some(cipher);
                    Ok(())
                }

                fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) -> Result<()> {
                    let cipher = self.keyed.as_ref().ok_or(Error::InvalidState {
                        operation: "encrypt_block",
                        expected: "set_key",
                    })?;
                    cipher.encrypt_block(GenericArray::from_mut_slice(block));
                    Ok(())
                }

                fn block_size(&self) -> usize {
                    BLOCK_SIZE
                }

                fn name(&self) -> &'static str {
                    $cipher_name
                }

                fn clear(&mut self) {
                    self.keyed = None;
                }
            }
        };
    }

    aes_cipher!(
        /// AES with a 128-bit key.
        Aes128, aes::Aes128, "AES-128"
    );
    aes_cipher!(
        /// AES with a 192-bit key.
        Aes192, aes::Aes192, "AES-192"
    );
    aes_cipher!(
        /// AES with a 256-bit key.
        Aes256, aes::Aes256, "AES-256"
    );
}

#[cfg(feature = "aes")]
pub use aes_impl::{Aes128, Aes192, Aes256};
