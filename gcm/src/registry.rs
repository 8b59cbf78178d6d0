//! Explicit name-to-constructor registry for block ciphers.
//!
//! There is no ambient global lookup: a registry is a value, built where
//! the application wires itself together and passed to whatever needs to
//! resolve algorithm names.

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;

use crate::cipher::BlockCipher;
use crate::error::{Error, Result};

/// Constructor for an unkeyed block cipher instance.
pub type BlockCipherConstructor = fn() -> Box<dyn BlockCipher>;

/// A mapping from algorithm names to block-cipher constructors.
pub struct BlockCipherRegistry {
    entries: BTreeMap<&'static str, BlockCipherConstructor>,
}

impl BlockCipherRegistry {
    /// A registry with nothing registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register `constructor` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &'static str, constructor: BlockCipherConstructor) {
        self.entries.insert(name, constructor);
    }

    /// Construct a fresh, unkeyed instance of the named cipher.
    pub fn lookup_block_cipher(&self, name: &str) -> Result<Box<dyn BlockCipher>> {
        self.entries
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| Error::AlgorithmNotFound(name.to_owned()))
    }

    /// Names of all registered ciphers, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

impl Default for BlockCipherRegistry {
    /// A registry holding the bundled ciphers.
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();

        #[cfg(feature = "aes")]
        {
            use crate::cipher::{Aes128, Aes192, Aes256};

            registry.register("AES-128", || Box::new(Aes128::new()));
            registry.register("AES-192", || Box::new(Aes192::new()));
            registry.register("AES-256", || Box::new(Aes256::new()));
        }

        registry
    }
}
