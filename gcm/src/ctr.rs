//! Big-endian counter-mode keystream generator.
//!
//! The generator takes sole ownership of its block cipher. After
//! [`CtrBe::set_counter_block`] the first 16 keystream bytes are the
//! encryption of the counter block itself, which is exactly the
//! `E(Y0)` value GCM folds into its tag; subsequent blocks encrypt the
//! incremented counter. Only the low `ctr_width` bytes of the counter
//! participate in the (wrapping) increment.

use alloc::boxed::Box;
use zeroize::Zeroize;

use crate::cipher::BlockCipher;
use crate::error::Result;
use crate::BLOCK_SIZE;

pub(crate) struct CtrBe {
    cipher: Box<dyn BlockCipher>,
    counter: [u8; BLOCK_SIZE],
    pad: [u8; BLOCK_SIZE],
    pad_pos: usize,
    ctr_width: usize,
}

impl CtrBe {
    pub(crate) fn new(cipher: Box<dyn BlockCipher>, ctr_width: usize) -> Self {
        debug_assert!((1..=BLOCK_SIZE).contains(&ctr_width));
        Self {
            cipher,
            counter: [0u8; BLOCK_SIZE],
            pad: [0u8; BLOCK_SIZE],
            // Exhausted until a counter block is set.
            pad_pos: BLOCK_SIZE,
            ctr_width,
        }
    }

    pub(crate) fn set_key(&mut self, key: &[u8]) -> Result<()> {
        self.cipher.set_key(key)?;
        self.counter.zeroize();
        self.pad.zeroize();
        self.pad_pos = BLOCK_SIZE;
        Ok(())
    }

    /// Position the keystream at `block`, so the next 16 bytes produced
    /// are its encryption.
    pub(crate) fn set_counter_block(&mut self, block: &[u8; BLOCK_SIZE]) -> Result<()> {
        self.counter = *block;
        self.refill()
    }

    /// XOR the keystream into `buf` in place.
    pub(crate) fn apply_keystream(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut offset = 0;
        while offset < buf.len() {
            if self.pad_pos == BLOCK_SIZE {
                self.increment();
                self.refill()?;
            }
            let take = (BLOCK_SIZE - self.pad_pos).min(buf.len() - offset);
            for i in 0..take {
                buf[offset + i] ^= self.pad[self.pad_pos + i];
            }
            self.pad_pos += take;
            offset += take;
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.cipher.clear();
        self.counter.zeroize();
        self.pad.zeroize();
        self.pad_pos = BLOCK_SIZE;
    }

    fn refill(&mut self) -> Result<()> {
        self.pad = self.counter;
        self.cipher.encrypt_block(&mut self.pad)?;
        self.pad_pos = 0;
        Ok(())
    }

    /// Big-endian increment over the low `ctr_width` bytes, wrapping
    /// without carrying into the rest of the block.
    fn increment(&mut self) {
        for i in (BLOCK_SIZE - self.ctr_width..BLOCK_SIZE).rev() {
            let (byte, carry) = self.counter[i].overflowing_add(1);
            self.counter[i] = byte;
            if !carry {
                break;
            }
        }
    }
}

impl Drop for CtrBe {
    fn drop(&mut self) {
        self.counter.zeroize();
        self.pad.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockCipher, CtrBe, BLOCK_SIZE};
    use crate::error::Result;
    use alloc::boxed::Box;

    /// Cipher that leaves blocks untouched, exposing the raw counter
    /// sequence as keystream.
    struct Identity;

    impl BlockCipher for Identity {
        fn set_key(&mut self, _key: &[u8]) -> Result<()> {
            Ok(())
        }

        fn encrypt_block(&self, _block: &mut [u8; BLOCK_SIZE]) -> Result<()> {
            Ok(())
        }

        fn block_size(&self) -> usize {
            BLOCK_SIZE
        }

        fn name(&self) -> &'static str {
            "identity"
        }

        fn clear(&mut self) {}
    }

    #[test]
    fn first_block_is_counter_block_itself() {
        let mut ctr = CtrBe::new(Box::new(Identity), 4);
        let mut y0 = [0u8; BLOCK_SIZE];
        y0[..12].copy_from_slice(&[0xabu8; 12]);
        y0[15] = 1;

        ctr.set_counter_block(&y0).unwrap();
        let mut out = [0u8; BLOCK_SIZE];
        ctr.apply_keystream(&mut out).unwrap();
        assert_eq!(out, y0);
    }

    #[test]
    fn counter_increments_low_word_only() {
        let mut ctr = CtrBe::new(Box::new(Identity), 4);
        let mut y0 = [0xffu8; BLOCK_SIZE];
        y0[12..].copy_from_slice(&0xffff_fffeu32.to_be_bytes());

        ctr.set_counter_block(&y0).unwrap();
        let mut out = [0u8; 3 * BLOCK_SIZE];
        ctr.apply_keystream(&mut out).unwrap();

        // Block 0: Y0 itself. Block 1: low word ffffffff. Block 2: the
        // low word wraps to zero without touching the upper 12 bytes.
        assert_eq!(&out[16..28], &[0xffu8; 12]);
        assert_eq!(&out[28..32], &0xffff_ffffu32.to_be_bytes());
        assert_eq!(&out[32..44], &[0xffu8; 12]);
        assert_eq!(&out[44..48], &0u32.to_be_bytes());
    }

    #[test]
    fn keystream_is_contiguous_across_call_boundaries() {
        let mut ctr = CtrBe::new(Box::new(Identity), 4);
        let y0 = [0x11u8; BLOCK_SIZE];

        ctr.set_counter_block(&y0).unwrap();
        let mut one_shot = [0u8; 40];
        ctr.apply_keystream(&mut one_shot).unwrap();

        ctr.set_counter_block(&y0).unwrap();
        let mut split = [0u8; 40];
        let (a, b) = split.split_at_mut(7);
        ctr.apply_keystream(a).unwrap();
        ctr.apply_keystream(b).unwrap();

        assert_eq!(one_shot, split);
    }
}
