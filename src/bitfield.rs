//! BitField - Fixed-width binary pattern backed by the bitvec crate.
//!
//! A `BitField` is the exchange format between blocks: transformers write their
//! encoding into one, learners read their input from one and publish their
//! statelet activations through another. Patterns are sparse, so most consumers
//! work with the ascending list of active indices returned by [`BitField::get_acts`].
//!
//! # Design
//!
//! - Uses `BitVec<u32, Lsb0>` for storage (32-bit words, LSB-first ordering)
//! - Bit indexing: word_idx = bit_idx / 32, bit_offset = bit_idx % 32
//! - Word-level access for the copies done by `BlockInput::pull()`
//!
//! # Examples
//!
//! ```
//! use anomblocks::BitField;
//!
//! let mut pattern = BitField::new(208);
//! pattern.set_range(16, 8);
//! assert_eq!(pattern.num_set(), 8);
//! assert_eq!(pattern.get_acts()[0], 16);
//! ```

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::BitAnd;

/// Word type for bit storage (32-bit unsigned integer)
pub type Word = u32;

/// Number of bits per word
pub const BITS_PER_WORD: usize = 32;

/// Fixed-width bit vector with word-level access.
///
/// All bit indices are 0-based. Out-of-range indices are caught by
/// `debug_assert!` in hot paths.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BitField {
    bv: BitVec<u32, Lsb0>,
}

impl BitField {
    /// Create a new BitField with `n` bits, all cleared.
    ///
    /// # Examples
    ///
    /// ```
    /// use anomblocks::BitField;
    ///
    /// let field = BitField::new(100);
    /// assert_eq!(field.num_bits(), 100);
    /// assert_eq!(field.num_words(), 4);
    /// ```
    #[inline]
    pub fn new(n: usize) -> Self {
        Self {
            bv: BitVec::repeat(false, n),
        }
    }

    /// Resize to `n` bits. All bits are cleared.
    pub fn resize(&mut self, n: usize) {
        self.bv.resize(n, false);
        self.bv.fill(false);
    }

    /// Get total number of bits.
    #[inline(always)]
    pub fn num_bits(&self) -> usize {
        self.bv.len()
    }

    /// Get number of storage words.
    #[inline(always)]
    pub fn num_words(&self) -> usize {
        self.bv.as_raw_slice().len()
    }

    /// Set bit `b` to 1.
    #[inline]
    pub fn set_bit(&mut self, b: usize) {
        debug_assert!(b < self.bv.len(), "bit index {} out of bounds (length: {})", b, self.bv.len());
        self.bv.set(b, true);
    }

    /// Get bit `b` as 0 or 1.
    #[inline]
    pub fn get_bit(&self, b: usize) -> u8 {
        debug_assert!(b < self.bv.len(), "bit index {} out of bounds (length: {})", b, self.bv.len());
        u8::from(self.bv[b])
    }

    /// Clear bit `b`.
    #[inline]
    pub fn clear_bit(&mut self, b: usize) {
        debug_assert!(b < self.bv.len(), "bit index {} out of bounds (length: {})", b, self.bv.len());
        self.bv.set(b, false);
    }

    /// Set bits `[beg, beg + len)`.
    pub fn set_range(&mut self, beg: usize, len: usize) {
        debug_assert!(beg + len <= self.bv.len());
        self.bv[beg..beg + len].fill(true);
    }

    /// Clear bits `[beg, beg + len)`.
    pub fn clear_range(&mut self, beg: usize, len: usize) {
        debug_assert!(beg + len <= self.bv.len());
        self.bv[beg..beg + len].fill(false);
    }

    /// Clear every bit.
    pub fn clear_all(&mut self) {
        self.bv.fill(false);
    }

    /// Replace the contents with the given active indices.
    ///
    /// Indices >= num_bits are silently ignored.
    pub fn set_acts(&mut self, idxs: &[usize]) {
        self.clear_all();
        for &idx in idxs {
            if idx < self.bv.len() {
                self.bv.set(idx, true);
            }
        }
    }

    /// Get indices of all set bits in ascending order.
    ///
    /// Skips empty words, which dominate sparse patterns.
    pub fn get_acts(&self) -> Vec<usize> {
        let mut acts = Vec::with_capacity(self.num_set());
        let num_bits = self.bv.len();

        for (word_idx, &word) in self.bv.as_raw_slice().iter().enumerate() {
            let mut w = word;
            while w != 0 {
                let bit_pos = word_idx * BITS_PER_WORD + w.trailing_zeros() as usize;
                if bit_pos >= num_bits {
                    break;
                }
                acts.push(bit_pos);
                w &= w - 1;
            }
        }

        acts
    }

    /// Iterate indices of set bits in ascending order without allocating.
    #[inline]
    pub fn iter_acts(&self) -> impl Iterator<Item = usize> + '_ {
        self.bv.iter_ones()
    }

    /// Overwrite this field with `src`, reusing the storage when widths match.
    pub fn assign(&mut self, src: &BitField) {
        if self.bv.len() == src.bv.len() {
            self.bv.copy_from_bitslice(&src.bv);
        } else {
            self.bv.clone_from(&src.bv);
        }
    }

    /// Count set bits.
    #[inline]
    pub fn num_set(&self) -> usize {
        self.bv.count_ones()
    }

    /// Count bits set in both fields (AND + popcount).
    ///
    /// # Panics
    ///
    /// Panics if the fields have different word counts.
    pub fn num_similar(&self, other: &BitField) -> usize {
        assert_eq!(
            self.num_words(),
            other.num_words(),
            "BitFields must have same word count"
        );

        self.words()
            .iter()
            .zip(other.words())
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Find the first set bit at or after `beg`, wrapping around to 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use anomblocks::BitField;
    ///
    /// let mut field = BitField::new(64);
    /// field.set_bit(3);
    /// field.set_bit(40);
    /// assert_eq!(field.find_next_set_bit(10), Some(40));
    /// assert_eq!(field.find_next_set_bit(41), Some(3));
    /// ```
    pub fn find_next_set_bit(&self, beg: usize) -> Option<usize> {
        if self.bv.is_empty() {
            return None;
        }
        debug_assert!(beg < self.bv.len());

        self.bv[beg..]
            .first_one()
            .map(|i| i + beg)
            .or_else(|| self.bv[..beg].first_one())
    }

    /// Copy all bits of `src` into this field starting at bit `dst_offset`.
    ///
    /// Word-aligned offsets use a straight word copy; unaligned offsets fall
    /// back to copying active indices.
    pub fn copy_from(&mut self, src: &BitField, dst_offset: usize) {
        let len = src.num_bits();
        debug_assert!(dst_offset + len <= self.num_bits(), "copy overflows destination");

        if dst_offset % BITS_PER_WORD == 0 && (len % BITS_PER_WORD == 0 || dst_offset + len == self.num_bits()) {
            let dst_word = dst_offset / BITS_PER_WORD;
            let num_words = src.num_words();
            self.words_mut()[dst_word..dst_word + num_words].copy_from_slice(src.words());
        } else {
            self.clear_range(dst_offset, len);
            for act in src.iter_acts() {
                self.bv.set(dst_offset + act, true);
            }
        }
    }

    /// Read-only access to word storage.
    #[inline(always)]
    pub fn words(&self) -> &[Word] {
        self.bv.as_raw_slice()
    }

    /// Mutable access to word storage.
    #[inline(always)]
    pub fn words_mut(&mut self) -> &mut [Word] {
        self.bv.as_raw_mut_slice()
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.bv.capacity().div_ceil(8)
    }
}

impl BitAnd for &BitField {
    type Output = BitField;

    /// Word-level AND of two equally sized fields.
    fn bitand(self, rhs: Self) -> Self::Output {
        assert_eq!(self.bv.len(), rhs.bv.len(), "BitFields must have same size");

        let mut result = self.clone();
        for (a, b) in result.words_mut().iter_mut().zip(rhs.words()) {
            *a &= *b;
        }
        result
    }
}

impl PartialEq for BitField {
    /// Word-level comparison; drives change tracking in `BlockOutput::store()`.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bv.len() == other.bv.len() && self.words() == other.words()
    }
}

impl Eq for BitField {}
