//! A word-packed array of bits with caller-owned storage.

use std::ops::Range;

use tagsieve_common::{Result, error::Error};

use crate::bit_store::WordStore;

/// Number of bits held by a single storage word.
pub const WORD_BITS: usize = 32;

/// Returns the number of 32-bit words needed to hold `n` bits.
///
/// `(n - 1) / 32 + 1` for `n > 0`, otherwise `0`.
#[inline]
pub fn to_word_count(n: usize) -> usize {
    if n > 0 { (n - 1) / WORD_BITS + 1 } else { 0 }
}

/// A packed array of bits stored in `u32` words.
///
/// Bit `i` lives in word `i / 32` at bit offset `i % 32` (LSB first). The array never
/// allocates on its own: the caller provides the word buffer, which may be a stack
/// array, a borrowed slice, or a heap box (see [`PackedBitArray::zeroed`] for the
/// latter).
///
/// # Logical cap
///
/// An optional `max_allowed_bit` bounds the logical length below the storage capacity.
/// [`cardinality`](Self::cardinality), [`positions`](Self::positions),
/// [`iter`](Self::iter), [`count_runs`](Self::count_runs) and
/// [`ranges_iter`](Self::ranges_iter) only consider bits strictly below
/// `min(max_allowed_bit, capacity_bits)`. Writes and [`invert`](Self::invert) are not
/// restricted by the cap; bits above it stay in storage and are simply not reported.
///
/// # Bounds asymmetry
///
/// [`mark_bit`](Self::mark_bit) rejects positions outside the word storage with
/// [`ErrorKind::BitOutOfRange`](tagsieve_common::error::ErrorKind::BitOutOfRange),
/// while [`is_marked`](Self::is_marked) answers `false` for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBitArray<S> {
    words: S,
    max_allowed_bit: Option<usize>,
}

impl<S: AsRef<[u32]>> PackedBitArray<S> {
    /// Wraps `words` as a bit array. The word count is the storage length.
    pub fn new(words: S) -> PackedBitArray<S> {
        PackedBitArray {
            words,
            max_allowed_bit: None,
        }
    }

    /// Sets the logical cap and returns the array.
    pub fn with_max_allowed_bit(mut self, max_allowed_bit: usize) -> PackedBitArray<S> {
        self.max_allowed_bit = Some(max_allowed_bit);
        self
    }

    pub fn set_max_allowed_bit(&mut self, max_allowed_bit: Option<usize>) {
        self.max_allowed_bit = max_allowed_bit;
    }

    pub fn max_allowed_bit(&self) -> Option<usize> {
        self.max_allowed_bit
    }

    /// Same as the free function [`to_word_count`].
    #[inline]
    pub fn to_word_count(n: usize) -> usize {
        to_word_count(n)
    }

    #[inline]
    pub fn word_count(&self) -> usize {
        self.words.as_ref().len()
    }

    #[inline]
    pub fn capacity_bits(&self) -> usize {
        self.word_count() * WORD_BITS
    }

    /// Number of leading bits visible to counting and enumeration:
    /// `min(max_allowed_bit, capacity_bits)`.
    #[inline]
    pub fn logical_len(&self) -> usize {
        let capacity = self.capacity_bits();
        self.max_allowed_bit
            .map_or(capacity, |cap| cap.min(capacity))
    }

    #[inline]
    pub fn storage(&self) -> &[u32] {
        self.words.as_ref()
    }

    pub fn into_storage(self) -> S {
        self.words
    }

    /// Returns whether the bit at `position` is set.
    ///
    /// Positions outside the word storage are reported as not set.
    #[inline]
    pub fn is_marked(&self, position: usize) -> bool {
        let (word_index, bit) = bit_position(position);
        self.storage()
            .get(word_index)
            .is_some_and(|word| word & (1u32 << bit) != 0)
    }

    /// Population count of the bits below [`logical_len`](Self::logical_len).
    pub fn cardinality(&self) -> usize {
        self.visible_words().map(|w| w.count_ones() as usize).sum()
    }

    /// Ascending list of the set positions below [`logical_len`](Self::logical_len).
    ///
    /// Fails with `EnumerationMismatch` if the enumeration disagrees with
    /// [`cardinality`](Self::cardinality).
    pub fn positions(&self) -> Result<Vec<usize>> {
        let cardinality = self.cardinality();
        let mut positions = Vec::with_capacity(cardinality);
        positions.extend(self.iter());
        if positions.len() != cardinality {
            return Err(Error::enumeration_mismatch(
                positions.len() as u64,
                cardinality as u64,
            ));
        }
        Ok(positions)
    }

    /// Lazy ascending iterator over the set positions below the logical length.
    pub fn iter(&self) -> PackedBitIter<'_> {
        let len = self.logical_len();
        PackedBitIter {
            words: self.storage()[..to_word_count(len)].iter(),
            current_word: 0,
            next_word_index: 0,
            base_index: 0,
            len,
        }
    }

    /// Counts maximal runs of consecutive set bits below the logical length.
    pub fn count_runs(&self) -> usize {
        let mut runs = 0usize;
        let mut prev_word = 0u32;
        for word in self.visible_words() {
            let shifted_prev = (word << 1) | (prev_word >> (WORD_BITS - 1));
            runs += (word & !shifted_prev).count_ones() as usize;
            prev_word = word;
        }
        runs
    }

    /// Iterator over maximal `[start, end)` runs of set bits below the logical length.
    pub fn ranges_iter(&self) -> PackedRangesIter<'_> {
        PackedRangesIter {
            words: self.storage(),
            cursor: 0,
            len: self.logical_len(),
        }
    }

    /// Storage words truncated to the logical length: words beyond it are skipped and
    /// the last visible word is masked.
    fn visible_words(&self) -> impl Iterator<Item = u32> + '_ {
        let len = self.logical_len();
        let count = to_word_count(len);
        let tail = len % WORD_BITS;
        self.storage()[..count]
            .iter()
            .enumerate()
            .map(move |(i, &word)| {
                if i + 1 == count && tail != 0 {
                    word & low_mask(tail)
                } else {
                    word
                }
            })
    }
}

impl<S: AsRef<[u32]> + AsMut<[u32]>> PackedBitArray<S> {
    /// Sets the bit at `position`.
    ///
    /// Fails with `BitOutOfRange` when `position / 32` is not a valid word index.
    /// The logical cap does not restrict writes.
    #[inline]
    pub fn mark_bit(&mut self, position: usize) -> Result<()> {
        let word_count = self.word_count();
        let (word_index, bit) = bit_position(position);
        match self.words.as_mut().get_mut(word_index) {
            Some(word) => {
                *word |= 1u32 << bit;
                Ok(())
            }
            None => Err(Error::bit_out_of_range(position, word_count)),
        }
    }

    /// Sets the bit at `position` without producing an error.
    ///
    /// # Panics
    ///
    /// Panics if `position` lies outside the word storage.
    #[inline]
    pub fn set(&mut self, position: usize) {
        let (word_index, bit) = bit_position(position);
        self.storage_mut()[word_index] |= 1u32 << bit;
    }

    /// Sets every bit in `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range.end` exceeds the storage capacity.
    pub fn set_range(&mut self, range: Range<usize>) {
        let Range { start, end } = range;
        if start >= end {
            return;
        }
        assert!(
            end <= self.capacity_bits(),
            "range end {end} exceeds capacity {}",
            self.capacity_bits()
        );
        let (start_word, start_bit) = bit_position(start);
        let (end_word, end_bit) = bit_position(end);
        let words = self.storage_mut();
        if start_word == end_word {
            words[start_word] |= low_mask(end_bit) & !low_mask(start_bit);
        } else {
            words[start_word] |= !low_mask(start_bit);
            for word in &mut words[start_word + 1..end_word] {
                *word = u32::MAX;
            }
            if end_bit > 0 {
                words[end_word] |= low_mask(end_bit);
            }
        }
    }

    /// Complements every storage word. The logical cap is ignored, so bits above it
    /// become set; call [`mask_beyond_cap`](Self::mask_beyond_cap) to clear them.
    pub fn invert(&mut self) {
        for word in self.storage_mut() {
            *word = !*word;
        }
    }

    /// Clears every bit at or above the logical length.
    pub fn mask_beyond_cap(&mut self) {
        let len = self.logical_len();
        let count = to_word_count(len);
        let tail = len % WORD_BITS;
        let words = self.storage_mut();
        if tail != 0 {
            words[count - 1] &= low_mask(tail);
        }
        words[count..].fill(0);
    }

    /// Zeroes the whole storage.
    pub fn clear(&mut self) {
        self.storage_mut().fill(0);
    }

    /// In-place OR with another array of the same word count.
    ///
    /// # Panics
    ///
    /// Panics if the word counts differ.
    pub fn union_with<S1: AsRef<[u32]>>(&mut self, other: &PackedBitArray<S1>) {
        self.combine_with(other, |a, b| a | b);
    }

    /// In-place AND with another array of the same word count.
    pub fn intersect_with<S1: AsRef<[u32]>>(&mut self, other: &PackedBitArray<S1>) {
        self.combine_with(other, |a, b| a & b);
    }

    /// In-place AND-NOT: clears every bit that is set in `other`.
    pub fn subtract<S1: AsRef<[u32]>>(&mut self, other: &PackedBitArray<S1>) {
        self.combine_with(other, |a, b| a & !b);
    }

    fn combine_with<S1: AsRef<[u32]>>(
        &mut self,
        other: &PackedBitArray<S1>,
        op: impl Fn(u32, u32) -> u32,
    ) {
        assert_eq!(self.word_count(), other.word_count());
        for (word, &rhs) in self.storage_mut().iter_mut().zip(other.storage()) {
            *word = op(*word, rhs);
        }
    }

    #[inline]
    pub fn storage_mut(&mut self) -> &mut [u32] {
        self.words.as_mut()
    }
}

impl<S: WordStore + AsRef<[u32]> + AsMut<[u32]>> PackedBitArray<S> {
    /// Allocates a zeroed array able to hold `len_bits` bits. When `len_bits` is not a
    /// multiple of 32 the logical cap is set to `len_bits`.
    pub fn zeroed(len_bits: usize) -> PackedBitArray<S> {
        let array = PackedBitArray::new(S::new_zeroed(to_word_count(len_bits)));
        if len_bits % WORD_BITS != 0 {
            array.with_max_allowed_bit(len_bits)
        } else {
            array
        }
    }

    /// Allocates an array with every bit below `len_bits` set.
    pub fn filled(len_bits: usize) -> PackedBitArray<S> {
        let mut array = PackedBitArray::new(S::new_with_pattern(to_word_count(len_bits), u32::MAX));
        if len_bits % WORD_BITS != 0 {
            array.set_max_allowed_bit(Some(len_bits));
            array.mask_beyond_cap();
        }
        array
    }
}

impl PackedBitArray<Box<[u32]>> {
    /// Heap bytes held by the word buffer.
    pub fn heap_size_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u32>()
    }
}

#[inline]
fn bit_position(position: usize) -> (usize, usize) {
    (position / WORD_BITS, position % WORD_BITS)
}

/// Mask with the lowest `bits` bits set, `bits < 32`.
#[inline]
fn low_mask(bits: usize) -> u32 {
    debug_assert!(bits < WORD_BITS);
    (1u32 << bits) - 1
}

/// Ascending iterator over set positions of a [`PackedBitArray`].
#[derive(Clone)]
pub struct PackedBitIter<'a> {
    words: std::slice::Iter<'a, u32>,
    current_word: u32,
    next_word_index: usize,
    base_index: usize,
    len: usize,
}

impl<'a> Iterator for PackedBitIter<'a> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let index = self.base_index + self.current_word.trailing_zeros() as usize;
                if index >= self.len {
                    return None;
                }
                self.current_word &= self.current_word - 1;
                return Some(index);
            }
            let &word = self.words.next()?;
            self.current_word = word;
            self.base_index = self.next_word_index * WORD_BITS;
            self.next_word_index += 1;
        }
    }
}

/// Iterator over maximal runs of set bits of a [`PackedBitArray`].
#[derive(Clone)]
pub struct PackedRangesIter<'a> {
    words: &'a [u32],
    cursor: usize,
    len: usize,
}

impl<'a> PackedRangesIter<'a> {
    /// First position at or after `from` whose bit equals `value`, bounded by `len`.
    fn seek(&self, from: usize, value: bool) -> usize {
        let mut pos = from;
        while pos < self.len {
            let (word_index, bit) = bit_position(pos);
            let word = if value {
                self.words[word_index]
            } else {
                !self.words[word_index]
            };
            let remaining = word >> bit;
            if remaining != 0 {
                return (pos + remaining.trailing_zeros() as usize).min(self.len);
            }
            pos = (word_index + 1) * WORD_BITS;
        }
        self.len
    }
}

impl<'a> Iterator for PackedRangesIter<'a> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.seek(self.cursor, true);
        if start >= self.len {
            self.cursor = self.len;
            return None;
        }
        let end = self.seek(start, false);
        self.cursor = end;
        Some(start..end)
    }
}
