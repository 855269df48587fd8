//! Sparse segment encoding: sorted `u16` offsets relative to the segment start.

use std::ops::Range;

use itertools::Itertools;

use crate::{bit_array::PackedBitArray, segment::bits::BitSegment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSegment {
    span: Range<u64>,
    values: Vec<u16>,
}

impl ListSegment {
    /// Wraps sorted, unique offsets that lie inside `span`.
    pub fn new(span: Range<u64>, values: Vec<u16>) -> ListSegment {
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(
            values
                .last()
                .is_none_or(|&last| (last as u64) < span.end - span.start)
        );
        ListSegment { span, values }
    }

    pub fn from_relative_position_slice(span: Range<u64>, positions: &[u16]) -> ListSegment {
        ListSegment::new(span, positions.to_vec())
    }

    /// Collects the set bits of `bits` (relative to the segment start).
    pub fn from_bits(span: Range<u64>, bits: &PackedBitArray<Box<[u32]>>, count: usize) -> ListSegment {
        let mut values = Vec::with_capacity(count);
        values.extend(bits.iter().map(|pos| pos as u16));
        ListSegment::new(span, values)
    }

    pub fn span(&self) -> Range<u64> {
        self.span.clone()
    }

    pub fn values(&self) -> &[u16] {
        &self.values
    }

    pub fn count_positions(&self) -> usize {
        self.values.len()
    }

    pub fn count_runs(&self) -> usize {
        count_runs(&self.values)
    }

    pub fn contains(&self, pos: u64) -> bool {
        debug_assert!(self.span.contains(&pos));
        self.values
            .binary_search(&((pos - self.span.start) as u16))
            .is_ok()
    }

    pub fn positions(&self) -> ListPositions<'_> {
        ListPositions {
            values: self.values.iter(),
            base: self.span.start,
        }
    }

    /// Merges two sparse lists over the same span.
    pub fn union(&self, other: &ListSegment) -> ListSegment {
        debug_assert_eq!(self.span, other.span);
        let values = self
            .values
            .iter()
            .merge(other.values.iter())
            .dedup()
            .copied()
            .collect();
        ListSegment::new(self.span(), values)
    }

    pub fn to_bits(&self) -> BitSegment {
        BitSegment::from_relative_position_slice(self.span(), &self.values)
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.values.capacity() * std::mem::size_of::<u16>()
    }
}

/// Counts maximal runs of consecutive values in a sorted, unique slice.
pub fn count_runs(values: &[u16]) -> usize {
    if values.is_empty() {
        return 0;
    }
    1 + values.windows(2).filter(|w| w[1] - w[0] > 1).count()
}

#[derive(Clone)]
pub struct ListPositions<'a> {
    values: std::slice::Iter<'a, u16>,
    base: u64,
}

impl<'a> Iterator for ListPositions<'a> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        self.values.next().map(|&v| self.base + v as u64)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}
