//! Dense segment encoding: one bit per position of the span.

use std::ops::Range;

use crate::{
    bit_array::{PackedBitArray, PackedBitIter},
    segment::ranges::Run,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSegment {
    span: Range<u64>,
    bits: PackedBitArray<Box<[u32]>>,
}

impl BitSegment {
    /// Wraps a bit array whose logical length equals the span length.
    pub fn new(span: Range<u64>, bits: PackedBitArray<Box<[u32]>>) -> BitSegment {
        assert_eq!(bits.logical_len() as u64, span.end - span.start);
        BitSegment { span, bits }
    }

    pub fn empty(span: Range<u64>) -> BitSegment {
        let len = (span.end - span.start) as usize;
        BitSegment::new(span, PackedBitArray::zeroed(len))
    }

    pub fn from_relative_position_slice(span: Range<u64>, positions: &[u16]) -> BitSegment {
        let mut segment = BitSegment::empty(span);
        for &pos in positions {
            segment.bits.set(pos as usize);
        }
        segment
    }

    pub fn from_runs(span: Range<u64>, runs: impl Iterator<Item = Run>) -> BitSegment {
        let mut segment = BitSegment::empty(span);
        for run in runs {
            segment.bits.set_range(run.as_range());
        }
        segment
    }

    pub fn span(&self) -> Range<u64> {
        self.span.clone()
    }

    pub fn bits(&self) -> &PackedBitArray<Box<[u32]>> {
        &self.bits
    }

    pub fn into_bits(self) -> PackedBitArray<Box<[u32]>> {
        self.bits
    }

    pub fn count_positions(&self) -> usize {
        self.bits.cardinality()
    }

    pub fn count_runs(&self) -> usize {
        self.bits.count_runs()
    }

    pub fn contains(&self, pos: u64) -> bool {
        debug_assert!(self.span.contains(&pos));
        self.bits.is_marked((pos - self.span.start) as usize)
    }

    pub fn positions(&self) -> BitPositions<'_> {
        BitPositions {
            inner: self.bits.iter(),
            base: self.span.start,
        }
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.bits.heap_size_bytes()
    }
}

#[derive(Clone)]
pub struct BitPositions<'a> {
    inner: PackedBitIter<'a>,
    base: u64,
}

impl<'a> Iterator for BitPositions<'a> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        self.inner.next().map(|pos| self.base + pos as u64)
    }
}
