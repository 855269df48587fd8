//! Segments are compact encodings of a fixed-size, half-open window of absolute
//! positions.
//! - Each segment owns `[start, end)` with `0 < end - start <= SPAN` and
//!   `start % SPAN == 0`. The final segment of a bitmap may be shorter than SPAN.
//! - Encodings trade space for speed: Empty, Full, List (`u16` offsets),
//!   Bits (bitset), Ranges (`u16` runs).
//! - Constructors pick the smallest encoding for the contents.
//! - All positions yielded are absolute.

use std::ops::Range;

use crate::{
    bit_array::PackedBitArray,
    segment::{
        bits::{BitPositions, BitSegment},
        list::{ListPositions, ListSegment},
        ranges::{RangePositions, RangeSegment},
    },
};

pub mod bits;
pub mod list;
pub mod ranges;

/// A window of the position space stored in one of five encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Empty(Range<u64>),
    Full(Range<u64>),
    List(ListSegment),
    Bits(BitSegment),
    Ranges(RangeSegment),
}

/// Identifies the storage encoding of a [`Segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// No positions set.
    Empty,
    /// Every position of the span set.
    Full,
    /// Sparse `u16` offsets from the span start.
    List,
    /// One bit per position (`SPAN / 8` bytes at most).
    Bits,
    /// Inclusive `u16` runs relative to the span start.
    Ranges,
}

impl Segment {
    /// Number of positions covered by a full segment.
    pub const SPAN: u64 = u16::MAX as u64 + 1;

    pub fn empty(span: Range<u64>) -> Segment {
        Self::check_span(&span);
        Segment::Empty(span)
    }

    pub fn full(span: Range<u64>) -> Segment {
        Self::check_span(&span);
        Segment::Full(span)
    }

    /// Builds a segment from sorted, unique offsets relative to `span.start`,
    /// choosing the encoding by size.
    pub fn from_relative_position_slice(span: Range<u64>, positions: &[u16]) -> Segment {
        Self::check_span(&span);
        let span_len = span.end - span.start;
        let run_count = list::count_runs(positions);
        let kind = Self::infer_optimal_kind_by_size(span_len, positions.len(), run_count);
        match kind {
            SegmentKind::Empty => Segment::Empty(span),
            SegmentKind::Full => Segment::Full(span),
            SegmentKind::List => {
                Segment::List(ListSegment::from_relative_position_slice(span, positions))
            }
            SegmentKind::Bits => {
                Segment::Bits(BitSegment::from_relative_position_slice(span, positions))
            }
            SegmentKind::Ranges => Segment::Ranges(RangeSegment::from_relative_position_slice(
                span, positions, run_count,
            )),
        }
    }

    /// Builds a segment from a bitset whose logical length equals the span length,
    /// choosing the encoding by size.
    pub fn from_bits(span: Range<u64>, bits: PackedBitArray<Box<[u32]>>) -> Segment {
        Self::check_span(&span);
        let span_len = span.end - span.start;
        let pos_count = bits.cardinality();
        let run_count = bits.count_runs();
        match Self::infer_optimal_kind_by_size(span_len, pos_count, run_count) {
            SegmentKind::Empty => Segment::Empty(span),
            SegmentKind::Full => Segment::Full(span),
            SegmentKind::List => Segment::List(ListSegment::from_bits(span, &bits, pos_count)),
            SegmentKind::Bits => Segment::Bits(BitSegment::new(span, bits)),
            SegmentKind::Ranges => {
                Segment::Ranges(RangeSegment::from_bits(span, &bits, run_count))
            }
        }
    }

    pub fn span(&self) -> Range<u64> {
        match self {
            Segment::Empty(span) | Segment::Full(span) => span.clone(),
            Segment::List(s) => s.span(),
            Segment::Bits(s) => s.span(),
            Segment::Ranges(s) => s.span(),
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Empty(_) => SegmentKind::Empty,
            Segment::Full(_) => SegmentKind::Full,
            Segment::List(_) => SegmentKind::List,
            Segment::Bits(_) => SegmentKind::Bits,
            Segment::Ranges(_) => SegmentKind::Ranges,
        }
    }

    pub fn count_positions(&self) -> usize {
        match self {
            Segment::Empty(_) => 0,
            Segment::Full(span) => (span.end - span.start) as usize,
            Segment::List(s) => s.count_positions(),
            Segment::Bits(s) => s.count_positions(),
            Segment::Ranges(s) => s.count_positions(),
        }
    }

    /// Tests an absolute position, which must lie inside the span.
    pub fn contains(&self, pos: u64) -> bool {
        match self {
            Segment::Empty(_) => false,
            Segment::Full(span) => span.contains(&pos),
            Segment::List(s) => s.contains(pos),
            Segment::Bits(s) => s.contains(pos),
            Segment::Ranges(s) => s.contains(pos),
        }
    }

    /// Ascending absolute positions.
    pub fn positions(&self) -> PositionsIter<'_> {
        match self {
            Segment::Empty(_) => PositionsIter::Empty,
            Segment::Full(span) => PositionsIter::Full(span.clone()),
            Segment::List(s) => PositionsIter::List(s.positions()),
            Segment::Bits(s) => PositionsIter::Bits(s.positions()),
            Segment::Ranges(s) => PositionsIter::Ranges(s.positions()),
        }
    }

    pub fn union(&self, other: &Segment) -> Segment {
        debug_assert_eq!(self.span(), other.span());
        match (self, other) {
            (Segment::Empty(_), _) => other.clone(),
            (_, Segment::Empty(_)) => self.clone(),
            (Segment::Full(_), _) | (_, Segment::Full(_)) => Segment::Full(self.span()),
            (Segment::List(a), Segment::List(b)) => {
                let merged = a.union(b);
                Segment::from_relative_position_slice(self.span(), merged.values())
            }
            _ => self.combine(other, |a, b| a.union_with(b)),
        }
    }

    pub fn intersect(&self, other: &Segment) -> Segment {
        debug_assert_eq!(self.span(), other.span());
        match (self, other) {
            (Segment::Empty(_), _) | (_, Segment::Empty(_)) => Segment::Empty(self.span()),
            (Segment::Full(_), _) => other.clone(),
            (_, Segment::Full(_)) => self.clone(),
            _ => self.combine(other, |a, b| a.intersect_with(b)),
        }
    }

    /// Positions of `self` that are not in `other`.
    pub fn subtract(&self, other: &Segment) -> Segment {
        debug_assert_eq!(self.span(), other.span());
        match (self, other) {
            (Segment::Empty(_), _) | (_, Segment::Full(_)) => Segment::Empty(self.span()),
            (_, Segment::Empty(_)) => self.clone(),
            _ => self.combine(other, |a, b| a.subtract(b)),
        }
    }

    pub fn complement(&self) -> Segment {
        match self {
            Segment::Empty(span) => Segment::Full(span.clone()),
            Segment::Full(span) => Segment::Empty(span.clone()),
            _ => {
                let mut bits = self.to_bits();
                bits.invert();
                bits.mask_beyond_cap();
                Segment::from_bits(self.span(), bits)
            }
        }
    }

    /// Materializes the segment as a bitset sized to the span.
    pub fn to_bits(&self) -> PackedBitArray<Box<[u32]>> {
        let span = self.span();
        match self {
            Segment::Empty(_) => BitSegment::empty(span).into_bits(),
            Segment::Full(_) => {
                let len = (span.end - span.start) as usize;
                PackedBitArray::filled(len)
            }
            Segment::List(s) => s.to_bits().into_bits(),
            Segment::Bits(s) => s.bits().clone(),
            Segment::Ranges(s) => s.to_bits().into_bits(),
        }
    }

    pub fn heap_size_bytes(&self) -> usize {
        match self {
            Segment::Empty(_) | Segment::Full(_) => 0,
            Segment::List(s) => s.heap_size_bytes(),
            Segment::Bits(s) => s.heap_size_bytes(),
            Segment::Ranges(s) => s.heap_size_bytes(),
        }
    }

    fn combine(
        &self,
        other: &Segment,
        op: impl FnOnce(&mut PackedBitArray<Box<[u32]>>, &PackedBitArray<Box<[u32]>>),
    ) -> Segment {
        let mut bits = self.to_bits();
        op(&mut bits, &other.to_bits());
        Segment::from_bits(self.span(), bits)
    }

    /// Picks the smallest encoding; on ties List wins over Ranges, Ranges over Bits.
    pub(crate) fn infer_optimal_kind_by_size(
        span_len: u64,
        pos_count: usize,
        run_count: usize,
    ) -> SegmentKind {
        if pos_count == 0 {
            return SegmentKind::Empty;
        }
        if span_len == pos_count as u64 {
            return SegmentKind::Full;
        }

        let bits_size = span_len.div_ceil(8);
        let list_size = 2 * pos_count as u64;
        let ranges_size = 4 * run_count as u64;
        let min_size = list_size.min(ranges_size).min(bits_size);

        if list_size == min_size {
            SegmentKind::List
        } else if ranges_size == min_size {
            SegmentKind::Ranges
        } else {
            SegmentKind::Bits
        }
    }

    #[inline]
    fn check_span(span: &Range<u64>) {
        debug_assert!(span.start.is_multiple_of(Self::SPAN));
        debug_assert!(span.start < span.end && span.end - span.start <= Self::SPAN);
    }
}

/// Ascending absolute positions of a single [`Segment`].
#[derive(Clone)]
pub enum PositionsIter<'a> {
    Empty,
    Full(Range<u64>),
    List(ListPositions<'a>),
    Bits(BitPositions<'a>),
    Ranges(RangePositions<'a>),
}

impl<'a> Iterator for PositionsIter<'a> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        match self {
            PositionsIter::Empty => None,
            PositionsIter::Full(range) => range.next(),
            PositionsIter::List(it) => it.next(),
            PositionsIter::Bits(it) => it.next(),
            PositionsIter::Ranges(it) => it.next(),
        }
    }
}
