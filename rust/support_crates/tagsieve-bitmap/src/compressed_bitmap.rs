//! Immutable segmented bitmap over a fixed span of positions.
//!
//! A `CompressedBitmap` models a set `S ⊆ [0, span)`. The span is part of its
//! identity: bitmaps are only combined with bitmaps of the same span.
//!
//! Representation
//! - `[0, span)` is partitioned into windows of `Segment::SPAN` positions; the last
//!   window may be shorter.
//! - Each window picks the smallest of the Empty / Full / List / Bits / Ranges
//!   encodings, so long zero padding costs nothing and clustered runs compress.
//!
//! Positions at or beyond the span are never members.

use std::ops::Range;

use tagsieve_common::Result;

use crate::{
    bitmap_builder::BitmapBuilder,
    segment::{PositionsIter, Segment, SegmentKind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBitmap {
    segments: Vec<Segment>,
    span: u64,
}

/// Per-encoding segment counts of one or more bitmaps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SegmentStats {
    pub empty: usize,
    pub full: usize,
    pub list: usize,
    pub bits: usize,
    pub ranges: usize,
}

impl SegmentStats {
    pub fn record(&mut self, kind: SegmentKind) {
        match kind {
            SegmentKind::Empty => self.empty += 1,
            SegmentKind::Full => self.full += 1,
            SegmentKind::List => self.list += 1,
            SegmentKind::Bits => self.bits += 1,
            SegmentKind::Ranges => self.ranges += 1,
        }
    }

    pub fn merge(&mut self, other: &SegmentStats) {
        self.empty += other.empty;
        self.full += other.full;
        self.list += other.list;
        self.bits += other.bits;
        self.ranges += other.ranges;
    }

    pub fn total(&self) -> usize {
        self.empty + self.full + self.list + self.bits + self.ranges
    }
}

impl CompressedBitmap {
    pub(crate) fn from_segments(segments: Vec<Segment>, span: u64) -> CompressedBitmap {
        let bitmap = CompressedBitmap { segments, span };
        bitmap.check_layout();
        bitmap
    }

    /// A bitmap over `[0, span)` with no positions set.
    pub fn empty(span: u64) -> CompressedBitmap {
        Self::with_segment_fn(span, Segment::empty)
    }

    /// A bitmap over `[0, span)` with every position set.
    pub fn full(span: u64) -> CompressedBitmap {
        Self::with_segment_fn(span, Segment::full)
    }

    /// Builds a bitmap from strictly ascending positions; positions at or beyond
    /// `span` are ignored.
    ///
    /// Fails with `BitOrderViolation` if the positions are not strictly ascending.
    pub fn from_positions(
        span: u64,
        positions: impl IntoIterator<Item = u64>,
    ) -> Result<CompressedBitmap> {
        let mut builder = BitmapBuilder::new();
        for pos in positions.into_iter().take_while(|&pos| pos < span) {
            builder.set(pos)?;
        }
        builder.set_size_in_bits(span)?;
        Ok(builder.shrink())
    }

    #[inline]
    pub fn span(&self) -> u64 {
        self.span
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of set positions.
    pub fn cardinality(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| s.count_positions() as u64)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments
            .iter()
            .all(|s| s.kind() == SegmentKind::Empty)
    }

    /// Membership test; `false` for positions at or beyond the span.
    pub fn contains(&self, pos: u64) -> bool {
        if pos >= self.span {
            return false;
        }
        self.segments[(pos / Segment::SPAN) as usize].contains(pos)
    }

    /// Ascending set positions.
    pub fn positions(&self) -> BitmapPositions<'_> {
        BitmapPositions {
            segments: self.segments.iter(),
            current: PositionsIter::Empty,
        }
    }

    /// Maximal runs of set positions as half-open ranges.
    pub fn ranges(&self) -> BitmapRanges<'_> {
        BitmapRanges {
            positions: self.positions(),
            pending: None,
        }
    }

    /// Positions set in both bitmaps.
    ///
    /// # Panics
    ///
    /// Panics if the spans differ.
    pub fn and(&self, other: &CompressedBitmap) -> CompressedBitmap {
        self.zip_segments(other, Segment::intersect)
    }

    /// Positions set in either bitmap.
    ///
    /// # Panics
    ///
    /// Panics if the spans differ.
    pub fn or(&self, other: &CompressedBitmap) -> CompressedBitmap {
        self.zip_segments(other, Segment::union)
    }

    /// Positions set in `self` but not in `other`.
    ///
    /// # Panics
    ///
    /// Panics if the spans differ.
    pub fn and_not(&self, other: &CompressedBitmap) -> CompressedBitmap {
        self.zip_segments(other, Segment::subtract)
    }

    /// Every position of `[0, span)` not set in `self`.
    pub fn complement(&self) -> CompressedBitmap {
        CompressedBitmap {
            segments: self.segments.iter().map(Segment::complement).collect(),
            span: self.span,
        }
    }

    /// Heap bytes held by the segment table and segment payloads.
    pub fn heap_size_bytes(&self) -> usize {
        self.segments.capacity() * std::mem::size_of::<Segment>()
            + self
                .segments
                .iter()
                .map(Segment::heap_size_bytes)
                .sum::<usize>()
    }

    pub fn segment_stats(&self) -> SegmentStats {
        let mut stats = SegmentStats::default();
        for segment in &self.segments {
            stats.record(segment.kind());
        }
        stats
    }

    fn zip_segments(
        &self,
        other: &CompressedBitmap,
        op: impl Fn(&Segment, &Segment) -> Segment,
    ) -> CompressedBitmap {
        assert_eq!(self.span, other.span, "bitmap spans differ");
        let segments = self
            .segments
            .iter()
            .zip(&other.segments)
            .map(|(a, b)| op(a, b))
            .collect();
        CompressedBitmap {
            segments,
            span: self.span,
        }
    }

    fn with_segment_fn(span: u64, f: impl Fn(Range<u64>) -> Segment) -> CompressedBitmap {
        let segments = (0..span.div_ceil(Segment::SPAN))
            .map(|i| {
                let start = i * Segment::SPAN;
                f(start..(start + Segment::SPAN).min(span))
            })
            .collect();
        CompressedBitmap { segments, span }
    }

    fn check_layout(&self) {
        debug_assert_eq!(
            self.segments.len() as u64,
            self.span.div_ceil(Segment::SPAN)
        );
        debug_assert!(self.segments.iter().enumerate().all(|(i, s)| {
            let start = i as u64 * Segment::SPAN;
            s.span() == (start..(start + Segment::SPAN).min(self.span))
        }));
    }
}

/// Ascending set positions of a [`CompressedBitmap`].
#[derive(Clone)]
pub struct BitmapPositions<'a> {
    segments: std::slice::Iter<'a, Segment>,
    current: PositionsIter<'a>,
}

impl<'a> Iterator for BitmapPositions<'a> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        loop {
            if let Some(pos) = self.current.next() {
                return Some(pos);
            }
            self.current = self.segments.next()?.positions();
        }
    }
}

/// Maximal runs of set positions, coalesced across segment boundaries.
#[derive(Clone)]
pub struct BitmapRanges<'a> {
    positions: BitmapPositions<'a>,
    pending: Option<u64>,
}

impl<'a> Iterator for BitmapRanges<'a> {
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Range<u64>> {
        let start = self.pending.take().or_else(|| self.positions.next())?;
        let mut end = start + 1;
        for pos in self.positions.by_ref() {
            if pos != end {
                self.pending = Some(pos);
                break;
            }
            end += 1;
        }
        Some(start..end)
    }
}
