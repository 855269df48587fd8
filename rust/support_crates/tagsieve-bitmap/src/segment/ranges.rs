//! Run-length segment encoding: disjoint ascending runs of set positions.

use std::ops::Range;

use crate::{bit_array::PackedBitArray, segment::bits::BitSegment};

/// A run of segment-relative positions `[first, last]`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub first: u16,
    pub last: u16,
}

impl Run {
    #[inline]
    pub fn len(&self) -> usize {
        self.last as usize - self.first as usize + 1
    }

    #[inline]
    pub fn as_range(&self) -> Range<usize> {
        self.first as usize..self.last as usize + 1
    }

    #[inline]
    pub fn rebase(&self, base: u64) -> Range<u64> {
        self.first as u64 + base..self.last as u64 + 1 + base
    }
}

impl From<Range<usize>> for Run {
    fn from(range: Range<usize>) -> Run {
        debug_assert!(range.start < range.end);
        Run {
            first: range.start as u16,
            last: (range.end - 1) as u16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSegment {
    span: Range<u64>,
    runs: Vec<Run>,
}

impl RangeSegment {
    pub fn new(span: Range<u64>, runs: Vec<Run>) -> RangeSegment {
        debug_assert!(runs.windows(2).all(|w| w[0].last + 1 < w[1].first));
        RangeSegment { span, runs }
    }

    /// Collapses sorted, unique offsets into runs. `run_count` pre-sizes the run list.
    pub fn from_relative_position_slice(
        span: Range<u64>,
        positions: &[u16],
        run_count: usize,
    ) -> RangeSegment {
        let mut runs: Vec<Run> = Vec::with_capacity(run_count);
        for &pos in positions {
            match runs.last_mut() {
                Some(run) if run.last + 1 == pos => run.last = pos,
                _ => runs.push(Run {
                    first: pos,
                    last: pos,
                }),
            }
        }
        RangeSegment::new(span, runs)
    }

    pub fn from_bits(
        span: Range<u64>,
        bits: &PackedBitArray<Box<[u32]>>,
        run_count: usize,
    ) -> RangeSegment {
        let mut runs = Vec::with_capacity(run_count);
        runs.extend(bits.ranges_iter().map(Run::from));
        RangeSegment::new(span, runs)
    }

    pub fn span(&self) -> Range<u64> {
        self.span.clone()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn count_positions(&self) -> usize {
        self.runs.iter().map(Run::len).sum()
    }

    pub fn count_runs(&self) -> usize {
        self.runs.len()
    }

    pub fn contains(&self, pos: u64) -> bool {
        debug_assert!(self.span.contains(&pos));
        let rel = (pos - self.span.start) as u16;
        let idx = self.runs.partition_point(|run| run.last < rel);
        self.runs.get(idx).is_some_and(|run| run.first <= rel)
    }

    pub fn positions(&self) -> RangePositions<'_> {
        RangePositions {
            runs: self.runs.iter(),
            current: 0..0,
            base: self.span.start,
        }
    }

    pub fn to_bits(&self) -> BitSegment {
        BitSegment::from_runs(self.span(), self.runs.iter().copied())
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.runs.capacity() * std::mem::size_of::<Run>()
    }
}

#[derive(Clone)]
pub struct RangePositions<'a> {
    runs: std::slice::Iter<'a, Run>,
    current: Range<u64>,
    base: u64,
}

impl<'a> Iterator for RangePositions<'a> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        loop {
            if let Some(pos) = self.current.next() {
                return Some(pos);
            }
            self.current = self.runs.next()?.rebase(self.base);
        }
    }
}
