use tagsieve_common::{Result, error::Error};

use crate::{compressed_bitmap::CompressedBitmap, segment::Segment};

/// Append-ordered bitmap accumulator.
///
/// Positions must be set in strictly ascending order. The bitmap grows without
/// bound until [`shrink`](Self::shrink) freezes it into a [`CompressedBitmap`]
/// whose span is [`size_in_bits`](Self::size_in_bits). Padding with
/// [`set_size_in_bits`](Self::set_size_in_bits) adds trailing zeros only.
#[derive(Debug, Default)]
pub struct BitmapBuilder {
    segments: Vec<Segment>,
    pending: Vec<u16>,
    pending_start: u64,
    next_pos: u64,
    size_in_bits: u64,
    cardinality: u64,
}

impl BitmapBuilder {
    pub fn new() -> BitmapBuilder {
        BitmapBuilder::default()
    }

    /// Smallest position accepted by the next [`set`](Self::set) call.
    #[inline]
    pub fn next_pos(&self) -> u64 {
        self.next_pos
    }

    /// Logical length in bits: one past the highest set bit, or the padded size.
    #[inline]
    pub fn size_in_bits(&self) -> u64 {
        self.size_in_bits
    }

    /// Number of bits set so far.
    #[inline]
    pub fn cardinality(&self) -> u64 {
        self.cardinality
    }

    /// Sets the bit at `pos`.
    ///
    /// Fails with `BitOrderViolation` if `pos` is below [`next_pos`](Self::next_pos).
    pub fn set(&mut self, pos: u64) -> Result<()> {
        if pos < self.next_pos {
            return Err(Error::bit_order_violation(pos, self.next_pos));
        }
        while pos >= self.pending_start + Segment::SPAN {
            self.flush_segment();
        }
        self.pending.push((pos - self.pending_start) as u16);
        self.cardinality += 1;
        self.next_pos = pos + 1;
        self.size_in_bits = self.size_in_bits.max(self.next_pos);
        Ok(())
    }

    /// Grows the logical length to `size` with zero bits.
    ///
    /// Fails with `PadBelowLength` if `size` is smaller than the current length; an
    /// equal size is a no-op.
    pub fn set_size_in_bits(&mut self, size: u64) -> Result<()> {
        if size < self.size_in_bits {
            return Err(Error::pad_below_length(size, self.size_in_bits));
        }
        self.size_in_bits = size;
        Ok(())
    }

    /// Freezes the builder into a compressed bitmap spanning `[0, size_in_bits)`,
    /// choosing the smallest encoding for every segment.
    pub fn shrink(mut self) -> CompressedBitmap {
        let span = self.size_in_bits;
        while self.pending_start + Segment::SPAN <= span {
            self.flush_segment();
        }
        if self.pending_start < span {
            let segment =
                Segment::from_relative_position_slice(self.pending_start..span, &self.pending);
            self.segments.push(segment);
        }
        self.segments.shrink_to_fit();
        CompressedBitmap::from_segments(self.segments, span)
    }

    fn flush_segment(&mut self) {
        let start = self.pending_start;
        let segment = if self.pending.is_empty() {
            Segment::empty(start..start + Segment::SPAN)
        } else {
            Segment::from_relative_position_slice(start..start + Segment::SPAN, &self.pending)
        };
        self.segments.push(segment);
        self.pending.clear();
        self.pending_start += Segment::SPAN;
    }
}
