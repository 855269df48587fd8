//! Storage backend abstraction for packed bit arrays.
//!
//! [`WordStore`] allocates fixed-length arrays of 32-bit words for the heap-backed
//! flavors of [`PackedBitArray`](crate::bit_array::PackedBitArray). The `count`
//! parameter is a number of `u32` words, not bits.
//!
//! Callers that manage their own buffers (stack arrays, borrowed slices, arena
//! memory) never go through this trait: any `AsRef<[u32]>`/`AsMut<[u32]>` storage
//! can be wrapped directly.

/// A storage backend for fixed-length arrays of 32-bit words.
pub trait WordStore {
    /// Allocate `count` words of `u32`, initialized to zero.
    fn new_zeroed(count: usize) -> Self;

    /// Allocate `count` words of `u32`, initializing every word to `pattern`.
    fn new_with_pattern(count: usize, pattern: u32) -> Self;
}

impl WordStore for Box<[u32]> {
    fn new_zeroed(count: usize) -> Self {
        vec![0u32; count].into_boxed_slice()
    }

    fn new_with_pattern(count: usize, pattern: u32) -> Self {
        vec![pattern; count].into_boxed_slice()
    }
}

impl WordStore for Vec<u32> {
    fn new_zeroed(count: usize) -> Self {
        vec![0u32; count]
    }

    fn new_with_pattern(count: usize, pattern: u32) -> Self {
        vec![pattern; count]
    }
}
