pub mod bit_array;
pub mod bit_store;
pub mod bitmap_builder;
pub mod compressed_bitmap;
pub mod segment;
#[cfg(test)]
mod tests;

pub use bit_array::{PackedBitArray, to_word_count};
pub use bitmap_builder::BitmapBuilder;
pub use compressed_bitmap::CompressedBitmap;
