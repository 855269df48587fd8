mod bitmap_builder_tests;
mod compressed_bitmap_tests;
