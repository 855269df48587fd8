use tagsieve_common::error::ErrorKind;

use crate::{bitmap_builder::BitmapBuilder, segment::Segment};

#[test]
fn test_set_ascending() {
    let mut builder = BitmapBuilder::new();
    assert_eq!(builder.size_in_bits(), 0);
    builder.set(3).unwrap();
    builder.set(7).unwrap();
    assert_eq!(builder.cardinality(), 2);
    assert_eq!(builder.size_in_bits(), 8);
    assert_eq!(builder.next_pos(), 8);

    let bitmap = builder.shrink();
    assert_eq!(bitmap.span(), 8);
    assert_eq!(bitmap.positions().collect::<Vec<_>>(), vec![3, 7]);
}

#[test]
fn test_set_out_of_order_fails() {
    let mut builder = BitmapBuilder::new();
    builder.set(10).unwrap();
    let err = builder.set(10).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::BitOrderViolation {
            position: 10,
            next_allowed: 11
        }
    ));
    assert!(builder.set(4).is_err());
    assert_eq!(builder.cardinality(), 1);
    builder.set(11).unwrap();
}

#[test]
fn test_pad_below_length_fails() {
    let mut builder = BitmapBuilder::new();
    builder.set(99).unwrap();
    let err = builder.set_size_in_bits(50).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::PadBelowLength {
            requested: 50,
            current: 100
        }
    ));
    builder.set_size_in_bits(100).unwrap();
    builder.set_size_in_bits(120).unwrap();
    assert_eq!(builder.size_in_bits(), 120);
    assert!(builder.set_size_in_bits(110).is_err());
}

#[test]
fn test_padding_preserves_cardinality() {
    let mut builder = BitmapBuilder::new();
    builder.set(3).unwrap();
    builder.set(7).unwrap();
    builder.set_size_in_bits(200_000).unwrap();
    assert_eq!(builder.cardinality(), 2);

    let bitmap = builder.shrink();
    assert_eq!(bitmap.span(), 200_000);
    assert_eq!(bitmap.cardinality(), 2);
    assert_eq!(bitmap.segments().len(), 4);
    let stats = bitmap.segment_stats();
    assert_eq!(stats.list, 1);
    assert_eq!(stats.empty, 3);
    assert!(!bitmap.contains(199_999));
}

#[test]
fn test_positions_across_segments() {
    let positions = [0, 65_535, 65_536, 131_077, 300_000];
    let mut builder = BitmapBuilder::new();
    for pos in positions {
        builder.set(pos).unwrap();
    }
    let bitmap = builder.shrink();
    assert_eq!(bitmap.span(), 300_001);
    assert_eq!(bitmap.segments().len(), 5);
    assert_eq!(bitmap.positions().collect::<Vec<_>>(), positions.to_vec());
    for pos in positions {
        assert!(bitmap.contains(pos));
    }
    assert!(!bitmap.contains(1));
}

#[test]
fn test_empty_builder() {
    let bitmap = BitmapBuilder::new().shrink();
    assert_eq!(bitmap.span(), 0);
    assert!(bitmap.segments().is_empty());
    assert_eq!(bitmap.cardinality(), 0);

    let mut builder = BitmapBuilder::new();
    builder.set_size_in_bits(10).unwrap();
    let bitmap = builder.shrink();
    assert_eq!(bitmap.segments().len(), 1);
    assert_eq!(bitmap.segment_stats().empty, 1);
}

#[test]
fn test_dense_window_becomes_full() {
    let mut builder = BitmapBuilder::new();
    for pos in 0..Segment::SPAN {
        builder.set(pos).unwrap();
    }
    builder.set_size_in_bits(Segment::SPAN + 10).unwrap();
    let bitmap = builder.shrink();
    let stats = bitmap.segment_stats();
    assert_eq!(stats.full, 1);
    assert_eq!(stats.empty, 1);
    assert_eq!(bitmap.cardinality(), Segment::SPAN);
}
