use std::collections::BTreeSet;

use tagsieve_common::error::ErrorKind;

use crate::compressed_bitmap::CompressedBitmap;

fn random_bitmap(rng: &mut fastrand::Rng, span: u64) -> (CompressedBitmap, BTreeSet<u64>) {
    let mut expected = BTreeSet::new();
    // A mix of scattered points and a few runs.
    for _ in 0..rng.usize(0..2000) {
        expected.insert(rng.u64(0..span));
    }
    for _ in 0..rng.usize(0..4) {
        let start = rng.u64(0..span);
        let end = (start + rng.u64(1..70_000)).min(span);
        expected.extend(start..end);
    }
    let bitmap = CompressedBitmap::from_positions(span, expected.iter().copied()).unwrap();
    (bitmap, expected)
}

#[test]
fn test_contains_outside_span_is_false() {
    let bitmap = CompressedBitmap::full(100);
    assert!(bitmap.contains(99));
    assert!(!bitmap.contains(100));
    assert!(!bitmap.contains(u64::MAX));
    assert_eq!(bitmap.cardinality(), 100);
}

#[test]
fn test_from_positions_ignores_out_of_span_and_rejects_disorder() {
    let bitmap = CompressedBitmap::from_positions(10, [1, 5, 12, 20]).unwrap();
    assert_eq!(bitmap.positions().collect::<Vec<_>>(), vec![1, 5]);

    let err = CompressedBitmap::from_positions(10, [5, 1]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::BitOrderViolation { .. }));
}

#[test]
fn test_ranges_coalesce_across_segments() {
    let bitmap = CompressedBitmap::from_positions(200_000, (65_530..65_540).chain([70_000])).unwrap();
    assert_eq!(
        bitmap.ranges().collect::<Vec<_>>(),
        vec![65_530..65_540, 70_000..70_001]
    );
}

#[test]
fn test_complement() {
    let bitmap = CompressedBitmap::from_positions(150_000, [0, 149_999]).unwrap();
    let complement = bitmap.complement();
    assert_eq!(complement.cardinality(), 149_998);
    assert!(!complement.contains(0));
    assert!(complement.contains(1));
    assert!(!complement.contains(149_999));
    assert_eq!(complement.ranges().collect::<Vec<_>>(), vec![1..149_999]);
    assert_eq!(CompressedBitmap::empty(150_000).complement(), CompressedBitmap::full(150_000));
}

#[test]
fn test_random_set_operations() {
    let mut rng = fastrand::Rng::with_seed(5);
    let span = 150_000;
    for _ in 0..8 {
        let (a, ea) = random_bitmap(&mut rng, span);
        let (b, eb) = random_bitmap(&mut rng, span);
        assert_eq!(a.cardinality(), ea.len() as u64);
        assert_eq!(a.positions().count() as u64, a.cardinality());

        assert_eq!(
            a.or(&b).positions().collect::<Vec<_>>(),
            ea.union(&eb).copied().collect::<Vec<_>>()
        );
        assert_eq!(
            a.and(&b).positions().collect::<Vec<_>>(),
            ea.intersection(&eb).copied().collect::<Vec<_>>()
        );
        assert_eq!(
            a.and_not(&b).positions().collect::<Vec<_>>(),
            ea.difference(&eb).copied().collect::<Vec<_>>()
        );
        assert_eq!(a.complement().cardinality(), span - a.cardinality());
    }
}

#[test]
#[should_panic(expected = "bitmap spans differ")]
fn test_span_mismatch_panics() {
    let _ = CompressedBitmap::empty(10).or(&CompressedBitmap::empty(11));
}

#[test]
fn test_heap_size_tracks_encoding() {
    let sparse = CompressedBitmap::from_positions(1_000_000, [5, 500_000]).unwrap();
    let dense = CompressedBitmap::from_positions(1_000_000, (0..1_000_000).step_by(2)).unwrap();
    assert!(sparse.heap_size_bytes() < dense.heap_size_bytes());
    assert_eq!(dense.segment_stats().bits, 16);
    assert!(!sparse.is_empty());
    assert!(CompressedBitmap::empty(1_000_000).is_empty());
}
