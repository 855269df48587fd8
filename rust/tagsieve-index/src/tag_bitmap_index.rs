use ahash::AHashMap;
use tagsieve_bitmap::{CompressedBitmap, compressed_bitmap::SegmentStats};

use crate::query_type::QueryType;

/// Read-only table of presence bitmaps, one per indexed `(tag, QueryType)` pair.
///
/// Bit `p` of `get(tag, qt)` is set when the document at position `p` of the
/// `qt` ordering carries `tag`. Every bitmap spans [`document_count`](Self::document_count)
/// positions. The table is produced by
/// [`BitmapIndexBuilder::build`](crate::BitmapIndexBuilder::build) and has no
/// mutating methods; share it between readers through an `Arc`.
#[derive(Debug, Clone)]
pub struct TagBitmapIndex {
    tags: Vec<String>,
    slots: AHashMap<String, usize>,
    /// `bitmaps[slot * QueryType::COUNT + query_type.index()]`
    bitmaps: Vec<CompressedBitmap>,
    document_count: u64,
}

impl TagBitmapIndex {
    pub(crate) fn new(
        tags: Vec<String>,
        bitmaps: Vec<CompressedBitmap>,
        document_count: u64,
    ) -> TagBitmapIndex {
        debug_assert_eq!(bitmaps.len(), tags.len() * QueryType::COUNT);
        let slots = tags
            .iter()
            .enumerate()
            .map(|(slot, tag)| (tag.clone(), slot))
            .collect();
        TagBitmapIndex {
            tags,
            slots,
            bitmaps,
            document_count,
        }
    }

    /// Presence bitmap of `tag` under `query_type`; `None` for tags that were not
    /// indexed.
    pub fn get(&self, tag: &str, query_type: QueryType) -> Option<&CompressedBitmap> {
        let slot = *self.slots.get(tag)?;
        self.bitmaps.get(slot * QueryType::COUNT + query_type.index())
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.slots.contains_key(tag)
    }

    /// Indexed tags, by descending document count.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Number of indexed tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn bitmap_count(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    pub fn heap_size_bytes(&self) -> usize {
        self.bitmaps
            .iter()
            .map(CompressedBitmap::heap_size_bytes)
            .sum()
    }

    /// Segment encodings across all bitmaps.
    pub fn segment_stats(&self) -> SegmentStats {
        let mut stats = SegmentStats::default();
        for bitmap in &self.bitmaps {
            stats.merge(&bitmap.segment_stats());
        }
        stats
    }
}
