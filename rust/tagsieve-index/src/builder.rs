//! Bulk build of the per-tag presence bitmaps.

use std::time::Instant;

use ahash::AHashMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use tagsieve_bitmap::{BitmapBuilder, CompressedBitmap};
use tagsieve_common::Result;

use crate::{
    corpus::Corpus,
    diagnostics::{BuildReport, CountMismatch, MemoryDisplay, capture_memory, millis},
    options::BuildOptions,
    query_type::QueryType,
    tag_bitmap_index::TagBitmapIndex,
};

/// One-shot builder of a [`TagBitmapIndex`].
///
/// [`build`](Self::build) consumes the builder, so the mutable build state can
/// never be observed by readers of the resulting index.
pub struct BitmapIndexBuilder<'a> {
    corpus: &'a Corpus,
    options: BuildOptions,
}

impl<'a> BitmapIndexBuilder<'a> {
    pub fn new(corpus: &'a Corpus, options: BuildOptions) -> BitmapIndexBuilder<'a> {
        BitmapIndexBuilder { corpus, options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Tags with strictly more than `min_docs_per_tag` documents, by descending
    /// document count. Ties keep catalog order.
    pub fn select_tags_for_indexing(&self, min_docs_per_tag: u64) -> Vec<String> {
        let mut selected: Vec<(&str, u64)> = self
            .corpus
            .catalog()
            .iter()
            .filter(|&(_, count)| count > min_docs_per_tag)
            .collect();
        selected.sort_by(|a, b| b.1.cmp(&a.1));
        selected
            .into_iter()
            .map(|(tag, _)| tag.to_string())
            .collect()
    }

    /// Builds a presence bitmap for every selected tag and query type, pads each
    /// one to the document count and freezes the lot into a [`TagBitmapIndex`].
    ///
    /// Count mismatches against the catalog are reported, not fatal. Bitmap
    /// errors (out-of-order positions, padding below length) abort the build.
    pub fn build(self) -> Result<(TagBitmapIndex, BuildReport)> {
        let total_timer = Instant::now();
        let document_count = self.corpus.document_count();
        let mut report = BuildReport {
            document_count,
            memory_before: capture_memory(self.options.track_memory),
            ..Default::default()
        };
        info!(
            "Building bitmaps over {document_count} documents, memory {}",
            MemoryDisplay(report.memory_before)
        );

        let allocate_timer = Instant::now();
        let tags = self.select_tags_for_indexing(self.options.min_docs_per_tag);
        let slots: AHashMap<&str, usize> = tags
            .iter()
            .enumerate()
            .map(|(slot, tag)| (tag.as_str(), slot))
            .collect();
        let bitmap_count = tags.len() * QueryType::COUNT;
        let mut builders: Vec<BitmapBuilder> =
            (0..bitmap_count).map(|_| BitmapBuilder::new()).collect();
        report.allocate_time = allocate_timer.elapsed();
        report.tags_indexed = tags.len();
        report.bitmap_count = bitmap_count;
        report.memory_after_allocate = capture_memory(self.options.track_memory);
        info!(
            "Created {} bitmap builders ({} tags x {} query types), memory {}",
            bitmap_count,
            tags.len(),
            QueryType::COUNT,
            MemoryDisplay(report.memory_after_allocate)
        );

        for query_type in QueryType::ALL {
            let populate_timer = Instant::now();
            let observed = self.populate(query_type, &slots, &mut builders)?;
            let elapsed = populate_timer.elapsed();
            report.populate_times.push((query_type, elapsed));
            info!(
                "Took {:.2} ms to populate bitmaps for {}",
                millis(elapsed),
                query_type
            );
            self.check_counts(query_type, &tags, &observed, &mut report.mismatches);
        }
        report.memory_after_populate = capture_memory(self.options.track_memory);

        let post_process_timer = Instant::now();
        let bitmaps = self.post_process(builders)?;
        report.post_process_time = post_process_timer.elapsed();
        report.memory_after_post_process = capture_memory(self.options.track_memory);
        info!(
            "Took {:.2} ms to pad and shrink {} bitmaps, memory {}",
            millis(report.post_process_time),
            bitmap_count,
            MemoryDisplay(report.memory_after_post_process)
        );

        let index = TagBitmapIndex::new(tags, bitmaps, document_count as u64);
        report.heap_size_bytes = index.heap_size_bytes();
        report.segment_stats = index.segment_stats();
        report.total_time = total_timer.elapsed();
        info!(
            "Built {} bitmaps in {:.2} ms, {} heap bytes, {} count mismatches",
            bitmap_count,
            millis(report.total_time),
            report.heap_size_bytes,
            report.mismatches.len()
        );
        Ok((index, report))
    }

    /// Sets the bit of every position whose document carries a selected tag and
    /// returns the per-slot observed counts.
    fn populate(
        &self,
        query_type: QueryType,
        slots: &AHashMap<&str, usize>,
        builders: &mut [BitmapBuilder],
    ) -> Result<Vec<u64>> {
        let mut observed = vec![0u64; slots.len()];
        if slots.is_empty() {
            return Ok(observed);
        }
        let ordering = self.corpus.ordering(query_type);
        for (position, &id) in ordering.all_positions().iter().enumerate() {
            // Validated orderings only hold ids of existing documents.
            let doc = &self.corpus.documents()[id as usize];
            for tag in &doc.tags {
                if let Some(&slot) = slots.get(tag.as_str()) {
                    builders[slot * QueryType::COUNT + query_type.index()]
                        .set(position as u64)?;
                    observed[slot] += 1;
                }
            }
        }
        Ok(observed)
    }

    /// Compares observed counts with the catalog. Complete orderings must match
    /// exactly; subset orderings may only under-count.
    fn check_counts(
        &self,
        query_type: QueryType,
        tags: &[String],
        observed: &[u64],
        mismatches: &mut Vec<CountMismatch>,
    ) {
        let document_count = self.corpus.document_count();
        let complete = self
            .corpus
            .ordering(query_type)
            .is_complete(document_count);
        for (tag, &observed) in tags.iter().zip(observed) {
            let expected = self.corpus.catalog().count(tag).unwrap_or(0);
            if observed == expected || (!complete && observed < expected) {
                if observed != expected {
                    debug!(
                        "Tag '{tag}' has {observed} of {expected} documents in the {query_type} subset"
                    );
                }
                continue;
            }
            warn!(
                "Count mismatch in {query_type} bitmap for tag '{tag}': expected {expected}, observed {observed}"
            );
            mismatches.push(CountMismatch {
                tag: tag.clone(),
                query_type,
                expected,
                observed,
            });
        }
    }

    fn post_process(&self, builders: Vec<BitmapBuilder>) -> Result<Vec<CompressedBitmap>> {
        let size = self.corpus.document_count() as u64;
        let pad_and_shrink = |mut builder: BitmapBuilder| -> Result<CompressedBitmap> {
            builder.set_size_in_bits(size)?;
            Ok(builder.shrink())
        };
        if self.options.parallel_post_process {
            builders.into_par_iter().map(pad_and_shrink).collect()
        } else {
            builders.into_iter().map(pad_and_shrink).collect()
        }
    }
}
