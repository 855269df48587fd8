//! Per-request exclusion bitmaps.

use std::{cell::RefCell, time::Duration, time::Instant};

use ahash::AHashSet;
use log::info;
use serde::Serialize;
use tagsieve_bitmap::{BitmapBuilder, CompressedBitmap};
use tagsieve_collections::{ScratchSetCache, ScratchSetPool};
use tagsieve_common::{Result, error::Error};

use crate::{corpus::Corpus, diagnostics::millis, options::CompileOptions, query_type::QueryType};

thread_local! {
    static SCRATCH: RefCell<Option<ScratchSetCache>> = const { RefCell::new(None) };
}

/// Counters and phase timings of one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionStats {
    /// Distinct tags requested.
    pub excluded_tags: usize,
    /// Requested tags with no documents under the query type.
    pub unknown_tags: usize,
    /// Distinct documents collected from the excluded tags.
    pub collected_documents: usize,
    pub bits_set: u64,
    pub cardinality: u64,
    /// Positions left allowed: document count minus cardinality.
    pub allowed_count: u64,
    pub collect_time: Duration,
    pub set_bits_time: Duration,
    pub tidy_up_time: Duration,
    pub total_time: Duration,
}

/// Bitmap over the positions of one query type; bit = 1 means the document at
/// that position must be dropped. Spans the full document count.
#[derive(Debug, Clone)]
pub struct ExclusionBitmap {
    bitmap: CompressedBitmap,
    stats: ExclusionStats,
}

impl ExclusionBitmap {
    pub fn bitmap(&self) -> &CompressedBitmap {
        &self.bitmap
    }

    pub fn stats(&self) -> &ExclusionStats {
        &self.stats
    }

    pub fn is_excluded(&self, position: u64) -> bool {
        self.bitmap.contains(position)
    }

    pub fn into_bitmap(self) -> CompressedBitmap {
        self.bitmap
    }

    pub fn into_parts(self) -> (CompressedBitmap, ExclusionStats) {
        (self.bitmap, self.stats)
    }
}

/// Compiles exclusion bitmaps for sets of tags over a [`Corpus`].
///
/// Compilation takes `&self` and keeps all mutable state in a scratch cache, so
/// one compiler can serve any number of threads. Each call needs exclusive use
/// of its cache: pass one explicitly with
/// [`compile_with_scratch`](Self::compile_with_scratch), check one out of a
/// [`ScratchSetPool`] from [`scratch_pool`](Self::scratch_pool), or let
/// [`compile`](Self::compile) use the calling thread's cache.
pub struct ExclusionBitmapCompiler<'a> {
    corpus: &'a Corpus,
    options: CompileOptions,
}

impl<'a> ExclusionBitmapCompiler<'a> {
    pub fn new(corpus: &'a Corpus, options: CompileOptions) -> ExclusionBitmapCompiler<'a> {
        ExclusionBitmapCompiler { corpus, options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// A cache sized for this corpus.
    pub fn new_scratch_cache(&self) -> ScratchSetCache {
        ScratchSetCache::with_representation(
            self.corpus.document_count(),
            self.options.scratch_representation,
        )
    }

    /// A pool of caches sized for this corpus.
    pub fn scratch_pool(&self) -> ScratchSetPool {
        ScratchSetPool::new(
            self.corpus.document_count(),
            self.options.scratch_representation,
        )
    }

    /// Compiles using the calling thread's scratch cache, created on first use.
    pub fn compile<S: AsRef<str>>(
        &self,
        tags: &[S],
        query_type: QueryType,
    ) -> Result<ExclusionBitmap> {
        SCRATCH.with_borrow_mut(|slot| {
            let reusable = slot.as_ref().is_some_and(|cache| {
                cache.capacity_hint() == self.corpus.document_count()
                    && cache.representation() == self.options.scratch_representation
            });
            if !reusable {
                *slot = Some(self.new_scratch_cache());
            }
            let cache = slot.get_or_insert_with(|| self.new_scratch_cache());
            self.compile_with_scratch(tags, query_type, cache)
        })
    }

    /// Builds the exclusion bitmap of `tags` under `query_type`.
    ///
    /// Unknown tags contribute nothing and are counted in
    /// [`ExclusionStats::unknown_tags`]. Fails if a bit cannot be set, if padding
    /// fails, or if the number of bits set disagrees with the resulting cardinality.
    pub fn compile_with_scratch<S: AsRef<str>>(
        &self,
        tags: &[S],
        query_type: QueryType,
        scratch: &mut ScratchSetCache,
    ) -> Result<ExclusionBitmap> {
        let total_timer = Instant::now();
        let ordering = self.corpus.ordering(query_type);
        let document_count = self.corpus.document_count() as u64;

        let collect_timer = Instant::now();
        let excluded_ids = scratch.get_scratch_set();
        let distinct_tags: AHashSet<&str> = tags.iter().map(AsRef::as_ref).collect();
        let mut unknown_tags = 0;
        for &tag in &distinct_tags {
            match ordering.tag_doc_ids(tag) {
                Some(ids) => {
                    for &id in ids {
                        excluded_ids.insert(id)?;
                    }
                }
                None => unknown_tags += 1,
            }
        }
        let collect_time = collect_timer.elapsed();

        let set_bits_timer = Instant::now();
        let mut builder = BitmapBuilder::new();
        let mut bits_set = 0u64;
        if !excluded_ids.is_empty() {
            for (position, &id) in ordering.all_positions().iter().enumerate() {
                if excluded_ids.contains(id) {
                    builder.set(position as u64)?;
                    bits_set += 1;
                }
            }
        }
        let set_bits_time = set_bits_timer.elapsed();

        let tidy_up_timer = Instant::now();
        builder.set_size_in_bits(document_count)?;
        let bitmap = builder.shrink();
        let tidy_up_time = tidy_up_timer.elapsed();

        let cardinality = bitmap.cardinality();
        if cardinality != bits_set {
            return Err(Error::enumeration_mismatch(bits_set, cardinality));
        }

        let stats = ExclusionStats {
            excluded_tags: distinct_tags.len(),
            unknown_tags,
            collected_documents: excluded_ids.len(),
            bits_set,
            cardinality,
            allowed_count: document_count - cardinality,
            collect_time,
            set_bits_time,
            tidy_up_time,
            total_time: total_timer.elapsed(),
        };
        if self.options.log_diagnostics {
            self.log_stats(query_type, &stats, &bitmap);
        }
        Ok(ExclusionBitmap { bitmap, stats })
    }

    fn log_stats(&self, query_type: QueryType, stats: &ExclusionStats, bitmap: &CompressedBitmap) {
        info!(
            "Took {:.2} ms to collect {} document ids from {} tags ({} unknown)",
            millis(stats.collect_time),
            stats.collected_documents,
            stats.excluded_tags,
            stats.unknown_tags
        );
        info!(
            "Took {:.2} ms to set {} bits in the {} ordering",
            millis(stats.set_bits_time),
            stats.bits_set,
            query_type
        );
        info!(
            "Took {:.2} ms to pad and shrink the bitmap, {} heap bytes",
            millis(stats.tidy_up_time),
            bitmap.heap_size_bytes()
        );
        info!(
            "Took {:.2} ms in total, cardinality {} ({} allowed)",
            millis(stats.total_time),
            stats.cardinality,
            stats.allowed_count
        );
    }
}
