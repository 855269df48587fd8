//! Build command implementation

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tagsieve_index::{BitmapIndexBuilder, CountMismatch, MemorySnapshot};

use crate::{
    CorpusArgs,
    commands::{SegmentInfo, load_options, ms, print_json},
    corpus_source::load_corpus,
};

const MAX_REPORTED_MISMATCHES: usize = 20;

#[derive(Serialize)]
struct BuildSummary {
    document_count: usize,
    distinct_tags: usize,
    tags_indexed: usize,
    bitmap_count: usize,
    heap_size_bytes: usize,
    timings_ms: TimingInfo,
    memory: MemoryInfo,
    segments: SegmentInfo,
    top_tags: Vec<TagInfo>,
    mismatch_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    mismatches: Vec<CountMismatch>,
}

#[derive(Serialize)]
struct TimingInfo {
    allocate: f64,
    populate: BTreeMap<String, f64>,
    post_process: f64,
    total: f64,
}

#[derive(Serialize)]
struct MemoryInfo {
    before: Option<MemorySnapshot>,
    after_allocate: Option<MemorySnapshot>,
    after_populate: Option<MemorySnapshot>,
    after_post_process: Option<MemorySnapshot>,
}

#[derive(Serialize)]
struct TagInfo {
    tag: String,
    documents: u64,
}

/// Run the build command
pub fn run(
    corpus_args: CorpusArgs,
    options_path: Option<String>,
    min_docs_per_tag: Option<u64>,
    sequential: bool,
    top: usize,
) -> Result<()> {
    let mut options = load_options(options_path.as_deref())?.build;
    if let Some(min_docs_per_tag) = min_docs_per_tag {
        options.min_docs_per_tag = min_docs_per_tag;
    }
    if sequential {
        options.parallel_post_process = false;
    }

    let corpus = load_corpus(&corpus_args)?;
    let (index, report) = BitmapIndexBuilder::new(&corpus, options)
        .build()
        .context("Failed to build the tag bitmap index")?;

    let top_tags = index
        .tags()
        .iter()
        .take(top)
        .map(|tag| TagInfo {
            tag: tag.clone(),
            documents: corpus.catalog().count(tag).unwrap_or(0),
        })
        .collect();

    let summary = BuildSummary {
        document_count: report.document_count,
        distinct_tags: corpus.catalog().len(),
        tags_indexed: report.tags_indexed,
        bitmap_count: report.bitmap_count,
        heap_size_bytes: report.heap_size_bytes,
        timings_ms: TimingInfo {
            allocate: ms(report.allocate_time),
            populate: report
                .populate_times
                .iter()
                .map(|(query_type, elapsed)| (query_type.to_string(), ms(*elapsed)))
                .collect(),
            post_process: ms(report.post_process_time),
            total: ms(report.total_time),
        },
        memory: MemoryInfo {
            before: report.memory_before,
            after_allocate: report.memory_after_allocate,
            after_populate: report.memory_after_populate,
            after_post_process: report.memory_after_post_process,
        },
        segments: report.segment_stats.into(),
        top_tags,
        mismatch_count: report.mismatches.len(),
        mismatches: report
            .mismatches
            .into_iter()
            .take(MAX_REPORTED_MISMATCHES)
            .collect(),
    };
    print_json(&summary)
}
