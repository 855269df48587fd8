//! Exclude command implementation

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::Serialize;
use tagsieve_index::{
    BitmapIndexBuilder, BuildOptions, Corpus, ExclusionBitmap, ExclusionBitmapCompiler, QueryType,
    TagBitmapIndex,
};

use crate::{
    CorpusArgs, Scratch,
    commands::{SegmentInfo, load_options, ms, print_json},
    corpus_source::load_corpus,
};

#[derive(Serialize)]
struct ExcludeSummary {
    document_count: usize,
    tags: Vec<String>,
    results: Vec<QueryTypeResult>,
}

#[derive(Serialize)]
struct QueryTypeResult {
    query_type: QueryType,
    ordering_len: usize,
    excluded_tags: usize,
    unknown_tags: usize,
    collected_documents: usize,
    cardinality: u64,
    allowed_count: u64,
    heap_size_bytes: usize,
    segments: SegmentInfo,
    timings_ms: CompileTimings,
    #[serde(skip_serializing_if = "Option::is_none")]
    verified: Option<bool>,
}

#[derive(Serialize)]
struct CompileTimings {
    collect: f64,
    set_bits: f64,
    tidy_up: f64,
    total: f64,
    mean_wall: f64,
}

/// Run the exclude command
pub fn run(
    corpus_args: CorpusArgs,
    tags: Vec<String>,
    query_type: Option<QueryType>,
    options_path: Option<String>,
    scratch: Option<Scratch>,
    repeat: usize,
    verify: bool,
) -> Result<()> {
    if repeat == 0 {
        bail!("--repeat must be at least 1");
    }
    let mut options = load_options(options_path.as_deref())?.compile;
    if let Some(scratch) = scratch {
        options.scratch_representation = scratch.into();
    }

    let corpus = load_corpus(&corpus_args)?;
    let index = if verify {
        Some(build_verification_index(&corpus)?)
    } else {
        None
    };
    let compiler = ExclusionBitmapCompiler::new(&corpus, options);
    let query_types = match query_type {
        Some(query_type) => vec![query_type],
        None => QueryType::ALL.to_vec(),
    };

    let mut results = Vec::with_capacity(query_types.len());
    for query_type in query_types {
        let started = Instant::now();
        let mut excluded = None;
        for _ in 0..repeat {
            excluded = Some(compiler.compile(&tags, query_type).with_context(|| {
                format!("Failed to compile the exclusion bitmap for {query_type}")
            })?);
        }
        let mean_wall = mean_duration(started.elapsed(), repeat);
        let Some(excluded) = excluded else {
            continue;
        };
        let verified = index
            .as_ref()
            .map(|index| verify_against_index(index, &tags, query_type, &excluded));
        results.push(summarize(&corpus, query_type, excluded, mean_wall, verified));
    }

    print_json(&ExcludeSummary {
        document_count: corpus.document_count(),
        tags,
        results,
    })
}

fn mean_duration(total: Duration, repeat: usize) -> Duration {
    total.div_f64(repeat.max(1) as f64)
}

fn summarize(
    corpus: &Corpus,
    query_type: QueryType,
    excluded: ExclusionBitmap,
    mean_wall: Duration,
    verified: Option<bool>,
) -> QueryTypeResult {
    let (bitmap, stats) = excluded.into_parts();
    QueryTypeResult {
        query_type,
        ordering_len: corpus.ordering(query_type).len(),
        excluded_tags: stats.excluded_tags,
        unknown_tags: stats.unknown_tags,
        collected_documents: stats.collected_documents,
        cardinality: stats.cardinality,
        allowed_count: stats.allowed_count,
        heap_size_bytes: bitmap.heap_size_bytes(),
        segments: bitmap.segment_stats().into(),
        timings_ms: CompileTimings {
            collect: ms(stats.collect_time),
            set_bits: ms(stats.set_bits_time),
            tidy_up: ms(stats.tidy_up_time),
            total: ms(stats.total_time),
            mean_wall: ms(mean_wall),
        },
        verified,
    }
}

fn build_verification_index(corpus: &Corpus) -> Result<TagBitmapIndex> {
    let options = BuildOptions::default().with_track_memory(false);
    let (index, _) = BitmapIndexBuilder::new(corpus, options)
        .build()
        .context("Failed to build the verification index")?;
    info!("Built verification index over {} tags", index.len());
    Ok(index)
}

/// The exclusion bitmap must equal the union of the tags' presence bitmaps.
fn verify_against_index(
    index: &TagBitmapIndex,
    tags: &[String],
    query_type: QueryType,
    excluded: &ExclusionBitmap,
) -> bool {
    let union = tags
        .iter()
        .filter_map(|tag| index.get(tag, query_type))
        .fold(
            tagsieve_bitmap::CompressedBitmap::empty(index.document_count()),
            |acc, bitmap| acc.or(bitmap),
        );
    let matches = &union == excluded.bitmap();
    if !matches {
        let extra = excluded.bitmap().and_not(&union).cardinality();
        let missing = union.and_not(excluded.bitmap()).cardinality();
        warn!(
            "{query_type} exclusion bitmap disagrees with the index: {extra} extra, {missing} missing positions"
        );
    }
    matches
}
