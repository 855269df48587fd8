//! Command implementations for tagsieve-cmd

use std::{fs::File, io::BufReader, time::Duration};

use anyhow::{Context, Result};
use serde::Serialize;
use tagsieve_bitmap::compressed_bitmap::SegmentStats;
use tagsieve_index::IndexOptions;

pub mod build;
pub mod exclude;

/// Loads an options file, or the defaults when no path is given.
pub fn load_options(path: Option<&str>) -> Result<IndexOptions> {
    let Some(path) = path else {
        return Ok(IndexOptions::default());
    };
    let file =
        File::open(path).with_context(|| format!("Failed to open options file: {path}"))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse options file: {path}"))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize summary")?;
    println!("{json}");
    Ok(())
}

pub fn ms(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 1_000_000.0).round() / 1000.0
}

#[derive(Serialize)]
pub struct SegmentInfo {
    empty: usize,
    full: usize,
    list: usize,
    bits: usize,
    ranges: usize,
}

impl From<SegmentStats> for SegmentInfo {
    fn from(stats: SegmentStats) -> Self {
        SegmentInfo {
            empty: stats.empty,
            full: stats.full,
            list: stats.list,
            bits: stats.bits,
            ranges: stats.ranges,
        }
    }
}
