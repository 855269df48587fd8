//! Build telemetry: phase timings, process memory snapshots and count mismatches.

use std::{fmt, time::Duration};

use serde::Serialize;
use tagsieve_bitmap::compressed_bitmap::SegmentStats;

use crate::query_type::QueryType;

/// Resident and virtual memory of the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemorySnapshot {
    pub physical_bytes: usize,
    pub virtual_bytes: usize,
}

impl MemorySnapshot {
    /// Reads the current process memory usage; `None` where the platform does not
    /// expose it.
    pub fn capture() -> Option<MemorySnapshot> {
        memory_stats::memory_stats().map(|stats| MemorySnapshot {
            physical_bytes: stats.physical_mem,
            virtual_bytes: stats.virtual_mem,
        })
    }

    pub fn physical_mb(&self) -> f64 {
        self.physical_bytes as f64 / 1024.0 / 1024.0
    }
}

impl fmt::Display for MemorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mb = self.physical_mb();
        write!(f, "{mb:.2} MB ({:.2} GB)", mb / 1024.0)
    }
}

/// Captures a snapshot when `enabled`, for optional memory tracking.
pub(crate) fn capture_memory(enabled: bool) -> Option<MemorySnapshot> {
    if enabled { MemorySnapshot::capture() } else { None }
}

/// Renders an optional snapshot for log lines.
pub(crate) struct MemoryDisplay(pub Option<MemorySnapshot>);

impl fmt::Display for MemoryDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(snapshot) => fmt::Display::fmt(&snapshot, f),
            None => f.write_str("n/a"),
        }
    }
}

/// A tag whose observed count in an ordering disagrees with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub tag: String,
    pub query_type: QueryType,
    pub expected: u64,
    pub observed: u64,
}

/// Summary of one bulk build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub tags_indexed: usize,
    pub bitmap_count: usize,
    pub document_count: usize,
    pub allocate_time: Duration,
    /// Populate time per query type, in [`QueryType::ALL`] order.
    pub populate_times: Vec<(QueryType, Duration)>,
    pub post_process_time: Duration,
    pub total_time: Duration,
    /// Taken before any build phase runs.
    pub memory_before: Option<MemorySnapshot>,
    pub memory_after_allocate: Option<MemorySnapshot>,
    pub memory_after_populate: Option<MemorySnapshot>,
    pub memory_after_post_process: Option<MemorySnapshot>,
    pub mismatches: Vec<CountMismatch>,
    pub heap_size_bytes: usize,
    pub segment_stats: SegmentStats,
}

impl BuildReport {
    pub fn populate_time(&self) -> Duration {
        self.populate_times.iter().map(|(_, d)| *d).sum()
    }
}

/// Milliseconds with fractional part, for log lines.
pub(crate) fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
