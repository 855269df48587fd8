//! Configuration for the bulk build and the per-request compiler.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only needs
//! to name the fields it overrides.

use serde::{Deserialize, Serialize};
use tagsieve_collections::ScratchRepresentation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Tags with this many documents or fewer get no bitmaps.
    pub min_docs_per_tag: u64,
    /// Pad and shrink the built bitmaps on the rayon pool.
    pub parallel_post_process: bool,
    /// Capture process memory usage between build phases.
    pub track_memory: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            min_docs_per_tag: 0,
            parallel_post_process: true,
            track_memory: true,
        }
    }
}

impl BuildOptions {
    pub fn with_min_docs_per_tag(mut self, min_docs_per_tag: u64) -> Self {
        self.min_docs_per_tag = min_docs_per_tag;
        self
    }

    pub fn with_parallel_post_process(mut self, parallel: bool) -> Self {
        self.parallel_post_process = parallel;
        self
    }

    pub fn with_track_memory(mut self, track_memory: bool) -> Self {
        self.track_memory = track_memory;
        self
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Layout of the scratch set used to collect excluded document ids.
    pub scratch_representation: ScratchRepresentation,
    /// Log phase timings of every compilation at `info`.
    pub log_diagnostics: bool,
}

impl CompileOptions {
    pub fn with_scratch_representation(mut self, representation: ScratchRepresentation) -> Self {
        self.scratch_representation = representation;
        self
    }

    pub fn with_log_diagnostics(mut self, log_diagnostics: bool) -> Self {
        self.log_diagnostics = log_diagnostics;
        self
    }
}

/// Top-level configuration document: `{ "build": { .. }, "compile": { .. } }`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    pub build: BuildOptions,
    pub compile: CompileOptions,
}
