//! Tag exclusion bitmaps over a fixed, in-memory document collection.
//!
//! The crate has two entry points:
//! - [`BitmapIndexBuilder`] runs the one-time bulk build that produces a presence
//!   bitmap for every indexed `(tag, QueryType)` pair and freezes them into a
//!   read-only [`TagBitmapIndex`].
//! - [`ExclusionBitmapCompiler`] answers per-request exclusion queries: for a set
//!   of tags and a query type it produces a bitmap of the positions to drop.
//!
//! Every bitmap spans the full document count; positions past the end of a
//! subset ordering are zero padding, so bitmaps of different query types can be
//! combined directly.

pub mod builder;
pub mod corpus;
pub mod diagnostics;
pub mod exclusion;
pub mod options;
pub mod query_type;
pub mod tag_bitmap_index;

pub use builder::BitmapIndexBuilder;
pub use corpus::{Corpus, Document, DocumentId, QueryOrdering, TagCatalog};
pub use diagnostics::{BuildReport, CountMismatch, MemorySnapshot};
pub use exclusion::{ExclusionBitmap, ExclusionBitmapCompiler, ExclusionStats};
pub use options::{BuildOptions, CompileOptions, IndexOptions};
pub use query_type::QueryType;
pub use tag_bitmap_index::TagBitmapIndex;
