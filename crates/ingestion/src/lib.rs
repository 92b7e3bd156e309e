//! Incremental ingestion: dedup against a persistent seen-set, summarize,
//! tag, and append write-once snapshots.

pub mod pipeline;
pub mod seen_set;
pub mod storage;
pub mod tagger;

pub use pipeline::{DigestPipeline, PipelineOptions, RunReport};
pub use seen_set::SeenSet;
pub use storage::{render_digest, run_timestamp, DigestStore, Snapshot, StagedFile};
pub use tagger::{TagRule, Tagger};
