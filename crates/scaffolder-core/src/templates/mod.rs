//! Template references, fetching and the in-memory snapshot
//!
//! This module provides:
//! - Template references (`github:owner/repo/sub#ref`, `local:<dir>`)
//! - The `SnapshotFetcher` seam and its zip-based production implementation
//! - The snapshot of files the pipeline rewrites before flushing them

pub mod fetcher;
pub mod reference;
pub mod snapshot;

pub use fetcher::{
    FetchError, FetchOptions, FetchOutcome, SnapshotFetcher, TemplateFetcher, DEFAULT_ARCHIVE_URL,
};
pub use reference::{TemplateHost, TemplateRef, TemplateRefError};
pub use snapshot::TemplateSnapshot;
