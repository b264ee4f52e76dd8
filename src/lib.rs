//! Listening Journal Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod background_jobs;
pub mod config;
pub mod ingest;
pub mod job_store;
pub mod journal_store;
pub mod snapshot_store;
pub mod spotify;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use job_store::{JobStore, SqliteJobStore};
pub use journal_store::{JournalStore, SqliteJournalStore};
pub use snapshot_store::{JsonSnapshotStore, SnapshotStore};
pub use spotify::{HttpSpotifyClient, SpotifyClient};
