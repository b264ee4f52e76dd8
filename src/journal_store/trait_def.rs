//! JournalStore trait definition.

use super::models::{ActivityRecord, AudioFeaturesRecord, JournalStats, MyActivityRecord};
use anyhow::Result;

/// Trait for journal storage backends.
///
/// Inserts are single-row and autocommitted; batching discipline lives in
/// the writer, not here.
pub trait JournalStore: Send + Sync {
    /// Insert one friend activity row. Fails on a uniqueness violation,
    /// which callers absorb as a per-row failure.
    fn insert_activity(&self, record: &ActivityRecord) -> Result<()>;

    /// Insert one own-playback row.
    fn insert_my_activity(&self, record: &MyActivityRecord) -> Result<()>;

    /// Insert one audio features row.
    fn insert_audio_features(&self, record: &AudioFeaturesRecord) -> Result<()>;

    /// Full uris referenced by `Activity` or `MyActivity` but not yet
    /// present in `AudioAnalysis`. Sorted for determinism.
    fn get_unenriched_track_uris(&self) -> Result<Vec<String>>;

    /// Row counts per table.
    fn get_journal_stats(&self) -> Result<JournalStats>;
}
