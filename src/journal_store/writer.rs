//! Row-at-a-time batch writer.

use anyhow::Result;
use tracing::warn;

/// Aggregate outcome of a batch write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub inserted: usize,
    pub failed: usize,
}

impl WriteOutcome {
    pub fn absorb(&mut self, other: WriteOutcome) {
        self.inserted += other.inserted;
        self.failed += other.failed;
    }
}

/// Insert records one at a time, each as its own commit.
///
/// A failed row (constraint violation, connectivity blip) is counted and
/// logged, and iteration moves on; no record ever aborts the batch and no
/// transaction spans more than one record. Replays after a partial failure
/// bounce off the uniqueness constraints and land in `failed`.
pub fn write_all<R>(
    table: &str,
    records: &[R],
    mut insert: impl FnMut(&R) -> Result<()>,
) -> WriteOutcome {
    let mut outcome = WriteOutcome::default();
    for record in records {
        match insert(record) {
            Ok(()) => outcome.inserted += 1,
            Err(e) => {
                warn!("Failed to insert row into {}: {:#}", table, e);
                outcome.failed += 1;
            }
        }
    }
    outcome
}
