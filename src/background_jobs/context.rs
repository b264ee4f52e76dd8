use crate::job_store::JobStore;
use crate::journal_store::JournalStore;
use crate::snapshot_store::SnapshotStore;
use crate::spotify::SpotifyClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Context provided to jobs during execution.
///
/// Contains references to shared resources and a cancellation token
/// for graceful shutdown handling.
#[derive(Clone)]
pub struct JobContext {
    /// Token to check for cancellation/shutdown requests.
    pub cancellation_token: CancellationToken,

    /// Access to the journal database (activity and enrichment rows).
    pub journal_store: Arc<dyn JournalStore>,

    /// Access to job bookkeeping (run history, schedules, audit log).
    pub job_store: Arc<dyn JobStore>,

    /// Access to the on-disk snapshot baselines.
    pub snapshot_store: Arc<dyn SnapshotStore>,

    /// Access to the upstream web API.
    pub spotify: Arc<dyn SpotifyClient>,
}

impl JobContext {
    /// Create a new job context with the given dependencies.
    pub fn new(
        cancellation_token: CancellationToken,
        journal_store: Arc<dyn JournalStore>,
        job_store: Arc<dyn JobStore>,
        snapshot_store: Arc<dyn SnapshotStore>,
        spotify: Arc<dyn SpotifyClient>,
    ) -> Self {
        Self {
            cancellation_token,
            journal_store,
            job_store,
            snapshot_store,
            spotify,
        }
    }

    /// Check if cancellation has been requested.
    ///
    /// Jobs should periodically check this during long-running operations
    /// and return early with `JobError::Cancelled` if true.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
