//! Job audit logging.
//!
//! Typed detail payloads for the audit trail the jobs leave in the job
//! store. Writes are best-effort; a failed audit write never fails the
//! job that produced it.

use crate::job_store::{JobAuditEventType, JobStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Per-table row counts for one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IngestionCycleCounts {
    pub activity_inserted: usize,
    pub activity_failed: usize,
    pub my_activity_inserted: usize,
    pub my_activity_failed: usize,
}

impl IngestionCycleCounts {
    /// True if the cycle wrote or rejected any row in either table.
    pub fn any_rows(&self) -> bool {
        let writes = self.activity_inserted + self.my_activity_inserted;
        let failures = self.activity_failed + self.my_activity_failed;
        writes + failures > 0
    }
}

/// Outcome of one enrichment batch.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchProgress {
    pub batch: usize,
    pub inserted: usize,
    pub missing: usize,
}

/// Final tally of a backfill run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BackfillTally {
    pub selected: usize,
    pub enriched: usize,
    pub rows_failed: usize,
    pub missing: usize,
    pub fetch_errors: usize,
}

/// Helper for logging job audit events.
pub struct JobAuditLogger {
    job_store: Arc<dyn JobStore>,
    job_id: String,
    start_time: Instant,
}

impl JobAuditLogger {
    /// Create a new audit logger for a job.
    pub fn new(job_store: Arc<dyn JobStore>, job_id: &str) -> Self {
        Self {
            job_store,
            job_id: job_id.to_string(),
            start_time: Instant::now(),
        }
    }

    /// Log that the job has started.
    pub fn log_started(&self) {
        let _ = self.job_store.log_job_audit(
            &self.job_id,
            JobAuditEventType::Started,
            None,
            None,
            None,
        );
    }

    /// Log that the job has completed, with its detail payload.
    pub fn log_completed<D: Serialize>(&self, details: &D) {
        self.write(JobAuditEventType::Completed, Some(self.elapsed_ms()), details);
    }

    /// Log that the job has failed.
    pub fn log_failed(&self, error: &str) {
        let _ = self.job_store.log_job_audit(
            &self.job_id,
            JobAuditEventType::Failed,
            Some(self.elapsed_ms()),
            None,
            Some(error),
        );
    }

    /// Log a progress update during job execution.
    pub fn log_progress<D: Serialize>(&self, details: &D) {
        self.write(JobAuditEventType::Progress, None, details);
    }

    fn elapsed_ms(&self) -> i64 {
        self.start_time.elapsed().as_millis() as i64
    }

    fn write<D: Serialize>(
        &self,
        event_type: JobAuditEventType,
        duration_ms: Option<i64>,
        details: &D,
    ) {
        let details = serde_json::to_value(details).ok();
        let _ = self.job_store.log_job_audit(
            &self.job_id,
            event_type,
            duration_ms,
            details.as_ref(),
            None,
        );
    }
}
