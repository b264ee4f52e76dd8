mod models;
mod schema;
mod store;

pub use models::{JobAuditEntry, JobAuditEventType, JobRun, JobRunStatus, JobScheduleState};
pub use store::SqliteJobStore;

use anyhow::Result;

/// Persistence for background job bookkeeping: run history, schedule
/// state that survives restarts, and an audit trail of job events.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait JobStore: Send + Sync {
    /// Records the start of a job run and returns the run id.
    fn record_job_start(&self, job_id: &str, triggered_by: &str) -> Result<i64>;

    /// Marks a run as finished with the given status.
    fn record_job_finish(
        &self,
        run_id: i64,
        status: JobRunStatus,
        error_message: Option<String>,
    ) -> Result<()>;

    /// Returns all runs currently marked as running.
    fn get_running_jobs(&self) -> Result<Vec<JobRun>>;

    /// Returns the most recent runs for a job, newest first.
    fn get_job_history(&self, job_id: &str, limit: usize) -> Result<Vec<JobRun>>;

    /// Returns the most recent run for a job, if any.
    fn get_last_run(&self, job_id: &str) -> Result<Option<JobRun>>;

    /// Marks all runs still in the running state as failed.
    ///
    /// Called at startup: anything still "running" at that point was
    /// interrupted by a previous shutdown or crash.
    fn mark_stale_jobs_failed(&self) -> Result<usize>;

    /// Deletes old runs, keeping the most recent `keep_per_job` runs
    /// for each job. Returns the number of deleted rows.
    fn cleanup_old_runs(&self, keep_per_job: usize) -> Result<usize>;

    fn get_schedule_state(&self, job_id: &str) -> Result<Option<JobScheduleState>>;

    /// Upserts the schedule state for a job.
    fn update_schedule_state(&self, state: &JobScheduleState) -> Result<()>;

    /// Appends an entry to the job audit log and returns its id.
    fn log_job_audit<'a, 'b>(
        &self,
        job_id: &str,
        event_type: JobAuditEventType,
        duration_ms: Option<i64>,
        details: Option<&'a serde_json::Value>,
        error: Option<&'b str>,
    ) -> Result<i64>;

    /// Returns audit entries for a job, newest first.
    fn get_job_audit_log(
        &self,
        job_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<JobAuditEntry>>;
}
