//! Presence ingestion background job.
//!
//! Polls the friend activity feed and the caller's own playback state,
//! diffs them against the persisted baselines, and journals every real
//! listening change as flat rows.

use crate::background_jobs::{
    context::JobContext,
    job::{BackgroundJob, JobError, JobSchedule, ShutdownBehavior},
    IngestionCycleCounts, JobAuditLogger,
};
use crate::config::PresenceIngestionJobSettings;
use crate::ingest::{
    diff_playback, diff_presence, flatten_friend, flatten_playback, FirstRunPolicy,
};
use crate::journal_store::{write_all, WriteOutcome};
use crate::spotify::AccessToken;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Background job that ingests presence and own-playback changes.
pub struct PresenceIngestionJob {
    interval_secs: u64,
    first_run: FirstRunPolicy,
}

impl PresenceIngestionJob {
    pub fn from_settings(settings: &PresenceIngestionJobSettings) -> Self {
        Self {
            interval_secs: settings.interval_secs,
            first_run: settings.first_run,
        }
    }
}

impl BackgroundJob for PresenceIngestionJob {
    fn id(&self) -> &'static str {
        "presence_ingestion"
    }

    fn name(&self) -> &'static str {
        "Presence Ingestion"
    }

    fn description(&self) -> &'static str {
        "Poll the friend activity feed and journal listening changes"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::Interval(Duration::from_secs(self.interval_secs))
    }

    fn shutdown_behavior(&self) -> ShutdownBehavior {
        // A half-finished cycle would journal rows without advancing the
        // baseline, so let it run to completion on shutdown.
        ShutdownBehavior::WaitForCompletion
    }

    fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let audit = JobAuditLogger::new(Arc::clone(&ctx.job_store), self.id());

        let result = self.run_cycle(ctx);

        match &result {
            // The cycle fires every few seconds; a started/completed pair
            // per cycle would drown the audit log, so quiet cycles are
            // not recorded.
            Ok(counts) if counts.any_rows() => {
                audit.log_completed(counts);
            }
            Ok(_) => {}
            Err(JobError::Cancelled) => {
                audit.log_failed("Cancelled");
            }
            Err(e) => {
                audit.log_failed(&e.to_string());
            }
        }

        result.map(|_| ())
    }
}

impl PresenceIngestionJob {
    fn run_cycle(&self, ctx: &JobContext) -> Result<IngestionCycleCounts, JobError> {
        let token = ctx.spotify.fetch_access_token().map_err(|e| {
            JobError::ExecutionFailed(format!("Failed to fetch access token: {}", e))
        })?;

        let current = ctx.spotify.fetch_buddylist(&token).map_err(|e| {
            JobError::ExecutionFailed(format!("Failed to fetch friend activity: {}", e))
        })?;

        // A corrupt baseline fails the run; only a missing file reads as None.
        let previous = ctx
            .snapshot_store
            .load_presence()
            .map_err(|e| JobError::ExecutionFailed(e.to_string()))?;

        let changed = diff_presence(previous.as_ref(), &current, self.first_run);

        let mut records = Vec::with_capacity(changed.len());
        for entry in &changed {
            match flatten_friend(entry) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed feed entry: {}", e),
            }
        }

        let activity = write_all("Activity", &records, |r| ctx.journal_store.insert_activity(r));

        // The baseline advances even on a quiet cycle, so jitter entries
        // are compared against the latest observation next time around.
        ctx.snapshot_store
            .save_presence(&current)
            .map_err(|e| JobError::ExecutionFailed(e.to_string()))?;

        if !records.is_empty() {
            info!(
                "Journalled {} friend activity changes ({} failed)",
                activity.inserted, activity.failed
            );
        }

        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let playback = self.ingest_own_playback(ctx, &token)?;
        Ok(IngestionCycleCounts {
            activity_inserted: activity.inserted,
            activity_failed: activity.failed,
            my_activity_inserted: playback.inserted,
            my_activity_failed: playback.failed,
        })
    }

    fn ingest_own_playback(
        &self,
        ctx: &JobContext,
        token: &AccessToken,
    ) -> Result<WriteOutcome, JobError> {
        let playback = ctx.spotify.fetch_current_playback(token).map_err(|e| {
            JobError::ExecutionFailed(format!("Failed to fetch current playback: {}", e))
        })?;

        // Nothing playing: the stage is skipped and the baseline stays put,
        // so the last playing state is still the comparison point later.
        let Some(current) = playback else {
            return Ok(WriteOutcome::default());
        };

        let previous = ctx
            .snapshot_store
            .load_playback()
            .map_err(|e| JobError::ExecutionFailed(e.to_string()))?;

        let mut outcome = WriteOutcome::default();
        if diff_playback(previous.as_ref(), &current, self.first_run) {
            match flatten_playback(&current) {
                Ok(record) => {
                    outcome = write_all("MyActivity", &[record], |r| {
                        ctx.journal_store.insert_my_activity(r)
                    });
                    if outcome.inserted > 0 {
                        info!("Journalled own playback change");
                    }
                }
                Err(e) => warn!("Skipping malformed playback state: {}", e),
            }
        }

        ctx.snapshot_store
            .save_playback(&current)
            .map_err(|e| JobError::ExecutionFailed(e.to_string()))?;

        Ok(outcome)
    }
}
