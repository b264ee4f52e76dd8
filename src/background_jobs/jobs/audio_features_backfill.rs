//! Audio features backfill background job.
//!
//! Selects track uris that the journal references but has no audio
//! features row for, then fetches the missing features from the web API
//! in batches.

use crate::background_jobs::{
    context::JobContext,
    job::{BackgroundJob, HookEvent, JobError, JobSchedule, ShutdownBehavior},
    BackfillTally, BatchProgress, JobAuditLogger,
};
use crate::config::AudioFeaturesBackfillJobSettings;
use crate::journal_store::{write_all, AudioFeaturesRecord, WriteOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Background job that enriches journalled tracks with audio features.
pub struct AudioFeaturesBackfillJob {
    interval_hours: u64,
    batch_size: usize,
    run_on_startup: bool,
}

impl AudioFeaturesBackfillJob {
    pub fn from_settings(settings: &AudioFeaturesBackfillJobSettings) -> Self {
        Self {
            interval_hours: settings.interval_hours,
            batch_size: settings.batch_size,
            run_on_startup: settings.run_on_startup,
        }
    }
}

impl BackgroundJob for AudioFeaturesBackfillJob {
    fn id(&self) -> &'static str {
        "audio_features_backfill"
    }

    fn name(&self) -> &'static str {
        "Audio Features Backfill"
    }

    fn description(&self) -> &'static str {
        "Fetch audio features for journalled tracks that have none yet"
    }

    fn schedule(&self) -> JobSchedule {
        let interval = Duration::from_secs(self.interval_hours * 60 * 60);
        if self.run_on_startup {
            JobSchedule::Combined {
                interval: Some(interval),
                hooks: vec![HookEvent::OnStartup],
            }
        } else {
            JobSchedule::Interval(interval)
        }
    }

    fn shutdown_behavior(&self) -> ShutdownBehavior {
        ShutdownBehavior::Cancellable
    }

    fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let audit = JobAuditLogger::new(Arc::clone(&ctx.job_store), self.id());

        audit.log_started();

        let result = self.run_backfill(ctx, &audit);

        match &result {
            Ok(()) => {}
            Err(JobError::Cancelled) => {
                audit.log_failed("Cancelled");
            }
            Err(e) => {
                audit.log_failed(&e.to_string());
            }
        }

        result
    }
}

impl AudioFeaturesBackfillJob {
    fn run_backfill(&self, ctx: &JobContext, audit: &JobAuditLogger) -> Result<(), JobError> {
        let pending = ctx.journal_store.get_unenriched_track_uris().map_err(|e| {
            JobError::ExecutionFailed(format!("Failed to select unenriched tracks: {}", e))
        })?;

        if pending.is_empty() {
            info!("No tracks need audio features");
            audit.log_completed(&BackfillTally::default());
            return Ok(());
        }

        // The features endpoint wants bare ids; the rows that come back
        // carry the full uri again.
        let mut track_ids: Vec<String> = Vec::with_capacity(pending.len());
        for uri in &pending {
            match bare_track_id(uri) {
                Some(id) => track_ids.push(id.to_string()),
                None => debug!("Skipping uri without a track id: {}", uri),
            }
        }

        info!(
            "Backfilling audio features for {} tracks in batches of {}",
            track_ids.len(),
            self.batch_size
        );

        let token = ctx.spotify.fetch_access_token().map_err(|e| {
            JobError::ExecutionFailed(format!("Failed to fetch access token: {}", e))
        })?;

        let mut outcome = WriteOutcome::default();
        let mut missing = 0usize;
        let mut fetch_errors = 0usize;

        for (batch_index, chunk) in track_ids.chunks(self.batch_size.max(1)).enumerate() {
            if ctx.is_cancelled() {
                return Err(JobError::Cancelled);
            }

            let features = match ctx.spotify.fetch_audio_features(&token, chunk) {
                Ok(features) => features,
                Err(e) => {
                    warn!("Audio features batch {} failed: {}", batch_index, e);
                    fetch_errors += 1;
                    continue;
                }
            };

            // Unknown ids come back as None and stay unenriched; the next
            // run selects them again.
            let mut batch_missing = 0usize;
            let mut records: Vec<AudioFeaturesRecord> = Vec::with_capacity(features.len());
            for entry in features {
                match entry {
                    Some(features) => records.push(features.into()),
                    None => batch_missing += 1,
                }
            }
            missing += batch_missing;

            let batch_outcome = write_all("AudioAnalysis", &records, |r| {
                ctx.journal_store.insert_audio_features(r)
            });
            outcome.absorb(batch_outcome);

            audit.log_progress(&BatchProgress {
                batch: batch_index,
                inserted: batch_outcome.inserted,
                missing: batch_missing,
            });
        }

        info!(
            "Audio features backfill complete: {} enriched, {} rows failed, {} unknown upstream",
            outcome.inserted, outcome.failed, missing
        );

        audit.log_completed(&BackfillTally {
            selected: pending.len(),
            enriched: outcome.inserted,
            rows_failed: outcome.failed,
            missing,
            fetch_errors,
        });

        Ok(())
    }
}

fn bare_track_id(uri: &str) -> Option<&str> {
    uri.rsplit(':').next().filter(|id| !id.is_empty())
}
