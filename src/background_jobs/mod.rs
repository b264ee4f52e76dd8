//! Background job scheduling and execution system.
//!
//! This module provides infrastructure for running periodic and event-triggered
//! background tasks like presence ingestion and audio features backfill.

mod audit_logger;
mod context;
mod handle;
mod job;
pub mod jobs;
mod scheduler;

pub use audit_logger::{BackfillTally, BatchProgress, IngestionCycleCounts, JobAuditLogger};
pub use context::JobContext;
pub use handle::{JobInfo, SchedulerHandle};
pub use job::{BackgroundJob, HookEvent, JobError, JobSchedule, ShutdownBehavior};
pub use scheduler::{create_scheduler, JobScheduler};
