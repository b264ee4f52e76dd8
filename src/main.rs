use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import modules from the library crate
use listening_journal::background_jobs::jobs::{AudioFeaturesBackfillJob, PresenceIngestionJob};
use listening_journal::background_jobs::{create_scheduler, JobContext};
use listening_journal::config;
use listening_journal::ingest::FirstRunPolicy;
use listening_journal::job_store::{JobStore, SqliteJobStore};
use listening_journal::journal_store::{JournalStore, SqliteJournalStore};
use listening_journal::snapshot_store::{JsonSnapshotStore, SnapshotStore};
use listening_journal::spotify::{HttpSpotifyClient, SpotifyClient};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing database files (journal.db, jobs.db).
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// Directory for feed baseline snapshots. Defaults to <db_dir>/snapshots.
    #[clap(long, value_parser = parse_path)]
    pub snapshot_dir: Option<PathBuf>,

    /// Interval in seconds between presence feed polls.
    #[clap(long, default_value_t = 30)]
    pub presence_interval_secs: u64,

    /// What to do with the first observed feed when no baseline exists:
    /// "seed-only" or "ingest-all".
    #[clap(long, default_value = "seed-only")]
    pub first_run: FirstRunPolicy,

    /// Interval in hours between audio features backfill runs.
    #[clap(long, default_value_t = 24)]
    pub backfill_interval_hours: u64,

    /// Number of track ids per audio features request.
    #[clap(long, default_value_t = 100)]
    pub backfill_batch_size: usize,

    /// Whether the backfill job also runs once at startup.
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub backfill_on_startup: bool,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            snapshot_dir: args.snapshot_dir.clone(),
            presence_interval_secs: args.presence_interval_secs,
            first_run: args.first_run,
            backfill_interval_hours: args.backfill_interval_hours,
            backfill_batch_size: args.backfill_batch_size,
            backfill_on_startup: args.backfill_on_startup,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  snapshot_dir: {:?}", app_config.snapshot_dir);
    info!(
        "  presence poll interval: {}s",
        app_config.background_jobs.presence_ingestion.interval_secs
    );

    // Create journal store (will create DB if not exists)
    if !app_config.journal_db_path().exists() {
        info!(
            "Creating new journal database at {:?}",
            app_config.journal_db_path()
        );
    }
    let journal_store = Arc::new(SqliteJournalStore::new(app_config.journal_db_path())?);

    // Create job store for run history and schedule state
    if !app_config.jobs_db_path().exists() {
        info!(
            "Creating new jobs database at {:?}",
            app_config.jobs_db_path()
        );
    }
    let job_store = Arc::new(SqliteJobStore::new(app_config.jobs_db_path())?);

    // Snapshot store holds the feed baselines between polls
    std::fs::create_dir_all(&app_config.snapshot_dir)?;
    let snapshot_store = Arc::new(JsonSnapshotStore::new(&app_config.snapshot_dir));

    let spotify = Arc::new(HttpSpotifyClient::new(&app_config.spotify)?);

    // Set up background job scheduler
    let shutdown_token = CancellationToken::new();
    let (hook_sender, hook_receiver) = tokio::sync::mpsc::channel(100);

    let job_context = JobContext::new(
        shutdown_token.child_token(),
        journal_store.clone() as Arc<dyn JournalStore>,
        job_store.clone() as Arc<dyn JobStore>,
        snapshot_store.clone() as Arc<dyn SnapshotStore>,
        spotify.clone() as Arc<dyn SpotifyClient>,
    );

    let (mut scheduler, _scheduler_handle) = create_scheduler(
        job_store.clone(),
        hook_receiver,
        shutdown_token.clone(),
        job_context,
    );

    // Register jobs
    scheduler
        .register_job(Arc::new(PresenceIngestionJob::from_settings(
            &app_config.background_jobs.presence_ingestion,
        )))
        .await;
    scheduler
        .register_job(Arc::new(AudioFeaturesBackfillJob::from_settings(
            &app_config.background_jobs.audio_features_backfill,
        )))
        .await;

    info!(
        "Job scheduler initialized with {} job(s)",
        scheduler.job_count().await
    );

    // Note: startup hooks fire from inside the scheduler loop; the sender is
    // kept for future external triggers
    let _ = hook_sender;

    // Run the job scheduler until shutdown
    tokio::select! {
        _ = scheduler.run() => {
            info!("Scheduler stopped");
            Ok(())
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown");
            shutdown_token.cancel();
            // Give the scheduler a moment to shut down gracefully
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        }
    }
}
