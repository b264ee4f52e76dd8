mod file_config;

pub use file_config::{
    AudioFeaturesBackfillJobConfig, BackgroundJobsConfig, FileConfig, PresenceIngestionJobConfig,
    SpotifyConfig,
};

use crate::ingest::FirstRunPolicy;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub snapshot_dir: Option<PathBuf>,
    pub presence_interval_secs: u64,
    pub first_run: FirstRunPolicy,
    pub backfill_interval_hours: u64,
    pub backfill_batch_size: usize,
    pub backfill_on_startup: bool,
}

impl Default for CliConfig {
    // Mirrors the clap default values, so resolution behaves the same
    // whether a field came from the command line or was left alone.
    fn default() -> Self {
        Self {
            db_dir: None,
            snapshot_dir: None,
            presence_interval_secs: 30,
            first_run: FirstRunPolicy::SeedOnly,
            backfill_interval_hours: 24,
            backfill_batch_size: 100,
            backfill_on_startup: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub snapshot_dir: PathBuf,

    // Feature configs (with defaults)
    pub spotify: SpotifySettings,
    pub background_jobs: BackgroundJobsSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        // Validate db_dir exists
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let snapshot_dir = file
            .snapshot_dir
            .map(PathBuf::from)
            .or_else(|| cli.snapshot_dir.clone())
            .unwrap_or_else(|| db_dir.join("snapshots"));

        // The sp_dc cookie comes from the config file or the SP_DC environment
        // variable, never from the command line where it would end up in shell
        // history.
        let sp_file = file.spotify.unwrap_or_default();
        let sp_dc = sp_file
            .sp_dc
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var("SP_DC").ok().filter(|s| !s.is_empty()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "spotify.sp_dc must be set in the config file or via the SP_DC environment variable"
                )
            })?;

        let spotify = SpotifySettings {
            sp_dc,
            token_url: sp_file.token_url.unwrap_or_else(|| {
                "https://open.spotify.com/get_access_token?reason=transport&productType=web_player"
                    .to_string()
            }),
            api_base_url: sp_file
                .api_base_url
                .unwrap_or_else(|| "https://api.spotify.com".to_string()),
            presence_base_url: sp_file
                .presence_base_url
                .unwrap_or_else(|| "https://spclient.wg.spotify.com".to_string()),
            timeout_sec: sp_file.timeout_sec.unwrap_or(10),
        };

        // Background jobs settings from file config
        let bg_jobs_file = file.background_jobs.unwrap_or_default();

        let pi_file = bg_jobs_file.presence_ingestion.unwrap_or_default();
        let presence_ingestion = PresenceIngestionJobSettings {
            interval_secs: pi_file.interval_secs.unwrap_or(cli.presence_interval_secs),
            first_run: pi_file.first_run.unwrap_or(cli.first_run),
        };
        if presence_ingestion.interval_secs == 0 {
            bail!("background_jobs.presence_ingestion.interval_secs must be at least 1");
        }

        let afb_file = bg_jobs_file.audio_features_backfill.unwrap_or_default();
        let audio_features_backfill = AudioFeaturesBackfillJobSettings {
            interval_hours: afb_file
                .interval_hours
                .unwrap_or(cli.backfill_interval_hours),
            batch_size: afb_file.batch_size.unwrap_or(cli.backfill_batch_size),
            run_on_startup: afb_file.run_on_startup.unwrap_or(cli.backfill_on_startup),
        };
        if audio_features_backfill.interval_hours == 0 {
            bail!("background_jobs.audio_features_backfill.interval_hours must be at least 1");
        }
        if audio_features_backfill.batch_size == 0 {
            bail!("background_jobs.audio_features_backfill.batch_size must be at least 1");
        }

        let background_jobs = BackgroundJobsSettings {
            presence_ingestion,
            audio_features_backfill,
        };

        Ok(Self {
            db_dir,
            snapshot_dir,
            spotify,
            background_jobs,
        })
    }

    pub fn journal_db_path(&self) -> PathBuf {
        self.db_dir.join("journal.db")
    }

    pub fn jobs_db_path(&self) -> PathBuf {
        self.db_dir.join("jobs.db")
    }
}

/// Settings for the upstream web API client.
#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub sp_dc: String,
    pub token_url: String,
    pub api_base_url: String,
    pub presence_base_url: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, Default)]
pub struct BackgroundJobsSettings {
    pub presence_ingestion: PresenceIngestionJobSettings,
    pub audio_features_backfill: AudioFeaturesBackfillJobSettings,
}

/// Settings for the presence ingestion job
#[derive(Debug, Clone)]
pub struct PresenceIngestionJobSettings {
    pub interval_secs: u64,
    pub first_run: FirstRunPolicy,
}

impl Default for PresenceIngestionJobSettings {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            first_run: FirstRunPolicy::SeedOnly,
        }
    }
}

/// Settings for the audio features backfill job
#[derive(Debug, Clone)]
pub struct AudioFeaturesBackfillJobSettings {
    pub interval_hours: u64,
    pub batch_size: usize,
    pub run_on_startup: bool,
}

impl Default for AudioFeaturesBackfillJobSettings {
    fn default() -> Self {
        Self {
            interval_hours: 24,
            batch_size: 100,
            run_on_startup: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_temp_db_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn minimal_file_config() -> FileConfig {
        FileConfig {
            spotify: Some(SpotifyConfig {
                sp_dc: Some("test-cookie".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_cli_with_minimal_file() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            snapshot_dir: Some(PathBuf::from("/snapshots")),
            presence_interval_secs: 45,
            first_run: FirstRunPolicy::IngestAll,
            backfill_interval_hours: 6,
            backfill_batch_size: 25,
            backfill_on_startup: false,
        };

        let config = AppConfig::resolve(&cli, Some(minimal_file_config())).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.snapshot_dir, PathBuf::from("/snapshots"));
        assert_eq!(config.spotify.sp_dc, "test-cookie");
        assert!(config.spotify.token_url.contains("open.spotify.com"));
        assert_eq!(config.spotify.api_base_url, "https://api.spotify.com");
        assert_eq!(config.spotify.timeout_sec, 10);
        assert_eq!(config.background_jobs.presence_ingestion.interval_secs, 45);
        assert_eq!(
            config.background_jobs.presence_ingestion.first_run,
            FirstRunPolicy::IngestAll
        );
        assert_eq!(
            config.background_jobs.audio_features_backfill.interval_hours,
            6
        );
        assert_eq!(config.background_jobs.audio_features_backfill.batch_size, 25);
        assert!(!config.background_jobs.audio_features_backfill.run_on_startup);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/should/be/overridden")),
            presence_interval_secs: 30,
            ..Default::default()
        };

        let file_config = FileConfig {
            db_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            spotify: Some(SpotifyConfig {
                sp_dc: Some("test-cookie".to_string()),
                timeout_sec: Some(30),
                ..Default::default()
            }),
            background_jobs: Some(BackgroundJobsConfig {
                presence_ingestion: Some(PresenceIngestionJobConfig {
                    interval_secs: Some(5),
                    first_run: Some(FirstRunPolicy::IngestAll),
                }),
                audio_features_backfill: Some(AudioFeaturesBackfillJobConfig {
                    batch_size: Some(10),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.spotify.timeout_sec, 30);
        assert_eq!(config.background_jobs.presence_ingestion.interval_secs, 5);
        assert_eq!(
            config.background_jobs.presence_ingestion.first_run,
            FirstRunPolicy::IngestAll
        );
        assert_eq!(config.background_jobs.audio_features_backfill.batch_size, 10);
        // CLI value used when TOML doesn't specify
        assert_eq!(
            config.background_jobs.audio_features_backfill.interval_hours,
            24
        );
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let cli = CliConfig::default();
        let result = AppConfig::resolve(&cli, Some(minimal_file_config()));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, Some(minimal_file_config()));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_db_dir_not_directory_error() {
        // Create a temporary file (not a directory)
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_file.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, Some(minimal_file_config()));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_resolve_missing_sp_dc_error() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("sp_dc"));
    }

    #[test]
    fn test_resolve_snapshot_dir_defaults_under_db_dir() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            snapshot_dir: None,
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(minimal_file_config())).unwrap();
        assert_eq!(config.snapshot_dir, temp_dir.path().join("snapshots"));
    }

    #[test]
    fn test_resolve_zero_interval_rejected() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            presence_interval_secs: 0,
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, Some(minimal_file_config()));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("interval_secs must be at least 1"));
    }

    #[test]
    fn test_resolve_zero_batch_size_rejected() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            backfill_batch_size: 0,
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, Some(minimal_file_config()));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("batch_size must be at least 1"));
    }

    #[test]
    fn test_db_path_helpers() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(minimal_file_config())).unwrap();

        assert_eq!(config.journal_db_path(), temp_dir.path().join("journal.db"));
        assert_eq!(config.jobs_db_path(), temp_dir.path().join("jobs.db"));
    }
}
