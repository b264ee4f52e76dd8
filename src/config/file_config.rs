//! TOML file configuration.
//!
//! Every field is optional; values that are present override the
//! corresponding CLI arguments during resolution.

use crate::ingest::FirstRunPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub snapshot_dir: Option<String>,
    pub spotify: Option<SpotifyConfig>,
    pub background_jobs: Option<BackgroundJobsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotifyConfig {
    pub sp_dc: Option<String>,
    pub token_url: Option<String>,
    pub api_base_url: Option<String>,
    pub presence_base_url: Option<String>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackgroundJobsConfig {
    pub presence_ingestion: Option<PresenceIngestionJobConfig>,
    pub audio_features_backfill: Option<AudioFeaturesBackfillJobConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresenceIngestionJobConfig {
    pub interval_secs: Option<u64>,
    pub first_run: Option<FirstRunPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioFeaturesBackfillJobConfig {
    pub interval_hours: Option<u64>,
    pub batch_size: Option<usize>,
    pub run_on_startup: Option<bool>,
}

impl FileConfig {
    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }
}
