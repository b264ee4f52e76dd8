//! Specific background job implementations.
//!
//! This module contains implementations of the `BackgroundJob` trait
//! for the feed ingestion and enrichment tasks.

pub mod audio_features_backfill;
pub mod presence_ingestion;

pub use audio_features_backfill::AudioFeaturesBackfillJob;
pub use presence_ingestion::PresenceIngestionJob;
