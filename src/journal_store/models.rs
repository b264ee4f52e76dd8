//! Data models for the journal database.

use serde::{Deserialize, Serialize};

/// One flat row of the `Activity` table: a friend's listening change at a
/// point in time. Column names mirror the nested feed paths with
/// underscores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub timestamp: i64,
    pub user_uri: String,
    pub user_name: Option<String>,
    pub track_uri: String,
    pub track_name: Option<String>,
    pub track_image_url: Option<String>,
    pub track_album_uri: Option<String>,
    pub track_album_name: Option<String>,
    pub track_artist_uri: Option<String>,
    pub track_artist_name: Option<String>,
    pub track_context_name: Option<String>,
    pub track_context_index: Option<i64>,
}

/// One flat row of the `MyActivity` table: the user's own playback state
/// at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyActivityRecord {
    pub shuffle_state: Option<bool>,
    pub repeat_state: Option<String>,
    pub timestamp: i64,
    pub progress_ms: Option<i64>,
    pub currently_playing_type: Option<String>,
    pub is_playing: Option<bool>,
    pub device_id: Option<String>,
    pub device_is_active: Option<bool>,
    pub device_is_private_session: Option<bool>,
    pub device_is_restricted: Option<bool>,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub device_volume_percent: Option<i64>,
    pub context_type: Option<String>,
    pub context_uri: Option<String>,
    pub item_album_name: Option<String>,
    pub item_album_uri: Option<String>,
    pub item_artists_name: Option<String>,
    pub item_artists_uri: Option<String>,
    pub item_duration_ms: Option<i64>,
    pub item_explicit: Option<bool>,
    pub item_is_local: Option<bool>,
    pub item_name: Option<String>,
    pub item_popularity: Option<i64>,
    pub item_track_number: Option<i64>,
    pub item_uri: String,
}

/// One row of the `AudioAnalysis` table.
///
/// `uri` keeps the full `spotify:track:...` form so the backfill selector
/// can anti-join it directly against `Activity.track_uri` and
/// `MyActivity.item_uri`. The upstream `key` field lands in `track_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeaturesRecord {
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub track_key: Option<i64>,
    pub loudness: Option<f64>,
    pub mode: Option<i64>,
    pub speechiness: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    pub feature_type: Option<String>,
    pub uri: String,
    pub duration_ms: Option<i64>,
    pub time_signature: Option<i64>,
}

impl From<crate::spotify::AudioFeatures> for AudioFeaturesRecord {
    fn from(features: crate::spotify::AudioFeatures) -> Self {
        Self {
            danceability: features.danceability,
            energy: features.energy,
            track_key: features.key,
            loudness: features.loudness,
            mode: features.mode,
            speechiness: features.speechiness,
            acousticness: features.acousticness,
            instrumentalness: features.instrumentalness,
            liveness: features.liveness,
            valence: features.valence,
            tempo: features.tempo,
            feature_type: features.feature_type,
            uri: features.uri,
            duration_ms: features.duration_ms,
            time_signature: features.time_signature,
        }
    }
}

/// Row counts per journal table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalStats {
    pub activity_rows: usize,
    pub my_activity_rows: usize,
    pub audio_analysis_rows: usize,
}
