//! SQLite schema definitions for the journal database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

/// Friend listening changes, one row per observed transition.
const ACTIVITY_TABLE: Table = Table {
    name: "Activity",
    columns: &[
        sqlite_column!("timestamp", &SqlType::Integer, non_null = true),
        sqlite_column!("user_uri", &SqlType::Text, non_null = true),
        sqlite_column!("user_name", &SqlType::Text),
        sqlite_column!("track_uri", &SqlType::Text, non_null = true),
        sqlite_column!("track_name", &SqlType::Text),
        sqlite_column!("track_imageUrl", &SqlType::Text),
        sqlite_column!("track_album_uri", &SqlType::Text),
        sqlite_column!("track_album_name", &SqlType::Text),
        sqlite_column!("track_artist_uri", &SqlType::Text),
        sqlite_column!("track_artist_name", &SqlType::Text),
        sqlite_column!("track_context_name", &SqlType::Text),
        sqlite_column!("track_context_index", &SqlType::Integer),
    ],
    indices: &[("idx_activity_track_uri", "track_uri")],
    // A user cannot report two different transitions at the same instant;
    // replayed rows after a partial failure hit this and are absorbed as
    // per-row failures.
    unique_constraints: &[&["user_uri", "timestamp"]],
};

/// Own playback changes, one row per observed track transition.
const MY_ACTIVITY_TABLE: Table = Table {
    name: "MyActivity",
    columns: &[
        sqlite_column!("shuffle_state", &SqlType::Integer),
        sqlite_column!("repeat_state", &SqlType::Text),
        sqlite_column!("timestamp", &SqlType::Integer, non_null = true),
        sqlite_column!("progress_ms", &SqlType::Integer),
        sqlite_column!("currently_playing_type", &SqlType::Text),
        sqlite_column!("is_playing", &SqlType::Integer),
        sqlite_column!("device_id", &SqlType::Text),
        sqlite_column!("device_is_active", &SqlType::Integer),
        sqlite_column!("device_is_private_session", &SqlType::Integer),
        sqlite_column!("device_is_restricted", &SqlType::Integer),
        sqlite_column!("device_name", &SqlType::Text),
        sqlite_column!("device_type", &SqlType::Text),
        sqlite_column!("device_volume_percent", &SqlType::Integer),
        sqlite_column!("context_type", &SqlType::Text),
        sqlite_column!("context_uri", &SqlType::Text),
        sqlite_column!("item_album_name", &SqlType::Text),
        sqlite_column!("item_album_uri", &SqlType::Text),
        sqlite_column!("item_artists_name", &SqlType::Text),
        sqlite_column!("item_artists_uri", &SqlType::Text),
        sqlite_column!("item_duration_ms", &SqlType::Integer),
        sqlite_column!("item_explicit", &SqlType::Integer),
        sqlite_column!("item_is_local", &SqlType::Integer),
        sqlite_column!("item_name", &SqlType::Text),
        sqlite_column!("item_popularity", &SqlType::Integer),
        sqlite_column!("item_track_number", &SqlType::Integer),
        sqlite_column!("item_uri", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_my_activity_item_uri", "item_uri")],
    unique_constraints: &[&["timestamp"]],
};

/// Audio features per track, populated by the backfill job.
const AUDIO_ANALYSIS_TABLE: Table = Table {
    name: "AudioAnalysis",
    columns: &[
        sqlite_column!("danceability", &SqlType::Real),
        sqlite_column!("energy", &SqlType::Real),
        sqlite_column!("track_key", &SqlType::Integer),
        sqlite_column!("loudness", &SqlType::Real),
        sqlite_column!("mode", &SqlType::Integer),
        sqlite_column!("speechiness", &SqlType::Real),
        sqlite_column!("acousticness", &SqlType::Real),
        sqlite_column!("instrumentalness", &SqlType::Real),
        sqlite_column!("liveness", &SqlType::Real),
        sqlite_column!("valence", &SqlType::Real),
        sqlite_column!("tempo", &SqlType::Real),
        sqlite_column!("type", &SqlType::Text),
        sqlite_column!("uri", &SqlType::Text, is_primary_key = true),
        sqlite_column!("duration_ms", &SqlType::Integer),
        sqlite_column!("time_signature", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const JOURNAL_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ACTIVITY_TABLE, MY_ACTIVITY_TABLE, AUDIO_ANALYSIS_TABLE],
    migration: None,
}];
