use serde::{Deserialize, Serialize};

/// Short-lived bearer token for the web API.
///
/// The raw value is deliberately hidden from `Debug` output so it cannot
/// end up in logs.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(****)")
    }
}

/// Body of the token endpoint response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Friend activity feed as returned by the presence endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuddylistResponse {
    #[serde(default)]
    pub friends: Vec<FriendEntry>,
}

/// One friend's most recent listening state.
///
/// `user` and `track` are optional because the feed occasionally carries
/// partial entries; those are skipped downstream rather than failing the
/// whole fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendEntry {
    pub timestamp: i64,
    pub user: Option<FriendUser>,
    pub track: Option<FriendTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendUser {
    pub uri: String,
    pub name: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendTrack {
    pub uri: String,
    pub name: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub album: Option<TrackAlbum>,
    pub artist: Option<TrackArtist>,
    pub context: Option<TrackContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAlbum {
    pub uri: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackArtist {
    pub uri: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackContext {
    pub name: Option<String>,
    pub index: Option<i64>,
}

/// Current playback state as returned by the player endpoint.
///
/// List-valued fields of the raw payload (album artists, available markets,
/// album images) have no relational column and are not modeled at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackResponse {
    pub timestamp: i64,
    pub progress_ms: Option<i64>,
    pub shuffle_state: Option<bool>,
    pub repeat_state: Option<String>,
    pub currently_playing_type: Option<String>,
    pub is_playing: Option<bool>,
    pub device: Option<PlaybackDevice>,
    pub context: Option<PlaybackContext>,
    pub item: Option<PlaybackItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackDevice {
    pub id: Option<String>,
    pub is_active: Option<bool>,
    pub is_private_session: Option<bool>,
    pub is_restricted: Option<bool>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub volume_percent: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackContext {
    #[serde(rename = "type")]
    pub context_type: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackItem {
    pub uri: Option<String>,
    pub name: Option<String>,
    pub album: Option<PlaybackAlbum>,
    #[serde(default)]
    pub artists: Vec<PlaybackArtist>,
    pub duration_ms: Option<i64>,
    pub explicit: Option<bool>,
    pub is_local: Option<bool>,
    pub popularity: Option<i64>,
    pub track_number: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackAlbum {
    pub uri: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackArtist {
    pub uri: Option<String>,
    pub name: Option<String>,
}

/// Body of the audio-features endpoint response. Entries are `null` for
/// ids the service does not know.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesResponse {
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub key: Option<i64>,
    pub loudness: Option<f64>,
    pub mode: Option<i64>,
    pub speechiness: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    #[serde(rename = "type")]
    pub feature_type: Option<String>,
    pub uri: String,
    pub duration_ms: Option<i64>,
    pub time_signature: Option<i64>,
}
