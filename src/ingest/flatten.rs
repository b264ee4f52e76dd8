use crate::journal_store::{ActivityRecord, MyActivityRecord};
use crate::spotify::{FriendEntry, PlaybackResponse};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlattenError {
    /// A required nested path is missing. The caller skips the one entry
    /// and continues the batch.
    #[error("Malformed entry: missing '{0}'")]
    MalformedEntry(&'static str),
}

/// Project a nested presence entry onto the flat `Activity` columns.
/// Nested paths join with an underscore: `track.album.uri` becomes
/// `track_album_uri`.
pub fn flatten_friend(entry: &FriendEntry) -> Result<ActivityRecord, FlattenError> {
    let user = entry
        .user
        .as_ref()
        .ok_or(FlattenError::MalformedEntry("user"))?;
    let track = entry
        .track
        .as_ref()
        .ok_or(FlattenError::MalformedEntry("track"))?;

    Ok(ActivityRecord {
        timestamp: entry.timestamp,
        user_uri: user.uri.clone(),
        user_name: user.name.clone(),
        track_uri: track.uri.clone(),
        track_name: track.name.clone(),
        track_image_url: track.image_url.clone(),
        track_album_uri: track.album.as_ref().and_then(|album| album.uri.clone()),
        track_album_name: track.album.as_ref().and_then(|album| album.name.clone()),
        track_artist_uri: track.artist.as_ref().and_then(|artist| artist.uri.clone()),
        track_artist_name: track.artist.as_ref().and_then(|artist| artist.name.clone()),
        track_context_name: track.context.as_ref().and_then(|ctx| ctx.name.clone()),
        track_context_index: track.context.as_ref().and_then(|ctx| ctx.index),
    })
}

/// Project a playback entry onto the flat `MyActivity` columns.
///
/// The first artist stands in for the track; the schema has no column for
/// the full list, nor for the other list-valued payload fields (album
/// artists, markets, images), which are simply never modeled.
pub fn flatten_playback(playback: &PlaybackResponse) -> Result<MyActivityRecord, FlattenError> {
    let item = playback
        .item
        .as_ref()
        .ok_or(FlattenError::MalformedEntry("item"))?;
    let item_uri = item
        .uri
        .clone()
        .ok_or(FlattenError::MalformedEntry("item.uri"))?;

    let lead_artist = item.artists.first();
    let device = playback.device.as_ref();
    let context = playback.context.as_ref();

    Ok(MyActivityRecord {
        shuffle_state: playback.shuffle_state,
        repeat_state: playback.repeat_state.clone(),
        timestamp: playback.timestamp,
        progress_ms: playback.progress_ms,
        currently_playing_type: playback.currently_playing_type.clone(),
        is_playing: playback.is_playing,
        device_id: device.and_then(|d| d.id.clone()),
        device_is_active: device.and_then(|d| d.is_active),
        device_is_private_session: device.and_then(|d| d.is_private_session),
        device_is_restricted: device.and_then(|d| d.is_restricted),
        device_name: device.and_then(|d| d.name.clone()),
        device_type: device.and_then(|d| d.device_type.clone()),
        device_volume_percent: device.and_then(|d| d.volume_percent),
        context_type: context.and_then(|c| c.context_type.clone()),
        context_uri: context.and_then(|c| c.uri.clone()),
        item_album_name: item.album.as_ref().and_then(|album| album.name.clone()),
        item_album_uri: item.album.as_ref().and_then(|album| album.uri.clone()),
        item_artists_name: lead_artist.and_then(|artist| artist.name.clone()),
        item_artists_uri: lead_artist.and_then(|artist| artist.uri.clone()),
        item_duration_ms: item.duration_ms,
        item_explicit: item.explicit,
        item_is_local: item.is_local,
        item_name: item.name.clone(),
        item_popularity: item.popularity,
        item_track_number: item.track_number,
        item_uri,
    })
}
