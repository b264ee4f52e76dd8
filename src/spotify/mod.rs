mod client;
mod models;

#[cfg(feature = "mock")]
pub use client::MockSpotifyClient;
pub use client::{HttpSpotifyClient, SpotifyClient, SpotifyError};
pub use models::{
    AccessToken, AudioFeatures, AudioFeaturesResponse, BuddylistResponse, FriendEntry,
    FriendTrack, FriendUser, PlaybackAlbum, PlaybackArtist, PlaybackContext, PlaybackDevice,
    PlaybackItem, PlaybackResponse, TrackAlbum, TrackArtist, TrackContext,
};
