mod json_store;

pub use json_store::JsonSnapshotStore;

use crate::spotify::{BuddylistResponse, PlaybackResponse};

/// The two snapshot documents the service keeps between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Presence,
    Playback,
}

impl SnapshotKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::Presence => "presence.json",
            SnapshotKind::Playback => "playback.json",
        }
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotKind::Presence => write!(f, "presence"),
            SnapshotKind::Playback => write!(f, "playback"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The persisted bytes exist but do not parse as the expected document.
    /// Never treated as "absent"; a corrupt baseline fails the run loudly.
    #[error("Snapshot '{kind}' is corrupt: {reason}")]
    Corrupt { kind: SnapshotKind, reason: String },

    #[error("Failed to serialize snapshot '{kind}': {reason}")]
    Encode { kind: SnapshotKind, reason: String },

    #[error("I/O error on snapshot '{kind}': {source}")]
    Io {
        kind: SnapshotKind,
        #[source]
        source: std::io::Error,
    },
}

/// Holds the single most recent observation of each feed between runs.
///
/// Loading a snapshot that was never saved yields `None`, which is the
/// first-run signal for the diff stage.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait SnapshotStore: Send + Sync {
    fn load_presence(&self) -> Result<Option<BuddylistResponse>, SnapshotError>;

    /// Whole-document replace of the presence baseline.
    fn save_presence(&self, snapshot: &BuddylistResponse) -> Result<(), SnapshotError>;

    fn load_playback(&self) -> Result<Option<PlaybackResponse>, SnapshotError>;

    /// Whole-document replace of the playback baseline.
    fn save_playback(&self, snapshot: &PlaybackResponse) -> Result<(), SnapshotError>;
}
