use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use super::{SnapshotError, SnapshotKind, SnapshotStore};
use crate::spotify::{BuddylistResponse, PlaybackResponse};

/// File-backed snapshot store, one JSON document per kind.
///
/// Saves go through a temp file in the same directory followed by a rename,
/// so a crash mid-write never leaves a half-written document behind.
pub struct JsonSnapshotStore {
    dir: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load_document<T: DeserializeOwned>(
        &self,
        kind: SnapshotKind,
    ) -> Result<Option<T>, SnapshotError> {
        let path = self.dir.join(kind.file_name());
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SnapshotError::Io { kind, source: e }),
        };
        let document = serde_json::from_slice(&bytes).map_err(|e| SnapshotError::Corrupt {
            kind,
            reason: e.to_string(),
        })?;
        Ok(Some(document))
    }

    fn save_document<T: Serialize>(
        &self,
        kind: SnapshotKind,
        snapshot: &T,
    ) -> Result<(), SnapshotError> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(|e| SnapshotError::Encode {
            kind,
            reason: e.to_string(),
        })?;

        let path = self.dir.join(kind.file_name());
        let tmp_path = self.dir.join(format!("{}.tmp", kind.file_name()));
        std::fs::write(&tmp_path, &bytes).map_err(|e| SnapshotError::Io { kind, source: e })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| SnapshotError::Io { kind, source: e })?;
        Ok(())
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load_presence(&self) -> Result<Option<BuddylistResponse>, SnapshotError> {
        self.load_document(SnapshotKind::Presence)
    }

    fn save_presence(&self, snapshot: &BuddylistResponse) -> Result<(), SnapshotError> {
        self.save_document(SnapshotKind::Presence, snapshot)
    }

    fn load_playback(&self) -> Result<Option<PlaybackResponse>, SnapshotError> {
        self.load_document(SnapshotKind::Playback)
    }

    fn save_playback(&self, snapshot: &PlaybackResponse) -> Result<(), SnapshotError> {
        self.save_document(SnapshotKind::Playback, snapshot)
    }
}
