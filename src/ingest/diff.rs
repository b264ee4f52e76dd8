use serde::Deserialize;

use crate::spotify::{BuddylistResponse, FriendEntry, PlaybackResponse};

/// What the diff stage reports when no prior baseline exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirstRunPolicy {
    /// Report nothing, only establish the baseline. Avoids flooding the
    /// journal with one row per friend the first time the service starts.
    #[default]
    SeedOnly,
    /// Treat every entry of the first observed feed as a change.
    IngestAll,
}

impl std::str::FromStr for FirstRunPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seed-only" => Ok(FirstRunPolicy::SeedOnly),
            "ingest-all" => Ok(FirstRunPolicy::IngestAll),
            other => Err(format!(
                "Unknown first-run policy '{}', expected 'seed-only' or 'ingest-all'",
                other
            )),
        }
    }
}

/// Entries of `current` judged to represent a real listening change since
/// `previous`. Output order follows `current`.
///
/// A matched entry counts as a change only when its timestamp AND its track
/// uri both differ from the baseline. A new timestamp on the same track is
/// playback jitter (pause, resume, replay) and is not reported.
pub fn diff_presence(
    previous: Option<&BuddylistResponse>,
    current: &BuddylistResponse,
    first_run: FirstRunPolicy,
) -> Vec<FriendEntry> {
    let Some(previous) = previous else {
        return match first_run {
            FirstRunPolicy::SeedOnly => Vec::new(),
            FirstRunPolicy::IngestAll => current.friends.clone(),
        };
    };

    current
        .friends
        .iter()
        .filter(|entry| is_presence_change(entry, previous))
        .cloned()
        .collect()
}

fn is_presence_change(entry: &FriendEntry, previous: &BuddylistResponse) -> bool {
    let (Some(user), Some(track)) = (&entry.user, &entry.track) else {
        return false;
    };

    // Only transitions of already tracked users are reported; an entry with
    // no prior counterpart seeds the baseline on save and nothing else.
    let cached = previous.friends.iter().find(|prior| {
        prior
            .user
            .as_ref()
            .map(|prior_user| prior_user.uri == user.uri)
            .unwrap_or(false)
    });
    let Some(cached) = cached else {
        return false;
    };
    let Some(cached_track) = &cached.track else {
        return false;
    };

    entry.timestamp != cached.timestamp && track.uri != cached_track.uri
}

/// Whether the current playback represents a change against the baseline,
/// under the same both-must-differ rule as the presence diff.
pub fn diff_playback(
    previous: Option<&PlaybackResponse>,
    current: &PlaybackResponse,
    first_run: FirstRunPolicy,
) -> bool {
    let Some(previous) = previous else {
        return matches!(first_run, FirstRunPolicy::IngestAll);
    };

    let current_uri = current.item.as_ref().and_then(|item| item.uri.as_deref());
    let previous_uri = previous.item.as_ref().and_then(|item| item.uri.as_deref());
    match (current_uri, previous_uri) {
        (Some(current_uri), Some(previous_uri)) => {
            current_uri != previous_uri && current.timestamp != previous.timestamp
        }
        _ => false,
    }
}
