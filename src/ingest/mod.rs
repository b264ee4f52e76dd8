mod diff;
mod flatten;

pub use diff::{diff_playback, diff_presence, FirstRunPolicy};
pub use flatten::{flatten_friend, flatten_playback, FlattenError};
