mod models;
mod schema;
mod store;
mod trait_def;
mod writer;

pub use models::{ActivityRecord, AudioFeaturesRecord, JournalStats, MyActivityRecord};
pub use store::SqliteJournalStore;
pub use trait_def::JournalStore;
pub use writer::{write_all, WriteOutcome};
