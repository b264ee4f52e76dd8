//! SQLite-backed journal store implementation.

use super::models::{ActivityRecord, AudioFeaturesRecord, JournalStats, MyActivityRecord};
use super::schema::JOURNAL_VERSIONED_SCHEMAS;
use super::trait_def::JournalStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// SQLite-backed journal store.
#[derive(Clone)]
pub struct SqliteJournalStore {
    read_conn: Arc<Mutex<Connection>>,
    write_conn: Arc<Mutex<Connection>>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = JOURNAL_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &JOURNAL_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating journal db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let mut current_version = if db_version < BASE_DB_VERSION as i64 {
        0
    } else {
        (db_version - BASE_DB_VERSION as i64) as usize
    };

    if current_version >= latest_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in JOURNAL_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating journal db from version {} to {}",
                current_version, schema.version
            );
            migration_fn(&tx)?;
            current_version = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;
    Ok(())
}

impl SqliteJournalStore {
    /// Open (creating if needed) and validate the journal database.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open journal database")?;

        migrate_if_needed(&mut write_conn)?;

        let latest_schema = &JOURNAL_VERSIONED_SCHEMAS[JOURNAL_VERSIONED_SCHEMAS.len() - 1];
        latest_schema
            .validate(&write_conn)
            .context("Journal database failed schema validation")?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on journal write connection")?;

        let read_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open journal database for reading")?;

        read_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on journal read connection")?;

        let stats = Self::count_rows(&read_conn)?;
        info!(
            "Journal store ready: {} activity rows, {} playback rows, {} tracks analyzed",
            stats.activity_rows, stats.my_activity_rows, stats.audio_analysis_rows
        );

        Ok(Self {
            read_conn: Arc::new(Mutex::new(read_conn)),
            write_conn: Arc::new(Mutex::new(write_conn)),
        })
    }

    fn count_rows(conn: &Connection) -> Result<JournalStats> {
        let activity_rows: usize =
            conn.query_row("SELECT COUNT(*) FROM Activity", [], |r| r.get(0))?;
        let my_activity_rows: usize =
            conn.query_row("SELECT COUNT(*) FROM MyActivity", [], |r| r.get(0))?;
        let audio_analysis_rows: usize =
            conn.query_row("SELECT COUNT(*) FROM AudioAnalysis", [], |r| r.get(0))?;
        Ok(JournalStats {
            activity_rows,
            my_activity_rows,
            audio_analysis_rows,
        })
    }
}

impl JournalStore for SqliteJournalStore {
    fn insert_activity(&self, record: &ActivityRecord) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO Activity
             (timestamp, user_uri, user_name, track_uri, track_name, track_imageUrl,
              track_album_uri, track_album_name, track_artist_uri, track_artist_name,
              track_context_name, track_context_index)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        stmt.execute(params![
            record.timestamp,
            record.user_uri,
            record.user_name,
            record.track_uri,
            record.track_name,
            record.track_image_url,
            record.track_album_uri,
            record.track_album_name,
            record.track_artist_uri,
            record.track_artist_name,
            record.track_context_name,
            record.track_context_index,
        ])?;
        Ok(())
    }

    fn insert_my_activity(&self, record: &MyActivityRecord) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO MyActivity
             (shuffle_state, repeat_state, timestamp, progress_ms, currently_playing_type,
              is_playing, device_id, device_is_active, device_is_private_session,
              device_is_restricted, device_name, device_type, device_volume_percent,
              context_type, context_uri, item_album_name, item_album_uri, item_artists_name,
              item_artists_uri, item_duration_ms, item_explicit, item_is_local, item_name,
              item_popularity, item_track_number, item_uri)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)",
        )?;
        stmt.execute(params![
            record.shuffle_state,
            record.repeat_state,
            record.timestamp,
            record.progress_ms,
            record.currently_playing_type,
            record.is_playing,
            record.device_id,
            record.device_is_active,
            record.device_is_private_session,
            record.device_is_restricted,
            record.device_name,
            record.device_type,
            record.device_volume_percent,
            record.context_type,
            record.context_uri,
            record.item_album_name,
            record.item_album_uri,
            record.item_artists_name,
            record.item_artists_uri,
            record.item_duration_ms,
            record.item_explicit,
            record.item_is_local,
            record.item_name,
            record.item_popularity,
            record.item_track_number,
            record.item_uri,
        ])?;
        Ok(())
    }

    fn insert_audio_features(&self, record: &AudioFeaturesRecord) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO AudioAnalysis
             (danceability, energy, track_key, loudness, mode, speechiness, acousticness,
              instrumentalness, liveness, valence, tempo, type, uri, duration_ms,
              time_signature)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )?;
        stmt.execute(params![
            record.danceability,
            record.energy,
            record.track_key,
            record.loudness,
            record.mode,
            record.speechiness,
            record.acousticness,
            record.instrumentalness,
            record.liveness,
            record.valence,
            record.tempo,
            record.feature_type,
            record.uri,
            record.duration_ms,
            record.time_signature,
        ])?;
        Ok(())
    }

    fn get_unenriched_track_uris(&self) -> Result<Vec<String>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT DISTINCT track_uri FROM (
                 SELECT DISTINCT track_uri FROM Activity
                 UNION
                 SELECT DISTINCT item_uri FROM MyActivity
             )
             WHERE track_uri NOT IN (SELECT uri FROM AudioAnalysis)
             ORDER BY track_uri",
        )?;
        let uris = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, rusqlite::Error>>()?;
        Ok(uris)
    }

    fn get_journal_stats(&self) -> Result<JournalStats> {
        let conn = self.read_conn.lock().unwrap();
        Self::count_rows(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteJournalStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("journal.db");
        let store = SqliteJournalStore::new(&db_path).unwrap();
        (store, tmp)
    }

    fn make_activity(user_uri: &str, track_uri: &str, timestamp: i64) -> ActivityRecord {
        ActivityRecord {
            timestamp,
            user_uri: user_uri.to_string(),
            user_name: Some("Friend".to_string()),
            track_uri: track_uri.to_string(),
            track_name: Some("Song".to_string()),
            track_image_url: None,
            track_album_uri: Some("spotify:album:al".to_string()),
            track_album_name: Some("Album".to_string()),
            track_artist_uri: Some("spotify:artist:ar".to_string()),
            track_artist_name: Some("Artist".to_string()),
            track_context_name: Some("Playlist".to_string()),
            track_context_index: Some(0),
        }
    }

    fn make_my_activity(item_uri: &str, timestamp: i64) -> MyActivityRecord {
        MyActivityRecord {
            shuffle_state: Some(false),
            repeat_state: Some("off".to_string()),
            timestamp,
            progress_ms: Some(1000),
            currently_playing_type: Some("track".to_string()),
            is_playing: Some(true),
            device_id: Some("dev".to_string()),
            device_is_active: Some(true),
            device_is_private_session: Some(false),
            device_is_restricted: Some(false),
            device_name: Some("Phone".to_string()),
            device_type: Some("Smartphone".to_string()),
            device_volume_percent: Some(70),
            context_type: Some("playlist".to_string()),
            context_uri: Some("spotify:playlist:p".to_string()),
            item_album_name: Some("Album".to_string()),
            item_album_uri: Some("spotify:album:al".to_string()),
            item_artists_name: Some("Artist".to_string()),
            item_artists_uri: Some("spotify:artist:ar".to_string()),
            item_duration_ms: Some(180000),
            item_explicit: Some(false),
            item_is_local: Some(false),
            item_name: Some("Song".to_string()),
            item_popularity: Some(50),
            item_track_number: Some(1),
            item_uri: item_uri.to_string(),
        }
    }

    fn make_audio_features(uri: &str) -> AudioFeaturesRecord {
        AudioFeaturesRecord {
            danceability: Some(0.5),
            energy: Some(0.8),
            track_key: Some(4),
            loudness: Some(-6.1),
            mode: Some(1),
            speechiness: Some(0.04),
            acousticness: Some(0.2),
            instrumentalness: Some(0.0),
            liveness: Some(0.1),
            valence: Some(0.7),
            tempo: Some(120.0),
            feature_type: Some("audio_features".to_string()),
            uri: uri.to_string(),
            duration_ms: Some(200000),
            time_signature: Some(4),
        }
    }

    #[test]
    fn test_insert_and_count() {
        let (store, _tmp) = create_test_store();

        store
            .insert_activity(&make_activity("spotify:user:a", "spotify:track:x", 1))
            .unwrap();
        store
            .insert_my_activity(&make_my_activity("spotify:track:y", 2))
            .unwrap();
        store
            .insert_audio_features(&make_audio_features("spotify:track:x"))
            .unwrap();

        let stats = store.get_journal_stats().unwrap();
        assert_eq!(stats.activity_rows, 1);
        assert_eq!(stats.my_activity_rows, 1);
        assert_eq!(stats.audio_analysis_rows, 1);
    }

    #[test]
    fn test_duplicate_activity_violates_unique_constraint() {
        let (store, _tmp) = create_test_store();

        let record = make_activity("spotify:user:a", "spotify:track:x", 1);
        store.insert_activity(&record).unwrap();
        assert!(store.insert_activity(&record).is_err());

        // Same user at a different instant is fine.
        store
            .insert_activity(&make_activity("spotify:user:a", "spotify:track:y", 2))
            .unwrap();
        assert_eq!(store.get_journal_stats().unwrap().activity_rows, 2);
    }

    #[test]
    fn test_duplicate_my_activity_timestamp_is_rejected() {
        let (store, _tmp) = create_test_store();

        store
            .insert_my_activity(&make_my_activity("spotify:track:x", 5))
            .unwrap();
        assert!(store
            .insert_my_activity(&make_my_activity("spotify:track:y", 5))
            .is_err());
    }

    #[test]
    fn test_duplicate_audio_features_uri_is_rejected() {
        let (store, _tmp) = create_test_store();

        store
            .insert_audio_features(&make_audio_features("spotify:track:x"))
            .unwrap();
        assert!(store
            .insert_audio_features(&make_audio_features("spotify:track:x"))
            .is_err());
    }

    #[test]
    fn test_unenriched_uris_is_the_set_difference() {
        let (store, _tmp) = create_test_store();

        store
            .insert_activity(&make_activity("spotify:user:a", "spotify:track:x", 1))
            .unwrap();
        store
            .insert_activity(&make_activity("spotify:user:b", "spotify:track:y", 2))
            .unwrap();
        // Same track seen again from another user, must not duplicate.
        store
            .insert_activity(&make_activity("spotify:user:c", "spotify:track:x", 3))
            .unwrap();
        store
            .insert_my_activity(&make_my_activity("spotify:track:z", 4))
            .unwrap();
        // One of them is already analyzed.
        store
            .insert_audio_features(&make_audio_features("spotify:track:y"))
            .unwrap();

        let unenriched = store.get_unenriched_track_uris().unwrap();
        assert_eq!(
            unenriched,
            vec!["spotify:track:x".to_string(), "spotify:track:z".to_string()]
        );
    }

    #[test]
    fn test_unenriched_uris_empty_after_full_backfill() {
        let (store, _tmp) = create_test_store();

        store
            .insert_activity(&make_activity("spotify:user:a", "spotify:track:x", 1))
            .unwrap();
        store
            .insert_my_activity(&make_my_activity("spotify:track:z", 2))
            .unwrap();

        for uri in store.get_unenriched_track_uris().unwrap() {
            store.insert_audio_features(&make_audio_features(&uri)).unwrap();
        }

        assert!(store.get_unenriched_track_uris().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_existing_database_keeps_data() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("journal.db");

        {
            let store = SqliteJournalStore::new(&db_path).unwrap();
            store
                .insert_activity(&make_activity("spotify:user:a", "spotify:track:x", 1))
                .unwrap();
        }

        let store = SqliteJournalStore::new(&db_path).unwrap();
        assert_eq!(store.get_journal_stats().unwrap().activity_rows, 1);
    }

    #[test]
    fn test_nullable_columns_accept_none() {
        let (store, _tmp) = create_test_store();

        let mut record = make_activity("spotify:user:a", "spotify:track:x", 1);
        record.user_name = None;
        record.track_album_uri = None;
        record.track_context_index = None;
        store.insert_activity(&record).unwrap();

        let mut playback = make_my_activity("spotify:track:y", 2);
        playback.device_id = None;
        playback.context_uri = None;
        playback.is_playing = None;
        store.insert_my_activity(&playback).unwrap();

        let stats = store.get_journal_stats().unwrap();
        assert_eq!(stats.activity_rows, 1);
        assert_eq!(stats.my_activity_rows, 1);
    }
}
