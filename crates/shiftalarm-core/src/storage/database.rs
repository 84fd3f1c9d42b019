//! SQLite-based storage for shift patterns and alarms.
//!
//! Provides persistent storage for:
//! - Shift patterns
//! - Shift alarms (each bound to a pattern id) and basic alarms
//! - Key-value store for application state such as the active pattern
//!
//! Rows hold the flat JSON record from [`super::record`] next to a few
//! indexed columns used for lookups and ordering.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;

use super::record::{BasicAlarmRecord, PatternRecord, ShiftAlarmRecord};
use super::{data_dir, PatternRepository};
use crate::alarm::{BasicAlarm, ShiftAlarm};
use crate::error::{DatabaseError, Result, ValidationError};
use crate::shift::ShiftPattern;

const ACTIVE_PATTERN_KEY: &str = "active_pattern_id";

fn decode<T: DeserializeOwned>(table: &'static str, id: &str, json: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(json).map_err(|e| DatabaseError::CorruptRecord {
        table,
        id: id.to_string(),
        message: e.to_string(),
    })
}

fn invalid_record(table: &'static str, id: &str, err: ValidationError) -> DatabaseError {
    DatabaseError::CorruptRecord {
        table,
        id: id.to_string(),
        message: err.to_string(),
    }
}

fn encode<T: serde::Serialize>(record: &T) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

/// SQLite database for patterns and alarms.
pub struct AlarmDb {
    conn: Connection,
}

impl AlarmDb {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Default database location inside the data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable.
    pub fn default_path() -> Result<PathBuf> {
        Ok(data_dir()?.join("shiftalarm.db"))
    }

    /// Open the database at `<data_dir>/shiftalarm.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&Self::default_path()?)
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        tracing::debug!(path = %path.display(), "opened alarm database");
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS patterns (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                record      TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS shift_alarms (
                id          TEXT PRIMARY KEY,
                pattern_id  TEXT NOT NULL,
                record      TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS basic_alarms (
                id          TEXT PRIMARY KEY,
                record      TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_shift_alarms_pattern_id ON shift_alarms(pattern_id);",
        )?;
        Ok(())
    }

    // === Patterns ===

    /// Insert or replace a pattern by id.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn save_pattern(&self, pattern: &ShiftPattern) -> Result<()> {
        let record = PatternRecord::from(pattern);
        self.conn.execute(
            "INSERT OR REPLACE INTO patterns (id, name, record, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, record.name, encode(&record)?, record.created_at],
        )?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if the query fails or the stored row cannot be decoded.
    pub fn get_pattern(&self, id: &str) -> Result<Option<ShiftPattern>> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT record FROM patterns WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        json.map(|json| Self::pattern_from_json(id, &json)).transpose()
    }

    /// All patterns, oldest first. Rows that fail to decode are skipped.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_patterns(&self) -> Result<Vec<ShiftPattern>> {
        self.list_rows("SELECT id, record FROM patterns ORDER BY created_at, id", |id, json| {
            Self::pattern_from_json(id, json)
        })
    }

    /// Delete a pattern together with every shift alarm bound to it.
    ///
    /// Returns `None` if no such pattern exists, otherwise the number of
    /// alarms removed with it. Clears the active pattern when it pointed here.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub fn delete_pattern(&self, id: &str) -> Result<Option<usize>> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM patterns WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Ok(None);
        }
        let alarms = tx.execute("DELETE FROM shift_alarms WHERE pattern_id = ?1", params![id])?;
        tx.execute(
            "DELETE FROM kv WHERE key = ?1 AND value = ?2",
            params![ACTIVE_PATTERN_KEY, id],
        )?;
        tx.commit()?;
        tracing::info!(pattern_id = id, alarms, "deleted shift pattern");
        Ok(Some(alarms))
    }

    fn pattern_from_json(id: &str, json: &str) -> Result<ShiftPattern> {
        let record: PatternRecord = decode("patterns", id, json)?;
        Ok(record
            .into_pattern()
            .map_err(|e| invalid_record("patterns", id, e))?)
    }

    /// Id of the pattern the user is currently following, if any.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn active_pattern_id(&self) -> Result<Option<String>> {
        Ok(self.kv_get(ACTIVE_PATTERN_KEY)?)
    }

    /// # Errors
    /// Returns an error if the write fails.
    pub fn set_active_pattern_id(&self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => self.kv_set(ACTIVE_PATTERN_KEY, id)?,
            None => {
                self.conn
                    .execute("DELETE FROM kv WHERE key = ?1", params![ACTIVE_PATTERN_KEY])?;
            }
        }
        Ok(())
    }

    // === Shift alarms ===

    /// Insert or replace a shift alarm by id.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn save_shift_alarm(&self, alarm: &ShiftAlarm) -> Result<()> {
        let record = ShiftAlarmRecord::from(alarm);
        self.conn.execute(
            "INSERT OR REPLACE INTO shift_alarms (id, pattern_id, record, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, record.pattern_id, encode(&record)?, record.created_at],
        )?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if the query fails or the stored row cannot be decoded.
    pub fn get_shift_alarm(&self, id: &str) -> Result<Option<ShiftAlarm>> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT record FROM shift_alarms WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        json.map(|json| Self::shift_alarm_from_json(id, &json)).transpose()
    }

    /// All shift alarms, oldest first. Rows that fail to decode are skipped.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_shift_alarms(&self) -> Result<Vec<ShiftAlarm>> {
        self.list_rows(
            "SELECT id, record FROM shift_alarms ORDER BY created_at, id",
            Self::shift_alarm_from_json,
        )
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_shift_alarms_for_pattern(&self, pattern_id: &str) -> Result<Vec<ShiftAlarm>> {
        Ok(self
            .list_shift_alarms()?
            .into_iter()
            .filter(|a| a.pattern_id() == pattern_id)
            .collect())
    }

    /// Returns `false` if no alarm had this id.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_shift_alarm(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM shift_alarms WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn shift_alarm_from_json(id: &str, json: &str) -> Result<ShiftAlarm> {
        let record: ShiftAlarmRecord = decode("shift_alarms", id, json)?;
        Ok(record
            .into_alarm()
            .map_err(|e| invalid_record("shift_alarms", id, e))?)
    }

    // === Basic alarms ===

    /// Insert or replace a basic alarm by id.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn save_basic_alarm(&self, alarm: &BasicAlarm) -> Result<()> {
        let record = BasicAlarmRecord::from(alarm);
        self.conn.execute(
            "INSERT OR REPLACE INTO basic_alarms (id, record, created_at) VALUES (?1, ?2, ?3)",
            params![record.id, encode(&record)?, record.created_at],
        )?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if the query fails or the stored row cannot be decoded.
    pub fn get_basic_alarm(&self, id: &str) -> Result<Option<BasicAlarm>> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT record FROM basic_alarms WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        json.map(|json| Self::basic_alarm_from_json(id, &json)).transpose()
    }

    /// All basic alarms, oldest first. Rows that fail to decode are skipped.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_basic_alarms(&self) -> Result<Vec<BasicAlarm>> {
        self.list_rows(
            "SELECT id, record FROM basic_alarms ORDER BY created_at, id",
            Self::basic_alarm_from_json,
        )
    }

    /// Returns `false` if no alarm had this id.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_basic_alarm(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM basic_alarms WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn basic_alarm_from_json(id: &str, json: &str) -> Result<BasicAlarm> {
        let record: BasicAlarmRecord = decode("basic_alarms", id, json)?;
        Ok(record
            .into_alarm()
            .map_err(|e| invalid_record("basic_alarms", id, e))?)
    }

    fn list_rows<T>(&self, sql: &str, parse: impl Fn(&str, &str) -> Result<T>) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut items = Vec::new();
        for row in rows {
            let (id, json) = row?;
            match parse(&id, &json) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!(id = %id, error = %e, "skipping unreadable row"),
            }
        }
        Ok(items)
    }

    // === Key-value ===

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl PatternRepository for AlarmDb {
    fn get_pattern(&self, id: &str) -> Result<Option<ShiftPattern>> {
        AlarmDb::get_pattern(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AlarmSettings, AlarmTone};
    use crate::error::CoreError;
    use crate::shift::{parse_cycle, PatternUpdate, ShiftType};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn pattern(name: &str) -> ShiftPattern {
        ShiftPattern::new(
            name,
            parse_cycle("DDNNOO").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn shift_alarm(pattern_id: &str) -> ShiftAlarm {
        ShiftAlarm::new(
            pattern_id,
            BTreeSet::from([ShiftType::Day]),
            NaiveTime::from_hms_opt(5, 30, 0).unwrap(),
            "Day shift",
            None,
            AlarmSettings::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn pattern_crud() {
        let db = AlarmDb::open_memory().unwrap();
        let p = pattern("Crew A");
        db.save_pattern(&p).unwrap();
        assert_eq!(db.get_pattern(p.id()).unwrap(), Some(p.clone()));

        let renamed = p
            .update(
                PatternUpdate {
                    name: Some("Crew B".into()),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        db.save_pattern(&renamed).unwrap();
        let listed = db.list_patterns().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name(), "Crew B");

        assert!(db.get_pattern("missing").unwrap().is_none());
    }

    #[test]
    fn deleting_pattern_cascades_to_its_alarms() {
        let db = AlarmDb::open_memory().unwrap();
        let keep = pattern("Keep");
        let drop = pattern("Drop");
        db.save_pattern(&keep).unwrap();
        db.save_pattern(&drop).unwrap();
        db.save_shift_alarm(&shift_alarm(keep.id())).unwrap();
        db.save_shift_alarm(&shift_alarm(drop.id())).unwrap();
        db.save_shift_alarm(&shift_alarm(drop.id())).unwrap();
        db.set_active_pattern_id(Some(drop.id())).unwrap();

        assert_eq!(db.delete_pattern(drop.id()).unwrap(), Some(2));
        assert_eq!(db.list_shift_alarms().unwrap().len(), 1);
        assert_eq!(db.list_shift_alarms_for_pattern(keep.id()).unwrap().len(), 1);
        assert!(db.active_pattern_id().unwrap().is_none());
        assert_eq!(db.delete_pattern(drop.id()).unwrap(), None);
    }

    #[test]
    fn alarms_round_trip() {
        let db = AlarmDb::open_memory().unwrap();
        let sa = shift_alarm("p1");
        db.save_shift_alarm(&sa).unwrap();
        assert_eq!(db.get_shift_alarm(sa.id()).unwrap(), Some(sa.clone()));

        let ba = BasicAlarm::new(
            "Gym",
            NaiveTime::from_hms_opt(7, 15, 0).unwrap(),
            BTreeSet::from([1, 3, 5]),
            AlarmTone::Digital,
            0.5,
            Utc::now(),
        )
        .unwrap();
        db.save_basic_alarm(&ba).unwrap();
        assert_eq!(db.list_basic_alarms().unwrap(), vec![ba.clone()]);

        assert!(db.delete_basic_alarm(ba.id()).unwrap());
        assert!(!db.delete_basic_alarm(ba.id()).unwrap());
        assert!(db.delete_shift_alarm(sa.id()).unwrap());
    }

    #[test]
    fn corrupt_rows_are_skipped_in_lists_but_reported_by_id() {
        let db = AlarmDb::open_memory().unwrap();
        db.save_pattern(&pattern("Good")).unwrap();
        db.conn()
            .execute(
                "INSERT INTO patterns (id, name, record, created_at) VALUES ('bad', 'Bad', '{\"cycle\":[]}', 0)",
                [],
            )
            .unwrap();
        assert_eq!(db.list_patterns().unwrap().len(), 1);
        assert!(matches!(
            db.get_pattern("bad"),
            Err(CoreError::Database(DatabaseError::CorruptRecord { table: "patterns", .. }))
        ));
    }

    #[test]
    fn kv_store() {
        let db = AlarmDb::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn serves_as_pattern_repository() {
        let db = AlarmDb::open_memory().unwrap();
        let p = pattern("Repo");
        db.save_pattern(&p).unwrap();
        let repo: &dyn PatternRepository = &db;
        assert_eq!(repo.get_pattern(p.id()).unwrap(), Some(p));
        assert_eq!(repo.get_pattern("gone").unwrap(), None);
    }
}
