use crate::app_dirs::AppDirs;
use crate::error::PersistenceError;
use crate::ledger::{decode_record, HighScoreKey, HighScoreRecord, ScoreStore};
use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS high_scores (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

/// SQLite-backed high score storage
#[derive(Debug)]
pub struct ScoresDb {
    conn: Connection,
}

impl ScoresDb {
    /// Open the database at the default state location
    pub fn new() -> Result<Self, PersistenceError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("mathdash_scores.db"));
        Self::open(db_path)
    }

    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute(SCHEMA, [])?;
        Ok(ScoresDb { conn })
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(SCHEMA, [])?;
        Ok(ScoresDb { conn })
    }

    /// Number of stored slots
    pub fn len(&self) -> Result<usize, PersistenceError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM high_scores", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, PersistenceError> {
        Ok(self.len()? == 0)
    }

    #[cfg(test)]
    fn put_raw(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO high_scores (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl ScoreStore for ScoresDb {
    fn read(&self, key: &HighScoreKey) -> Result<Option<HighScoreRecord>, PersistenceError> {
        let storage_key = key.storage_key();
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM high_scores WHERE key = ?1",
                [&storage_key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw.and_then(|value| decode_record(&storage_key, &value)))
    }

    fn write(
        &mut self,
        key: &HighScoreKey,
        record: &HighScoreRecord,
    ) -> Result<(), PersistenceError> {
        let value = serde_json::to_string(record)?;
        self.conn.execute(
            r#"
            INSERT INTO high_scores (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key.storage_key(), value, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
