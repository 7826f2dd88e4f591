use crate::error::PersistenceError;
use crate::problem::Operation;
use crate::session::{SessionConfig, SessionResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Identifies one leaderboard slot: an operation at a given time limit and
/// question count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighScoreKey {
    pub operation: Operation,
    pub time_limit_secs: u32,
    pub total_questions: u32,
}

impl HighScoreKey {
    pub fn new(operation: Operation, time_limit_secs: u32, total_questions: u32) -> Self {
        Self {
            operation,
            time_limit_secs,
            total_questions,
        }
    }

    /// String form used by persistent stores, e.g. `HS_Add_60s_5q`
    pub fn storage_key(&self) -> String {
        format!(
            "HS_{}_{}s_{}q",
            self.operation, self.time_limit_secs, self.total_questions
        )
    }
}

impl From<SessionConfig> for HighScoreKey {
    fn from(config: SessionConfig) -> Self {
        Self::new(
            config.operation,
            config.time_limit_secs,
            config.total_questions,
        )
    }
}

impl fmt::Display for HighScoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Best results seen for one key
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScoreRecord {
    /// Quickest fully solved attempt, if there has been one
    pub fastest_time_secs: Option<f64>,
    /// Most problems solved in any attempt, passed or not
    pub most_solved: u32,
}

impl HighScoreRecord {
    /// Fold one result into the record. Order of folding does not matter.
    pub fn merged_with(&self, result: &SessionResult) -> Self {
        let fastest_time_secs = if result.passed {
            Some(
                self.fastest_time_secs
                    .map_or(result.elapsed_secs, |t| t.min(result.elapsed_secs)),
            )
        } else {
            self.fastest_time_secs
        };

        Self {
            fastest_time_secs,
            most_solved: self.most_solved.max(result.solved_count),
        }
    }

    /// The better of two records for the same key, field by field.
    pub fn combined(&self, other: &Self) -> Self {
        let fastest_time_secs = match (self.fastest_time_secs, other.fastest_time_secs) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        Self {
            fastest_time_secs,
            most_solved: self.most_solved.max(other.most_solved),
        }
    }
}

/// Durable key/value backing for the ledger
pub trait ScoreStore {
    /// `Ok(None)` when the key was never written (or its value is unreadable).
    fn read(&self, key: &HighScoreKey) -> Result<Option<HighScoreRecord>, PersistenceError>;
    /// Replace the whole record stored under `key`.
    fn write(&mut self, key: &HighScoreKey, record: &HighScoreRecord)
        -> Result<(), PersistenceError>;
}

impl<S: ScoreStore + ?Sized> ScoreStore for Box<S> {
    fn read(&self, key: &HighScoreKey) -> Result<Option<HighScoreRecord>, PersistenceError> {
        (**self).read(key)
    }

    fn write(
        &mut self,
        key: &HighScoreKey,
        record: &HighScoreRecord,
    ) -> Result<(), PersistenceError> {
        (**self).write(key, record)
    }
}

/// Non-durable store, used when no database can be opened and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<HighScoreKey, HighScoreRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn read(&self, key: &HighScoreKey) -> Result<Option<HighScoreRecord>, PersistenceError> {
        Ok(self.records.get(key).copied())
    }

    fn write(
        &mut self,
        key: &HighScoreKey,
        record: &HighScoreRecord,
    ) -> Result<(), PersistenceError> {
        self.records.insert(*key, *record);
        Ok(())
    }
}

/// Decode a stored value, treating anything unreadable as absent.
pub(crate) fn decode_record(key: &str, raw: &str) -> Option<HighScoreRecord> {
    match serde_json::from_str::<HighScoreRecord>(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("ignoring unreadable high score for {key}: {e}");
            None
        }
    }
}

/// Per-configuration best records.
///
/// Every merged record is kept in process as well as written to the store,
/// so a failing store only costs durability.
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
    overlay: HashMap<HighScoreKey, HighScoreRecord>,
    recorded: HashSet<u64>,
}

impl<S: ScoreStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            overlay: HashMap::new(),
            recorded: HashSet::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current best record for `key`; the zero record if nothing is known.
    pub fn read(&self, key: &HighScoreKey) -> HighScoreRecord {
        self.load(key).unwrap_or_else(|e| {
            warn!("could not read high score {key}: {e}");
            self.in_memory(key)
        })
    }

    fn in_memory(&self, key: &HighScoreKey) -> HighScoreRecord {
        self.overlay.get(key).copied().unwrap_or_default()
    }

    /// Stored record folded with what this process has seen. The overlay may
    /// hold records the store never received, but never replaces a better
    /// stored one.
    fn load(&self, key: &HighScoreKey) -> Result<HighScoreRecord, PersistenceError> {
        let stored = self.store.read(key)?.unwrap_or_default();
        Ok(stored.combined(&self.in_memory(key)))
    }

    /// Merge a finished attempt into its slot and persist the outcome.
    ///
    /// Returns the merged record. On a store failure the merge is still
    /// visible through `read` for the rest of the process. Recording the same
    /// attempt twice is a caller bug and panics.
    pub fn record_result(
        &mut self,
        result: &SessionResult,
    ) -> Result<HighScoreRecord, PersistenceError> {
        assert!(
            self.recorded.insert(result.attempt_id),
            "session result {} was already recorded",
            result.attempt_id
        );

        let key = HighScoreKey::from(result.config);
        let (current, read_error) = match self.load(&key) {
            Ok(record) => (record, None),
            Err(e) => (self.in_memory(&key), Some(e)),
        };
        let merged = current.merged_with(result);
        self.overlay.insert(key, merged);

        // An unreadable slot is not overwritten: the stored record may be better.
        // The next successful read folds this record into it.
        if let Some(e) = read_error {
            warn!("high score {key} kept in memory only, read failed: {e}");
            return Err(e);
        }
        if let Err(e) = self.store.write(&key, &merged) {
            warn!("high score {key} kept in memory only, write failed: {e}");
            return Err(e);
        }

        debug!(
            "recorded attempt {} under {key}: fastest {:?}, most solved {}",
            result.attempt_id, merged.fastest_time_secs, merged.most_solved
        );
        Ok(merged)
    }

    /// Records for every operation at the same time limit and question count
    pub fn best_by_operation(
        &self,
        time_limit_secs: u32,
        total_questions: u32,
    ) -> Vec<(Operation, HighScoreRecord)> {
        Operation::ALL
            .iter()
            .map(|&op| {
                let key = HighScoreKey::new(op, time_limit_secs, total_questions);
                (op, self.read(&key))
            })
            .collect()
    }
}
