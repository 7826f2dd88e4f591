use crate::app_dirs::AppDirs;
use crate::error::PersistenceError;
use crate::problem::Operation;
use crate::session::SessionResult;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// One finished attempt as written to the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub date: DateTime<Local>,
    pub operation: Operation,
    pub time_limit_secs: u32,
    pub total_questions: u32,
    pub solved: u32,
    pub elapsed_secs: f64,
    pub passed: bool,
}

impl HistoryRow {
    pub fn new(result: &SessionResult, date: DateTime<Local>) -> Self {
        Self {
            date,
            operation: result.config.operation,
            time_limit_secs: result.config.time_limit_secs,
            total_questions: result.config.total_questions,
            solved: result.solved_count,
            elapsed_secs: result.elapsed_secs,
            passed: result.passed,
        }
    }
}

/// Append-only CSV log of every finished attempt
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::history_path().unwrap_or_else(|| PathBuf::from("mathdash_history.csv"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, result: &SessionResult) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // A missing or empty log gets a header
        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        writer.serialize(HistoryRow::new(result, Local::now()))?;
        writer.flush()?;
        Ok(())
    }

    pub fn rows(&self) -> Result<Vec<HistoryRow>, PersistenceError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<HistoryRow>, csv::Error>>()?;
        Ok(rows)
    }

    /// The last `n` attempts, oldest first
    pub fn recent(&self, n: usize) -> Result<Vec<HistoryRow>, PersistenceError> {
        let mut rows = self.rows()?;
        let skip = rows.len().saturating_sub(n);
        Ok(rows.split_off(skip))
    }
}
