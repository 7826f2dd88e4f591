//! Error types shared by the quiz core.

use thiserror::Error;

/// Errors emitted when starting a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error(
        "invalid session config: time limit {time_limit_secs}s and {total_questions} questions (both must be positive)"
    )]
    InvalidConfig {
        time_limit_secs: u32,
        total_questions: u32,
    },
}

/// Errors surfaced by high score storage.
///
/// These are never fatal to a running session; the ledger keeps its
/// in-process copy of the record either way.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("score database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("score storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode high score: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("session history error: {0}")]
    History(#[from] csv::Error),
}
