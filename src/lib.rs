// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod ledger;
pub mod problem;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod util;

pub use error::{PersistenceError, SessionError};
pub use ledger::{HighScoreKey, HighScoreRecord, Ledger, MemoryStore, ScoreStore};
pub use problem::{Operation, Problem};
pub use session::{Answer, Phase, Session, SessionConfig, SessionResult};
pub use stats::ScoresDb;
