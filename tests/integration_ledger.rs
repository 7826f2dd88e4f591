use mathdash::history::HistoryLog;
use mathdash::ledger::{HighScoreKey, Ledger};
use mathdash::session::{Session, SessionConfig, SessionResult};
use mathdash::stats::ScoresDb;
use mathdash::Operation;
use tempfile::tempdir;

fn result(config: SessionConfig, solved: u32, elapsed: f64, passed: bool, id: u64) -> SessionResult {
    SessionResult {
        config,
        solved_count: solved,
        elapsed_secs: elapsed,
        passed,
        attempt_id: id,
    }
}

#[test]
fn ledger_update_if_better_on_sqlite() {
    let dir = tempdir().unwrap();
    let config = SessionConfig::new(Operation::Multiply, 60, 5);
    let key = HighScoreKey::from(config);
    let mut ledger = Ledger::new(ScoresDb::open(dir.path().join("scores.db")).unwrap());

    let first = ledger.record_result(&result(config, 5, 30.0, true, 1)).unwrap();
    assert_eq!(first.fastest_time_secs, Some(30.0));
    assert_eq!(first.most_solved, 5);

    ledger.record_result(&result(config, 5, 20.0, true, 2)).unwrap();
    assert_eq!(ledger.read(&key).fastest_time_secs, Some(20.0));

    ledger.record_result(&result(config, 3, 60.0, false, 3)).unwrap();
    let record = ledger.read(&key);
    assert_eq!(record.most_solved, 5);
    assert_eq!(record.fastest_time_secs, Some(20.0));
}

#[test]
fn ledger_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("scores.db");
    let config = SessionConfig::new(Operation::Subtract, 180, 10);
    let key = HighScoreKey::from(config);

    {
        let mut ledger = Ledger::new(ScoresDb::open(&path).unwrap());
        ledger.record_result(&result(config, 10, 95.5, true, 1)).unwrap();
        ledger.record_result(&result(config, 4, 180.0, false, 2)).unwrap();
    }

    let reopened = Ledger::new(ScoresDb::open(&path).unwrap());
    let record = reopened.read(&key);
    assert_eq!(record.fastest_time_secs, Some(95.5));
    assert_eq!(record.most_solved, 10);
    assert_eq!(reopened.store().len().unwrap(), 1);

    let other = HighScoreKey::new(Operation::Subtract, 60, 10);
    assert_eq!(reopened.read(&other).most_solved, 0);
}

#[test]
fn finished_session_feeds_ledger_and_history() {
    let dir = tempdir().unwrap();
    let config = SessionConfig::new(Operation::Add, 60, 5);
    let mut session = Session::start_seeded(config, 1234).unwrap();

    for _ in 0..5 {
        session.tick(9.0);
        let answer = session.current_problem().correct_answer.to_string();
        session.submit_answer(&answer);
    }
    assert!(session.is_terminal());
    let finished = session.result();
    assert!(finished.passed);
    assert_eq!(finished.elapsed_secs, 45.0);

    let mut ledger = Ledger::new(ScoresDb::open(dir.path().join("scores.db")).unwrap());
    let history = HistoryLog::with_path(dir.path().join("history.csv"));
    ledger.record_result(&finished).unwrap();
    history.append(&finished).unwrap();

    let best = ledger.best_by_operation(60, 5);
    let add = best.iter().find(|(op, _)| *op == Operation::Add).unwrap();
    assert_eq!(add.1.fastest_time_secs, Some(45.0));
    assert_eq!(add.1.most_solved, 5);

    let rows = history.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].operation, Operation::Add);
    assert!(rows[0].passed);
}

#[test]
fn replaying_a_seed_records_each_attempt() {
    let dir = tempdir().unwrap();
    let config = SessionConfig::new(Operation::Divide, 60, 2);
    let mut ledger = Ledger::new(ScoresDb::open(dir.path().join("scores.db")).unwrap());

    for elapsed in [12.0, 8.0, 15.0] {
        let mut session = Session::start_seeded(config, 7).unwrap();
        for _ in 0..2 {
            session.tick(elapsed / 2.0);
            let answer = session.current_problem().correct_answer.to_string();
            session.submit_answer(&answer);
        }
        ledger.record_result(&session.result()).unwrap();
    }

    let record = ledger.read(&HighScoreKey::from(config));
    assert_eq!(record.fastest_time_secs, Some(8.0));
    assert_eq!(record.most_solved, 2);
}
