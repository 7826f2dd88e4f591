use crate::error::SessionError;
use crate::problem::{self, Operation, Problem};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};

/// Attempt ids are unique per process, independent of any problem RNG
static NEXT_ATTEMPT_ID: AtomicU64 = AtomicU64::new(1);

/// What the player picked before starting an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionConfig {
    pub operation: Operation,
    pub time_limit_secs: u32,
    pub total_questions: u32,
}

impl SessionConfig {
    pub fn new(operation: Operation, time_limit_secs: u32, total_questions: u32) -> Self {
        Self {
            operation,
            time_limit_secs,
            total_questions,
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.time_limit_secs == 0 || self.total_questions == 0 {
            return Err(SessionError::InvalidConfig {
                time_limit_secs: self.time_limit_secs,
                total_questions: self.total_questions,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InProgress,
    Completed,
    TimedOut,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Phase::InProgress)
    }
}

/// How a submitted answer was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// Not a number, or the session is already over
    Ignored,
    Incorrect,
    Correct,
}

/// Outcome of one finished attempt
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub config: SessionConfig,
    pub solved_count: u32,
    pub elapsed_secs: f64,
    pub passed: bool,
    pub attempt_id: u64,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub config: SessionConfig,
    pub current_problem: Problem,
    pub solved_count: u32,
    pub elapsed_secs: f64,
    pub phase: Phase,
    pub attempt_id: u64,
}

/// One timed attempt at a sequence of generated problems.
///
/// Driven from the outside by `tick` and `submit_answer`; holds no
/// synchronization, so a single owner advances it.
#[derive(Debug)]
pub struct Session<R = StdRng> {
    rng: R,
    state: SessionState,
}

impl Session<StdRng> {
    pub fn start_seeded(config: SessionConfig, seed: u64) -> Result<Self, SessionError> {
        Self::start(config, StdRng::seed_from_u64(seed))
    }

    pub fn start_random(config: SessionConfig) -> Result<Self, SessionError> {
        Self::start(config, StdRng::from_entropy())
    }
}

impl<R: Rng> Session<R> {
    pub fn start(config: SessionConfig, mut rng: R) -> Result<Self, SessionError> {
        config.validate()?;
        let state = fresh_state(config, &mut rng);
        debug!(
            "session {} started: {} in {}s, {} questions",
            state.attempt_id, config.operation, config.time_limit_secs, config.total_questions
        );
        Ok(Self { rng, state })
    }

    /// Throw away the current attempt and begin a new one with the same RNG.
    pub fn restart(&mut self, config: SessionConfig) -> Result<(), SessionError> {
        config.validate()?;
        self.state = fresh_state(config, &mut self.rng);
        debug!("session {} restarted", self.state.attempt_id);
        Ok(())
    }

    pub fn tick(&mut self, delta_secs: f64) {
        if self.is_terminal() {
            return;
        }
        let valid = delta_secs.is_finite() && delta_secs >= 0.0;
        debug_assert!(valid, "tick called with invalid delta {delta_secs}");
        if !valid {
            return;
        }

        self.state.elapsed_secs += delta_secs;
        if self.state.elapsed_secs >= self.state.config.time_limit_secs as f64 {
            self.finish(Phase::TimedOut);
        }
    }

    pub fn submit_answer(&mut self, raw: &str) -> Answer {
        if self.is_terminal() {
            return Answer::Ignored;
        }
        let Ok(value) = raw.trim().parse::<i64>() else {
            return Answer::Ignored;
        };
        if value != self.state.current_problem.correct_answer {
            return Answer::Incorrect;
        }

        self.state.solved_count += 1;
        if self.state.solved_count >= self.state.config.total_questions {
            // Finishing on the deadline counts, anything past it is a timeout.
            if self.state.elapsed_secs <= self.state.config.time_limit_secs as f64 {
                self.finish(Phase::Completed);
            } else {
                self.finish(Phase::TimedOut);
            }
        } else {
            self.state.current_problem =
                problem::generate(self.state.config.operation, &mut self.rng);
        }

        Answer::Correct
    }

    fn finish(&mut self, phase: Phase) {
        self.state.phase = phase;
        debug!(
            "session {} ended {:?} after {:.2}s with {}/{} solved",
            self.state.attempt_id,
            phase,
            self.state.elapsed_secs,
            self.state.solved_count,
            self.state.config.total_questions
        );
    }
}

impl<R> Session<R> {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> SessionConfig {
        self.state.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.state.phase.is_terminal()
    }

    pub fn current_problem(&self) -> &Problem {
        &self.state.current_problem
    }

    pub fn current_display_text(&self) -> &str {
        &self.state.current_problem.display_text
    }

    /// `(solved, total)`
    pub fn progress(&self) -> (u32, u32) {
        (self.state.solved_count, self.state.config.total_questions)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.state.elapsed_secs
    }

    pub fn remaining_secs(&self) -> f64 {
        (self.state.config.time_limit_secs as f64 - self.state.elapsed_secs).max(0.0)
    }

    /// The attempt's result. Panics while the session is still running.
    pub fn result(&self) -> SessionResult {
        assert!(
            self.is_terminal(),
            "result requested for session {} while still in progress",
            self.state.attempt_id
        );

        SessionResult {
            config: self.state.config,
            solved_count: self.state.solved_count,
            elapsed_secs: self.state.elapsed_secs,
            passed: self.state.phase == Phase::Completed,
            attempt_id: self.state.attempt_id,
        }
    }
}

fn fresh_state<R: Rng + ?Sized>(config: SessionConfig, rng: &mut R) -> SessionState {
    SessionState {
        config,
        current_problem: problem::generate(config.operation, rng),
        solved_count: 0,
        elapsed_secs: 0.0,
        phase: Phase::InProgress,
        attempt_id: NEXT_ATTEMPT_ID.fetch_add(1, Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn answer_current(session: &mut Session) -> Answer {
        let answer = session.current_problem().correct_answer.to_string();
        session.submit_answer(&answer)
    }

    fn wrong_answer(session: &Session) -> String {
        (session.current_problem().correct_answer + 1).to_string()
    }

    #[test]
    fn test_start_initial_state() {
        let config = SessionConfig::new(Operation::Add, 60, 5);
        let session = Session::start_seeded(config, 1).unwrap();

        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.progress(), (0, 5));
        assert_eq!(session.elapsed_secs(), 0.0);
        assert_eq!(session.remaining_secs(), 60.0);
        assert!(session.current_display_text().ends_with("= ?"));
        assert!(!session.is_terminal());
    }

    #[test]
    fn test_start_rejects_zero_questions() {
        let config = SessionConfig::new(Operation::Add, 60, 0);
        assert_matches!(
            Session::start_seeded(config, 1),
            Err(SessionError::InvalidConfig {
                total_questions: 0,
                ..
            })
        );
    }

    #[test]
    fn test_start_rejects_zero_time_limit() {
        let config = SessionConfig::new(Operation::Divide, 0, 5);
        assert_matches!(
            Session::start_seeded(config, 1),
            Err(SessionError::InvalidConfig {
                time_limit_secs: 0,
                ..
            })
        );
    }

    #[test]
    fn test_completed_before_deadline() {
        let config = SessionConfig::new(Operation::Add, 60, 5);
        let mut session = Session::start_seeded(config, 3).unwrap();

        for _ in 0..5 {
            session.tick(9.0);
            assert_eq!(answer_current(&mut session), Answer::Correct);
        }

        assert_eq!(session.phase(), Phase::Completed);
        let result = session.result();
        assert!(result.passed);
        assert_eq!(result.elapsed_secs, 45.0);
        assert_eq!(result.solved_count, 5);
        assert_eq!(result.config, config);
    }

    #[test]
    fn test_times_out_with_partial_progress() {
        let config = SessionConfig::new(Operation::Divide, 60, 3);
        let mut session = Session::start_seeded(config, 11).unwrap();

        session.tick(20.0);
        answer_current(&mut session);
        session.tick(20.0);
        answer_current(&mut session);
        session.tick(21.0);

        assert_eq!(session.phase(), Phase::TimedOut);
        assert_eq!(answer_current(&mut session), Answer::Ignored);

        let result = session.result();
        assert!(!result.passed);
        assert_eq!(result.solved_count, 2);
        assert_eq!(result.elapsed_secs, 61.0);
    }

    #[test]
    fn test_reaching_limit_exactly_times_out() {
        let config = SessionConfig::new(Operation::Add, 10, 2);
        let mut session = Session::start_seeded(config, 5).unwrap();

        session.tick(10.0);
        assert_eq!(session.phase(), Phase::TimedOut);
        assert_eq!(session.remaining_secs(), 0.0);
    }

    #[test]
    fn test_wrong_answer_keeps_problem() {
        let config = SessionConfig::new(Operation::Multiply, 60, 3);
        let mut session = Session::start_seeded(config, 9).unwrap();
        let before = session.current_problem().clone();

        let wrong = wrong_answer(&session);
        assert_eq!(session.submit_answer(&wrong), Answer::Incorrect);

        assert_eq!(session.current_problem(), &before);
        assert_eq!(session.progress(), (0, 3));
    }

    #[test]
    fn test_non_numeric_answer_is_ignored() {
        let config = SessionConfig::new(Operation::Subtract, 60, 3);
        let mut session = Session::start_seeded(config, 9).unwrap();
        let before = session.current_problem().clone();

        for raw in ["", "abc", "4.5", "  ", "1 2"] {
            assert_eq!(session.submit_answer(raw), Answer::Ignored);
        }

        assert_eq!(session.current_problem(), &before);
        assert_eq!(session.progress(), (0, 3));
        assert_eq!(session.phase(), Phase::InProgress);
    }

    #[test]
    fn test_answer_with_whitespace_is_accepted() {
        let config = SessionConfig::new(Operation::Add, 60, 2);
        let mut session = Session::start_seeded(config, 2).unwrap();

        let padded = format!("  {} ", session.current_problem().correct_answer);
        assert_eq!(session.submit_answer(&padded), Answer::Correct);
        assert_eq!(session.progress(), (1, 2));
    }

    #[test]
    fn test_zero_tick_changes_nothing() {
        let config = SessionConfig::new(Operation::Add, 5, 2);
        let mut session = Session::start_seeded(config, 4).unwrap();

        for _ in 0..100 {
            session.tick(0.0);
        }
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.progress(), (0, 2));
        assert_eq!(session.elapsed_secs(), 0.0);
    }

    #[test]
    fn test_terminal_phase_is_frozen() {
        let config = SessionConfig::new(Operation::Add, 60, 1);
        let mut session = Session::start_seeded(config, 8).unwrap();

        session.tick(5.0);
        answer_current(&mut session);
        assert_eq!(session.phase(), Phase::Completed);

        session.tick(100.0);
        assert_eq!(session.phase(), Phase::Completed);
        assert_eq!(session.elapsed_secs(), 5.0);
        assert_eq!(session.submit_answer("0"), Answer::Ignored);
        assert_eq!(session.progress(), (1, 1));
    }

    #[test]
    fn test_solved_count_is_monotonic_and_bounded() {
        let config = SessionConfig::new(Operation::Subtract, 30, 4);
        let mut session = Session::start_seeded(config, 21).unwrap();
        let mut last = 0;

        for step in 0..40 {
            session.tick(0.5);
            if step % 3 == 0 {
                let wrong = wrong_answer(&session);
                session.submit_answer(&wrong);
            } else {
                answer_current(&mut session);
            }
            let (solved, total) = session.progress();
            assert!(solved >= last);
            assert!(solved <= total);
            last = solved;
        }
        assert_eq!(session.phase(), Phase::Completed);
    }

    #[test]
    fn test_restart_resets_state() {
        let config = SessionConfig::new(Operation::Add, 10, 2);
        let mut session = Session::start_seeded(config, 13).unwrap();
        session.tick(11.0);
        let first_id = session.result().attempt_id;

        let next = SessionConfig::new(Operation::Multiply, 30, 4);
        session.restart(next).unwrap();

        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.config(), next);
        assert_eq!(session.progress(), (0, 4));
        assert_eq!(session.elapsed_secs(), 0.0);
        assert!(session.current_display_text().contains('×'));
        assert_ne!(session.state().attempt_id, first_id);
    }

    #[test]
    fn test_restart_with_invalid_config_keeps_attempt() {
        let config = SessionConfig::new(Operation::Add, 10, 2);
        let mut session = Session::start_seeded(config, 13).unwrap();
        session.tick(3.0);

        assert!(session.restart(SessionConfig::new(Operation::Add, 10, 0)).is_err());
        assert_eq!(session.elapsed_secs(), 3.0);
        assert_eq!(session.config(), config);
    }

    #[test]
    #[should_panic(expected = "still in progress")]
    fn test_result_before_terminal_panics() {
        let config = SessionConfig::new(Operation::Add, 10, 2);
        let session = Session::start_seeded(config, 1).unwrap();
        let _ = session.result();
    }

    #[test]
    fn test_same_seed_same_problems() {
        let config = SessionConfig::new(Operation::Divide, 60, 5);
        let mut a = Session::start_seeded(config, 99).unwrap();
        let mut b = Session::start_seeded(config, 99).unwrap();

        for _ in 0..4 {
            assert_eq!(a.current_problem(), b.current_problem());
            answer_current(&mut a);
            answer_current(&mut b);
        }
    }

    #[test]
    fn test_same_seed_sessions_are_distinct_attempts() {
        let config = SessionConfig::new(Operation::Add, 60, 3);
        let a = Session::start_seeded(config, 42).unwrap();
        let b = Session::start_seeded(config, 42).unwrap();

        assert_eq!(a.current_problem(), b.current_problem());
        assert_ne!(a.state().attempt_id, b.state().attempt_id);
    }
}
