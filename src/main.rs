mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use log::{info, warn};
use mathdash::{
    config::{Config, ConfigStore, FileConfigStore},
    history::{HistoryLog, HistoryRow},
    ledger::{Ledger, MemoryStore, ScoreStore},
    problem::Operation,
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    session::{Answer, Session, SessionResult},
    stats::ScoresDb,
    util,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;
const MAX_ANSWER_LEN: usize = 6;

/// timed arithmetic drills with per-configuration high scores
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Solve a fixed number of arithmetic problems before the clock runs out. Fastest completion times and most problems solved are kept per operation, time limit and question count."
)]
pub struct Cli {
    /// operation to practice (defaults to the last one used)
    #[clap(short = 'o', long, value_enum)]
    operation: Option<Operation>,

    /// time limit in minutes
    #[clap(short = 'm', long)]
    minutes: Option<u32>,

    /// number of problems to solve
    #[clap(short = 'q', long)]
    questions: Option<u32>,

    /// seed the problem generator for a repeatable sequence
    #[clap(long)]
    seed: Option<u64>,

    /// high score database to use instead of the default location
    #[clap(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// print the best records for every operation at the selected time limit and question count, then exit
    #[clap(long)]
    scores: bool,

    /// print the last N finished attempts, then exit
    #[clap(long, value_name = "N")]
    history: Option<usize>,
}

impl Cli {
    /// Overlay the flags that were given on top of the remembered selection
    fn apply(&self, stored: Config) -> Config {
        Config {
            operation: self.operation.unwrap_or(stored.operation),
            minutes: self.minutes.unwrap_or(stored.minutes),
            total_questions: self.questions.unwrap_or(stored.total_questions),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Quiz,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Restarted,
    Quit,
}

pub struct App {
    pub session: Session,
    pub ledger: Ledger<Box<dyn ScoreStore>>,
    pub history: HistoryLog,
    pub state: AppState,
    pub answer: String,
    pub last_answer: Option<Answer>,
    pub last_result: Option<SessionResult>,
    pub notice: Option<String>,
}

impl App {
    pub fn new(
        session: Session,
        ledger: Ledger<Box<dyn ScoreStore>>,
        history: HistoryLog,
    ) -> Self {
        Self {
            session,
            ledger,
            history,
            state: AppState::Quiz,
            answer: String::new(),
            last_answer: None,
            last_result: None,
            notice: None,
        }
    }

    fn on_tick(&mut self, elapsed: Duration) {
        if self.state != AppState::Quiz {
            return;
        }
        self.session.tick(elapsed.as_secs_f64());
        if self.session.is_terminal() {
            self.finish();
        }
    }

    /// Handle a key that arrived `pending` after the last tick.
    ///
    /// The pending time is charged first, so a key pressed after the deadline
    /// finds the attempt already timed out and is not applied to it.
    fn on_key_after(&mut self, key: KeyEvent, pending: Duration) -> Control {
        let was_running = self.state == AppState::Quiz;
        self.on_tick(pending);
        if was_running && self.state == AppState::Results && !is_quit(key) {
            return Control::Continue;
        }
        self.on_key(key)
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        if is_quit(key) {
            return Control::Quit;
        }

        match self.state {
            AppState::Quiz => {
                match key.code {
                    KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                        if self.answer.len() < MAX_ANSWER_LEN {
                            self.answer.push(c);
                        }
                    }
                    KeyCode::Backspace => {
                        self.answer.pop();
                    }
                    KeyCode::Enter => self.submit(),
                    _ => {}
                }
                Control::Continue
            }
            AppState::Results => match key.code {
                KeyCode::Char('r') => {
                    self.retry();
                    Control::Restarted
                }
                KeyCode::Char('q') => Control::Quit,
                _ => Control::Continue,
            },
        }
    }

    fn submit(&mut self) {
        let outcome = self.session.submit_answer(&self.answer);
        self.answer.clear();
        self.last_answer = Some(outcome);
        if self.session.is_terminal() {
            self.finish();
        }
    }

    fn finish(&mut self) {
        let result = self.session.result();
        info!(
            "{} attempt finished: {}/{} in {:.2}s",
            result.config.operation,
            result.solved_count,
            result.config.total_questions,
            result.elapsed_secs
        );

        self.notice = match self.ledger.record_result(&result) {
            Ok(_) => None,
            Err(e) => Some(format!("high score not saved: {e}")),
        };
        if let Err(e) = self.history.append(&result) {
            warn!("could not append to {}: {e}", self.history.path().display());
        }

        self.last_result = Some(result);
        self.state = AppState::Results;
    }

    fn retry(&mut self) {
        let config = self.session.config();
        if let Err(e) = self.session.restart(config) {
            warn!("could not restart session: {e}");
            return;
        }
        self.answer.clear();
        self.last_answer = None;
        self.notice = None;
        self.state = AppState::Quiz;
    }
}

fn is_quit(key: KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
}

fn open_ledger(db: Option<&Path>) -> Ledger<Box<dyn ScoreStore>> {
    let opened = match db {
        Some(path) => ScoresDb::open(path),
        None => ScoresDb::new(),
    };

    let store: Box<dyn ScoreStore> = match opened {
        Ok(db) => Box::new(db),
        Err(e) => {
            warn!("high scores will only be kept for this run: {e}");
            Box::new(MemoryStore::new())
        }
    };
    Ledger::new(store)
}

fn scores_report<S: ScoreStore>(ledger: &Ledger<S>, config: &Config) -> String {
    let session_config = config.session_config();
    let header = format!(
        "best records for {} questions in {}",
        session_config.total_questions,
        util::clock_text(session_config.time_limit_secs as f64)
    );

    let rows = ledger
        .best_by_operation(session_config.time_limit_secs, session_config.total_questions)
        .into_iter()
        .map(|(op, record)| {
            format!(
                "{:<15} {:>16}   most solved {}",
                op.long_name(),
                util::best_time_text(&record),
                record.most_solved
            )
        })
        .join("\n");

    format!("{header}\n{rows}")
}

fn history_report(rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return "no finished attempts yet".to_string();
    }

    rows.iter()
        .map(|row| {
            format!(
                "{}  {:<8} {:>5}  {:>3}/{:<3} {:>16}  {}",
                row.date.format("%Y-%m-%d %H:%M"),
                row.operation,
                util::clock_text(row.time_limit_secs as f64),
                row.solved,
                row.total_questions,
                util::format_time(row.elapsed_secs),
                if row.passed { "passed" } else { "failed" }
            )
        })
        .join("\n")
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    let session_config = config.session_config();

    if let Err(e) = session_config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }

    if let Some(n) = cli.history {
        let rows = HistoryLog::new().recent(n)?;
        println!("{}", history_report(&rows));
        return Ok(());
    }

    let ledger = open_ledger(cli.db.as_deref());
    if cli.scores {
        println!("{}", scores_report(&ledger, &config));
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let session = match cli.seed {
        Some(seed) => Session::start_seeded(session_config, seed)?,
        None => Session::start_random(session_config)?,
    };
    if let Err(e) = config_store.save(&config) {
        warn!("could not remember selection: {e}");
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, ledger, HistoryLog::new());
    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            QuizEvent::Tick(elapsed) => {
                let was_running = app.state == AppState::Quiz;
                app.on_tick(elapsed);
                if was_running {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            QuizEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            QuizEvent::Key(key) => {
                match app.on_key_after(key, runner.take_elapsed()) {
                    Control::Quit => break,
                    Control::Restarted => runner.reset_clock(),
                    Control::Continue => {}
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
