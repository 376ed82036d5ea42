pub mod ui;

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs::OpenOptions,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{info, warn, Level};

use wodrun::{
    app_dirs::AppDirs,
    catalog::Catalog,
    config::{ConfigStore, FileConfigStore},
    keymap::{action_for, Action},
    machine::Command,
    persistence::FileSlotStore,
    plan::WorkoutPlan,
    results::SqliteResultsSink,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    session::SessionConfig,
    session_runtime::SessionRuntime,
    util::{format_clock, humanize_since},
    workout::WorkoutDefinition,
};

use crate::ui::screen::current_screen;

/// guided workout-of-the-day sessions in the terminal
#[derive(Parser, Debug)]
#[command(version, about, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// run a workout session (the default)
    Run(RunArgs),
    /// list bundled workouts
    List,
    /// show recorded sessions
    History {
        /// number of sessions to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// delete every recorded session
        #[arg(long)]
        clear: bool,

        /// only sessions of this user
        #[arg(short = 'u', long, env = "WODRUN_USER")]
        user: Option<String>,
    },
    /// export recorded sessions as CSV
    Export {
        path: PathBuf,

        /// only sessions of this user
        #[arg(short = 'u', long, env = "WODRUN_USER")]
        user: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// bundled workout id (default: workout of the day)
    #[arg(short = 'w', long, conflicts_with_all = ["file", "random"])]
    workout: Option<String>,

    /// workout definition JSON file
    #[arg(long, conflicts_with = "random")]
    file: Option<PathBuf>,

    /// pick a random bundled workout
    #[arg(long)]
    random: bool,

    /// user the results are recorded for
    #[arg(short = 'u', long, env = "WODRUN_USER")]
    user: Option<String>,

    /// override the number of main-section rounds
    #[arg(short = 'r', long)]
    rounds: Option<u32>,

    /// discard any saved progress for this workout
    #[arg(long)]
    fresh: bool,

    /// debug-level logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Session,
    Results,
}

type Session = SessionRuntime<FileSlotStore, Option<SqliteResultsSink>>;

pub struct App {
    pub session: Session,
    pub state: AppState,
}

impl App {
    fn new(session: Session) -> Self {
        let state = if session.is_complete() {
            AppState::Results
        } else {
            AppState::Session
        };
        Self { session, state }
    }

    fn dispatch(&mut self, command: Command) {
        self.session.dispatch(command);
        if self.session.is_complete() {
            self.state = AppState::Results;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => list(),
        Some(Commands::History { limit, clear, user }) => history(limit, clear, user.as_deref()),
        Some(Commands::Export { path, user }) => export(&path, user.as_deref()),
        Some(Commands::Run(args)) => run(args),
        None => run(cli.run),
    }
}

fn init_logging(verbose: bool) {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        if std::fs::create_dir_all(dir).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    // a TUI owns stdout, so logs only ever go to the file
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init();
}

fn resolve_definition(args: &RunArgs, catalog: &Catalog) -> Result<WorkoutDefinition> {
    if let Some(path) = &args.file {
        return WorkoutDefinition::from_path(path)
            .with_context(|| format!("loading workout from {}", path.display()));
    }
    if let Some(id) = &args.workout {
        return Ok(catalog.find(id)?.clone());
    }
    let picked = if args.random {
        catalog.random()
    } else {
        catalog.for_date(Local::now().date_naive())
    };
    match picked {
        Some(def) => Ok(def.clone()),
        None => bail!("no bundled workouts available"),
    }
}

fn open_sink() -> Option<SqliteResultsSink> {
    let path = AppDirs::db_path()?;
    match SqliteResultsSink::open(&path) {
        Ok(sink) => Some(sink),
        Err(err) => {
            warn!(path = %path.display(), %err, "results database unavailable");
            None
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    init_logging(args.verbose);

    let catalog = Catalog::bundled().context("loading bundled workouts")?;
    let definition = resolve_definition(&args, &catalog)?;

    let config = FileConfigStore::new().load();
    let mut session_config = SessionConfig::for_workout(&definition, &config);
    if let Some(rounds) = args.rounds {
        session_config.rounds = rounds.max(1);
    }
    let plan = WorkoutPlan::from_definition(&definition, session_config.rounds)?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let slot_dir = AppDirs::slot_dir().context("no state directory available")?;
    let user = args.user.or(config.user_id);
    info!(workout = %plan.id, user = ?user, rounds = session_config.rounds, "opening session");

    let session = SessionRuntime::open(
        plan,
        session_config,
        FileSlotStore::new(slot_dir),
        open_sink(),
        user,
        args.fresh,
    );
    let mut app = App::new(session);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::seconds());

    loop {
        terminal.draw(|f| current_screen(&app.state).render(app, f))?;

        match runner.step() {
            AppEvent::Tick => {
                if app.state == AppState::Session {
                    app.dispatch(Command::Tick);
                }
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                let started = app.session.machine().state().started;
                match (app.state, action_for(key, started)) {
                    (_, Some(Action::Quit)) => break,
                    (AppState::Session, Some(Action::Command(command))) => app.dispatch(command),
                    _ => {}
                }
            }
        }
    }

    if !app.session.is_complete() {
        info!("left session; progress saved");
    }
    Ok(())
}

fn list() -> Result<()> {
    let catalog = Catalog::bundled().context("loading bundled workouts")?;
    let sink = AppDirs::db_path()
        .filter(|path| path.exists())
        .and_then(|path| SqliteResultsSink::open(path).ok());
    let now = Utc::now();

    for wod in catalog.iter() {
        let last = sink
            .as_ref()
            .and_then(|sink| sink.last_completed_at(&wod.id).ok().flatten())
            .map(|at| format!("  (last done {})", humanize_since(at, now)))
            .unwrap_or_default();
        println!(
            "{:<18} {:<20} {:>3} min  {:<12} {}{}",
            wod.id,
            wod.title,
            wod.duration_minutes,
            wod.difficulty.as_deref().unwrap_or("-"),
            wod.outline(),
            last
        );
    }
    Ok(())
}

fn open_history() -> Result<SqliteResultsSink> {
    let path = AppDirs::db_path().context("no state directory available")?;
    SqliteResultsSink::open(&path)
        .with_context(|| format!("opening results database {}", path.display()))
}

fn history(limit: usize, clear: bool, user: Option<&str>) -> Result<()> {
    let sink = open_history()?;
    if clear {
        sink.clear_all()?;
        println!("history cleared");
        return Ok(());
    }
    let now = Utc::now();
    let sessions = sink.recent_sessions(user, limit)?;
    if sessions.is_empty() {
        println!("no recorded sessions");
    }
    for record in sessions {
        println!(
            "{:<12} {:<20} {:>3}/{:<3} {:>7}  {}",
            record.user_id,
            record.title,
            record.exercises_completed,
            record.total_exercises,
            format_clock(record.total_elapsed_seconds),
            humanize_since(record.completed_at, now)
        );
    }
    Ok(())
}

fn export(path: &Path, user: Option<&str>) -> Result<()> {
    let sink = open_history()?;
    let count = sink
        .export_csv(path, user)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("exported {count} sessions to {}", path.display());
    Ok(())
}
