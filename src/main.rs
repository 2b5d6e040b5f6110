use clap::{error::ErrorKind, CommandFactory, Parser};
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
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use timesheet::{
    app::App,
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{ConfigStore, FileConfigStore},
    runtime::{AppEvent, CrosstermEventSource, Runner, TICK_INTERVAL},
    store::SessionStore,
    tracker::Tracker,
    ui::screen::current_screen,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TIMESHEET_LOG";

/// terminal time tracker with per-employee session logs
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Start, pause and finish work sessions for a selected company and employee. Sessions are saved per employee and can be exported as a daily report."
)]
pub struct Cli {
    /// path to the company/employee configuration file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// directory holding sessions/ and reports/ (defaults to the platform data dir)
    #[clap(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// company selected at startup
    #[clap(long)]
    company: Option<String>,

    /// employee selected at startup
    #[clap(short = 'e', long)]
    employee: Option<String>,
}

impl Cli {
    fn dirs(&self) -> AppDirs {
        match &self.data_dir {
            Some(dir) => AppDirs::rooted_at(dir),
            None => AppDirs::resolve(),
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn init_logging(dirs: &AppDirs) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(dirs.log_dir())?;
    let appender = tracing_appender::rolling::never(dirs.log_dir(), "timesheet.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn build_app(cli: &Cli) -> App<SystemClock> {
    let dirs = cli.dirs();
    let config = cli.config_store().load();
    let identity = config.initial_identity(cli.company.as_deref(), cli.employee.as_deref());
    let tracker = Tracker::new(identity, SessionStore::new(dirs.sessions_dir()), SystemClock);

    let mut app = App::new(config, dirs, tracker);
    app.load_sessions();
    app
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = init_logging(&cli.dirs())?;
    let mut app = build_app(&cli);
    info!(
        employee = %app.tracker.identity().employee,
        sessions = app.tracker.sessions().len(),
        "timesheet started"
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("timesheet closed");
    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<SystemClock>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), TICK_INTERVAL);

    while !app.should_quit {
        terminal.draw(|f| current_screen::<SystemClock>(&app.state).render(app, f))?;

        match runner.step() {
            AppEvent::Key(key) => app.on_key(key),
            AppEvent::Resize | AppEvent::Tick => {}
        }
    }

    Ok(())
}
