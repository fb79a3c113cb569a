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
use serde_json::json;
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use zetadrill::{
    app::{Action, App},
    app_dirs::AppDirs,
    normalize,
    runtime::{Runner, SystemClock, TerminalInput},
    store::{load_settings, FileStore},
    Operation, Settings,
};

const TICK_RATE_MS: u64 = 100;

/// timed arithmetic drill in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Answer as many generated arithmetic problems as you can before the clock runs out. Operations, operand ranges, round length and reveal delay are configurable and remembered between runs."
)]
pub struct Cli {
    /// round length in seconds: 30, 60, 90, 120 or 300
    #[clap(short = 'd', long)]
    duration: Option<u32>,

    /// seconds a solved problem stays on screen before the next one (0 to 5)
    #[clap(short = 'r', long)]
    reveal_delay: Option<f64>,

    /// operations to enable, comma separated
    #[clap(short = 'o', long, value_enum, value_delimiter = ',')]
    ops: Option<Vec<Operation>>,

    /// ignore saved settings and start from the defaults
    #[clap(long)]
    reset: bool,

    /// write debug detail to the log file
    #[clap(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    /// Layer command line overrides over `base`; the result is normalized
    /// like any other input.
    fn apply_to(&self, base: &Settings) -> Settings {
        let mut raw = base.to_raw();
        if let Some(duration) = self.duration {
            raw["duration"] = json!(duration);
        }
        if let Some(reveal_delay) = self.reveal_delay {
            raw["revealDelay"] = json!(reveal_delay);
        }
        if let Some(ops) = &self.ops {
            for op in Operation::ALL {
                raw["operations"][op.to_string()] = json!(ops.contains(&op));
            }
        }

        let settings = normalize(&raw);
        if self.duration.is_some_and(|d| d != settings.duration) {
            warn!(
                requested = ?self.duration,
                used = settings.duration,
                "unsupported duration"
            );
        }
        settings
    }
}

fn setup_logging(verbose: bool) -> Result<(), Box<dyn Error>> {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(err) = setup_logging(cli.verbose) {
        eprintln!("logging disabled: {err}");
    }

    let store = FileStore::new();
    let stored = if cli.reset {
        Settings::default()
    } else {
        load_settings(&store)
    };
    let settings = cli.apply_to(&stored);
    info!(store = %store.path().display(), "settings loaded");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&settings, Box::new(store));
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        TerminalInput::spawn(),
        SystemClock,
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        if app.handle_event(runner.step()) == Action::Quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zetadrill::Operations;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["zetadrill"]);

        assert_eq!(cli.duration, None);
        assert_eq!(cli.reveal_delay, None);
        assert_eq!(cli.ops, None);
        assert!(!cli.reset);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_duration_and_delay() {
        let cli = Cli::parse_from(["zetadrill", "-d", "60", "-r", "1.5"]);
        assert_eq!(cli.duration, Some(60));
        assert_eq!(cli.reveal_delay, Some(1.5));

        let cli = Cli::parse_from(["zetadrill", "--duration", "300", "--reveal-delay", "0"]);
        assert_eq!(cli.duration, Some(300));
        assert_eq!(cli.reveal_delay, Some(0.0));
    }

    #[test]
    fn test_cli_ops_list() {
        let cli = Cli::parse_from(["zetadrill", "--ops", "add,div"]);
        assert_eq!(cli.ops, Some(vec![Operation::Add, Operation::Div]));

        let cli = Cli::parse_from(["zetadrill", "-o", "mul"]);
        assert_eq!(cli.ops, Some(vec![Operation::Mul]));
    }

    #[test]
    fn test_cli_rejects_unknown_op() {
        assert!(Cli::try_parse_from(["zetadrill", "--ops", "pow"]).is_err());
    }

    #[test]
    fn test_cli_without_overrides_keeps_settings() {
        let cli = Cli::parse_from(["zetadrill"]);
        let base = Settings {
            duration: 90,
            ..Settings::default()
        };
        assert_eq!(cli.apply_to(&base), base);
    }

    #[test]
    fn test_cli_overrides_are_normalized() {
        let cli = Cli::parse_from(["zetadrill", "-d", "45", "-r", "9", "--ops", "sub"]);
        let settings = cli.apply_to(&Settings::default());
        assert_eq!(settings.duration, 120);
        assert_eq!(settings.reveal_delay, 5.0);
        assert_eq!(settings.operations, Operations::only(&[Operation::Sub]));
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }
}
