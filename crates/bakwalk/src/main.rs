//! bakwalk CLI - step through the numbered backups of a file

mod app;
mod config;
mod screen;
mod time_format;
mod ui;

use anyhow::{Context, Result};
use app::App;
use bakwalk_core::{BackupLocator, NavigationSession, SessionOptions};
use clap::Parser;
use config::{Config, EngineKind};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use screen::{KeySource, Screen, TerminalKeys};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use time_format::TimeFormatter;

#[derive(Parser, Debug)]
#[command(name = "bw")]
#[command(author, version, about = "Walk the numbered backups of a file, one diff at a time")]
struct Args {
    /// File whose backups (FILE.~N~) should be walked
    file: PathBuf,

    /// Backup policy: numbered (t), existing (nil) or never
    #[arg(long, value_name = "MODE")]
    version_control: Option<String>,

    /// Directory holding relocated backups (path-mangled names)
    #[arg(long, value_name = "DIR")]
    backup_dir: Option<PathBuf>,

    /// Diff engine
    #[arg(long, value_enum)]
    engine: Option<EngineKind>,

    /// Context lines for the builtin engine
    #[arg(short = 'U', long)]
    context: Option<u32>,

    /// Print the backups newest first and exit
    #[arg(long)]
    list: bool,

    /// With --list, print JSON
    #[arg(long, requires = "list")]
    json: bool,
}

/// Log to the file named by BAKWALK_LOG; the terminal belongs to the UI
fn init_tracing() -> Result<()> {
    use std::fs::File;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_path = match std::env::var("BAKWALK_LOG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => return Ok(()),
    };
    let file = File::options()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .with(EnvFilter::from_default_env())
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}

#[derive(Serialize)]
struct ListedBackup<'a> {
    number: u64,
    path: &'a Path,
    modified: Option<i64>,
}

fn write_list(
    out: &mut impl Write,
    locator: &BackupLocator,
    file: &Path,
    json: bool,
    time: &TimeFormatter,
) -> Result<()> {
    let set = locator
        .locate(file)
        .with_context(|| format!("Failed to list backups of {}", file.display()))?;

    if json {
        let listed: Vec<ListedBackup> = set
            .versions()
            .iter()
            .map(|v| ListedBackup {
                number: v.number,
                path: &v.path,
                modified: std::fs::metadata(&v.path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(time_format::epoch_secs),
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&listed)?)?;
        return Ok(());
    }

    let width = set.newest().number.to_string().len();
    for version in set.versions() {
        writeln!(
            out,
            "{:>width$}  {:<16}  {}",
            version.number,
            time.format_modified(&version.path),
            version.path.display()
        )?;
    }
    writeln!(
        out,
        "next backup: {}",
        locator.naming().next_backup_name(&set).display()
    )?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;
    let config = Config::load();

    let naming = config.naming(args.backup_dir.as_deref());
    let time = TimeFormatter::new(config.ui.time);

    if args.list {
        let mut stdout = io::stdout().lock();
        return write_list(
            &mut stdout,
            &BackupLocator::new(naming),
            &args.file,
            args.json,
            &time,
        );
    }

    let options = SessionOptions {
        version_control: config.version_control(args.version_control.as_deref())?,
        naming,
    };
    let engine = config.engine(args.engine, args.context);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    let mut screen = Screen::new(terminal, TerminalKeys);
    screen.auto_confirm = !config.ui.confirm_cleanup;
    screen.time = time;
    screen.view.status_bar = config.ui.status_bar;
    screen.view.line_numbers = config.ui.line_numbers;

    let result = NavigationSession::start(&args.file, &options, engine, &mut screen)
        .with_context(|| format!("Cannot walk backups of {}", args.file.display()))
        .and_then(|session| run_app(&mut screen, App::new(session)));

    // Restore terminal
    disable_raw_mode()?;
    execute!(screen.terminal.backend_mut(), LeaveAlternateScreen)?;
    screen.terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }

    Ok(())
}

fn run_app<K: KeySource>(
    screen: &mut Screen<CrosstermBackend<io::Stdout>, K>,
    mut app: App,
) -> Result<()> {
    app.sync(screen);
    loop {
        screen.draw()?;

        if let Some(key) = screen.keys.next_key()? {
            app.handle_key(key, screen);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
