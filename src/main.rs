mod app;
mod error;
mod model;
mod msg;
mod plugin;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use app::{App, Outcome, RemoveOptions};
use model::config::SweepConfig;
use model::mode::Mode;
use plugin::CatalogChecker;

#[derive(Parser)]
#[command(
    name = "keyword-sweep",
    version,
    about = "Safely remove support:/lifecycle: keywords from dynamic plugin package.json files"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Repository root containing dynamic-plugins/ and catalog-entities/.
    #[arg(long, global = true, env = "KEYWORD_SWEEP_REPO_ROOT", default_value = ".")]
    repo_root: PathBuf,

    /// Extra config file applied on top of the user and repo config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Strip reserved keywords after a passing pre-flight check (default).
    Remove(RemoveArgs),
    /// Report catalog consistency for every wrapper without changing anything.
    Check,
}

#[derive(clap::Args, Default)]
struct RemoveArgs {
    /// Actually modify files. Without it the run is a dry run.
    #[arg(long, conflicts_with = "dry_run")]
    yes: bool,

    /// Show what would be changed without making changes.
    #[arg(long)]
    dry_run: bool,

    /// Only process this wrapper directory (repeatable).
    #[arg(long, value_name = "WRAPPER")]
    only: Vec<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to a file; stdout is reserved for the report.
    let _guard = init_logging(&cli.log_level);

    let repo_root = cli.repo_root;
    let config = SweepConfig::load(&repo_root, cli.config.as_deref())
        .context("failed to load configuration")?;
    let checker = CatalogChecker::new(config.clone());
    let mut app = App::new(repo_root, config, Box::new(checker), io::stdout().lock());

    match cli.command {
        Some(Commands::Check) => {
            let problems = app.check()?;
            Ok(exit_status(problems))
        }
        Some(Commands::Remove(args)) => remove(&mut app, args),
        None => remove(&mut app, RemoveArgs::default()),
    }
}

fn remove<W: io::Write>(app: &mut App<W>, args: RemoveArgs) -> Result<ExitCode> {
    let options = RemoveOptions {
        mode: Mode::from_flags(args.yes, args.dry_run),
        only: args.only,
    };

    let outcome = app.run(&options)?;
    tracing::debug!("run ended in phase {:?}", app.phase());

    match outcome {
        Outcome::Aborted { problems } => Ok(exit_status(problems)),
        Outcome::Done { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn exit_status(problems: usize) -> ExitCode {
    if problems > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(level: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyword_sweep={level}")));

    let log_dir = directories::ProjectDirs::from("", "", "keyword-sweep")
        .map(|d| d.data_dir().to_path_buf())
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .unwrap_or_else(std::env::temp_dir);

    let file_appender = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("keyword-sweep.log")
        .build(&log_dir)
    {
        Ok(appender) => appender,
        Err(err) => {
            eprintln!("keyword-sweep: file logging disabled: {err}");
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    Some(guard)
}
