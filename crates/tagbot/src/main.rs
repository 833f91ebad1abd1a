//! Tag bot binary
//!
//! `tagbot run` polls the directory-backed forum forever under the
//! supervisor; `tagbot render` normalises an index page offline; `tagbot
//! config` prints the effective (redacted) configuration.

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tagbot_core::{Config, TagName, rerender};
use tagbot_dispatch::{Paced, Supervisor, ThreadSleep};
use tagbot_storage::FsForum;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tagbot")]
#[command(version, about = "Keeps per-tag wiki index pages up to date from tag commands")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Poll the forum and process commands (default)
    Run {
        /// Directory holding the forum store (overrides TAGBOT_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Re-render an index page file and print the result
    Render {
        /// Index page to read
        file: PathBuf,

        /// Tag the page belongs to (used for the title heading)
        #[arg(long)]
        tag: String,

        /// Overwrite the file instead of printing
        #[arg(long)]
        write: bool,
    },
    /// Show configuration
    Config,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::from_env();

    if cli.verbose {
        tracing::info!("Configuration loaded: {:?}", config);
    }

    match cli.command.unwrap_or(Commands::Run {
        data_dir: None,
        once: false,
    }) {
        Commands::Run { data_dir, once } => run(config, data_dir, once),
        Commands::Render { file, tag, write } => match render_file(&file, &tag, write) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("render failed: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Config => {
            println!("{config:#?}");
            ExitCode::SUCCESS
        }
    }
}

fn run(mut config: Config, data_dir: Option<PathBuf>, once: bool) -> ExitCode {
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    tracing::info!(
        subreddit = config.subreddit.as_str(),
        data_dir = %config.data_dir.display(),
        "starting tag bot"
    );

    let dir = config.data_dir.clone();
    let pacing = config.pacing();
    let mut supervisor = Supervisor::new(config, ThreadSleep);
    if once {
        supervisor = supervisor.with_limit(1);
    }
    let report = supervisor.run(|| {
        FsForum::open(&dir)
            .map(|forum| Paced::new(forum, pacing))
            .map_err(Into::into)
    });

    if once && report.cycles == 0 {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn render_file(file: &Path, tag: &str, write: bool) -> std::io::Result<()> {
    let text = fs::read_to_string(file)?;
    let rendered = rerender(&text, TagName::new(tag).display());
    if write {
        fs::write(file, rendered)?;
        tracing::info!(file = %file.display(), "index page rewritten");
    } else {
        print!("{rendered}");
    }
    Ok(())
}
