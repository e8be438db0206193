//! Binary entry point for fnote.
//!
//! Without a subcommand, starts the interactive loop.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use fnote::cli::{self, Command};
use fnote::io::{StdTerminal, Terminal};
use fnote::observability::{self, LogSettings};
use fnote::services::TerminalNotifier;
use fnote::{Note, NoteConfig, NoteContext};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Longest wait for pending background syncs before exiting.
const SHUTDOWN_SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// fnote - a personal key:value note store with backup sync.
#[derive(Parser)]
#[command(name = "fnote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "FNOTE_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Search keys (every keyword must appear, any case).
    Find {
        /// Keywords.
        keywords: Vec<String>,
    },

    /// Add a note.
    Add {
        /// The note, as key:value.
        note: String,
    },

    /// Delete notes.
    Del {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        fast: bool,

        /// Match keys fuzzily instead of exactly.
        #[arg(short, long)]
        all: bool,

        /// Key or keywords to delete.
        #[arg(required = true)]
        keyword: Vec<String>,
    },

    /// Replace the note with the same key.
    Mod {
        /// The note, as key:value.
        note: String,
    },

    /// Synchronize with the backup now.
    Sync,

    /// Start the interactive loop.
    Repl,
}

impl Commands {
    fn into_command(self) -> Option<Command> {
        match self {
            Self::Find { keywords } => Some(Command::Find(keywords.join(" "))),
            Self::Add { note } => Some(Command::Add(Note::from(note))),
            Self::Del {
                fast,
                all,
                keyword,
            } => Some(Command::Delete {
                keyword: keyword.join(" "),
                confirm: !fast,
                accurate: !all,
            }),
            Self::Mod { note } => Some(Command::Modify(Note::from(note))),
            Self::Sync => Some(Command::Sync),
            Self::Repl => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match NoteConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(LogSettings::from_config(&config.logging, cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let command = cli.command.and_then(Commands::into_command);
    let result = run(config, command).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Builds the context and runs one command, or the interactive loop when
/// `command` is `None`.
async fn run(config: NoteConfig, command: Option<Command>) -> fnote::Result<()> {
    let terminal: Arc<dyn Terminal> = Arc::new(StdTerminal::new());

    let startup = {
        let config = config.clone();
        let terminal = Arc::clone(&terminal);
        tokio::task::spawn_blocking(move || NoteContext::open(&config, terminal))
    };
    let context = startup.await.map_err(task_error)?;
    let store = context.store().clone();

    let outcome = match command {
        Some(command) => {
            let store = store.clone();
            tokio::task::spawn_blocking(move || cli::execute(&store, command).map(|_| ()))
                .await
                .map_err(task_error)?
        },
        None => {
            let reminder = config.reminder.enabled.then(|| {
                let notifier = Arc::new(TerminalNotifier::new(Arc::clone(&terminal)));
                context.reminder(notifier).spawn(config.reminder.interval)
            });

            let repl_store = store.clone();
            let result = tokio::task::spawn_blocking(move || cli::run_repl(&repl_store))
                .await
                .map_err(task_error);

            if let Some(reminder) = reminder {
                reminder.abort();
            }
            result
        },
    };

    if !store
        .background()
        .wait_idle_timeout(SHUTDOWN_SYNC_TIMEOUT)
        .await
    {
        tracing::warn!(
            pending = store.background().in_flight(),
            "Exiting with background syncs still running"
        );
    }

    outcome
}

#[allow(clippy::needless_pass_by_value)]
fn task_error(e: tokio::task::JoinError) -> fnote::Error {
    fnote::Error::InvalidInput(format!("task failed: {e}"))
}
