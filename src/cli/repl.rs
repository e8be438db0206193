//! Command execution and the interactive loop.

use super::command::Command;
use crate::models::SyncAction;
use crate::services::NoteStore;
use crate::{Error, Result};

/// Prompt shown before each interactive command.
pub const PROMPT: &str = "[fnote]# ";
/// Printed after a successful mutation.
pub const SUCCEED: &str = "Succeed.";
/// Printed when `add` hits an existing key.
pub const DUPLICATE_KEY: &str = "Duplicate key.";

const BANNER: &str = "=================";
const HELP: &[&str] = &[
    "find <keywords>          search keys (all keywords, any case)",
    "add <key>:<value>        add a note",
    "del [-f] [-a] <keyword>  delete (-f: no confirmation, -a: fuzzy match)",
    "fdel <keyword>           delete without confirmation",
    "mod <key>:<value>        replace the note with the same key",
    "sync                     synchronize with the backup now",
    "exit                     quit",
];

/// What the loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command.
    Continue,
    /// Leave the loop.
    Exit,
}

/// Runs one command against `store`, reporting through its terminal.
///
/// # Errors
///
/// Returns the store error for a failed operation. A duplicate key on `add`
/// is reported to the terminal and is not an error.
pub fn execute(store: &NoteStore, command: Command) -> Result<Flow> {
    let terminal = store.terminal();
    match command {
        Command::Find(keyword) => {
            store.find(&keyword, true, false, true)?;
        },
        Command::Add(note) => match store.add(&note) {
            Ok(()) => terminal.emit(SUCCEED),
            Err(Error::DuplicateKey(_)) => terminal.emit(DUPLICATE_KEY),
            Err(e) => return Err(e),
        },
        Command::Delete {
            keyword,
            confirm,
            accurate,
        } => {
            store.delete(&keyword, confirm, accurate)?;
            terminal.emit(SUCCEED);
        },
        Command::Modify(note) => {
            store.modify(&note)?;
            terminal.emit(SUCCEED);
        },
        Command::Sync => {
            if !store.sync_enabled() {
                terminal.emit("Backup disabled.");
                return Ok(Flow::Continue);
            }
            let message = match store.check()? {
                SyncAction::Pull(notes) => format!("Pulled {} notes.", notes.len()),
                SyncAction::Push(notes) => format!("Pushed {} notes.", notes.len()),
                SyncAction::NoOp => "Already in sync.".to_string(),
            };
            terminal.emit(&message);
        },
        Command::Help => {
            for line in HELP {
                terminal.emit(line);
            }
        },
        Command::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

/// Parses and runs one input line.
///
/// # Errors
///
/// Returns a parse error or the command's error.
pub fn run_line(store: &NoteStore, line: &str) -> Result<Flow> {
    match Command::parse(line)? {
        Some(command) => execute(store, command),
        None => Ok(Flow::Continue),
    }
}

/// Reads commands from the store's terminal until `exit` or end of input.
///
/// Errors are reported and the loop continues.
pub fn run_repl(store: &NoteStore) {
    let terminal = store.terminal();
    terminal.emit(BANNER);
    terminal.emit("Welcome to fnote!");
    terminal.emit(BANNER);

    loop {
        terminal.prompt(PROMPT);
        let line = match terminal.read_line() {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "Input closed");
                break;
            },
        };

        match run_line(store, &line) {
            Ok(Flow::Continue) => {},
            Ok(Flow::Exit) => break,
            Err(e) => {
                tracing::warn!(input = %line, error = %e, "Command failed");
                terminal.emit(&format!("Error: {e}"));
            },
        }
    }
}
