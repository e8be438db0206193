//! Command-line interface.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `find` | Fuzzy search over keys |
//! | `add` | Add a note, rejecting duplicate keys |
//! | `del` / `fdel` | Delete notes, with or without confirmation |
//! | `mod` | Replace a note by key |
//! | `sync` | Reconcile with the backup now |
//! | `exit` | Leave the interactive loop |
//!
//! The same grammar drives the interactive loop and the one-shot
//! subcommands of the binary.
//!
//! # Example Usage
//!
//! ```bash
//! fnote add "wifi-home:hunter2"
//! fnote find wifi
//! fnote del --all wifi
//! fnote            # interactive
//! ```

mod command;
mod repl;

pub use command::Command;
pub use repl::{DUPLICATE_KEY, Flow, PROMPT, SUCCEED, execute, run_line, run_repl};
