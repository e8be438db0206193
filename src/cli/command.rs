//! Interactive command grammar.
//!
//! ```text
//! find <keywords>          fuzzy search, prints matches
//! add <key>:<value>        append, rejected when the key exists
//! del [-f] [-a] <keyword>  delete; -f skips confirmation, -a matches fuzzily
//! fdel <keyword>           same as del -f
//! mod <key>:<value>        replace the note with the same key
//! sync                     reconcile with the backup now
//! help                     list commands
//! exit                     leave
//! ```

use crate::models::Note;
use crate::{Error, Result};

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fuzzy search.
    Find(String),
    /// Append a note with a new key.
    Add(Note),
    /// Delete matching notes.
    Delete {
        /// Keyword to match.
        keyword: String,
        /// Ask before deleting.
        confirm: bool,
        /// Exact key match instead of fuzzy.
        accurate: bool,
    },
    /// Replace by key.
    Modify(Note),
    /// Run a sync now.
    Sync,
    /// Show the command list.
    Help,
    /// Leave the interactive loop.
    Exit,
}

impl Command {
    /// Parses one input line. Blank input yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown command or a missing
    /// argument.
    pub fn parse(input: &str) -> Result<Option<Self>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        let (name, rest) = split_word(input);

        let command = match name {
            "find" => Self::Find(rest.to_string()),
            "add" => Self::Add(Note::from(require(rest, "add needs key:value")?)),
            "mod" => Self::Modify(Note::from(require(rest, "mod needs key:value")?)),
            "del" => parse_delete(rest, true)?,
            "fdel" => parse_delete(rest, false)?,
            "sync" => Self::Sync,
            "help" | "?" => Self::Help,
            "exit" | "quit" => Self::Exit,
            other => {
                return Err(Error::InvalidInput(format!("unknown command: {other}")));
            },
        };
        Ok(Some(command))
    }
}

fn parse_delete(args: &str, mut confirm: bool) -> Result<Command> {
    let mut accurate = true;
    let mut rest = args;
    loop {
        let (flag, tail) = split_word(rest);
        match flag {
            "-f" => confirm = false,
            "-a" => accurate = false,
            _ => break,
        }
        rest = tail;
    }
    Ok(Command::Delete {
        keyword: require(rest, "del needs a keyword")?.to_string(),
        confirm,
        accurate,
    })
}

fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

fn require<'a>(arg: &'a str, message: &str) -> Result<&'a str> {
    let arg = arg.trim();
    if arg.is_empty() {
        Err(Error::InvalidInput(message.to_string()))
    } else {
        Ok(arg)
    }
}
