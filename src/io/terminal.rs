//! Standard-output sink and standard-input source.

// The terminal is the one place that prints to stdout.
#![allow(clippy::print_stdout)]

use crate::{Error, Result};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// Line-oriented user terminal.
pub trait Terminal: Send + Sync {
    /// Writes one line of output.
    fn emit(&self, line: &str);

    /// Reads one line of input with surrounding whitespace trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be read or is exhausted.
    fn read_line(&self) -> Result<String>;

    /// Writes a prompt without a trailing newline. Defaults to [`Terminal::emit`].
    fn prompt(&self, text: &str) {
        self.emit(text);
    }
}

/// Terminal over the process stdin/stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdTerminal;

impl StdTerminal {
    /// Creates a stdio terminal.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Terminal for StdTerminal {
    fn emit(&self, line: &str) {
        println!("{line}");
    }

    fn read_line(&self) -> Result<String> {
        let mut input = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| Error::InvalidInput(format!("read stdin: {e}")))?;
        if read == 0 {
            return Err(Error::InvalidInput("end of input".to_string()));
        }
        Ok(input.trim().to_string())
    }

    fn prompt(&self, text: &str) {
        print!("{text}");
        let _ = io::stdout().flush();
    }
}

/// Terminal fed from a fixed script of input lines, recording all output.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    input: Mutex<VecDeque<String>>,
    output: Mutex<Vec<String>>,
}

impl ScriptedTerminal {
    /// Creates a terminal that will answer reads with `lines`, in order.
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: Mutex::new(lines.into_iter().map(Into::into).collect()),
            output: Mutex::new(Vec::new()),
        }
    }

    /// Queues another input line.
    pub fn push_input(&self, line: impl Into<String>) {
        if let Ok(mut input) = self.input.lock() {
            input.push_back(line.into());
        }
    }

    /// Returns every line emitted so far.
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        self.output
            .lock()
            .map(|output| output.clone())
            .unwrap_or_default()
    }

    /// Clears the recorded output.
    pub fn clear_output(&self) {
        if let Ok(mut output) = self.output.lock() {
            output.clear();
        }
    }
}

impl Terminal for ScriptedTerminal {
    fn emit(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            output.push(line.to_string());
        }
    }

    fn read_line(&self) -> Result<String> {
        let mut input = self
            .input
            .lock()
            .map_err(|e| Error::InvalidInput(format!("terminal lock: {e}")))?;
        input
            .pop_front()
            .map(|line| line.trim().to_string())
            .ok_or_else(|| Error::InvalidInput("end of input".to_string()))
    }
}
