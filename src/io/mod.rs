//! Terminal I/O collaborators.
//!
//! The note store never touches stdin/stdout directly. It writes previews to a
//! [`Terminal`] and reads confirmations from it, so tests and embedders can
//! substitute [`ScriptedTerminal`] for [`StdTerminal`].

mod terminal;

pub use terminal::{ScriptedTerminal, StdTerminal, Terminal};
