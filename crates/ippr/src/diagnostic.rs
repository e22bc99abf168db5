//! Fatal-error reports for the diagnostic stream.
//!
//! Every fatal condition produces one report on the diagnostic stream
//! before the process terminates. A report carries the error message,
//! optionally the site the execution engine was at when the condition
//! fired, and any number of extra notes.

use std::fmt;

/// Where execution was when a fatal condition fired.
#[derive(Debug, Clone, Copy)]
pub struct Site {
    /// The faulting instruction's source-order key.
    pub order: u32,
    /// The faulting instruction's mnemonic.
    pub opcode: &'static str,
}

/// A renderable error report.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    message: String,
    site: Option<Site>,
    notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            site: None,
            notes: Vec::new(),
        }
    }

    /// Attach the faulting instruction.
    pub fn with_site(mut self, site: Site) -> Self {
        self.site = Some(site);
        self
    }

    /// Add a note below the report.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}", self.message)?;
        if let Some(site) = self.site {
            write!(f, "\n  --> order {} ({})", site.order, site.opcode)?;
        }
        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }
        Ok(())
    }
}
