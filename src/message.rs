//! Structured, code-identified diagnostics.
//!
//! Every diagnostic a module raises carries a stable short id (for example
//! `TIFF-HUL-2`). The ids are a public interface: tools downstream match on
//! them, so an id must never change meaning across releases. The formatted
//! text may be reworded; the id may not.

use std::fmt;

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity, in rising order.
///
/// - `Info`: observation, does not affect well-formed/valid status.
/// - `Warning`: tolerated deviation; the file stays well-formed and valid.
/// - `Error`: the file is well-formed but not valid.
/// - `Fatal`: the file is not well-formed; the module stops chaining further
///   but still returns its RepInfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal",
        }
    }
}

// =============================================================================
// Message
// =============================================================================

/// A diagnostic with a stable id, formatted text, and optional source offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Stable short code, e.g. `TIFF-HUL-2`.
    pub id: &'static str,
    /// Formatted message text; substitution parameters are bound at creation.
    pub text: String,
    pub severity: Severity,
    /// Absolute byte position in the source, when known.
    pub offset: Option<u64>,
    /// Nested detail, e.g. the specific value that failed.
    pub sub_message: Option<String>,
}

impl Message {
    pub fn new(id: &'static str, text: impl Into<String>, severity: Severity) -> Self {
        Self {
            id,
            text: text.into(),
            severity,
            offset: None,
            sub_message: None,
        }
    }

    pub fn info(id: &'static str, text: impl Into<String>) -> Self {
        Self::new(id, text, Severity::Info)
    }

    pub fn warning(id: &'static str, text: impl Into<String>) -> Self {
        Self::new(id, text, Severity::Warning)
    }

    pub fn error(id: &'static str, text: impl Into<String>) -> Self {
        Self::new(id, text, Severity::Error)
    }

    pub fn fatal(id: &'static str, text: impl Into<String>) -> Self {
        Self::new(id, text, Severity::Fatal)
    }

    /// Attach the absolute byte offset the diagnostic refers to.
    pub fn at_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Attach nested detail.
    pub fn with_sub_message(mut self, sub: impl Into<String>) -> Self {
        self.sub_message = Some(sub.into());
        self
    }

    /// Re-issue this message at a different severity, keeping id and text.
    ///
    /// Used by suppress-errors mode, which downgrades a Fatal to an Info.
    pub fn downgraded_to(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.text)?;
        if let Some(offset) = self.offset {
            write!(f, " (offset {offset})")?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
