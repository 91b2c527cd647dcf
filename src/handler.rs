//! The interface the core exposes to output serializers.
//!
//! Handlers consume RepInfo trees and render them; they never mutate what
//! they are shown. Directory-traversal callbacks and `analyze` have no-op
//! defaults, which is sufficient for most handlers.

use crate::module::ModuleDescriptor;
use crate::property::Rational;
use crate::repinfo::RepInfo;

// =============================================================================
// App
// =============================================================================

/// Identity of the hosting application, for handler self-description output.
#[derive(Debug, Clone)]
pub struct App {
    pub name: &'static str,
    pub release: &'static str,
    /// Release date, ISO `YYYY-MM-DD`.
    pub date: &'static str,
}

impl App {
    pub fn new(name: &'static str, release: &'static str, date: &'static str) -> Self {
        Self {
            name,
            release,
            date,
        }
    }
}

// =============================================================================
// OutputHandler
// =============================================================================

/// An output serializer.
///
/// The dispatcher calls `show_header` once, then per input some combination
/// of the directory callbacks and `show_info`, then `show_footer` and
/// `close`.
pub trait OutputHandler {
    /// Short name the handler is selected by (e.g. "text", "json").
    fn name(&self) -> &'static str;

    /// Initial output, suitable for framing multiple files.
    fn show_header(&mut self);

    /// Final output, closing the frame opened by `show_header`.
    fn show_footer(&mut self);

    /// Render the outcome of one file's characterization.
    fn show_info(&mut self, info: &RepInfo);

    /// Render a module's self-description.
    fn show_module(&mut self, module: &ModuleDescriptor);

    /// Render this handler's own self-description.
    fn show_handler(&mut self) {}

    /// Render the application's self-description.
    fn show_app(&mut self, app: &App);

    /// Last-chance hook before emission; read-only analysis.
    fn analyze(&mut self, _info: &RepInfo) {}

    /// Called when the dispatcher enters a directory.
    fn start_directory(&mut self, _path: &str) {}

    /// Called when the dispatcher leaves a directory.
    fn end_directory(&mut self) {}

    /// Veto hook: return false to skip a file.
    fn ok_to_process(&mut self, _path: &str) -> bool {
        true
    }

    /// Flush and release the output writer.
    fn close(&mut self);
}

// =============================================================================
// Indentation
// =============================================================================

/// Nesting counter for handlers that render indented output.
#[derive(Debug, Default, Clone)]
pub struct Indent {
    level: usize,
}

impl Indent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.level += 1;
    }

    pub fn pop(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// The margin string for the current nesting level.
    pub fn margin(&self) -> String {
        " ".repeat(self.level * 2)
    }
}

// =============================================================================
// Array formatting helpers
// =============================================================================
//
// Shared renderings for array-valued properties, space-separated.

/// Space-separated integers.
pub fn integer_array(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Space-separated doubles.
pub fn double_array(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rationals evaluated as doubles, space-separated.
pub fn rational_array(values: &[Rational]) -> String {
    values
        .iter()
        .map(|r| r.to_f64().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rationals as integer pairs, space-separated: `num den num den ...`.
pub fn rational_array_pairs(values: &[Rational]) -> String {
    let mut parts = Vec::with_capacity(values.len() * 2);
    for r in values {
        parts.push(r.numerator().to_string());
        parts.push(r.denominator().to_string());
    }
    parts.join(" ")
}

// =============================================================================
// Tests
// =============================================================================
