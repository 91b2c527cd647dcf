//! The contract every format parser implements.
//!
//! A module is instantiated once per worker and reused across files: its
//! descriptor is static, its per-file state is cleared by [`FormatModule::reset`]
//! between parses. Modules never let a failure escape to the dispatcher; every
//! failure becomes a Fatal message on the RepInfo.

use std::io::Read;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::IoError;
use crate::io::ByteSource;
use crate::message::Message;
use crate::repinfo::RepInfo;
use crate::signature::Signature;

// =============================================================================
// ModuleDescriptor
// =============================================================================

/// Static metadata identifying a module. Identity is `(name, release)`.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub release: &'static str,
    /// Release date, ISO `YYYY-MM-DD`.
    pub date: &'static str,
    /// Formats the module accepts (e.g. "TIFF").
    pub formats: Vec<&'static str>,
    pub mime_types: Vec<&'static str>,
    /// Signatures declared for identification.
    pub signatures: Vec<Signature>,
    pub vendor: &'static str,
    /// Reference documents the validation is based on.
    pub specifications: Vec<&'static str>,
    pub note: &'static str,
    pub rights: &'static str,
}

// =============================================================================
// ParseOptions
// =============================================================================

/// Host-controlled options every module must honor.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Emit bitfield and enumeration properties as raw integers, not labels.
    pub raw: bool,
    /// Include low-level segment detail.
    pub verbose: bool,
    /// Downgrade fatal parse exceptions to Info and stop chaining instead of
    /// reporting the file as not well-formed.
    pub suppress_errors: bool,
    /// Cooperative abort flag, checked at safe points between parse units.
    pub abort: Arc<AtomicBool>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            raw: false,
            verbose: false,
            suppress_errors: false,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }
}

// =============================================================================
// FormatModule
// =============================================================================

/// A format parser.
///
/// The dispatcher drives the lifecycle: `reset`, then `check_signatures`,
/// then one of the parse entry points. Stream-oriented formats implement
/// [`FormatModule::parse`], which may request re-invocation with a fresh
/// stream by returning a nonzero index. Seek-heavy formats implement
/// [`FormatModule::parse_random_access`] and declare
/// [`FormatModule::is_random_access`]; the dispatcher refuses to call it on
/// non-seekable input.
pub trait FormatModule {
    fn descriptor(&self) -> &ModuleDescriptor;

    /// True if the module needs seekable input.
    fn is_random_access(&self) -> bool {
        false
    }

    /// Apply host-controlled options. Called before each parse.
    fn set_options(&mut self, options: ParseOptions);

    /// Set a module-specific parameter string. Unknown parameters are ignored.
    fn set_parameter(&mut self, _parameter: &str) {}

    /// Clear per-file state. Idempotent.
    fn reset(&mut self);

    /// Non-destructive signature check.
    ///
    /// Reads at most as far as the longest declared signature and seeks back
    /// to where it started. On a match, appends the module name to
    /// `info.sig_match` and leaves `valid` undetermined; on a mismatch, sets
    /// `well_formed` to `False`.
    fn check_signatures(
        &mut self,
        path: &Path,
        source: &mut dyn ByteSource,
        info: &mut RepInfo,
    ) -> Result<(), IoError>;

    /// Parse a stream, populating `info`.
    ///
    /// Returns 0 when the file has been fully characterized, or a nonzero
    /// index to request re-invocation with a fresh stream on the same file.
    /// All failures are recorded on `info`; this method does not fail.
    fn parse(&mut self, _stream: &mut dyn Read, info: &mut RepInfo, _parse_index: u32) -> u32 {
        info.add_message(Message::fatal(
            "PKG-3",
            format!(
                "Module {} does not support stream parsing",
                self.descriptor().name
            ),
        ));
        0
    }

    /// Parse seekable input, populating `info`.
    ///
    /// Only called when [`FormatModule::is_random_access`] is true. All
    /// failures are recorded on `info`; this method does not fail.
    fn parse_random_access(&mut self, _source: &mut dyn ByteSource, info: &mut RepInfo) {
        info.add_message(Message::fatal(
            "PKG-3",
            format!(
                "Module {} does not support random-access parsing",
                self.descriptor().name
            ),
        ));
    }
}

// =============================================================================
// Tests
// =============================================================================
