//! Per-file result container.
//!
//! A [`RepInfo`] carries the full outcome of one file's characterization:
//! status, messages, properties, and checksums. It holds no parsing logic;
//! the only behavior is the coupling between recorded messages and the
//! three-valued status fields.

use chrono::{DateTime, Utc};

use crate::io::Checksum;
use crate::message::{Message, Severity};
use crate::property::Property;

// =============================================================================
// Validity
// =============================================================================

/// Three-valued status for well-formedness and validity.
///
/// `Undetermined` is distinct from `False`: a file that was never parsed is
/// undetermined, a file that failed parsing is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validity {
    True,
    False,
    #[default]
    Undetermined,
}

impl Validity {
    pub const fn label(self) -> &'static str {
        match self {
            Validity::True => "true",
            Validity::False => "false",
            Validity::Undetermined => "undetermined",
        }
    }
}

// =============================================================================
// RepInfo
// =============================================================================

/// Representation information for a single file.
///
/// Messages and properties are kept in discovery order.
#[derive(Debug, Default)]
pub struct RepInfo {
    /// URI of the object, derived from the input path.
    pub uri: String,
    /// Name of the module that produced this report.
    pub module_name: Option<String>,
    /// Release of the module that produced this report.
    pub module_release: Option<String>,
    pub format: Option<String>,
    pub version: Option<String>,
    pub mime_type: Option<String>,
    /// File size in bytes, when known.
    pub size: Option<u64>,
    pub created: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Names of the modules whose signature check accepted the file.
    pub sig_match: Vec<String>,

    well_formed: Validity,
    valid: Validity,
    properties: Vec<Property>,
    messages: Vec<Message>,
    checksums: Vec<Checksum>,
}

impl RepInfo {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn well_formed(&self) -> Validity {
        self.well_formed
    }

    pub fn valid(&self) -> Validity {
        self.valid
    }

    /// Set the well-formed status.
    ///
    /// A file that is not well-formed cannot be valid, so setting `False`
    /// here also forces `valid` to `False`.
    pub fn set_well_formed(&mut self, status: Validity) {
        self.well_formed = status;
        if status == Validity::False {
            self.valid = Validity::False;
        }
    }

    pub fn set_valid(&mut self, status: Validity) {
        self.valid = status;
    }

    /// Record a diagnostic, downgrading status as its severity requires:
    /// an Error makes the file invalid, a Fatal makes it not well-formed.
    pub fn add_message(&mut self, message: Message) {
        match message.severity {
            Severity::Info | Severity::Warning => {}
            Severity::Error => self.set_valid(Validity::False),
            Severity::Fatal => self.set_well_formed(Validity::False),
        }
        self.messages.push(message);
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Find a property by name anywhere in the tree.
    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find_map(|p| p.find(name))
    }

    pub fn set_checksums(&mut self, checksums: Vec<Checksum>) {
        self.checksums = checksums;
    }

    pub fn checksums(&self) -> &[Checksum] {
        &self.checksums
    }

    /// Record the producing module's identity.
    pub fn set_module(&mut self, name: &str, release: &str) {
        self.module_name = Some(name.to_string());
        self.module_release = Some(release.to_string());
    }

    /// True if any recorded message has the given severity.
    pub fn has_message_with_severity(&self, severity: Severity) -> bool {
        self.messages.iter().any(|m| m.severity == severity)
    }
}

// =============================================================================
// Tests
// =============================================================================
