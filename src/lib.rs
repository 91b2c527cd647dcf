//! wellformed - a format identification, validation, and characterization
//! engine for digital preservation.
//!
//! Given a byte stream purporting to be a file of some format, the engine
//! answers three questions: is it recognizable as that format (well-formed),
//! does it conform to the format's rules (valid), and what technical
//! metadata does it carry? Results are emitted through pluggable output
//! handlers.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod io;
pub mod message;
pub mod module;
pub mod niso;
pub mod property;
pub mod repinfo;
pub mod signature;
pub mod tiff;

// Re-export commonly used types
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{IoError, TiffError};
pub use handler::{
    double_array, integer_array, rational_array, rational_array_pairs, App, Indent, OutputHandler,
};
pub use handlers::{status_label, JsonHandler, TextHandler};
pub use io::{
    compute_checksums, Checksum, ChecksumAlgorithm, Checksummer, DigestTee, ByteOrder, ByteSource,
    FileSource, MemorySource,
};
pub use message::{Message, Severity};
pub use module::{FormatModule, ModuleDescriptor, ParseOptions};
pub use niso::NisoImageMetadata;
pub use property::{Property, PropertyArity, PropertyValue, Rational};
pub use repinfo::{RepInfo, Validity};
pub use signature::{rank_candidates, required_prefix_len, Candidate, MatchBasis, Signature, SignatureUse};
pub use tiff::{TiffModule, TIFF_HEADER_SIZE};
