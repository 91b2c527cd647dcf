//! Configuration for the command-line front-end.
//!
//! Options come from command-line arguments with environment-variable
//! fallbacks under the `WF_` prefix. Everything has a default except the
//! input paths.

use std::path::PathBuf;

use clap::Parser;

use crate::io::ChecksumAlgorithm;

/// Default output handler name.
pub const DEFAULT_HANDLER: &str = "text";

/// Characterize files for digital preservation.
///
/// For each input path (file or directory), identifies the format by
/// signature, validates the structure, and reports technical metadata
/// through the selected output handler.
#[derive(Parser, Debug, Clone)]
#[command(name = "wellformed")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Files or directories to characterize. Directories are walked
    /// depth-first in name order.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Pin a specific module by name instead of signature-based selection.
    #[arg(short, long, env = "WF_MODULE")]
    pub module: Option<String>,

    /// Output handler: text or json.
    #[arg(long, default_value = DEFAULT_HANDLER, env = "WF_HANDLER")]
    pub handler: String,

    /// Write output to a file instead of stdout.
    #[arg(short, long, env = "WF_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Emit bitfield and enumeration properties as raw integers, not labels.
    #[arg(long)]
    pub raw: bool,

    /// Stop after the signature check; skip parsing and checksums.
    #[arg(short, long)]
    pub signature: bool,

    /// Checksum algorithms to compute (comma-separated):
    /// crc32, md5, sha1, sha256.
    #[arg(long, value_delimiter = ',', env = "WF_CHECKSUM")]
    pub checksum: Vec<String>,

    /// Module-specific parameters, e.g. byteoffset=valid.
    #[arg(short, long)]
    pub param: Vec<String>,

    /// Downgrade fatal parse errors to informational messages.
    #[arg(long)]
    pub suppress_errors: bool,

    /// Include low-level segment detail in the output.
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub debug: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.handler != "text" && self.handler != "json" {
            return Err(format!(
                "unknown handler: {} (expected text or json)",
                self.handler
            ));
        }
        self.checksum_algorithms()?;
        Ok(())
    }

    /// Parse the selected checksum algorithm names.
    pub fn checksum_algorithms(&self) -> Result<Vec<ChecksumAlgorithm>, String> {
        self.checksum.iter().map(|s| s.parse()).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
