//! Checksum accumulation over the input stream.
//!
//! Checksums are computed in a single pass: for stream-based modules the
//! dispatcher wraps the parse stream in a [`DigestTee`] so digest state
//! accumulates as the parser consumes bytes; for random-access modules the
//! dispatcher streams the file through the tee once before handing the module
//! its seekable source.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

// =============================================================================
// ChecksumAlgorithm
// =============================================================================

/// Checksum algorithms the engine can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChecksumAlgorithm {
    Crc32,
    Md5,
    Sha1,
    Sha256,
}

impl ChecksumAlgorithm {
    /// Canonical lower-case name, as used on the command line and in output.
    pub const fn name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Crc32 => "crc32",
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crc32" => Ok(ChecksumAlgorithm::Crc32),
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha1" | "sha-1" => Ok(ChecksumAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(ChecksumAlgorithm::Sha256),
            other => Err(format!("unknown checksum algorithm: {other}")),
        }
    }
}

/// A computed checksum: algorithm plus lower-case hex digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub value: String,
}

// =============================================================================
// Checksummer
// =============================================================================

/// Accumulates digest state for a selected set of algorithms.
pub struct Checksummer {
    crc32: Option<crc32fast::Hasher>,
    md5: Option<Md5>,
    sha1: Option<Sha1>,
    sha256: Option<Sha256>,
}

impl Checksummer {
    /// Create an accumulator for the given algorithms. Duplicates are harmless.
    pub fn new(algorithms: &[ChecksumAlgorithm]) -> Self {
        let has = |a: ChecksumAlgorithm| algorithms.contains(&a);
        Self {
            crc32: has(ChecksumAlgorithm::Crc32).then(crc32fast::Hasher::new),
            md5: has(ChecksumAlgorithm::Md5).then(Md5::new),
            sha1: has(ChecksumAlgorithm::Sha1).then(Sha1::new),
            sha256: has(ChecksumAlgorithm::Sha256).then(Sha256::new),
        }
    }

    /// True if no algorithm was selected.
    pub fn is_empty(&self) -> bool {
        self.crc32.is_none() && self.md5.is_none() && self.sha1.is_none() && self.sha256.is_none()
    }

    /// Feed a chunk of input into every active digest.
    pub fn update(&mut self, data: &[u8]) {
        if let Some(crc) = self.crc32.as_mut() {
            crc.update(data);
        }
        if let Some(md5) = self.md5.as_mut() {
            md5.update(data);
        }
        if let Some(sha1) = self.sha1.as_mut() {
            sha1.update(data);
        }
        if let Some(sha256) = self.sha256.as_mut() {
            sha256.update(data);
        }
    }

    /// Finish all digests and return them in algorithm order.
    pub fn finalize(self) -> Vec<Checksum> {
        let mut checksums = Vec::new();
        if let Some(crc) = self.crc32 {
            checksums.push(Checksum {
                algorithm: ChecksumAlgorithm::Crc32,
                value: format!("{:08x}", crc.finalize()),
            });
        }
        if let Some(md5) = self.md5 {
            checksums.push(Checksum {
                algorithm: ChecksumAlgorithm::Md5,
                value: hex_string(&md5.finalize()),
            });
        }
        if let Some(sha1) = self.sha1 {
            checksums.push(Checksum {
                algorithm: ChecksumAlgorithm::Sha1,
                value: hex_string(&sha1.finalize()),
            });
        }
        if let Some(sha256) = self.sha256 {
            checksums.push(Checksum {
                algorithm: ChecksumAlgorithm::Sha256,
                value: hex_string(&sha256.finalize()),
            });
        }
        checksums
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

// =============================================================================
// DigestTee
// =============================================================================

/// A [`Read`] adapter that feeds everything it reads into a [`Checksummer`].
pub struct DigestTee<R: Read> {
    inner: R,
    checksummer: Checksummer,
}

impl<R: Read> DigestTee<R> {
    pub fn new(inner: R, checksummer: Checksummer) -> Self {
        Self { inner, checksummer }
    }

    /// Consume the tee and return the accumulated checksums.
    pub fn finalize(self) -> Vec<Checksum> {
        self.checksummer.finalize()
    }
}

impl<R: Read> Read for DigestTee<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.checksummer.update(&buf[..n]);
        Ok(n)
    }
}

/// Stream an entire reader through a digest pass.
pub fn compute_checksums<R: Read>(
    reader: &mut R,
    algorithms: &[ChecksumAlgorithm],
) -> std::io::Result<Vec<Checksum>> {
    let mut checksummer = Checksummer::new(algorithms);
    if checksummer.is_empty() {
        return Ok(Vec::new());
    }
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        checksummer.update(&buffer[..n]);
    }
    Ok(checksummer.finalize())
}

// =============================================================================
// Tests
// =============================================================================
