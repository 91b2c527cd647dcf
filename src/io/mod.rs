//! Byte-level input: endian-aware reads over seekable storage, plus checksum
//! accumulation over the input stream.

mod digest;
mod reader;

pub use digest::{
    compute_checksums, Checksum, ChecksumAlgorithm, Checksummer, DigestTee,
};
pub use reader::{ByteOrder, ByteSource, FileSource, MemorySource};
