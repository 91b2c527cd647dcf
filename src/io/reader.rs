//! Endian-aware primitive reads over seekable byte storage.
//!
//! Formats like TIFF declare their byte order in the file header and every
//! multi-byte value after that must be decoded accordingly. Endianness is
//! therefore a per-call argument on every read; nothing in this module keeps
//! a global byte order.
//!
//! Two layers are provided:
//!
//! - [`ByteOrder`], whose methods decode integers and floats out of a
//!   prefetched buffer without further seeks.
//! - The [`ByteSource`] trait for random access over a file or an in-memory
//!   view, with [`FileSource`] and [`MemorySource`] implementations.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;

use crate::error::IoError;

// =============================================================================
// ByteOrder
// =============================================================================

/// Copy the first `N` bytes of a slice into a fixed array for decoding.
///
/// Panics if the slice is shorter than `N`; callers size their buffers from
/// the declared structure before decoding.
#[inline]
fn head<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    array.copy_from_slice(&bytes[..N]);
    array
}

/// Byte order (endianness) for multi-byte reads.
///
/// TIFF files declare their byte order in the first two bytes of the header
/// ("II" = Intel = little-endian, "MM" = Motorola = big-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Decode a u16 from the head of a byte slice.
    ///
    /// Panics if fewer than 2 bytes are available, as do the wider decoders
    /// below for their widths.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(head(bytes)),
            ByteOrder::BigEndian => u16::from_be_bytes(head(bytes)),
        }
    }

    /// Decode a u32 from the head of a byte slice.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(head(bytes)),
            ByteOrder::BigEndian => u32::from_be_bytes(head(bytes)),
        }
    }

    /// Decode a u64 from the head of a byte slice.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(head(bytes)),
            ByteOrder::BigEndian => u64::from_be_bytes(head(bytes)),
        }
    }

    /// Decode an i16 from the head of a byte slice.
    #[inline]
    pub fn read_i16(self, bytes: &[u8]) -> i16 {
        self.read_u16(bytes) as i16
    }

    /// Decode an i32 from the head of a byte slice.
    #[inline]
    pub fn read_i32(self, bytes: &[u8]) -> i32 {
        self.read_u32(bytes) as i32
    }

    /// Decode an i64 from the head of a byte slice.
    #[inline]
    pub fn read_i64(self, bytes: &[u8]) -> i64 {
        self.read_u64(bytes) as i64
    }

    /// Decode an IEEE-754 f32 from the head of a byte slice.
    #[inline]
    pub fn read_f32(self, bytes: &[u8]) -> f32 {
        f32::from_bits(self.read_u32(bytes))
    }

    /// Decode an IEEE-754 f64 from the head of a byte slice.
    #[inline]
    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        f64::from_bits(self.read_u64(bytes))
    }

    /// Encode a u16 in this byte order.
    #[inline]
    pub fn write_u16(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    /// Encode a u32 in this byte order.
    #[inline]
    pub fn write_u32(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    /// Encode a u64 in this byte order.
    #[inline]
    pub fn write_u64(self, value: u64) -> [u8; 8] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }
}

// =============================================================================
// ByteSource
// =============================================================================

/// Random access over seekable byte storage.
///
/// All multi-byte reads take the byte order as an argument; implementations
/// keep only a cursor. Reading past the end of the storage fails with
/// [`IoError::UnexpectedEof`] and leaves the cursor where the failed read
/// started.
pub trait ByteSource {
    /// Move the cursor to an absolute offset.
    fn seek(&mut self, offset: u64) -> Result<(), IoError>;

    /// Current cursor position.
    fn position(&self) -> u64;

    /// Total size of the storage in bytes.
    fn size(&self) -> u64;

    /// Read exactly `n` bytes, advancing the cursor.
    fn read_bytes(&mut self, n: usize) -> Result<Bytes, IoError>;

    /// Read a single byte.
    fn read_u8(&mut self) -> Result<u8, IoError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Read a signed byte.
    fn read_i8(&mut self) -> Result<i8, IoError> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a u16 in the given byte order.
    fn read_u16(&mut self, order: ByteOrder) -> Result<u16, IoError> {
        let bytes = self.read_bytes(2)?;
        Ok(order.read_u16(&bytes))
    }

    /// Read a u32 in the given byte order.
    fn read_u32(&mut self, order: ByteOrder) -> Result<u32, IoError> {
        let bytes = self.read_bytes(4)?;
        Ok(order.read_u32(&bytes))
    }

    /// Read a u64 in the given byte order.
    fn read_u64(&mut self, order: ByteOrder) -> Result<u64, IoError> {
        let bytes = self.read_bytes(8)?;
        Ok(order.read_u64(&bytes))
    }

    /// Read an i16 in the given byte order.
    fn read_i16(&mut self, order: ByteOrder) -> Result<i16, IoError> {
        Ok(self.read_u16(order)? as i16)
    }

    /// Read an i32 in the given byte order.
    fn read_i32(&mut self, order: ByteOrder) -> Result<i32, IoError> {
        Ok(self.read_u32(order)? as i32)
    }

    /// Read an i64 in the given byte order.
    fn read_i64(&mut self, order: ByteOrder) -> Result<i64, IoError> {
        Ok(self.read_u64(order)? as i64)
    }

    /// Read an IEEE-754 f32 in the given byte order.
    fn read_f32(&mut self, order: ByteOrder) -> Result<f32, IoError> {
        Ok(f32::from_bits(self.read_u32(order)?))
    }

    /// Read an IEEE-754 f64 in the given byte order.
    fn read_f64(&mut self, order: ByteOrder) -> Result<f64, IoError> {
        Ok(f64::from_bits(self.read_u64(order)?))
    }
}

// =============================================================================
// MemorySource
// =============================================================================

/// A [`ByteSource`] over an in-memory buffer.
///
/// Used for prefetched regions (an IFD read in one go can be decoded without
/// touching the file again) and for tests.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
    position: u64,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    /// Borrow the underlying buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl ByteSource for MemorySource {
    fn seek(&mut self, offset: u64) -> Result<(), IoError> {
        if offset > self.data.len() as u64 {
            return Err(IoError::SeekOutOfBounds {
                offset,
                size: self.data.len() as u64,
            });
        }
        self.position = offset;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_bytes(&mut self, n: usize) -> Result<Bytes, IoError> {
        let start = self.position as usize;
        let end = start.checked_add(n).ok_or(IoError::UnexpectedEof {
            offset: self.position,
            requested: n as u64,
            size: self.data.len() as u64,
        })?;
        if end > self.data.len() {
            return Err(IoError::UnexpectedEof {
                offset: self.position,
                requested: n as u64,
                size: self.data.len() as u64,
            });
        }
        self.position = end as u64;
        Ok(self.data.slice(start..end))
    }
}

// =============================================================================
// FileSource
// =============================================================================

/// A [`ByteSource`] over a local file.
pub struct FileSource {
    file: File,
    size: u64,
    position: u64,
}

impl FileSource {
    /// Open a file for random access reading.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file,
            size,
            position: 0,
        })
    }
}

impl ByteSource for FileSource {
    fn seek(&mut self, offset: u64) -> Result<(), IoError> {
        if offset > self.size {
            return Err(IoError::SeekOutOfBounds {
                offset,
                size: self.size,
            });
        }
        self.file.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_bytes(&mut self, n: usize) -> Result<Bytes, IoError> {
        if self.position + n as u64 > self.size {
            return Err(IoError::UnexpectedEof {
                offset: self.position,
                requested: n as u64,
                size: self.size,
            });
        }
        let mut buffer = vec![0u8; n];
        self.file.read_exact(&mut buffer)?;
        self.position += n as u64;
        Ok(Bytes::from(buffer))
    }
}

// =============================================================================
// Tests
// =============================================================================
