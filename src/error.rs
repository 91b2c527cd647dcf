use thiserror::Error;

use crate::message::Message;

/// I/O errors raised by the byte-source layer.
#[derive(Debug, Error)]
pub enum IoError {
    /// Read past the end of the underlying storage.
    #[error("unexpected end of input: requested {requested} bytes at offset {offset}, size is {size}")]
    UnexpectedEof {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Seek target outside the underlying storage.
    #[error("seek out of bounds: offset {offset}, size is {size}")]
    SeekOutOfBounds { offset: u64, size: u64 },

    /// Error from the operating system.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fatal condition raised inside the TIFF parser.
///
/// Parsing routines return this instead of unwinding; the module's outermost
/// parse loop converts it into a Fatal message on the RepInfo. The message
/// carries the stable id and, where known, the byte offset of the problem.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TiffError {
    pub message: Message,
}

impl TiffError {
    /// Wrap a message as a fatal parse error.
    pub fn new(message: Message) -> Self {
        Self { message }
    }
}

impl From<Message> for TiffError {
    fn from(message: Message) -> Self {
        Self::new(message)
    }
}
