//! Typed readers for TIFF tag values.
//!
//! Readers seek to the absolute offset they are handed; for inline values
//! that offset is the position of the entry's own value field, so the same
//! code path serves both storage modes. Every multi-byte decode goes through
//! the byte order threaded in from the file header.
//!
//! ASCII values are NUL-terminated; bytes outside printable ASCII are
//! percent-escaped as `%XX` because their encoding is unknown.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::{ByteOrder, ByteSource};
use crate::property::Rational;
use crate::tiff::messages;
use crate::tiff::tags::FieldType;

// =============================================================================
// Count and type checks
// =============================================================================

/// Reject a count below the minimum the tag requires.
pub fn check_count(tag: u16, count: u32, min_count: u32) -> Result<(), TiffError> {
    if count < min_count {
        return Err(messages::bad_count(tag, u64::from(min_count), u64::from(count)).into());
    }
    Ok(())
}

/// Reject a count that exceeds the addressable-array bound, before any
/// allocation is attempted.
pub fn check_count_array(tag: u16, count: u32) -> Result<(), TiffError> {
    if count > i32::MAX as u32 {
        return Err(messages::bad_count(tag, i32::MAX as u64, u64::from(count)).into());
    }
    Ok(())
}

/// Check an entry's type against the type the tag requires.
///
/// Readers accept BYTE, SHORT, LONG, or IFD interchangeably for any unsigned
/// integer tag; any other substitution is rejected.
pub fn check_type(tag: u16, actual: FieldType, expected: FieldType) -> Result<(), TiffError> {
    if actual.is_unsigned_integer() && expected.is_unsigned_integer() {
        return Ok(());
    }
    if actual != expected {
        return Err(messages::type_mismatch(tag, expected, actual).into());
    }
    Ok(())
}

/// Check an entry's type against either of two allowed types.
pub fn check_type_either(
    tag: u16,
    actual: FieldType,
    allowed_a: FieldType,
    allowed_b: FieldType,
) -> Result<(), TiffError> {
    if actual != allowed_a && actual != allowed_b {
        return Err(messages::type_mismatch_either(tag, allowed_a, allowed_b, actual).into());
    }
    Ok(())
}

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a seekable source with a fixed byte order.
pub struct ValueReader<'a> {
    source: &'a mut dyn ByteSource,
    byte_order: ByteOrder,
}

impl<'a> ValueReader<'a> {
    pub fn new(source: &'a mut dyn ByteSource, byte_order: ByteOrder) -> Self {
        Self { source, byte_order }
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn read_failure(&self) -> TiffError {
        messages::read_failed(self.source.position()).into()
    }

    fn seek(&mut self, offset: u64) -> Result<(), TiffError> {
        self.source
            .seek(offset)
            .map_err(|_| TiffError::from(messages::read_failed(offset)))
    }

    /// Read one unsigned integer of the given type at the current position.
    ///
    /// Accepts the interchangeable unsigned types; any other type yields 0,
    /// callers guard with [`check_type`] first.
    pub fn read_unsigned_here(&mut self, field_type: FieldType) -> Result<u64, TiffError> {
        let order = self.byte_order;
        let value = match field_type {
            FieldType::Byte | FieldType::Undefined => {
                u64::from(self.source.read_u8().map_err(|_| self.read_failure())?)
            }
            FieldType::Short => u64::from(
                self.source
                    .read_u16(order)
                    .map_err(|_| self.read_failure())?,
            ),
            FieldType::Long | FieldType::Ifd => u64::from(
                self.source
                    .read_u32(order)
                    .map_err(|_| self.read_failure())?,
            ),
            _ => 0,
        };
        Ok(value)
    }

    /// Read one signed integer of the given type at the current position.
    pub fn read_signed_here(&mut self, field_type: FieldType) -> Result<i64, TiffError> {
        let order = self.byte_order;
        let value = match field_type {
            FieldType::SByte => i64::from(self.source.read_i8().map_err(|_| self.read_failure())?),
            FieldType::SShort => i64::from(
                self.source
                    .read_i16(order)
                    .map_err(|_| self.read_failure())?,
            ),
            FieldType::SLong => i64::from(
                self.source
                    .read_i32(order)
                    .map_err(|_| self.read_failure())?,
            ),
            _ => 0,
        };
        Ok(value)
    }

    /// Read a single unsigned value of any interchangeable integer type.
    pub fn read_unsigned(&mut self, field_type: FieldType, offset: u64) -> Result<u64, TiffError> {
        self.seek(offset)?;
        self.read_unsigned_here(field_type)
    }

    /// Read `count` unsigned values of any interchangeable integer type.
    pub fn read_unsigned_array(
        &mut self,
        field_type: FieldType,
        count: u32,
        offset: u64,
    ) -> Result<Vec<u64>, TiffError> {
        self.seek(offset)?;
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(self.read_unsigned_here(field_type)?);
        }
        Ok(values)
    }

    /// Read `count` signed values of a signed integer type.
    pub fn read_signed_array(
        &mut self,
        field_type: FieldType,
        count: u32,
        offset: u64,
    ) -> Result<Vec<i64>, TiffError> {
        self.seek(offset)?;
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(self.read_signed_here(field_type)?);
        }
        Ok(values)
    }

    /// Read `size` raw bytes.
    pub fn read_true_byte_array(&mut self, size: u64, offset: u64) -> Result<Bytes, TiffError> {
        self.seek(offset)?;
        self.source
            .read_bytes(size as usize)
            .map_err(|_| TiffError::from(messages::read_failed(offset)))
    }

    /// Read one RATIONAL: unsigned numerator then unsigned denominator.
    pub fn read_rational(&mut self, offset: u64) -> Result<Rational, TiffError> {
        self.seek(offset)?;
        let order = self.byte_order;
        let numerator = self
            .source
            .read_u32(order)
            .map_err(|_| self.read_failure())?;
        let denominator = self
            .source
            .read_u32(order)
            .map_err(|_| self.read_failure())?;
        Ok(Rational::new(numerator, denominator))
    }

    /// Read an array of RATIONAL values, prefetching the region in one read.
    pub fn read_rational_array(
        &mut self,
        count: u32,
        offset: u64,
    ) -> Result<Vec<Rational>, TiffError> {
        let buffer = self.read_true_byte_array(u64::from(count) * 8, offset)?;
        let order = self.byte_order;
        let mut values = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let numerator = order.read_u32(&buffer[i * 8..]);
            let denominator = order.read_u32(&buffer[i * 8 + 4..]);
            values.push(Rational::new(numerator, denominator));
        }
        Ok(values)
    }

    /// Read one SRATIONAL: signed numerator then signed denominator.
    pub fn read_signed_rational(&mut self, offset: u64) -> Result<Rational, TiffError> {
        self.seek(offset)?;
        let order = self.byte_order;
        let numerator = self
            .source
            .read_i32(order)
            .map_err(|_| self.read_failure())?;
        let denominator = self
            .source
            .read_i32(order)
            .map_err(|_| self.read_failure())?;
        Ok(Rational::new_signed(numerator, denominator))
    }

    /// Read an array of SRATIONAL values.
    pub fn read_signed_rational_array(
        &mut self,
        count: u32,
        offset: u64,
    ) -> Result<Vec<Rational>, TiffError> {
        let buffer = self.read_true_byte_array(u64::from(count) * 8, offset)?;
        let order = self.byte_order;
        let mut values = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let numerator = order.read_i32(&buffer[i * 8..]);
            let denominator = order.read_i32(&buffer[i * 8 + 4..]);
            values.push(Rational::new_signed(numerator, denominator));
        }
        Ok(values)
    }

    /// Read `count` FLOAT values.
    pub fn read_float_array(&mut self, count: u32, offset: u64) -> Result<Vec<f32>, TiffError> {
        self.seek(offset)?;
        let order = self.byte_order;
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(self.source.read_f32(order).map_err(|_| self.read_failure())?);
        }
        Ok(values)
    }

    /// Read `count` DOUBLE values.
    pub fn read_double_array(&mut self, count: u32, offset: u64) -> Result<Vec<f64>, TiffError> {
        self.seek(offset)?;
        let order = self.byte_order;
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(self.source.read_f64(order).map_err(|_| self.read_failure())?);
        }
        Ok(values)
    }

    /// Read a NUL-terminated ASCII string of at most `count` bytes.
    ///
    /// Reading stops at the first NUL. Bytes outside printable ASCII are
    /// escaped as `%XX`.
    pub fn read_ascii(&mut self, count: u32, offset: u64) -> Result<String, TiffError> {
        let buffer = self.read_true_byte_array(u64::from(count), offset)?;
        let mut result = String::new();
        for &b in buffer.iter() {
            if b == 0 {
                break;
            }
            push_ascii(&mut result, b);
        }
        Ok(result)
    }

    /// Read an array of NUL-terminated ASCII strings from a `count`-byte
    /// region. The result holds one string per NUL terminator encountered;
    /// trailing bytes with no terminator are dropped.
    pub fn read_ascii_array(&mut self, count: u32, offset: u64) -> Result<Vec<String>, TiffError> {
        let buffer = self.read_true_byte_array(u64::from(count), offset)?;
        let mut strings = Vec::new();
        let mut current = String::new();
        for &b in buffer.iter() {
            if b == 0 {
                strings.push(std::mem::take(&mut current));
            } else {
                push_ascii(&mut current, b);
            }
        }
        Ok(strings)
    }
}

/// Append a byte as a char, escaping non-printable-ASCII bytes as `%XX`.
fn push_ascii(out: &mut String, b: u8) {
    if (32..=127).contains(&b) {
        out.push(b as char);
    } else {
        out.push('%');
        out.push(hex_digit(b >> 4));
        out.push(hex_digit(b & 0x0F));
    }
}

fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + nibble - 10) as char,
    }
}

// =============================================================================
// Tests
// =============================================================================
