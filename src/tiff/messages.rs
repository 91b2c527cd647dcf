//! The TIFF module's diagnostic catalog.
//!
//! All messages the module can raise are built here so the id namespace
//! lives in one place. Ids are stable across releases.

use crate::message::Message;
use crate::tiff::tags::FieldType;

/// Unable to read an IFD structure at the given offset.
pub fn unreadable_ifd(offset: u64) -> Message {
    Message::fatal(
        "TIFF-HUL-1",
        format!("Unable to read IFD at offset {offset}"),
    )
    .at_offset(offset)
}

/// Tag out of ascending order.
pub fn tag_out_of_sequence(tag: u16, offset: u64) -> Message {
    Message::error("TIFF-HUL-2", format!("Tag {tag} out of sequence")).at_offset(offset)
}

/// Entry with a type outside the 1..=13 domain.
pub fn unknown_data_type(type_raw: u16, tag: u16, offset: u64) -> Message {
    Message::error("TIFF-HUL-3", "Unknown data type")
        .with_sub_message(format!("Type = {type_raw}, Tag = {tag}"))
        .at_offset(offset)
}

/// Out-of-line value at an odd offset.
pub fn offset_not_word_aligned(value: u64, offset: u64) -> Message {
    Message::fatal(
        "TIFF-HUL-4",
        format!("Value offset not word-aligned: {value}"),
    )
    .at_offset(offset)
}

/// I/O failure while decoding entries or reading a tag value.
pub fn read_failed(offset: u64) -> Message {
    Message::fatal("TIFF-HUL-5", "Read of TIFF data failed").at_offset(offset)
}

/// Count below the minimum the tag requires, or too large to address.
pub fn bad_count(tag: u16, expected_min: u64, actual: u64) -> Message {
    Message::fatal(
        "TIFF-HUL-6",
        format!("Count mismatch for tag {tag}; expecting {expected_min}, saw {actual}"),
    )
}

/// Type other than the one the tag requires.
pub fn type_mismatch(tag: u16, expected: FieldType, actual: FieldType) -> Message {
    Message::fatal(
        "TIFF-HUL-7",
        format!(
            "Type mismatch for tag {tag}; expecting {}, saw {}",
            expected.label(),
            actual.label()
        ),
    )
}

/// Type other than either of the two the tag allows.
pub fn type_mismatch_either(
    tag: u16,
    allowed_a: FieldType,
    allowed_b: FieldType,
    actual: FieldType,
) -> Message {
    Message::fatal(
        "TIFF-HUL-8",
        format!(
            "Type mismatch for tag {tag}; expecting {} or {}, saw {}",
            allowed_a.label(),
            allowed_b.label(),
            actual.label()
        ),
    )
}

/// Header does not begin with a valid byte-order mark.
pub fn invalid_byte_order(offset: u64) -> Message {
    Message::fatal(
        "TIFF-HUL-9",
        "No TIFF header: file does not begin with a valid byte order mark",
    )
    .at_offset(offset)
}

/// Header magic number is not 42.
pub fn invalid_magic(magic: u16) -> Message {
    Message::fatal(
        "TIFF-HUL-10",
        format!("Invalid TIFF magic number: {magic}"),
    )
    .at_offset(2)
}

/// File too short to hold a TIFF header.
pub fn header_truncated(size: u64) -> Message {
    Message::fatal(
        "TIFF-HUL-11",
        format!("File is too small to contain a TIFF header: {size} bytes"),
    )
    .at_offset(0)
}

/// An IFD offset was reached a second time.
pub fn cyclic_ifd_chain(offset: u64) -> Message {
    Message::fatal(
        "TIFF-HUL-12",
        format!("Cycle in IFD chain: offset {offset} already parsed"),
    )
    .at_offset(offset)
}

/// Strip and tile organization in the same IFD.
pub fn strips_and_tiles(offset: u64) -> Message {
    Message::error(
        "TIFF-HUL-13",
        "IFD declares both strip and tile organization",
    )
    .at_offset(offset)
}

/// Offsets array and byte-counts array disagree in length.
pub fn layout_count_mismatch(offsets_name: &str, counts_name: &str, offset: u64) -> Message {
    Message::error(
        "TIFF-HUL-14",
        format!("{offsets_name} count differs from {counts_name} count"),
    )
    .at_offset(offset)
}

/// BitsPerSample length disagrees with SamplesPerPixel.
pub fn bits_per_sample_mismatch(bits_len: usize, samples: u32, offset: u64) -> Message {
    Message::error(
        "TIFF-HUL-15",
        format!("BitsPerSample count {bits_len} does not match SamplesPerPixel {samples}"),
    )
    .at_offset(offset)
}

/// Header points to no IFD at all.
pub fn no_ifd() -> Message {
    Message::fatal("TIFF-HUL-16", "No IFD in file: first IFD offset is 0").at_offset(4)
}

/// A value failed to map into its label table (soft error, per IFD).
pub fn bad_label_value(name: &str, value: i64) -> Message {
    Message::error("TIFF-HUL-66", format!("Bad value for {name}: {value}"))
}
