//! The IFD (Image File Directory) engine.
//!
//! An IFD is a counted list of 12-byte tag records followed by the offset of
//! the next IFD in the chain (0 when terminal). [`parse_ifd`] drives the
//! structural pass: it prefetches the whole directory in one read, decodes
//! each record, enforces the structural invariants (ascending tags, known
//! types, word-aligned out-of-line offsets), and hands every surviving entry
//! to an [`IfdDispatch`] that knows the tag semantics for its directory kind.
//!
//! Record layout: `(tag: u16, type: u16, count: u32, value: u32)`. When the
//! value's total size fits in 4 bytes it is stored inline in the record; the
//! effective offset passed to the dispatch is then the file position of the
//! record's own value field, so tag readers never distinguish the two modes.

use crate::error::TiffError;
use crate::io::{ByteOrder, ByteSource};
use crate::message::{Message, Severity};
use crate::niso::NisoImageMetadata;
use crate::property::{Property, PropertyValue, Rational};
use crate::repinfo::RepInfo;
use crate::tiff::messages;
use crate::tiff::tags::{self, tag, FieldType};
use crate::tiff::values::{
    check_count, check_count_array, check_type, ValueReader,
};

/* Set to true to allow out-of-sequence tags. */
const DEBUG_ALLOW_OUT_OF_SEQUENCE: bool = false;

// =============================================================================
// IfdKind
// =============================================================================

/// The directory kinds a TIFF file can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfdKind {
    /// Top-level image directory.
    Main,
    /// Exif sub-IFD.
    Exif,
    /// GPSInfo sub-IFD.
    Gps,
    /// Exif interoperability sub-IFD.
    Interop,
    /// TIFF/FX global parameters sub-IFD.
    GlobalParams,
}

impl IfdKind {
    pub const fn label(self) -> &'static str {
        match self {
            IfdKind::Main => "TIFF",
            IfdKind::Exif => "Exif",
            IfdKind::Gps => "GPS",
            IfdKind::Interop => "Interoperability",
            IfdKind::GlobalParams => "Global parameters",
        }
    }
}

// =============================================================================
// Parse outcome
// =============================================================================

/// Structural result of one directory parse.
#[derive(Debug)]
pub struct IfdOutcome {
    /// Offset of the successor IFD, 0 if terminal.
    pub next: u64,
    /// TIFF revision implied by the entry types seen: 4, or 6 once any type
    /// from SBYTE upward is observed.
    pub version: u8,
    /// Raw tag records, for verbose output.
    pub entry_records: Vec<IfdEntryRecord>,
}

/// One undecoded tag record.
#[derive(Debug, Clone, Copy)]
pub struct IfdEntryRecord {
    pub tag: u16,
    pub type_raw: u16,
    pub count: u32,
    pub value_or_offset: u32,
}

// =============================================================================
// IfdDispatch
// =============================================================================

/// Tag semantics for one directory kind.
///
/// The structural pass calls `lookup_tag` for every entry that survives the
/// type-domain check; the dispatch reads the value, interprets it, and
/// accumulates properties. A returned error is fatal for the whole parse.
pub trait IfdDispatch {
    fn kind(&self) -> IfdKind;

    fn lookup_tag(
        &mut self,
        reader: &mut ValueReader<'_>,
        tag: u16,
        field_type: FieldType,
        count: u32,
        value: u64,
    ) -> Result<(), TiffError>;

    /// Cross-tag invariants, run after all entries have been dispatched.
    fn post_parse(&mut self, _info: &mut RepInfo, _ifd_offset: u64) {}
}

// =============================================================================
// parse_ifd
// =============================================================================

/// Parse the directory at `offset` and dispatch its entries.
///
/// Structural violations divide into two classes. Non-fatal problems
/// (out-of-order tags, unknown entry types) are recorded on `info` and
/// parsing continues. Fatal problems (unreadable structures, odd out-of-line
/// offsets unless `byte_offset_is_valid`) abort with an error the caller
/// converts into a Fatal message.
pub fn parse_ifd(
    source: &mut dyn ByteSource,
    byte_order: ByteOrder,
    offset: u64,
    byte_offset_is_valid: bool,
    info: &mut RepInfo,
    dispatch: &mut dyn IfdDispatch,
) -> Result<IfdOutcome, TiffError> {
    source
        .seek(offset)
        .map_err(|_| TiffError::from(messages::unreadable_ifd(offset)))?;
    let entry_count = source
        .read_u16(byte_order)
        .map_err(|_| TiffError::from(messages::unreadable_ifd(offset)))?;

    // Prefetch the whole directory, then the successor offset.
    let buffer = source
        .read_bytes(12 * entry_count as usize)
        .map_err(|_| TiffError::from(messages::unreadable_ifd(offset)))?;
    let next = u64::from(
        source
            .read_u32(byte_order)
            .map_err(|_| TiffError::from(messages::unreadable_ifd(offset)))?,
    );

    let mut version = 4u8;
    let mut previous_tag = 0u16;
    let mut entry_records = Vec::with_capacity(entry_count as usize);

    for i in 0..entry_count as usize {
        let record = &buffer[12 * i..12 * i + 12];
        let entry_tag = byte_order.read_u16(&record[0..2]);
        let type_raw = byte_order.read_u16(&record[2..4]);
        let count = byte_order.read_u32(&record[4..8]);
        let raw_value = byte_order.read_u32(&record[8..12]);
        entry_records.push(IfdEntryRecord {
            tag: entry_tag,
            type_raw,
            count,
            value_or_offset: raw_value,
        });

        /* Tags must be in strictly ascending numerical order. */
        if !DEBUG_ALLOW_OUT_OF_SEQUENCE && i > 0 && entry_tag <= previous_tag {
            info.add_message(messages::tag_out_of_sequence(
                entry_tag,
                offset + 2 + 12 * i as u64,
            ));
        }
        previous_tag = entry_tag;

        /* Skip over entries with unknown type. */
        let field_type = match FieldType::from_u16(type_raw) {
            Some(ft) => ft,
            None => {
                info.add_message(messages::unknown_data_type(
                    type_raw,
                    entry_tag,
                    offset + 4 + 12 * i as u64,
                ));
                continue;
            }
        };

        /* Type gives an indication of the TIFF revision. */
        if field_type.is_revision_6() {
            version = 6;
        }

        let value = if field_type.value_size(count) > 4 {
            /* Out of line; the value field holds a word-aligned offset. */
            if raw_value & 1 != 0 {
                let message =
                    messages::offset_not_word_aligned(u64::from(raw_value), offset + 10 + 12 * i as u64);
                if byte_offset_is_valid {
                    info.add_message(message.downgraded_to(Severity::Info));
                } else {
                    return Err(message.into());
                }
            }
            u64::from(raw_value)
        } else {
            /* Inline; pass the file position of the value field itself. */
            offset + 10 + 12 * i as u64
        };

        let mut reader = ValueReader::new(&mut *source, byte_order);
        dispatch.lookup_tag(&mut reader, entry_tag, field_type, count, value)?;
    }

    dispatch.post_parse(info, offset);

    Ok(IfdOutcome {
        next,
        version,
        entry_records,
    })
}

// =============================================================================
// Value-helper properties
// =============================================================================

/// An integer that maps to a label table.
///
/// In interpreted mode the value indexes `labels` and the property is a
/// String; a miss accumulates a soft error and falls back to the raw
/// integer. In raw mode the integer is emitted directly.
pub fn add_integer_property(
    name: &str,
    value: i64,
    labels: &[&str],
    raw_output: bool,
    errors: &mut Vec<Message>,
) -> Property {
    if !raw_output {
        match usize::try_from(value).ok().and_then(|i| labels.get(i)) {
            Some(label) if !label.is_empty() => {
                return Property::new(name, PropertyValue::String((*label).to_string()));
            }
            _ => errors.push(messages::bad_label_value(name, value)),
        }
    }
    Property::new(name, PropertyValue::Integer(value))
}

/// An integer whose label table is sparse: `index[i]` maps to `labels[i]`.
pub fn add_indexed_property(
    name: &str,
    value: i64,
    index: &[u32],
    labels: &[&str],
    raw_output: bool,
    errors: &mut Vec<Message>,
) -> Property {
    if !raw_output {
        let position = index.iter().position(|&v| i64::from(v) == value);
        match position.and_then(|i| labels.get(i)) {
            Some(label) => {
                return Property::new(name, PropertyValue::String((*label).to_string()));
            }
            None => errors.push(messages::bad_label_value(name, value)),
        }
    }
    Property::new(name, PropertyValue::Integer(value))
}

/// An integer array mapped element-wise through a label table.
pub fn add_integer_array_property(
    name: &str,
    values: &[i64],
    labels: &[&str],
    raw_output: bool,
    errors: &mut Vec<Message>,
) -> Property {
    if !raw_output {
        let mut strings = Vec::with_capacity(values.len());
        let mut all_mapped = true;
        for &value in values {
            match usize::try_from(value).ok().and_then(|i| labels.get(i)) {
                Some(label) => strings.push((*label).to_string()),
                None => {
                    errors.push(messages::bad_label_value(name, value));
                    all_mapped = false;
                }
            }
        }
        if all_mapped {
            return Property::new(name, PropertyValue::StringArray(strings));
        }
    }
    Property::new(name, PropertyValue::IntegerArray(values.to_vec()))
}

/// A bitmask: in interpreted mode, the list of labels for the 1 bits,
/// counting the low-order bit as bit 0; in raw mode, the integer.
pub fn add_bitmask_property(
    name: &str,
    value: i64,
    labels: &[&str],
    raw_output: bool,
) -> Property {
    if !raw_output {
        let mut active = Vec::new();
        for (bit, label) in labels.iter().enumerate() {
            if value & (1 << bit) != 0 {
                active.push((*label).to_string());
            }
        }
        return Property::new(name, PropertyValue::StringList(active));
    }
    Property::new(name, PropertyValue::Integer(value))
}

/// A RATIONAL value: the exact pair in raw mode, the evaluated ratio as a
/// string in interpreted mode.
pub fn add_rational_property(name: &str, value: Rational, raw_output: bool) -> Property {
    if raw_output {
        Property::new(name, PropertyValue::Rational(value))
    } else {
        Property::new(name, PropertyValue::String(value.to_f64().to_string()))
    }
}

/// Generic property for a tag the dispatch does not recognize, preserving
/// type, count, and the value bytes.
fn unknown_tag_property(
    reader: &mut ValueReader<'_>,
    entry_tag: u16,
    field_type: FieldType,
    count: u32,
    value: u64,
) -> Result<Property, TiffError> {
    check_count_array(entry_tag, count)?;
    let size = field_type.value_size(count);
    let bytes = reader.read_true_byte_array(size, value)?;
    Ok(Property::new(
        "UnknownTag",
        PropertyValue::PropertyArray(vec![
            Property::new("Tag", PropertyValue::Integer(i64::from(entry_tag))),
            Property::new(
                "Type",
                PropertyValue::String(field_type.label().to_string()),
            ),
            Property::new("Count", PropertyValue::Integer(i64::from(count))),
            Property::new("Value", PropertyValue::Bytes(bytes.to_vec())),
        ]),
    ))
}

/// Shared per-directory accumulation: interpreted entry properties in
/// discovery order, plus soft errors from label misses.
#[derive(Debug, Default)]
struct DispatchCommon {
    raw_output: bool,
    entries: Vec<Property>,
    errors: Vec<Message>,
}

impl DispatchCommon {
    fn new(raw_output: bool) -> Self {
        Self {
            raw_output,
            ..Self::default()
        }
    }
}

/// Assemble the standard IFD property header: Offset, Type, then the entry
/// subtree, with optional extra elements between Type and Entries.
fn ifd_property(
    kind: IfdKind,
    offset: u64,
    extra: Vec<Property>,
    entries: Vec<Property>,
) -> Property {
    let mut elements = vec![
        Property::new("Offset", PropertyValue::Integer(offset as i64)),
        Property::new("Type", PropertyValue::String(kind.label().to_string())),
    ];
    elements.extend(extra);
    elements.push(Property::new("Entries", PropertyValue::PropertyList(entries)));
    Property::new("IFD", PropertyValue::PropertyArray(elements))
}

// =============================================================================
// MainIfd
// =============================================================================

/// Tag semantics for a top-level image directory.
#[derive(Debug, Default)]
pub struct MainIfd {
    common: DispatchCommon,
    niso: NisoImageMetadata,
    thumbnail: bool,

    bits_per_sample: Option<Vec<u64>>,
    samples_per_pixel: Option<u32>,
    strip_offsets: Option<Vec<u64>>,
    strip_byte_counts: Option<Vec<u64>>,
    tile_offsets: Option<Vec<u64>>,
    tile_byte_counts: Option<Vec<u64>>,

    exif_offset: Option<u64>,
    gps_offset: Option<u64>,
    interop_offset: Option<u64>,
    global_params_offset: Option<u64>,
}

impl MainIfd {
    pub fn new(raw_output: bool) -> Self {
        Self {
            common: DispatchCommon::new(raw_output),
            ..Self::default()
        }
    }

    /// Mark this directory as the conventional thumbnail IFD (the second in
    /// the top-level chain).
    pub fn set_thumbnail(&mut self, thumbnail: bool) {
        self.thumbnail = thumbnail;
    }

    /// Soft errors accumulated during dispatch, drained.
    pub fn take_errors(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.common.errors)
    }

    /// Sub-IFD offsets discovered in this directory, in a fixed kind order.
    pub fn sub_ifd_offsets(&self) -> Vec<(IfdKind, u64)> {
        let mut subs = Vec::new();
        if let Some(offset) = self.exif_offset {
            subs.push((IfdKind::Exif, offset));
        }
        if let Some(offset) = self.gps_offset {
            subs.push((IfdKind::Gps, offset));
        }
        if let Some(offset) = self.interop_offset {
            subs.push((IfdKind::Interop, offset));
        }
        if let Some(offset) = self.global_params_offset {
            subs.push((IfdKind::GlobalParams, offset));
        }
        subs
    }

    /// Build the property tree for this directory.
    pub fn build_property(&mut self, offset: u64) -> Property {
        let mut extra = Vec::new();
        if self.thumbnail {
            extra.push(Property::new("Thumbnail", PropertyValue::Boolean(true)));
        }
        if !self.niso.is_empty() {
            extra.push(Property::new(
                "NisoImageMetadata",
                PropertyValue::NisoImageMetadata(Box::new(self.niso.clone())),
            ));
        }
        ifd_property(
            IfdKind::Main,
            offset,
            extra,
            std::mem::take(&mut self.common.entries),
        )
    }
}

impl IfdDispatch for MainIfd {
    fn kind(&self) -> IfdKind {
        IfdKind::Main
    }

    fn lookup_tag(
        &mut self,
        reader: &mut ValueReader<'_>,
        entry_tag: u16,
        field_type: FieldType,
        count: u32,
        value: u64,
    ) -> Result<(), TiffError> {
        let raw = self.common.raw_output;
        match entry_tag {
            tag::NEW_SUBFILE_TYPE => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)? as i64;
                self.common.entries.push(add_bitmask_property(
                    "NewSubfileType",
                    v,
                    &tags::NEW_SUBFILE_TYPE_LABELS,
                    raw,
                ));
            }
            tag::IMAGE_WIDTH => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.image_width = Some(v);
                self.common
                    .entries
                    .push(Property::new("ImageWidth", PropertyValue::Integer(v as i64)));
            }
            tag::IMAGE_LENGTH => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.image_length = Some(v);
                self.common.entries.push(Property::new(
                    "ImageLength",
                    PropertyValue::Integer(v as i64),
                ));
            }
            tag::BITS_PER_SAMPLE => {
                check_type(entry_tag, field_type, FieldType::Short)?;
                check_count(entry_tag, count, 1)?;
                check_count_array(entry_tag, count)?;
                let values = reader.read_unsigned_array(field_type, count, value)?;
                self.niso.bits_per_sample = Some(values.iter().map(|&v| v as u32).collect());
                self.bits_per_sample = Some(values.clone());
                self.common.entries.push(Property::new(
                    "BitsPerSample",
                    PropertyValue::IntegerArray(values.iter().map(|&v| v as i64).collect()),
                ));
            }
            tag::COMPRESSION => {
                check_type(entry_tag, field_type, FieldType::Short)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.compression_scheme = Some(v as u32);
                self.common.entries.push(add_indexed_property(
                    "Compression",
                    v as i64,
                    &tags::COMPRESSION_INDEX,
                    &tags::COMPRESSION_LABELS,
                    raw,
                    &mut self.common.errors,
                ));
            }
            tag::PHOTOMETRIC_INTERPRETATION => {
                check_type(entry_tag, field_type, FieldType::Short)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.color_space = Some(v as u32);
                self.common.entries.push(add_integer_property(
                    "PhotometricInterpretation",
                    v as i64,
                    &tags::PHOTOMETRIC_LABELS,
                    raw,
                    &mut self.common.errors,
                ));
            }
            tag::IMAGE_DESCRIPTION => {
                check_type(entry_tag, field_type, FieldType::Ascii)?;
                check_count_array(entry_tag, count)?;
                let s = reader.read_ascii(count, value)?;
                self.common
                    .entries
                    .push(Property::new("ImageDescription", PropertyValue::String(s)));
            }
            tag::MAKE | tag::MODEL | tag::SOFTWARE | tag::ARTIST | tag::COPYRIGHT
            | tag::DATE_TIME => {
                check_type(entry_tag, field_type, FieldType::Ascii)?;
                check_count_array(entry_tag, count)?;
                let s = reader.read_ascii(count, value)?;
                let name = match entry_tag {
                    tag::MAKE => "Make",
                    tag::MODEL => "Model",
                    tag::SOFTWARE => "Software",
                    tag::ARTIST => "Artist",
                    tag::COPYRIGHT => "Copyright",
                    _ => "DateTime",
                };
                match entry_tag {
                    tag::SOFTWARE => self.niso.scanning_software = Some(s.clone()),
                    tag::DATE_TIME => self.niso.date_time_created = Some(s.clone()),
                    _ => {}
                }
                self.common
                    .entries
                    .push(Property::new(name, PropertyValue::String(s)));
            }
            tag::STRIP_OFFSETS => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count_array(entry_tag, count)?;
                let values = reader.read_unsigned_array(field_type, count, value)?;
                self.common.entries.push(Property::new(
                    "StripOffsets",
                    PropertyValue::IntegerArray(values.iter().map(|&v| v as i64).collect()),
                ));
                self.strip_offsets = Some(values);
            }
            tag::ORIENTATION => {
                check_type(entry_tag, field_type, FieldType::Short)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.orientation = Some(v as u32);
                self.common.entries.push(add_integer_property(
                    "Orientation",
                    v as i64,
                    &tags::ORIENTATION_LABELS,
                    raw,
                    &mut self.common.errors,
                ));
            }
            tag::SAMPLES_PER_PIXEL => {
                check_type(entry_tag, field_type, FieldType::Short)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.samples_per_pixel = Some(v as u32);
                self.samples_per_pixel = Some(v as u32);
                self.common.entries.push(Property::new(
                    "SamplesPerPixel",
                    PropertyValue::Integer(v as i64),
                ));
            }
            tag::ROWS_PER_STRIP => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.rows_per_strip = Some(v);
                self.common.entries.push(Property::new(
                    "RowsPerStrip",
                    PropertyValue::Integer(v as i64),
                ));
            }
            tag::STRIP_BYTE_COUNTS => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count_array(entry_tag, count)?;
                let values = reader.read_unsigned_array(field_type, count, value)?;
                self.common.entries.push(Property::new(
                    "StripByteCounts",
                    PropertyValue::IntegerArray(values.iter().map(|&v| v as i64).collect()),
                ));
                self.strip_byte_counts = Some(values);
            }
            tag::X_RESOLUTION => {
                check_type(entry_tag, field_type, FieldType::Rational)?;
                check_count(entry_tag, count, 1)?;
                let r = reader.read_rational(value)?;
                self.niso.x_sampling_frequency = Some(r);
                self.common
                    .entries
                    .push(add_rational_property("XResolution", r, raw));
            }
            tag::Y_RESOLUTION => {
                check_type(entry_tag, field_type, FieldType::Rational)?;
                check_count(entry_tag, count, 1)?;
                let r = reader.read_rational(value)?;
                self.niso.y_sampling_frequency = Some(r);
                self.common
                    .entries
                    .push(add_rational_property("YResolution", r, raw));
            }
            tag::PLANAR_CONFIGURATION => {
                check_type(entry_tag, field_type, FieldType::Short)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.planar_configuration = Some(v as u32);
                self.common.entries.push(add_integer_property(
                    "PlanarConfiguration",
                    v as i64,
                    &tags::PLANAR_CONFIGURATION_LABELS,
                    raw,
                    &mut self.common.errors,
                ));
            }
            tag::RESOLUTION_UNIT => {
                check_type(entry_tag, field_type, FieldType::Short)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.sampling_frequency_unit = Some(v as u32);
                self.common.entries.push(add_integer_property(
                    "ResolutionUnit",
                    v as i64,
                    &tags::RESOLUTION_UNIT_LABELS,
                    raw,
                    &mut self.common.errors,
                ));
            }
            tag::TILE_WIDTH => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.tile_width = Some(v);
                self.common
                    .entries
                    .push(Property::new("TileWidth", PropertyValue::Integer(v as i64)));
            }
            tag::TILE_LENGTH => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.niso.tile_length = Some(v);
                self.common.entries.push(Property::new(
                    "TileLength",
                    PropertyValue::Integer(v as i64),
                ));
            }
            tag::TILE_OFFSETS => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count_array(entry_tag, count)?;
                let values = reader.read_unsigned_array(field_type, count, value)?;
                self.common.entries.push(Property::new(
                    "TileOffsets",
                    PropertyValue::IntegerArray(values.iter().map(|&v| v as i64).collect()),
                ));
                self.tile_offsets = Some(values);
            }
            tag::TILE_BYTE_COUNTS => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count_array(entry_tag, count)?;
                let values = reader.read_unsigned_array(field_type, count, value)?;
                self.common.entries.push(Property::new(
                    "TileByteCounts",
                    PropertyValue::IntegerArray(values.iter().map(|&v| v as i64).collect()),
                ));
                self.tile_byte_counts = Some(values);
            }
            tag::EXIF_IFD => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                self.exif_offset = Some(reader.read_unsigned(field_type, value)?);
            }
            tag::GPS_INFO_IFD => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                self.gps_offset = Some(reader.read_unsigned(field_type, value)?);
            }
            tag::INTEROPERABILITY_IFD => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                self.interop_offset = Some(reader.read_unsigned(field_type, value)?);
            }
            tag::GLOBAL_PARAMETERS_IFD => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                self.global_params_offset = Some(reader.read_unsigned(field_type, value)?);
            }
            _ => {
                /* Unknown tag numbers are not an error. */
                self.common.entries.push(unknown_tag_property(
                    reader, entry_tag, field_type, count, value,
                )?);
            }
        }
        Ok(())
    }

    fn post_parse(&mut self, info: &mut RepInfo, ifd_offset: u64) {
        let has_strips = self.strip_offsets.is_some() || self.strip_byte_counts.is_some();
        let has_tiles = self.tile_offsets.is_some() || self.tile_byte_counts.is_some();
        if has_strips && has_tiles {
            info.add_message(messages::strips_and_tiles(ifd_offset));
        }

        if let (Some(offsets), Some(counts)) = (&self.strip_offsets, &self.strip_byte_counts) {
            if offsets.len() != counts.len() {
                info.add_message(messages::layout_count_mismatch(
                    "StripOffsets",
                    "StripByteCounts",
                    ifd_offset,
                ));
            }
        }
        if let (Some(offsets), Some(counts)) = (&self.tile_offsets, &self.tile_byte_counts) {
            if offsets.len() != counts.len() {
                info.add_message(messages::layout_count_mismatch(
                    "TileOffsets",
                    "TileByteCounts",
                    ifd_offset,
                ));
            }
        }

        if let (Some(bits), Some(samples)) = (&self.bits_per_sample, self.samples_per_pixel) {
            if bits.len() != samples as usize {
                info.add_message(messages::bits_per_sample_mismatch(
                    bits.len(),
                    samples,
                    ifd_offset,
                ));
            }
        }
    }
}

// =============================================================================
// Sub-IFD dispatchers
// =============================================================================

/// Common surface of the sub-IFD dispatchers, so the module can drive any of
/// them through one code path.
pub trait SubIfdDispatch: IfdDispatch {
    /// Soft errors accumulated during dispatch, drained.
    fn take_errors(&mut self) -> Vec<Message>;

    /// Build the property tree for this directory.
    fn build_property(&mut self, offset: u64) -> Property;
}

/// Tag semantics for an Exif sub-IFD.
#[derive(Debug)]
pub struct ExifIfd {
    common: DispatchCommon,
}

impl ExifIfd {
    pub fn new(raw_output: bool) -> Self {
        Self {
            common: DispatchCommon::new(raw_output),
        }
    }
}

impl SubIfdDispatch for ExifIfd {
    fn take_errors(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.common.errors)
    }

    fn build_property(&mut self, offset: u64) -> Property {
        ifd_property(
            IfdKind::Exif,
            offset,
            Vec::new(),
            std::mem::take(&mut self.common.entries),
        )
    }
}

impl IfdDispatch for ExifIfd {
    fn kind(&self) -> IfdKind {
        IfdKind::Exif
    }

    fn lookup_tag(
        &mut self,
        reader: &mut ValueReader<'_>,
        entry_tag: u16,
        field_type: FieldType,
        count: u32,
        value: u64,
    ) -> Result<(), TiffError> {
        match entry_tag {
            tag::EXIF_VERSION | tag::FLASHPIX_VERSION => {
                check_type(entry_tag, field_type, FieldType::Undefined)?;
                check_count(entry_tag, count, 4)?;
                let bytes = reader.read_true_byte_array(u64::from(count), value)?;
                let name = if entry_tag == tag::EXIF_VERSION {
                    "ExifVersion"
                } else {
                    "FlashpixVersion"
                };
                self.common.entries.push(Property::new(
                    name,
                    PropertyValue::String(String::from_utf8_lossy(&bytes).into_owned()),
                ));
            }
            tag::DATE_TIME_ORIGINAL => {
                check_type(entry_tag, field_type, FieldType::Ascii)?;
                check_count_array(entry_tag, count)?;
                let s = reader.read_ascii(count, value)?;
                self.common
                    .entries
                    .push(Property::new("DateTimeOriginal", PropertyValue::String(s)));
            }
            tag::COLOR_SPACE => {
                check_type(entry_tag, field_type, FieldType::Short)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.common.entries.push(add_indexed_property(
                    "ColorSpace",
                    v as i64,
                    &tags::COLOR_SPACE_INDEX,
                    &tags::COLOR_SPACE_LABELS,
                    self.common.raw_output,
                    &mut self.common.errors,
                ));
            }
            tag::PIXEL_X_DIMENSION | tag::PIXEL_Y_DIMENSION => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                let name = if entry_tag == tag::PIXEL_X_DIMENSION {
                    "PixelXDimension"
                } else {
                    "PixelYDimension"
                };
                self.common
                    .entries
                    .push(Property::new(name, PropertyValue::Integer(v as i64)));
            }
            _ => {
                self.common.entries.push(unknown_tag_property(
                    reader, entry_tag, field_type, count, value,
                )?);
            }
        }
        Ok(())
    }
}

/// Tag semantics for a GPSInfo sub-IFD.
#[derive(Debug)]
pub struct GpsIfd {
    common: DispatchCommon,
}

impl GpsIfd {
    pub fn new(raw_output: bool) -> Self {
        Self {
            common: DispatchCommon::new(raw_output),
        }
    }
}

impl SubIfdDispatch for GpsIfd {
    fn take_errors(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.common.errors)
    }

    fn build_property(&mut self, offset: u64) -> Property {
        ifd_property(
            IfdKind::Gps,
            offset,
            Vec::new(),
            std::mem::take(&mut self.common.entries),
        )
    }
}

impl IfdDispatch for GpsIfd {
    fn kind(&self) -> IfdKind {
        IfdKind::Gps
    }

    fn lookup_tag(
        &mut self,
        reader: &mut ValueReader<'_>,
        entry_tag: u16,
        field_type: FieldType,
        count: u32,
        value: u64,
    ) -> Result<(), TiffError> {
        match entry_tag {
            tag::GPS_VERSION_ID => {
                check_type(entry_tag, field_type, FieldType::Byte)?;
                check_count(entry_tag, count, 4)?;
                let values = reader.read_unsigned_array(field_type, count, value)?;
                let dotted = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(".");
                self.common
                    .entries
                    .push(Property::new("GPSVersionID", PropertyValue::String(dotted)));
            }
            tag::GPS_LATITUDE_REF | tag::GPS_LONGITUDE_REF => {
                check_type(entry_tag, field_type, FieldType::Ascii)?;
                check_count_array(entry_tag, count)?;
                let s = reader.read_ascii(count, value)?;
                let name = if entry_tag == tag::GPS_LATITUDE_REF {
                    "GPSLatitudeRef"
                } else {
                    "GPSLongitudeRef"
                };
                self.common
                    .entries
                    .push(Property::new(name, PropertyValue::String(s)));
            }
            tag::GPS_LATITUDE | tag::GPS_LONGITUDE => {
                check_type(entry_tag, field_type, FieldType::Rational)?;
                check_count(entry_tag, count, 3)?;
                let values = reader.read_rational_array(count, value)?;
                let name = if entry_tag == tag::GPS_LATITUDE {
                    "GPSLatitude"
                } else {
                    "GPSLongitude"
                };
                self.common
                    .entries
                    .push(Property::new(name, PropertyValue::RationalArray(values)));
            }
            tag::GPS_ALTITUDE_REF => {
                check_type(entry_tag, field_type, FieldType::Byte)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.common.entries.push(Property::new(
                    "GPSAltitudeRef",
                    PropertyValue::Integer(v as i64),
                ));
            }
            tag::GPS_ALTITUDE => {
                check_type(entry_tag, field_type, FieldType::Rational)?;
                check_count(entry_tag, count, 1)?;
                let r = reader.read_rational(value)?;
                self.common.entries.push(add_rational_property(
                    "GPSAltitude",
                    r,
                    self.common.raw_output,
                ));
            }
            _ => {
                self.common.entries.push(unknown_tag_property(
                    reader, entry_tag, field_type, count, value,
                )?);
            }
        }
        Ok(())
    }
}

/// Tag semantics for an Exif interoperability sub-IFD.
#[derive(Debug)]
pub struct InteropIfd {
    common: DispatchCommon,
}

impl InteropIfd {
    pub fn new(raw_output: bool) -> Self {
        Self {
            common: DispatchCommon::new(raw_output),
        }
    }
}

impl SubIfdDispatch for InteropIfd {
    fn take_errors(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.common.errors)
    }

    fn build_property(&mut self, offset: u64) -> Property {
        ifd_property(
            IfdKind::Interop,
            offset,
            Vec::new(),
            std::mem::take(&mut self.common.entries),
        )
    }
}

impl IfdDispatch for InteropIfd {
    fn kind(&self) -> IfdKind {
        IfdKind::Interop
    }

    fn lookup_tag(
        &mut self,
        reader: &mut ValueReader<'_>,
        entry_tag: u16,
        field_type: FieldType,
        count: u32,
        value: u64,
    ) -> Result<(), TiffError> {
        match entry_tag {
            tag::INTEROPERABILITY_INDEX => {
                check_type(entry_tag, field_type, FieldType::Ascii)?;
                check_count_array(entry_tag, count)?;
                let s = reader.read_ascii(count, value)?;
                self.common.entries.push(Property::new(
                    "InteroperabilityIndex",
                    PropertyValue::String(s),
                ));
            }
            _ => {
                self.common.entries.push(unknown_tag_property(
                    reader, entry_tag, field_type, count, value,
                )?);
            }
        }
        Ok(())
    }
}

/// Tag semantics for a TIFF/FX global parameters sub-IFD.
#[derive(Debug)]
pub struct GlobalParamsIfd {
    common: DispatchCommon,
}

impl GlobalParamsIfd {
    pub fn new(raw_output: bool) -> Self {
        Self {
            common: DispatchCommon::new(raw_output),
        }
    }
}

impl SubIfdDispatch for GlobalParamsIfd {
    fn take_errors(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.common.errors)
    }

    fn build_property(&mut self, offset: u64) -> Property {
        ifd_property(
            IfdKind::GlobalParams,
            offset,
            Vec::new(),
            std::mem::take(&mut self.common.entries),
        )
    }
}

impl IfdDispatch for GlobalParamsIfd {
    fn kind(&self) -> IfdKind {
        IfdKind::GlobalParams
    }

    fn lookup_tag(
        &mut self,
        reader: &mut ValueReader<'_>,
        entry_tag: u16,
        field_type: FieldType,
        count: u32,
        value: u64,
    ) -> Result<(), TiffError> {
        match entry_tag {
            tag::PROFILE_TYPE => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.common
                    .entries
                    .push(Property::new("ProfileType", PropertyValue::Integer(v as i64)));
            }
            tag::FAX_PROFILE => {
                check_type(entry_tag, field_type, FieldType::Byte)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.common.entries.push(add_integer_property(
                    "FaxProfile",
                    v as i64,
                    &tags::FAX_PROFILE_LABELS,
                    self.common.raw_output,
                    &mut self.common.errors,
                ));
            }
            tag::CODING_METHODS => {
                check_type(entry_tag, field_type, FieldType::Long)?;
                check_count(entry_tag, count, 1)?;
                let v = reader.read_unsigned(field_type, value)?;
                self.common.entries.push(Property::new(
                    "CodingMethods",
                    PropertyValue::Integer(v as i64),
                ));
            }
            _ => {
                self.common.entries.push(unknown_tag_property(
                    reader, entry_tag, field_type, count, value,
                )?);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
