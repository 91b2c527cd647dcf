//! The TIFF format module: signature check, header parse, and IFD chain walk.
//!
//! A TIFF file is a header (byte-order mark, magic 42, first-IFD offset)
//! followed by a singly-linked chain of IFDs. The first IFD is the primary
//! image; by convention the second is the thumbnail; sub-IFDs (Exif, GPS,
//! Interoperability, Global parameters) hang off specific tags of each
//! top-level IFD. Offsets already parsed are tracked so a cycle anywhere in
//! the graph is caught instead of looping.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::Ordering;

use tracing::debug;

use crate::error::{IoError, TiffError};
use crate::io::{ByteOrder, ByteSource};
use crate::message::{Message, Severity};
use crate::module::{FormatModule, ModuleDescriptor, ParseOptions};
use crate::repinfo::{RepInfo, Validity};
use crate::signature::{Signature, SignatureUse};
use crate::tiff::ifd::{
    parse_ifd, ExifIfd, GlobalParamsIfd, GpsIfd, IfdKind, InteropIfd, MainIfd, SubIfdDispatch,
};
use crate::tiff::messages;

/// Size of the classic TIFF header in bytes.
pub const TIFF_HEADER_SIZE: u64 = 8;

const MAGIC_42: u16 = 42;

// =============================================================================
// TiffModule
// =============================================================================

/// TIFF validation and characterization.
pub struct TiffModule {
    descriptor: ModuleDescriptor,
    options: ParseOptions,
    /// Module parameter: treat odd out-of-line value offsets as valid.
    byte_offset_is_valid: bool,
}

impl Default for TiffModule {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffModule {
    pub fn new() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                name: "TIFF-hul",
                release: "1.9",
                date: "2026-02-12",
                formats: vec!["TIFF"],
                mime_types: vec!["image/tiff"],
                signatures: vec![
                    Signature::Magic {
                        bytes: b"II\x2A\x00",
                        offset: 0,
                        use_type: SignatureUse::MandatoryIfApplicable,
                    },
                    Signature::Magic {
                        bytes: b"MM\x00\x2A",
                        offset: 0,
                        use_type: SignatureUse::MandatoryIfApplicable,
                    },
                    Signature::Extension { extension: "tif" },
                    Signature::Extension { extension: "tiff" },
                ],
                vendor: "Harvard University Library",
                specifications: vec![
                    "TIFF, Revision 6.0 (Adobe Systems, 1992)",
                    "TIFF/EP, ISO 12234-2:2001",
                ],
                note: "",
                rights: "LGPL",
            },
            options: ParseOptions::default(),
            byte_offset_is_valid: false,
        }
    }

    /// Read and validate the 8-byte header. Any deviation is fatal.
    fn parse_header(&self, source: &mut dyn ByteSource) -> Result<(ByteOrder, u64), TiffError> {
        if source.size() < TIFF_HEADER_SIZE {
            return Err(messages::header_truncated(source.size()).into());
        }
        source
            .seek(0)
            .map_err(|_| TiffError::from(messages::read_failed(0)))?;

        let mark = source
            .read_bytes(2)
            .map_err(|_| TiffError::from(messages::read_failed(0)))?;
        let byte_order = match (mark[0], mark[1]) {
            (0x49, 0x49) => ByteOrder::LittleEndian,
            (0x4D, 0x4D) => ByteOrder::BigEndian,
            _ => return Err(messages::invalid_byte_order(0).into()),
        };

        let magic = source
            .read_u16(byte_order)
            .map_err(|_| TiffError::from(messages::read_failed(2)))?;
        if magic != MAGIC_42 {
            return Err(messages::invalid_magic(magic).into());
        }

        let first_ifd_offset = u64::from(
            source
                .read_u32(byte_order)
                .map_err(|_| TiffError::from(messages::read_failed(4)))?,
        );
        if first_ifd_offset == 0 {
            return Err(messages::no_ifd().into());
        }
        Ok((byte_order, first_ifd_offset))
    }

    /// Walk the IFD chain, parsing each top-level IFD and its sub-IFDs.
    fn parse_chain(
        &self,
        source: &mut dyn ByteSource,
        byte_order: ByteOrder,
        first_ifd_offset: u64,
        info: &mut RepInfo,
    ) -> Result<u8, TiffError> {
        let mut visited: BTreeSet<u64> = BTreeSet::new();
        let mut version = 4u8;
        let mut offset = first_ifd_offset;
        let mut index = 0usize;

        while offset != 0 {
            if self.options.abort.load(Ordering::Relaxed) {
                info.add_message(Message::info("PKG-4", "Processing aborted by request"));
                break;
            }
            if !visited.insert(offset) {
                return Err(messages::cyclic_ifd_chain(offset).into());
            }

            debug!(offset, index, "parsing top-level IFD");
            let mut main = MainIfd::new(self.options.raw);
            main.set_thumbnail(index == 1);
            let outcome = parse_ifd(
                source,
                byte_order,
                offset,
                self.byte_offset_is_valid,
                info,
                &mut main,
            )?;
            version = version.max(outcome.version);

            for error in main.take_errors() {
                info.add_message(error);
            }
            let mut property = main.build_property(offset);
            if self.options.verbose {
                property = append_entry_records(property, &outcome.entry_records);
            }
            info.add_property(property);

            for (kind, sub_offset) in main.sub_ifd_offsets() {
                if !visited.insert(sub_offset) {
                    return Err(messages::cyclic_ifd_chain(sub_offset).into());
                }
                debug!(offset = sub_offset, kind = kind.label(), "parsing sub-IFD");
                version = version.max(self.parse_sub_ifd(
                    source, byte_order, sub_offset, kind, info,
                )?);
            }

            offset = outcome.next;
            index += 1;
        }

        Ok(version)
    }

    fn parse_sub_ifd(
        &self,
        source: &mut dyn ByteSource,
        byte_order: ByteOrder,
        offset: u64,
        kind: IfdKind,
        info: &mut RepInfo,
    ) -> Result<u8, TiffError> {
        // Each sub-IFD kind gets its own dispatcher; the structural pass is
        // shared.
        match kind {
            IfdKind::Exif => {
                self.run_sub_ifd(source, byte_order, offset, info, ExifIfd::new(self.options.raw))
            }
            IfdKind::Gps => {
                self.run_sub_ifd(source, byte_order, offset, info, GpsIfd::new(self.options.raw))
            }
            IfdKind::Interop => self.run_sub_ifd(
                source,
                byte_order,
                offset,
                info,
                InteropIfd::new(self.options.raw),
            ),
            IfdKind::GlobalParams => self.run_sub_ifd(
                source,
                byte_order,
                offset,
                info,
                GlobalParamsIfd::new(self.options.raw),
            ),
            // Top-level IFDs go through parse_chain, never through here.
            IfdKind::Main => unreachable!("sub_ifd_offsets never yields Main"),
        }
    }

    fn run_sub_ifd<D: SubIfdDispatch>(
        &self,
        source: &mut dyn ByteSource,
        byte_order: ByteOrder,
        offset: u64,
        info: &mut RepInfo,
        mut dispatch: D,
    ) -> Result<u8, TiffError> {
        let outcome = parse_ifd(
            source,
            byte_order,
            offset,
            self.byte_offset_is_valid,
            info,
            &mut dispatch,
        )?;
        for error in dispatch.take_errors() {
            info.add_message(error);
        }
        info.add_property(dispatch.build_property(offset));
        Ok(outcome.version)
    }
}

/// Attach the raw tag records to an IFD property, for verbose output.
fn append_entry_records(
    property: crate::property::Property,
    records: &[crate::tiff::ifd::IfdEntryRecord],
) -> crate::property::Property {
    use crate::property::{Property, PropertyValue};

    let record_props: Vec<Property> = records
        .iter()
        .map(|r| {
            Property::new(
                "TagRecord",
                PropertyValue::IntegerArray(vec![
                    i64::from(r.tag),
                    i64::from(r.type_raw),
                    i64::from(r.count),
                    i64::from(r.value_or_offset),
                ]),
            )
        })
        .collect();

    let mut elements = property.children().to_vec();
    elements.push(Property::new(
        "TagRecords",
        PropertyValue::PropertyList(record_props),
    ));
    Property::new("IFD", PropertyValue::PropertyArray(elements))
}

// =============================================================================
// FormatModule implementation
// =============================================================================

impl FormatModule for TiffModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn is_random_access(&self) -> bool {
        true
    }

    fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    fn set_parameter(&mut self, parameter: &str) {
        // Accepted parameter: byteoffset=valid (tolerate odd value offsets).
        if parameter.eq_ignore_ascii_case("byteoffset=valid") {
            self.byte_offset_is_valid = true;
        }
    }

    fn reset(&mut self) {
        // All per-file state lives on the stack of parse_random_access;
        // parameters persist across files by design.
    }

    fn check_signatures(
        &mut self,
        _path: &Path,
        source: &mut dyn ByteSource,
        info: &mut RepInfo,
    ) -> Result<(), IoError> {
        let start = source.position();

        let mut accept = false;
        if source.size() >= 4 {
            source.seek(0)?;
            let prefix = source.read_bytes(4)?;
            let byte_order = match (prefix[0], prefix[1]) {
                (0x49, 0x49) => Some(ByteOrder::LittleEndian),
                (0x4D, 0x4D) => Some(ByteOrder::BigEndian),
                _ => None,
            };
            if let Some(order) = byte_order {
                accept = order.read_u16(&prefix[2..4]) == MAGIC_42;
            }
        }

        // Never leave the stream advanced past what was consumed.
        source.seek(start)?;

        if accept {
            info.sig_match.push(self.descriptor.name.to_string());
            info.set_valid(Validity::Undetermined);
        } else {
            info.add_message(
                Message::fatal("TIFF-HUL-9", "File does not begin with a TIFF header")
                    .at_offset(0),
            );
        }
        Ok(())
    }

    fn parse_random_access(&mut self, source: &mut dyn ByteSource, info: &mut RepInfo) {
        info.set_module(self.descriptor.name, self.descriptor.release);
        info.format = Some("TIFF".to_string());
        info.mime_type = Some("image/tiff".to_string());

        let result = self.parse_header(source).and_then(|(order, first)| {
            // The header is sound; structural soundness of the chain decides
            // the final status from here.
            info.set_well_formed(Validity::True);
            info.set_valid(Validity::True);
            self.parse_chain(source, order, first, info)
        });

        match result {
            Ok(version) => {
                info.version = Some(if version >= 6 { "6.0" } else { "4.0" }.to_string());
            }
            Err(TiffError { message }) => {
                // The fatal bubble ends here: either reported as Fatal, or
                // under suppress-errors downgraded to an Info with chaining
                // stopped. Prior IFDs' results are retained either way.
                if self.options.suppress_errors {
                    info.add_message(message.downgraded_to(Severity::Info));
                    if info.well_formed() == Validity::Undetermined {
                        info.set_well_formed(Validity::True);
                    }
                } else {
                    info.add_message(message);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
