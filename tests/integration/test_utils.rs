//! Test utilities for integration tests.
//!
//! Provides builders for synthetic TIFF files with various configurations,
//! and a handler that captures RepInfo snapshots for assertions.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use wellformed::{
    App, Message, ModuleDescriptor, OutputHandler, Property, RepInfo, Validity,
};

// =============================================================================
// Byte order
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

impl ByteOrderType {
    fn u16_bytes(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrderType::LittleEndian => value.to_le_bytes(),
            ByteOrderType::BigEndian => value.to_be_bytes(),
        }
    }

    fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrderType::LittleEndian => value.to_le_bytes(),
            ByteOrderType::BigEndian => value.to_be_bytes(),
        }
    }
}

// =============================================================================
// TiffBuilder / IfdBuilder
// =============================================================================

enum EntryValue {
    /// Value bytes stored in the 4-byte value field, left-justified.
    Inline([u8; 4]),
    /// Value data appended after the IFDs; the offset is patched in.
    External(Vec<u8>),
    /// Exact raw content for the value field (for crafting bad offsets).
    RawField(u32),
}

struct Entry {
    tag: u16,
    field_type: u16,
    count: u32,
    value: EntryValue,
}

/// Builds one IFD worth of entries. Entries are emitted in insertion order;
/// callers wanting out-of-order tags just insert them that way.
#[derive(Default)]
pub struct IfdBuilder {
    entries: Vec<Entry>,
    /// Overrides the next-IFD offset (for crafting cycles).
    next_override: Option<u32>,
}

impl IfdBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A SHORT scalar, stored inline.
    pub fn add_short(mut self, tag: u16, order: ByteOrderType, value: u16) -> Self {
        let mut field = [0u8; 4];
        field[..2].copy_from_slice(&order.u16_bytes(value));
        self.entries.push(Entry {
            tag,
            field_type: 3,
            count: 1,
            value: EntryValue::Inline(field),
        });
        self
    }

    /// A LONG scalar, stored inline.
    pub fn add_long(mut self, tag: u16, order: ByteOrderType, value: u32) -> Self {
        self.entries.push(Entry {
            tag,
            field_type: 4,
            count: 1,
            value: EntryValue::Inline(order.u32_bytes(value)),
        });
        self
    }

    /// An ASCII string, NUL-terminated, stored out of line.
    pub fn add_ascii(mut self, tag: u16, text: &str) -> Self {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        let count = data.len() as u32;
        self.entries.push(Entry {
            tag,
            field_type: 2,
            count,
            value: EntryValue::External(data),
        });
        self
    }

    /// A RATIONAL scalar, stored out of line.
    pub fn add_rational(mut self, tag: u16, order: ByteOrderType, num: u32, den: u32) -> Self {
        let mut data = Vec::with_capacity(8);
        data.extend_from_slice(&order.u32_bytes(num));
        data.extend_from_slice(&order.u32_bytes(den));
        self.entries.push(Entry {
            tag,
            field_type: 5,
            count: 1,
            value: EntryValue::External(data),
        });
        self
    }

    /// An array of SHORT values, inline if it fits, external otherwise.
    pub fn add_short_array(mut self, tag: u16, order: ByteOrderType, values: &[u16]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 2);
        for &v in values {
            data.extend_from_slice(&order.u16_bytes(v));
        }
        let count = values.len() as u32;
        let value = if data.len() <= 4 {
            let mut field = [0u8; 4];
            field[..data.len()].copy_from_slice(&data);
            EntryValue::Inline(field)
        } else {
            EntryValue::External(data)
        };
        self.entries.push(Entry {
            tag,
            field_type: 3,
            count,
            value,
        });
        self
    }

    /// An entry with full control of type, count, and the raw value field.
    pub fn add_raw_entry(mut self, tag: u16, field_type: u16, count: u32, field: u32) -> Self {
        self.entries.push(Entry {
            tag,
            field_type,
            count,
            value: EntryValue::RawField(field),
        });
        self
    }

    /// Force the next-IFD pointer of this IFD.
    pub fn with_next(mut self, next: u32) -> Self {
        self.next_override = Some(next);
        self
    }

    fn size(&self) -> u32 {
        2 + 12 * self.entries.len() as u32 + 4
    }
}

/// Builds a classic TIFF file in memory.
pub struct TiffBuilder {
    order: ByteOrderType,
    ifds: Vec<IfdBuilder>,
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            order: ByteOrderType::LittleEndian,
            ifds: Vec::new(),
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.order = order;
        self
    }

    pub fn add_ifd(mut self, ifd: IfdBuilder) -> Self {
        self.ifds.push(ifd);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let order = self.order;

        // Lay out the IFDs back to back after the 8-byte header, then the
        // external value data after the last IFD.
        let mut ifd_offsets = Vec::with_capacity(self.ifds.len());
        let mut position = 8u32;
        for ifd in &self.ifds {
            ifd_offsets.push(position);
            position += ifd.size();
        }
        let mut data_position = position;
        // Keep external data word-aligned.
        if data_position % 2 != 0 {
            data_position += 1;
        }

        // Assign external data offsets.
        let mut data_region = Vec::new();
        let mut external_offsets: Vec<Vec<u32>> = Vec::new();
        for ifd in &self.ifds {
            let mut offsets = Vec::new();
            for entry in &ifd.entries {
                if let EntryValue::External(data) = &entry.value {
                    offsets.push(data_position + data_region.len() as u32);
                    data_region.extend_from_slice(data);
                    if data_region.len() % 2 != 0 {
                        data_region.push(0);
                    }
                } else {
                    offsets.push(0);
                }
            }
            external_offsets.push(offsets);
        }

        // Serialize.
        let mut out = Vec::new();
        match order {
            ByteOrderType::LittleEndian => out.extend_from_slice(b"II"),
            ByteOrderType::BigEndian => out.extend_from_slice(b"MM"),
        }
        out.extend_from_slice(&order.u16_bytes(42));
        let first = ifd_offsets.first().copied().unwrap_or(0);
        out.extend_from_slice(&order.u32_bytes(first));

        for (i, ifd) in self.ifds.iter().enumerate() {
            out.extend_from_slice(&order.u16_bytes(ifd.entries.len() as u16));
            for (j, entry) in ifd.entries.iter().enumerate() {
                out.extend_from_slice(&order.u16_bytes(entry.tag));
                out.extend_from_slice(&order.u16_bytes(entry.field_type));
                out.extend_from_slice(&order.u32_bytes(entry.count));
                match &entry.value {
                    EntryValue::Inline(field) => out.extend_from_slice(field),
                    EntryValue::External(_) => {
                        out.extend_from_slice(&order.u32_bytes(external_offsets[i][j]));
                    }
                    EntryValue::RawField(field) => {
                        out.extend_from_slice(&order.u32_bytes(*field));
                    }
                }
            }
            let next = ifd
                .next_override
                .unwrap_or_else(|| ifd_offsets.get(i + 1).copied().unwrap_or(0));
            out.extend_from_slice(&order.u32_bytes(next));
        }

        while (out.len() as u32) < data_position {
            out.push(0);
        }
        out.extend_from_slice(&data_region);
        out
    }
}

/// A minimal well-formed little-endian TIFF: one IFD, ImageWidth = 100.
pub fn minimal_tiff() -> Vec<u8> {
    TiffBuilder::new()
        .add_ifd(IfdBuilder::new().add_short(256, ByteOrderType::LittleEndian, 100))
        .build()
}

// =============================================================================
// Snapshot handler
// =============================================================================

/// What the handler saw for one file.
pub struct InfoSnapshot {
    pub uri: String,
    pub well_formed: Validity,
    pub valid: Validity,
    pub version: Option<String>,
    pub format: Option<String>,
    pub sig_match: Vec<String>,
    pub messages: Vec<Message>,
    pub properties: Vec<Property>,
    pub checksums: Vec<(String, String)>,
}

/// Captures every RepInfo shown, for assertions after the run.
#[derive(Default)]
pub struct SnapshotHandler {
    pub snapshots: Vec<InfoSnapshot>,
    pub directories: Vec<String>,
}

impl OutputHandler for SnapshotHandler {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn show_header(&mut self) {}
    fn show_footer(&mut self) {}

    fn show_info(&mut self, info: &RepInfo) {
        self.snapshots.push(InfoSnapshot {
            uri: info.uri.clone(),
            well_formed: info.well_formed(),
            valid: info.valid(),
            version: info.version.clone(),
            format: info.format.clone(),
            sig_match: info.sig_match.clone(),
            messages: info.messages().to_vec(),
            properties: info.properties().to_vec(),
            checksums: info
                .checksums()
                .iter()
                .map(|c| (c.algorithm.name().to_string(), c.value.clone()))
                .collect(),
        });
    }

    fn show_module(&mut self, _module: &ModuleDescriptor) {}
    fn show_app(&mut self, _app: &App) {}

    fn start_directory(&mut self, path: &str) {
        self.directories.push(path.to_string());
    }

    fn close(&mut self) {}
}

// =============================================================================
// Filesystem helpers
// =============================================================================

/// A temp directory with files written into it.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create fixture file");
        file.write_all(data).expect("write fixture file");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
