//! Plain-text output.
//!
//! Renders each RepInfo as an indented block, one per file, in the order the
//! dispatcher produced them.

use std::io::Write;

use crate::handler::{
    double_array, integer_array, rational_array_pairs, App, Indent, OutputHandler,
};
use crate::module::ModuleDescriptor;
use crate::niso::NisoImageMetadata;
use crate::property::{Property, PropertyValue};
use crate::repinfo::{RepInfo, Validity};

/// Human-readable status line for the two three-valued fields.
pub fn status_label(info: &RepInfo) -> &'static str {
    match (info.well_formed(), info.valid()) {
        (Validity::True, Validity::True) => "Well-Formed and valid",
        (Validity::True, Validity::False) => "Well-Formed, but not valid",
        (Validity::True, Validity::Undetermined) => "Well-Formed",
        (Validity::False, _) => "Not well-formed",
        (Validity::Undetermined, _) => "Unknown",
    }
}

// =============================================================================
// TextHandler
// =============================================================================

/// The plain-text output handler.
pub struct TextHandler {
    writer: Box<dyn Write>,
    indent: Indent,
}

impl TextHandler {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            indent: Indent::new(),
        }
    }

    fn line(&mut self, text: &str) {
        let margin = self.indent.margin();
        let _ = writeln!(self.writer, "{margin}{text}");
    }

    fn show_property(&mut self, property: &Property) {
        let name = property.name().to_string();
        match property.value() {
            PropertyValue::Boolean(v) => self.line(&format!("{name}: {v}")),
            PropertyValue::Integer(v) => self.line(&format!("{name}: {v}")),
            PropertyValue::Float(v) => self.line(&format!("{name}: {v}")),
            PropertyValue::Double(v) => self.line(&format!("{name}: {v}")),
            PropertyValue::Rational(r) => self.line(&format!("{name}: {r}")),
            PropertyValue::String(s) => self.line(&format!("{name}: {s}")),
            PropertyValue::Date(d) => self.line(&format!("{name}: {}", d.to_rfc3339())),
            PropertyValue::Bytes(b) => self.line(&format!("{name}: {} bytes", b.len())),
            PropertyValue::NisoImageMetadata(niso) => {
                self.line(&format!("{name}:"));
                self.indent.push();
                self.show_niso(niso);
                self.indent.pop();
            }
            PropertyValue::IntegerArray(values) => {
                self.line(&format!("{name}: {}", integer_array(values)));
            }
            PropertyValue::FloatArray(values) => {
                let rendered = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.line(&format!("{name}: {rendered}"));
            }
            PropertyValue::DoubleArray(values) => {
                self.line(&format!("{name}: {}", double_array(values)));
            }
            PropertyValue::RationalArray(values) => {
                self.line(&format!("{name}: {}", rational_array_pairs(values)));
            }
            PropertyValue::StringArray(values) => {
                self.line(&format!("{name}: {}", values.join(", ")));
            }
            PropertyValue::StringList(values) => {
                self.line(&format!("{name}: {}", values.join(", ")));
            }
            PropertyValue::StringSet(values) => {
                let rendered = values.iter().cloned().collect::<Vec<_>>().join(", ");
                self.line(&format!("{name}: {rendered}"));
            }
            PropertyValue::PropertyArray(children) | PropertyValue::PropertyList(children) => {
                self.line(&format!("{name}:"));
                self.indent.push();
                for child in children {
                    self.show_property(child);
                }
                self.indent.pop();
            }
            PropertyValue::PropertyMap(map) => {
                self.line(&format!("{name}:"));
                self.indent.push();
                for child in map.values() {
                    self.show_property(child);
                }
                self.indent.pop();
            }
        }
    }

    fn show_niso(&mut self, niso: &NisoImageMetadata) {
        if let Some(v) = &niso.byte_order {
            self.line(&format!("ByteOrder: {v}"));
        }
        if let Some(v) = niso.compression_scheme {
            self.line(&format!("CompressionScheme: {v}"));
        }
        if let Some(v) = niso.image_width {
            self.line(&format!("ImageWidth: {v}"));
        }
        if let Some(v) = niso.image_length {
            self.line(&format!("ImageLength: {v}"));
        }
        if let Some(v) = niso.color_space {
            self.line(&format!("ColorSpace: {v}"));
        }
        if let Some(v) = niso.orientation {
            self.line(&format!("Orientation: {v}"));
        }
        if let Some(v) = niso.sampling_frequency_unit {
            self.line(&format!("SamplingFrequencyUnit: {v}"));
        }
        if let Some(v) = niso.x_sampling_frequency {
            self.line(&format!("XSamplingFrequency: {v}"));
        }
        if let Some(v) = niso.y_sampling_frequency {
            self.line(&format!("YSamplingFrequency: {v}"));
        }
        if let Some(v) = &niso.bits_per_sample {
            let rendered = v
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            self.line(&format!("BitsPerSample: {rendered}"));
        }
        if let Some(v) = niso.samples_per_pixel {
            self.line(&format!("SamplesPerPixel: {v}"));
        }
        if let Some(v) = niso.rows_per_strip {
            self.line(&format!("RowsPerStrip: {v}"));
        }
        if let Some(v) = niso.tile_width {
            self.line(&format!("TileWidth: {v}"));
        }
        if let Some(v) = niso.tile_length {
            self.line(&format!("TileLength: {v}"));
        }
        if let Some(v) = niso.planar_configuration {
            self.line(&format!("PlanarConfiguration: {v}"));
        }
        if let Some(v) = &niso.scanning_software {
            self.line(&format!("ScanningSoftware: {v}"));
        }
        if let Some(v) = &niso.date_time_created {
            self.line(&format!("DateTimeCreated: {v}"));
        }
    }
}

impl OutputHandler for TextHandler {
    fn name(&self) -> &'static str {
        "text"
    }

    fn show_header(&mut self) {}

    fn show_footer(&mut self) {
        let _ = self.writer.flush();
    }

    fn show_info(&mut self, info: &RepInfo) {
        self.line(&format!("RepresentationInformation: {}", info.uri));
        self.indent.push();

        if let (Some(name), Some(release)) = (&info.module_name, &info.module_release) {
            self.line(&format!("ReportingModule: {name}, Rel. {release}"));
        }
        if let Some(modified) = &info.last_modified {
            self.line(&format!("LastModified: {}", modified.to_rfc3339()));
        }
        if let Some(size) = info.size {
            self.line(&format!("Size: {size}"));
        }
        if let Some(format) = &info.format {
            self.line(&format!("Format: {format}"));
        }
        if let Some(version) = &info.version {
            self.line(&format!("Version: {version}"));
        }
        self.line(&format!("Status: {}", status_label(info)));
        if !info.sig_match.is_empty() {
            self.line(&format!("SignatureMatches: {}", info.sig_match.join(", ")));
        }
        if let Some(mime) = &info.mime_type {
            self.line(&format!("MIMEtype: {mime}"));
        }

        if !info.messages().is_empty() {
            self.line("Messages:");
            self.indent.push();
            for message in info.messages() {
                let mut rendered = format!(
                    "{} [{}]: {}",
                    message.severity.label(),
                    message.id,
                    message.text
                );
                if let Some(offset) = message.offset {
                    rendered.push_str(&format!(" (offset {offset})"));
                }
                if let Some(sub) = &message.sub_message {
                    rendered.push_str(&format!("; {sub}"));
                }
                self.line(&rendered);
            }
            self.indent.pop();
        }

        for checksum in info.checksums() {
            self.line(&format!("Checksum ({}): {}", checksum.algorithm, checksum.value));
        }

        for property in info.properties() {
            self.show_property(property);
        }

        self.indent.pop();
        self.line("");
    }

    fn show_module(&mut self, module: &ModuleDescriptor) {
        self.line(&format!("Module: {}, Rel. {} ({})", module.name, module.release, module.date));
        self.indent.push();
        self.line(&format!("Formats: {}", module.formats.join(", ")));
        self.line(&format!("MIMEtypes: {}", module.mime_types.join(", ")));
        self.line(&format!("Vendor: {}", module.vendor));
        for specification in &module.specifications {
            self.line(&format!("Specification: {specification}"));
        }
        self.indent.pop();
    }

    fn show_handler(&mut self) {
        self.line("Handler: text");
    }

    fn show_app(&mut self, app: &App) {
        self.line(&format!("{} (Rel. {}, {})", app.name, app.release, app.date));
    }

    fn start_directory(&mut self, path: &str) {
        self.line(&format!("Directory: {path}"));
        self.indent.push();
    }

    fn end_directory(&mut self) {
        self.indent.pop();
    }

    fn close(&mut self) {
        let _ = self.writer.flush();
    }
}

// =============================================================================
// Tests
// =============================================================================
