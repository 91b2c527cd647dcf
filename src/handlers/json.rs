//! JSON output.
//!
//! Files are collected as they are shown and written as one document at
//! footer time, so the output is always a single well-formed JSON value.

use std::io::Write;

use serde_json::{json, Map, Value};

use crate::handler::{App, OutputHandler};
use crate::module::ModuleDescriptor;
use crate::niso::NisoImageMetadata;
use crate::property::{Property, PropertyValue};
use crate::repinfo::RepInfo;

// =============================================================================
// JsonHandler
// =============================================================================

/// The JSON output handler.
pub struct JsonHandler {
    writer: Box<dyn Write>,
    app: Option<Value>,
    files: Vec<Value>,
}

impl JsonHandler {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            app: None,
            files: Vec::new(),
        }
    }
}

impl OutputHandler for JsonHandler {
    fn name(&self) -> &'static str {
        "json"
    }

    fn show_header(&mut self) {}

    fn show_footer(&mut self) {
        let document = json!({
            "application": self.app.take().unwrap_or(Value::Null),
            "files": std::mem::take(&mut self.files),
        });
        let _ = serde_json::to_writer_pretty(&mut self.writer, &document);
        let _ = writeln!(self.writer);
        let _ = self.writer.flush();
    }

    fn show_info(&mut self, info: &RepInfo) {
        self.files.push(info_to_json(info));
    }

    fn show_module(&mut self, module: &ModuleDescriptor) {
        // Module descriptions ride along in the application object.
        let value = json!({
            "name": module.name,
            "release": module.release,
            "date": module.date,
            "formats": module.formats,
            "mimeTypes": module.mime_types,
            "vendor": module.vendor,
            "specifications": module.specifications,
        });
        match self.app.as_mut().and_then(|a| a.as_object_mut()) {
            Some(app) => {
                if let Some(modules) = app
                    .entry("modules")
                    .or_insert_with(|| Value::Array(Vec::new()))
                    .as_array_mut()
                {
                    modules.push(value);
                }
            }
            None => {
                self.app = Some(json!({ "modules": [value] }));
            }
        }
    }

    fn show_handler(&mut self) {
        match self.app.as_mut().and_then(|a| a.as_object_mut()) {
            Some(app) => {
                app.insert("handler".into(), Value::from("json"));
            }
            None => {
                self.app = Some(json!({ "handler": "json" }));
            }
        }
    }

    fn show_app(&mut self, app: &App) {
        let mut object = Map::new();
        object.insert("name".into(), Value::from(app.name));
        object.insert("release".into(), Value::from(app.release));
        object.insert("date".into(), Value::from(app.date));
        if let Some(Value::Object(existing)) = self.app.take() {
            for (key, value) in existing {
                object.entry(key).or_insert(value);
            }
        }
        self.app = Some(Value::Object(object));
    }

    fn close(&mut self) {
        let _ = self.writer.flush();
    }
}

// =============================================================================
// Conversion
// =============================================================================

fn info_to_json(info: &RepInfo) -> Value {
    let messages: Vec<Value> = info
        .messages()
        .iter()
        .map(|m| {
            let mut object = Map::new();
            object.insert("id".into(), Value::from(m.id));
            object.insert("severity".into(), Value::from(m.severity.label()));
            object.insert("text".into(), Value::from(m.text.clone()));
            if let Some(offset) = m.offset {
                object.insert("offset".into(), Value::from(offset));
            }
            if let Some(sub) = &m.sub_message {
                object.insert("subMessage".into(), Value::from(sub.clone()));
            }
            Value::Object(object)
        })
        .collect();

    let checksums: Map<String, Value> = info
        .checksums()
        .iter()
        .map(|c| (c.algorithm.name().to_string(), Value::from(c.value.clone())))
        .collect();

    json!({
        "uri": info.uri,
        "module": info.module_name,
        "moduleRelease": info.module_release,
        "format": info.format,
        "version": info.version,
        "mimeType": info.mime_type,
        "size": info.size,
        "created": info.created.map(|d| d.to_rfc3339()),
        "lastModified": info.last_modified.map(|d| d.to_rfc3339()),
        "wellFormed": info.well_formed().label(),
        "valid": info.valid().label(),
        "sigMatch": info.sig_match,
        "messages": messages,
        "checksums": checksums,
        "properties": info.properties().iter().map(property_to_json).collect::<Vec<_>>(),
    })
}

fn property_to_json(property: &Property) -> Value {
    json!({
        "name": property.name(),
        "type": property.type_name(),
        "arity": property.arity().name(),
        "value": value_to_json(property.value()),
    })
}

fn value_to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Boolean(v) => Value::from(*v),
        PropertyValue::Integer(v) => Value::from(*v),
        PropertyValue::Float(v) => Value::from(*v),
        PropertyValue::Double(v) => Value::from(*v),
        PropertyValue::Rational(r) => json!([r.numerator(), r.denominator()]),
        PropertyValue::String(s) => Value::from(s.clone()),
        PropertyValue::Bytes(b) => Value::from(b.len()),
        PropertyValue::Date(d) => Value::from(d.to_rfc3339()),
        PropertyValue::NisoImageMetadata(niso) => niso_to_json(niso),
        PropertyValue::IntegerArray(values) => json!(values),
        PropertyValue::FloatArray(values) => json!(values),
        PropertyValue::DoubleArray(values) => json!(values),
        PropertyValue::RationalArray(values) => Value::Array(
            values
                .iter()
                .map(|r| json!([r.numerator(), r.denominator()]))
                .collect(),
        ),
        PropertyValue::StringArray(values) => json!(values),
        PropertyValue::StringList(values) => json!(values),
        PropertyValue::StringSet(values) => json!(values),
        PropertyValue::PropertyArray(children) | PropertyValue::PropertyList(children) => {
            Value::Array(children.iter().map(property_to_json).collect())
        }
        PropertyValue::PropertyMap(map) => Value::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), property_to_json(child)))
                .collect(),
        ),
    }
}

fn niso_to_json(niso: &NisoImageMetadata) -> Value {
    let mut object = Map::new();
    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            object.insert(key.to_string(), value);
        }
    };
    put("byteOrder", niso.byte_order.clone().map(Value::from));
    put("compressionScheme", niso.compression_scheme.map(Value::from));
    put("imageWidth", niso.image_width.map(Value::from));
    put("imageLength", niso.image_length.map(Value::from));
    put("colorSpace", niso.color_space.map(Value::from));
    put("orientation", niso.orientation.map(Value::from));
    put(
        "samplingFrequencyUnit",
        niso.sampling_frequency_unit.map(Value::from),
    );
    put(
        "xSamplingFrequency",
        niso.x_sampling_frequency
            .map(|r| json!([r.numerator(), r.denominator()])),
    );
    put(
        "ySamplingFrequency",
        niso.y_sampling_frequency
            .map(|r| json!([r.numerator(), r.denominator()])),
    );
    put(
        "bitsPerSample",
        niso.bits_per_sample.as_ref().map(|v| json!(v)),
    );
    put("samplesPerPixel", niso.samples_per_pixel.map(Value::from));
    put("rowsPerStrip", niso.rows_per_strip.map(Value::from));
    put("tileWidth", niso.tile_width.map(Value::from));
    put("tileLength", niso.tile_length.map(Value::from));
    put(
        "planarConfiguration",
        niso.planar_configuration.map(Value::from),
    );
    put(
        "scanningSoftware",
        niso.scanning_software.clone().map(Value::from),
    );
    put(
        "dateTimeCreated",
        niso.date_time_created.clone().map(Value::from),
    );
    Value::Object(object)
}

// =============================================================================
// Tests
// =============================================================================
