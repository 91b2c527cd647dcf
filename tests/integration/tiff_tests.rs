//! End-to-end TIFF scenarios: synthetic files on disk, driven through the
//! dispatcher, results observed through a capturing handler.

use wellformed::{
    Dispatcher, FormatModule, PropertyValue, Rational, Severity, TiffModule, Validity,
};

use crate::test_utils::{
    minimal_tiff, ByteOrderType, Fixture, IfdBuilder, SnapshotHandler, TiffBuilder,
};

fn run_bytes(data: &[u8]) -> SnapshotHandler {
    run_bytes_with(data, |_| {})
}

fn run_bytes_with(data: &[u8], configure: impl FnOnce(&mut Dispatcher)) -> SnapshotHandler {
    let fixture = Fixture::new();
    let path = fixture.write("file.tif", data);

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Box::new(TiffModule::new()));
    configure(&mut dispatcher);

    let mut handler = SnapshotHandler::default();
    dispatcher.process(&path, &mut handler);
    handler
}

fn run_bytes_with_params(data: &[u8], parameters: &[&str]) -> SnapshotHandler {
    let fixture = Fixture::new();
    let path = fixture.write("file.tif", data);

    let mut module = TiffModule::new();
    for parameter in parameters {
        module.set_parameter(parameter);
    }
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Box::new(module));

    let mut handler = SnapshotHandler::default();
    dispatcher.process(&path, &mut handler);
    handler
}

// -----------------------------------------------------------------------------
// Scenario: little-endian TIFF with one IFD
// -----------------------------------------------------------------------------

#[test]
fn test_little_endian_single_ifd() {
    let data = minimal_tiff();
    // Header is exactly II, 42, first-IFD offset 8.
    assert_eq!(
        &data[..8],
        &[0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]
    );

    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::True);
    assert_eq!(snapshot.valid, Validity::True);
    assert_eq!(snapshot.format.as_deref(), Some("TIFF"));
    let width = snapshot.properties[0].find("ImageWidth").unwrap();
    assert_eq!(width.value(), &PropertyValue::Integer(100));
}

#[test]
fn test_big_endian_single_ifd() {
    let data = TiffBuilder::new()
        .with_byte_order(ByteOrderType::BigEndian)
        .add_ifd(IfdBuilder::new().add_short(256, ByteOrderType::BigEndian, 2048))
        .build();
    assert_eq!(&data[..4], &[0x4D, 0x4D, 0x00, 0x2A]);

    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::True);
    let width = snapshot.properties[0].find("ImageWidth").unwrap();
    assert_eq!(width.value(), &PropertyValue::Integer(2048));
}

// -----------------------------------------------------------------------------
// Scenario: out-of-order tags
// -----------------------------------------------------------------------------

#[test]
fn test_out_of_order_tags() {
    let order = ByteOrderType::LittleEndian;
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::new()
                .add_short(257, order, 72)
                .add_short(256, order, 100),
        )
        .build();

    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::True);
    assert_eq!(snapshot.valid, Validity::False);
    let errors: Vec<_> = snapshot
        .messages
        .iter()
        .filter(|m| m.id == "TIFF-HUL-2")
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].severity, Severity::Error);
}

// -----------------------------------------------------------------------------
// Scenario: odd out-of-line offset
// -----------------------------------------------------------------------------

fn odd_offset_tiff() -> Vec<u8> {
    // StripByteCounts, LONG, count 3 (12 bytes, out of line), offset 0x11.
    let mut data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().add_raw_entry(279, 4, 3, 0x11))
        .build();
    // Make the odd offset readable so only the alignment is at fault.
    data.resize(data.len() + 16, 0);
    data
}

#[test]
fn test_odd_offset_is_fatal() {
    let handler = run_bytes(&odd_offset_tiff());
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::False);
    let fatal = snapshot
        .messages
        .iter()
        .find(|m| m.id == "TIFF-HUL-4")
        .unwrap();
    assert_eq!(fatal.severity, Severity::Fatal);
    assert!(fatal.text.contains("17"));
}

#[test]
fn test_odd_offset_tolerated_with_parameter() {
    let handler = run_bytes_with_params(&odd_offset_tiff(), &["byteoffset=valid"]);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::True);
    let infos: Vec<_> = snapshot
        .messages
        .iter()
        .filter(|m| m.id == "TIFF-HUL-4")
        .collect();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].severity, Severity::Info);
}

// -----------------------------------------------------------------------------
// Scenario: cyclic IFD chain
// -----------------------------------------------------------------------------

#[test]
fn test_cyclic_ifd_chain() {
    let order = ByteOrderType::LittleEndian;
    // IFD A at 8 (18 bytes) -> IFD B at 26 -> back to A.
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().add_short(256, order, 100))
        .add_ifd(IfdBuilder::new().add_short(256, order, 50).with_next(8))
        .build();

    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::False);
    assert!(snapshot.messages.iter().any(|m| m.id == "TIFF-HUL-12"));
    // Both IFDs' pre-cycle contents are retained.
    assert_eq!(snapshot.properties.len(), 2);
    assert_eq!(
        snapshot.properties[0].find("ImageWidth").unwrap().value(),
        &PropertyValue::Integer(100)
    );
    assert_eq!(
        snapshot.properties[1].find("ImageWidth").unwrap().value(),
        &PropertyValue::Integer(50)
    );
}

// -----------------------------------------------------------------------------
// Scenario: unknown entry type
// -----------------------------------------------------------------------------

#[test]
fn test_unknown_type_entry_is_skipped() {
    let order = ByteOrderType::LittleEndian;
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::new()
                .add_raw_entry(256, 99, 1, 100)
                .add_short(257, order, 72),
        )
        .build();

    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert!(snapshot.messages.iter().any(|m| m.id == "TIFF-HUL-3"));
    // The other entry was still processed.
    let length = snapshot.properties[0].find("ImageLength").unwrap();
    assert_eq!(length.value(), &PropertyValue::Integer(72));
    // The bad entry produced no ImageWidth.
    assert!(snapshot.properties[0].find("ImageWidth").is_none());
}

// -----------------------------------------------------------------------------
// Scenario: signature-only mode
// -----------------------------------------------------------------------------

#[test]
fn test_signature_only_mode() {
    let handler = run_bytes_with(&minimal_tiff(), |dispatcher| {
        dispatcher.set_signature_only(true);
    });
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.sig_match, vec!["TIFF-hul".to_string()]);
    assert_eq!(snapshot.valid, Validity::Undetermined);
    assert_eq!(snapshot.well_formed, Validity::Undetermined);
    // No parse ran: no properties, no version.
    assert!(snapshot.properties.is_empty());
    assert!(snapshot.version.is_none());
}

// -----------------------------------------------------------------------------
// Boundaries and additional behavior
// -----------------------------------------------------------------------------

#[test]
fn test_empty_ifd_parses() {
    let data = TiffBuilder::new().add_ifd(IfdBuilder::new()).build();
    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::True);
    assert_eq!(snapshot.valid, Validity::True);
    assert_eq!(snapshot.properties.len(), 1);
}

#[test]
fn test_huge_count_rejected_before_allocation() {
    // BitsPerSample with count near u32::MAX; checkCountArray must reject it
    // as a fatal instead of attempting the allocation.
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().add_raw_entry(258, 3, u32::MAX, 8))
        .build();
    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::False);
    assert!(snapshot.messages.iter().any(|m| m.id == "TIFF-HUL-6"));
}

#[test]
fn test_inline_offset_boundary() {
    let order = ByteOrderType::LittleEndian;
    // count=2 SHORTs (4 bytes) inline; count=3 SHORTs (6 bytes) external.
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::new()
                .add_short_array(258, order, &[8, 8])
                .add_short_array(301, order, &[1, 2, 3]),
        )
        .build();
    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::True);
    let bits = snapshot.properties[0].find("BitsPerSample").unwrap();
    assert_eq!(bits.value(), &PropertyValue::IntegerArray(vec![8, 8]));
}

#[test]
fn test_rational_resolution_interpreted_and_raw() {
    let order = ByteOrderType::LittleEndian;
    let build = || {
        TiffBuilder::new()
            .add_ifd(
                IfdBuilder::new()
                    .add_rational(282, order, 300, 1)
                    .add_rational(283, order, 72, 1),
            )
            .build()
    };

    // Interpreted mode: the evaluated ratio as a string.
    let handler = run_bytes(&build());
    let x_res = handler.snapshots[0].properties[0].find("XResolution").unwrap();
    assert_eq!(x_res.value(), &PropertyValue::String("300".to_string()));

    // Raw mode: the exact pair.
    let handler = run_bytes_with(&build(), |dispatcher| {
        dispatcher.set_options(wellformed::ParseOptions {
            raw: true,
            ..wellformed::ParseOptions::default()
        });
    });
    let x_res = handler.snapshots[0].properties[0].find("XResolution").unwrap();
    assert_eq!(x_res.value(), &PropertyValue::Rational(Rational::new(300, 1)));
}

#[test]
fn test_ascii_tag_value() {
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::new()
                .add_ascii(270, "scanned by wellformed")
                .add_ascii(305, "scanner-fw 2.1"),
        )
        .build();
    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::True);
    let description = snapshot.properties[0].find("ImageDescription").unwrap();
    assert_eq!(
        description.value(),
        &PropertyValue::String("scanned by wellformed".to_string())
    );
    let software = snapshot.properties[0].find("Software").unwrap();
    assert_eq!(
        software.value(),
        &PropertyValue::String("scanner-fw 2.1".to_string())
    );
}

#[test]
fn test_version_promotion_reported() {
    // A DOUBLE-typed entry (type 12) promotes the reported version to 6.0.
    let order = ByteOrderType::LittleEndian;
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::new()
                .add_short(256, order, 100)
                .add_raw_entry(34000, 12, 1, 0x0100), // DOUBLE at offset 256
        )
        .build();
    // Pad so the out-of-line DOUBLE at offset 256 is readable.
    let mut data = data;
    data.resize(0x0100 + 8, 0);

    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.version.as_deref(), Some("6.0"));

    // Without revision-6 types the version stays 4.0.
    let handler = run_bytes(&minimal_tiff());
    assert_eq!(handler.snapshots[0].version.as_deref(), Some("4.0"));
}

#[test]
fn test_exif_sub_ifd_parsed() {
    // Main IFD at 8 with one entry pointing at an Exif IFD at 26, which
    // carries PixelXDimension = 640.
    let mut data = vec![
        0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, // header
        0x01, 0x00, // 1 entry
        0x69, 0x87, // tag 34665 ExifIFD
        0x04, 0x00, // LONG
        0x01, 0x00, 0x00, 0x00, // count 1
        0x1A, 0x00, 0x00, 0x00, // offset 26
        0x00, 0x00, 0x00, 0x00, // next = 0
    ];
    data.extend_from_slice(&[
        0x01, 0x00, // 1 entry
        0x02, 0xA0, // tag 40962 PixelXDimension
        0x03, 0x00, // SHORT
        0x01, 0x00, 0x00, 0x00, // count 1
        0x80, 0x02, 0x00, 0x00, // value 640
        0x00, 0x00, 0x00, 0x00, // next = 0
    ]);

    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::True);
    assert_eq!(snapshot.properties.len(), 2);
    let exif = &snapshot.properties[1];
    assert_eq!(
        exif.child_by_name("Type").unwrap().value(),
        &PropertyValue::String("Exif".to_string())
    );
    assert_eq!(
        exif.find("PixelXDimension").unwrap().value(),
        &PropertyValue::Integer(640)
    );
}

#[test]
fn test_suppress_errors_returns_populated_repinfo() {
    // First IFD is fine; its successor pointer runs past EOF.
    let order = ByteOrderType::LittleEndian;
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().add_short(256, order, 100).with_next(0xF000))
        .build();

    let handler = run_bytes_with(&data, |dispatcher| {
        dispatcher.set_options(wellformed::ParseOptions {
            suppress_errors: true,
            ..wellformed::ParseOptions::default()
        });
    });
    let snapshot = &handler.snapshots[0];
    // The fatal was downgraded; the first IFD's results are present.
    assert_eq!(snapshot.well_formed, Validity::True);
    assert_eq!(snapshot.properties.len(), 1);
    assert!(snapshot
        .messages
        .iter()
        .any(|m| m.id == "TIFF-HUL-1" && m.severity == Severity::Info));
}

#[test]
fn test_niso_metadata_populated() {
    let order = ByteOrderType::LittleEndian;
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::new()
                .add_short(256, order, 640)
                .add_short(257, order, 480)
                .add_short(259, order, 1)
                .add_short(262, order, 2)
                .add_short(277, order, 3),
        )
        .build();
    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    let niso = snapshot.properties[0].find("NisoImageMetadata").unwrap();
    match niso.value() {
        PropertyValue::NisoImageMetadata(meta) => {
            assert_eq!(meta.image_width, Some(640));
            assert_eq!(meta.image_length, Some(480));
            assert_eq!(meta.compression_scheme, Some(1));
            assert_eq!(meta.color_space, Some(2));
            assert_eq!(meta.samples_per_pixel, Some(3));
        }
        other => panic!("expected NISO metadata, got {other:?}"),
    }
}

#[test]
fn test_compression_label_interpreted() {
    let order = ByteOrderType::LittleEndian;
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().add_short(259, order, 5))
        .build();
    let handler = run_bytes(&data);
    let compression = handler.snapshots[0].properties[0].find("Compression").unwrap();
    assert_eq!(compression.value(), &PropertyValue::String("LZW".to_string()));
}

#[test]
fn test_bad_enum_value_is_soft_error() {
    let order = ByteOrderType::LittleEndian;
    // Orientation 42 has no label.
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().add_short(274, order, 42))
        .build();
    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    // Still well-formed; the bad value surfaces as a TIFF-HUL-66 error and
    // the property falls back to the raw integer.
    assert_eq!(snapshot.well_formed, Validity::True);
    assert_eq!(snapshot.valid, Validity::False);
    assert!(snapshot.messages.iter().any(|m| m.id == "TIFF-HUL-66"));
    let orientation = snapshot.properties[0].find("Orientation").unwrap();
    assert_eq!(orientation.value(), &PropertyValue::Integer(42));
}

#[test]
fn test_strip_and_tile_conflict_detected() {
    let order = ByteOrderType::LittleEndian;
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::new()
                .add_long(273, order, 0x100)
                .add_long(324, order, 0x200),
        )
        .build();
    let handler = run_bytes(&data);
    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::True);
    assert_eq!(snapshot.valid, Validity::False);
    assert!(snapshot.messages.iter().any(|m| m.id == "TIFF-HUL-13"));
}
