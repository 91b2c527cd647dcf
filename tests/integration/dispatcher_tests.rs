//! Dispatcher and handler behavior over real directory trees.

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use wellformed::{
    App, ChecksumAlgorithm, Dispatcher, JsonHandler, OutputHandler, TextHandler, TiffModule,
    Validity,
};

use crate::test_utils::{minimal_tiff, Fixture, SnapshotHandler};

fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Box::new(TiffModule::new()));
    dispatcher
}

/// A writer that collects output for assertions.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Directory traversal
// -----------------------------------------------------------------------------

#[test]
fn test_recursive_walk_depth_first_name_sorted() {
    let fixture = Fixture::new();
    fixture.write("b.tif", &minimal_tiff());
    std::fs::create_dir(fixture.path().join("a-subdir")).unwrap();
    fixture.write("a-subdir/inner.tif", &minimal_tiff());
    fixture.write("c.tif", &minimal_tiff());

    let mut handler = SnapshotHandler::default();
    dispatcher().process(fixture.path(), &mut handler);

    // Depth-first: the subdirectory (sorting before b.tif) is fully
    // processed before its siblings.
    let uris: Vec<&str> = handler.snapshots.iter().map(|s| s.uri.as_str()).collect();
    assert_eq!(uris.len(), 3);
    assert!(uris[0].ends_with("inner.tif"));
    assert!(uris[1].ends_with("b.tif"));
    assert!(uris[2].ends_with("c.tif"));
    assert_eq!(handler.directories.len(), 2);
}

#[test]
fn test_mixed_directory_keeps_sweeping_after_bad_file() {
    let fixture = Fixture::new();
    fixture.write("a.tif", b"II\x2A\x00garbage-after-signature");
    fixture.write("b.tif", &minimal_tiff());

    let mut handler = SnapshotHandler::default();
    dispatcher().process(fixture.path(), &mut handler);

    assert_eq!(handler.snapshots.len(), 2);
    // The malformed sibling did not stop the sweep.
    assert_eq!(handler.snapshots[0].well_formed, Validity::False);
    assert_eq!(handler.snapshots[1].well_formed, Validity::True);
}

#[test]
fn test_file_uri_scheme() {
    let fixture = Fixture::new();
    let path = fixture.write("scan.tif", &minimal_tiff());

    let mut handler = SnapshotHandler::default();
    dispatcher().process(&path, &mut handler);

    assert!(handler.snapshots[0].uri.starts_with("file://"));
}

// -----------------------------------------------------------------------------
// Checksums
// -----------------------------------------------------------------------------

#[test]
fn test_all_checksum_algorithms() {
    let fixture = Fixture::new();
    let path = fixture.write("scan.tif", &minimal_tiff());

    let mut dispatcher = dispatcher();
    dispatcher.set_checksums(vec![
        ChecksumAlgorithm::Crc32,
        ChecksumAlgorithm::Md5,
        ChecksumAlgorithm::Sha1,
        ChecksumAlgorithm::Sha256,
    ]);
    let mut handler = SnapshotHandler::default();
    dispatcher.process(&path, &mut handler);

    let checksums = &handler.snapshots[0].checksums;
    let lengths: Vec<(&str, usize)> = checksums
        .iter()
        .map(|(name, value)| (name.as_str(), value.len()))
        .collect();
    assert_eq!(
        lengths,
        vec![("crc32", 8), ("md5", 32), ("sha1", 40), ("sha256", 64)]
    );
    // Digests are hex.
    for (_, value) in checksums {
        assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

// -----------------------------------------------------------------------------
// Handlers end to end
// -----------------------------------------------------------------------------

#[test]
fn test_text_handler_end_to_end() {
    let fixture = Fixture::new();
    let path = fixture.write("scan.tif", &minimal_tiff());

    let buffer = SharedBuffer::default();
    let mut handler = TextHandler::new(Box::new(buffer.clone()));
    handler.show_header();
    handler.show_app(&App::new("wellformed", "0.3.0", "2026-02-12"));
    dispatcher().process(&path, &mut handler);
    handler.show_footer();
    handler.close();

    let text = buffer.contents();
    assert!(text.contains("wellformed (Rel. 0.3.0"));
    assert!(text.contains("Status: Well-Formed and valid"));
    assert!(text.contains("Format: TIFF"));
    assert!(text.contains("MIMEtype: image/tiff"));
    assert!(text.contains("ImageWidth: 100"));
}

#[test]
fn test_json_handler_end_to_end() {
    let fixture = Fixture::new();
    let path = fixture.write("scan.tif", &minimal_tiff());

    let buffer = SharedBuffer::default();
    let mut handler = JsonHandler::new(Box::new(buffer.clone()));
    handler.show_header();
    handler.show_app(&App::new("wellformed", "0.3.0", "2026-02-12"));
    dispatcher().process(&path, &mut handler);
    handler.show_footer();
    handler.close();

    let document: Value = serde_json::from_str(&buffer.contents()).unwrap();
    assert_eq!(document["application"]["name"], "wellformed");
    let file = &document["files"][0];
    assert_eq!(file["format"], "TIFF");
    assert_eq!(file["wellFormed"], "true");
    assert_eq!(file["valid"], "true");
    assert_eq!(file["module"], "TIFF-hul");
    // The IFD property tree made it through.
    assert_eq!(file["properties"][0]["name"], "IFD");
}

#[test]
fn test_handler_veto_skips_file() {
    struct VetoHandler(SnapshotHandler);
    impl OutputHandler for VetoHandler {
        fn name(&self) -> &'static str {
            "veto"
        }
        fn show_header(&mut self) {}
        fn show_footer(&mut self) {}
        fn show_info(&mut self, info: &wellformed::RepInfo) {
            self.0.show_info(info);
        }
        fn show_module(&mut self, _m: &wellformed::ModuleDescriptor) {}
        fn show_app(&mut self, _a: &App) {}
        fn ok_to_process(&mut self, path: &str) -> bool {
            !path.ends_with("skip.tif")
        }
        fn close(&mut self) {}
    }

    let fixture = Fixture::new();
    fixture.write("keep.tif", &minimal_tiff());
    fixture.write("skip.tif", &minimal_tiff());

    let mut handler = VetoHandler(SnapshotHandler::default());
    dispatcher().process(fixture.path(), &mut handler);

    assert_eq!(handler.0.snapshots.len(), 1);
    assert!(handler.0.snapshots[0].uri.ends_with("keep.tif"));
}

// -----------------------------------------------------------------------------
// Module pinning
// -----------------------------------------------------------------------------

#[test]
fn test_unknown_pinned_module_reports_fatal() {
    let fixture = Fixture::new();
    let path = fixture.write("scan.tif", &minimal_tiff());

    let mut dispatcher = dispatcher();
    dispatcher.set_pinned_module(Some("PDF-hul".to_string()));
    let mut handler = SnapshotHandler::default();
    dispatcher.process(&path, &mut handler);

    let snapshot = &handler.snapshots[0];
    assert_eq!(snapshot.well_formed, Validity::False);
    assert!(snapshot.messages.iter().any(|m| m.id == "PKG-2"));
}

#[test]
fn test_pinned_module_parses_without_extension() {
    // No .tif extension; with the module pinned the file is still parsed.
    let fixture = Fixture::new();
    let path = fixture.write("upload.bin", &minimal_tiff());

    let mut dispatcher = dispatcher();
    dispatcher.set_pinned_module(Some("TIFF-hul".to_string()));
    let mut handler = SnapshotHandler::default();
    dispatcher.process(&path, &mut handler);

    assert_eq!(handler.snapshots[0].well_formed, Validity::True);
    assert_eq!(handler.snapshots[0].format.as_deref(), Some("TIFF"));
}
