//! Drives signature matching, parsing, checksumming, and emission for a file
//! or a directory tree.
//!
//! Directories are walked depth-first in ascending name order. Each file gets
//! a fresh RepInfo; failures are always recorded there, never propagated, so
//! one unreadable file does not stop a sweep. A cooperative abort flag is
//! checked between files and between parse passes.

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info as log_info, warn};
use url::Url;

use crate::handler::OutputHandler;
use crate::io::{
    compute_checksums, ChecksumAlgorithm, Checksummer, DigestTee, FileSource,
};
use crate::message::Message;
use crate::module::{FormatModule, ParseOptions};
use crate::repinfo::{RepInfo, Validity};
use crate::signature::{rank_candidates, required_prefix_len, Candidate, MatchBasis};

// =============================================================================
// Dispatcher
// =============================================================================

/// Orchestrates characterization runs over the module registry.
///
/// The registry is populated at startup and read-only afterwards; per-file
/// mutable state lives in each RepInfo.
pub struct Dispatcher {
    modules: Vec<Box<dyn FormatModule>>,
    options: ParseOptions,
    checksums: Vec<ChecksumAlgorithm>,
    /// Stop after the signature check; no parse, no checksums.
    signature_only: bool,
    /// Module name the user pinned, bypassing signature ranking.
    pinned_module: Option<String>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            options: ParseOptions::default(),
            checksums: Vec::new(),
            signature_only: false,
            pinned_module: None,
        }
    }

    /// Add a module to the registry. Registration order breaks ranking ties.
    pub fn register(&mut self, module: Box<dyn FormatModule>) {
        self.modules.push(module);
    }

    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    pub fn set_checksums(&mut self, algorithms: Vec<ChecksumAlgorithm>) {
        self.checksums = algorithms;
    }

    pub fn set_signature_only(&mut self, signature_only: bool) {
        self.signature_only = signature_only;
    }

    pub fn set_pinned_module(&mut self, name: Option<String>) {
        self.pinned_module = name;
    }

    /// The cooperative abort flag shared with modules.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.options.abort)
    }

    pub fn modules(&self) -> &[Box<dyn FormatModule>] {
        &self.modules
    }

    fn aborted(&self) -> bool {
        self.options.abort.load(Ordering::Relaxed)
    }

    /// Process a path: recurse if it is a directory, characterize otherwise.
    pub fn process(&mut self, path: &Path, handler: &mut dyn OutputHandler) {
        if self.aborted() {
            return;
        }
        if path.is_dir() {
            self.process_directory(path, handler);
        } else {
            self.process_file(path, handler);
        }
    }

    /// Depth-first, name-sorted directory walk.
    fn process_directory(&mut self, path: &Path, handler: &mut dyn OutputHandler) {
        let mut entries = match std::fs::read_dir(path) {
            Ok(reader) => reader.filter_map(|e| e.ok()).collect::<Vec<_>>(),
            Err(error) => {
                warn!(path = %path.display(), %error, "cannot read directory");
                return;
            }
        };
        entries.sort_by_key(|entry| entry.file_name());

        handler.start_directory(&path.display().to_string());
        for entry in entries {
            if self.aborted() {
                break;
            }
            self.process(&entry.path(), handler);
        }
        handler.end_directory();
    }

    /// Characterize one file and hand the result to the handler.
    fn process_file(&mut self, path: &Path, handler: &mut dyn OutputHandler) {
        let display_path = path.display().to_string();
        if !handler.ok_to_process(&display_path) {
            return;
        }
        log_info!(path = %display_path, "processing");

        let mut info = self.characterize(path);
        self.stamp_file_facts(path, &mut info);

        handler.analyze(&info);
        handler.show_info(&info);
    }

    /// Run signature matching and, unless in signature-only mode, the parse
    /// and digest passes. Never fails; all failures land on the RepInfo.
    fn characterize(&mut self, path: &Path) -> RepInfo {
        let uri = file_uri(path);

        let candidates = match self.find_candidates(path) {
            Ok(candidates) => candidates,
            Err(message) => {
                let mut info = RepInfo::new(uri);
                info.add_message(message);
                return info;
            }
        };

        let mut rejected: Option<RepInfo> = None;
        for candidate in candidates {
            let mut info = RepInfo::new(uri.clone());
            let accepted = self.check_candidate(path, candidate, &mut info);
            if !accepted {
                rejected = Some(info);
                continue;
            }

            if !self.signature_only {
                self.run_parse(path, candidate.module_index, &mut info);
            }
            return info;
        }

        // No module accepted. A pinned or signature-matched module that then
        // rejected the file carries its own Fatal; otherwise the file is
        // simply unidentified and stays undetermined.
        match rejected {
            Some(info) => info,
            None => {
                let mut info = RepInfo::new(uri);
                info.add_message(Message::info(
                    "PKG-1",
                    "File not identified by any registered module",
                ));
                info
            }
        }
    }

    /// Rank candidate modules for the file, honoring a pinned module.
    fn find_candidates(&mut self, path: &Path) -> Result<Vec<Candidate>, Message> {
        if let Some(pinned) = &self.pinned_module {
            let module_index = self
                .modules
                .iter()
                .position(|m| m.descriptor().name.eq_ignore_ascii_case(pinned))
                .ok_or_else(|| {
                    Message::fatal("PKG-2", format!("Unknown module requested: {pinned}"))
                })?;
            return Ok(vec![Candidate {
                module_index,
                basis: MatchBasis::InternalSignature,
            }]);
        }

        let prefix_len = required_prefix_len(self.modules.iter().map(|m| m.descriptor()));
        let prefix = read_prefix(path, prefix_len)
            .map_err(|error| Message::fatal("PKG-2", format!("Cannot read file: {error}")))?;
        Ok(rank_candidates(
            &prefix,
            path,
            self.modules.iter().map(|m| m.descriptor()),
        ))
    }

    /// Run one candidate's own signature check. True if it accepted.
    fn check_candidate(&mut self, path: &Path, candidate: Candidate, info: &mut RepInfo) -> bool {
        let module = &mut self.modules[candidate.module_index];
        module.reset();
        module.set_options(self.options.clone());

        let mut source = match FileSource::open(path) {
            Ok(source) => source,
            Err(error) => {
                info.add_message(Message::fatal(
                    "PKG-2",
                    format!("Cannot read file: {error}"),
                ));
                return false;
            }
        };
        if let Err(error) = module.check_signatures(path, &mut source, info) {
            info.add_message(Message::fatal(
                "PKG-2",
                format!("Signature check failed: {error}"),
            ));
            return false;
        }
        info.well_formed() != Validity::False
    }

    /// Run the accepted module's parse, plus the digest pass.
    fn run_parse(&mut self, path: &Path, module_index: usize, info: &mut RepInfo) {
        let checksums = self.checksums.clone();
        let abort = Arc::clone(&self.options.abort);
        let module = &mut self.modules[module_index];
        module.reset();

        if module.is_random_access() {
            // Seek-heavy parse; the digest pass streams the file separately.
            let mut source = match FileSource::open(path) {
                Ok(source) => source,
                Err(error) => {
                    info.add_message(Message::fatal(
                        "PKG-2",
                        format!("Cannot read file: {error}"),
                    ));
                    return;
                }
            };
            module.parse_random_access(&mut source, info);

            if !checksums.is_empty() {
                match File::open(path)
                    .and_then(|mut file| compute_checksums(&mut file, &checksums))
                {
                    Ok(checksums) => info.set_checksums(checksums),
                    Err(error) => {
                        info.add_message(Message::warning(
                            "PKG-2",
                            format!("Checksum computation failed: {error}"),
                        ));
                    }
                }
            }
            return;
        }

        // Stream parse; may request re-invocation with a fresh stream. The
        // first pass co-mingles the digest tee with the parse.
        let mut parse_index = 0u32;
        let mut pass = 0u32;
        loop {
            let file = match File::open(path) {
                Ok(file) => file,
                Err(error) => {
                    info.add_message(Message::fatal(
                        "PKG-2",
                        format!("Cannot read file: {error}"),
                    ));
                    return;
                }
            };

            if pass == 0 && !checksums.is_empty() {
                let mut tee = DigestTee::new(file, Checksummer::new(&checksums));
                parse_index = module.parse(&mut tee, info, parse_index);
                // Drain whatever the parser left so the digest covers the
                // whole file.
                if std::io::copy(&mut tee, &mut std::io::sink()).is_ok() {
                    info.set_checksums(tee.finalize());
                }
            } else {
                let mut reader = file;
                parse_index = module.parse(&mut reader, info, parse_index);
            }

            if parse_index == 0 {
                break;
            }
            pass += 1;
            if abort.load(Ordering::Relaxed) {
                info.add_message(Message::info("PKG-4", "Processing aborted by request"));
                break;
            }
        }
    }

    /// Record size and timestamps from filesystem metadata.
    fn stamp_file_facts(&self, path: &Path, info: &mut RepInfo) {
        if let Ok(metadata) = std::fs::metadata(path) {
            info.size = Some(metadata.len());
            if let Ok(modified) = metadata.modified() {
                info.last_modified = Some(DateTime::<Utc>::from(modified));
            }
            if let Ok(created) = metadata.created() {
                info.created = Some(DateTime::<Utc>::from(created));
            }
        }
    }
}

/// Derive a file URI from a path, falling back to the raw path string.
fn file_uri(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .and_then(|absolute| Url::from_file_path(absolute).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read up to `len` bytes from the start of the file.
fn read_prefix(path: &Path, len: usize) -> std::io::Result<Vec<u8>> {
    use std::io::Read;
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let n = file.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buffer.truncate(filled);
    Ok(buffer)
}

// =============================================================================
// Tests
// =============================================================================
