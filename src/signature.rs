//! Signature-based format identification.
//!
//! Each module declares a set of signatures: internal magic (a fixed byte
//! sequence at a fixed absolute offset) and external filename extensions.
//! The matcher reads one capped prefix of the file and ranks candidate
//! modules; the dispatcher then runs each candidate's own `check_signatures`
//! in rank order until one accepts.

use std::path::Path;

use crate::module::ModuleDescriptor;

// =============================================================================
// Signature
// =============================================================================

/// How strongly a magic signature binds identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureUse {
    /// Must match for the module to claim the file.
    Mandatory,
    /// One of the alternatives marked this way must match (e.g. the II and
    /// MM byte-order marks of TIFF).
    MandatoryIfApplicable,
    /// Contributes nothing to matching; descriptive only.
    Optional,
}

/// A single signature declaration.
#[derive(Debug, Clone)]
pub enum Signature {
    /// A fixed byte sequence at a fixed absolute offset.
    Magic {
        bytes: &'static [u8],
        offset: u64,
        use_type: SignatureUse,
    },

    /// Filename-extension hint (advisory), without the leading dot.
    Extension { extension: &'static str },
}

impl Signature {
    /// Number of prefix bytes needed to test this signature.
    fn prefix_bytes_needed(&self) -> usize {
        match self {
            Signature::Magic { bytes, offset, .. } => *offset as usize + bytes.len(),
            Signature::Extension { .. } => 0,
        }
    }

    fn matches_prefix(&self, prefix: &[u8]) -> bool {
        match self {
            Signature::Magic { bytes, offset, .. } => {
                let start = *offset as usize;
                let end = start + bytes.len();
                end <= prefix.len() && &prefix[start..end] == *bytes
            }
            Signature::Extension { .. } => false,
        }
    }
}

// =============================================================================
// Candidate ranking
// =============================================================================

/// How a candidate module matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBasis {
    /// The module's internal signatures matched the prefix.
    InternalSignature,
    /// Only the filename extension matched.
    Extension,
}

/// A ranked identification candidate: index into the module registry plus
/// the basis on which it matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub module_index: usize,
    pub basis: MatchBasis,
}

/// Number of prefix bytes the matcher needs to test every declared internal
/// signature of the given modules.
pub fn required_prefix_len<'a>(
    descriptors: impl IntoIterator<Item = &'a ModuleDescriptor>,
) -> usize {
    descriptors
        .into_iter()
        .flat_map(|d| d.signatures.iter())
        .map(Signature::prefix_bytes_needed)
        .max()
        .unwrap_or(0)
}

/// True if the module's internal magic accepts the prefix: every Mandatory
/// signature matches, and at least one MandatoryIfApplicable alternative
/// matches when any are declared.
fn magic_accepts(descriptor: &ModuleDescriptor, prefix: &[u8]) -> bool {
    let magics: Vec<&Signature> = descriptor
        .signatures
        .iter()
        .filter(|s| matches!(s, Signature::Magic { .. }))
        .collect();
    if magics.is_empty() {
        return false;
    }

    let use_of = |s: &&Signature| match s {
        Signature::Magic { use_type, .. } => *use_type,
        Signature::Extension { .. } => SignatureUse::Optional,
    };

    let mandatory: Vec<&&Signature> = magics
        .iter()
        .filter(|s| use_of(s) == SignatureUse::Mandatory)
        .collect();
    let alternatives: Vec<&&Signature> = magics
        .iter()
        .filter(|s| use_of(s) == SignatureUse::MandatoryIfApplicable)
        .collect();

    if !mandatory.iter().all(|s| s.matches_prefix(prefix)) {
        return false;
    }
    if !alternatives.is_empty() && !alternatives.iter().any(|s| s.matches_prefix(prefix)) {
        return false;
    }
    if mandatory.is_empty() && alternatives.is_empty() {
        // Only optional magic declared; require any hit at all.
        return magics.iter().any(|s| s.matches_prefix(prefix));
    }
    true
}

/// Rank candidate modules for a file.
///
/// Internal-signature hits outrank extension-only hits; within a rank,
/// module registration order breaks ties. A module with no matching
/// signature of either kind is not a candidate.
pub fn rank_candidates<'a>(
    prefix: &[u8],
    path: &Path,
    descriptors: impl IntoIterator<Item = &'a ModuleDescriptor>,
) -> Vec<Candidate> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let mut internal = Vec::new();
    let mut external = Vec::new();

    for (module_index, descriptor) in descriptors.into_iter().enumerate() {
        if magic_accepts(descriptor, prefix) {
            internal.push(Candidate {
                module_index,
                basis: MatchBasis::InternalSignature,
            });
            continue;
        }

        let extension_hit = extension.as_deref().is_some_and(|ext| {
            descriptor.signatures.iter().any(|s| {
                matches!(s, Signature::Extension { extension } if extension.eq_ignore_ascii_case(ext))
            })
        });

        if extension_hit {
            external.push(Candidate {
                module_index,
                basis: MatchBasis::Extension,
            });
        }
    }

    internal.extend(external);
    internal
}

// =============================================================================
// Tests
// =============================================================================
