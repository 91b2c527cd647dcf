//! TIFF validation and characterization.
//!
//! The structural engine lives in [`ifd`]; tag semantics per directory kind
//! live in the dispatchers there; [`module::TiffModule`] ties header parsing
//! and chain walking into the module framework.

pub mod ifd;
pub mod messages;
mod module;
pub mod tags;
pub mod values;

pub use ifd::{
    parse_ifd, ExifIfd, GlobalParamsIfd, GpsIfd, IfdDispatch, IfdEntryRecord, IfdKind,
    IfdOutcome, InteropIfd, MainIfd, SubIfdDispatch,
};
pub use module::{TiffModule, TIFF_HEADER_SIZE};
pub use tags::FieldType;
pub use values::{check_count, check_count_array, check_type, check_type_either, ValueReader};
