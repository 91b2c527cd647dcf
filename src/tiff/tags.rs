//! TIFF tag and field-type vocabulary.
//!
//! Field types determine how tag values are encoded; every type has a fixed
//! element size that decides inline-vs-offset storage. Tags are 16-bit
//! identifiers; the constants here cover the tags the IFD dispatchers
//! interpret. Unrecognized tags are not an error.

// =============================================================================
// Field Types
// =============================================================================

/// TIFF field types, numbered 1..=13 as in the TIFF 6.0 specification.
///
/// Observing any type from `SByte` upward marks the file as TIFF revision 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer.
    Byte = 1,
    /// NUL-terminated 7-bit ASCII.
    Ascii = 2,
    /// Unsigned 16-bit integer.
    Short = 3,
    /// Unsigned 32-bit integer.
    Long = 4,
    /// Two LONGs: numerator, denominator.
    Rational = 5,
    /// Signed 8-bit integer.
    SByte = 6,
    /// Opaque 8-bit data.
    Undefined = 7,
    /// Signed 16-bit integer.
    SShort = 8,
    /// Signed 32-bit integer.
    SLong = 9,
    /// Two SLONGs: numerator, denominator.
    SRational = 10,
    /// IEEE 754 32-bit float.
    Float = 11,
    /// IEEE 754 64-bit float.
    Double = 12,
    /// LONG holding the offset of a sub-IFD.
    Ifd = 13,
}

impl FieldType {
    /// Decode a raw type value. Returns `None` outside the 1..=13 domain.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            6 => Some(FieldType::SByte),
            7 => Some(FieldType::Undefined),
            8 => Some(FieldType::SShort),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            11 => Some(FieldType::Float),
            12 => Some(FieldType::Double),
            13 => Some(FieldType::Ifd),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Size of a single element of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> u64 {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float | FieldType::Ifd => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
        }
    }

    /// Total byte size of `count` elements of this type.
    #[inline]
    pub const fn value_size(self, count: u32) -> u64 {
        self.size_in_bytes() * count as u64
    }

    /// Type label, as used in error messages and property output.
    pub const fn label(self) -> &'static str {
        match self {
            FieldType::Byte => "BYTE",
            FieldType::Ascii => "ASCII",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Rational => "RATIONAL",
            FieldType::SByte => "SBYTE",
            FieldType::Undefined => "UNDEFINED",
            FieldType::SShort => "SSHORT",
            FieldType::SLong => "SLONG",
            FieldType::SRational => "SRATIONAL",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Ifd => "IFD",
        }
    }

    /// True for the types whose appearance promotes the file to TIFF 6.
    #[inline]
    pub const fn is_revision_6(self) -> bool {
        self.as_u16() >= FieldType::SByte.as_u16()
    }

    /// True for the unsigned integer types that readers must accept
    /// interchangeably.
    #[inline]
    pub const fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            FieldType::Byte | FieldType::Short | FieldType::Long | FieldType::Ifd
        )
    }
}

// =============================================================================
// Tags
// =============================================================================

/// Tag numbers interpreted by the IFD dispatchers.
pub mod tag {
    // Baseline structure
    pub const NEW_SUBFILE_TYPE: u16 = 254;
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    pub const IMAGE_DESCRIPTION: u16 = 270;
    pub const MAKE: u16 = 271;
    pub const MODEL: u16 = 272;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const ORIENTATION: u16 = 274;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const X_RESOLUTION: u16 = 282;
    pub const Y_RESOLUTION: u16 = 283;
    pub const PLANAR_CONFIGURATION: u16 = 284;
    pub const RESOLUTION_UNIT: u16 = 296;
    pub const SOFTWARE: u16 = 305;
    pub const DATE_TIME: u16 = 306;
    pub const ARTIST: u16 = 315;

    // Tile organization
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;

    // Sub-IFD pointers
    pub const GLOBAL_PARAMETERS_IFD: u16 = 400;
    pub const EXIF_IFD: u16 = 34665;
    pub const GPS_INFO_IFD: u16 = 34853;
    pub const INTEROPERABILITY_IFD: u16 = 40965;

    pub const COPYRIGHT: u16 = 33432;

    // Exif IFD
    pub const EXIF_VERSION: u16 = 36864;
    pub const DATE_TIME_ORIGINAL: u16 = 36867;
    pub const FLASHPIX_VERSION: u16 = 40960;
    pub const COLOR_SPACE: u16 = 40961;
    pub const PIXEL_X_DIMENSION: u16 = 40962;
    pub const PIXEL_Y_DIMENSION: u16 = 40963;

    // GPS IFD
    pub const GPS_VERSION_ID: u16 = 0;
    pub const GPS_LATITUDE_REF: u16 = 1;
    pub const GPS_LATITUDE: u16 = 2;
    pub const GPS_LONGITUDE_REF: u16 = 3;
    pub const GPS_LONGITUDE: u16 = 4;
    pub const GPS_ALTITUDE_REF: u16 = 5;
    pub const GPS_ALTITUDE: u16 = 6;

    // Interoperability IFD
    pub const INTEROPERABILITY_INDEX: u16 = 1;

    // Global parameters IFD
    pub const PROFILE_TYPE: u16 = 401;
    pub const FAX_PROFILE: u16 = 402;
    pub const CODING_METHODS: u16 = 403;
}

// =============================================================================
// Label tables
// =============================================================================

/// Compression scheme codes and labels, parallel arrays. The codes are
/// sparse, so lookups go through the index array.
pub const COMPRESSION_INDEX: [u32; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 32773];
pub const COMPRESSION_LABELS: [&str; 9] = [
    "uncompressed",
    "CCITT 1D",
    "T4/Group 3 Fax",
    "T6/Group 4 Fax",
    "LZW",
    "JPEG (old-style)",
    "JPEG",
    "Deflate",
    "PackBits",
];

/// Photometric interpretation labels, indexed directly by value.
pub const PHOTOMETRIC_LABELS: [&str; 9] = [
    "white is zero",
    "black is zero",
    "RGB",
    "palette color",
    "transparency mask",
    "CMYK",
    "YCbCr",
    "",
    "CIE L*a*b*",
];

/// Orientation labels, value 0 unused.
pub const ORIENTATION_LABELS: [&str; 9] = [
    "",
    "normal",
    "flipped horizontally",
    "rotated 180 degrees",
    "flipped vertically",
    "flipped then rotated 90 degrees counter-clockwise",
    "rotated 90 degrees clockwise",
    "flipped then rotated 90 degrees clockwise",
    "rotated 90 degrees counter-clockwise",
];

/// Resolution unit labels, value 0 unused.
pub const RESOLUTION_UNIT_LABELS: [&str; 4] = ["", "none", "inch", "centimeter"];

/// Planar configuration labels, value 0 unused.
pub const PLANAR_CONFIGURATION_LABELS: [&str; 3] = ["", "chunky", "planar"];

/// NewSubfileType bitmask labels, low-order bit first.
pub const NEW_SUBFILE_TYPE_LABELS: [&str; 3] = [
    "reduced-resolution image",
    "page of multi-page image",
    "transparency mask",
];

/// Exif ColorSpace labels through the index array (65535 = uncalibrated).
pub const COLOR_SPACE_INDEX: [u32; 2] = [1, 65535];
pub const COLOR_SPACE_LABELS: [&str; 2] = ["sRGB", "uncalibrated"];

/// Fax profile labels (TIFF/FX), indexed directly by value.
pub const FAX_PROFILE_LABELS: [&str; 7] = [
    "unknown",
    "minimal black & white lossless, S",
    "extended black & white lossless, F",
    "lossless JBIG black & white, J",
    "lossy color and grayscale, C",
    "lossless color and grayscale, L",
    "Mixed Raster Content, M",
];

// =============================================================================
// Tests
// =============================================================================
