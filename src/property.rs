//! The typed metadata tree modules populate during a parse.
//!
//! A [`Property`] is a named, typed node. The payload is a sum type with one
//! variant per type/arity combination actually produced by the modules, so a
//! value can never disagree with its declared type. Subtrees are built from
//! `PropertyList`/`PropertyArray` variants; the tree is strictly acyclic
//! because children are owned by value.
//!
//! Nothing is mutated after construction: modules build Properties during the
//! parse, the RepInfo owns them, handlers only read them.

use std::collections::BTreeMap;
use std::fmt;

use crate::niso::NisoImageMetadata;

// =============================================================================
// Rational
// =============================================================================

/// A ratio of two integers, as stored in TIFF RATIONAL / SRATIONAL fields.
///
/// The pair is kept exactly as read; evaluating to floating point is lossy
/// and left to emission time. Equality is structural: 1/2 != 2/4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    /// Build from an unsigned pair (TIFF RATIONAL).
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator: i64::from(numerator),
            denominator: i64::from(denominator),
        }
    }

    /// Build from a signed pair (TIFF SRATIONAL).
    pub fn new_signed(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator: i64::from(numerator),
            denominator: i64::from(denominator),
        }
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// Lossy evaluation as a double. Zero denominators evaluate to infinity
    /// or NaN, matching IEEE division.
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

// =============================================================================
// PropertyArity
// =============================================================================

/// How many values a property carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyArity {
    Scalar,
    Array,
    List,
    Set,
    Map,
}

impl PropertyArity {
    pub const fn name(self) -> &'static str {
        match self {
            PropertyArity::Scalar => "Scalar",
            PropertyArity::Array => "Array",
            PropertyArity::List => "List",
            PropertyArity::Set => "Set",
            PropertyArity::Map => "Map",
        }
    }
}

// =============================================================================
// PropertyValue
// =============================================================================

/// The payload of a property.
///
/// Scalar variants hold one value; `*Array` variants hold a fixed-size
/// sequence read from the file; `*List` variants hold an ordered collection
/// assembled during parsing. `PropertyList` / `PropertyArray` children form
/// the subtree structure.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(f32),
    Double(f64),
    Rational(Rational),
    String(String),
    Bytes(Vec<u8>),
    Date(chrono::DateTime<chrono::Utc>),
    NisoImageMetadata(Box<NisoImageMetadata>),

    IntegerArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    RationalArray(Vec<Rational>),
    StringArray(Vec<String>),

    StringList(Vec<String>),
    PropertyArray(Vec<Property>),
    PropertyList(Vec<Property>),
    StringSet(std::collections::BTreeSet<String>),
    PropertyMap(BTreeMap<String, Property>),
}

impl PropertyValue {
    /// The arity implied by the variant.
    pub fn arity(&self) -> PropertyArity {
        match self {
            PropertyValue::Boolean(_)
            | PropertyValue::Integer(_)
            | PropertyValue::Float(_)
            | PropertyValue::Double(_)
            | PropertyValue::Rational(_)
            | PropertyValue::String(_)
            | PropertyValue::Bytes(_)
            | PropertyValue::Date(_)
            | PropertyValue::NisoImageMetadata(_) => PropertyArity::Scalar,
            PropertyValue::IntegerArray(_)
            | PropertyValue::FloatArray(_)
            | PropertyValue::DoubleArray(_)
            | PropertyValue::RationalArray(_)
            | PropertyValue::StringArray(_)
            | PropertyValue::PropertyArray(_) => PropertyArity::Array,
            PropertyValue::StringList(_) | PropertyValue::PropertyList(_) => PropertyArity::List,
            PropertyValue::StringSet(_) => PropertyArity::Set,
            PropertyValue::PropertyMap(_) => PropertyArity::Map,
        }
    }

    /// The base type name, independent of arity.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Integer(_) | PropertyValue::IntegerArray(_) => "Integer",
            PropertyValue::Float(_) | PropertyValue::FloatArray(_) => "Float",
            PropertyValue::Double(_) | PropertyValue::DoubleArray(_) => "Double",
            PropertyValue::Rational(_) | PropertyValue::RationalArray(_) => "Rational",
            PropertyValue::String(_)
            | PropertyValue::StringArray(_)
            | PropertyValue::StringList(_)
            | PropertyValue::StringSet(_) => "String",
            PropertyValue::Bytes(_) => "Bytes",
            PropertyValue::Date(_) => "Date",
            PropertyValue::NisoImageMetadata(_) => "NISOImageMetadata",
            PropertyValue::PropertyArray(_)
            | PropertyValue::PropertyList(_)
            | PropertyValue::PropertyMap(_) => "Property",
        }
    }
}

// =============================================================================
// Property
// =============================================================================

/// A named, typed node in the metadata tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn arity(&self) -> PropertyArity {
        self.value.arity()
    }

    pub fn type_name(&self) -> &'static str {
        self.value.type_name()
    }

    /// Child properties, for the container variants; empty otherwise.
    pub fn children(&self) -> &[Property] {
        match &self.value {
            PropertyValue::PropertyArray(children) | PropertyValue::PropertyList(children) => {
                children
            }
            _ => &[],
        }
    }

    /// Find the first child with the given name, searching this node's
    /// immediate children only.
    pub fn child_by_name(&self, name: &str) -> Option<&Property> {
        match &self.value {
            PropertyValue::PropertyArray(children) | PropertyValue::PropertyList(children) => {
                children.iter().find(|p| p.name == name)
            }
            PropertyValue::PropertyMap(map) => map.get(name),
            _ => None,
        }
    }

    /// Find a property by name anywhere in this subtree (depth-first).
    pub fn find(&self, name: &str) -> Option<&Property> {
        if self.name == name {
            return Some(self);
        }
        for child in self.children() {
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        if let PropertyValue::PropertyMap(map) = &self.value {
            for child in map.values() {
                if let Some(found) = child.find(name) {
                    return Some(found);
                }
            }
        }
        None
    }
}

// =============================================================================
// Tests
// =============================================================================
