//! Annotated regions: the output of pattern evaluation.
//!
//! Each [`AnnotatedRegion`] names one contiguous byte range of the inspected
//! blob and says how its bytes should be interpreted. Enum regions carry a
//! shared symbol table so a large array of enum values does not duplicate
//! the variant list per element.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

/// Symbol table of one enum type: variant name to value, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumSymbols {
    type_name: String,
    symbols: IndexMap<String, u64>,
}

impl EnumSymbols {
    pub fn new(type_name: impl Into<String>, symbols: IndexMap<String, u64>) -> Self {
        Self {
            type_name: type_name.into(),
            symbols,
        }
    }

    /// Name of the enum type the symbols belong to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn symbols(&self) -> &IndexMap<String, u64> {
        &self.symbols
    }

    /// Value of the variant called `name`.
    pub fn value_of(&self, name: &str) -> Option<u64> {
        self.symbols.get(name).copied()
    }

    /// First variant whose value equals `value`.
    pub fn symbol_for(&self, value: u64) -> Option<&str> {
        self.symbols
            .iter()
            .find(|(_, v)| **v == value)
            .map(|(name, _)| name.as_str())
    }
}

/// How the bytes of a region are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionKind {
    Unsigned,
    Signed,
    /// A single 1-byte signed value shown as a character.
    Character,
    /// A run of 1-byte signed values shown as text.
    String,
    Float,
    Enum(Arc<EnumSymbols>),
}

impl RegionKind {
    /// Short lowercase label, as used in listings.
    pub fn label(&self) -> &'static str {
        match self {
            RegionKind::Unsigned => "unsigned",
            RegionKind::Signed => "signed",
            RegionKind::Character => "char",
            RegionKind::String => "string",
            RegionKind::Float => "float",
            RegionKind::Enum(_) => "enum",
        }
    }
}

/// One emitted `(offset, size, name, kind)` entry.
///
/// # Examples
///
/// ```
/// use hexpat_core::region::{AnnotatedRegion, RegionKind};
///
/// let region = AnnotatedRegion::new(0x10, 2, "hdr.version", RegionKind::Unsigned);
/// assert_eq!(region.end(), 0x12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedRegion {
    offset: u64,
    size: u64,
    name: String,
    #[serde(flatten)]
    kind: RegionKind,
    /// Values of the kind packed back to back; a top-level `u16 t[4]` is
    /// one region of four elements.
    #[serde(skip_serializing_if = "is_single")]
    elements: u64,
}

fn is_single(elements: &u64) -> bool {
    *elements == 1
}

impl AnnotatedRegion {
    pub fn new(offset: u64, size: u64, name: impl Into<String>, kind: RegionKind) -> Self {
        Self {
            offset,
            size,
            name: name.into(),
            kind,
            elements: 1,
        }
    }

    /// Mark the region as `elements` consecutive values of its kind.
    pub fn with_elements(mut self, elements: u64) -> Self {
        self.elements = elements.max(1);
        self
    }

    /// Absolute byte offset of the first byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Exclusive end offset, saturating at `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of values in the region, 1 unless it is an array run.
    pub fn elements(&self) -> u64 {
        self.elements
    }

    /// Size of one value in bytes.
    pub fn element_size(&self) -> u64 {
        self.size / self.elements
    }

    pub fn kind(&self) -> &RegionKind {
        &self.kind
    }

    /// Enum symbol table, for enum regions.
    pub fn enum_symbols(&self) -> Option<&EnumSymbols> {
        match &self.kind {
            RegionKind::Enum(symbols) => Some(symbols),
            _ => None,
        }
    }
}
