//! Built-in scalar type descriptors.
//!
//! A built-in type is a signedness class plus a byte width. The width alone
//! decides how many bytes a value of the type occupies.

use std::fmt;

use serde::Serialize;

/// Signedness class of a built-in type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeClass {
    Unsigned,
    Signed,
    Float,
}

/// A built-in scalar type: `u8`..`u128`, `s8`..`s128`, `char`, `float`, `double`.
///
/// `char` is a 1-byte signed integer; the layout engine renders it as text.
///
/// # Examples
///
/// ```
/// use hexpat_core::types::{BuiltinType, TypeClass};
///
/// let ty = BuiltinType::from_keyword("u16").unwrap();
/// assert_eq!(ty.class(), TypeClass::Unsigned);
/// assert_eq!(ty.width(), 2);
/// assert_eq!(ty.to_string(), "u16");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BuiltinType {
    class: TypeClass,
    width: u8,
}

impl BuiltinType {
    pub const U8: Self = Self::new(TypeClass::Unsigned, 1);
    pub const U16: Self = Self::new(TypeClass::Unsigned, 2);
    pub const U32: Self = Self::new(TypeClass::Unsigned, 4);
    pub const U64: Self = Self::new(TypeClass::Unsigned, 8);
    pub const U128: Self = Self::new(TypeClass::Unsigned, 16);
    pub const S8: Self = Self::new(TypeClass::Signed, 1);
    pub const S16: Self = Self::new(TypeClass::Signed, 2);
    pub const S32: Self = Self::new(TypeClass::Signed, 4);
    pub const S64: Self = Self::new(TypeClass::Signed, 8);
    pub const S128: Self = Self::new(TypeClass::Signed, 16);
    pub const FLOAT: Self = Self::new(TypeClass::Float, 4);
    pub const DOUBLE: Self = Self::new(TypeClass::Float, 8);

    /// Creates a descriptor from a class and byte width.
    pub const fn new(class: TypeClass, width: u8) -> Self {
        Self { class, width }
    }

    /// Looks up the descriptor named by a type keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let ty = match keyword {
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "u128" => Self::U128,
            "s8" | "char" => Self::S8,
            "s16" => Self::S16,
            "s32" => Self::S32,
            "s64" => Self::S64,
            "s128" => Self::S128,
            "float" => Self::FLOAT,
            "double" => Self::DOUBLE,
            _ => return None,
        };
        Some(ty)
    }

    pub fn class(self) -> TypeClass {
        self.class
    }

    /// Size of one element in bytes.
    pub fn width(self) -> u8 {
        self.width
    }

    pub fn is_unsigned(self) -> bool {
        self.class == TypeClass::Unsigned
    }

    pub fn is_signed(self) -> bool {
        self.class == TypeClass::Signed
    }

    pub fn is_float(self) -> bool {
        self.class == TypeClass::Float
    }

    /// Returns `true` for the 1-byte signed type that renders as text.
    pub fn is_character(self) -> bool {
        self.class == TypeClass::Signed && self.width == 1
    }

    /// The canonical keyword for this descriptor (`char` reports as `s8`).
    pub fn keyword(self) -> &'static str {
        match (self.class, self.width) {
            (TypeClass::Unsigned, 1) => "u8",
            (TypeClass::Unsigned, 2) => "u16",
            (TypeClass::Unsigned, 4) => "u32",
            (TypeClass::Unsigned, 8) => "u64",
            (TypeClass::Unsigned, _) => "u128",
            (TypeClass::Signed, 1) => "s8",
            (TypeClass::Signed, 2) => "s16",
            (TypeClass::Signed, 4) => "s32",
            (TypeClass::Signed, 8) => "s64",
            (TypeClass::Signed, _) => "s128",
            (TypeClass::Float, 4) => "float",
            (TypeClass::Float, _) => "double",
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
