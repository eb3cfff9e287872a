//! Decoding region values from blob bytes.
//!
//! A region only says where a value lives and how to read it; [`decode`]
//! does the reading, given the bytes of the inspected blob and the byte
//! order declared with `#pragma endian`.

use std::fmt;

use serde::Serialize;

use hexpat_core::region::{AnnotatedRegion, RegionKind};
use hexpat_parser::Endian;

/// Largest integer region that can be decoded, in bytes.
const MAX_INTEGER_WIDTH: usize = 16;

/// The decoded value of one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RegionValue {
    Unsigned(u128),
    Signed(i128),
    Float(f64),
    Character(char),
    /// Text up to the first NUL byte, with invalid UTF-8 replaced.
    String(String),
    Enum { value: u64, symbol: Option<String> },
    /// One value per element of a top-level array run.
    Array(Vec<RegionValue>),
}

impl fmt::Display for RegionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionValue::Unsigned(v) => write!(f, "{v}"),
            RegionValue::Signed(v) => write!(f, "{v}"),
            RegionValue::Float(v) => write!(f, "{v}"),
            RegionValue::Character(c) => write!(f, "{:?}", c),
            RegionValue::String(s) => write!(f, "{:?}", s),
            RegionValue::Enum {
                value,
                symbol: Some(symbol),
            } => write!(f, "{symbol} ({value})"),
            RegionValue::Enum { value, symbol: None } => write!(f, "{value}"),
            RegionValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Decode the value of `region` from `blob`.
///
/// Array runs decode element by element into [`RegionValue::Array`].
///
/// Returns `None` if the region lies (partly) outside the blob, or if an
/// element size cannot hold a single value of its kind (an integer wider
/// than 16 bytes, a float that is not 4 or 8 bytes).
pub fn decode(region: &AnnotatedRegion, blob: &[u8], endian: Endian) -> Option<RegionValue> {
    let start = usize::try_from(region.offset()).ok()?;
    let len = usize::try_from(region.size()).ok()?;
    let bytes = blob.get(start..start.checked_add(len)?)?;

    if region.elements() == 1 {
        return decode_element(region.kind(), bytes, endian);
    }

    let width = usize::try_from(region.element_size()).ok()?;
    if width == 0 || len % width != 0 {
        return None;
    }
    bytes
        .chunks_exact(width)
        .map(|chunk| decode_element(region.kind(), chunk, endian))
        .collect::<Option<Vec<_>>>()
        .map(RegionValue::Array)
}

fn decode_element(kind: &RegionKind, bytes: &[u8], endian: Endian) -> Option<RegionValue> {
    match kind {
        RegionKind::Unsigned => read_unsigned(bytes, endian).map(RegionValue::Unsigned),
        RegionKind::Signed => read_signed(bytes, endian).map(RegionValue::Signed),
        RegionKind::Float => read_float(bytes, endian).map(RegionValue::Float),
        RegionKind::Character => bytes.first().map(|&b| RegionValue::Character(char::from(b))),
        RegionKind::String => {
            let text = bytes.split(|&b| b == 0).next().unwrap_or_default();
            Some(RegionValue::String(String::from_utf8_lossy(text).into_owned()))
        }
        RegionKind::Enum(symbols) => {
            let value = u64::try_from(read_unsigned(bytes, endian)?).ok()?;
            Some(RegionValue::Enum {
                value,
                symbol: symbols.symbol_for(value).map(str::to_string),
            })
        }
    }
}

fn read_unsigned(bytes: &[u8], endian: Endian) -> Option<u128> {
    if bytes.is_empty() || bytes.len() > MAX_INTEGER_WIDTH {
        return None;
    }

    let fold = |acc: u128, &b: &u8| (acc << 8) | u128::from(b);
    Some(match endian {
        Endian::Big => bytes.iter().fold(0, fold),
        Endian::Little => bytes.iter().rev().fold(0, fold),
    })
}

fn read_signed(bytes: &[u8], endian: Endian) -> Option<i128> {
    let raw = read_unsigned(bytes, endian)?;
    // Move the sign bit to the top, then shift back arithmetically.
    let unused = (MAX_INTEGER_WIDTH - bytes.len()) as u32 * 8;
    Some(((raw << unused) as i128) >> unused)
}

fn read_float(bytes: &[u8], endian: Endian) -> Option<f64> {
    match (bytes.len(), endian) {
        (4, Endian::Little) => Some(f64::from(f32::from_le_bytes(bytes.try_into().ok()?))),
        (4, Endian::Big) => Some(f64::from(f32::from_be_bytes(bytes.try_into().ok()?))),
        (8, Endian::Little) => Some(f64::from_le_bytes(bytes.try_into().ok()?)),
        (8, Endian::Big) => Some(f64::from_be_bytes(bytes.try_into().ok()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;

    use hexpat_core::region::EnumSymbols;

    use super::*;

    fn region(offset: u64, size: u64, kind: RegionKind) -> AnnotatedRegion {
        AnnotatedRegion::new(offset, size, "r", kind)
    }

    #[test]
    fn test_unsigned_endianness() {
        let blob = [0x01, 0x02, 0x03, 0x04];
        let r = region(0, 4, RegionKind::Unsigned);

        assert_eq!(
            decode(&r, &blob, Endian::Little),
            Some(RegionValue::Unsigned(0x0403_0201))
        );
        assert_eq!(
            decode(&r, &blob, Endian::Big),
            Some(RegionValue::Unsigned(0x0102_0304))
        );
    }

    #[test]
    fn test_signed_sign_extension() {
        let blob = [0xFE, 0xFF, 0x7F];

        assert_eq!(
            decode(&region(0, 2, RegionKind::Signed), &blob, Endian::Little),
            Some(RegionValue::Signed(-2))
        );
        assert_eq!(
            decode(&region(1, 2, RegionKind::Signed), &blob, Endian::Little),
            Some(RegionValue::Signed(0x7FFF))
        );
        let wide = [0xFF; 16];
        assert_eq!(
            decode(&region(0, 16, RegionKind::Signed), &wide, Endian::Big),
            Some(RegionValue::Signed(-1))
        );
    }

    #[test]
    fn test_floats() {
        let single = 1.5f32.to_be_bytes();
        assert_eq!(
            decode(&region(0, 4, RegionKind::Float), &single, Endian::Big),
            Some(RegionValue::Float(1.5))
        );

        let double = (-0.25f64).to_le_bytes();
        assert_eq!(
            decode(&region(0, 8, RegionKind::Float), &double, Endian::Little),
            Some(RegionValue::Float(-0.25))
        );

        assert_eq!(decode(&region(0, 2, RegionKind::Float), &double, Endian::Little), None);
    }

    #[test]
    fn test_text() {
        let blob = b"Hi\0junkX";

        assert_eq!(
            decode(&region(0, 7, RegionKind::String), blob, Endian::Little),
            Some(RegionValue::String("Hi".to_string()))
        );
        assert_eq!(
            decode(&region(7, 1, RegionKind::Character), blob, Endian::Little),
            Some(RegionValue::Character('X'))
        );
    }

    #[test]
    fn test_enum_symbol() {
        let symbols = Arc::new(EnumSymbols::new(
            "Kind",
            IndexMap::from([("Data".to_string(), 1), ("Code".to_string(), 0x0200)]),
        ));
        let r = region(0, 2, RegionKind::Enum(symbols));

        assert_eq!(
            decode(&r, &[0x00, 0x02], Endian::Little),
            Some(RegionValue::Enum {
                value: 0x0200,
                symbol: Some("Code".to_string())
            })
        );
        let unknown = decode(&r, &[0x05, 0x00], Endian::Little).unwrap();
        assert_eq!(unknown.to_string(), "5");
    }

    #[test]
    fn test_array_runs_decode_per_element() {
        let blob = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0xFF, 0xFF];
        let table = region(0, 8, RegionKind::Unsigned).with_elements(4);

        let value = decode(&table, &blob, Endian::Little).unwrap();
        assert_eq!(
            value,
            RegionValue::Array(vec![
                RegionValue::Unsigned(1),
                RegionValue::Unsigned(2),
                RegionValue::Unsigned(3),
                RegionValue::Unsigned(0xFFFF),
            ])
        );
        assert_eq!(value.to_string(), "[1, 2, 3, 65535]");

        let signed = region(0, 8, RegionKind::Signed).with_elements(4);
        assert_eq!(
            decode(&signed, &blob, Endian::Little),
            Some(RegionValue::Array(vec![
                RegionValue::Signed(1),
                RegionValue::Signed(2),
                RegionValue::Signed(3),
                RegionValue::Signed(-1),
            ]))
        );
    }

    #[test]
    fn test_array_wider_than_one_integer() {
        // 8 x u32 is 32 bytes, too wide for one integer but fine per element.
        let blob: Vec<u8> = (0u32..8).flat_map(|v| v.to_be_bytes()).collect();
        let arr = region(0, 32, RegionKind::Unsigned).with_elements(8);

        let Some(RegionValue::Array(items)) = decode(&arr, &blob, Endian::Big) else {
            panic!("expected an array value");
        };
        assert_eq!(items.len(), 8);
        assert_eq!(items[7], RegionValue::Unsigned(7));
    }

    #[test]
    fn test_out_of_bounds_and_oversized() {
        let blob = [0u8; 8];

        assert_eq!(decode(&region(6, 4, RegionKind::Unsigned), &blob, Endian::Little), None);
        assert_eq!(decode(&region(u64::MAX, 1, RegionKind::Unsigned), &blob, Endian::Little), None);

        let big = [0u8; 32];
        assert_eq!(decode(&region(0, 32, RegionKind::Unsigned), &big, Endian::Little), None);
    }
}
