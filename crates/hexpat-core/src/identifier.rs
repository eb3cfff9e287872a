//! Interned identifiers for type, member, and variant names.
//!
//! Pattern sources refer to custom types by name many times over (every
//! struct member, every alias target). Interning makes each lookup key a
//! `Copy` symbol, so the type table hashes and compares integers instead
//! of strings.
//!
//! The interner is process-wide and never pruned. Every distinct name that
//! any pattern has used stays resident until the process exits, while names
//! seen before map to their existing symbol. Memory therefore grows with the
//! number of distinct identifiers, not with the number of evaluations.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner shared by every [`Id`]. Entries are never removed.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// An interned identifier.
///
/// # Examples
///
/// ```
/// use hexpat_core::identifier::Id;
///
/// let header = Id::new("Header");
/// assert_eq!(header, Id::new("Header"));
/// assert_eq!(header, "Header");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Returns an owned copy of the identifier text.
    pub fn to_text(self) -> String {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                .to_owned()
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_same_name_same_id() {
        let a = Id::new("Header");
        let b = Id::new("Header");
        let c = Id::new("Footer");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display_round_trips_text() {
        let id = Id::new("magic_number");
        assert_eq!(id.to_string(), "magic_number");
        assert_eq!(id.to_text(), "magic_number");
    }

    #[test]
    fn test_compare_with_str() {
        let id: Id = "u32_alias".into();
        assert!(id == "u32_alias");
        assert!(id != "u32");

        let name = String::from("u32_alias");
        assert!(id == name.as_str());
    }

    #[test]
    fn test_usable_as_map_key() {
        let mut map = HashMap::new();
        map.insert(Id::new("A"), 1);
        map.insert(Id::new("B"), 2);

        assert_eq!(map.get(&Id::new("A")), Some(&1));
        assert_eq!(map.len(), 2);
    }
}
