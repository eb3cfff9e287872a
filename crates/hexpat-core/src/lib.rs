//! Core types shared by the hexpat crates.
//!
//! - [`identifier::Id`] - interned type and member names
//! - [`types::BuiltinType`] - built-in scalar type descriptors
//! - [`region::AnnotatedRegion`] - the output of pattern evaluation

pub mod identifier;
pub mod region;
pub mod types;
