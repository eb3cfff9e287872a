//! Name lookup for custom type declarations.

use std::collections::HashMap;

use log::trace;

use hexpat_core::identifier::Id;

use crate::ast::{AliasDecl, Ast, Declaration, EnumDecl, StructDecl};

/// A custom type declaration found by name.
#[derive(Debug, Clone, Copy)]
pub enum TypeDefinition<'a> {
    Struct(&'a StructDecl<'a>),
    Enum(&'a EnumDecl<'a>),
    Alias(&'a AliasDecl),
}

impl<'a> TypeDefinition<'a> {
    pub fn name(&self) -> Id {
        match self {
            TypeDefinition::Struct(decl) => decl.name.into_inner(),
            TypeDefinition::Enum(decl) => decl.name.into_inner(),
            TypeDefinition::Alias(decl) => decl.name.into_inner(),
        }
    }
}

/// Struct, enum and alias declarations of one [`Ast`], keyed by name.
///
/// Each category keeps the first declaration of a name. Lookup through
/// [`TypeTable::resolve`] tries structs, then enums, then aliases, so a
/// struct shadows an enum or alias of the same name.
#[derive(Debug, Default)]
pub struct TypeTable<'a> {
    structs: HashMap<Id, &'a StructDecl<'a>>,
    enums: HashMap<Id, &'a EnumDecl<'a>>,
    aliases: HashMap<Id, &'a AliasDecl>,
}

impl<'a> TypeTable<'a> {
    /// Index every type declaration of `ast`.
    pub fn build(ast: &Ast<'a>) -> Self {
        let mut table = Self::default();

        for decl in ast.declarations() {
            match decl {
                Declaration::Struct(s) => {
                    table.structs.entry(s.name.into_inner()).or_insert(s);
                }
                Declaration::Enum(e) => {
                    table.enums.entry(e.name.into_inner()).or_insert(e);
                }
                Declaration::Alias(a) => {
                    table.aliases.entry(a.name.into_inner()).or_insert(a);
                }
                Declaration::Variable(_) => {}
            }
        }

        trace!(
            structs = table.structs.len(),
            enums = table.enums.len(),
            aliases = table.aliases.len();
            "Built type table"
        );
        table
    }

    pub fn get_struct(&self, name: Id) -> Option<&'a StructDecl<'a>> {
        self.structs.get(&name).copied()
    }

    pub fn get_enum(&self, name: Id) -> Option<&'a EnumDecl<'a>> {
        self.enums.get(&name).copied()
    }

    pub fn get_alias(&self, name: Id) -> Option<&'a AliasDecl> {
        self.aliases.get(&name).copied()
    }

    /// Find the declaration for `name`: struct first, then enum, then alias.
    pub fn resolve(&self, name: Id) -> Option<TypeDefinition<'a>> {
        self.get_struct(name)
            .map(TypeDefinition::Struct)
            .or_else(|| self.get_enum(name).map(TypeDefinition::Enum))
            .or_else(|| self.get_alias(name).map(TypeDefinition::Alias))
    }

    pub fn contains(&self, name: Id) -> bool {
        self.resolve(name).is_some()
    }

    /// Number of distinct (category, name) entries.
    pub fn len(&self) -> usize {
        self.structs.len() + self.enums.len() + self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
