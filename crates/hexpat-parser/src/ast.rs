//! Syntax tree of a pattern source.
//!
//! Nodes are allocated in a caller-supplied [`bumpalo::Bump`] arena: the
//! tree lives exactly as long as one pipeline run and is released in one
//! step when the arena is dropped. Names are interned [`Id`]s, so the tree
//! does not borrow the source text.

use hexpat_core::{identifier::Id, types::BuiltinType};

use crate::span::{Span, Spanned};

/// A parsed pattern source: its top-level declarations in source order.
#[derive(Debug, Clone, Copy)]
pub struct Ast<'a> {
    declarations: &'a [Declaration<'a>],
}

impl<'a> Ast<'a> {
    pub fn new(declarations: &'a [Declaration<'a>]) -> Self {
        Self { declarations }
    }

    pub fn declarations(&self) -> &'a [Declaration<'a>] {
        self.declarations
    }

    /// Top-level variable declarations, placed or not.
    pub fn variables(&self) -> impl Iterator<Item = &'a VariableDecl> + 'a {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Variable(var) => Some(var),
            _ => None,
        })
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    Variable(VariableDecl),
    Struct(StructDecl<'a>),
    Enum(EnumDecl<'a>),
    Alias(AliasDecl),
}

impl Declaration<'_> {
    /// The declared name.
    pub fn name(&self) -> Spanned<Id> {
        match self {
            Declaration::Variable(var) => var.name,
            Declaration::Struct(decl) => decl.name,
            Declaration::Enum(decl) => decl.name,
            Declaration::Alias(decl) => decl.name,
        }
    }
}

/// A reference to a type, as written in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Builtin(BuiltinType),
    /// A struct, enum or alias, referenced by name.
    Custom(Id),
}

impl TypeRef {
    pub fn as_builtin(&self) -> Option<BuiltinType> {
        match self {
            TypeRef::Builtin(ty) => Some(*ty),
            TypeRef::Custom(_) => None,
        }
    }

    pub fn as_custom(&self) -> Option<Id> {
        match self {
            TypeRef::Builtin(_) => None,
            TypeRef::Custom(name) => Some(*name),
        }
    }
}

/// `type name[len] @ offset;`
///
/// Used both for top-level variables and for struct members; only
/// top-level variables may carry an offset.
#[derive(Debug, Clone, Copy)]
pub struct VariableDecl {
    pub name: Spanned<Id>,
    pub ty: Spanned<TypeRef>,
    /// `None` for a scalar declaration.
    pub array_len: Option<Spanned<u64>>,
    pub offset: Option<Spanned<u64>>,
}

impl VariableDecl {
    /// Number of elements: the array length, or 1 for a scalar.
    pub fn len(&self) -> u64 {
        self.array_len.map_or(1, |len| len.into_inner())
    }

    /// Returns `true` if the declaration has more than one element.
    pub fn is_multi(&self) -> bool {
        self.len() > 1
    }

    /// Span from the type to the name (or array suffix).
    pub fn span(&self) -> Span {
        let end = self.array_len.map_or(self.name.span(), |len| len.span());
        self.ty.span().union(end)
    }
}

/// `struct Name { members };`
#[derive(Debug, Clone, Copy)]
pub struct StructDecl<'a> {
    pub name: Spanned<Id>,
    pub members: &'a [VariableDecl],
}

/// `Name = value` inside an enum body.
#[derive(Debug, Clone, Copy)]
pub struct EnumVariant {
    pub name: Spanned<Id>,
    /// The variant value. Implicit values are filled in by the parser as
    /// previous value + 1 (0 for the first variant); their span is the
    /// variant name's span.
    pub value: Spanned<u64>,
}

/// `enum Name : underlying { variants };`
#[derive(Debug, Clone, Copy)]
pub struct EnumDecl<'a> {
    pub name: Spanned<Id>,
    pub underlying: Spanned<TypeRef>,
    pub variants: &'a [EnumVariant],
}

/// `using Name = target;`
#[derive(Debug, Clone, Copy)]
pub struct AliasDecl {
    pub name: Spanned<Id>,
    pub target: Spanned<TypeRef>,
}
