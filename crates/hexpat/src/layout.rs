//! Layout evaluation: from a validated syntax tree to annotated regions.
//!
//! The [`Evaluator`] walks every placed top-level variable and lays its
//! type out at the given offset. Struct members follow one another without
//! padding, so a struct's size is the sum of its members' sizes.
//!
//! Built-in types are emitted differently at the top level and inside
//! structs:
//!
//! - a top-level built-in declaration is one region covering the whole
//!   array (`u16 table[8] @ 0` is one 16-byte unsigned region);
//! - a struct member of a built-in type gets one region per element, named
//!   `prefix.member[i]`.
//!
//! In both places a 1-byte signed array is a single string region and a
//! 1-byte signed scalar is a character. An alias is laid out exactly as its
//! final target would be, with the array length of the declaration that
//! uses it.

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use log::{debug, trace};

use hexpat_core::{
    identifier::Id,
    region::{AnnotatedRegion, EnumSymbols, RegionKind},
    types::{BuiltinType, TypeClass},
};
use hexpat_parser::{
    TypeDefinition, TypeTable,
    ast::{AliasDecl, Ast, EnumDecl, StructDecl, TypeRef, VariableDecl},
};

use crate::{
    config::{ArrayNaming, EvaluatorConfig},
    error::LayoutError,
};

type Result<T> = std::result::Result<T, LayoutError>;

/// Widest integer an enum may be backed by, in bytes.
const MAX_ENUM_WIDTH: u8 = 8;

/// A type reference with aliases followed to their final target.
#[derive(Debug, Clone, Copy)]
enum Resolved<'a> {
    Builtin(BuiltinType),
    Struct(&'a StructDecl<'a>),
    Enum(&'a EnumDecl<'a>),
}

/// Where a declaration being laid out appears.
#[derive(Debug, Clone, Copy)]
enum Scope<'n> {
    TopLevel,
    /// Inside a struct whose instance is named `prefix`.
    Member { prefix: &'n str },
}

/// Lays out the placed variables of one [`Ast`].
///
/// An evaluator is used for a single run: [`Evaluator::evaluate`] consumes
/// it and returns either every region or the first error.
pub struct Evaluator<'a, 't> {
    types: &'t TypeTable<'a>,
    config: &'t EvaluatorConfig,
    is_cancelled: Option<&'t dyn Fn() -> bool>,
    regions: Vec<AnnotatedRegion>,
    /// Symbol tables shared by all regions of the same enum.
    enum_symbols: HashMap<Id, Arc<EnumSymbols>>,
    /// Structs currently being laid out, outermost first.
    active_structs: Vec<Id>,
}

impl<'a, 't> Evaluator<'a, 't> {
    pub fn new(types: &'t TypeTable<'a>, config: &'t EvaluatorConfig) -> Self {
        Self {
            types,
            config,
            is_cancelled: None,
            regions: Vec::new(),
            enum_symbols: HashMap::new(),
            active_structs: Vec::new(),
        }
    }

    /// Poll `is_cancelled` during evaluation and stop with
    /// [`LayoutError::Cancelled`] once it returns `true`.
    pub fn with_cancellation(mut self, is_cancelled: &'t dyn Fn() -> bool) -> Self {
        self.is_cancelled = Some(is_cancelled);
        self
    }

    /// Lay out every top-level variable that has a fixed offset.
    ///
    /// Variables without `@ offset` produce nothing. Regions come out in
    /// declaration order, members in struct order.
    ///
    /// # Errors
    ///
    /// Returns the first [`LayoutError`]; regions produced before it are
    /// discarded.
    pub fn evaluate(mut self, ast: &Ast<'a>) -> Result<Vec<AnnotatedRegion>> {
        debug!(variables = ast.variables().count(); "Evaluating layout");

        for var in ast.variables() {
            let Some(offset) = var.offset else {
                trace!(name:% = var.name; "Skipping unplaced variable");
                continue;
            };
            self.check_cancelled()?;

            let size = self.layout_variable(var, offset.into_inner(), Scope::TopLevel)?;
            trace!(name:% = var.name, offset = offset.into_inner(), size; "Placed variable");
        }

        debug!(regions = self.regions.len(); "Layout evaluated");
        Ok(self.regions)
    }

    /// Lay out a struct instance named `prefix` at `offset`.
    ///
    /// Returns the struct's size: the sum of its member sizes.
    pub fn resolve_struct(
        &mut self,
        decl: &'a StructDecl<'a>,
        offset: u64,
        prefix: &str,
    ) -> Result<u64> {
        let name = decl.name.into_inner();
        if self.active_structs.contains(&name) {
            return Err(LayoutError::RecursiveStruct {
                name: name.to_string(),
            });
        }
        if self.active_structs.len() >= self.config.max_depth() {
            return Err(LayoutError::DepthLimit {
                limit: self.config.max_depth(),
            });
        }
        self.check_cancelled()?;

        self.active_structs.push(name);
        let mut cursor = offset;
        for member in decl.members {
            let size = self.layout_variable(member, cursor, Scope::Member { prefix })?;
            cursor = advance(cursor, size, prefix)?;
        }
        self.active_structs.pop();

        Ok(cursor - offset)
    }

    /// Emit the enum region named `name` at `offset`.
    ///
    /// Returns the width of the enum's underlying type.
    pub fn resolve_enum(&mut self, decl: &'a EnumDecl<'a>, offset: u64, name: String) -> Result<u64> {
        let type_name = decl.name.into_inner();

        let underlying = match self.resolve_type(*decl.underlying.inner())? {
            Resolved::Builtin(ty) => ty,
            Resolved::Struct(s) => return Err(invalid_underlying(type_name, s.name.to_string())),
            Resolved::Enum(e) => return Err(invalid_underlying(type_name, e.name.to_string())),
        };
        if !underlying.is_unsigned() {
            return Err(invalid_underlying(type_name, underlying.to_string()));
        }
        if underlying.width() > MAX_ENUM_WIDTH {
            return Err(LayoutError::EnumWidthExceeded {
                name: type_name.to_string(),
                width: underlying.width(),
            });
        }

        let symbols = self.enum_symbols(decl);
        self.emit(
            offset,
            u64::from(underlying.width()),
            name,
            RegionKind::Enum(symbols),
        )
    }

    /// Lay out `var`, whose type is `alias`, as if it named the alias's
    /// final target directly.
    ///
    /// The alias contributes no arity of its own: the element count comes
    /// from `var`.
    fn resolve_alias(
        &mut self,
        alias: &'a AliasDecl,
        var: &VariableDecl,
        offset: u64,
        scope: Scope<'_>,
    ) -> Result<u64> {
        let target = self.follow_alias(alias)?;
        trace!(alias:% = alias.name; "Resolved alias");
        self.place(target, var, offset, scope)
    }

    fn layout_variable(&mut self, var: &VariableDecl, offset: u64, scope: Scope<'_>) -> Result<u64> {
        let resolved = match *var.ty.inner() {
            TypeRef::Builtin(ty) => Resolved::Builtin(ty),
            TypeRef::Custom(name) => match self.types.resolve(name) {
                Some(TypeDefinition::Struct(decl)) => Resolved::Struct(decl),
                Some(TypeDefinition::Enum(decl)) => Resolved::Enum(decl),
                Some(TypeDefinition::Alias(alias)) => {
                    return self.resolve_alias(alias, var, offset, scope);
                }
                None => return Err(undefined(name)),
            },
        };
        self.place(resolved, var, offset, scope)
    }

    /// Lay out `var` with its type already resolved.
    fn place(
        &mut self,
        resolved: Resolved<'a>,
        var: &VariableDecl,
        offset: u64,
        scope: Scope<'_>,
    ) -> Result<u64> {
        let len = var.len();
        let base = match scope {
            Scope::TopLevel => var.name.to_string(),
            Scope::Member { prefix } => format!("{prefix}.{}", var.name),
        };

        match (resolved, scope) {
            (Resolved::Builtin(ty), Scope::TopLevel) => self.emit_builtin_run(ty, len, offset, base),
            (Resolved::Builtin(ty), Scope::Member { .. }) => {
                if ty.is_character() {
                    return self.emit_builtin_run(ty, len, offset, base);
                }
                let mut cursor = offset;
                for index in 0..len {
                    let name = indexed_name(&base, index, len);
                    let size = self.emit(cursor, u64::from(ty.width()), name, scalar_kind(ty))?;
                    cursor = advance(cursor, size, &base)?;
                }
                Ok(cursor - offset)
            }
            (Resolved::Struct(decl), _) => {
                self.place_elements(offset, &base, len, scope, |this, cursor, name| {
                    this.resolve_struct(decl, cursor, &name)
                })
            }
            (Resolved::Enum(decl), _) => {
                self.place_elements(offset, &base, len, scope, |this, cursor, name| {
                    this.resolve_enum(decl, cursor, name)
                })
            }
        }
    }

    /// Lay out `len` consecutive elements of a custom type, one call of
    /// `element` each.
    fn place_elements<F>(
        &mut self,
        offset: u64,
        base: &str,
        len: u64,
        scope: Scope<'_>,
        mut element: F,
    ) -> Result<u64>
    where
        F: FnMut(&mut Self, u64, String) -> Result<u64>,
    {
        let top_level = matches!(scope, Scope::TopLevel);
        let mut cursor = offset;

        for index in 0..len {
            self.check_cancelled()?;
            let name = self.element_name(base, index, len, top_level);
            let size = element(self, cursor, name)?;
            // Zero-sized elements emit nothing, and neither will the rest.
            if size == 0 {
                break;
            }
            cursor = advance(cursor, size, base)?;
        }

        Ok(cursor - offset)
    }

    /// One region for `len` elements of `ty`: a string for 1-byte signed
    /// arrays, otherwise the element type's kind.
    fn emit_builtin_run(&mut self, ty: BuiltinType, len: u64, offset: u64, name: String) -> Result<u64> {
        let Some(size) = u64::from(ty.width()).checked_mul(len) else {
            return Err(LayoutError::OffsetOverflow { name });
        };
        if ty.is_character() && len > 1 {
            return self.emit(offset, size, name, RegionKind::String);
        }
        self.emit_run(offset, size, len, name, scalar_kind(ty))
    }

    fn emit(&mut self, offset: u64, size: u64, name: String, kind: RegionKind) -> Result<u64> {
        self.emit_run(offset, size, 1, name, kind)
    }

    fn emit_run(
        &mut self,
        offset: u64,
        size: u64,
        elements: u64,
        name: String,
        kind: RegionKind,
    ) -> Result<u64> {
        if offset.checked_add(size).is_none() {
            return Err(LayoutError::OffsetOverflow { name });
        }
        if self.regions.len() >= self.config.max_regions() {
            return Err(LayoutError::RegionLimit {
                limit: self.config.max_regions(),
            });
        }

        self.regions
            .push(AnnotatedRegion::new(offset, size, name, kind).with_elements(elements));
        Ok(size)
    }

    /// Name of element `index` of a custom-typed array.
    fn element_name(&self, base: &str, index: u64, len: u64, top_level: bool) -> String {
        if top_level && len > 1 && self.config.array_naming() == ArrayNaming::Legacy {
            format!("{base}[{len}]")
        } else {
            indexed_name(base, index, len)
        }
    }

    fn resolve_type(&self, ty: TypeRef) -> Result<Resolved<'a>> {
        match ty {
            TypeRef::Builtin(ty) => Ok(Resolved::Builtin(ty)),
            TypeRef::Custom(name) => match self.types.resolve(name) {
                Some(TypeDefinition::Struct(decl)) => Ok(Resolved::Struct(decl)),
                Some(TypeDefinition::Enum(decl)) => Ok(Resolved::Enum(decl)),
                Some(TypeDefinition::Alias(alias)) => self.follow_alias(alias),
                None => Err(undefined(name)),
            },
        }
    }

    /// Follow an alias chain to the first non-alias type.
    fn follow_alias(&self, alias: &'a AliasDecl) -> Result<Resolved<'a>> {
        let mut visited = vec![alias.name.into_inner()];
        let mut target = *alias.target.inner();

        loop {
            let TypeRef::Custom(name) = target else {
                return self.resolve_type(target);
            };
            match self.types.resolve(name) {
                Some(TypeDefinition::Alias(next)) => {
                    let next_name = next.name.into_inner();
                    if visited.contains(&next_name) {
                        return Err(LayoutError::AliasCycle {
                            name: next_name.to_string(),
                        });
                    }
                    visited.push(next_name);
                    target = *next.target.inner();
                }
                Some(_) => return self.resolve_type(target),
                None => return Err(undefined(name)),
            }
        }
    }

    fn enum_symbols(&mut self, decl: &EnumDecl<'_>) -> Arc<EnumSymbols> {
        let name = decl.name.into_inner();
        Arc::clone(self.enum_symbols.entry(name).or_insert_with(|| {
            let symbols: IndexMap<String, u64> = decl
                .variants
                .iter()
                .map(|variant| (variant.name.to_string(), variant.value.into_inner()))
                .collect();
            Arc::new(EnumSymbols::new(name.to_string(), symbols))
        }))
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.is_cancelled {
            Some(is_cancelled) if is_cancelled() => Err(LayoutError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// `base[index]`, or just `base` for a scalar.
fn indexed_name(base: &str, index: u64, len: u64) -> String {
    if len > 1 {
        format!("{base}[{index}]")
    } else {
        base.to_string()
    }
}

fn scalar_kind(ty: BuiltinType) -> RegionKind {
    match ty.class() {
        TypeClass::Unsigned => RegionKind::Unsigned,
        TypeClass::Signed if ty.is_character() => RegionKind::Character,
        TypeClass::Signed => RegionKind::Signed,
        TypeClass::Float => RegionKind::Float,
    }
}

fn advance(cursor: u64, size: u64, name: &str) -> Result<u64> {
    cursor
        .checked_add(size)
        .ok_or_else(|| LayoutError::OffsetOverflow {
            name: name.to_string(),
        })
}

fn undefined(name: Id) -> LayoutError {
    LayoutError::UndefinedType {
        name: name.to_string(),
    }
}

fn invalid_underlying(name: Id, underlying: String) -> LayoutError {
    LayoutError::InvalidEnumUnderlyingType {
        name: name.to_string(),
        underlying,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use bumpalo::Bump;
    use hexpat_parser::{parse, tokenize};

    use super::*;

    /// Parse without validating, so evaluator checks are reachable.
    fn evaluate_with(source: &str, config: &EvaluatorConfig) -> Result<Vec<AnnotatedRegion>> {
        let tokens = tokenize(source).unwrap();
        let arena = Bump::new();
        let ast = parse(&tokens, &arena).unwrap();
        let types = TypeTable::build(&ast);
        Evaluator::new(&types, config).evaluate(&ast)
    }

    fn evaluate(source: &str) -> Result<Vec<AnnotatedRegion>> {
        evaluate_with(source, &EvaluatorConfig::default())
    }

    fn summary(regions: &[AnnotatedRegion]) -> Vec<(u64, u64, &str, &'static str)> {
        regions
            .iter()
            .map(|r| (r.offset(), r.size(), r.name(), r.kind().label()))
            .collect()
    }

    #[test]
    fn test_top_level_builtins() {
        let regions = evaluate(
            "u32 magic @ 0; u16 table[4] @ 4; s8 c @ 12; char name[6] @ 13; s32 delta @ 19; double d @ 23;",
        )
        .unwrap();

        assert_eq!(
            summary(&regions),
            vec![
                (0, 4, "magic", "unsigned"),
                (4, 8, "table", "unsigned"),
                (12, 1, "c", "char"),
                (13, 6, "name", "string"),
                (19, 4, "delta", "signed"),
                (23, 8, "d", "float"),
            ]
        );
        let elements: Vec<u64> = regions.iter().map(AnnotatedRegion::elements).collect();
        assert_eq!(elements, vec![1, 4, 1, 1, 1, 1]);
    }

    #[test]
    fn test_unplaced_variables_skipped() {
        assert!(evaluate("u32 floating; struct S { u8 a; } S s;").unwrap().is_empty());
    }

    #[test]
    fn test_struct_members() {
        let regions = evaluate("struct S { u8 a; u16 b[2]; } S s @ 0x10;").unwrap();

        assert_eq!(
            summary(&regions),
            vec![
                (0x10, 1, "s.a", "unsigned"),
                (0x11, 2, "s.b[0]", "unsigned"),
                (0x13, 2, "s.b[1]", "unsigned"),
            ]
        );
    }

    #[test]
    fn test_character_members() {
        let regions = evaluate("struct S { char tag[4]; char c; s8 d[1]; } S s @ 0;").unwrap();

        assert_eq!(
            summary(&regions),
            vec![
                (0, 4, "s.tag", "string"),
                (4, 1, "s.c", "char"),
                (5, 1, "s.d", "char"),
            ]
        );
    }

    #[test]
    fn test_nested_structs_and_member_arrays() {
        let regions = evaluate(
            "struct P { u8 x; u8 y; } struct Line { P ends[2]; u16 w; } Line l @ 100;",
        )
        .unwrap();

        assert_eq!(
            summary(&regions),
            vec![
                (100, 1, "l.ends[0].x", "unsigned"),
                (101, 1, "l.ends[0].y", "unsigned"),
                (102, 1, "l.ends[1].x", "unsigned"),
                (103, 1, "l.ends[1].y", "unsigned"),
                (104, 2, "l.w", "unsigned"),
            ]
        );
    }

    #[test]
    fn test_top_level_custom_array_naming() {
        let source = "struct P { u8 x; } P pts[3] @ 0;";

        let legacy = evaluate(source).unwrap();
        let names: Vec<&str> = legacy.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["pts[3].x", "pts[3].x", "pts[3].x"]);
        let offsets: Vec<u64> = legacy.iter().map(|r| r.offset()).collect();
        assert_eq!(offsets, vec![0, 1, 2]);

        let config = EvaluatorConfig::default().with_array_naming(ArrayNaming::Indexed);
        let indexed = evaluate_with(source, &config).unwrap();
        let names: Vec<&str> = indexed.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["pts[0].x", "pts[1].x", "pts[2].x"]);
    }

    #[test]
    fn test_enum_region() {
        let regions = evaluate("enum E : u8 { X = 1, Y = 2 }; E e @ 0;").unwrap();

        assert_eq!(summary(&regions), vec![(0, 1, "e", "enum")]);
        let symbols = regions[0].enum_symbols().unwrap();
        assert_eq!(symbols.type_name(), "E");
        assert_eq!(symbols.value_of("X"), Some(1));
        assert_eq!(symbols.value_of("Y"), Some(2));
    }

    #[test]
    fn test_enum_symbols_shared() {
        let regions = evaluate("enum E : u16 { A } struct S { E a; E b[2]; } S s @ 0;").unwrap();

        assert_eq!(regions.len(), 3);
        let (RegionKind::Enum(first), RegionKind::Enum(last)) = (regions[0].kind(), regions[2].kind())
        else {
            panic!("expected enum regions");
        };
        assert!(Arc::ptr_eq(first, last));
        assert_eq!(regions[2].name(), "s.b[1]");
        assert_eq!(regions[2].offset(), 4);
    }

    #[test]
    fn test_enum_underlying_types() {
        for (ty, width) in [("u8", 1), ("u16", 2), ("u32", 4), ("u64", 8)] {
            let regions = evaluate(&format!("enum E : {ty} {{ A }} E e @ 0;")).unwrap();
            assert_eq!(regions[0].size(), width);
        }

        assert!(matches!(
            evaluate("enum E : u128 { A } E e @ 0;"),
            Err(LayoutError::EnumWidthExceeded { width: 16, .. })
        ));
        for ty in ["s8", "s32", "float", "double", "char"] {
            assert!(matches!(
                evaluate(&format!("enum E : {ty} {{ A }} E e @ 0;")),
                Err(LayoutError::InvalidEnumUnderlyingType { .. })
            ));
        }
    }

    #[test]
    fn test_unused_invalid_enum_is_harmless() {
        assert!(evaluate("enum E : s8 { A } u8 x @ 0;").is_ok());
    }

    #[test]
    fn test_alias_to_builtin_uses_declaration_arity() {
        let direct = evaluate("u16 v[4] @ 8; struct S { u16 m[2]; } S s @ 0;").unwrap();
        let aliased = evaluate(
            "using W = u16; using V = W; V v[4] @ 8; struct S { V m[2]; } S s @ 0;",
        )
        .unwrap();

        assert_eq!(summary(&direct), summary(&aliased));
    }

    #[test]
    fn test_alias_to_struct_and_enum() {
        let regions = evaluate(
            "struct P { u8 x; } enum E : u8 { A } using Q = P; using F = E; Q q[2] @ 0; F f @ 2;",
        )
        .unwrap();

        assert_eq!(
            summary(&regions),
            vec![
                (0, 1, "q[2].x", "unsigned"),
                (1, 1, "q[2].x", "unsigned"),
                (2, 1, "f", "enum"),
            ]
        );
    }

    #[test]
    fn test_lookup_prefers_struct() {
        let regions = evaluate("using X = u64; enum X : u8 { A } struct X { u16 v; } X x @ 0;")
            .unwrap();
        assert_eq!(summary(&regions), vec![(0, 2, "x.v", "unsigned")]);

        let regions = evaluate("using X = u64; enum X : u8 { A } X x @ 0;").unwrap();
        assert_eq!(summary(&regions), vec![(0, 1, "x", "enum")]);
    }

    #[test]
    fn test_undefined_type_discards_everything() {
        let result = evaluate("u8 first @ 0; struct S { u8 a; Missing m; } S s @ 1;");
        assert_eq!(
            result,
            Err(LayoutError::UndefinedType {
                name: "Missing".to_string()
            })
        );
    }

    #[test]
    fn test_alias_cycle() {
        assert!(matches!(
            evaluate("using A = B; using B = A; A a @ 0;"),
            Err(LayoutError::AliasCycle { .. })
        ));
        assert!(matches!(
            evaluate("using A = A; A a @ 0;"),
            Err(LayoutError::AliasCycle { .. })
        ));
    }

    #[test]
    fn test_recursive_struct() {
        assert_eq!(
            evaluate("struct S { u8 a; S next; } S s @ 0;"),
            Err(LayoutError::RecursiveStruct {
                name: "S".to_string()
            })
        );
        assert!(matches!(
            evaluate("using P = A; struct A { B b; } struct B { P a; } A a @ 0;"),
            Err(LayoutError::RecursiveStruct { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let source = "struct A { u8 x; } struct B { A a; } struct C { B b; } C c @ 0;";
        let config = EvaluatorConfig::default().with_max_depth(2);

        assert_eq!(
            evaluate_with(source, &config),
            Err(LayoutError::DepthLimit { limit: 2 })
        );
        assert!(evaluate_with(source, &config.with_max_depth(3)).is_ok());
    }

    #[test]
    fn test_region_limit() {
        let config = EvaluatorConfig::default().with_max_regions(4);

        assert!(evaluate_with("struct S { u8 a[4]; } S s @ 0;", &config).is_ok());
        assert_eq!(
            evaluate_with("struct S { u8 a[5]; } S s @ 0;", &config),
            Err(LayoutError::RegionLimit { limit: 4 })
        );
    }

    #[test]
    fn test_offset_overflow() {
        assert!(evaluate("u8 last @ 0xFFFFFFFFFFFFFFFE;").is_ok());
        assert!(matches!(
            evaluate("u16 wide @ 0xFFFFFFFFFFFFFFFF;"),
            Err(LayoutError::OffsetOverflow { .. })
        ));
        assert!(matches!(
            evaluate("u64 huge[0xFFFFFFFFFFFFFFFF] @ 0;"),
            Err(LayoutError::OffsetOverflow { .. })
        ));
    }

    #[test]
    fn test_empty_struct_arrays() {
        let regions = evaluate("struct E {} E many[0xFFFFFFFFFFFF] @ 0; u8 after @ 0;").unwrap();
        assert_eq!(summary(&regions), vec![(0, 1, "after", "unsigned")]);
    }

    #[test]
    fn test_cancellation() {
        let source = "u8 a @ 0; u8 b @ 1;";
        let tokens = tokenize(source).unwrap();
        let arena = Bump::new();
        let ast = parse(&tokens, &arena).unwrap();
        let types = TypeTable::build(&ast);
        let config = EvaluatorConfig::default();

        let polls = Cell::new(0);
        let cancel_on_second = || {
            polls.set(polls.get() + 1);
            polls.get() > 1
        };
        let result = Evaluator::new(&types, &config)
            .with_cancellation(&cancel_on_second)
            .evaluate(&ast);

        assert_eq!(result, Err(LayoutError::Cancelled));
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        fn builtin_keyword() -> impl Strategy<Value = &'static str> {
            prop::sample::select(vec![
                "u8", "u16", "u32", "u64", "u128", "s16", "s32", "s64", "s128", "float", "double",
            ])
        }

        proptest! {
            #[test]
            fn struct_members_are_contiguous(
                members in prop::collection::vec((builtin_keyword(), 1u64..4), 1..8),
                offset in 0u64..0x1_0000,
            ) {
                let body: String = members
                    .iter()
                    .enumerate()
                    .map(|(i, (ty, len))| format!("{ty} m{i}[{len}];"))
                    .collect();
                let source = format!("struct S {{ {body} }} S s @ {offset};");
                let regions = evaluate(&source).unwrap();

                let mut expected = offset;
                for region in &regions {
                    prop_assert_eq!(region.offset(), expected);
                    expected = region.end();
                }
                let total: u64 = members
                    .iter()
                    .map(|(ty, len)| {
                        u64::from(BuiltinType::from_keyword(ty).unwrap().width()) * len
                    })
                    .sum();
                prop_assert_eq!(expected - offset, total);
            }

            #[test]
            fn char_arrays_are_one_string(len in 2u64..4096, offset in 0u64..0x1_0000, member in any::<bool>()) {
                let source = if member {
                    format!("struct S {{ char text[{len}]; }} S s @ {offset};")
                } else {
                    format!("s8 text[{len}] @ {offset};")
                };
                let regions = evaluate(&source).unwrap();

                prop_assert_eq!(regions.len(), 1);
                prop_assert_eq!(regions[0].offset(), offset);
                prop_assert_eq!(regions[0].size(), len);
                prop_assert_eq!(regions[0].kind(), &RegionKind::String);
            }
        }
    }
}
