//! Semantic validation of a parsed [`Ast`].
//!
//! Validation is a read-only pass that reports every problem it finds in one
//! go. A successful run returns the [`TypeTable`] the evaluator resolves
//! names through; everything the evaluator needs to be well-formed (type
//! references, enum backing types, unique names) is checked here. Alias
//! cycles are left to the evaluator, which sees them as it resolves.

use std::collections::HashMap;

use log::debug;

use hexpat_core::{identifier::Id, types::BuiltinType};

use crate::{
    ast::{Ast, Declaration, EnumDecl, StructDecl, TypeRef, VariableDecl},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Span, Spanned},
    type_table::TypeTable,
};

/// Widest integer an enum may be backed by, in bytes.
const MAX_ENUM_WIDTH: u8 = 8;

struct Validator<'a, 'ast> {
    table: &'ast TypeTable<'a>,
    collector: DiagnosticCollector,
}

impl<'a, 'ast> Validator<'a, 'ast> {
    fn check_type_ref(&mut self, ty: &Spanned<TypeRef>) {
        let Some(name) = ty.as_custom() else {
            return;
        };
        if !self.table.contains(name) {
            self.collector.emit(
                Diagnostic::error(format!("undefined type `{name}`"))
                    .with_code(ErrorCode::E300)
                    .with_label(ty.span(), "not declared")
                    .with_help("declare it with `struct`, `enum` or `using` before use"),
            );
        }
    }

    /// Reports a second declaration of a name already in `seen`.
    fn check_unique(
        &mut self,
        seen: &mut HashMap<Id, Span>,
        name: &Spanned<Id>,
        code: ErrorCode,
        what: &str,
    ) {
        match seen.get(name.inner()) {
            Some(&first) => self.collector.emit(
                Diagnostic::error(format!("duplicate {what} `{name}`"))
                    .with_code(code)
                    .with_label(name.span(), "redeclared here")
                    .with_secondary_label(first, "first declared here"),
            ),
            None => {
                seen.insert(name.into_inner(), name.span());
            }
        }
    }

    fn check_struct(&mut self, decl: &StructDecl<'_>) {
        let mut members = HashMap::new();
        for member in decl.members {
            self.check_unique(&mut members, &member.name, ErrorCode::E305, "member");
            self.check_type_ref(&member.ty);
        }
    }

    fn check_enum(&mut self, decl: &EnumDecl<'_>) {
        self.check_type_ref(&decl.underlying);

        let width = match self.enum_backing(decl) {
            Some(ty) => Some(ty.width()),
            None => {
                self.collector.emit(
                    Diagnostic::error(format!(
                        "enum `{}` must be backed by an unsigned integer of at most {MAX_ENUM_WIDTH} bytes",
                        decl.name
                    ))
                    .with_code(ErrorCode::E302)
                    .with_label(decl.underlying.span(), "invalid underlying type")
                    .with_help("use one of `u8`, `u16`, `u32` or `u64`"),
                );
                None
            }
        };

        let mut variants = HashMap::new();
        for variant in decl.variants {
            self.check_unique(&mut variants, &variant.name, ErrorCode::E303, "variant");

            let Some(width) = width else { continue };
            let value = *variant.value.inner();
            if !fits_in_width(value, width) {
                self.collector.emit(
                    Diagnostic::error(format!(
                        "value {value} of `{}` does not fit in {width} byte(s)",
                        variant.name
                    ))
                    .with_code(ErrorCode::E304)
                    .with_label(variant.value.span(), "out of range")
                    .with_secondary_label(decl.underlying.span(), "underlying type"),
                );
            }
        }
    }

    /// The built-in an enum is backed by, following aliases, if it is a
    /// valid enum backing type. `None` on an invalid or undefined type.
    fn enum_backing(&self, decl: &EnumDecl<'_>) -> Option<BuiltinType> {
        let ty = self.builtin_target(*decl.underlying.inner())?;
        (ty.is_unsigned() && ty.width() <= MAX_ENUM_WIDTH).then_some(ty)
    }

    /// Follows aliases from `ty` to a built-in. Stops at structs, enums,
    /// undefined names and cycles.
    fn builtin_target(&self, mut ty: TypeRef) -> Option<BuiltinType> {
        let mut hops = 0;
        loop {
            match ty {
                TypeRef::Builtin(builtin) => return Some(builtin),
                TypeRef::Custom(name) => {
                    // Only a pure alias chain leads to a built-in.
                    if self.table.get_struct(name).is_some() || self.table.get_enum(name).is_some()
                    {
                        return None;
                    }
                    let alias = self.table.get_alias(name)?;
                    hops += 1;
                    if hops > self.table.len() {
                        return None;
                    }
                    ty = *alias.target.inner();
                }
            }
        }
    }

    fn check_variable(&mut self, var: &VariableDecl, seen: &mut HashMap<Id, Span>) {
        self.check_unique(seen, &var.name, ErrorCode::E306, "variable");
        self.check_type_ref(&var.ty);

        if var.offset.is_none() {
            self.collector.emit(
                Diagnostic::warning(format!("variable `{}` has no placement", var.name))
                    .with_code(ErrorCode::E307)
                    .with_label(var.span(), "produces no regions")
                    .with_help("place it with `@ offset`"),
            );
        }
    }
}

fn fits_in_width(value: u64, width: u8) -> bool {
    width >= 8 || value >> (u32::from(width) * 8) == 0
}

/// Validate `ast` and build its [`TypeTable`].
///
/// # Errors
///
/// Returns every `E3xx` error found. Warnings (such as unplaced variables)
/// are logged and do not fail validation.
pub fn validate<'a>(ast: &Ast<'a>) -> Result<TypeTable<'a>, ParseError> {
    let table = TypeTable::build(ast);
    let mut validator = Validator {
        table: &table,
        collector: DiagnosticCollector::new(),
    };

    let mut type_names = HashMap::new();
    let mut variable_names = HashMap::new();

    for decl in ast.declarations() {
        match decl {
            Declaration::Struct(s) => {
                validator.check_unique(&mut type_names, &s.name, ErrorCode::E301, "type");
                validator.check_struct(s);
            }
            Declaration::Enum(e) => {
                validator.check_unique(&mut type_names, &e.name, ErrorCode::E301, "type");
                validator.check_enum(e);
            }
            Declaration::Alias(a) => {
                validator.check_unique(&mut type_names, &a.name, ErrorCode::E301, "type");
                validator.check_type_ref(&a.target);
            }
            Declaration::Variable(v) => validator.check_variable(v, &mut variable_names),
        }
    }

    validator.collector.finish()?;
    debug!(types = table.len(); "Validation succeeded");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use super::*;
    use crate::{lexer::tokenize, parser::parse};

    fn validate_source(source: &str) -> Result<usize, ParseError> {
        let arena = Bump::new();
        let tokens = tokenize(source).unwrap();
        let ast = parse(&tokens, &arena).unwrap();
        validate(&ast).map(|table| table.len())
    }

    fn error_codes(source: &str) -> Vec<ErrorCode> {
        let err = validate_source(source).expect_err("validation should fail");
        err.codes().collect()
    }

    #[test]
    fn test_valid_pattern() {
        let source = "
            enum Kind : u16 { A, B = 0xFFFF }
            using Word = u32;
            struct Header { Kind kind; Word len; char tag[4]; }
            Header header @ 0x00;
        ";
        assert_eq!(validate_source(source).unwrap(), 3);
    }

    #[test]
    fn test_undefined_type_everywhere() {
        let codes = error_codes(
            "struct S { Missing m; } using A = Gone; Nowhere v @ 0; enum E : Nope { X }",
        );
        // `Nope` is both undefined and an invalid backing type.
        assert_eq!(
            codes,
            vec![
                ErrorCode::E300,
                ErrorCode::E300,
                ErrorCode::E300,
                ErrorCode::E300,
                ErrorCode::E302,
            ]
        );
    }

    #[test]
    fn test_duplicate_type_across_categories() {
        let err = validate_source("struct T { u8 a; } using T = u8;").unwrap_err();
        let diag = &err.diagnostics()[0];

        assert_eq!(diag.code(), Some(ErrorCode::E301));
        assert_eq!(diag.labels().len(), 2);
    }

    #[test]
    fn test_enum_backing_types() {
        assert!(validate_source("enum E : u64 { A }").is_ok());
        assert!(validate_source("using B = u8; using C = B; enum E : C { A }").is_ok());

        assert_eq!(error_codes("enum E : s8 { A }"), vec![ErrorCode::E302]);
        assert_eq!(error_codes("enum E : u128 { A }"), vec![ErrorCode::E302]);
        assert_eq!(error_codes("enum E : float { A }"), vec![ErrorCode::E302]);
        assert_eq!(
            error_codes("struct S { u8 a; } enum E : S { A }"),
            vec![ErrorCode::E302]
        );
    }

    #[test]
    fn test_enum_alias_cycle_is_invalid_backing() {
        assert_eq!(
            error_codes("using A = B; using B = A; enum E : A { X }"),
            vec![ErrorCode::E302]
        );
    }

    #[test]
    fn test_enum_variants() {
        assert_eq!(
            error_codes("enum E : u8 { A, A }"),
            vec![ErrorCode::E303]
        );
        assert_eq!(
            error_codes("enum E : u8 { A = 255, B }"),
            vec![ErrorCode::E304]
        );
        assert!(validate_source("enum E : u16 { A = 0x100 }").is_ok());
    }

    #[test]
    fn test_duplicate_member_and_variable() {
        assert_eq!(
            error_codes("struct S { u8 a; u16 a; }"),
            vec![ErrorCode::E305]
        );
        assert_eq!(
            error_codes("u8 v @ 0; u16 v @ 1;"),
            vec![ErrorCode::E306]
        );
    }

    #[test]
    fn test_unplaced_variable_is_only_a_warning() {
        assert!(validate_source("u8 floating;").is_ok());
    }

    #[test]
    fn test_fits_in_width() {
        assert!(fits_in_width(255, 1));
        assert!(!fits_in_width(256, 1));
        assert!(fits_in_width(u64::MAX, 8));
        assert!(fits_in_width(0xFFFF_FFFF, 4));
        assert!(!fits_in_width(0x1_0000_0000, 4));
    }
}
