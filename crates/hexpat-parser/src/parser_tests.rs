//! Unit tests for the pattern parser, grouped by construct.

use bumpalo::Bump;

use crate::{
    ast::{Declaration, TypeRef},
    error::{ErrorCode, ParseError},
    lexer, parser,
};

/// Parse a source string and return the number of top-level declarations.
fn parse_source(source: &str) -> Result<usize, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let arena = Bump::new();
    let ast = parser::parse(&tokens, &arena)?;
    Ok(ast.declarations().len())
}

fn assert_parses_successfully(source: &str) {
    if let Err(e) = parse_source(source) {
        panic!("Expected parsing to succeed, but got error: {e}");
    }
}

fn assert_parse_fails_with(source: &str, code: ErrorCode) {
    match parse_source(source) {
        Ok(_) => panic!("Expected parsing to fail for {source:?}"),
        Err(err) => assert!(
            err.has_code(code),
            "Expected {code} for {source:?}, got: {err}"
        ),
    }
}

mod variable_tests {
    use super::*;

    #[test]
    fn test_placed_scalar() {
        assert_parses_successfully("u32 magic @ 0x00;");
    }

    #[test]
    fn test_unplaced_and_array() {
        assert_parses_successfully("u8 padding[16];");
        assert_parses_successfully("char name[8] @ 0x10;");
    }

    #[test]
    fn test_every_builtin() {
        for ty in [
            "u8", "u16", "u32", "u64", "u128", "s8", "s16", "s32", "s64", "s128", "char", "float",
            "double",
        ] {
            assert_parses_successfully(&format!("{ty} value @ 0;"));
        }
    }

    #[test]
    fn test_custom_type_reference() {
        let tokens = lexer::tokenize("Header hdr @ 4;").unwrap();
        let arena = Bump::new();
        let ast = parser::parse(&tokens, &arena).unwrap();

        let var = ast.variables().next().unwrap();
        assert_eq!(*var.ty.inner(), TypeRef::Custom("Header".into()));
        assert_eq!(var.offset.map(|o| o.into_inner()), Some(4));
        assert_eq!(var.len(), 1);
    }

    #[test]
    fn test_missing_semicolon() {
        assert_parse_fails_with("u8 a @ 0", ErrorCode::E200);
    }

    #[test]
    fn test_missing_name() {
        assert_parse_fails_with("u8 @ 0;", ErrorCode::E200);
    }

    #[test]
    fn test_keyword_as_name() {
        assert_parse_fails_with("u8 struct @ 0;", ErrorCode::E200);
    }

    #[test]
    fn test_placement_before_array() {
        assert_parse_fails_with("u8 a @ 0 [2];", ErrorCode::E200);
    }
}

mod struct_tests {
    use super::*;

    #[test]
    fn test_struct_with_and_without_semicolon() {
        assert_parses_successfully("struct A { u8 x; };");
        assert_parses_successfully("struct B { u8 x; }");
        assert_eq!(parse_source("struct A { u8 x; } struct B { A a[2]; }").unwrap(), 2);
    }

    #[test]
    fn test_empty_struct() {
        assert_parses_successfully("struct Empty {}");
    }

    #[test]
    fn test_nested_struct_definition_rejected() {
        assert_parse_fails_with("struct A { struct B { u8 x; } }", ErrorCode::E200);
    }

    #[test]
    fn test_unclosed_struct() {
        assert_parse_fails_with("struct A { u8 x;", ErrorCode::E200);
    }

    #[test]
    fn test_member_with_placement() {
        assert_parse_fails_with("struct A { u8 x @ 0; }", ErrorCode::E204);
    }
}

mod enum_tests {
    use super::*;

    #[test]
    fn test_enum_forms() {
        assert_parses_successfully("enum E : u8 { A }");
        assert_parses_successfully("enum E : u8 { A, B, };");
        assert_parses_successfully("enum E : u32 { A = 0b101, B = 0o17, C = 1_000 }");
        assert_parses_successfully("enum E : u8 {}");
    }

    #[test]
    fn test_enum_without_underlying_type() {
        assert_parse_fails_with("enum E { A }", ErrorCode::E200);
    }

    #[test]
    fn test_enum_missing_value() {
        assert_parse_fails_with("enum E : u8 { A = }", ErrorCode::E200);
    }

    #[test]
    fn test_enum_variant_spans() {
        let source = "enum E : u8 { First, Second = 7 }";
        let tokens = lexer::tokenize(source).unwrap();
        let arena = Bump::new();
        let ast = parser::parse(&tokens, &arena).unwrap();

        let Declaration::Enum(decl) = ast.declarations()[0] else {
            panic!("expected enum");
        };
        let implicit = decl.variants[0].value.span();
        let explicit = decl.variants[1].value.span();
        assert_eq!(&source[implicit.start()..implicit.end()], "First");
        assert_eq!(&source[explicit.start()..explicit.end()], "7");
    }
}

mod alias_tests {
    use super::*;

    #[test]
    fn test_alias_forms() {
        assert_parses_successfully("using Word = u16;");
        assert_parses_successfully("using Chain = Word;");
    }

    #[test]
    fn test_alias_without_semicolon() {
        assert_parse_fails_with("using Word = u16", ErrorCode::E200);
    }

    #[test]
    fn test_alias_with_array() {
        assert_parse_fails_with("using Words = u16[4];", ErrorCode::E200);
    }
}

mod program_tests {
    use super::*;

    #[test]
    fn test_mixed_program_with_comments() {
        let source = r#"
            // File header
            enum Kind : u8 { Data = 1, Code = 2 }

            /* Layout */
            struct Header {
                u32 magic;   // "HXPT"
                Kind kind;
                u16 count;
            };

            using Offset = u32;
            Header header @ 0x00;
            Offset table @ 0x08;
        "#;
        assert_eq!(parse_source(source).unwrap(), 5);
    }

    #[test]
    fn test_stray_tokens() {
        assert_parse_fails_with("}", ErrorCode::E200);
        assert_parse_fails_with("u8 a @ 0; ;", ErrorCode::E200);
        assert_parse_fails_with("@ 0", ErrorCode::E200);
    }

    #[test]
    fn test_only_first_syntax_error_reported() {
        let err = parse_source("u8 a @; u8 b @;").unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);
    }
}
