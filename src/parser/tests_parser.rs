#![cfg(test)]
use serde::Serialize;

use crate::ast::*;
use crate::diagnostic::DiagnosticEngine;
use crate::dumper;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::scope::Scope;
use crate::source_manager::SourceManager;
use crate::token::Token;

fn tokenize(source: &str) -> Vec<Token> {
    let mut sources = SourceManager::new();
    let id = sources.add_buffer("test.c", source);
    Lexer::new(sources.get_buffer(id), id).tokenize_all()
}

fn parse_unit(source: &str) -> (TranslationUnit, DiagnosticEngine) {
    let tokens = tokenize(source);
    let mut diag = DiagnosticEngine::new();
    let unit = Parser::new(&tokens, &mut diag).parse_translation_unit();
    (unit, diag)
}

fn parse_unit_ok(source: &str) -> TranslationUnit {
    let (unit, diag) = parse_unit(source);
    assert!(
        !diag.has_errors(),
        "unexpected diagnostics for {:?}: {:?}",
        source,
        diag.diagnostics()
    );
    unit
}

/// Parse a lone expression with an optional set of seeded typedef names.
fn parse_expr_with_typedefs(source: &str, typedefs: &[&str]) -> Expr {
    let tokens = tokenize(source);
    let mut diag = DiagnosticEngine::new();
    let scope = Scope::with_seed_typedefs(typedefs.iter().map(|name| Symbol::new(name)));
    let mut parser = Parser::with_scope(&tokens, &mut diag, scope);
    let expr = parser.parse_expr_min().expect("expression should parse");
    assert!(!diag.has_errors(), "diagnostics: {:?}", diag.diagnostics());
    expr
}

fn setup_expr(source: &str) -> Resolved {
    resolve_expr(&parse_expr_with_typedefs(source, &[]))
}

fn setup_declaration(source: &str) -> ResolvedDeclaration {
    let unit = parse_unit_ok(source);
    let Some(ExternalDeclaration::Declaration(declaration)) = unit.decls.first() else {
        panic!("expected a declaration for {:?}", source);
    };
    resolve_declaration(declaration)
}

/// Resolved AST view for testing - replaces boxes and interned symbols with
/// plain serializable content.
#[derive(Debug, Serialize)]
enum Resolved {
    LiteralInt(i64),
    LiteralFloat(f64),
    LiteralString(String),
    LiteralChar(u8),
    Ident(String),
    Unary(String, Box<Resolved>),
    Binary(String, Box<Resolved>, Box<Resolved>),
    Assign(String, Box<Resolved>, Box<Resolved>),
    Ternary(Box<Resolved>, Box<Resolved>, Box<Resolved>),
    PostIncrement(Box<Resolved>),
    PostDecrement(Box<Resolved>),
    Call(Box<Resolved>, Vec<Resolved>),
    Member(Box<Resolved>, String, bool),
    Index(Box<Resolved>, Box<Resolved>),
    Cast(String, Box<Resolved>),
    SizeOfExpr(Box<Resolved>),
    SizeOfType(String),
    CompoundLiteral(String, Vec<Resolved>),
}

#[derive(Debug, Serialize)]
struct ResolvedDeclaration {
    specifiers: Vec<String>,
    init_declarators: Vec<ResolvedInitDeclarator>,
}

#[derive(Debug, Serialize)]
struct ResolvedInitDeclarator {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    initializer: Option<Resolved>,
}

fn resolve_expr(expr: &Expr) -> Resolved {
    match &expr.kind {
        ExprKind::Ident(name) => Resolved::Ident(name.to_string()),
        ExprKind::LiteralInt(value) => Resolved::LiteralInt(value.as_u64() as i64),
        ExprKind::LiteralFloat(value) => Resolved::LiteralFloat(value.as_f64()),
        ExprKind::LiteralChar(value) => Resolved::LiteralChar(*value),
        ExprKind::LiteralString(value) => Resolved::LiteralString(value.to_string()),
        ExprKind::UnaryOp(op, operand) => Resolved::Unary(format!("{:?}", op), Box::new(resolve_expr(operand))),
        ExprKind::BinaryOp(op, left, right) => Resolved::Binary(
            format!("{:?}", op),
            Box::new(resolve_expr(left)),
            Box::new(resolve_expr(right)),
        ),
        ExprKind::Assignment(op, left, right) => Resolved::Assign(
            format!("{:?}", op),
            Box::new(resolve_expr(left)),
            Box::new(resolve_expr(right)),
        ),
        ExprKind::TernaryOp(condition, then_expr, else_expr) => Resolved::Ternary(
            Box::new(resolve_expr(condition)),
            Box::new(resolve_expr(then_expr)),
            Box::new(resolve_expr(else_expr)),
        ),
        ExprKind::Cast(type_name, operand) => {
            Resolved::Cast(dumper::dump_type_name(type_name), Box::new(resolve_expr(operand)))
        }
        ExprKind::SizeOfExpr(operand) => Resolved::SizeOfExpr(Box::new(resolve_expr(operand))),
        ExprKind::SizeOfType(type_name) => Resolved::SizeOfType(dumper::dump_type_name(type_name)),
        ExprKind::PostIncrement(operand) => Resolved::PostIncrement(Box::new(resolve_expr(operand))),
        ExprKind::PostDecrement(operand) => Resolved::PostDecrement(Box::new(resolve_expr(operand))),
        ExprKind::FunctionCall(callee, args) => Resolved::Call(
            Box::new(resolve_expr(callee)),
            args.iter().map(resolve_expr).collect(),
        ),
        ExprKind::IndexAccess(array, index) => {
            Resolved::Index(Box::new(resolve_expr(array)), Box::new(resolve_expr(index)))
        }
        ExprKind::MemberAccess(object, field, is_arrow) => {
            Resolved::Member(Box::new(resolve_expr(object)), field.to_string(), *is_arrow)
        }
        ExprKind::CompoundLiteral(type_name, items) => Resolved::CompoundLiteral(
            dumper::dump_type_name(type_name),
            items.iter().map(resolve_initializer_item).collect(),
        ),
    }
}

fn resolve_initializer_item(item: &DesignatedInitializer) -> Resolved {
    match &item.initializer {
        Initializer::Expression(expr) => resolve_expr(expr),
        Initializer::List(items) => Resolved::CompoundLiteral(
            String::new(),
            items.iter().map(resolve_initializer_item).collect(),
        ),
    }
}

fn resolve_declaration(declaration: &Declaration) -> ResolvedDeclaration {
    let specifiers = declaration.specifiers.iter().map(specifier_string).collect();
    let init_declarators = declaration
        .init_declarators
        .iter()
        .map(|init_declarator| ResolvedInitDeclarator {
            name: init_declarator
                .declarator
                .name()
                .map(|name| name.to_string())
                .unwrap_or_else(|| "<unnamed>".to_string()),
            kind: declarator_kind(&init_declarator.declarator),
            initializer: init_declarator.initializer.as_ref().map(|initializer| match initializer {
                Initializer::Expression(expr) => resolve_expr(expr),
                Initializer::List(items) => Resolved::CompoundLiteral(
                    String::new(),
                    items.iter().map(resolve_initializer_item).collect(),
                ),
            }),
        })
        .collect();

    ResolvedDeclaration {
        specifiers,
        init_declarators,
    }
}

fn specifier_string(specifier: &DeclarationSpecifier) -> String {
    match specifier {
        DeclarationSpecifier::StorageClass(StorageClassSpecifier::Typedef) => "typedef".to_string(),
        DeclarationSpecifier::StorageClass(StorageClassSpecifier::Extern) => "extern".to_string(),
        DeclarationSpecifier::StorageClass(StorageClassSpecifier::Static) => "static".to_string(),
        DeclarationSpecifier::StorageClass(StorageClassSpecifier::Auto) => "auto".to_string(),
        DeclarationSpecifier::StorageClass(StorageClassSpecifier::Register) => "register".to_string(),
        DeclarationSpecifier::TypeQualifier(TypeQualifier::Const) => "const".to_string(),
        DeclarationSpecifier::TypeQualifier(TypeQualifier::Restrict) => "restrict".to_string(),
        DeclarationSpecifier::TypeQualifier(TypeQualifier::Volatile) => "volatile".to_string(),
        DeclarationSpecifier::FunctionSpecifier(FunctionSpecifier::Inline) => "inline".to_string(),
        DeclarationSpecifier::TypeSpecifier(type_specifier) => type_specifier_string(type_specifier),
    }
}

fn type_specifier_string(type_specifier: &TypeSpecifier) -> String {
    match type_specifier {
        TypeSpecifier::Void => "void".to_string(),
        TypeSpecifier::Char => "char".to_string(),
        TypeSpecifier::Short => "short".to_string(),
        TypeSpecifier::Int => "int".to_string(),
        TypeSpecifier::Long => "long".to_string(),
        TypeSpecifier::Float => "float".to_string(),
        TypeSpecifier::Double => "double".to_string(),
        TypeSpecifier::Signed => "signed".to_string(),
        TypeSpecifier::Unsigned => "unsigned".to_string(),
        TypeSpecifier::Bool => "_Bool".to_string(),
        TypeSpecifier::TypedefName(name) => name.to_string(),
        TypeSpecifier::Record(record) => {
            let keyword = if record.is_union { "union" } else { "struct" };
            let tag = record.tag.map(|tag| format!(" {}", tag)).unwrap_or_default();
            if record.members.is_some() {
                format!("{}{} {{ ... }}", keyword, tag)
            } else {
                format!("{}{}", keyword, tag)
            }
        }
        TypeSpecifier::Enum(spec) => {
            let tag = spec.tag.map(|tag| format!(" {}", tag)).unwrap_or_default();
            if spec.enumerators.is_some() {
                format!("enum{} {{ ... }}", tag)
            } else {
                format!("enum{}", tag)
            }
        }
    }
}

fn declarator_kind(declarator: &Declarator) -> Option<String> {
    let kind = match &declarator.direct {
        DirectDeclarator::Array { .. } => "array",
        DirectDeclarator::Function { .. } => "function",
        _ if !declarator.pointers.is_empty() => "pointer",
        _ => return None,
    };
    Some(kind.to_string())
}

// === Expressions ===

#[test]
fn test_simple_addition() {
    let resolved = setup_expr("1 + 2");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Binary:
      - Add
      - LiteralInt: 1
      - LiteralInt: 2
    ");
}

#[test]
fn test_precedence_mul_over_add() {
    let resolved = setup_expr("1 + 2 * 3");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Binary:
      - Add
      - LiteralInt: 1
      - Binary:
          - Mul
          - LiteralInt: 2
          - LiteralInt: 3
    ");
}

#[test]
fn test_precedence_add_over_shift() {
    let resolved = setup_expr("1 << 2 + 3");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Binary:
      - LShift
      - LiteralInt: 1
      - Binary:
          - Add
          - LiteralInt: 2
          - LiteralInt: 3
    ");
}

#[test]
fn test_left_associativity() {
    let resolved = setup_expr("1 - 2 - 3");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Binary:
      - Sub
      - Binary:
          - Sub
          - LiteralInt: 1
          - LiteralInt: 2
      - LiteralInt: 3
    ");
}

#[test]
fn test_assignment_right_associativity() {
    let resolved = setup_expr("a = b = c");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Assign:
      - Assign
      - Ident: a
      - Assign:
          - Assign
          - Ident: b
          - Ident: c
    ");
}

#[test]
fn test_compound_assignment_binds_looser_than_arithmetic() {
    let resolved = setup_expr("a += 2 * (3 + 4)");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Assign:
      - AddAssign
      - Ident: a
      - Binary:
          - Mul
          - LiteralInt: 2
          - Binary:
              - Add
              - LiteralInt: 3
              - LiteralInt: 4
    ");
}

#[test]
fn test_ternary() {
    let resolved = setup_expr("a ? 1 : 2");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Ternary:
      - Ident: a
      - LiteralInt: 1
      - LiteralInt: 2
    ");
}

#[test]
fn test_comma_operator() {
    let resolved = setup_expr("a, b");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Binary:
      - Comma
      - Ident: a
      - Ident: b
    ");
}

#[test]
fn test_logical_and_bitwise_levels() {
    // a || b && c | d ^ e & f parses innermost-right per the precedence table.
    let resolved = setup_expr("a || b && c | d ^ e & f");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Binary:
      - LogicOr
      - Ident: a
      - Binary:
          - LogicAnd
          - Ident: b
          - Binary:
              - BitOr
              - Ident: c
              - Binary:
                  - BitXor
                  - Ident: d
                  - Binary:
                      - BitAnd
                      - Ident: e
                      - Ident: f
    ");
}

#[test]
fn test_unary_operators() {
    let resolved = setup_expr("-1");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Unary:
      - Minus
      - LiteralInt: 1
    ");

    let resolved = setup_expr("!*p");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Unary:
      - LogicNot
      - Unary:
          - Deref
          - Ident: p
    ");

    let resolved = setup_expr("&x");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Unary:
      - AddrOf
      - Ident: x
    ");
}

#[test]
fn test_prefix_and_postfix_increment() {
    let resolved = setup_expr("++i");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Unary:
      - PreIncrement
      - Ident: i
    ");

    let resolved = setup_expr("i++");
    insta::assert_yaml_snapshot!(&resolved, @r"
    PostIncrement:
      Ident: i
    ");
}

#[test]
fn test_postfix_chain() {
    let resolved = setup_expr("f(a)[0].x->y");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Member:
      - Member:
          - Index:
              - Call:
                  - Ident: f
                  - - Ident: a
              - LiteralInt: 0
          - x
          - false
      - y
      - true
    ");
}

#[test]
fn test_call_arguments_are_assignment_level() {
    // The comma separates arguments instead of building a comma expression.
    let resolved = setup_expr("f(a, b)");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Call:
      - Ident: f
      - - Ident: a
        - Ident: b
    ");
}

#[test]
fn test_sizeof_expression_and_type() {
    let resolved = setup_expr("sizeof x");
    insta::assert_yaml_snapshot!(&resolved, @r"
    SizeOfExpr:
      Ident: x
    ");

    let resolved = setup_expr("sizeof(int)");
    insta::assert_yaml_snapshot!(&resolved, @r"
    SizeOfType: int
    ");

    // Parenthesised operand, not a type.
    let resolved = setup_expr("sizeof (x)");
    insta::assert_yaml_snapshot!(&resolved, @r"
    SizeOfExpr:
      Ident: x
    ");
}

#[test]
fn test_cast_expression() {
    let resolved = setup_expr("(int)x");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Cast:
      - int
      - Ident: x
    ");
}

#[test]
fn test_cast_with_typedef_name() {
    let expr = parse_expr_with_typedefs("(u32)x", &["u32"]);
    let resolved = resolve_expr(&expr);
    insta::assert_yaml_snapshot!(&resolved, @r"
    Cast:
      - u32
      - Ident: x
    ");
}

#[test]
fn test_cast_to_function_pointer() {
    let resolved = setup_expr("(int (*)(int))p");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Cast:
      - int (*)(int)
      - Ident: p
    ");
}

#[test]
fn test_parenthesised_expression_is_not_a_cast() {
    let resolved = setup_expr("(x) + 1");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Binary:
      - Add
      - Ident: x
      - LiteralInt: 1
    ");
}

#[test]
fn test_cast_binds_tighter_than_binary() {
    let resolved = setup_expr("(int)x + 1");
    insta::assert_yaml_snapshot!(&resolved, @r"
    Binary:
      - Add
      - Cast:
          - int
          - Ident: x
      - LiteralInt: 1
    ");
}

#[test]
fn test_compound_literal() {
    let resolved = setup_expr("(struct point){1, 2}");
    insta::assert_yaml_snapshot!(&resolved, @r"
    CompoundLiteral:
      - struct point
      - - LiteralInt: 1
        - LiteralInt: 2
    ");
}

#[test]
fn test_string_and_char_literals() {
    let resolved = setup_expr("\"hello\"");
    insta::assert_yaml_snapshot!(&resolved, @r#"
    LiteralString: hello
    "#);

    let resolved = setup_expr("'a'");
    insta::assert_yaml_snapshot!(&resolved, @r"
    LiteralChar: 97
    ");
}

// === Declarations ===

#[test]
fn test_simple_declaration() {
    let resolved = setup_declaration("int x;");
    insta::assert_yaml_snapshot!(&resolved, @r"
    specifiers:
      - int
    init_declarators:
      - name: x
    ");
}

#[test]
fn test_pointer_array_function_declarators() {
    let resolved = setup_declaration("int *a, b[10], c(int);");
    insta::assert_yaml_snapshot!(&resolved, @r"
    specifiers:
      - int
    init_declarators:
      - name: a
        kind: pointer
      - name: b
        kind: array
      - name: c
        kind: function
    ");
}

#[test]
fn test_declaration_with_initializer() {
    let resolved = setup_declaration("int x = 7;");
    insta::assert_yaml_snapshot!(&resolved, @r"
    specifiers:
      - int
    init_declarators:
      - name: x
        initializer:
          LiteralInt: 7
    ");
}

#[test]
fn test_struct_forward_declaration() {
    let resolved = setup_declaration("struct Point;");
    insta::assert_yaml_snapshot!(&resolved, @r"
    specifiers:
      - struct Point
    init_declarators: []
    ");
}

#[test]
fn test_struct_definition() {
    let resolved = setup_declaration("struct Point { int x; int y; };");
    insta::assert_yaml_snapshot!(&resolved, @r#"
    specifiers:
      - "struct Point { ... }"
    init_declarators: []
    "#);
}

#[test]
fn test_struct_variable_declaration() {
    let resolved = setup_declaration("struct Point p;");
    insta::assert_yaml_snapshot!(&resolved, @r"
    specifiers:
      - struct Point
    init_declarators:
      - name: p
    ");
}

#[test]
fn test_union_keyword_sets_union_flag() {
    let unit = parse_unit_ok("union U { int a; float b; }; struct S { int a; };");

    let records: Vec<bool> = unit
        .decls
        .iter()
        .map(|decl| {
            let ExternalDeclaration::Declaration(declaration) = decl else {
                panic!("expected declaration");
            };
            let DeclarationSpecifier::TypeSpecifier(TypeSpecifier::Record(record)) = &declaration.specifiers[0] else {
                panic!("expected record specifier");
            };
            record.is_union
        })
        .collect();

    assert_eq!(records, vec![true, false]);
}

#[test]
fn test_struct_with_bit_fields() {
    let unit = parse_unit_ok("struct S { int x; float y : 3; int : 4; };");

    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    let DeclarationSpecifier::TypeSpecifier(TypeSpecifier::Record(record)) = &declaration.specifiers[0] else {
        panic!("expected record specifier");
    };
    let members = record.members.as_ref().expect("definition has members");
    assert_eq!(members.len(), 3);

    // x: plain declarator, no width
    assert!(members[0].declarators[0].bit_width.is_none());
    // y : 3
    let width = members[1].declarators[0].bit_width.as_ref().expect("bit width");
    assert!(matches!(width.kind, ExprKind::LiteralInt(_)));
    // anonymous : 4
    assert!(members[2].declarators[0].declarator.is_none());
    assert!(members[2].declarators[0].bit_width.is_some());
}

#[test]
fn test_enum_declaration() {
    let unit = parse_unit_ok("enum Color { RED, GREEN = 2, BLUE, };");

    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    let DeclarationSpecifier::TypeSpecifier(TypeSpecifier::Enum(spec)) = &declaration.specifiers[0] else {
        panic!("expected enum specifier");
    };
    assert_eq!(spec.tag.unwrap().as_str(), "Color");
    let enumerators = spec.enumerators.as_ref().expect("enumerators");
    assert_eq!(enumerators.len(), 3);
    assert_eq!(enumerators[0].name.as_str(), "RED");
    assert!(enumerators[0].value.is_none());
    assert!(enumerators[1].value.is_some());
}

#[test]
fn test_enumerators_shadow_typedefs() {
    // GREEN is bound as an ordinary name by the enum body, so the later
    // `GREEN * x` is an expression statement, not a declaration.
    let unit = parse_unit_ok(
        "typedef int GREEN; void f(void) { enum E { GREEN }; GREEN * x; }",
    );

    let ExternalDeclaration::Function(function) = &unit.decls[1] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    assert!(matches!(
        items[1],
        BlockItem::Statement(Statement {
            kind: StatementKind::Expression(Some(_)),
            ..
        })
    ));
}

#[test]
fn test_designated_initializers() {
    let unit = parse_unit_ok("int a[3] = {[0] = 1, [2] = 3}; struct P q = {.x = 1, .y = 2};");

    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    let Some(Initializer::List(items)) = &declaration.init_declarators[0].initializer else {
        panic!("expected initializer list");
    };
    assert_eq!(items.len(), 2);
    assert!(matches!(items[0].designation[0], Designator::ArrayIndex(_)));
    assert!(matches!(items[1].designation[0], Designator::ArrayIndex(_)));

    let ExternalDeclaration::Declaration(declaration) = &unit.decls[1] else {
        panic!("expected declaration");
    };
    let Some(Initializer::List(items)) = &declaration.init_declarators[0].initializer else {
        panic!("expected initializer list");
    };
    assert!(matches!(items[0].designation[0], Designator::FieldName(_)));
    assert!(matches!(items[1].designation[0], Designator::FieldName(_)));
}

#[test]
fn test_nested_initializer_lists() {
    let unit = parse_unit_ok("int m[2][2] = {{1, 2}, {3, 4}};");

    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    let Some(Initializer::List(rows)) = &declaration.init_declarators[0].initializer else {
        panic!("expected initializer list");
    };
    assert_eq!(rows.len(), 2);
    assert!(matches!(rows[0].initializer, Initializer::List(_)));
}

#[test]
fn test_parenthesised_declarator_collapses() {
    let unit = parse_unit_ok("int (((x)));");

    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    assert_eq!(declaration.init_declarators[0].declarator.name().unwrap().as_str(), "x");
}

// === Typedef feedback ===

#[test]
fn test_typedef_then_use() {
    let unit = parse_unit_ok("typedef unsigned int u32; u32 x = 7;");
    assert_eq!(unit.decls.len(), 2);

    let ExternalDeclaration::Declaration(declaration) = &unit.decls[1] else {
        panic!("expected declaration");
    };
    let DeclarationSpecifier::TypeSpecifier(TypeSpecifier::TypedefName(name)) = &declaration.specifiers[0] else {
        panic!("expected typedef-name specifier, got {:?}", declaration.specifiers);
    };
    assert_eq!(name.as_str(), "u32");
}

#[test]
fn test_typedef_name_reused_as_declarator() {
    // The second T is in declarator position: a type specifier has already
    // been seen, so the typedef lookup does not apply.
    let unit = parse_unit_ok("typedef int T; T T;");

    let ExternalDeclaration::Declaration(declaration) = &unit.decls[1] else {
        panic!("expected declaration");
    };
    let DeclarationSpecifier::TypeSpecifier(TypeSpecifier::TypedefName(name)) = &declaration.specifiers[0] else {
        panic!("expected typedef-name specifier");
    };
    assert_eq!(name.as_str(), "T");
    assert_eq!(declaration.init_declarators[0].declarator.name().unwrap().as_str(), "T");
}

#[test]
fn test_ordinary_binding_is_not_a_type() {
    // `T` was declared as an object, so a later `T x;` cannot be a
    // declaration.
    let (_, diag) = parse_unit("int T; T x;");
    assert!(diag.has_errors());
}

#[test]
fn test_undeclared_type_name_is_an_error() {
    let (_, diag) = parse_unit("T x;");
    assert!(diag.has_errors());
}

#[test]
fn test_typedef_star_ambiguity() {
    // With T bound as a typedef, `T * x;` inside a block is a declaration.
    let unit = parse_unit_ok("typedef int T; void f(void) { T * x; }");
    let ExternalDeclaration::Function(function) = &unit.decls[1] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    assert!(matches!(items[0], BlockItem::Declaration(_)));

    // With T shadowed by an ordinary local, the same tokens multiply.
    let unit = parse_unit_ok("typedef int T; void f(int T) { T * x; }");
    let ExternalDeclaration::Function(function) = &unit.decls[1] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    let BlockItem::Statement(statement) = &items[0] else {
        panic!("expected statement, got declaration");
    };
    let StatementKind::Expression(Some(expr)) = &statement.kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(expr.kind, ExprKind::BinaryOp(BinaryOp::Mul, _, _)));
}

#[test]
fn test_block_scope_typedef_is_discarded() {
    // The typedef is usable inside the block that declared it...
    parse_unit_ok("void f(void) { typedef int T; T x; }");

    // ...and gone once the block scope is popped.
    let (_, diag) = parse_unit("void f(void) { typedef int T; } T y;");
    assert!(diag.has_errors());
}

#[test]
fn test_seeded_typedefs() {
    let tokens = tokenize("__builtin_va_list ap;");
    let mut diag = DiagnosticEngine::new();
    let scope = Scope::with_seed_typedefs([Symbol::new("__builtin_va_list")]);
    let unit = Parser::with_scope(&tokens, &mut diag, scope).parse_translation_unit();
    assert!(!diag.has_errors());
    assert_eq!(unit.decls.len(), 1);
}

#[test]
fn test_label_shadowing_typedef() {
    // A typedef name followed by `:` at statement position is a label.
    let unit = parse_unit_ok("typedef int T; void f(void) { T: goto T; }");
    let ExternalDeclaration::Function(function) = &unit.decls[1] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    let BlockItem::Statement(statement) = &items[0] else {
        panic!("expected statement");
    };
    assert!(matches!(statement.kind, StatementKind::Labeled(_, _)));
}

// === Function definitions and parameters ===

#[test]
fn test_simple_function_definition() {
    let unit = parse_unit_ok("int main(void) { return 0; }");
    assert_eq!(unit.decls.len(), 1);

    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function definition");
    };
    assert_eq!(function.declarator.name().unwrap().as_str(), "main");

    let DirectDeclarator::Function { params, .. } = &function.declarator.direct else {
        panic!("expected function declarator");
    };
    let FunctionParams::Prototype(list) = params else {
        panic!("(void) must produce a prototype");
    };
    assert_eq!(list.params.len(), 0);
    assert!(!list.has_ellipsis);

    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    assert_eq!(items.len(), 1);
    let BlockItem::Statement(statement) = &items[0] else {
        panic!("expected statement");
    };
    assert!(matches!(statement.kind, StatementKind::Return(Some(_))));
}

#[test]
fn test_parameters_are_visible_in_the_body() {
    let unit = parse_unit_ok("int add(int a, int b) { return a + b; }");
    assert_eq!(unit.decls.len(), 1);
}

#[test]
fn test_function_name_visible_after_definition() {
    parse_unit_ok("int f(void) { return 0; } int g(void) { return f(); }");
}

#[test]
fn test_empty_parens_are_unspecified_params() {
    let unit = parse_unit_ok("int f();");
    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    let DirectDeclarator::Function { params, .. } = &declaration.init_declarators[0].declarator.direct else {
        panic!("expected function declarator");
    };
    assert!(matches!(params, FunctionParams::IdentifierList(names) if names.is_empty()));
}

#[test]
fn test_knr_identifier_list() {
    let unit = parse_unit_ok("int f(a, b);");
    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    let DirectDeclarator::Function { params, .. } = &declaration.init_declarators[0].declarator.direct else {
        panic!("expected function declarator");
    };
    let FunctionParams::IdentifierList(names) = params else {
        panic!("expected identifier list");
    };
    let names: Vec<&str> = names.iter().map(|name| name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_variadic_prototype() {
    let unit = parse_unit_ok("int printf(const char *fmt, ...);");
    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    let DirectDeclarator::Function { params, .. } = &declaration.init_declarators[0].declarator.direct else {
        panic!("expected function declarator");
    };
    let FunctionParams::Prototype(list) = params else {
        panic!("expected prototype");
    };
    assert!(list.has_ellipsis);
    assert_eq!(list.params.len(), 1);
}

fn first_param(source: &str) -> ParameterDeclaration {
    let unit = parse_unit_ok(source);
    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    let DirectDeclarator::Function { params, .. } = &declaration.init_declarators[0].declarator.direct else {
        panic!("expected function declarator");
    };
    let FunctionParams::Prototype(list) = params else {
        panic!("expected prototype");
    };
    list.params[0].clone()
}

#[test]
fn test_parameter_declarator_disambiguation() {
    // Bare pointer: abstract.
    let param = first_param("int f(int *);");
    assert!(matches!(param.declarator, ParamDeclarator::Abstract(Some(_))));

    // Pointer to named parameter: concrete.
    let param = first_param("int f(int *x);");
    let ParamDeclarator::Named(declarator) = &param.declarator else {
        panic!("expected named declarator");
    };
    assert_eq!(declarator.name().unwrap().as_str(), "x");

    // Array: abstract.
    let param = first_param("int f(int [4]);");
    assert!(matches!(param.declarator, ParamDeclarator::Abstract(Some(_))));

    // Function on an anonymous head: abstract.
    let param = first_param("int f(int ());");
    assert!(matches!(param.declarator, ParamDeclarator::Abstract(Some(_))));

    // Parenthesised name: concrete.
    let param = first_param("int f(int (x));");
    let ParamDeclarator::Named(declarator) = &param.declarator else {
        panic!("expected named declarator");
    };
    assert_eq!(declarator.name().unwrap().as_str(), "x");

    // Qualified pointer, no name: abstract.
    let param = first_param("int f(int * const);");
    assert!(matches!(param.declarator, ParamDeclarator::Abstract(Some(_))));

    // No declarator tokens at all.
    let param = first_param("int f(int);");
    assert!(matches!(param.declarator, ParamDeclarator::Abstract(None)));
}

#[test]
fn test_function_pointer_parameter() {
    let param = first_param("int apply(int (*op)(int, int));");
    let ParamDeclarator::Named(declarator) = &param.declarator else {
        panic!("expected named declarator");
    };
    assert_eq!(declarator.name().unwrap().as_str(), "op");
    assert!(matches!(declarator.direct, DirectDeclarator::Function { .. }));
}

#[test]
fn test_array_suffix_forms() {
    let unit = parse_unit_ok("void g(int a[static 10], int b[*], int c[const 4], int d[]);");
    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    let DirectDeclarator::Function { params, .. } = &declaration.init_declarators[0].declarator.direct else {
        panic!("expected function declarator");
    };
    let FunctionParams::Prototype(list) = params else {
        panic!("expected prototype");
    };

    let sizes: Vec<&ArraySize> = list
        .params
        .iter()
        .map(|param| {
            let ParamDeclarator::Named(declarator) = &param.declarator else {
                panic!("expected named declarator");
            };
            let DirectDeclarator::Array { size, .. } = &declarator.direct else {
                panic!("expected array declarator");
            };
            size
        })
        .collect();

    assert!(sizes[0].is_static && sizes[0].size.is_some());
    assert!(sizes[1].is_star && sizes[1].size.is_none());
    assert!(sizes[2].qualifiers.contains(TypeQualifiers::CONST) && sizes[2].size.is_some());
    assert!(!sizes[3].is_static && !sizes[3].is_star && sizes[3].size.is_none());
}

#[test]
fn test_function_definition_without_function_declarator_is_an_error() {
    let (_, diag) = parse_unit("int x { }");
    assert!(diag.has_errors());
}

// === Statements ===

#[test]
fn test_dangling_else_binds_to_inner_if() {
    let unit = parse_unit_ok("void f(void) { if (a) if (b) x(); else y(); }");
    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    let BlockItem::Statement(outer) = &items[0] else {
        panic!("expected statement");
    };
    let StatementKind::If {
        then_branch,
        else_branch,
        ..
    } = &outer.kind
    else {
        panic!("expected if");
    };
    assert!(else_branch.is_none());
    let StatementKind::If { else_branch, .. } = &then_branch.kind else {
        panic!("expected nested if");
    };
    assert!(else_branch.is_some());
}

#[test]
fn test_for_with_declaration_init() {
    let unit = parse_unit_ok("void f(void) { for (int i = 0; i < 10; i++) g(i); }");
    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    let BlockItem::Statement(statement) = &items[0] else {
        panic!("expected statement");
    };
    let StatementKind::For {
        init,
        condition,
        step,
        ..
    } = &statement.kind
    else {
        panic!("expected for");
    };
    assert!(matches!(init, ForInit::Declaration(_)));
    assert!(condition.is_some());
    assert!(step.is_some());
}

#[test]
fn test_for_with_empty_clauses() {
    let unit = parse_unit_ok("void f(void) { for (;;) break; }");
    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    let BlockItem::Statement(statement) = &items[0] else {
        panic!("expected statement");
    };
    let StatementKind::For {
        init,
        condition,
        step,
        ..
    } = &statement.kind
    else {
        panic!("expected for");
    };
    assert!(matches!(init, ForInit::Expression(None)));
    assert!(condition.is_none());
    assert!(step.is_none());
}

#[test]
fn test_switch_case_default() {
    let unit = parse_unit_ok(
        "void f(int x) { switch (x) { case 1: g(); break; default: h(); } }",
    );
    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    let BlockItem::Statement(statement) = &items[0] else {
        panic!("expected statement");
    };
    let StatementKind::Switch(_, body) = &statement.kind else {
        panic!("expected switch");
    };
    let StatementKind::Compound(arms) = &body.kind else {
        panic!("expected compound switch body");
    };
    let BlockItem::Statement(first) = &arms[0] else {
        panic!("expected statement");
    };
    assert!(matches!(first.kind, StatementKind::Case(_, _)));
    let BlockItem::Statement(last) = arms.last().unwrap() else {
        panic!("expected statement");
    };
    assert!(matches!(last.kind, StatementKind::Default(_)));
}

#[test]
fn test_do_while() {
    let unit = parse_unit_ok("void f(void) { do g(); while (x); }");
    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    let BlockItem::Statement(statement) = &items[0] else {
        panic!("expected statement");
    };
    assert!(matches!(statement.kind, StatementKind::DoWhile(_, _)));
}

#[test]
fn test_goto_and_labels() {
    let unit = parse_unit_ok("void f(void) { again: if (x) goto again; }");
    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    let BlockItem::Statement(statement) = &items[0] else {
        panic!("expected statement");
    };
    let StatementKind::Labeled(label, _) = &statement.kind else {
        panic!("expected label");
    };
    assert_eq!(label.as_str(), "again");
}

#[test]
fn test_empty_statement() {
    let unit = parse_unit_ok("void f(void) { ; }");
    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    let BlockItem::Statement(statement) = &items[0] else {
        panic!("expected statement");
    };
    assert!(matches!(statement.kind, StatementKind::Expression(None)));
}

// === Boundaries and error handling ===

#[test]
fn test_empty_translation_unit() {
    let (unit, diag) = parse_unit("");
    assert!(unit.decls.is_empty());
    assert!(!diag.has_errors());
}

#[test]
fn test_stray_semicolons_at_file_scope() {
    let (unit, diag) = parse_unit(";;;");
    assert!(unit.decls.is_empty());
    assert!(!diag.has_errors());
}

#[test]
fn test_missing_semicolon_is_reported() {
    let (_, diag) = parse_unit("int x int y;");
    assert_eq!(diag.diagnostics().len(), 1);
    assert!(diag.diagnostics()[0].message.contains("Semicolon"));
}

#[test]
fn test_missing_semicolon_at_eof_reports_eof() {
    let (_, diag) = parse_unit("int x");
    assert_eq!(diag.diagnostics().len(), 1);
    assert!(diag.diagnostics()[0].message.contains("end of file"));
}

#[test]
fn test_unexpected_eof_is_reported() {
    let (_, diag) = parse_unit("int f(void) {");
    assert!(diag.has_errors());
}

#[test]
fn test_recovery_after_bad_declaration() {
    let (unit, diag) = parse_unit("int x = ; int y;");
    assert!(diag.has_errors());
    // The parser resynchronises at the `;` and still sees `int y;`.
    assert_eq!(unit.decls.len(), 1);
    let ExternalDeclaration::Declaration(declaration) = &unit.decls[0] else {
        panic!("expected declaration");
    };
    assert_eq!(declaration.init_declarators[0].declarator.name().unwrap().as_str(), "y");
}

#[test]
fn test_recovery_inside_a_block() {
    let (unit, diag) = parse_unit("void f(void) { int a = ; g(); } int z;");
    assert!(diag.has_errors());
    // The bad block item is dropped, the call and the trailing declaration
    // survive.
    assert_eq!(unit.decls.len(), 2);
    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function definition");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected compound body");
    };
    assert_eq!(items.len(), 1);
}

#[test]
fn test_diagnostic_line_and_column() {
    let mut sources = SourceManager::new();
    let id = sources.add_buffer("test.c", "int a;\nint = 4;\n");
    let tokens = Lexer::new(sources.get_buffer(id), id).tokenize_all();
    let mut diag = DiagnosticEngine::new();
    Parser::new(&tokens, &mut diag).parse_translation_unit();

    assert!(diag.has_errors());
    let (line, col) = diag.diagnostics()[0].line_col(&sources);
    assert_eq!(line, 2);
    assert_eq!(col, 5);
}

// === Round trips ===

fn dump_of(source: &str) -> String {
    dumper::dump_translation_unit(&parse_unit_ok(source))
}

#[test]
fn test_dump_reparse_is_stable() {
    let corpus = [
        "int main(void) { return 0; }",
        "typedef unsigned int u32; u32 x = 7;",
        "int *a, b[10], c(int);",
        "struct S { int x; float y : 3; }; struct S s;",
        "int f(void) { int a = 1; a += 2 * (3 + 4); return a; }",
        "enum Color { RED, GREEN = 2 }; enum Color c;",
        "void g(void) { for (int i = 0; i < 10; i++) if (i % 2) continue; else h(i); }",
        "int apply(int (*op)(int, int), int x) { return op(x, x); }",
        "int a[3] = {[0] = 1, [2] = 3};",
        "void w(void) { do { x--; } while (x > 0); }",
    ];

    for source in corpus {
        let first = dump_of(source);
        let second = dump_of(&first);
        assert_eq!(first, second, "dump not stable for {:?}", source);
    }
}

#[test]
fn test_cast_scenario_round_trip() {
    let expr = parse_expr_with_typedefs("(int (*)(int))p", &[]);
    let printed = dumper::dump_expr(&expr);
    let reparsed = parse_expr_with_typedefs(&printed, &[]);
    assert_eq!(dumper::dump_expr(&reparsed), printed);
}
