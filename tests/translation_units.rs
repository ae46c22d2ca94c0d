//! End-to-end tests through the public API: source text -> tokens -> tree.

use selasih::ast::{
    BlockItem, Declaration, ExternalDeclaration, StatementKind, Symbol, TranslationUnit,
};
use selasih::dumper;
use selasih::scope::Scope;
use selasih::{DiagnosticEngine, Lexer, Parser, SourceManager};

fn parse(source: &str) -> (TranslationUnit, DiagnosticEngine) {
    let mut sources = SourceManager::new();
    let id = sources.add_buffer("test.c", source);
    let tokens = Lexer::new(sources.get_buffer(id), id).tokenize_all();
    let mut diag = DiagnosticEngine::new();
    let unit = Parser::new(&tokens, &mut diag).parse_translation_unit();
    (unit, diag)
}

fn parse_ok(source: &str) -> TranslationUnit {
    let (unit, diag) = parse(source);
    assert!(
        !diag.has_errors(),
        "unexpected diagnostics for {:?}: {:?}",
        source,
        diag.diagnostics()
    );
    unit
}

#[test]
fn parses_a_small_program() {
    let unit = parse_ok(
        r#"
        typedef unsigned int u32;

        struct point {
            u32 x;
            u32 y;
        };

        static u32 manhattan(struct point a, struct point b) {
            u32 dx = a.x > b.x ? a.x - b.x : b.x - a.x;
            u32 dy = a.y > b.y ? a.y - b.y : b.y - a.y;
            return dx + dy;
        }

        int main(void) {
            struct point origin = {0, 0};
            struct point p = {.x = 3, .y = 4};
            return manhattan(origin, p) != 7;
        }
        "#,
    );

    assert_eq!(unit.decls.len(), 4);
    assert!(matches!(unit.decls[2], ExternalDeclaration::Function(_)));
    assert!(matches!(unit.decls[3], ExternalDeclaration::Function(_)));
}

#[test]
fn collects_diagnostics_and_keeps_parsing() {
    let source = "int a = ;\nint b;\nvoid f(void) { return }\nint c;\n";
    let (unit, diag) = parse(source);

    assert_eq!(diag.diagnostics().len(), 2);
    // b and c survive the two bad regions.
    let names: Vec<String> = unit
        .decls
        .iter()
        .filter_map(|decl| match decl {
            ExternalDeclaration::Declaration(Declaration { init_declarators, .. }) => init_declarators
                .first()
                .and_then(|d| d.declarator.name())
                .map(|name| name.to_string()),
            ExternalDeclaration::Function(_) => None,
        })
        .collect();
    assert!(names.contains(&"b".to_string()));
    assert!(names.contains(&"c".to_string()));
}

#[test]
fn diagnostics_carry_line_and_column() {
    let mut sources = SourceManager::new();
    let id = sources.add_buffer("test.c", "int a;\nint b\nint c;\n");
    let tokens = Lexer::new(sources.get_buffer(id), id).tokenize_all();
    let mut diag = DiagnosticEngine::new();
    Parser::new(&tokens, &mut diag).parse_translation_unit();

    assert!(diag.has_errors());
    let (line, _) = diag.diagnostics()[0].line_col(&sources);
    // The missing semicolon is discovered at the `int` on line 3.
    assert_eq!(line, 3);
}

#[test]
fn seeded_typedefs_resolve() {
    let mut sources = SourceManager::new();
    let id = sources.add_buffer("test.c", "__builtin_va_list args; size_t n;");
    let tokens = Lexer::new(sources.get_buffer(id), id).tokenize_all();
    let mut diag = DiagnosticEngine::new();
    let scope = Scope::with_seed_typedefs([Symbol::new("__builtin_va_list"), Symbol::new("size_t")]);
    let unit = Parser::with_scope(&tokens, &mut diag, scope).parse_translation_unit();

    assert!(!diag.has_errors(), "{:?}", diag.diagnostics());
    assert_eq!(unit.decls.len(), 2);
}

#[test]
fn typedef_chain_across_declarations() {
    let unit = parse_ok("typedef int word; typedef word pair[2]; pair p = {1, 2};");
    assert_eq!(unit.decls.len(), 3);
}

#[test]
fn labels_have_function_scope_syntax() {
    let unit = parse_ok("int f(int n) { loop: if (n) { n--; goto loop; } return n; }");
    let ExternalDeclaration::Function(function) = &unit.decls[0] else {
        panic!("expected function");
    };
    let StatementKind::Compound(items) = &function.body.kind else {
        panic!("expected body");
    };
    let BlockItem::Statement(first) = &items[0] else {
        panic!("expected statement");
    };
    assert!(matches!(first.kind, StatementKind::Labeled(_, _)));
}

#[test]
fn pretty_printed_output_reparses() {
    let source = r#"
        enum mode { READ, WRITE = 2, APPEND };

        typedef struct node {
            int value;
            struct node *next;
        } node;

        int sum(const node *head) {
            int total = 0;
            for (const node *it = head; it; it = it->next) {
                total += it->value;
            }
            return total;
        }
        "#;

    let first = dumper::dump_translation_unit(&parse_ok(source));
    let second = dumper::dump_translation_unit(&parse_ok(&first));
    assert_eq!(first, second);
}

#[test]
fn deeply_nested_expressions_parse() {
    let mut expr = String::from("x");
    for _ in 0..200 {
        expr = format!("({} + 1)", expr);
    }
    let source = format!("int f(int x) {{ return {}; }}", expr);
    parse_ok(&source);
}
