//! Pretty-printer from the AST back to C-like text.
//!
//! Compound subexpressions are always parenthesised, so re-parsing the output
//! yields a tree isomorphic to the original modulo the parentheses the
//! grammar already discards.

use crate::ast::*;
use crate::token::{FloatValue, IntValue};

/// Render a whole translation unit.
pub fn dump_translation_unit(unit: &TranslationUnit) -> String {
    let mut dumper = Dumper::new();
    for decl in &unit.decls {
        match decl {
            ExternalDeclaration::Function(function) => dumper.function_definition(function),
            ExternalDeclaration::Declaration(declaration) => {
                dumper.declaration(declaration);
                dumper.newline();
            }
        }
    }
    dumper.out
}

/// Render a single expression.
pub fn dump_expr(expr: &Expr) -> String {
    let mut dumper = Dumper::new();
    dumper.expr(expr);
    dumper.out
}

/// Render a type name as it would appear in a cast.
pub fn dump_type_name(type_name: &TypeName) -> String {
    let mut dumper = Dumper::new();
    dumper.type_name(type_name);
    dumper.out
}

struct Dumper {
    out: String,
    indent: usize,
}

impl Dumper {
    fn new() -> Self {
        Dumper {
            out: String::new(),
            indent: 0,
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    // === Declarations ===

    fn function_definition(&mut self, function: &FunctionDefinition) {
        self.declaration_specifiers(&function.specifiers);
        self.push(" ");
        self.declarator(&function.declarator);
        self.push(" ");
        self.statement(&function.body);
        self.newline();
    }

    fn declaration(&mut self, declaration: &Declaration) {
        self.declaration_specifiers(&declaration.specifiers);
        for (i, init_declarator) in declaration.init_declarators.iter().enumerate() {
            self.push(if i == 0 { " " } else { ", " });
            self.declarator(&init_declarator.declarator);
            if let Some(initializer) = &init_declarator.initializer {
                self.push(" = ");
                self.initializer(initializer);
            }
        }
        self.push(";");
    }

    fn declaration_specifiers(&mut self, specifiers: &[DeclarationSpecifier]) {
        for (i, specifier) in specifiers.iter().enumerate() {
            if i > 0 {
                self.push(" ");
            }
            match specifier {
                DeclarationSpecifier::StorageClass(storage) => self.push(storage_class_str(*storage)),
                DeclarationSpecifier::TypeQualifier(qualifier) => self.push(type_qualifier_str(*qualifier)),
                DeclarationSpecifier::FunctionSpecifier(FunctionSpecifier::Inline) => self.push("inline"),
                DeclarationSpecifier::TypeSpecifier(type_specifier) => self.type_specifier(type_specifier),
            }
        }
    }

    fn specifier_qualifiers(&mut self, specifiers: &[SpecifierQualifier]) {
        for (i, specifier) in specifiers.iter().enumerate() {
            if i > 0 {
                self.push(" ");
            }
            match specifier {
                SpecifierQualifier::TypeQualifier(qualifier) => self.push(type_qualifier_str(*qualifier)),
                SpecifierQualifier::TypeSpecifier(type_specifier) => self.type_specifier(type_specifier),
            }
        }
    }

    fn type_specifier(&mut self, type_specifier: &TypeSpecifier) {
        match type_specifier {
            TypeSpecifier::Void => self.push("void"),
            TypeSpecifier::Char => self.push("char"),
            TypeSpecifier::Short => self.push("short"),
            TypeSpecifier::Int => self.push("int"),
            TypeSpecifier::Long => self.push("long"),
            TypeSpecifier::Float => self.push("float"),
            TypeSpecifier::Double => self.push("double"),
            TypeSpecifier::Signed => self.push("signed"),
            TypeSpecifier::Unsigned => self.push("unsigned"),
            TypeSpecifier::Bool => self.push("_Bool"),
            TypeSpecifier::TypedefName(name) => self.push(name.as_str()),
            TypeSpecifier::Record(record) => self.record_specifier(record),
            TypeSpecifier::Enum(spec) => self.enum_specifier(spec),
        }
    }

    fn record_specifier(&mut self, record: &StructOrUnionSpecifier) {
        self.push(if record.is_union { "union" } else { "struct" });
        if let Some(tag) = record.tag {
            self.push(" ");
            self.push(tag.as_str());
        }
        if let Some(members) = &record.members {
            self.push(" {");
            self.indent += 1;
            for member in members {
                self.newline();
                self.struct_declaration(member);
            }
            self.indent -= 1;
            self.newline();
            self.push("}");
        }
    }

    fn struct_declaration(&mut self, member: &StructDeclaration) {
        self.specifier_qualifiers(&member.specifier_qualifiers);
        for (i, declarator) in member.declarators.iter().enumerate() {
            self.push(if i == 0 { " " } else { ", " });
            if let Some(decl) = &declarator.declarator {
                self.declarator(decl);
            }
            if let Some(width) = &declarator.bit_width {
                if declarator.declarator.is_some() {
                    self.push(" ");
                }
                self.push(": ");
                self.expr(width);
            }
        }
        self.push(";");
    }

    fn enum_specifier(&mut self, spec: &EnumSpecifier) {
        self.push("enum");
        if let Some(tag) = spec.tag {
            self.push(" ");
            self.push(tag.as_str());
        }
        if let Some(enumerators) = &spec.enumerators {
            self.push(" {");
            self.indent += 1;
            for (i, enumerator) in enumerators.iter().enumerate() {
                if i > 0 {
                    self.push(",");
                }
                self.newline();
                self.push(enumerator.name.as_str());
                if let Some(value) = &enumerator.value {
                    self.push(" = ");
                    self.expr(value);
                }
            }
            self.indent -= 1;
            self.newline();
            self.push("}");
        }
    }

    // === Declarators ===

    fn pointers(&mut self, pointers: &[Pointer]) {
        for pointer in pointers {
            self.push("*");
            self.qualifier_set(pointer.qualifiers);
        }
    }

    fn qualifier_set(&mut self, qualifiers: TypeQualifiers) {
        if qualifiers.contains(TypeQualifiers::CONST) {
            self.push("const ");
        }
        if qualifiers.contains(TypeQualifiers::RESTRICT) {
            self.push("restrict ");
        }
        if qualifiers.contains(TypeQualifiers::VOLATILE) {
            self.push("volatile ");
        }
    }

    fn declarator(&mut self, declarator: &Declarator) {
        self.pointers(&declarator.pointers);
        self.direct_declarator(&declarator.direct);
    }

    fn direct_declarator(&mut self, direct: &DirectDeclarator) {
        match direct {
            DirectDeclarator::Ident(name) => self.push(name.as_str()),
            DirectDeclarator::Paren(inner) => {
                self.push("(");
                self.declarator(inner);
                self.push(")");
            }
            DirectDeclarator::Array { inner, size } => {
                self.direct_declarator(inner);
                self.array_size(size);
            }
            DirectDeclarator::Function { inner, params } => {
                self.direct_declarator(inner);
                self.function_params(params);
            }
        }
    }

    fn array_size(&mut self, size: &ArraySize) {
        self.push("[");
        if size.is_static {
            self.push("static ");
        }
        self.qualifier_set(size.qualifiers);
        if size.is_star {
            self.push("*");
        } else if let Some(expr) = &size.size {
            self.expr(expr);
        }
        self.push("]");
    }

    fn function_params(&mut self, params: &FunctionParams) {
        match params {
            FunctionParams::Prototype(list) => self.parameter_type_list(list),
            FunctionParams::IdentifierList(names) => {
                self.push("(");
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push(name.as_str());
                }
                self.push(")");
            }
        }
    }

    fn parameter_type_list(&mut self, list: &ParameterTypeList) {
        self.push("(");
        if list.params.is_empty() && !list.has_ellipsis {
            self.push("void");
        }
        for (i, param) in list.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.declaration_specifiers(&param.specifiers);
            match &param.declarator {
                ParamDeclarator::Named(declarator) => {
                    self.push(" ");
                    self.declarator(declarator);
                }
                ParamDeclarator::Abstract(Some(declarator)) => {
                    self.push(" ");
                    self.abstract_declarator(declarator);
                }
                ParamDeclarator::Abstract(None) => {}
            }
        }
        if list.has_ellipsis {
            self.push(", ...");
        }
        self.push(")");
    }

    fn abstract_declarator(&mut self, declarator: &AbstractDeclarator) {
        self.pointers(&declarator.pointers);
        if let Some(direct) = &declarator.direct {
            self.direct_abstract_declarator(direct);
        }
    }

    fn direct_abstract_declarator(&mut self, direct: &DirectAbstractDeclarator) {
        match direct {
            DirectAbstractDeclarator::Paren(inner) => {
                self.push("(");
                self.abstract_declarator(inner);
                self.push(")");
            }
            DirectAbstractDeclarator::Array { inner, size } => {
                if let Some(inner) = inner {
                    self.direct_abstract_declarator(inner);
                }
                self.array_size(size);
            }
            DirectAbstractDeclarator::Function { inner, params } => {
                if let Some(inner) = inner {
                    self.direct_abstract_declarator(inner);
                }
                self.parameter_type_list(params);
            }
        }
    }

    fn type_name(&mut self, type_name: &TypeName) {
        self.specifier_qualifiers(&type_name.specifier_qualifiers);
        if let Some(declarator) = &type_name.declarator {
            self.push(" ");
            self.abstract_declarator(declarator);
        }
    }

    // === Statements ===

    fn statement(&mut self, statement: &Statement) {
        match &statement.kind {
            StatementKind::Labeled(label, inner) => {
                self.push(label.as_str());
                self.push(":");
                self.newline();
                self.statement(inner);
            }
            StatementKind::Case(value, inner) => {
                self.push("case ");
                self.expr(value);
                self.push(":");
                self.newline();
                self.statement(inner);
            }
            StatementKind::Default(inner) => {
                self.push("default:");
                self.newline();
                self.statement(inner);
            }
            StatementKind::Compound(items) => {
                self.push("{");
                self.indent += 1;
                for item in items {
                    self.newline();
                    match item {
                        BlockItem::Declaration(declaration) => self.declaration(declaration),
                        BlockItem::Statement(statement) => self.statement(statement),
                    }
                }
                self.indent -= 1;
                self.newline();
                self.push("}");
            }
            StatementKind::Expression(expr) => {
                if let Some(expr) = expr {
                    self.expr(expr);
                }
                self.push(";");
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.push("if (");
                self.expr(condition);
                self.push(") ");
                self.statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.push(" else ");
                    self.statement(else_branch);
                }
            }
            StatementKind::Switch(condition, body) => {
                self.push("switch (");
                self.expr(condition);
                self.push(") ");
                self.statement(body);
            }
            StatementKind::While(condition, body) => {
                self.push("while (");
                self.expr(condition);
                self.push(") ");
                self.statement(body);
            }
            StatementKind::DoWhile(body, condition) => {
                self.push("do ");
                self.statement(body);
                self.push(" while (");
                self.expr(condition);
                self.push(");");
            }
            StatementKind::For {
                init,
                condition,
                step,
                body,
            } => {
                self.push("for (");
                match init {
                    ForInit::Declaration(declaration) => self.declaration(declaration),
                    ForInit::Expression(expr) => {
                        if let Some(expr) = expr {
                            self.expr(expr);
                        }
                        self.push(";");
                    }
                }
                if let Some(condition) = condition {
                    self.push(" ");
                    self.expr(condition);
                }
                self.push(";");
                if let Some(step) = step {
                    self.push(" ");
                    self.expr(step);
                }
                self.push(") ");
                self.statement(body);
            }
            StatementKind::Goto(label) => {
                self.push("goto ");
                self.push(label.as_str());
                self.push(";");
            }
            StatementKind::Continue => self.push("continue;"),
            StatementKind::Break => self.push("break;"),
            StatementKind::Return(value) => {
                self.push("return");
                if let Some(value) = value {
                    self.push(" ");
                    self.expr(value);
                }
                self.push(";");
            }
        }
    }

    // === Expressions ===

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => self.push(name.as_str()),
            ExprKind::LiteralInt(value) => self.int_literal(*value),
            ExprKind::LiteralFloat(value) => self.float_literal(*value),
            ExprKind::LiteralChar(value) => {
                self.push("'");
                self.push_escaped(*value);
                self.push("'");
            }
            ExprKind::LiteralString(value) => {
                self.push("\"");
                for &b in value.as_str().as_bytes() {
                    self.push_escaped(b);
                }
                self.push("\"");
            }
            ExprKind::UnaryOp(op, operand) => {
                self.push("(");
                self.push(unary_op_str(*op));
                self.expr(operand);
                self.push(")");
            }
            ExprKind::BinaryOp(op, left, right) => {
                self.push("(");
                self.expr(left);
                self.push(binary_op_str(*op));
                self.expr(right);
                self.push(")");
            }
            ExprKind::Assignment(op, left, right) => {
                self.push("(");
                self.expr(left);
                self.push(assign_op_str(*op));
                self.expr(right);
                self.push(")");
            }
            ExprKind::TernaryOp(condition, then_expr, else_expr) => {
                self.push("(");
                self.expr(condition);
                self.push(" ? ");
                self.expr(then_expr);
                self.push(" : ");
                self.expr(else_expr);
                self.push(")");
            }
            ExprKind::Cast(type_name, operand) => {
                self.push("((");
                self.type_name(type_name);
                self.push(")");
                self.expr(operand);
                self.push(")");
            }
            ExprKind::SizeOfExpr(operand) => {
                self.push("(sizeof ");
                self.expr(operand);
                self.push(")");
            }
            ExprKind::SizeOfType(type_name) => {
                self.push("(sizeof(");
                self.type_name(type_name);
                self.push("))");
            }
            ExprKind::PostIncrement(operand) => {
                self.push("(");
                self.expr(operand);
                self.push("++)");
            }
            ExprKind::PostDecrement(operand) => {
                self.push("(");
                self.expr(operand);
                self.push("--)");
            }
            ExprKind::FunctionCall(callee, args) => {
                self.push("(");
                self.expr(callee);
                self.push("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(arg);
                }
                self.push("))");
            }
            ExprKind::IndexAccess(array, index) => {
                self.push("(");
                self.expr(array);
                self.push("[");
                self.expr(index);
                self.push("])");
            }
            ExprKind::MemberAccess(object, field, is_arrow) => {
                self.push("(");
                self.expr(object);
                self.push(if *is_arrow { "->" } else { "." });
                self.push(field.as_str());
                self.push(")");
            }
            ExprKind::CompoundLiteral(type_name, items) => {
                self.push("((");
                self.type_name(type_name);
                self.push(")");
                self.initializer_list(items);
                self.push(")");
            }
        }
    }

    fn int_literal(&mut self, value: IntValue) {
        match value {
            IntValue::I32(v) => self.push(&v.to_string()),
            IntValue::I64(v) => {
                self.push(&v.to_string());
                self.push("l");
            }
            IntValue::U32(v) => {
                self.push(&v.to_string());
                self.push("u");
            }
            IntValue::U64(v) => {
                self.push(&v.to_string());
                self.push("ull");
            }
        }
    }

    fn float_literal(&mut self, value: FloatValue) {
        match value {
            FloatValue::F32(bits) => {
                self.push(&format!("{:?}", f32::from_bits(bits)));
                self.push("f");
            }
            FloatValue::F64(bits) => {
                self.push(&format!("{:?}", f64::from_bits(bits)));
            }
        }
    }

    fn push_escaped(&mut self, b: u8) {
        match b {
            b'\n' => self.push("\\n"),
            b'\t' => self.push("\\t"),
            b'\r' => self.push("\\r"),
            0 => self.push("\\0"),
            b'\\' => self.push("\\\\"),
            b'\'' => self.push("\\'"),
            b'"' => self.push("\\\""),
            0x20..=0x7e => self.out.push(b as char),
            other => self.push(&format!("\\x{:02x}", other)),
        }
    }

    // === Initializers ===

    fn initializer(&mut self, initializer: &Initializer) {
        match initializer {
            Initializer::Expression(expr) => self.expr(expr),
            Initializer::List(items) => self.initializer_list(items),
        }
    }

    fn initializer_list(&mut self, items: &InitializerList) {
        self.push("{");
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            for designator in &item.designation {
                match designator {
                    Designator::ArrayIndex(index) => {
                        self.push("[");
                        self.expr(index);
                        self.push("]");
                    }
                    Designator::FieldName(field) => {
                        self.push(".");
                        self.push(field.as_str());
                    }
                }
            }
            if !item.designation.is_empty() {
                self.push(" = ");
            }
            self.initializer(&item.initializer);
        }
        self.push("}");
    }
}

fn storage_class_str(storage: StorageClassSpecifier) -> &'static str {
    match storage {
        StorageClassSpecifier::Typedef => "typedef",
        StorageClassSpecifier::Extern => "extern",
        StorageClassSpecifier::Static => "static",
        StorageClassSpecifier::Auto => "auto",
        StorageClassSpecifier::Register => "register",
    }
}

fn type_qualifier_str(qualifier: TypeQualifier) -> &'static str {
    match qualifier {
        TypeQualifier::Const => "const",
        TypeQualifier::Restrict => "restrict",
        TypeQualifier::Volatile => "volatile",
    }
}

fn unary_op_str(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
        UnaryOp::LogicNot => "!",
        UnaryOp::BitNot => "~",
        UnaryOp::PreIncrement => "++",
        UnaryOp::PreDecrement => "--",
        UnaryOp::Deref => "*",
        UnaryOp::AddrOf => "&",
    }
}

fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => " + ",
        BinaryOp::Sub => " - ",
        BinaryOp::Mul => " * ",
        BinaryOp::Div => " / ",
        BinaryOp::Mod => " % ",
        BinaryOp::Equal => " == ",
        BinaryOp::NotEqual => " != ",
        BinaryOp::Less => " < ",
        BinaryOp::Greater => " > ",
        BinaryOp::LessEqual => " <= ",
        BinaryOp::GreaterEqual => " >= ",
        BinaryOp::BitAnd => " & ",
        BinaryOp::BitOr => " | ",
        BinaryOp::BitXor => " ^ ",
        BinaryOp::LShift => " << ",
        BinaryOp::RShift => " >> ",
        BinaryOp::LogicAnd => " && ",
        BinaryOp::LogicOr => " || ",
        BinaryOp::Comma => ", ",
    }
}

fn assign_op_str(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => " = ",
        AssignOp::AddAssign => " += ",
        AssignOp::SubAssign => " -= ",
        AssignOp::MulAssign => " *= ",
        AssignOp::DivAssign => " /= ",
        AssignOp::ModAssign => " %= ",
        AssignOp::AndAssign => " &= ",
        AssignOp::OrAssign => " |= ",
        AssignOp::XorAssign => " ^= ",
        AssignOp::LShiftAssign => " <<= ",
        AssignOp::RShiftAssign => " >>= ",
    }
}
