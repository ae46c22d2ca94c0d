//! Abstract syntax tree for a single C translation unit.
//!
//! Pure data: tagged variants with owned, boxed children. Every node is owned
//! by exactly one parent, so dropping the [`TranslationUnit`] drops the whole
//! tree. The grammar's cycles (a direct declarator may contain a declarator)
//! become boxes, never references. Constant expressions (array sizes, case
//! labels, enumerator values, bit-field widths) stay unevaluated subtrees;
//! evaluation belongs to semantic analysis.

use bitflags::bitflags;
use thin_vec::ThinVec;

use crate::source_manager::SourceSpan;
use crate::token::{FloatValue, IntValue};

/// Represents an interned string using symbol_table crate.
/// Alias for GlobalSymbol from symbol_table crate with global feature.
pub type Symbol = symbol_table::GlobalSymbol;

bitflags! {
    /// Qualifier set attached to pointers and array suffixes. The ordered
    /// specifier lists keep individual [`TypeQualifier`] entries instead.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeQualifiers: u8 {
        const CONST = 1 << 0;
        const RESTRICT = 1 << 1;
        const VOLATILE = 1 << 2;
    }
}

/// Root production: all external declarations of one preprocessed file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub decls: Vec<ExternalDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExternalDeclaration {
    Function(FunctionDefinition),
    Declaration(Declaration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub specifiers: ThinVec<DeclarationSpecifier>,
    pub declarator: Declarator,
    /// Always a compound statement.
    pub body: Statement,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub specifiers: ThinVec<DeclarationSpecifier>,
    pub init_declarators: ThinVec<InitDeclarator>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitDeclarator {
    pub declarator: Declarator,
    pub initializer: Option<Initializer>,
}

/// One entry of a declaration-specifier list. Kept as an interleaved list in
/// source order; ordering is semantically irrelevant but preserved for
/// diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationSpecifier {
    StorageClass(StorageClassSpecifier),
    TypeQualifier(TypeQualifier),
    FunctionSpecifier(FunctionSpecifier),
    TypeSpecifier(TypeSpecifier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClassSpecifier {
    Typedef,
    Extern,
    Static,
    Auto,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeQualifier {
    Const,
    Restrict,
    Volatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionSpecifier {
    Inline,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpecifier {
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Signed,
    Unsigned,
    Bool,
    TypedefName(Symbol),
    Record(Box<StructOrUnionSpecifier>),
    Enum(Box<EnumSpecifier>),
}

/// `struct`/`union` specifier. At least one of `tag` and `members` is
/// present; `members: Some(vec![])` is an empty definition, `None` a
/// reference or forward declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct StructOrUnionSpecifier {
    pub is_union: bool,
    pub tag: Option<Symbol>,
    pub members: Option<Vec<StructDeclaration>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDeclaration {
    pub specifier_qualifiers: ThinVec<SpecifierQualifier>,
    pub declarators: ThinVec<StructDeclarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpecifierQualifier {
    TypeSpecifier(TypeSpecifier),
    TypeQualifier(TypeQualifier),
}

/// A struct member: plain declarator, bit-field, or anonymous bit-field.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDeclarator {
    pub declarator: Option<Declarator>,
    pub bit_width: Option<Expr>,
}

/// `enum` specifier; `enumerators: None` when only the tag is referenced.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSpecifier {
    pub tag: Option<Symbol>,
    pub enumerators: Option<Vec<Enumerator>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumerator {
    pub name: Symbol,
    pub value: Option<Expr>,
}

/// declarator: pointer* direct-declarator
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub pointers: ThinVec<Pointer>,
    pub direct: DirectDeclarator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    pub qualifiers: TypeQualifiers,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectDeclarator {
    Ident(Symbol),
    Paren(Box<Declarator>),
    Array {
        inner: Box<DirectDeclarator>,
        size: ArraySize,
    },
    Function {
        inner: Box<DirectDeclarator>,
        params: FunctionParams,
    },
}

impl DirectDeclarator {
    /// The declared identifier, if the declarator names one.
    pub fn name(&self) -> Option<Symbol> {
        match self {
            DirectDeclarator::Ident(name) => Some(*name),
            DirectDeclarator::Paren(inner) => inner.name(),
            DirectDeclarator::Array { inner, .. } => inner.name(),
            DirectDeclarator::Function { inner, .. } => inner.name(),
        }
    }
}

impl Declarator {
    pub fn name(&self) -> Option<Symbol> {
        self.direct.name()
    }
}

/// Everything between `[` and `]` of an array suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySize {
    pub size: Option<Box<Expr>>,
    pub qualifiers: TypeQualifiers,
    pub is_static: bool,
    /// VLA of unspecified size: `[*]`
    pub is_star: bool,
}

impl ArraySize {
    pub fn empty() -> Self {
        ArraySize {
            size: None,
            qualifiers: TypeQualifiers::empty(),
            is_static: false,
            is_star: false,
        }
    }
}

/// Function suffix payload: a prototype or a K&R identifier list. A bare
/// `()` is an empty identifier list (unspecified parameters); `(void)` is a
/// prototype with zero parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionParams {
    Prototype(ParameterTypeList),
    IdentifierList(ThinVec<Symbol>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTypeList {
    pub params: ThinVec<ParameterDeclaration>,
    pub has_ellipsis: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDeclaration {
    pub specifiers: ThinVec<DeclarationSpecifier>,
    pub declarator: ParamDeclarator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamDeclarator {
    Named(Declarator),
    Abstract(Option<AbstractDeclarator>),
}

/// Mirrors [`Declarator`] without requiring a name.
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractDeclarator {
    pub pointers: ThinVec<Pointer>,
    pub direct: Option<DirectAbstractDeclarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectAbstractDeclarator {
    Paren(Box<AbstractDeclarator>),
    Array {
        inner: Option<Box<DirectAbstractDeclarator>>,
        size: ArraySize,
    },
    Function {
        inner: Option<Box<DirectAbstractDeclarator>>,
        params: ParameterTypeList,
    },
}

/// type-name: specifier-qualifier-list abstract-declarator?
/// Used by casts, `sizeof`, and compound literals.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub specifier_qualifiers: ThinVec<SpecifierQualifier>,
    pub declarator: Option<AbstractDeclarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// Labels have function scope; the name is kept verbatim for the
    /// semantic pass.
    Labeled(Symbol, Box<Statement>),
    Case(Box<Expr>, Box<Statement>),
    Default(Box<Statement>),
    Compound(Vec<BlockItem>),
    Expression(Option<Box<Expr>>),
    If {
        condition: Box<Expr>,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    Switch(Box<Expr>, Box<Statement>),
    While(Box<Expr>, Box<Statement>),
    DoWhile(Box<Statement>, Box<Expr>),
    For {
        init: ForInit,
        condition: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        body: Box<Statement>,
    },
    Goto(Symbol),
    Continue,
    Break,
    Return(Option<Box<Expr>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    Declaration(Declaration),
    Statement(Statement),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Declaration(Box<Declaration>),
    Expression(Option<Box<Expr>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(Symbol),
    LiteralInt(IntValue),
    LiteralFloat(FloatValue),
    LiteralChar(u8),
    LiteralString(Symbol),
    UnaryOp(UnaryOp, Box<Expr>),
    BinaryOp(BinaryOp, Box<Expr>, Box<Expr>),
    Assignment(AssignOp, Box<Expr>, Box<Expr>),
    TernaryOp(Box<Expr>, Box<Expr>, Box<Expr>),
    Cast(Box<TypeName>, Box<Expr>),
    SizeOfExpr(Box<Expr>),
    SizeOfType(Box<TypeName>),
    PostIncrement(Box<Expr>),
    PostDecrement(Box<Expr>),
    FunctionCall(Box<Expr>, ThinVec<Expr>),
    IndexAccess(Box<Expr>, Box<Expr>),
    /// `object.field` or `object->field` (`is_arrow`)
    MemberAccess(Box<Expr>, Symbol, bool),
    CompoundLiteral(Box<TypeName>, InitializerList),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    LogicAnd,
    LogicOr,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    LShiftAssign,
    RShiftAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    LogicNot,
    BitNot,
    PreIncrement,
    PreDecrement,
    Deref,
    AddrOf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Expression(Box<Expr>),
    List(InitializerList),
}

pub type InitializerList = Vec<DesignatedInitializer>;

#[derive(Debug, Clone, PartialEq)]
pub struct DesignatedInitializer {
    pub designation: ThinVec<Designator>,
    pub initializer: Initializer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Designator {
    ArrayIndex(Box<Expr>),
    FieldName(Symbol),
}

/// Whether a specifier list contains the `typedef` storage class.
pub fn specifiers_have_typedef(specifiers: &[DeclarationSpecifier]) -> bool {
    specifiers.iter().any(|s| {
        matches!(
            s,
            DeclarationSpecifier::StorageClass(StorageClassSpecifier::Typedef)
        )
    })
}
