//! Token model consumed by the parser.
//!
//! Tokens arrive from the lexer with a kind, a source span, a macro id
//! (nonzero when the token came out of a macro expansion) and the decoded
//! value for literal tokens. Line and column are not stored; they are derived
//! from the byte offset through [`crate::source_manager::SourceManager`].

use bitflags::bitflags;
use hashbrown::HashMap;
use std::sync::OnceLock;
use symbol_table::GlobalSymbol as Symbol;

use crate::source_manager::{SourceLoc, SourceSpan};

/// Decoded integer constant. The lexer picks the narrowest type that fits,
/// honoring `u`/`l`/`ll` suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntValue {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
}

impl IntValue {
    pub fn as_u64(self) -> u64 {
        match self {
            IntValue::I32(v) => v as u64,
            IntValue::I64(v) => v as u64,
            IntValue::U32(v) => v as u64,
            IntValue::U64(v) => v,
        }
    }
}

/// Decoded floating constant, stored as a bit pattern so tokens stay `Eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatValue {
    F32(u32),
    F64(u64),
}

impl FloatValue {
    pub fn from_f32(v: f32) -> Self {
        FloatValue::F32(v.to_bits())
    }

    pub fn from_f64(v: f64) -> Self {
        FloatValue::F64(v.to_bits())
    }

    pub fn as_f64(self) -> f64 {
        match self {
            FloatValue::F32(bits) => f32::from_bits(bits) as f64,
            FloatValue::F64(bits) => f64::from_bits(bits),
        }
    }
}

/// C99 token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === LITERALS ===
    IntegerConstant(IntValue),
    FloatConstant(FloatValue),
    CharacterConstant(u8),
    StringLiteral(Symbol), // Decoded content, quotes stripped, escapes applied

    // === IDENTIFIERS ===
    Identifier(Symbol),

    // === KEYWORDS ===
    // Storage class specifiers
    Auto,
    Extern,
    Register,
    Static,
    Typedef,

    // Type qualifiers
    Const,
    Restrict,
    Volatile,

    // Type specifiers
    Bool,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Signed,
    Unsigned,
    Void,

    // Aggregate type specifiers
    Struct,
    Union,
    Enum,

    // Control flow
    Break,
    Case,
    Continue,
    Default,
    Do,
    Else,
    For,
    Goto,
    If,
    Return,
    Switch,
    While,

    // Other keywords
    Inline,
    Sizeof,

    // === OPERATORS ===
    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Increment,
    Decrement,

    // Bitwise operators
    And,
    Or,
    Xor,
    Not,
    Tilde,
    LeftShift,
    RightShift,

    // Comparison operators
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,

    // Assignment operators
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    LeftShiftAssign,
    RightShiftAssign,

    // Logical operators
    LogicAnd,
    LogicOr,

    // Member access
    Arrow,
    Dot,

    // Ternary operator
    Question,
    Colon,

    // === PUNCTUATION ===
    Comma,
    Semicolon,
    Ellipsis,

    // Brackets and parentheses
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    // === SPECIAL TOKENS ===
    EndOfFile,
    Unknown,
}

impl TokenKind {
    /// Check if the token is a storage class specifier
    pub(crate) fn is_storage_class_specifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Typedef | TokenKind::Extern | TokenKind::Static | TokenKind::Auto | TokenKind::Register
        )
    }

    /// Check if the token is a type qualifier
    pub(crate) fn is_type_qualifier(&self) -> bool {
        matches!(self, TokenKind::Const | TokenKind::Restrict | TokenKind::Volatile)
    }

    /// Check if the token is a function specifier
    pub(crate) fn is_function_specifier(&self) -> bool {
        matches!(self, TokenKind::Inline)
    }

    /// Check if the token is a primitive type specifier keyword
    pub(crate) fn is_primitive_type_specifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Signed
                | TokenKind::Unsigned
                | TokenKind::Bool
        )
    }

    /// Check if the token can start a type specifier (typedef names aside)
    pub(crate) fn is_type_specifier_start(&self) -> bool {
        self.is_primitive_type_specifier() || matches!(self, TokenKind::Struct | TokenKind::Union | TokenKind::Enum)
    }

    /// Check if the token can start a specifier-qualifier list.
    /// `is_typedef` tells whether an identifier token names a typedef in scope.
    pub(crate) fn is_specifier_qualifier_start(&self, is_typedef: bool) -> bool {
        if self.is_type_specifier_start() || self.is_type_qualifier() {
            return true;
        }
        if let TokenKind::Identifier(_) = self {
            return is_typedef;
        }
        false
    }

    /// Check if the token can start a declaration-specifier list
    pub(crate) fn is_declaration_specifier_start(&self, is_typedef: bool) -> bool {
        self.is_storage_class_specifier()
            || self.is_function_specifier()
            || self.is_specifier_qualifier_start(is_typedef)
    }

    /// Check if the token can start a type name (casts, sizeof, compound literals)
    pub(crate) fn is_type_name_start(&self, is_typedef: bool) -> bool {
        self.is_specifier_qualifier_start(is_typedef)
    }

    /// Check if the token is one of the assignment operators
    pub(crate) fn is_assignment_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::DivAssign
                | TokenKind::ModAssign
                | TokenKind::AndAssign
                | TokenKind::OrAssign
                | TokenKind::XorAssign
                | TokenKind::LeftShiftAssign
                | TokenKind::RightShiftAssign
        )
    }
}

bitflags! {
    /// Per-token flags carried through from the preprocessor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        /// Whitespace (or a line break) preceded this token.
        const LEADING_SPACE = 1 << 0;
    }
}

/// Token with source span for the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
    pub flags: TokenFlags,
    /// Nonzero when the token was produced by a macro expansion.
    pub macro_id: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: SourceSpan) -> Self {
        Token {
            kind,
            span,
            flags: TokenFlags::empty(),
            macro_id: 0,
        }
    }

    /// Synthetic end-of-file token at the given location. Peeking past the
    /// end of the stream yields one of these so callers can report
    /// "unexpected end of file" with a real position.
    pub fn eof_at(loc: SourceLoc) -> Self {
        Token::new(TokenKind::EndOfFile, SourceSpan::new(loc, loc))
    }
}

/// Static keyword lookup table for O(1) keyword recognition
static KEYWORDS: OnceLock<HashMap<&'static str, TokenKind>> = OnceLock::new();

/// Initialize the keyword map
fn init_keywords() -> HashMap<&'static str, TokenKind> {
    let mut map = HashMap::new();

    map.insert("auto", TokenKind::Auto);
    map.insert("break", TokenKind::Break);
    map.insert("case", TokenKind::Case);
    map.insert("char", TokenKind::Char);
    map.insert("const", TokenKind::Const);
    map.insert("continue", TokenKind::Continue);
    map.insert("default", TokenKind::Default);
    map.insert("do", TokenKind::Do);
    map.insert("double", TokenKind::Double);
    map.insert("else", TokenKind::Else);
    map.insert("enum", TokenKind::Enum);
    map.insert("extern", TokenKind::Extern);
    map.insert("float", TokenKind::Float);
    map.insert("for", TokenKind::For);
    map.insert("goto", TokenKind::Goto);
    map.insert("if", TokenKind::If);
    map.insert("inline", TokenKind::Inline);
    map.insert("int", TokenKind::Int);
    map.insert("long", TokenKind::Long);
    map.insert("register", TokenKind::Register);
    map.insert("restrict", TokenKind::Restrict);
    map.insert("return", TokenKind::Return);
    map.insert("short", TokenKind::Short);
    map.insert("signed", TokenKind::Signed);
    map.insert("sizeof", TokenKind::Sizeof);
    map.insert("static", TokenKind::Static);
    map.insert("struct", TokenKind::Struct);
    map.insert("switch", TokenKind::Switch);
    map.insert("typedef", TokenKind::Typedef);
    map.insert("union", TokenKind::Union);
    map.insert("unsigned", TokenKind::Unsigned);
    map.insert("void", TokenKind::Void);
    map.insert("volatile", TokenKind::Volatile);
    map.insert("while", TokenKind::While);
    map.insert("_Bool", TokenKind::Bool);

    map
}

/// Check if a name is a C99 keyword
pub fn keyword_kind(name: &str) -> Option<TokenKind> {
    KEYWORDS.get_or_init(init_keywords).get(name).copied()
}
