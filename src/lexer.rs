//! Tokenizer for already-preprocessed C source.
//!
//! The parser consumes tokens, not text; this lexer exists so the crate can
//! be driven end-to-end from plain source in tests and tools. It performs no
//! preprocessing: no macro expansion, no includes, no conditionals. Comments
//! and whitespace are skipped (setting the leading-space flag on the next
//! token), and adjacent string literals are concatenated as a final pass.

use log::debug;
use symbol_table::GlobalSymbol as Symbol;

use crate::source_manager::{SourceId, SourceLoc, SourceSpan};
use crate::token::{FloatValue, IntValue, Token, TokenFlags, TokenKind, keyword_kind};

/// Lexer state machine over a single source buffer.
pub struct Lexer<'src> {
    source: &'src [u8],
    source_id: SourceId,
    pos: usize,
    pending_space: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src [u8], source_id: SourceId) -> Self {
        Lexer {
            source,
            source_id,
            pos: 0,
            pending_space: false,
        }
    }

    /// Tokenize the whole buffer, ending with an EOF token.
    pub fn tokenize_all(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            let at_eof = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if at_eof {
                break;
            }
        }
        concatenate_string_literals(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.source.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn loc(&self, offset: usize) -> SourceLoc {
        SourceLoc::new(self.source_id, offset as u32)
    }

    fn span_from(&self, start: usize) -> SourceSpan {
        SourceSpan::new(self.loc(start), self.loc(self.pos))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.pending_space = true;
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    self.pending_space = true;
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.pending_space = true;
                    self.pos += 2;
                    while self.pos < self.source.len() {
                        if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token, or None once EOF has been emitted.
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();

        let start = self.pos;
        let had_space = std::mem::take(&mut self.pending_space);

        let Some(b) = self.peek() else {
            if self.pos > self.source.len() {
                return None;
            }
            self.pos = self.source.len() + 1;
            let mut token = Token::eof_at(self.loc(self.source.len()));
            if had_space {
                token.flags |= TokenFlags::LEADING_SPACE;
            }
            return Some(token);
        };

        let kind = match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_identifier(),
            b'0'..=b'9' => self.lex_number(),
            b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
            b'\'' => self.lex_char_constant(),
            b'"' => self.lex_string_literal(),
            _ => self.lex_punctuator(),
        };

        let mut token = Token::new(kind, self.span_from(start));
        if had_space {
            token.flags |= TokenFlags::LEADING_SPACE;
        }
        Some(token)
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        keyword_kind(text).unwrap_or_else(|| TokenKind::Identifier(Symbol::new(text)))
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut is_float = false;

        // Consume the pp-number body: digits, letters, dots, and exponent signs.
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.pos += 1,
                b'.' => {
                    is_float = true;
                    self.pos += 1;
                }
                b'+' | b'-' => {
                    let prev = self.source[self.pos - 1];
                    if matches!(prev, b'e' | b'E' | b'p' | b'P') {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }

        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        let lower = text.to_ascii_lowercase();
        if !lower.starts_with("0x") && (lower.contains('e') && !lower.contains('x')) {
            is_float = true;
        }

        if is_float {
            parse_float_literal(&lower)
                .map(TokenKind::FloatConstant)
                .unwrap_or_else(|| {
                    debug!("invalid float literal {:?}", text);
                    TokenKind::Unknown
                })
        } else {
            parse_integer_literal(&lower)
                .map(TokenKind::IntegerConstant)
                .unwrap_or_else(|| {
                    debug!("invalid integer literal {:?}", text);
                    TokenKind::Unknown
                })
        }
    }

    fn lex_char_constant(&mut self) -> TokenKind {
        self.bump(); // opening quote
        let value = match self.peek() {
            Some(b'\\') => {
                self.bump();
                let escaped = self.bump().unwrap_or(b'\'');
                decode_escape(escaped, self)
            }
            Some(b) => {
                self.bump();
                b
            }
            None => 0,
        };
        // Extra characters before the closing quote are skipped.
        while let Some(b) = self.bump() {
            if b == b'\'' {
                break;
            }
        }
        TokenKind::CharacterConstant(value)
    }

    fn lex_string_literal(&mut self) -> TokenKind {
        self.bump(); // opening quote
        let mut content = Vec::new();
        while let Some(b) = self.bump() {
            match b {
                b'"' => break,
                b'\\' => {
                    let escaped = self.bump().unwrap_or(b'"');
                    content.push(decode_escape(escaped, self));
                }
                _ => content.push(b),
            }
        }
        let text = String::from_utf8_lossy(&content).into_owned();
        TokenKind::StringLiteral(Symbol::new(&text))
    }

    fn lex_punctuator(&mut self) -> TokenKind {
        let b = self.bump().expect("caller checked");
        let next = self.peek();
        let next2 = self.peek_at(1);

        macro_rules! two {
            ($kind:expr) => {{
                self.pos += 1;
                $kind
            }};
        }

        match b {
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'?' => TokenKind::Question,
            b'~' => TokenKind::Tilde,
            b':' => TokenKind::Colon,
            b'.' => {
                if next == Some(b'.') && next2 == Some(b'.') {
                    self.pos += 2;
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            b'+' => match next {
                Some(b'+') => two!(TokenKind::Increment),
                Some(b'=') => two!(TokenKind::PlusAssign),
                _ => TokenKind::Plus,
            },
            b'-' => match next {
                Some(b'-') => two!(TokenKind::Decrement),
                Some(b'=') => two!(TokenKind::MinusAssign),
                Some(b'>') => two!(TokenKind::Arrow),
                _ => TokenKind::Minus,
            },
            b'*' => match next {
                Some(b'=') => two!(TokenKind::StarAssign),
                _ => TokenKind::Star,
            },
            b'/' => match next {
                Some(b'=') => two!(TokenKind::DivAssign),
                _ => TokenKind::Slash,
            },
            b'%' => match next {
                Some(b'=') => two!(TokenKind::ModAssign),
                _ => TokenKind::Percent,
            },
            b'=' => match next {
                Some(b'=') => two!(TokenKind::Equal),
                _ => TokenKind::Assign,
            },
            b'!' => match next {
                Some(b'=') => two!(TokenKind::NotEqual),
                _ => TokenKind::Not,
            },
            b'<' => match next {
                Some(b'<') if next2 == Some(b'=') => {
                    self.pos += 2;
                    TokenKind::LeftShiftAssign
                }
                Some(b'<') => two!(TokenKind::LeftShift),
                Some(b'=') => two!(TokenKind::LessEqual),
                _ => TokenKind::Less,
            },
            b'>' => match next {
                Some(b'>') if next2 == Some(b'=') => {
                    self.pos += 2;
                    TokenKind::RightShiftAssign
                }
                Some(b'>') => two!(TokenKind::RightShift),
                Some(b'=') => two!(TokenKind::GreaterEqual),
                _ => TokenKind::Greater,
            },
            b'&' => match next {
                Some(b'&') => two!(TokenKind::LogicAnd),
                Some(b'=') => two!(TokenKind::AndAssign),
                _ => TokenKind::And,
            },
            b'|' => match next {
                Some(b'|') => two!(TokenKind::LogicOr),
                Some(b'=') => two!(TokenKind::OrAssign),
                _ => TokenKind::Or,
            },
            b'^' => match next {
                Some(b'=') => two!(TokenKind::XorAssign),
                _ => TokenKind::Xor,
            },
            _ => TokenKind::Unknown,
        }
    }
}

fn decode_escape(escaped: u8, lexer: &mut Lexer) -> u8 {
    match escaped {
        b'n' => b'\n',
        b't' => b'\t',
        b'r' => b'\r',
        b'0' => 0,
        b'a' => 0x07,
        b'b' => 0x08,
        b'f' => 0x0c,
        b'v' => 0x0b,
        b'x' => {
            let mut value: u32 = 0;
            while let Some(b) = lexer.peek() {
                let digit = match b {
                    b'0'..=b'9' => b - b'0',
                    b'a'..=b'f' => b - b'a' + 10,
                    b'A'..=b'F' => b - b'A' + 10,
                    _ => break,
                };
                value = value.wrapping_mul(16).wrapping_add(digit as u32);
                lexer.pos += 1;
            }
            value as u8
        }
        other => other,
    }
}

/// Strip integer literal suffix (u, l, ll, ul, ull, etc.), returning the
/// digits and whether the suffix asked for unsigned / 64-bit.
fn strip_integer_suffix(text: &str) -> (&str, bool, bool) {
    let mut end = text.len();
    let mut is_unsigned = false;
    let mut is_long = false;
    loop {
        let rest = &text[..end];
        if rest.ends_with("ll") {
            is_long = true;
            end -= 2;
        } else if rest.ends_with('l') {
            is_long = true;
            end -= 1;
        } else if rest.ends_with('u') {
            is_unsigned = true;
            end -= 1;
        } else {
            break;
        }
    }
    (&text[..end], is_unsigned, is_long)
}

fn parse_integer_literal(lower: &str) -> Option<IntValue> {
    let (digits, is_unsigned, is_long) = strip_integer_suffix(lower);

    let (digits, base) = if let Some(hex) = digits.strip_prefix("0x") {
        (hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (&digits[1..], 8)
    } else {
        (digits, 10)
    };

    let value = u64::from_str_radix(digits, base).ok()?;

    let value = match (is_unsigned, is_long) {
        (true, true) => IntValue::U64(value),
        (true, false) => {
            if let Ok(v) = u32::try_from(value) {
                IntValue::U32(v)
            } else {
                IntValue::U64(value)
            }
        }
        (false, true) => IntValue::I64(value as i64),
        (false, false) => {
            if let Ok(v) = i32::try_from(value) {
                IntValue::I32(v)
            } else {
                IntValue::I64(value as i64)
            }
        }
    };
    Some(value)
}

fn parse_float_literal(lower: &str) -> Option<FloatValue> {
    if let Some(digits) = lower.strip_suffix('f') {
        let v: f32 = digits.parse().ok()?;
        Some(FloatValue::from_f32(v))
    } else {
        let digits = lower.strip_suffix('l').unwrap_or(lower);
        let v: f64 = digits.parse().ok()?;
        Some(FloatValue::from_f64(v))
    }
}

/// Concatenate adjacent string literals (C99 6.4.5) before parsing.
fn concatenate_string_literals(tokens: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let TokenKind::StringLiteral(sym) = token.kind
            && let Some(prev) = result.last_mut()
            && let TokenKind::StringLiteral(prev_sym) = prev.kind
        {
            let joined = format!("{}{}", prev_sym.as_str(), sym.as_str());
            prev.kind = TokenKind::StringLiteral(Symbol::new(&joined));
            prev.span = prev.span.merge(token.span);
            continue;
        }
        result.push(token);
    }
    result
}

#[cfg(test)]
mod tests_lexer {
    use super::*;
    use crate::source_manager::SourceManager;

    fn lex(text: &str) -> Vec<TokenKind> {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("test.c", text);
        Lexer::new(sm.get_buffer(id), id)
            .tokenize_all()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            lex("int main"),
            vec![
                TokenKind::Int,
                TokenKind::Identifier(Symbol::new("main")),
                TokenKind::EndOfFile
            ]
        );
    }

    #[test]
    fn integer_suffixes() {
        assert_eq!(lex("42")[0], TokenKind::IntegerConstant(IntValue::I32(42)));
        assert_eq!(lex("42u")[0], TokenKind::IntegerConstant(IntValue::U32(42)));
        assert_eq!(lex("42l")[0], TokenKind::IntegerConstant(IntValue::I64(42)));
        assert_eq!(lex("42ull")[0], TokenKind::IntegerConstant(IntValue::U64(42)));
        assert_eq!(lex("0x10")[0], TokenKind::IntegerConstant(IntValue::I32(16)));
        assert_eq!(lex("010")[0], TokenKind::IntegerConstant(IntValue::I32(8)));
        assert_eq!(
            lex("5000000000")[0],
            TokenKind::IntegerConstant(IntValue::I64(5000000000))
        );
    }

    #[test]
    fn float_constants() {
        assert_eq!(lex("1.5")[0], TokenKind::FloatConstant(FloatValue::from_f64(1.5)));
        assert_eq!(lex("1.5f")[0], TokenKind::FloatConstant(FloatValue::from_f32(1.5)));
        assert_eq!(lex("1e3")[0], TokenKind::FloatConstant(FloatValue::from_f64(1000.0)));
    }

    #[test]
    fn char_and_string_constants() {
        assert_eq!(lex("'a'")[0], TokenKind::CharacterConstant(b'a'));
        assert_eq!(lex("'\\n'")[0], TokenKind::CharacterConstant(b'\n'));
        assert_eq!(lex("\"hi\"")[0], TokenKind::StringLiteral(Symbol::new("hi")));
    }

    #[test]
    fn adjacent_strings_concatenate() {
        assert_eq!(lex("\"ab\" \"cd\"")[0], TokenKind::StringLiteral(Symbol::new("abcd")));
    }

    #[test]
    fn multi_char_punctuators() {
        assert_eq!(
            lex("a <<= b >>= c ... ->"),
            vec![
                TokenKind::Identifier(Symbol::new("a")),
                TokenKind::LeftShiftAssign,
                TokenKind::Identifier(Symbol::new("b")),
                TokenKind::RightShiftAssign,
                TokenKind::Identifier(Symbol::new("c")),
                TokenKind::Ellipsis,
                TokenKind::Arrow,
                TokenKind::EndOfFile
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            lex("a /* comment */ b // line\nc"),
            vec![
                TokenKind::Identifier(Symbol::new("a")),
                TokenKind::Identifier(Symbol::new("b")),
                TokenKind::Identifier(Symbol::new("c")),
                TokenKind::EndOfFile
            ]
        );
    }

    #[test]
    fn leading_space_flag() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("test.c", "a b");
        let tokens = Lexer::new(sm.get_buffer(id), id).tokenize_all();
        assert!(!tokens[0].flags.contains(TokenFlags::LEADING_SPACE));
        assert!(tokens[1].flags.contains(TokenFlags::LEADING_SPACE));
    }
}
