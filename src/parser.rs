//! Recursive-descent parser for C99.
//!
//! This module provides the main parser coordination, public API, and state
//! management. It orchestrates the parsing process by delegating to
//! specialized sub-modules for different language constructs.
//!
//! The parser is a predictive descent over the token stream: FIRST-set
//! dispatch everywhere, with lookahead bounded to a few tokens (label
//! detection, cast detection, the declarator-vs-abstract-declarator scan).
//! The typedef feedback loop lives here: a [`Scope`] stack is consulted every
//! time an identifier could be a type name.

use log::debug;
use symbol_table::GlobalSymbol as Symbol;

use crate::ast::TranslationUnit;
use crate::diagnostic::{DiagnosticEngine, ParseError};
use crate::scope::Scope;
use crate::source_manager::{SourceLoc, SourceSpan};
use crate::token::{Token, TokenKind};

pub mod declarations;
pub mod declarator;
pub mod expressions;
pub mod records;
pub mod statements;

pub use expressions::BindingPower;

/// Main parser structure
pub struct Parser<'src> {
    tokens: &'src [Token],
    current_idx: usize,
    diag: &'src mut DiagnosticEngine,
    scope: Scope,
}

impl<'src> Parser<'src> {
    /// Create a new parser over a token stream.
    pub fn new(tokens: &'src [Token], diag: &'src mut DiagnosticEngine) -> Self {
        Self::with_scope(tokens, diag, Scope::new())
    }

    /// Create a parser with a pre-seeded scope (builtin typedef names such as
    /// `__builtin_va_list`).
    pub fn with_scope(tokens: &'src [Token], diag: &'src mut DiagnosticEngine, scope: Scope) -> Self {
        Parser {
            tokens,
            current_idx: 0,
            diag,
            scope,
        }
    }

    /// Parse the whole stream as a translation unit. Errors are collected in
    /// the diagnostic engine; the returned tree may be partial when
    /// diagnostics are non-empty.
    pub fn parse_translation_unit(&mut self) -> TranslationUnit {
        let unit = declarations::parse_translation_unit(self);
        debug_assert_eq!(self.scope.depth(), 1, "scope frames must balance");
        unit
    }

    /// Location just past the last real token, for synthetic EOF.
    fn end_loc(&self) -> SourceLoc {
        self.tokens
            .last()
            .map(|t| t.span.end())
            .unwrap_or_else(SourceLoc::builtin)
    }

    fn token_at(&self, idx: usize) -> Token {
        match self.tokens.get(idx) {
            Some(token) => *token,
            // Peeking past the end yields EOF at the last known location, so
            // every caller reports "unexpected end of file" uniformly.
            None => Token::eof_at(self.end_loc()),
        }
    }

    /// Get the current token (synthetic EOF past the end)
    pub(crate) fn current_token(&self) -> Token {
        self.token_at(self.current_idx)
    }

    /// Get the current token kind
    pub(crate) fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Get the current token span
    pub(crate) fn current_token_span(&self) -> SourceSpan {
        self.current_token().span
    }

    /// Peek at the token `n` positions after the current one
    pub(crate) fn peek_token(&self, n: u32) -> Token {
        self.token_at(self.current_idx + 1 + n as usize)
    }

    /// Span of the most recently consumed token.
    pub(crate) fn previous_token_span(&self) -> SourceSpan {
        if self.current_idx > 0 {
            self.token_at(self.current_idx - 1).span
        } else {
            SourceSpan::empty()
        }
    }

    /// Advance to the next token and return the consumed token
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current_token();
        if self.current_idx < self.tokens.len() {
            self.current_idx += 1;
        }
        token
    }

    /// Accept a specific token kind: consume and return it if it matches,
    /// otherwise do nothing
    pub(crate) fn accept(&mut self, accepted: TokenKind) -> Option<Token> {
        if self.current_token_kind() == accepted {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Expect a specific token kind, consume it if found
    pub(crate) fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        let token = self.current_token();
        if token.kind == expected {
            Ok(self.advance())
        } else if token.kind == TokenKind::EndOfFile {
            Err(ParseError::UnexpectedEof { span: token.span })
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("{:?}", expected),
                found: token.kind,
                span: token.span,
            })
        }
    }

    /// Check if current token matches any of the given kinds
    pub(crate) fn matches(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current_token_kind())
    }

    /// Check if current token matches the given kind
    pub(crate) fn is_token(&self, kind: TokenKind) -> bool {
        self.current_token_kind() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.is_token(TokenKind::EndOfFile)
    }

    /// Accept an identifier, returning its symbol
    pub(crate) fn accept_name(&mut self) -> Option<Symbol> {
        if let TokenKind::Identifier(symbol) = self.current_token_kind() {
            self.advance();
            return Some(symbol);
        }
        None
    }

    /// Expect an identifier, returning the symbol and its span
    pub(crate) fn expect_name(&mut self) -> Result<(Symbol, SourceSpan), ParseError> {
        let token = self.current_token();
        if let TokenKind::Identifier(symbol) = token.kind {
            self.advance();
            Ok((symbol, token.span))
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: token.kind,
                span: token.span,
            })
        }
    }

    /// Report an error at the top level and skip to the next declaration
    /// boundary. A stray `}` is consumed so the loop always makes progress.
    pub(crate) fn report_and_synchronize(&mut self, error: ParseError) {
        debug!("synchronize after error: {}", error);
        self.diag.report_parse_error(error);
        self.synchronize(false);
    }

    /// Report an error inside a compound statement and skip to the next
    /// statement boundary, stopping *before* the `}` that closes the block so
    /// the block itself can still terminate cleanly.
    pub(crate) fn report_and_synchronize_in_block(&mut self, error: ParseError) {
        debug!("synchronize in block after error: {}", error);
        self.diag.report_parse_error(error);
        self.synchronize(true);
    }

    /// Skip to a `;` at brace/paren depth zero, or to an unmatched `}`.
    /// Progress guarantee: the only way to stop without consuming anything is
    /// the stop-before-`}` case, where the enclosing block loop terminates.
    fn synchronize(&mut self, stop_before_unmatched_rbrace: bool) {
        let mut brace_depth: i32 = 0;
        let mut paren_depth: i32 = 0;

        while !self.at_eof() {
            match self.current_token_kind() {
                TokenKind::LeftBrace => {
                    brace_depth += 1;
                    self.advance();
                }
                TokenKind::RightBrace => {
                    if brace_depth == 0 {
                        if !stop_before_unmatched_rbrace {
                            self.advance();
                        }
                        break;
                    }
                    brace_depth -= 1;
                    self.advance();
                }
                TokenKind::LeftParen => {
                    paren_depth += 1;
                    self.advance();
                }
                TokenKind::RightParen => {
                    if paren_depth > 0 {
                        paren_depth -= 1;
                    }
                    self.advance();
                }
                TokenKind::Semicolon => {
                    self.advance();
                    if brace_depth == 0 && paren_depth == 0 {
                        break;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // === Typedef feedback loop ===

    /// Whether the symbol names a typedef in the current scope stack.
    pub(crate) fn is_type_name(&self, symbol: Symbol) -> bool {
        self.scope.is_typedef(symbol)
    }

    /// Check if a token can start a declaration, honoring typedefs in scope
    pub(crate) fn starts_declaration_token(&self, token: Token) -> bool {
        let is_typedef = if let TokenKind::Identifier(symbol) = token.kind {
            self.is_type_name(symbol)
        } else {
            false
        };
        token.kind.is_declaration_specifier_start(is_typedef)
    }

    /// Check if the current token can start a declaration
    pub(crate) fn starts_declaration(&self) -> bool {
        self.starts_declaration_token(self.current_token())
    }

    /// Check if a token can start a type name, honoring typedefs in scope
    pub(crate) fn starts_type_name_token(&self, token: Token) -> bool {
        let is_typedef = if let TokenKind::Identifier(symbol) = token.kind {
            self.is_type_name(symbol)
        } else {
            false
        };
        token.kind.is_type_name_start(is_typedef)
    }

    /// Check if the current token can start a type name
    pub(crate) fn starts_type_name(&self) -> bool {
        self.starts_type_name_token(self.current_token())
    }

    pub(crate) fn push_scope(&mut self) {
        self.scope.push();
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scope.pop();
    }

    pub(crate) fn bind_typedef(&mut self, symbol: Symbol) {
        debug!("bind_typedef: {:?}", symbol);
        self.scope.declare_typedef(symbol);
    }

    pub(crate) fn bind_ordinary(&mut self, symbol: Symbol) {
        self.scope.declare_ordinary(symbol);
    }

    // === Expression entry points ===

    /// Full expression, comma operator included
    pub(crate) fn parse_expr_min(&mut self) -> Result<crate::ast::Expr, ParseError> {
        expressions::parse_expression(self, BindingPower::MIN)
    }

    /// assignment-expression (no top-level comma)
    pub(crate) fn parse_expr_assignment(&mut self) -> Result<crate::ast::Expr, ParseError> {
        expressions::parse_expression(self, BindingPower::ASSIGNMENT)
    }

    /// conditional-expression (constant-expression positions)
    pub(crate) fn parse_expr_conditional(&mut self) -> Result<crate::ast::Expr, ParseError> {
        expressions::parse_expression(self, BindingPower::CONDITIONAL)
    }
}

mod tests_parser;
