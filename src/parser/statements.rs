//! Statement parsing.
//!
//! Dispatch on the first token of the statement. Compound statements push a
//! scope and pick declaration vs statement per block item using the
//! typedef-aware FIRST set; labelled statements are recognised with a single
//! peek at the token after an initial identifier.

use log::debug;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::source_manager::SourceSpan;
use crate::token::TokenKind;

use super::Parser;

/// Parse a statement
pub fn parse_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let token = parser.current_token();

    // Label: identifier ':' -- one-token lookahead distinguishes this from an
    // expression statement beginning with the same identifier.
    if let TokenKind::Identifier(label) = token.kind
        && parser.peek_token(0).kind == TokenKind::Colon
    {
        return parse_labeled_statement(parser, label);
    }

    match token.kind {
        TokenKind::LeftBrace => parse_compound_statement(parser),
        TokenKind::If => parse_if_statement(parser),
        TokenKind::Switch => parse_switch_statement(parser),
        TokenKind::While => parse_while_statement(parser),
        TokenKind::Do => parse_do_while_statement(parser),
        TokenKind::For => parse_for_statement(parser),
        TokenKind::Goto => parse_goto_statement(parser),
        TokenKind::Continue => parse_continue_statement(parser),
        TokenKind::Break => parse_break_statement(parser),
        TokenKind::Return => parse_return_statement(parser),
        TokenKind::Case => parse_case_statement(parser),
        TokenKind::Default => parse_default_statement(parser),
        TokenKind::EndOfFile => Err(ParseError::UnexpectedEof { span: token.span }),
        _ => parse_expression_statement(parser),
    }
}

/// Compound statement (block). Pushes a scope for the block items and pops it
/// at the closing brace; parse failures inside the block resynchronise here
/// so one bad statement does not take the rest of the block with it.
pub fn parse_compound_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let left_brace = parser.expect(TokenKind::LeftBrace)?;
    let start_loc = left_brace.span.start();

    parser.push_scope();

    let mut block_items = Vec::new();
    while !parser.is_token(TokenKind::RightBrace) && !parser.at_eof() {
        // A label wins over a declaration even when the identifier names a
        // typedef; labels live in their own namespace.
        let is_label = matches!(parser.current_token_kind(), TokenKind::Identifier(_))
            && parser.peek_token(0).kind == TokenKind::Colon;

        if !is_label && parser.starts_declaration() {
            debug!("block item: declaration at {:?}", parser.current_token_kind());
            match super::declarations::parse_declaration(parser) {
                Ok(declaration) => block_items.push(BlockItem::Declaration(declaration)),
                Err(error) => parser.report_and_synchronize_in_block(error),
            }
        } else {
            match parse_statement(parser) {
                Ok(statement) => block_items.push(BlockItem::Statement(statement)),
                Err(error) => parser.report_and_synchronize_in_block(error),
            }
        }
    }

    parser.pop_scope();

    let right_brace = parser.expect(TokenKind::RightBrace)?;
    let span = SourceSpan::new(start_loc, right_brace.span.end());

    Ok(Statement {
        kind: StatementKind::Compound(block_items),
        span,
    })
}

fn parse_if_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::If)?.span.start();
    parser.expect(TokenKind::LeftParen)?;
    let condition = parser.parse_expr_min()?;
    parser.expect(TokenKind::RightParen)?;

    let then_branch = parse_statement(parser)?;

    let else_branch = if parser.accept(TokenKind::Else).is_some() {
        Some(parse_statement(parser)?)
    } else {
        None
    };

    let end_loc = match &else_branch {
        Some(stmt) => stmt.span.end(),
        None => then_branch.span.end(),
    };

    Ok(Statement {
        kind: StatementKind::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        },
        span: SourceSpan::new(start_loc, end_loc),
    })
}

fn parse_switch_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::Switch)?.span.start();
    parser.expect(TokenKind::LeftParen)?;
    let condition = parser.parse_expr_min()?;
    parser.expect(TokenKind::RightParen)?;

    let body = parse_statement(parser)?;
    let span = SourceSpan::new(start_loc, body.span.end());

    Ok(Statement {
        kind: StatementKind::Switch(Box::new(condition), Box::new(body)),
        span,
    })
}

fn parse_while_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::While)?.span.start();
    parser.expect(TokenKind::LeftParen)?;
    let condition = parser.parse_expr_min()?;
    parser.expect(TokenKind::RightParen)?;

    let body = parse_statement(parser)?;
    let span = SourceSpan::new(start_loc, body.span.end());

    Ok(Statement {
        kind: StatementKind::While(Box::new(condition), Box::new(body)),
        span,
    })
}

fn parse_do_while_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::Do)?.span.start();

    let body = parse_statement(parser)?;

    parser.expect(TokenKind::While)?;
    parser.expect(TokenKind::LeftParen)?;
    let condition = parser.parse_expr_min()?;
    parser.expect(TokenKind::RightParen)?;
    let semi = parser.expect(TokenKind::Semicolon)?;

    Ok(Statement {
        kind: StatementKind::DoWhile(Box::new(body), Box::new(condition)),
        span: SourceSpan::new(start_loc, semi.span.end()),
    })
}

/// for `(` (declaration | expression-statement) condition? `;` step? `)` body
fn parse_for_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::For)?.span.start();
    parser.expect(TokenKind::LeftParen)?;

    let init = if parser.accept(TokenKind::Semicolon).is_some() {
        ForInit::Expression(None)
    } else if parser.starts_declaration() {
        debug!("for init: declaration");
        // parse_declaration consumes the `;` that ends the init clause.
        ForInit::Declaration(Box::new(super::declarations::parse_declaration(parser)?))
    } else {
        let expr = parser.parse_expr_min()?;
        parser.expect(TokenKind::Semicolon)?;
        ForInit::Expression(Some(Box::new(expr)))
    };

    let condition = if parser.is_token(TokenKind::Semicolon) {
        None
    } else {
        Some(Box::new(parser.parse_expr_min()?))
    };
    parser.expect(TokenKind::Semicolon)?;

    let step = if parser.is_token(TokenKind::RightParen) {
        None
    } else {
        Some(Box::new(parser.parse_expr_min()?))
    };
    parser.expect(TokenKind::RightParen)?;

    let body = parse_statement(parser)?;
    let span = SourceSpan::new(start_loc, body.span.end());

    Ok(Statement {
        kind: StatementKind::For {
            init,
            condition,
            step,
            body: Box::new(body),
        },
        span,
    })
}

fn parse_goto_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::Goto)?.span.start();
    let (label, _) = parser.expect_name()?;
    let semi = parser.expect(TokenKind::Semicolon)?;

    Ok(Statement {
        kind: StatementKind::Goto(label),
        span: SourceSpan::new(start_loc, semi.span.end()),
    })
}

fn parse_continue_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::Continue)?.span.start();
    let semi = parser.expect(TokenKind::Semicolon)?;

    Ok(Statement {
        kind: StatementKind::Continue,
        span: SourceSpan::new(start_loc, semi.span.end()),
    })
}

fn parse_break_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::Break)?.span.start();
    let semi = parser.expect(TokenKind::Semicolon)?;

    Ok(Statement {
        kind: StatementKind::Break,
        span: SourceSpan::new(start_loc, semi.span.end()),
    })
}

fn parse_return_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::Return)?.span.start();

    let value = if parser.is_token(TokenKind::Semicolon) {
        None
    } else {
        Some(Box::new(parser.parse_expr_min()?))
    };

    let semi = parser.expect(TokenKind::Semicolon)?;

    Ok(Statement {
        kind: StatementKind::Return(value),
        span: SourceSpan::new(start_loc, semi.span.end()),
    })
}

/// case constant-expression : statement
/// The label value stays an unevaluated expression; switch/case consistency
/// is the semantic pass's problem.
fn parse_case_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::Case)?.span.start();
    let value = parser.parse_expr_conditional()?;
    parser.expect(TokenKind::Colon)?;

    let statement = parse_statement(parser)?;
    let span = SourceSpan::new(start_loc, statement.span.end());

    Ok(Statement {
        kind: StatementKind::Case(Box::new(value), Box::new(statement)),
        span,
    })
}

fn parse_default_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.expect(TokenKind::Default)?.span.start();
    parser.expect(TokenKind::Colon)?;

    let statement = parse_statement(parser)?;
    let span = SourceSpan::new(start_loc, statement.span.end());

    Ok(Statement {
        kind: StatementKind::Default(Box::new(statement)),
        span,
    })
}

/// identifier ':' statement -- labels have function scope, so the name is
/// recorded verbatim without touching the block scope stack.
fn parse_labeled_statement(parser: &mut Parser, label: crate::ast::Symbol) -> Result<Statement, ParseError> {
    let start_loc = parser.current_token_span().start();
    parser.advance(); // identifier
    parser.expect(TokenKind::Colon)?;

    let statement = parse_statement(parser)?;
    let span = SourceSpan::new(start_loc, statement.span.end());

    Ok(Statement {
        kind: StatementKind::Labeled(label, Box::new(statement)),
        span,
    })
}

fn parse_expression_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start_loc = parser.current_token_span().start();

    let expression = if parser.is_token(TokenKind::Semicolon) {
        None
    } else {
        Some(Box::new(parser.parse_expr_min()?))
    };

    let semi = parser.expect(TokenKind::Semicolon)?;

    Ok(Statement {
        kind: StatementKind::Expression(expression),
        span: SourceSpan::new(start_loc, semi.span.end()),
    })
}
