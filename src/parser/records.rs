//! struct/union and enum specifier parsing.

use log::debug;
use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::token::TokenKind;

use super::Parser;

/// struct-or-union-specifier: keyword, then a tag, a `{...}` body, or both.
pub fn parse_struct_or_union_specifier(parser: &mut Parser) -> Result<StructOrUnionSpecifier, ParseError> {
    let keyword = parser.advance();
    let is_union = keyword.kind == TokenKind::Union;
    debug_assert!(matches!(keyword.kind, TokenKind::Struct | TokenKind::Union));

    let tag = parser.accept_name();

    let members = if parser.accept(TokenKind::LeftBrace).is_some() {
        let mut members = Vec::new();
        while !parser.is_token(TokenKind::RightBrace) && !parser.at_eof() {
            members.push(parse_struct_declaration(parser)?);
        }
        parser.expect(TokenKind::RightBrace)?;
        Some(members)
    } else {
        None
    };

    if tag.is_none() && members.is_none() {
        let token = parser.current_token();
        return Err(ParseError::UnexpectedToken {
            expected: format!("identifier or '{{' after '{}'", if is_union { "union" } else { "struct" }),
            found: token.kind,
            span: token.span,
        });
    }

    debug!("parsed {} specifier, tag {:?}", if is_union { "union" } else { "struct" }, tag);

    Ok(StructOrUnionSpecifier { is_union, tag, members })
}

/// struct-declaration: specifier-qualifier-list struct-declarator-list ;
fn parse_struct_declaration(parser: &mut Parser) -> Result<StructDeclaration, ParseError> {
    let specifier_qualifiers = super::declarations::parse_specifier_qualifier_list(parser)?;

    let mut declarators = ThinVec::new();
    // `struct S { int; };` has no declarators at all; otherwise a
    // comma-separated struct-declarator list precedes the semicolon.
    if !parser.is_token(TokenKind::Semicolon) {
        loop {
            declarators.push(parse_struct_declarator(parser)?);
            if parser.accept(TokenKind::Comma).is_none() {
                break;
            }
        }
    }

    parser.expect(TokenKind::Semicolon)?;

    Ok(StructDeclaration {
        specifier_qualifiers,
        declarators,
    })
}

/// struct-declarator: declarator | declarator? : constant-expression
fn parse_struct_declarator(parser: &mut Parser) -> Result<StructDeclarator, ParseError> {
    // Anonymous bit-field: the colon comes first.
    let declarator = if parser.is_token(TokenKind::Colon) {
        None
    } else {
        Some(super::declarator::parse_declarator(parser)?)
    };

    let bit_width = if parser.accept(TokenKind::Colon).is_some() {
        Some(parser.parse_expr_conditional()?)
    } else {
        None
    };

    Ok(StructDeclarator { declarator, bit_width })
}

/// enum-specifier: keyword, then a tag, an enumerator body, or both.
pub fn parse_enum_specifier(parser: &mut Parser) -> Result<EnumSpecifier, ParseError> {
    let keyword = parser.advance();
    debug_assert_eq!(keyword.kind, TokenKind::Enum);

    let tag = parser.accept_name();

    let enumerators = if parser.accept(TokenKind::LeftBrace).is_some() {
        let mut enumerators = Vec::new();
        loop {
            enumerators.push(parse_enumerator(parser)?);

            if parser.accept(TokenKind::Comma).is_none() {
                break;
            }
            // Trailing comma before the closing brace.
            if parser.is_token(TokenKind::RightBrace) {
                break;
            }
        }
        parser.expect(TokenKind::RightBrace)?;
        Some(enumerators)
    } else {
        None
    };

    if tag.is_none() && enumerators.is_none() {
        let token = parser.current_token();
        return Err(ParseError::UnexpectedToken {
            expected: "identifier or '{' after 'enum'".to_string(),
            found: token.kind,
            span: token.span,
        });
    }

    Ok(EnumSpecifier { tag, enumerators })
}

/// enumerator: identifier (= constant-expression)?
/// The name is bound as an ordinary identifier right away, so it shadows any
/// typedef of the same name from an outer scope.
fn parse_enumerator(parser: &mut Parser) -> Result<Enumerator, ParseError> {
    let (name, _) = parser.expect_name()?;

    let value = if parser.accept(TokenKind::Assign).is_some() {
        Some(parser.parse_expr_conditional()?)
    } else {
        None
    };

    parser.bind_ordinary(name);

    Ok(Enumerator { name, value })
}
