//! Declarator and abstract-declarator parsing.
//!
//! Declarators are the most intricate part of C's declaration syntax: a
//! pointer prefix around a head (identifier or parenthesised declarator)
//! followed by a chain of array and function suffixes. Parameter declarations
//! additionally have to decide, with bounded lookahead, whether what follows
//! the specifiers is a concrete declarator (it contains an identifier) or an
//! abstract one.

use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::token::TokenKind;

use super::Parser;

/// declarator: pointer* direct-declarator
pub(crate) fn parse_declarator(parser: &mut Parser) -> Result<Declarator, ParseError> {
    let pointers = parse_pointers(parser);
    let direct = parse_direct_declarator(parser)?;
    Ok(Declarator { pointers, direct })
}

/// Zero or more `*`s, each with an optional type-qualifier list.
fn parse_pointers(parser: &mut Parser) -> ThinVec<Pointer> {
    let mut pointers = ThinVec::new();
    while parser.accept(TokenKind::Star).is_some() {
        pointers.push(Pointer {
            qualifiers: parse_type_qualifiers(parser),
        });
    }
    pointers
}

fn parse_type_qualifiers(parser: &mut Parser) -> TypeQualifiers {
    let mut qualifiers = TypeQualifiers::empty();
    loop {
        let q = match parser.current_token_kind() {
            TokenKind::Const => TypeQualifiers::CONST,
            TokenKind::Restrict => TypeQualifiers::RESTRICT,
            TokenKind::Volatile => TypeQualifiers::VOLATILE,
            _ => break,
        };
        qualifiers.insert(q);
        parser.advance();
    }
    qualifiers
}

/// direct-declarator: one head (`identifier` or `( declarator )`) followed by
/// array/function suffixes.
fn parse_direct_declarator(parser: &mut Parser) -> Result<DirectDeclarator, ParseError> {
    let head = if let Some(name) = parser.accept_name() {
        DirectDeclarator::Ident(name)
    } else if parser.accept(TokenKind::LeftParen).is_some() {
        // In concrete-declarator context a `(` head is always a parenthesised
        // declarator; a parameter list on an anonymous head only exists for
        // abstract declarators.
        let inner = parse_declarator(parser)?;
        parser.expect(TokenKind::RightParen)?;
        DirectDeclarator::Paren(Box::new(inner))
    } else {
        let token = parser.current_token();
        return Err(ParseError::UnexpectedToken {
            expected: "declarator".to_string(),
            found: token.kind,
            span: token.span,
        });
    };

    parse_declarator_suffixes(parser, head)
}

fn parse_declarator_suffixes(parser: &mut Parser, mut base: DirectDeclarator) -> Result<DirectDeclarator, ParseError> {
    loop {
        if parser.accept(TokenKind::LeftBracket).is_some() {
            let size = parse_array_size(parser)?;
            parser.expect(TokenKind::RightBracket)?;
            base = DirectDeclarator::Array {
                inner: Box::new(base),
                size,
            };
        } else if parser.accept(TokenKind::LeftParen).is_some() {
            let params = parse_function_suffix(parser)?;
            parser.expect(TokenKind::RightParen)?;
            base = DirectDeclarator::Function {
                inner: Box::new(base),
                params,
            };
        } else {
            break;
        }
    }
    Ok(base)
}

/// Everything between `[` and `]`: optional `static`, qualifiers, another
/// optional `static`, then `*` (VLA star) or an assignment expression or
/// nothing.
fn parse_array_size(parser: &mut Parser) -> Result<ArraySize, ParseError> {
    let mut is_static = parser.accept(TokenKind::Static).is_some();
    let qualifiers = parse_type_qualifiers(parser);
    if parser.accept(TokenKind::Static).is_some() {
        is_static = true;
    }

    if parser.is_token(TokenKind::Star) && parser.peek_token(0).kind == TokenKind::RightBracket {
        parser.advance();
        return Ok(ArraySize {
            size: None,
            qualifiers,
            is_static,
            is_star: true,
        });
    }

    let size = if parser.is_token(TokenKind::RightBracket) {
        None
    } else {
        Some(Box::new(parser.parse_expr_assignment()?))
    };

    Ok(ArraySize {
        size,
        qualifiers,
        is_static,
        is_star: false,
    })
}

/// Function suffix contents, entered after `(`: empty, `(void)`, a
/// parameter-type-list, or a K&R identifier list.
fn parse_function_suffix(parser: &mut Parser) -> Result<FunctionParams, ParseError> {
    if parser.is_token(TokenKind::RightParen) {
        // () -> unspecified parameters
        return Ok(FunctionParams::IdentifierList(ThinVec::new()));
    }

    if parser.is_token(TokenKind::Void) && parser.peek_token(0).kind == TokenKind::RightParen {
        // (void) -> prototype with zero parameters
        parser.advance();
        return Ok(FunctionParams::Prototype(ParameterTypeList {
            params: ThinVec::new(),
            has_ellipsis: false,
        }));
    }

    if parser.starts_declaration() {
        return Ok(FunctionParams::Prototype(parse_parameter_type_list(parser)?));
    }

    // K&R identifier list: plain identifiers that are not typedef names.
    if let TokenKind::Identifier(_) = parser.current_token_kind() {
        let mut names = ThinVec::new();
        let (name, _) = parser.expect_name()?;
        names.push(name);
        while parser.accept(TokenKind::Comma).is_some() {
            let (name, _) = parser.expect_name()?;
            names.push(name);
        }
        return Ok(FunctionParams::IdentifierList(names));
    }

    let token = parser.current_token();
    Err(ParseError::UnexpectedToken {
        expected: "parameter list or ')'".to_string(),
        found: token.kind,
        span: token.span,
    })
}

/// parameter-type-list: parameter-list (`, ...`)?
fn parse_parameter_type_list(parser: &mut Parser) -> Result<ParameterTypeList, ParseError> {
    let mut params = ThinVec::new();
    let mut has_ellipsis = false;

    params.push(parse_parameter_declaration(parser)?);
    while parser.accept(TokenKind::Comma).is_some() {
        if parser.accept(TokenKind::Ellipsis).is_some() {
            has_ellipsis = true;
            break;
        }
        params.push(parse_parameter_declaration(parser)?);
    }

    Ok(ParameterTypeList { params, has_ellipsis })
}

/// Parameter-list parsing for abstract function suffixes, where empty and
/// `(void)` are handled in place.
fn parse_prototype_params(parser: &mut Parser) -> Result<ParameterTypeList, ParseError> {
    if parser.is_token(TokenKind::RightParen) {
        return Ok(ParameterTypeList {
            params: ThinVec::new(),
            has_ellipsis: false,
        });
    }
    if parser.is_token(TokenKind::Void) && parser.peek_token(0).kind == TokenKind::RightParen {
        parser.advance();
        return Ok(ParameterTypeList {
            params: ThinVec::new(),
            has_ellipsis: false,
        });
    }
    parse_parameter_type_list(parser)
}

/// How the tokens after a parameter's declaration-specifiers should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamShape {
    Named,
    Abstract,
    Empty,
}

/// parameter-declaration: declaration-specifiers (declarator | abstract-declarator?)
fn parse_parameter_declaration(parser: &mut Parser) -> Result<ParameterDeclaration, ParseError> {
    let specifiers = super::declarations::parse_declaration_specifiers(parser)?;

    let declarator = match classify_parameter_declarator(parser) {
        ParamShape::Named => ParamDeclarator::Named(parse_declarator(parser)?),
        ParamShape::Abstract => ParamDeclarator::Abstract(Some(parse_abstract_declarator(parser)?)),
        ParamShape::Empty => ParamDeclarator::Abstract(None),
    };

    Ok(ParameterDeclaration { specifiers, declarator })
}

/// Decide declarator vs abstract declarator with a bounded forward scan:
/// skip the leading `*`s (and their qualifiers), then the next token decides;
/// for `(` chains, the first token after the parentheses decides.
fn classify_parameter_declarator(parser: &Parser) -> ParamShape {
    let mut offset = 0u32;
    let mut saw_pointer = false;

    let token_at = |n: u32| {
        if n == 0 {
            parser.current_token()
        } else {
            parser.peek_token(n - 1)
        }
    };

    loop {
        match token_at(offset).kind {
            TokenKind::Star => {
                saw_pointer = true;
                offset += 1;
            }
            TokenKind::Const | TokenKind::Restrict | TokenKind::Volatile => offset += 1,
            _ => break,
        }
    }

    match token_at(offset).kind {
        TokenKind::LeftBracket => ParamShape::Abstract,
        TokenKind::Identifier(_) => ParamShape::Named,
        TokenKind::LeftParen => {
            // Descend through the contiguous run of `(`s, `*`s, and
            // qualifiers; the first token past it decides. This classifies
            // `(*op)` as concrete and `(*)` as abstract.
            loop {
                offset += 1;
                match token_at(offset).kind {
                    TokenKind::LeftParen
                    | TokenKind::Star
                    | TokenKind::Const
                    | TokenKind::Restrict
                    | TokenKind::Volatile => continue,
                    TokenKind::Identifier(symbol) if !parser.is_type_name(symbol) => {
                        return ParamShape::Named;
                    }
                    _ => return ParamShape::Abstract,
                }
            }
        }
        _ if saw_pointer => ParamShape::Abstract,
        _ => ParamShape::Empty,
    }
}

/// Check if the current token can start an abstract declarator
pub(crate) fn starts_abstract_declarator(parser: &Parser) -> bool {
    matches!(
        parser.current_token_kind(),
        TokenKind::Star | TokenKind::LeftParen | TokenKind::LeftBracket
    )
}

/// abstract-declarator: pointer | pointer? direct-abstract-declarator
pub(crate) fn parse_abstract_declarator(parser: &mut Parser) -> Result<AbstractDeclarator, ParseError> {
    let pointers = parse_pointers(parser);

    let direct = if parser.matches(&[TokenKind::LeftParen, TokenKind::LeftBracket]) {
        Some(parse_direct_abstract_declarator(parser)?)
    } else {
        None
    };

    Ok(AbstractDeclarator { pointers, direct })
}

/// direct-abstract-declarator: like direct-declarator, but the head may be
/// missing. A `(` head is a parameter list on an empty head when the token
/// inside begins a declaration specifier (typedef names included) or closes
/// immediately; otherwise it parenthesises an abstract declarator.
fn parse_direct_abstract_declarator(parser: &mut Parser) -> Result<DirectAbstractDeclarator, ParseError> {
    let head = if parser.is_token(TokenKind::LeftParen) {
        let inside = parser.peek_token(0);
        let is_params = inside.kind == TokenKind::RightParen || parser.starts_declaration_token(inside);

        parser.advance(); // consume '('
        if is_params {
            let params = parse_prototype_params(parser)?;
            parser.expect(TokenKind::RightParen)?;
            DirectAbstractDeclarator::Function { inner: None, params }
        } else {
            let inner = parse_abstract_declarator(parser)?;
            parser.expect(TokenKind::RightParen)?;
            DirectAbstractDeclarator::Paren(Box::new(inner))
        }
    } else {
        parser.expect(TokenKind::LeftBracket)?;
        let size = parse_array_size(parser)?;
        parser.expect(TokenKind::RightBracket)?;
        DirectAbstractDeclarator::Array { inner: None, size }
    };

    parse_abstract_declarator_suffixes(parser, head)
}

fn parse_abstract_declarator_suffixes(
    parser: &mut Parser,
    mut base: DirectAbstractDeclarator,
) -> Result<DirectAbstractDeclarator, ParseError> {
    loop {
        if parser.accept(TokenKind::LeftBracket).is_some() {
            let size = parse_array_size(parser)?;
            parser.expect(TokenKind::RightBracket)?;
            base = DirectAbstractDeclarator::Array {
                inner: Some(Box::new(base)),
                size,
            };
        } else if parser.accept(TokenKind::LeftParen).is_some() {
            let params = parse_prototype_params(parser)?;
            parser.expect(TokenKind::RightParen)?;
            base = DirectAbstractDeclarator::Function {
                inner: Some(Box::new(base)),
                params,
            };
        } else {
            break;
        }
    }
    Ok(base)
}
