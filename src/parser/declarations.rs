//! Declaration parsing.
//!
//! Covers the translation-unit loop, external declarations, the
//! declaration-specifier loop with the typedef-name feedback rule,
//! init-declarator lists, and initializers.
//!
//! External declarations never backtrack: specifiers are parsed first, then a
//! declarator, and the token after the declarator (`{` versus `=`/`,`/`;`)
//! decides between a function definition and a declaration.

use log::debug;
use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::source_manager::{SourceLoc, SourceSpan};
use crate::token::TokenKind;

use super::Parser;

/// Parse the top-level loop, accumulating external declarations and
/// resynchronising on errors.
pub fn parse_translation_unit(parser: &mut Parser) -> TranslationUnit {
    let mut decls = Vec::new();

    while !parser.at_eof() {
        // A stray semicolon at file scope is an empty declaration.
        if parser.accept(TokenKind::Semicolon).is_some() {
            continue;
        }

        match parse_external_declaration(parser) {
            Ok(decl) => decls.push(decl),
            Err(error) => parser.report_and_synchronize(error),
        }
    }

    TranslationUnit { decls }
}

/// external-declaration: function-definition | declaration
fn parse_external_declaration(parser: &mut Parser) -> Result<ExternalDeclaration, ParseError> {
    let start_loc = parser.current_token_span().start();

    let specifiers = parse_declaration_specifiers(parser)?;

    // Tag-only struct/union/enum declaration: `struct S { ... };`
    if let Some(semi) = parser.accept(TokenKind::Semicolon) {
        return Ok(ExternalDeclaration::Declaration(Declaration {
            specifiers,
            init_declarators: ThinVec::new(),
            span: SourceSpan::new(start_loc, semi.span.end()),
        }));
    }

    let declarator = super::declarator::parse_declarator(parser)?;

    if parser.is_token(TokenKind::LeftBrace) {
        let function = parse_function_definition_rest(parser, specifiers, declarator, start_loc)?;
        return Ok(ExternalDeclaration::Function(function));
    }

    let declaration = finish_declaration(parser, specifiers, declarator, start_loc)?;
    Ok(ExternalDeclaration::Declaration(declaration))
}

/// Function definition, entered after the declarator with `{` pending.
fn parse_function_definition_rest(
    parser: &mut Parser,
    specifiers: ThinVec<DeclarationSpecifier>,
    declarator: Declarator,
    start_loc: SourceLoc,
) -> Result<FunctionDefinition, ParseError> {
    let DirectDeclarator::Function { params, .. } = &declarator.direct else {
        return Err(ParseError::SyntaxError {
            message: "function definition requires a parameter list in its declarator".to_string(),
            span: parser.current_token_span(),
        });
    };

    debug!("function definition: {:?}", declarator.name());

    parser.push_scope();
    bind_parameter_names(parser, params.clone());
    let body = super::statements::parse_compound_statement(parser);
    parser.pop_scope();
    let body = body?;

    // The function name becomes an ordinary identifier in the enclosing scope.
    if let Some(name) = declarator.name() {
        parser.bind_ordinary(name);
    }

    let span = SourceSpan::new(start_loc, body.span.end());
    Ok(FunctionDefinition {
        specifiers,
        declarator,
        body,
        span,
    })
}

fn bind_parameter_names(parser: &mut Parser, params: FunctionParams) {
    match params {
        FunctionParams::Prototype(list) => {
            for param in &list.params {
                if let ParamDeclarator::Named(declarator) = &param.declarator
                    && let Some(name) = declarator.name()
                {
                    parser.bind_ordinary(name);
                }
            }
        }
        FunctionParams::IdentifierList(names) => {
            for name in names {
                parser.bind_ordinary(name);
            }
        }
    }
}

/// declaration: declaration-specifiers init-declarator-list? ;
///
/// Used for block items and for-init clauses; external declarations go
/// through [`parse_external_declaration`] for the function-definition branch.
pub fn parse_declaration(parser: &mut Parser) -> Result<Declaration, ParseError> {
    let start_loc = parser.current_token_span().start();

    let specifiers = parse_declaration_specifiers(parser)?;

    if let Some(semi) = parser.accept(TokenKind::Semicolon) {
        return Ok(Declaration {
            specifiers,
            init_declarators: ThinVec::new(),
            span: SourceSpan::new(start_loc, semi.span.end()),
        });
    }

    let declarator = super::declarator::parse_declarator(parser)?;
    finish_declaration(parser, specifiers, declarator, start_loc)
}

/// Finish an init-declarator list whose first declarator is already parsed,
/// consume the terminating `;`, and only then bind the declared names
/// (typedef names become visible after the semicolon, never before).
fn finish_declaration(
    parser: &mut Parser,
    specifiers: ThinVec<DeclarationSpecifier>,
    first_declarator: Declarator,
    start_loc: SourceLoc,
) -> Result<Declaration, ParseError> {
    let mut init_declarators = ThinVec::new();
    init_declarators.push(parse_init_declarator_rest(parser, first_declarator)?);

    while parser.accept(TokenKind::Comma).is_some() {
        let declarator = super::declarator::parse_declarator(parser)?;
        init_declarators.push(parse_init_declarator_rest(parser, declarator)?);
    }

    let semi = parser.expect(TokenKind::Semicolon)?;

    let is_typedef = specifiers_have_typedef(&specifiers);
    for init_declarator in &init_declarators {
        if let Some(name) = init_declarator.declarator.name() {
            if is_typedef {
                parser.bind_typedef(name);
            } else {
                parser.bind_ordinary(name);
            }
        }
    }

    Ok(Declaration {
        specifiers,
        init_declarators,
        span: SourceSpan::new(start_loc, semi.span.end()),
    })
}

fn parse_init_declarator_rest(parser: &mut Parser, declarator: Declarator) -> Result<InitDeclarator, ParseError> {
    let initializer = if parser.accept(TokenKind::Assign).is_some() {
        Some(parse_initializer(parser)?)
    } else {
        None
    };
    Ok(InitDeclarator {
        declarator,
        initializer,
    })
}

/// declaration-specifiers: a loop with a single-token switch.
///
/// An identifier is consumed as a typedef-name type specifier only while no
/// type specifier has been seen yet and the name is bound as a typedef in
/// scope; otherwise the loop ends and the identifier belongs to the
/// declarator. This is the rule that parses `T x;` and `typedef int T; T T;`
/// correctly.
pub fn parse_declaration_specifiers(parser: &mut Parser) -> Result<ThinVec<DeclarationSpecifier>, ParseError> {
    let mut specifiers = ThinVec::new();
    let mut seen_type = false;

    loop {
        let token = parser.current_token();
        match token.kind {
            TokenKind::Typedef => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::StorageClass(StorageClassSpecifier::Typedef));
            }
            TokenKind::Extern => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::StorageClass(StorageClassSpecifier::Extern));
            }
            TokenKind::Static => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::StorageClass(StorageClassSpecifier::Static));
            }
            TokenKind::Auto => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::StorageClass(StorageClassSpecifier::Auto));
            }
            TokenKind::Register => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::StorageClass(StorageClassSpecifier::Register));
            }
            TokenKind::Const => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::TypeQualifier(TypeQualifier::Const));
            }
            TokenKind::Restrict => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::TypeQualifier(TypeQualifier::Restrict));
            }
            TokenKind::Volatile => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::TypeQualifier(TypeQualifier::Volatile));
            }
            TokenKind::Inline => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::FunctionSpecifier(FunctionSpecifier::Inline));
            }
            _ if token.kind.is_primitive_type_specifier() => {
                parser.advance();
                specifiers.push(DeclarationSpecifier::TypeSpecifier(primitive_type_specifier(token.kind)));
                seen_type = true;
            }
            TokenKind::Struct | TokenKind::Union => {
                let record = super::records::parse_struct_or_union_specifier(parser)?;
                specifiers.push(DeclarationSpecifier::TypeSpecifier(TypeSpecifier::Record(Box::new(record))));
                seen_type = true;
            }
            TokenKind::Enum => {
                let spec = super::records::parse_enum_specifier(parser)?;
                specifiers.push(DeclarationSpecifier::TypeSpecifier(TypeSpecifier::Enum(Box::new(spec))));
                seen_type = true;
            }
            TokenKind::Identifier(symbol) if !seen_type && parser.is_type_name(symbol) => {
                debug!("specifier loop: {:?} taken as typedef name", symbol);
                parser.advance();
                specifiers.push(DeclarationSpecifier::TypeSpecifier(TypeSpecifier::TypedefName(symbol)));
                seen_type = true;
            }
            _ => break,
        }
    }

    if specifiers.is_empty() {
        return Err(ParseError::SyntaxError {
            message: "expected declaration specifiers".to_string(),
            span: parser.current_token_span(),
        });
    }

    Ok(specifiers)
}

/// specifier-qualifier-list: the specifier loop minus storage classes and
/// function specifiers. Used by struct members and type names.
pub fn parse_specifier_qualifier_list(parser: &mut Parser) -> Result<ThinVec<SpecifierQualifier>, ParseError> {
    let mut specifiers = ThinVec::new();
    let mut seen_type = false;

    loop {
        let token = parser.current_token();
        match token.kind {
            TokenKind::Const => {
                parser.advance();
                specifiers.push(SpecifierQualifier::TypeQualifier(TypeQualifier::Const));
            }
            TokenKind::Restrict => {
                parser.advance();
                specifiers.push(SpecifierQualifier::TypeQualifier(TypeQualifier::Restrict));
            }
            TokenKind::Volatile => {
                parser.advance();
                specifiers.push(SpecifierQualifier::TypeQualifier(TypeQualifier::Volatile));
            }
            _ if token.kind.is_primitive_type_specifier() => {
                parser.advance();
                specifiers.push(SpecifierQualifier::TypeSpecifier(primitive_type_specifier(token.kind)));
                seen_type = true;
            }
            TokenKind::Struct | TokenKind::Union => {
                let record = super::records::parse_struct_or_union_specifier(parser)?;
                specifiers.push(SpecifierQualifier::TypeSpecifier(TypeSpecifier::Record(Box::new(record))));
                seen_type = true;
            }
            TokenKind::Enum => {
                let spec = super::records::parse_enum_specifier(parser)?;
                specifiers.push(SpecifierQualifier::TypeSpecifier(TypeSpecifier::Enum(Box::new(spec))));
                seen_type = true;
            }
            TokenKind::Identifier(symbol) if !seen_type && parser.is_type_name(symbol) => {
                parser.advance();
                specifiers.push(SpecifierQualifier::TypeSpecifier(TypeSpecifier::TypedefName(symbol)));
                seen_type = true;
            }
            _ => break,
        }
    }

    if specifiers.is_empty() {
        return Err(ParseError::SyntaxError {
            message: "expected type specifier or qualifier".to_string(),
            span: parser.current_token_span(),
        });
    }

    Ok(specifiers)
}

fn primitive_type_specifier(kind: TokenKind) -> TypeSpecifier {
    match kind {
        TokenKind::Void => TypeSpecifier::Void,
        TokenKind::Char => TypeSpecifier::Char,
        TokenKind::Short => TypeSpecifier::Short,
        TokenKind::Int => TypeSpecifier::Int,
        TokenKind::Long => TypeSpecifier::Long,
        TokenKind::Float => TypeSpecifier::Float,
        TokenKind::Double => TypeSpecifier::Double,
        TokenKind::Signed => TypeSpecifier::Signed,
        TokenKind::Unsigned => TypeSpecifier::Unsigned,
        TokenKind::Bool => TypeSpecifier::Bool,
        _ => unreachable!("caller checked is_primitive_type_specifier"),
    }
}

/// type-name: specifier-qualifier-list abstract-declarator?
/// Used by casts, `sizeof`, and compound literals.
pub fn parse_type_name(parser: &mut Parser) -> Result<TypeName, ParseError> {
    let specifier_qualifiers = parse_specifier_qualifier_list(parser)?;

    let declarator = if super::declarator::starts_abstract_declarator(parser) {
        Some(super::declarator::parse_abstract_declarator(parser)?)
    } else {
        None
    };

    Ok(TypeName {
        specifier_qualifiers,
        declarator,
    })
}

/// initializer: assignment-expression | { initializer-list ,? }
pub fn parse_initializer(parser: &mut Parser) -> Result<Initializer, ParseError> {
    if parser.accept(TokenKind::LeftBrace).is_some() {
        let mut items = Vec::new();

        while !parser.is_token(TokenKind::RightBrace) {
            items.push(parse_designated_initializer(parser)?);

            if parser.accept(TokenKind::Comma).is_none() {
                break;
            }
            // Trailing comma before the closing brace is allowed.
        }

        parser.expect(TokenKind::RightBrace)?;
        Ok(Initializer::List(items))
    } else {
        let expr = parser.parse_expr_assignment()?;
        Ok(Initializer::Expression(Box::new(expr)))
    }
}

/// One initializer-list item with an optional designation prefix:
/// `( [ constant-expression ] | . identifier )+ =`
fn parse_designated_initializer(parser: &mut Parser) -> Result<DesignatedInitializer, ParseError> {
    let mut designation = ThinVec::new();

    while parser.matches(&[TokenKind::Dot, TokenKind::LeftBracket]) {
        if parser.accept(TokenKind::Dot).is_some() {
            let (field, _) = parser.expect_name()?;
            designation.push(Designator::FieldName(field));
        } else {
            parser.expect(TokenKind::LeftBracket)?;
            let index = parser.parse_expr_conditional()?;
            parser.expect(TokenKind::RightBracket)?;
            designation.push(Designator::ArrayIndex(Box::new(index)));
        }
    }

    if !designation.is_empty() {
        parser.expect(TokenKind::Assign)?;
    }

    let initializer = parse_initializer(parser)?;

    Ok(DesignatedInitializer {
        designation,
        initializer,
    })
}
