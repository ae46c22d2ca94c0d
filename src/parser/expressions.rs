//! Expression parsing.
//!
//! The precedence cascade is driven by a Pratt loop: parse a prefix
//! expression, then keep consuming operators whose binding power beats the
//! caller's minimum. Named binding powers make each level of the cascade a
//! constant, and associativity decides whether an equal power extends or
//! terminates the loop.

use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::source_manager::SourceSpan;
use crate::token::{Token, TokenKind};

use super::Parser;

/// Binding power for operator precedence, lowest (comma) to highest (postfix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BindingPower(u8);

impl BindingPower {
    pub const MIN: Self = Self(0);
    pub const COMMA: Self = Self(2);
    pub const ASSIGNMENT: Self = Self(4);
    pub const CONDITIONAL: Self = Self(6);
    pub const LOGICAL_OR: Self = Self(8);
    pub const LOGICAL_AND: Self = Self(10);
    pub const BITWISE_OR: Self = Self(12);
    pub const BITWISE_XOR: Self = Self(14);
    pub const BITWISE_AND: Self = Self(16);
    pub const EQUALITY: Self = Self(18);
    pub const RELATIONAL: Self = Self(20);
    pub const SHIFT: Self = Self(22);
    pub const ADDITIVE: Self = Self(24);
    pub const MULTIPLICATIVE: Self = Self(26);
    pub const CAST: Self = Self(28);
    pub const UNARY: Self = Self(30);
    pub const POSTFIX: Self = Self(32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Associativity {
    Left,
    Right,
}

fn binding_power(token_kind: TokenKind) -> Option<(BindingPower, Associativity)> {
    match token_kind {
        // Assignment operators (right-associative)
        _ if token_kind.is_assignment_operator() => Some((BindingPower::ASSIGNMENT, Associativity::Right)),

        // Comma operator (left-associative, lowest precedence)
        TokenKind::Comma => Some((BindingPower::COMMA, Associativity::Left)),

        // Conditional operator (right-associative)
        TokenKind::Question => Some((BindingPower::CONDITIONAL, Associativity::Right)),

        // Logical operators (left-associative)
        TokenKind::LogicOr => Some((BindingPower::LOGICAL_OR, Associativity::Left)),
        TokenKind::LogicAnd => Some((BindingPower::LOGICAL_AND, Associativity::Left)),

        // Bitwise operators (left-associative)
        TokenKind::Or => Some((BindingPower::BITWISE_OR, Associativity::Left)),
        TokenKind::Xor => Some((BindingPower::BITWISE_XOR, Associativity::Left)),
        TokenKind::And => Some((BindingPower::BITWISE_AND, Associativity::Left)),

        // Comparison operators (left-associative)
        TokenKind::Equal | TokenKind::NotEqual => Some((BindingPower::EQUALITY, Associativity::Left)),
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => {
            Some((BindingPower::RELATIONAL, Associativity::Left))
        }

        // Shift operators (left-associative)
        TokenKind::LeftShift | TokenKind::RightShift => Some((BindingPower::SHIFT, Associativity::Left)),

        // Additive operators (left-associative)
        TokenKind::Plus | TokenKind::Minus => Some((BindingPower::ADDITIVE, Associativity::Left)),

        // Multiplicative operators (left-associative)
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
            Some((BindingPower::MULTIPLICATIVE, Associativity::Left))
        }

        // Postfix operators
        TokenKind::Increment
        | TokenKind::Decrement
        | TokenKind::LeftParen
        | TokenKind::LeftBracket
        | TokenKind::Dot
        | TokenKind::Arrow => Some((BindingPower::POSTFIX, Associativity::Left)),

        _ => None,
    }
}

/// Main expression parsing loop.
pub(crate) fn parse_expression(parser: &mut Parser, min_bp: BindingPower) -> Result<Expr, ParseError> {
    let mut left = parse_prefix(parser)?;

    loop {
        let token = parser.current_token();
        let Some((bp, assoc)) = binding_power(token.kind) else {
            break;
        };

        let stops = match assoc {
            Associativity::Left => bp <= min_bp,
            Associativity::Right => bp < min_bp,
        };
        if stops {
            break;
        }

        parser.advance();

        left = match token.kind {
            TokenKind::Increment => postfix(ExprKind::PostIncrement, left, token),
            TokenKind::Decrement => postfix(ExprKind::PostDecrement, left, token),
            TokenKind::LeftParen => parse_function_call(parser, left)?,
            TokenKind::LeftBracket => parse_index_access(parser, left)?,
            TokenKind::Dot => parse_member_access(parser, left, false)?,
            TokenKind::Arrow => parse_member_access(parser, left, true)?,
            TokenKind::Question => {
                let true_expr = parser.parse_expr_min()?;
                parser.expect(TokenKind::Colon)?;
                let false_expr = parse_expression(parser, BindingPower::CONDITIONAL)?;
                let span = left.span.merge(false_expr.span);
                Expr {
                    kind: ExprKind::TernaryOp(Box::new(left), Box::new(true_expr), Box::new(false_expr)),
                    span,
                }
            }
            _ => {
                let next_bp = match assoc {
                    Associativity::Left => BindingPower(bp.0 + 1),
                    Associativity::Right => bp,
                };
                parse_infix(parser, left, token, next_bp)?
            }
        };
    }

    Ok(left)
}

fn postfix(make: fn(Box<Expr>) -> ExprKind, operand: Expr, token: Token) -> Expr {
    let span = operand.span.merge(token.span);
    Expr {
        kind: make(Box::new(operand)),
        span,
    }
}

fn parse_prefix(parser: &mut Parser) -> Result<Expr, ParseError> {
    let token = parser.current_token();

    match token.kind {
        TokenKind::Identifier(symbol) => {
            parser.advance();
            Ok(Expr {
                kind: ExprKind::Ident(symbol),
                span: token.span,
            })
        }
        TokenKind::IntegerConstant(value) => {
            parser.advance();
            Ok(Expr {
                kind: ExprKind::LiteralInt(value),
                span: token.span,
            })
        }
        TokenKind::FloatConstant(value) => {
            parser.advance();
            Ok(Expr {
                kind: ExprKind::LiteralFloat(value),
                span: token.span,
            })
        }
        TokenKind::CharacterConstant(value) => {
            parser.advance();
            Ok(Expr {
                kind: ExprKind::LiteralChar(value),
                span: token.span,
            })
        }
        TokenKind::StringLiteral(value) => {
            parser.advance();
            Ok(Expr {
                kind: ExprKind::LiteralString(value),
                span: token.span,
            })
        }
        TokenKind::LeftParen => {
            parser.advance();
            // The token after `(` decides: a type name begins a cast or a
            // compound literal, anything else a parenthesised expression.
            if parser.starts_type_name() {
                let type_name = super::declarations::parse_type_name(parser)?;
                parser.expect(TokenKind::RightParen)?;

                if parser.is_token(TokenKind::LeftBrace) {
                    parse_compound_literal(parser, type_name, token.span)
                } else {
                    let operand = parse_expression(parser, BindingPower::CAST)?;
                    let span = token.span.merge(operand.span);
                    Ok(Expr {
                        kind: ExprKind::Cast(Box::new(type_name), Box::new(operand)),
                        span,
                    })
                }
            } else {
                let expr = parser.parse_expr_min()?;
                parser.expect(TokenKind::RightParen)?;
                Ok(expr)
            }
        }
        TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Not
        | TokenKind::Tilde
        | TokenKind::Increment
        | TokenKind::Decrement
        | TokenKind::Star
        | TokenKind::And => parse_unary_operator(parser, token),

        TokenKind::Sizeof => parse_sizeof(parser),

        TokenKind::EndOfFile => Err(ParseError::UnexpectedEof { span: token.span }),

        _ => Err(ParseError::UnexpectedToken {
            expected: "identifier, constant, string literal, or '('".to_string(),
            found: token.kind,
            span: token.span,
        }),
    }
}

fn parse_unary_operator(parser: &mut Parser, token: Token) -> Result<Expr, ParseError> {
    let op = match token.kind {
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Not => UnaryOp::LogicNot,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Increment => UnaryOp::PreIncrement,
        TokenKind::Decrement => UnaryOp::PreDecrement,
        TokenKind::Star => UnaryOp::Deref,
        TokenKind::And => UnaryOp::AddrOf,
        _ => unreachable!("caller matched a unary operator"),
    };

    parser.advance();
    let operand = parse_expression(parser, BindingPower::UNARY)?;
    let span = token.span.merge(operand.span);
    Ok(Expr {
        kind: ExprKind::UnaryOp(op, Box::new(operand)),
        span,
    })
}

fn parse_infix(parser: &mut Parser, left: Expr, token: Token, min_bp: BindingPower) -> Result<Expr, ParseError> {
    let right = parse_expression(parser, min_bp)?;
    let span = left.span.merge(right.span);

    if let Some(op) = assign_op(token.kind) {
        return Ok(Expr {
            kind: ExprKind::Assignment(op, Box::new(left), Box::new(right)),
            span,
        });
    }

    let op = match token.kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Equal => BinaryOp::Equal,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::And => BinaryOp::BitAnd,
        TokenKind::Or => BinaryOp::BitOr,
        TokenKind::Xor => BinaryOp::BitXor,
        TokenKind::LeftShift => BinaryOp::LShift,
        TokenKind::RightShift => BinaryOp::RShift,
        TokenKind::LogicAnd => BinaryOp::LogicAnd,
        TokenKind::LogicOr => BinaryOp::LogicOr,
        TokenKind::Comma => BinaryOp::Comma,
        _ => unreachable!("binding_power admitted a non-operator"),
    };

    Ok(Expr {
        kind: ExprKind::BinaryOp(op, Box::new(left), Box::new(right)),
        span,
    })
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusAssign => AssignOp::AddAssign,
        TokenKind::MinusAssign => AssignOp::SubAssign,
        TokenKind::StarAssign => AssignOp::MulAssign,
        TokenKind::DivAssign => AssignOp::DivAssign,
        TokenKind::ModAssign => AssignOp::ModAssign,
        TokenKind::AndAssign => AssignOp::AndAssign,
        TokenKind::OrAssign => AssignOp::OrAssign,
        TokenKind::XorAssign => AssignOp::XorAssign,
        TokenKind::LeftShiftAssign => AssignOp::LShiftAssign,
        TokenKind::RightShiftAssign => AssignOp::RShiftAssign,
        _ => return None,
    };
    Some(op)
}

/// Arguments are assignment expressions; a bare comma separates them.
fn parse_function_call(parser: &mut Parser, callee: Expr) -> Result<Expr, ParseError> {
    let mut args = ThinVec::new();

    if !parser.is_token(TokenKind::RightParen) {
        loop {
            args.push(parser.parse_expr_assignment()?);
            if parser.accept(TokenKind::Comma).is_none() {
                break;
            }
        }
    }

    let right_paren = parser.expect(TokenKind::RightParen)?;
    let span = callee.span.merge(right_paren.span);
    Ok(Expr {
        kind: ExprKind::FunctionCall(Box::new(callee), args),
        span,
    })
}

fn parse_index_access(parser: &mut Parser, array: Expr) -> Result<Expr, ParseError> {
    let index = parser.parse_expr_min()?;
    let right_bracket = parser.expect(TokenKind::RightBracket)?;
    let span = array.span.merge(right_bracket.span);
    Ok(Expr {
        kind: ExprKind::IndexAccess(Box::new(array), Box::new(index)),
        span,
    })
}

fn parse_member_access(parser: &mut Parser, object: Expr, is_arrow: bool) -> Result<Expr, ParseError> {
    let (field, field_span) = parser.expect_name()?;
    let span = object.span.merge(field_span);
    Ok(Expr {
        kind: ExprKind::MemberAccess(Box::new(object), field, is_arrow),
        span,
    })
}

/// `( type-name ) { initializer-list }` -- recognised by the `{` right after
/// the closing paren of a type name.
fn parse_compound_literal(parser: &mut Parser, type_name: TypeName, start_span: SourceSpan) -> Result<Expr, ParseError> {
    let end_loc = parser.current_token_span();
    let initializer = super::declarations::parse_initializer(parser)?;
    let Initializer::List(items) = initializer else {
        return Err(ParseError::SyntaxError {
            message: "compound literal requires a braced initializer list".to_string(),
            span: end_loc,
        });
    };

    let span = start_span.merge(parser.previous_token_span());
    Ok(Expr {
        kind: ExprKind::CompoundLiteral(Box::new(type_name), items),
        span,
    })
}

/// `sizeof unary-expression` or `sizeof ( type-name )`.
fn parse_sizeof(parser: &mut Parser) -> Result<Expr, ParseError> {
    let sizeof_token = parser.expect(TokenKind::Sizeof)?;

    if parser.is_token(TokenKind::LeftParen) && parser.starts_type_name_token(parser.peek_token(0)) {
        let lparen = parser.advance();
        let type_name = super::declarations::parse_type_name(parser)?;
        let right_paren = parser.expect(TokenKind::RightParen)?;

        // `sizeof (T){...}` measures a compound literal, not the type.
        if parser.is_token(TokenKind::LeftBrace) {
            let literal = parse_compound_literal(parser, type_name, lparen.span)?;
            let span = sizeof_token.span.merge(literal.span);
            return Ok(Expr {
                kind: ExprKind::SizeOfExpr(Box::new(literal)),
                span,
            });
        }

        let span = sizeof_token.span.merge(right_paren.span);
        Ok(Expr {
            kind: ExprKind::SizeOfType(Box::new(type_name)),
            span,
        })
    } else {
        let operand = parse_expression(parser, BindingPower::UNARY)?;
        let span = sizeof_token.span.merge(operand.span);
        Ok(Expr {
            kind: ExprKind::SizeOfExpr(Box::new(operand)),
            span,
        })
    }
}
