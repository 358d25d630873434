use crate::{
    ast::expressions::{
        BinaryExpr, BinaryOperator, CallExpr, ConstantExpr, Expr, IdentifierExpr, UnaryExpr,
        UnaryOperator,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if next_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: parser.current_token().value.clone(),
                    },
                    parser.get_position(),
                ))
            }
        };

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

/// Parses an integer literal: decimal, `0x` hexadecimal or leading-zero octal.
///
/// Literals up to `0xFFFFFFFF` are accepted and reinterpreted as `i32`.
pub fn parse_number(token: &Token) -> Result<i32, Error> {
    let text = token.value.as_str();
    let parsed = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        i64::from_str_radix(&text[1..], 8)
    } else {
        text.parse::<i64>()
    };

    match parsed {
        Ok(value) if value <= u32::MAX as i64 => Ok(value as u32 as i32),
        _ => Err(Error::new(
            ErrorImpl::NumberParseError {
                token: token.value.clone(),
            },
            token.span.start.clone(),
        )),
    }
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    match parser.current_token_kind() {
        TokenKind::Number => {
            let token = parser.advance().clone();
            let value = parse_number(&token)?;
            Ok(Expr::Constant(ConstantExpr {
                value,
                span: token.span,
            }))
        }
        TokenKind::Identifier => {
            let token = parser.advance().clone();
            Ok(Expr::Identifier(IdentifierExpr {
                name: token.value,
                span: token.span,
            }))
        }
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        )),
    }
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: Expr,
    bp: BindingPower,
) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = match BinaryOperator::from_token_kind(operator_token.kind) {
        Some(operator) => operator,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator_token.value,
                },
                operator_token.span.start,
            ))
        }
    };

    let right = parse_expr(parser, bp)?;

    Ok(Expr::Binary(BinaryExpr {
        span: Span {
            start: left.get_span().start.clone(),
            end: right.get_span().end.clone(),
        },
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }))
}

/// `-5` folds into a negative constant, any other operand becomes `0 - operand`.
pub fn parse_negation_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();

    if parser.current_token_kind() == TokenKind::Number {
        let token = parser.advance().clone();
        let value = parse_number(&token)?;
        return Ok(Expr::Constant(ConstantExpr {
            value: value.wrapping_neg(),
            span: Span {
                start: operator_token.span.start,
                end: token.span.end,
            },
        }));
    }

    let operand = parse_expr(parser, BindingPower::Unary)?;
    let span = Span {
        start: operator_token.span.start.clone(),
        end: operand.get_span().end.clone(),
    };

    Ok(Expr::Binary(BinaryExpr {
        left: Box::new(Expr::Constant(ConstantExpr {
            value: 0,
            span: operator_token.span,
        })),
        operator: BinaryOperator::Subtract,
        right: Box::new(operand),
        span,
    }))
}

fn unary_operator(kind: TokenKind) -> Option<UnaryOperator> {
    match kind {
        TokenKind::PlusPlus => Some(UnaryOperator::Increment),
        TokenKind::MinusMinus => Some(UnaryOperator::Decrement),
        TokenKind::Not => Some(UnaryOperator::Not),
        _ => None,
    }
}

/// `++x`, `--x` and `!x`. The operand must be a plain variable.
pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = match unary_operator(operator_token.kind) {
        Some(operator) => operator,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator_token.value,
                },
                operator_token.span.start,
            ))
        }
    };

    let error = parser.unexpected("expected a variable after a unary operator");
    let identifier = parser.expect_error(TokenKind::Identifier, Some(error))?;

    Ok(Expr::Unary(UnaryExpr {
        identifier: identifier.value,
        operator,
        span: Span {
            start: operator_token.span.start,
            end: identifier.span.end,
        },
    }))
}

/// `x++` and `x--` compile exactly like their prefix forms.
pub fn parse_postfix_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = unary_operator(operator_token.kind);

    match (left, operator) {
        (Expr::Identifier(identifier), Some(operator)) => Ok(Expr::Unary(UnaryExpr {
            identifier: identifier.name,
            operator,
            span: Span {
                start: identifier.span.start,
                end: operator_token.span.end,
            },
        })),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: operator_token.value,
                message: String::from("increment and decrement apply to variables only"),
            },
            operator_token.span.start,
        )),
    }
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_call_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    let function = match left {
        Expr::Identifier(identifier) => identifier,
        other => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("only named functions can be called"),
                },
                other.get_span().start.clone(),
            ))
        }
    };
    parser.advance();

    let mut arguments = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        arguments.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in argument list"));
        }
    }

    let close = parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::Call(CallExpr {
        span: Span {
            start: function.span.start,
            end: close.span.end,
        },
        function: function.name,
        arguments,
    }))
}
