use crate::{
    ast::{
        ast::Scope,
        declarations::{Declaration, FunctionDecl, ParamDecl, VarDecl},
        expressions::{ConstantExpr, Expr},
        statements::{
            AssignmentStmt, DoWhileStmt, ExpressionStmt, ForStmt, IfElseStmt, IfStmt, ReturnStmt,
            Stmt, WhileStmt,
        },
    },
    errors::errors::Error,
    lexer::tokens::{Token, TokenKind},
    parser::{expr::parse_expr, lookups::BindingPower},
    Span,
};

use super::parser::Parser;

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let handler = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied();
    if let Some(handler) = handler {
        return handler(parser);
    }

    if parser.current_token_kind().is_type_specifier() {
        return Err(parser.unexpected("declarations must come before statements in a block"));
    }

    let stmt = parse_simple_stmt(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(stmt)
}

/// Assignment or expression statement, without the trailing `;`.
pub fn parse_simple_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if parser.current_token_kind() == TokenKind::Identifier
        && parser.peek_kind(1) == TokenKind::Assignment
    {
        let identifier = parser.advance().clone();
        parser.advance();
        let value = parse_expr(parser, BindingPower::Default)?;

        return Ok(Stmt::Assignment(AssignmentStmt {
            span: Span {
                start: identifier.span.start,
                end: value.get_span().end.clone(),
            },
            identifier: identifier.value,
            value,
        }));
    }

    let expression = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Expression(ExpressionStmt {
        span: expression.get_span().clone(),
        expression,
    }))
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Scope(parse_scope(parser)?))
}

/// `{ declarations* statements* }`
pub fn parse_scope(parser: &mut Parser) -> Result<Scope, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;

    let mut declarations = Vec::new();
    while parser.current_token_kind().is_type_specifier() {
        let type_name = parse_type_name(parser)?;
        let identifier = expect_identifier(parser, "expected identifier during variable declaration")?;
        declarations.extend(parse_var_decls(parser, type_name, identifier)?);
    }

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected("expected `}` before end of file"));
        }
        statements.push(parse_stmt(parser)?);
    }

    let end = parser.expect(TokenKind::CloseCurly)?.span.end;

    Ok(Scope {
        declarations,
        statements,
        span: Span { start, end },
    })
}

/// Loop bodies always compile as scopes; a lone statement is wrapped.
fn parse_body_scope(parser: &mut Parser) -> Result<Scope, Error> {
    if parser.current_token_kind() == TokenKind::OpenCurly {
        return parse_scope(parser);
    }

    let start = parser.get_position();
    let statement = parse_stmt(parser)?;

    Ok(Scope::from_statement(
        statement,
        Span {
            start,
            end: parser.get_end_position(),
        },
    ))
}

fn parse_condition(parser: &mut Parser) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(condition)
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_condition(parser)?;
    let then_branch = Box::new(parse_stmt(parser)?);

    if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        let else_branch = Box::new(parse_stmt(parser)?);

        return Ok(Stmt::IfElse(IfElseStmt {
            condition,
            then_branch,
            else_branch,
            span: Span {
                start,
                end: parser.get_end_position(),
            },
        }));
    }

    Ok(Stmt::If(IfStmt {
        condition,
        then_branch,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    }))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_condition(parser)?;
    let body = parse_body_scope(parser)?;

    Ok(Stmt::While(WhileStmt {
        condition,
        body,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    }))
}

pub fn parse_do_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let body = parse_body_scope(parser)?;
    parser.expect(TokenKind::While)?;
    let condition = parse_condition(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::DoWhile(DoWhileStmt {
        body,
        condition,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    }))
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::OpenParen)?;

    let init = if parser.current_token_kind() == TokenKind::Semicolon {
        None
    } else {
        Some(Box::new(parse_simple_stmt(parser)?))
    };
    parser.expect(TokenKind::Semicolon)?;

    // An omitted condition loops forever.
    let condition = if parser.current_token_kind() == TokenKind::Semicolon {
        Expr::Constant(ConstantExpr {
            value: 1,
            span: parser.current_token().span.clone(),
        })
    } else {
        parse_expr(parser, BindingPower::Default)?
    };
    parser.expect(TokenKind::Semicolon)?;

    let step = if parser.current_token_kind() == TokenKind::CloseParen {
        None
    } else {
        Some(Box::new(parse_simple_stmt(parser)?))
    };
    parser.expect(TokenKind::CloseParen)?;

    let body = parse_body_scope(parser)?;

    Ok(Stmt::For(ForStmt {
        init,
        condition,
        step,
        body,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    }))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Return(ReturnStmt {
        value,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    }))
}

/// One or more type specifiers, e.g. `unsigned int`, joined by spaces.
pub fn parse_type_name(parser: &mut Parser) -> Result<String, Error> {
    let mut words = vec![];
    while parser.current_token_kind().is_type_specifier() {
        words.push(parser.advance().value.clone());
    }

    if words.is_empty() {
        return Err(parser.unexpected("expected a type name"));
    }

    Ok(words.join(" "))
}

fn expect_identifier(parser: &mut Parser, message: &str) -> Result<Token, Error> {
    let error = parser.unexpected(message);
    parser.expect_error(TokenKind::Identifier, Some(error))
}

/// Declarator list after the type and first name: `[= expr] {, id [= expr]} ;`
fn parse_var_decls(
    parser: &mut Parser,
    type_name: String,
    first: Token,
) -> Result<Vec<VarDecl>, Error> {
    let mut declarations = vec![];
    let mut identifier = first;

    loop {
        let value = if parser.current_token_kind() == TokenKind::Assignment {
            parser.advance();
            Some(parse_expr(parser, BindingPower::Default)?)
        } else {
            None
        };

        declarations.push(VarDecl {
            type_name: type_name.clone(),
            span: Span {
                start: identifier.span.start.clone(),
                end: parser.get_end_position(),
            },
            identifier: identifier.value,
            value,
        });

        match parser.current_token_kind() {
            TokenKind::Comma => {
                parser.advance();
                identifier =
                    expect_identifier(parser, "expected identifier during variable declaration")?;
            }
            TokenKind::Semicolon => {
                parser.advance();
                return Ok(declarations);
            }
            _ => return Err(parser.unexpected("expected `,` or `;` after declaration")),
        }
    }
}

/// `()` and `(void)` both declare no parameters. Prototype parameters may be unnamed.
fn parse_parameters(parser: &mut Parser) -> Result<Vec<ParamDecl>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = vec![];
    if parser.current_token_kind() == TokenKind::Void && parser.peek_kind(1) == TokenKind::CloseParen
    {
        parser.advance();
    }

    while parser.current_token_kind() != TokenKind::CloseParen {
        let start = parser.get_position();
        let type_name = parse_type_name(parser)?;
        let identifier = if parser.current_token_kind() == TokenKind::Identifier {
            parser.advance().value.clone()
        } else {
            String::new()
        };

        parameters.push(ParamDecl {
            type_name,
            identifier,
            span: Span {
                start,
                end: parser.get_end_position(),
            },
        });

        match parser.current_token_kind() {
            TokenKind::Comma => {
                parser.advance();
            }
            TokenKind::CloseParen => {}
            _ => return Err(parser.unexpected("expected `,` or `)` in parameter list")),
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(parameters)
}

/// A top-level declaration: global variables, a prototype or a function definition.
pub fn parse_top_level_decl(parser: &mut Parser) -> Result<Vec<Declaration>, Error> {
    let start = parser.get_position();
    let type_name = parse_type_name(parser)?;
    let identifier = expect_identifier(parser, "expected identifier after type")?;

    if parser.current_token_kind() != TokenKind::OpenParen {
        let declarations = parse_var_decls(parser, type_name, identifier)?;
        return Ok(declarations.into_iter().map(Declaration::Variable).collect());
    }

    let parameters = parse_parameters(parser)?;

    let body = if parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();
        None
    } else {
        Some(parse_scope(parser)?)
    };

    Ok(vec![Declaration::Function(FunctionDecl {
        return_type: type_name,
        identifier: identifier.value,
        parameters,
        body,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })])
}
