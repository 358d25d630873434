use log::trace;

use crate::{
    ast::{
        ast::Scope,
        expressions::Expr,
        statements::{DoWhileStmt, ForStmt, IfElseStmt, IfStmt, Stmt, WhileStmt},
    },
    errors::errors::{Error, ErrorAt},
};

use super::{
    compiler::{Destination, DoWhileTarget, Session},
    context::Context,
    decl::{emit_epilogue, gen_variable},
    emitter::{Label, LabelKind},
    expr::{gen_expression, store},
    frame::DYNAMIC_SLOT_BYTES,
    registers::Register,
};

pub fn gen_statement(
    statement: &Stmt,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    match statement {
        Stmt::Sequence(statements) => gen_sequence(statements, session, ctx, destination),
        Stmt::Expression(stmt) => gen_expression(&stmt.expression, session, ctx, destination),
        Stmt::Scope(scope) => gen_scope(scope, session, ctx, destination),
        Stmt::Assignment(stmt) => {
            let address = ctx
                .find_on_stack(&stmt.identifier)
                .at(&stmt.span.start)?;
            ctx.with_scratch(|ctx, value| {
                gen_expression(&stmt.value, session, ctx, value)?;
                store(session, ctx, value, &address)
            })
        }
        Stmt::If(stmt) => gen_if(stmt, session, ctx, destination),
        Stmt::IfElse(stmt) => gen_if_else(stmt, session, ctx, destination),
        Stmt::While(stmt) => gen_while(stmt, session, ctx, destination),
        Stmt::DoWhile(stmt) => gen_do_while(stmt, session, ctx, destination),
        Stmt::For(stmt) => gen_for(stmt, session, ctx, destination),
        Stmt::Return(stmt) => {
            match &stmt.value {
                Some(value) => gen_expression(value, session, ctx, Register::V0)?,
                None => session.asm.nop(),
            }
            emit_epilogue(session, ctx);
            Ok(())
        }
    }
}

pub fn gen_sequence(
    statements: &[Stmt],
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    for statement in statements {
        gen_statement(statement, session, ctx, destination)?;
    }
    Ok(())
}

/// Declarations first, then statements. Names this block pushed as
/// dynamics are popped again, newest first, when it ends.
pub fn gen_scope(
    scope: &Scope,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    if scope.is_empty() {
        session.asm.nop();
        return Ok(());
    }

    let mut pushed = vec![];
    for declaration in &scope.declarations {
        if gen_variable(declaration, session, ctx, Destination::Register(destination))? {
            pushed.push(declaration);
        }
    }

    gen_sequence(&scope.statements, session, ctx, destination)?;

    for declaration in pushed.iter().rev() {
        ctx.delete_dynamic(&declaration.identifier)
            .at(&declaration.span.start)?;
        session.asm.emit(
            "addiu",
            format!("{0}, {0}, {1}", Register::SP.name(), DYNAMIC_SLOT_BYTES),
        );
    }

    Ok(())
}

/// Evaluates `condition` into a scratch register and branches to `target`
/// when it is zero. The scratch is free again once the branch is emitted.
fn branch_if_false(
    condition: &Expr,
    session: &mut Session,
    ctx: &mut Context,
    target: Label,
) -> Result<(), Error> {
    ctx.with_scratch(|ctx, flag| {
        gen_expression(condition, session, ctx, flag)?;
        session
            .asm
            .emit("beq", format!("{}, {}, {}", Register::ZERO, flag, target));
        session.asm.nop();
        Ok(())
    })
}

fn gen_if(
    stmt: &IfStmt,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    let end = Label::new(LabelKind::End, session.next_label());

    branch_if_false(&stmt.condition, session, ctx, end)?;
    gen_statement(&stmt.then_branch, session, ctx, destination)?;
    session.asm.label(end);

    Ok(())
}

fn gen_if_else(
    stmt: &IfElseStmt,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    let number = session.next_label();
    let otherwise = Label::new(LabelKind::Else, number);
    let end = Label::new(LabelKind::End, number);

    branch_if_false(&stmt.condition, session, ctx, otherwise)?;
    gen_statement(&stmt.then_branch, session, ctx, destination)?;
    session.asm.emit("b", end);
    session.asm.nop();
    session.asm.label(otherwise);
    gen_statement(&stmt.else_branch, session, ctx, destination)?;
    session.asm.label(end);

    Ok(())
}

fn gen_while(
    stmt: &WhileStmt,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    let number = session.next_label();
    let top = Label::new(LabelKind::Top, number);
    let end = Label::new(LabelKind::End, number);

    session.asm.label(top);
    branch_if_false(&stmt.condition, session, ctx, end)?;
    gen_scope(&stmt.body, session, ctx, destination)?;
    session.asm.emit("b", top);
    session.asm.nop();
    session.asm.label(end);

    Ok(())
}

fn gen_do_while(
    stmt: &DoWhileStmt,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    let number = session.next_label();
    let body = Label::new(LabelKind::Do, number);
    let end = Label::new(LabelKind::End, number);
    let back = match session.options.do_while_target {
        DoWhileTarget::Do => body,
        DoWhileTarget::LegacyTop => {
            trace!("do-while {} jumps back to an undefined label", number);
            Label::new(LabelKind::Top, number)
        }
    };

    session.asm.label(body);
    gen_scope(&stmt.body, session, ctx, destination)?;
    branch_if_false(&stmt.condition, session, ctx, end)?;
    session.asm.emit("b", back);
    session.asm.nop();
    session.asm.label(end);

    Ok(())
}

fn gen_for(
    stmt: &ForStmt,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    let number = session.next_label();
    let top = Label::new(LabelKind::Top, number);
    let end = Label::new(LabelKind::End, number);

    if let Some(init) = &stmt.init {
        gen_statement(init, session, ctx, destination)?;
    }
    session.asm.label(top);
    branch_if_false(&stmt.condition, session, ctx, end)?;
    gen_scope(&stmt.body, session, ctx, destination)?;
    if let Some(step) = &stmt.step {
        gen_statement(step, session, ctx, destination)?;
    }
    session.asm.emit("b", top);
    session.asm.nop();
    session.asm.label(end);

    Ok(())
}
