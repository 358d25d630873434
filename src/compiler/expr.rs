use log::trace;

use crate::{
    ast::expressions::{BinaryExpr, BinaryOperator, CallExpr, Expr, UnaryExpr, UnaryOperator},
    errors::errors::{Error, ErrorAt, ErrorImpl},
};

use super::{
    compiler::{LoadDelay, RelationalMode, Session},
    context::{Address, Context},
    emitter::{Label, LabelKind},
    registers::{Register, ARGUMENT_REGISTERS},
};

/// Generates code leaving the value of `expression` in `destination`.
pub fn gen_expression(
    expression: &Expr,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    match expression {
        Expr::Binary(binary) => gen_binary(binary, session, ctx, destination),
        Expr::Unary(unary) => gen_unary(unary, session, ctx, destination),
        Expr::Identifier(identifier) => {
            let address = ctx
                .find_on_stack(&identifier.name)
                .at(&identifier.span.start)?;
            load(session, &address, destination);
            Ok(())
        }
        Expr::Call(call) => gen_call(call, session, ctx, destination),
        Expr::Constant(constant) => {
            session
                .asm
                .emit("li", format!("{}, {}", destination, constant.value));
            Ok(())
        }
    }
}

/// Fills the load delay slot when the target does not interlock.
fn fill_load_delay(session: &mut Session) {
    if session.options.load_delay == LoadDelay::Filled {
        session.asm.nop();
    }
}

/// Loads the word at `address` into `destination`.
///
/// Globals go through their GOT entry, using `destination` to hold the
/// symbol address first.
pub fn load(session: &mut Session, address: &Address, destination: Register) {
    session
        .asm
        .emit("lw", format!("{}, {}", destination, address));
    fill_load_delay(session);
    if let Address::Global(_) = address {
        session.asm.emit("lw", format!("{}, 0({})", destination, destination));
        fill_load_delay(session);
    }
}

/// Stores `source` to `address`, borrowing a scratch register for a global's address.
pub fn store(
    session: &mut Session,
    ctx: &mut Context,
    source: Register,
    address: &Address,
) -> Result<(), Error> {
    match address {
        Address::Global(_) => ctx.with_scratch(|_, pointer| {
            session.asm.emit("lw", format!("{}, {}", pointer, address));
            fill_load_delay(session);
            session.asm.emit("sw", format!("{}, 0({})", source, pointer));
            Ok(())
        }),
        _ => {
            session.asm.emit("sw", format!("{}, {}", source, address));
            Ok(())
        }
    }
}

fn gen_binary(
    binary: &BinaryExpr,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    let operator = binary.operator;

    if matches!(
        operator,
        BinaryOperator::GreaterEqual | BinaryOperator::LessEqual
    ) && session.options.relational == RelationalMode::Strict
    {
        return Err(ErrorImpl::UnsupportedOperator {
            operator: operator.to_string(),
        })
        .at(&binary.span.start);
    }

    let number = match operator {
        BinaryOperator::Equal | BinaryOperator::NotEqual => Some(session.next_label()),
        _ => None,
    };

    gen_expression(&binary.left, session, ctx, destination)?;

    ctx.with_scratch(|ctx, right| {
        gen_expression(&binary.right, session, ctx, right)?;

        let d = destination;
        let asm = &mut session.asm;
        match operator {
            BinaryOperator::Add => asm.emit("addu", format!("{}, {}, {}", d, d, right)),
            BinaryOperator::Subtract => asm.emit("sub", format!("{}, {}, {}", d, d, right)),
            BinaryOperator::Multiply => {
                asm.emit("mult", format!("{}, {}", d, right));
                asm.emit("mflo", d);
            }
            BinaryOperator::Divide => {
                asm.emit("div", format!("{}, {}", d, right));
                asm.emit("mflo", d);
            }
            // operands of && and || are already 0 or 1
            BinaryOperator::BitAnd | BinaryOperator::LogicalAnd => {
                asm.emit("and", format!("{}, {}, {}", d, d, right))
            }
            BinaryOperator::BitOr | BinaryOperator::LogicalOr => {
                asm.emit("or", format!("{}, {}, {}", d, d, right))
            }
            BinaryOperator::ShiftRight => asm.emit("srlv", format!("{}, {}, {}", d, d, right)),
            BinaryOperator::ShiftLeft => asm.emit("sllv", format!("{}, {}, {}", d, d, right)),
            BinaryOperator::Equal | BinaryOperator::NotEqual => {
                let number = number.unwrap_or_default();
                let not = Label::new(LabelKind::Not, number);
                let end = Label::new(LabelKind::End, number);
                let branch = if operator == BinaryOperator::Equal {
                    "bne"
                } else {
                    "beq"
                };

                asm.emit(branch, format!("{}, {}, {}", d, right, not));
                asm.nop();
                asm.emit("li", format!("{}, 1", d));
                asm.emit("b", end);
                asm.nop();
                asm.label(not);
                asm.emit("move", format!("{}, {}", d, Register::ZERO));
                asm.label(end);
            }
            BinaryOperator::Greater => asm.emit("slt", format!("{}, {}, {}", d, right, d)),
            BinaryOperator::Less => asm.emit("slt", format!("{}, {}, {}", d, d, right)),
            BinaryOperator::GreaterEqual | BinaryOperator::LessEqual => {
                trace!("no lowering for {}, emitting nop", operator);
                asm.nop();
            }
        }

        Ok(())
    })
}

/// `++`, `--` and `!` on a named variable: load, modify, store back, and
/// leave the updated value in `destination`.
fn gen_unary(
    unary: &UnaryExpr,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    let address = ctx
        .find_on_stack(&unary.identifier)
        .at(&unary.span.start)?;

    ctx.with_scratch(|ctx, value| {
        load(session, &address, value);

        match unary.operator {
            UnaryOperator::Increment => {
                session.asm.emit("addiu", format!("{}, {}, 1", value, value))
            }
            UnaryOperator::Decrement => {
                session.asm.emit("addiu", format!("{}, {}, -1", value, value))
            }
            UnaryOperator::Not => ctx.with_scratch(|_, ones| {
                session
                    .asm
                    .emit("addi", format!("{}, {}, -1", ones, Register::ZERO));
                session
                    .asm
                    .emit("xor", format!("{}, {}, {}", value, value, ones));
                Ok(())
            })?,
        }

        store(session, ctx, value, &address)?;
        session.asm.emit("move", format!("{}, {}", destination, value));
        Ok(())
    })
}

/// Direct call: arguments into `$a0`-`$a3` in order, result from `$v0`.
fn gen_call(
    call: &CallExpr,
    session: &mut Session,
    ctx: &mut Context,
    destination: Register,
) -> Result<(), Error> {
    if call.arguments.len() > ARGUMENT_REGISTERS {
        return Err(ErrorImpl::TooManyArguments {
            function: call.function.clone(),
            count: call.arguments.len(),
        })
        .at(&call.span.start);
    }

    for (index, argument) in call.arguments.iter().enumerate() {
        gen_expression(argument, session, ctx, Register::argument(index))?;
    }

    session.asm.emit(".option", "pic0");
    session.asm.emit("jal", &call.function);
    session.asm.nop();
    session
        .asm
        .emit("move", format!("{}, {}", destination, Register::V0));

    Ok(())
}
