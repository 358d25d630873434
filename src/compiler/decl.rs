use std::collections::HashSet;

use log::{debug, info};

use crate::{
    ast::{
        ast::Scope,
        declarations::{Declaration, FunctionDecl, VarDecl},
        expressions::Expr,
    },
    errors::errors::{Error, ErrorAt, ErrorImpl},
};

use super::{
    compiler::{Destination, Session},
    context::Context,
    expr::{gen_expression, store},
    frame::{Frame, DYNAMIC_SLOT_BYTES},
    registers::{Register, ARGUMENT_REGISTERS, SAVED_REGISTERS},
    stmt::gen_sequence,
};

/// Returns whether the declaration pushed a new dynamic onto the stack.
pub fn gen_declaration(
    declaration: &Declaration,
    session: &mut Session,
    ctx: &mut Context,
    destination: Destination,
) -> Result<bool, Error> {
    match declaration {
        Declaration::Variable(variable) => gen_variable(variable, session, ctx, destination),
        Declaration::Function(function) => {
            gen_function(function, session)?;
            Ok(false)
        }
    }
}

/// Top level: reserves a global word, `.comm` when uninitialised.
///
/// Inside a function: binds a dynamic unless the name is already visible,
/// then stores the initialiser, if any, to the resolved address.
pub fn gen_variable(
    variable: &VarDecl,
    session: &mut Session,
    ctx: &mut Context,
    destination: Destination,
) -> Result<bool, Error> {
    let Destination::Register(_) = destination else {
        gen_global(variable, session)?;
        return Ok(false);
    };

    let mut pushed = false;
    if !ctx.is_on_stack(&variable.identifier) {
        ctx.add_dynamic(&variable.identifier);
        session.asm.emit(
            "addiu",
            format!("{0}, {0}, -{1}", Register::SP.name(), DYNAMIC_SLOT_BYTES),
        );
        pushed = true;
    }

    if let Some(value) = &variable.value {
        let address = ctx
            .find_on_stack(&variable.identifier)
            .at(&variable.span.start)?;
        ctx.with_scratch(|ctx, scratch| {
            gen_expression(value, session, ctx, scratch)?;
            store(session, ctx, scratch, &address)
        })?;
    }

    Ok(pushed)
}

fn gen_global(variable: &VarDecl, session: &mut Session) -> Result<(), Error> {
    let name = &variable.identifier;

    match &variable.value {
        None => {
            session.add_global(name);
            session.asm.emit(".comm", format!("{}, 4, 4", name));
        }
        Some(Expr::Constant(constant)) => {
            session.add_global(name);
            session.asm.emit(".globl", name);
            session.asm.emit_bare(".data");
            session.asm.emit(".align", "2");
            session.asm.emit(".type", format!("{}, @object", name));
            session.asm.emit(".size", format!("{}, 4", name));
            session.asm.label(name);
            session.asm.emit(".word", constant.value);
        }
        Some(_) => {
            return Err(ErrorImpl::NonConstantInitializer { name: name.clone() })
                .at(&variable.span.start)
        }
    }

    debug!("global {:?} reserved", name);
    Ok(())
}

/// Compiles a function definition into its own context. Prototypes emit nothing.
pub fn gen_function(function: &FunctionDecl, session: &mut Session) -> Result<(), Error> {
    let Some(body) = &function.body else {
        return Ok(());
    };

    let name = &function.identifier;
    if function.parameters.len() > ARGUMENT_REGISTERS {
        return Err(ErrorImpl::TooManyParameters {
            function: name.clone(),
            count: function.parameters.len(),
        })
        .at(&function.span.start);
    }

    let frame = Frame::new(
        session.globals().len(),
        body.declarations.len(),
        function.parameters.len(),
    );
    let mut ctx = Context::with_frame(frame);
    info!("compiling function {:?}, frame of {} bytes", name, frame.size());

    let asm = &mut session.asm;
    asm.emit_bare(".text");
    asm.emit(".align", "2");
    asm.emit(".globl", name);
    asm.emit(".set", "nomips16");
    asm.emit(".set", "nomicromips");
    asm.emit(".ent", name);
    asm.emit(".type", format!("{}, @function", name));
    asm.label(name);
    asm.emit(
        ".frame",
        format!("{}, {}, {}", Register::FP.name(), frame.size(), Register::RA),
    );
    asm.emit(".mask", "0x40000000, -4");
    asm.emit(".fmask", "0x00000000, 0");
    asm.emit(".set", "noreorder");
    asm.emit(".set", "nomacro");

    emit_prologue(session, &frame);

    for global in session.globals() {
        ctx.add_global(global);
    }

    for (index, parameter) in function.parameters.iter().enumerate() {
        ctx.add_variable(&parameter.identifier);
        let address = ctx
            .find_on_stack(&parameter.identifier)
            .at(&parameter.span.start)?;
        session
            .asm
            .emit("sw", format!("{}, {}", Register::argument(index), address));
    }

    for declaration in &body.declarations {
        ctx.add_variable(&declaration.identifier);
    }
    for declaration in &body.declarations {
        gen_variable(declaration, session, &mut ctx, Destination::Register(Register::V0))?;
    }

    gen_sequence(&body.statements, session, &mut ctx, Register::V0)?;

    unbind_function(function, body, session, &mut ctx)?;

    emit_epilogue(session, &ctx);

    let asm = &mut session.asm;
    asm.emit(".set", "macro");
    asm.emit(".set", "reorder");
    asm.emit(".end", name);
    asm.emit(".size", format!("{}, .-{}", name, name));
    asm.blank();

    Ok(())
}

/// Drops the parameter, local and global bindings made on entry. A name
/// bound twice on entry, such as a local reusing a parameter's name, shares
/// one slot and is unbound once.
fn unbind_function(
    function: &FunctionDecl,
    body: &Scope,
    session: &Session,
    ctx: &mut Context,
) -> Result<(), Error> {
    let mut unbound: HashSet<&str> = HashSet::new();

    let names = function
        .parameters
        .iter()
        .map(|parameter| (&parameter.identifier, &parameter.span))
        .chain(
            body.declarations
                .iter()
                .map(|declaration| (&declaration.identifier, &declaration.span)),
        );
    for (name, span) in names {
        if unbound.insert(name.as_str()) {
            ctx.delete_variable(name).at(&span.start)?;
        }
    }

    for global in session.globals() {
        ctx.delete_global(global)?;
    }

    Ok(())
}

/// Allocates the frame, points `$fp` at its top and saves `$fp`, `$ra`
/// and `$s0`-`$s7`.
pub fn emit_prologue(session: &mut Session, frame: &Frame) {
    let asm = &mut session.asm;
    let (sp, fp) = (Register::SP.name(), Register::FP.name());

    asm.emit("addiu", format!("{}, {}, -4", Register::T8, sp));
    asm.emit("addiu", format!("{}, {}, -{}", sp, sp, frame.size()));
    asm.emit("sw", format!("{}, {}({})", fp, frame.frame_pointer_offset(), sp));
    asm.emit("move", format!("{}, {}", fp, Register::T8));
    asm.emit(
        "sw",
        format!("{}, {}({})", Register::RA.name(), frame.return_address_offset(), sp),
    );
    for index in 0..SAVED_REGISTERS {
        asm.emit(
            "sw",
            format!(
                "{}, {}({})",
                Register::saved(index).name(),
                frame.saved_register_offset(index),
                sp
            ),
        );
    }
}

/// Restores the saved registers and releases the frame together with any
/// dynamics still pushed, then returns. Emitted at every return site.
pub fn emit_epilogue(session: &mut Session, ctx: &Context) {
    let frame = ctx.frame();
    let pushed = ctx.dynamic_bytes();
    let asm = &mut session.asm;
    let sp = Register::SP.name();

    for index in 0..SAVED_REGISTERS {
        asm.emit(
            "lw",
            format!(
                "{}, {}({})",
                Register::saved(index).name(),
                pushed + frame.saved_register_offset(index),
                sp
            ),
        );
    }
    asm.emit(
        "lw",
        format!("{}, {}({})", Register::FP.name(), pushed + frame.frame_pointer_offset(), sp),
    );
    asm.emit(
        "lw",
        format!("{}, {}({})", Register::RA.name(), pushed + frame.return_address_offset(), sp),
    );
    asm.nop();
    asm.emit("addiu", format!("{}, {}, {}", sp, sp, frame.size() + pushed));
    asm.emit("jr", Register::RA.name());
    asm.nop();
}
