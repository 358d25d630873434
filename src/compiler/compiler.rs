//! Main compiler module.
//!
//! This module contains the compilation session and the entry points that
//! turn a program tree into MIPS assembly text. It owns the state that
//! outlives a single function: the label counter, the list of global
//! names and the output buffer.

use log::{debug, trace};

use crate::{
    ast::ast::{Node, Program},
    errors::errors::{Error, ErrorAt, ErrorImpl},
};

use super::{
    context::Context,
    decl::gen_declaration,
    emitter::Assembly,
    expr::gen_expression,
    registers::Register,
    stmt::{gen_scope, gen_statement},
};

/// How `>=` and `<=` are handled. Neither has a lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationalMode {
    /// Reject the operator with an error.
    #[default]
    Strict,
    /// Compile both operands and emit a `nop`, leaving the left operand as the result.
    Permissive,
}

/// Where a do-while loop jumps back to after a true condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoWhileTarget {
    /// The `$doN` label at the top of the body.
    #[default]
    Do,
    /// `$topN`, which no construct defines. Kept for output compatibility.
    LegacyTop,
}

/// Whether the instruction after a `lw` may read the loaded register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadDelay {
    /// The core interlocks on a load-use hazard (MIPS II and later).
    #[default]
    Interlocked,
    /// MIPS I: a `nop` follows every load whose result is read next.
    Filled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodegenOptions {
    pub relational: RelationalMode,
    pub do_while_target: DoWhileTarget,
    pub load_delay: LoadDelay,
}

/// Target of a compile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Outside any function: declarations become globals.
    TopLevel,
    /// Inside a function: the value of the subtree lands in this register.
    Register(Register),
}

impl Destination {
    pub fn register(&self, node: &str) -> Result<Register, ErrorImpl> {
        match self {
            Destination::Register(register) => Ok(*register),
            Destination::TopLevel => Err(ErrorImpl::InvalidDestination {
                node: node.to_string(),
            }),
        }
    }
}

/// State shared by every function of one compilation run.
pub struct Session {
    pub asm: Assembly,
    pub options: CodegenOptions,
    label_counter: u32,
    globals: Vec<String>,
}

impl Session {
    pub fn new(options: CodegenOptions) -> Self {
        Session {
            asm: Assembly::new(),
            options,
            label_counter: 1,
            globals: vec![],
        }
    }

    /// Reserves the next label number. Numbers are never reused.
    pub fn next_label(&mut self) -> u32 {
        let number = self.label_counter;
        self.label_counter += 1;
        trace!("reserved label number {}", number);
        number
    }

    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    pub fn add_global(&mut self, name: &str) {
        if !self.globals.iter().any(|global| global == name) {
            self.globals.push(name.to_string());
        }
    }

    pub fn into_output(self) -> String {
        self.asm.into_string()
    }
}

/// Compiles any node into `destination`.
pub fn compile(
    node: &Node,
    session: &mut Session,
    ctx: &mut Context,
    destination: Destination,
) -> Result<(), Error> {
    match node {
        Node::Program(program) => gen_program(program, session, ctx, destination),
        Node::Declaration(declaration) => {
            gen_declaration(declaration, session, ctx, destination).map(|_| ())
        }
        Node::Scope(scope) => {
            let register = destination.register("a scope").at(&scope.span.start)?;
            gen_scope(scope, session, ctx, register)
        }
        Node::Statement(statement) => {
            let register = destination
                .register("a statement")
                .at(&statement.get_start())?;
            gen_statement(statement, session, ctx, register)
        }
        Node::Expression(expression) => {
            let register = destination
                .register("an expression")
                .at(&expression.get_span().start)?;
            gen_expression(expression, session, ctx, register)
        }
    }
}

/// Compiles the left subtree, then the right one.
pub fn gen_program(
    program: &Program,
    session: &mut Session,
    ctx: &mut Context,
    destination: Destination,
) -> Result<(), Error> {
    if let Some(left) = &program.left {
        compile(left, session, ctx, destination)?;
    }
    if let Some(right) = &program.right {
        compile(right, session, ctx, destination)?;
    }
    Ok(())
}

fn emit_module_header(asm: &mut Assembly, file_name: &str) {
    asm.emit(".file", format!("1 \"{}\"", file_name));
    asm.emit(".section", ".mdebug.abi32");
    asm.emit_bare(".previous");
    asm.emit(".nan", "legacy");
    asm.emit(".module", "fp=xx");
    asm.emit(".module", "nooddspreg");
    asm.emit_bare(".abicalls");
    asm.blank();
}

/// Compiles a whole translation unit and returns the assembly text.
pub fn compile_program(
    program: &Program,
    file_name: &str,
    options: CodegenOptions,
) -> Result<String, Error> {
    let mut session = Session::new(options);
    emit_module_header(&mut session.asm, file_name);

    let mut ctx = Context::new();
    gen_program(program, &mut session, &mut ctx, Destination::TopLevel)?;

    debug!(
        "compiled {} top-level declarations, {} labels used",
        program.declarations().len(),
        session.label_counter - 1
    );

    Ok(session.into_output())
}
