//! Unit tests for the code generator.
//!
//! This module contains tests for:
//! - Register bookkeeping and scratch borrowing
//! - Tier resolution and addressing
//! - Frame geometry
//! - Label numbering
//! - Lowering of expressions, statements and declarations

use std::{collections::HashSet, rc::Rc};

use super::{
    compiler::{
        compile, compile_program, CodegenOptions, Destination, DoWhileTarget, LoadDelay,
        RelationalMode, Session,
    },
    context::{Address, Context},
    frame::Frame,
    registers::Register,
};
use crate::{
    ast::{
        ast::{Node, Scope},
        expressions::{CallExpr, ConstantExpr, Expr},
        statements::{ReturnStmt, Stmt},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    Position, Span,
};

fn compile_source_with(source: &str, options: CodegenOptions) -> Result<String, Error> {
    let tokens = tokenize(source.to_string(), Some("test.c".to_string()))?;
    let (_, program) = parse(tokens, Rc::new("test.c".to_string()));
    compile_program(&program?, "test.c", options)
}

fn compile_source(source: &str) -> String {
    compile_source_with(source, CodegenOptions::default()).unwrap()
}

/// Lines with runs of whitespace collapsed, e.g. `sw $fp, 56($sp)`.
fn lines(asm: &str) -> Vec<String> {
    asm.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

fn position(lines: &[String], wanted: &str) -> usize {
    lines
        .iter()
        .position(|line| line == wanted)
        .unwrap_or_else(|| panic!("{:?} not found in\n{}", wanted, lines.join("\n")))
}

fn count(lines: &[String], wanted: &str) -> usize {
    lines.iter().filter(|line| *line == wanted).count()
}

fn label_definitions(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| line.starts_with('$') && line.ends_with(':'))
        .cloned()
        .collect()
}

#[test]
fn test_reserved_registers_start_used() {
    let ctx = Context::new();

    for index in [0, 2, 4, 7, 26, 28, 29, 30, 31] {
        assert!(ctx.is_used(Register(index)), "${} should be reserved", index);
    }
    assert!(!ctx.is_used(Register(16)));
    assert!(!ctx.is_used(Register(8)));
    assert_eq!(ctx.free_saved_registers().unwrap()[0], Register(16));
    assert_eq!(ctx.free_temporary_registers().unwrap().len(), 8);
}

#[test]
fn test_scratch_band_exhaustion() {
    let mut ctx = Context::new();
    for index in 16..=23 {
        ctx.set_used(Register(index));
    }

    assert_eq!(ctx.free_saved_registers(), Err(ErrorImpl::RegistersExhausted));
    let error = ctx.with_scratch(|_, _| Ok(())).unwrap_err();
    assert_eq!(error.get_error_name(), "RegistersExhausted");
}

#[test]
fn test_with_scratch_releases_on_every_path() {
    let mut ctx = Context::new();

    let nested = ctx
        .with_scratch(|ctx, outer| {
            assert_eq!(outer, Register(16));
            ctx.with_scratch(|ctx, inner| {
                assert_eq!(inner, Register(17));
                assert_eq!(ctx.borrowed_scratch(), vec![Register(16), Register(17)]);
                Ok(inner)
            })
        })
        .unwrap();
    assert_eq!(nested, Register(17));
    assert!(ctx.borrowed_scratch().is_empty());

    let failed: Result<(), Error> = ctx.with_scratch(|_, _| {
        Err(Error::from(ErrorImpl::UnresolvedIdentifier {
            name: String::from("x"),
        }))
    });
    assert!(failed.is_err());
    assert!(ctx.borrowed_scratch().is_empty());
}

#[test]
fn test_tier_resolution_priority() {
    let mut ctx = Context::new();
    ctx.add_global("g");
    ctx.add_global("x");
    ctx.add_variable("p");
    ctx.add_variable("x");

    assert_eq!(ctx.find_on_stack("p"), Ok(Address::Frame(0)));
    // local shadows the global of the same name
    assert_eq!(ctx.find_on_stack("x"), Ok(Address::Frame(-4)));
    assert_eq!(ctx.find_on_stack("g"), Ok(Address::Global(String::from("g"))));
    assert_eq!(ctx.find_on_stack("g").unwrap().to_string(), "%got(g)($28)");
    assert_eq!(ctx.find_on_stack("x").unwrap().to_string(), "-4($fp)");
}

#[test]
fn test_dynamics_grow_towards_stack_pointer() {
    let mut ctx = Context::new();
    ctx.add_dynamic("a");
    ctx.add_dynamic("b");

    assert_eq!(ctx.find_on_stack("a"), Ok(Address::Stack(8)));
    assert_eq!(ctx.find_on_stack("b"), Ok(Address::Stack(0)));
    assert_eq!(ctx.dynamic_bytes(), 16);

    ctx.delete_dynamic("b").unwrap();
    ctx.add_dynamic("c");
    assert_eq!(ctx.find_dynamic("c"), Ok(1));
    assert_eq!(ctx.find_on_stack("a"), Ok(Address::Stack(8)));
    assert_eq!(ctx.find_on_stack("c").unwrap().to_string(), "0($sp)");
}

#[test]
fn test_binding_table_keeps_slot_on_re_add() {
    let mut ctx = Context::new();

    assert_eq!(ctx.add_variable("a"), 0);
    assert_eq!(ctx.add_variable("b"), 1);
    assert_eq!(ctx.add_variable("a"), 0);
    assert!(ctx.is_variable("b"));
    assert!(!ctx.is_dynamic("b"));
}

#[test]
fn test_variable_and_global_tiers_unbind() {
    let mut ctx = Context::new();
    assert_eq!(ctx.add_variable("a"), 0);
    assert_eq!(ctx.add_variable("b"), 1);
    assert_eq!(ctx.add_global("g"), 0);

    ctx.delete_variable("b").unwrap();
    assert!(!ctx.is_variable("b"));
    assert_eq!(
        ctx.find_variable("b"),
        Err(ErrorImpl::UnboundName {
            tier: String::from("variable"),
            name: String::from("b"),
        })
    );
    assert_eq!(ctx.find_variable("a"), Ok(0));
    // slot is the table length at insertion
    assert_eq!(ctx.add_variable("b"), 1);

    ctx.delete_global("g").unwrap();
    assert!(!ctx.is_global("g"));
    assert_eq!(
        ctx.find_global("g"),
        Err(ErrorImpl::UnboundName {
            tier: String::from("global"),
            name: String::from("g"),
        })
    );
    assert_eq!(
        ctx.delete_global("g"),
        Err(ErrorImpl::UnboundName {
            tier: String::from("global"),
            name: String::from("g"),
        })
    );
    assert_eq!(
        ctx.find_on_stack("g"),
        Err(ErrorImpl::UnresolvedIdentifier {
            name: String::from("g"),
        })
    );
    assert_eq!(ctx.add_global("g"), 0);
}

#[test]
fn test_local_reusing_parameter_name_unbinds_once() {
    let asm = compile_source("int g;\nint f(int a) { int a; a = 2; return a; }");
    let lines = lines(&asm);

    // both names share slot 0
    assert!(lines.contains(&String::from("sw $4, 0($fp)")));
    assert!(lines.contains(&String::from("sw $16, 0($fp)")));
    assert!(lines.contains(&String::from(".end f")));
}

#[test]
fn test_unbound_names_fail() {
    let mut ctx = Context::new();

    assert_eq!(
        ctx.find_variable("missing"),
        Err(ErrorImpl::UnboundName {
            tier: String::from("variable"),
            name: String::from("missing"),
        })
    );
    assert!(ctx.delete_dynamic("missing").is_err());
    assert!(ctx.find_global("missing").is_err());
    assert!(!ctx.is_on_stack("missing"));
    assert_eq!(
        ctx.find_on_stack("missing"),
        Err(ErrorImpl::UnresolvedIdentifier {
            name: String::from("missing"),
        })
    );
}

#[test]
fn test_frame_geometry() {
    let frame = Frame::new(0, 0, 1);
    assert_eq!(frame.size(), 64);
    assert_eq!(frame.return_address_offset(), 48);
    assert_eq!(frame.saved_register_offset(0), 16);
    assert_eq!(frame.saved_register_offset(7), 44);
    assert_eq!(frame.frame_pointer_offset(), 56);

    // 1 + 2 + 3 + 1 + 13 = 20 words, already even
    let frame = Frame::new(2, 3, 1);
    assert_eq!(frame.words(), 20);
    assert_eq!(frame.frame_pointer_offset(), 80 - 4 * 5);

    assert_eq!(Frame::new(0, 0, 0).size() % 8, 0);
    assert_eq!(Frame::new(1, 0, 0).size() % 8, 0);
}

#[test]
fn test_register_names() {
    assert_eq!(Register(16).to_string(), "$16");
    assert_eq!(Register(16).name(), "$s0");
    assert_eq!(Register::saved(7).name(), "$s7");
    assert_eq!(Register::argument(3), Register(7));
    assert_eq!(Register::FP.name(), "$fp");
    assert_eq!(Register::RA.name(), "$ra");
    assert_eq!(Register(24).name(), "$t8");
}

#[test]
fn test_empty_scope_is_a_single_nop() {
    let mut session = Session::new(CodegenOptions::default());
    let mut ctx = Context::new();
    let node = Node::Scope(Scope::empty(Span::null()));

    compile(&node, &mut session, &mut ctx, Destination::Register(Register::V0)).unwrap();

    assert_eq!(session.into_output(), "    nop\n");
}

#[test]
fn test_one_parameter_function_frame() {
    let asm = compile_source("int inc(int p) { return p + 1; }");
    let lines = lines(&asm);

    assert!(lines.contains(&String::from(".frame $fp, 64, $31")));
    assert!(lines.contains(&String::from("addiu $sp, $sp, -64")));
    assert!(lines.contains(&String::from("sw $fp, 56($sp)")));
    assert!(lines.contains(&String::from("sw $ra, 48($sp)")));
    assert!(lines.contains(&String::from("sw $4, 0($fp)")));

    // explicit return plus the fall-through at the end of the body
    assert_eq!(count(&lines, "lw $fp, 56($sp)"), 2);
    assert_eq!(count(&lines, "lw $ra, 48($sp)"), 2);
    assert_eq!(count(&lines, "addiu $sp, $sp, 64"), 2);

    let ret = position(&lines, "lw $2, 0($fp)");
    assert_eq!(lines[ret + 1], "li $16, 1");
    assert_eq!(lines[ret + 2], "addu $2, $2, $16");
}

#[test]
fn test_prologue_order() {
    let lines = lines(&compile_source("int f() { return 0; }"));
    let entry = position(&lines, "f:");

    assert_eq!(lines[entry + 6], "addiu $24, $sp, -4");
    assert_eq!(lines[entry + 7], "addiu $sp, $sp, -56");
    assert_eq!(lines[entry + 8], "sw $fp, 52($sp)");
    assert_eq!(lines[entry + 9], "move $fp, $24");
    assert_eq!(lines[entry + 10], "sw $ra, 48($sp)");
    assert_eq!(lines[entry + 11], "sw $s0, 16($sp)");
    assert_eq!(lines[entry + 18], "sw $s7, 44($sp)");
}

#[test]
fn test_if_with_equality_labels() {
    let asm = compile_source("int f(int a, int b) { if (a == b) { a = 1; } return a; }");
    let lines = lines(&asm);

    assert_eq!(label_definitions(&lines), vec!["$not2:", "$end2:", "$end1:"]);

    let compare = position(&lines, "bne $16, $17, $not2");
    assert_eq!(lines[compare - 2], "lw $16, 0($fp)");
    assert_eq!(lines[compare - 1], "lw $17, -4($fp)");

    let branch = position(&lines, "beq $0, $16, $end1");
    assert_eq!(lines[branch + 1], "nop");
    assert_eq!(lines[branch + 2], "li $16, 1");
    assert_eq!(lines[branch + 3], "sw $16, 0($fp)");
    assert_eq!(lines[branch + 4], "$end1:");
}

#[test]
fn test_call_with_five_arguments_is_rejected() {
    let mut session = Session::new(CodegenOptions::default());
    let mut ctx = Context::new();
    let arguments = (1..=5)
        .map(|value| {
            Expr::Constant(ConstantExpr {
                value,
                span: Span::null(),
            })
        })
        .collect();
    let node = Node::Expression(Expr::Call(CallExpr {
        function: String::from("g"),
        arguments,
        span: Span::null(),
    }));

    let error = compile(&node, &mut session, &mut ctx, Destination::Register(Register::V0))
        .unwrap_err();

    assert_eq!(error.get_error_name(), "TooManyArguments");
    assert_eq!(session.into_output(), "");
}

#[test]
fn test_four_arguments_use_argument_registers() {
    let lines = lines(&compile_source("int f() { return g(1, 2, 3, 4); }"));
    let call = position(&lines, "jal g");

    assert_eq!(lines[call - 5], "li $4, 1");
    assert_eq!(lines[call - 2], "li $7, 4");
    assert_eq!(lines[call - 1], ".option pic0");
    assert_eq!(lines[call + 1], "nop");
    assert_eq!(lines[call + 2], "move $2, $2");
}

#[test]
fn test_parameter_limit() {
    assert!(compile_source_with("int f(int a, int b, int c, int d) { return a; }", CodegenOptions::default()).is_ok());

    let error = compile_source_with(
        "int f(int a, int b, int c, int d, int e) { return a; }",
        CodegenOptions::default(),
    )
    .unwrap_err();
    assert_eq!(error.get_error_name(), "TooManyParameters");
}

#[test]
fn test_labels_are_unique_across_nesting() {
    let source = "
        int f(int n) {
            int i;
            int total = 0;
            for (i = 0; i < n; i++) {
                if (i == 3) { total = total + 1; } else { total = total + 2; }
                while (total != 0) { total = total - 1; }
            }
            do { n = n - 1; } while (n == 1);
            return total;
        }
        int g(int x) { if (x != 1) { return 1; } return 0; }";
    let lines = lines(&compile_source(source));
    let labels = label_definitions(&lines);
    let unique: HashSet<&String> = labels.iter().collect();

    assert_eq!(labels.len(), unique.len(), "duplicate labels in {:?}", labels);
    assert!(labels.len() >= 12);
}

#[test]
fn test_label_numbers_follow_construct_entry() {
    let lines = lines(&compile_source(
        "int f(int x) { while (x) { if (x == 2) { x = 0; } x = x - 1; } return x; }",
    ));

    // while reserves 1, if reserves 2, the equality inside reserves 3
    assert!(lines.contains(&String::from("$top1:")));
    assert!(lines.contains(&String::from("beq $0, $16, $end2")));
    assert!(lines.contains(&String::from("$not3:")));
}

#[test]
fn test_do_while_jumps_back_to_body() {
    let source = "int f(int x) { do { x = x - 1; } while (x); return x; }";

    let lines_default = lines(&compile_source(source));
    assert!(lines_default.contains(&String::from("$do1:")));
    assert!(lines_default.contains(&String::from("b $do1")));

    let legacy = CodegenOptions {
        do_while_target: DoWhileTarget::LegacyTop,
        ..CodegenOptions::default()
    };
    let lines_legacy = lines(&compile_source_with(source, legacy).unwrap());
    assert!(lines_legacy.contains(&String::from("b $top1")));
    assert!(!lines_legacy.contains(&String::from("$top1:")));
}

#[test]
fn test_relational_modes() {
    let source = "int f(int a, int b) { return a >= b; }";

    let error = compile_source_with(source, CodegenOptions::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "UnsupportedOperator");

    let permissive = CodegenOptions {
        relational: RelationalMode::Permissive,
        ..CodegenOptions::default()
    };
    let lines = lines(&compile_source_with(source, permissive).unwrap());
    let right = position(&lines, "lw $16, -4($fp)");
    assert_eq!(lines[right + 1], "nop");
}

#[test]
fn test_comparisons_use_slt() {
    let lines = lines(&compile_source("int f(int a, int b) { return (a > b) + (a < b); }"));

    assert!(lines.contains(&String::from("slt $2, $16, $2")));
    assert!(lines.contains(&String::from("slt $16, $16, $17")));
}

#[test]
fn test_unary_writes_back_and_yields_value() {
    let lines = lines(&compile_source("int f(int x) { x++; return !x; }"));
    let load = position(&lines, "addiu $16, $16, 1");

    assert_eq!(lines[load - 1], "lw $16, 0($fp)");
    assert_eq!(lines[load + 1], "sw $16, 0($fp)");
    assert_eq!(lines[load + 2], "move $2, $16");

    let ones = position(&lines, "addi $17, $0, -1");
    assert_eq!(lines[ones + 1], "xor $16, $16, $17");
}

#[test]
fn test_block_dynamics_shift_epilogue() {
    let lines = lines(&compile_source("int f() { { int x = 3; return x; } }"));

    let push = position(&lines, "addiu $sp, $sp, -8");
    assert_eq!(lines[push + 1], "li $16, 3");
    assert_eq!(lines[push + 2], "sw $16, 0($sp)");
    assert_eq!(lines[push + 3], "lw $2, 0($sp)");

    // the early return releases the frame and the pushed dynamic
    assert_eq!(lines[push + 4], "lw $s0, 24($sp)");
    assert!(lines.contains(&String::from("lw $fp, 60($sp)")));
    assert!(lines.contains(&String::from("lw $ra, 56($sp)")));
    assert!(lines.contains(&String::from("addiu $sp, $sp, 64")));

    // the block itself pops it again, then the body falls through
    assert!(lines.contains(&String::from("addiu $sp, $sp, 8")));
    assert!(lines.contains(&String::from("addiu $sp, $sp, 56")));
}

#[test]
fn test_visible_name_is_not_pushed_again() {
    let lines = lines(&compile_source("int f(int x) { { int x = 2; } return x; }"));

    assert_eq!(count(&lines, "addiu $sp, $sp, -8"), 0);
    assert!(lines.contains(&String::from("sw $16, 0($fp)")));
}

#[test]
fn test_globals() {
    let asm = compile_source("int g = 5; int h; int f() { h = g; return h; }");
    let lines = lines(&asm);

    assert!(lines.contains(&String::from(".globl g")));
    assert!(lines.contains(&String::from("g:")));
    assert!(lines.contains(&String::from(".word 5")));
    assert!(lines.contains(&String::from(".comm h, 4, 4")));

    // two globals enlarge the frame by two words
    assert!(lines.contains(&String::from(".frame $fp, 64, $31")));

    let load = position(&lines, "lw $16, %got(g)($28)");
    assert_eq!(lines[load + 1], "lw $16, 0($16)");
    assert_eq!(lines[load + 2], "lw $17, %got(h)($28)");
    assert_eq!(lines[load + 3], "sw $16, 0($17)");
}

#[test]
fn test_non_constant_global_initialiser() {
    let error = compile_source_with("int a = 1; int b = a + 1;", CodegenOptions::default())
        .unwrap_err();

    assert_eq!(error.get_error_name(), "NonConstantInitializer");
}

#[test]
fn test_undeclared_identifier() {
    let error = compile_source_with("int f() { return y; }", CodegenOptions::default())
        .unwrap_err();

    assert_eq!(error.get_error_name(), "UnresolvedIdentifier");
    assert!(!error.get_position().is_null());
}

#[test]
fn test_borrow_balance_after_statement() {
    let tokens = tokenize(
        "int f(int a) { while (a != 0) { a = (a - 1) * (a + 1) / 2; } return a; }".to_string(),
        None,
    )
    .unwrap();
    let (_, program) = parse(tokens, Rc::new("stdin".to_string()));
    let program = program.unwrap();
    let function = match program.declarations()[0] {
        crate::ast::declarations::Declaration::Function(function) => function.clone(),
        _ => unreachable!(),
    };

    let mut session = Session::new(CodegenOptions::default());
    let mut ctx = Context::with_frame(Frame::new(0, 0, 1));
    ctx.add_variable("a");
    for statement in &function.body.unwrap().statements {
        let node = Node::Statement(statement.clone());
        compile(&node, &mut session, &mut ctx, Destination::Register(Register::V0)).unwrap();
        assert!(ctx.borrowed_scratch().is_empty());
    }
}

#[test]
fn test_module_header_and_prototype() {
    let asm = compile_source("int g(int);");
    let lines = lines(&asm);

    assert_eq!(lines[0], ".file 1 \"test.c\"");
    assert!(lines.contains(&String::from(".abicalls")));
    assert!(!lines.iter().any(|line| line.starts_with(".ent")));
}

#[test]
fn test_filled_load_delay_slots() {
    let source = "int g = 3;\nint f(int a) { int b = a; b++; g = g + b; return g; }";
    let filled = CodegenOptions {
        load_delay: LoadDelay::Filled,
        ..CodegenOptions::default()
    };
    let filled_lines = lines(&compile_source_with(source, filled).unwrap());
    let restored = [
        "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$fp",
    ];

    for (index, line) in filled_lines.iter().enumerate() {
        let Some(operands) = line.strip_prefix("lw ") else {
            continue;
        };
        let target = operands.split(',').next().unwrap();
        if restored.contains(&target) {
            continue;
        }
        assert_eq!(filled_lines[index + 1], "nop", "{} at line {}", line, index);
    }

    let got = position(&filled_lines, "lw $16, %got(g)($28)");
    assert_eq!(filled_lines[got + 1], "nop");
    assert_eq!(filled_lines[got + 2], "lw $16, 0($16)");
    assert_eq!(filled_lines[got + 3], "nop");

    // the default assumes an interlocked core
    let interlocked = lines(&compile_source(source));
    let got = position(&interlocked, "lw $16, %got(g)($28)");
    assert_eq!(interlocked[got + 1], "lw $16, 0($16)");
}

#[test]
fn test_statement_at_top_level_has_position() {
    let mut session = Session::new(CodegenOptions::default());
    let mut ctx = Context::new();
    let file = Rc::new(String::from("test.c"));
    let start = Position(7, Rc::clone(&file));
    let node = Node::Statement(Stmt::Return(ReturnStmt {
        value: None,
        span: Span {
            start,
            end: Position(14, file),
        },
    }));

    let error = compile(&node, &mut session, &mut ctx, Destination::TopLevel).unwrap_err();
    assert_eq!(error.get_error_name(), "InvalidDestination");
    assert_eq!(error.get_position().0, 7);
    assert!(!error.get_position().is_null());
    assert!(session.into_output().is_empty());
}

#[test]
fn test_statement_at_top_level_is_rejected() {
    let mut session = Session::new(CodegenOptions::default());
    let mut ctx = Context::new();
    let node = Node::Expression(Expr::Constant(ConstantExpr {
        value: 1,
        span: Span::null(),
    }));

    let error = compile(&node, &mut session, &mut ctx, Destination::TopLevel).unwrap_err();
    assert_eq!(error.get_error_name(), "InvalidDestination");
}
