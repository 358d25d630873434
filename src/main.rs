//! Command-line driver: reads C source, writes MIPS assembly.

use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
    time::Instant,
};

use anyhow::Context;
use clap::Parser;
use log::info;
use mipsgen::{
    ast::printer::print_program,
    compiler::compiler::{
        compile_program, CodegenOptions, DoWhileTarget, LoadDelay, RelationalMode,
    },
    display_error,
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
};

#[derive(Parser)]
#[command(name = "mipsgen")]
#[command(about = "Compiles a small C subset to MIPS assembly", long_about = None)]
#[command(version)]
struct Cli {
    /// Input source file, stdin when omitted
    input: Option<PathBuf>,
    /// Output file, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the parsed program as XML instead of compiling it
    #[arg(long)]
    print_ast: bool,
    /// Compile `>=` and `<=` to a nop instead of rejecting them
    #[arg(long)]
    permissive_relational: bool,
    /// End do-while loops with a jump to `$topN` instead of `$doN`
    #[arg(long)]
    legacy_do_while: bool,
    /// Put a `nop` after loads for MIPS I cores without load interlocks
    #[arg(long)]
    fill_load_delay: bool,
}

impl Cli {
    fn options(&self) -> CodegenOptions {
        CodegenOptions {
            relational: if self.permissive_relational {
                RelationalMode::Permissive
            } else {
                RelationalMode::Strict
            },
            do_while_target: if self.legacy_do_while {
                DoWhileTarget::LegacyTop
            } else {
                DoWhileTarget::Do
            },
            load_delay: if self.fill_load_delay {
                LoadDelay::Filled
            } else {
                LoadDelay::Interlocked
            },
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn read_source(input: Option<&Path>) -> anyhow::Result<(String, String)> {
    match input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok((source, file_name))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read stdin")?;
            Ok((source, String::from("stdin")))
        }
    }
}

fn write_output(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => io::stdout()
            .write_all(text.as_bytes())
            .context("failed to write stdout"),
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let (source, file_name) = read_source(cli.input.as_deref())?;
    let report = |error: Error| {
        display_error(&error, &file_name, &source);
        ExitCode::FAILURE
    };

    let start = Instant::now();
    let tokens = match tokenize(source.clone(), Some(file_name.clone())) {
        Ok(tokens) => tokens,
        Err(error) => return Ok(report(error)),
    };
    info!("Tokenized in {:?}", start.elapsed());

    let parse_start = Instant::now();
    let program = match parse(tokens, Rc::new(file_name.clone())).1 {
        Ok(program) => program,
        Err(error) => return Ok(report(error)),
    };
    info!("Parsed in {:?}", parse_start.elapsed());

    if cli.print_ast {
        write_output(cli.output.as_deref(), &print_program(&program))?;
        return Ok(ExitCode::SUCCESS);
    }

    let compile_start = Instant::now();
    let assembly = match compile_program(&program, &file_name, cli.options()) {
        Ok(assembly) => assembly,
        Err(error) => return Ok(report(error)),
    };
    info!("Compiled in {:?}", compile_start.elapsed());

    write_output(cli.output.as_deref(), &assembly)?;
    info!("Total time: {:?}", start.elapsed());

    Ok(ExitCode::SUCCESS)
}
