pub mod engine;
pub mod error;
pub mod instruction;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod register;

use engine::{Engine, EngineOptions};
use error::Result;
use lexer::lex;
use parser::Parser;
use program::{Program, ProgramBuilder};
use register::{RegisterBank, REGISTER_COUNT};

/// Builds a program with `f`, runs it and returns the registers in
/// `ax, bx, cx, dx` order.
///
/// ```
/// use tinyasm::register::Register::*;
///
/// let registers = tinyasm::asm(|b| {
///     b.label("top");
///     b.inc(Ax, 1)?;
///     b.cmp(Ax, 3)?;
///     b.jl("top")?;
///     Ok(())
/// })
/// .unwrap();
///
/// assert_eq!(registers, [3, 0, 0, 0]);
/// ```
pub fn asm<F>(f: F) -> Result<[i64; REGISTER_COUNT]>
where
    F: FnOnce(&mut ProgramBuilder) -> Result<()>,
{
    let mut builder = ProgramBuilder::new();
    f(&mut builder)?;
    let program = builder.build();

    Ok(Engine::new(&program).run()?.to_array())
}

/// Lexes and parses assembly source into a [`Program`].
pub fn assemble(source: &str) -> Result<Program> {
    let tokens = lex(source)?;
    Parser::new(&tokens).parse_program()
}

pub fn run_source(source: &str, options: EngineOptions) -> Result<RegisterBank> {
    let program = assemble(source)?;
    Engine::with_options(&program, options).run()
}
