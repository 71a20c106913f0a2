use std::io::Write;

pub mod compiler;
mod config;
pub mod lexer;
pub mod parser;
pub mod runtime;

pub use compiler::program::{Assembler, CompileError, CompileErrors, Program};
pub use config::Config;
pub use runtime::{Halt, Interpreter, RuntimeError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileErrors),
    #[error(transparent)]
    Runtime(#[from] Halt),
}

/// Assemble every statement of `source` into one program.
pub fn compile(source: &str, config: &Config) -> Result<Program, CompileErrors> {
    Assembler::new(config).assemble(source)
}

/// Compile and run `source` on a fresh interpreter writing to `output`.
///
/// Nothing runs if any statement fails to compile.
pub fn run<W: Write>(source: &str, config: &Config, output: W) -> Result<Interpreter<W>, Error> {
    let program = compile(source, config)?;
    let mut interpreter = Interpreter::with_config(config, output);
    interpreter.run(&program)?;
    Ok(interpreter)
}

#[cfg(test)]
mod tests {
    use super::{run, Config, Error};
    use assert2::{check, let_assert};

    #[test]
    fn newline_separated_program() {
        let config = Config::default().with_separator('\n');
        let_assert!(Ok(interpreter) = run("a = 3\nb = a * a\nprint(a, b)\n", &config, vec![]));
        check!(interpreter.output() == b"3.000000 9.000000\n");
    }

    #[test]
    fn compile_errors_stop_everything() {
        let_assert!(Err(Error::Compile(errors)) = run("print(1); print(", &Config::default(), vec![]));
        check!(errors.0.len() == 1);
    }

    #[test]
    fn halts_surface_through_the_error() {
        let result = run("print(2); print(q)", &Config::default(), vec![]);
        let_assert!(Err(Error::Runtime(halt)) = result);
        check!(halt.to_string() == "line 1: unknown identifier 'q' (instruction 1)");
    }
}
