//! runtimes read a [`Program`](crate::compiler::program::Program) and execute it against a register file

use std::io;

use crate::compiler::instruction::Register;

pub mod builtins;
pub mod interpreter;
pub mod registers;

pub use interpreter::Interpreter;
pub use registers::RegisterFile;

/// Why a single instruction could not run.
#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    #[error("unknown register {register} ({live} live)")]
    UnknownRegister { register: Register, live: usize },
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(Box<str>),
    #[error("an argument list is not a value")]
    ArgListAsValue,
    #[error("can only assign to an identifier")]
    AssignTarget,
    #[error("cannot reassign {register} with a constant ({live} live)")]
    ReassignWithConstant { register: Register, live: usize },
    #[error("cannot reassign {register} with a copy ({live} live)")]
    ReassignWithCopy { register: Register, live: usize },
    #[error("assignment needs an output register")]
    MissingOutput,
    #[error("unknown copy identifier '{0}'")]
    UnknownCopyIdentifier(Box<str>),
    #[error("cannot assign an argument list")]
    InvalidAssignSource,
    #[error("can only call an identifier")]
    CallTarget,
    #[error("unknown function '{0}'")]
    UnknownFunction(Box<str>),
    #[error("'{0}' expects an argument list")]
    ExpectedArgList(Box<str>),
    #[error("register file full: cannot store {register} (capacity {capacity})")]
    RegisterFileFull { register: Register, capacity: usize },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// A run stopped at the instruction at `index`.
#[derive(thiserror::Error, Debug)]
#[error("line {line}: {error} (instruction {index})")]
pub struct Halt {
    pub index: usize,
    /// Line of the statement the instruction was lowered from
    pub line: u32,
    #[source]
    pub error: RuntimeError,
}
