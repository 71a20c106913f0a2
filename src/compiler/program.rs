//! Stitch the statements of one input together into a [`Program`].
use core::fmt;

use super::{instruction::Instruction, lower, LowerError};
use crate::{
    lexer::{Span, Tokenizer},
    parser::{ast::Ast, ParseError, Parser},
    Config,
};

/// A straight-line list of instructions, each tagged with the line of the
/// statement it was lowered from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    lines: Vec<u32>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction, line: u32) {
        self.instructions.push(instruction);
        self.lines.push(line);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Instruction, u32)> {
        self.instructions.iter().zip(self.lines.iter().copied())
    }
}

impl FromIterator<Instruction> for Program {
    /// Builds a program whose instructions all claim to come from line 1.
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        let mut program = Program::new();
        for instruction in iter {
            program.push(instruction, 1);
        }
        program
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

/// One separator-delimited piece of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'src> {
    pub text: &'src str,
    /// Byte offset of `text` within the whole input
    pub offset: usize,
    /// Line `text` starts on
    pub line: u32,
}

impl<'src> Statement<'src> {
    pub fn span(&self) -> Span {
        self.offset..self.offset + self.text.len()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn parse(&self) -> Result<Ast, ParseError> {
        Parser::from_tokenizer(Tokenizer::starting_at(self.text, self.offset, self.line))
            .parse_statement()
    }
}

/// Split `source` on `separator`, skipping statements with nothing but
/// whitespace in them.
pub fn split_statements(source: &str, separator: char) -> impl Iterator<Item = Statement<'_>> {
    let mut offset = 0;
    let mut line = 1;
    source
        .split(separator)
        .map(move |text| {
            let statement = Statement { text, offset, line };
            offset += text.len() + separator.len_utf8();
            line += text.matches('\n').count() as u32 + u32::from(separator == '\n');
            statement
        })
        .filter(|statement| !statement.is_blank())
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Lower(#[from] LowerError),
}

impl CompileError {
    /// Source range to point at, if the error has one.
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Parse(err) => Some(err.span()),
            Self::Lower(_) => None,
        }
    }
}

/// Every statement that failed to compile, in source order.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{}", one_per_line(.0))]
pub struct CompileErrors(pub Vec<CompileError>);

fn one_per_line(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compiles inputs statement by statement, carrying register numbering over
/// from each statement (and each input) to the next.
#[derive(Debug, Clone)]
pub struct Assembler {
    separator: char,
    registers: u32,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Assembler {
    pub fn new(config: &Config) -> Self {
        Self {
            separator: config.separator,
            registers: 0,
        }
    }

    /// Registers claimed by everything assembled so far.
    pub fn registers(&self) -> u32 {
        self.registers
    }

    /// Compile all statements of `source`. Nothing is committed unless every
    /// statement compiles.
    pub fn assemble(&mut self, source: &str) -> Result<Program, CompileErrors> {
        let mut program = Program::new();
        let mut errors = vec![];
        let mut registers = self.registers;

        for statement in split_statements(source, self.separator) {
            let lowered = statement.parse().map_err(CompileError::from).and_then(|ast| {
                lower(&ast, registers)
                    .map(|lowered| (ast.line, lowered))
                    .map_err(CompileError::from)
            });
            match lowered {
                Ok((line, lowered)) => {
                    registers = lowered.registers;
                    for instruction in lowered.instructions {
                        program.push(instruction, line);
                    }
                }
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            self.registers = registers;
            Ok(program)
        } else {
            Err(CompileErrors(errors))
        }
    }
}
