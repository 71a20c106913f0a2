use std::io::Write;

use super::{builtins::Builtin, Halt, RegisterFile, RuntimeError};
use crate::{
    compiler::{
        instruction::{BinaryOp, Instruction, Operand, Register, UnaryOp},
        program::Program,
    },
    Config,
};

/// Runs programs straight through against one register file, writing
/// whatever they print to `output`.
///
/// Registers and bindings outlive a single [`Interpreter::run`], so programs
/// assembled one after another by the same
/// [`Assembler`](crate::compiler::program::Assembler) can build on each
/// other.
#[derive(Debug)]
pub struct Interpreter<W> {
    registers: RegisterFile,
    output: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W) -> Self {
        Self::with_config(&Config::default(), output)
    }

    pub fn with_config(config: &Config, output: W) -> Self {
        Self {
            registers: RegisterFile::new(config.max_registers),
            output,
        }
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Execute every instruction of `program` in order, stopping at the
    /// first one that fails. Output written before that stays written.
    pub fn run(&mut self, program: &Program) -> Result<(), Halt> {
        for (index, (instruction, line)) in program.iter().enumerate() {
            self.execute(instruction)
                .map_err(|error| Halt { index, line, error })?;
        }
        Ok(())
    }

    pub fn execute(&mut self, instruction: &Instruction) -> Result<(), RuntimeError> {
        match instruction {
            Instruction::Binary {
                op,
                left,
                right,
                out,
            } => match op {
                BinaryOp::Assign => self.assign(left, right, *out),
                BinaryOp::Call => self.call(left, right, *out),
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                    let left = self.resolve(left)?;
                    let right = self.resolve(right)?;
                    let value = match op {
                        BinaryOp::Add => left + right,
                        BinaryOp::Sub => left - right,
                        BinaryOp::Mul => left * right,
                        _ => left / right,
                    };
                    self.write(*out, value)
                }
            },
            Instruction::Unary { op, operand, out } => {
                let value = self.resolve(operand)?;
                let value = match op {
                    UnaryOp::Negate => -value,
                    UnaryOp::Plus => value,
                };
                self.write(*out, value)
            }
            Instruction::Set { value, out } => {
                let value = self.resolve(value)?;
                self.registers.store(*out, value)
            }
        }
    }

    fn resolve(&self, operand: &Operand) -> Result<f64, RuntimeError> {
        match operand {
            Operand::Constant(value) => Ok(*value),
            Operand::Register(register) => self.value_of(*register),
            Operand::Identifier(name) => self
                .registers
                .lookup(name)
                .and_then(|register| self.registers.get(register))
                .ok_or_else(|| RuntimeError::UnknownIdentifier(name.clone())),
            Operand::ArgList(_) => Err(RuntimeError::ArgListAsValue),
        }
    }

    fn value_of(&self, register: Register) -> Result<f64, RuntimeError> {
        self.registers
            .get(register)
            .ok_or(RuntimeError::UnknownRegister {
                register,
                live: self.registers.live(),
            })
    }

    fn write(&mut self, out: Option<Register>, value: f64) -> Result<(), RuntimeError> {
        match out {
            Some(register) => self.registers.store(register, value),
            None => Ok(()),
        }
    }

    /// The register a constant or copy assignment may claim: it has to be
    /// the next one past the live set.
    fn fresh(
        &self,
        out: Option<Register>,
        reassign: fn(Register, usize) -> RuntimeError,
    ) -> Result<Register, RuntimeError> {
        let register = out.ok_or(RuntimeError::MissingOutput)?;
        let live = self.registers.live();
        if register.index() != live {
            return Err(reassign(register, live));
        }
        Ok(register)
    }

    fn assign(
        &mut self,
        target: &Operand,
        source: &Operand,
        out: Option<Register>,
    ) -> Result<(), RuntimeError> {
        let Operand::Identifier(name) = target else {
            return Err(RuntimeError::AssignTarget);
        };
        let previous = self.registers.lookup(name);

        let bound = match source {
            Operand::Constant(value) => {
                let register = self.fresh(out, |register, live| {
                    RuntimeError::ReassignWithConstant { register, live }
                })?;
                self.registers.store(register, *value)?;
                register
            }
            Operand::Register(register) => {
                self.value_of(*register)?;
                *register
            }
            Operand::Identifier(copied) => {
                let from = self
                    .registers
                    .lookup(copied)
                    .ok_or_else(|| RuntimeError::UnknownCopyIdentifier(copied.clone()))?;
                let register = self.fresh(out, |register, live| {
                    RuntimeError::ReassignWithCopy { register, live }
                })?;
                let value = self.value_of(from)?;
                self.registers.store(register, value)?;
                register
            }
            Operand::ArgList(_) => return Err(RuntimeError::InvalidAssignSource),
        };

        self.registers.bind(bound, name)?;
        if let Some(previous) = previous.filter(|previous| *previous != bound) {
            self.registers.unbind(previous);
        }
        Ok(())
    }

    fn call(
        &mut self,
        callee: &Operand,
        args: &Operand,
        out: Option<Register>,
    ) -> Result<(), RuntimeError> {
        let Operand::Identifier(name) = callee else {
            return Err(RuntimeError::CallTarget);
        };
        let builtin =
            Builtin::lookup(name).ok_or_else(|| RuntimeError::UnknownFunction(name.clone()))?;
        let Operand::ArgList(args) = args else {
            return Err(RuntimeError::ExpectedArgList(name.clone()));
        };

        let values = args
            .iter()
            .map(|arg| self.resolve(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let result = builtin.call(&values, &mut self.output)?;
        self.write(out, result)
    }
}
