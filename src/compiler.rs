//! Lower statement trees into register instructions.
//!
//! `x = 2 + 3 * 4` lowers to
//!
//! ```text
//! %0 = 3.000000 * 4.000000
//! %1 = 2.000000 + %0
//! _ = 'x' = %1
//! ```
//!
//! Registers are numbered in the order their instructions are emitted, so
//! the instruction producing `%n` always runs when exactly `n` registers are
//! live. An assignment whose right side is already a register does not get a
//! register of its own: at run time it renames the existing one.

pub mod instruction;
pub mod program;

use crate::parser::ast::{ArgList, Ast, BinaryOperator, Expr, UnaryOperator};
use instruction::{BinaryOp, Instruction, Operand, Register, UnaryOp};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LowerError {
    #[error("line {line}: ran out of register numbers")]
    RegisterOverflow { line: u32 },
}

/// The instructions of one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Lowered {
    pub instructions: Vec<Instruction>,
    /// Where the statement's own value ends up
    pub result: Operand,
    /// The next free register number once this statement is done
    pub registers: u32,
}

/// Lower one statement, numbering its registers from `offset`.
pub fn lower(ast: &Ast, offset: u32) -> Result<Lowered, LowerError> {
    let mut ctx = Lowering {
        instructions: vec![],
        next_register: offset,
        line: ast.line,
    };
    let result = ctx.operand(&ast.root)?;
    Ok(Lowered {
        instructions: ctx.instructions,
        result,
        registers: ctx.next_register,
    })
}

struct Lowering {
    instructions: Vec<Instruction>,
    next_register: u32,
    line: u32,
}

impl Lowering {
    fn allocate(&mut self) -> Result<Register, LowerError> {
        let register = Register(self.next_register);
        self.next_register = self
            .next_register
            .checked_add(1)
            .ok_or(LowerError::RegisterOverflow { line: self.line })?;
        Ok(register)
    }

    fn operand(&mut self, expr: &Expr) -> Result<Operand, LowerError> {
        match expr {
            Expr::Number(value) => Ok(Operand::Constant(*value)),
            Expr::Identifier(name) => Ok(Operand::Identifier(name.clone())),
            Expr::Unary { op, operand } => {
                let operand = self.operand(operand)?;
                let op = match op {
                    UnaryOperator::Negate => UnaryOp::Negate,
                    UnaryOperator::Positive => UnaryOp::Plus,
                };
                let out = self.allocate()?;
                self.instructions.push(Instruction::Unary {
                    op,
                    operand,
                    out: Some(out),
                });
                Ok(Operand::Register(out))
            }
            Expr::Binary { op, left, right } => {
                let left = self.operand(left)?;
                let right = self.operand(right)?;
                let op = match op {
                    BinaryOperator::Add => BinaryOp::Add,
                    BinaryOperator::Sub => BinaryOp::Sub,
                    BinaryOperator::Mul => BinaryOp::Mul,
                    BinaryOperator::Div => BinaryOp::Div,
                    BinaryOperator::Assign => BinaryOp::Assign,
                };

                if let (BinaryOp::Assign, Operand::Register(renamed)) = (op, &right) {
                    let renamed = *renamed;
                    self.instructions.push(Instruction::Binary {
                        op,
                        left,
                        right,
                        out: None,
                    });
                    return Ok(Operand::Register(renamed));
                }

                let out = self.allocate()?;
                self.instructions.push(Instruction::Binary {
                    op,
                    left,
                    right,
                    out: Some(out),
                });
                Ok(Operand::Register(out))
            }
            Expr::Call { callee, args } => {
                let callee = self.operand(callee)?;
                let args = self.arg_list(args)?;
                let out = self.allocate()?;
                self.instructions.push(Instruction::Binary {
                    op: BinaryOp::Call,
                    left: callee,
                    right: args,
                    out: Some(out),
                });
                Ok(Operand::Register(out))
            }
        }
    }

    fn arg_list(&mut self, args: &ArgList) -> Result<Operand, LowerError> {
        let mut lowered = Vec::with_capacity(args.len());
        for arg in args.iter() {
            lowered.push(self.operand(arg)?);
        }
        Ok(Operand::ArgList(lowered.into_boxed_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        instruction::{BinaryOp, Instruction, Operand, Register, UnaryOp},
        lower, LowerError, Lowered,
    };
    use crate::parser::Parser;
    use assert2::{check, let_assert};

    fn lower_source(source: &str, offset: u32) -> Lowered {
        let_assert!(Ok(ast) = Parser::new(source).parse_statement());
        let_assert!(Ok(lowered) = lower(&ast, offset));
        lowered
    }

    fn constant(value: f64) -> Operand {
        Operand::Constant(value)
    }

    fn reg(index: u32) -> Operand {
        Operand::Register(Register(index))
    }

    #[test]
    fn values_emit_nothing() {
        let lowered = lower_source("x", 0);
        check!(lowered.instructions.is_empty());
        check!(lowered.result == Operand::Identifier("x".into()));
        check!(lowered.registers == 0);

        let lowered = lower_source("4.5", 3);
        check!(lowered.instructions.is_empty());
        check!(lowered.result == constant(4.5));
        check!(lowered.registers == 3);
    }

    #[test]
    fn precedence_orders_instructions() {
        let lowered = lower_source("2 + 3 * 4", 0);
        check!(
            lowered.instructions
                == [
                    Instruction::Binary {
                        op: BinaryOp::Mul,
                        left: constant(3.0),
                        right: constant(4.0),
                        out: Some(Register(0)),
                    },
                    Instruction::Binary {
                        op: BinaryOp::Add,
                        left: constant(2.0),
                        right: reg(0),
                        out: Some(Register(1)),
                    },
                ]
        );
        check!(lowered.result == reg(1));
        check!(lowered.registers == 2);
    }

    #[test]
    fn registers_start_at_the_offset() {
        let lowered = lower_source("-a / 2", 5);
        check!(
            lowered.instructions
                == [
                    Instruction::Unary {
                        op: UnaryOp::Negate,
                        operand: Operand::Identifier("a".into()),
                        out: Some(Register(5)),
                    },
                    Instruction::Binary {
                        op: BinaryOp::Div,
                        left: reg(5),
                        right: constant(2.0),
                        out: Some(Register(6)),
                    },
                ]
        );
        check!(lowered.registers == 7);
    }

    #[test]
    fn unary_plus_gets_its_own_register() {
        let lowered = lower_source("+x", 0);
        check!(
            lowered.instructions
                == [Instruction::Unary {
                    op: UnaryOp::Plus,
                    operand: Operand::Identifier("x".into()),
                    out: Some(Register(0)),
                }]
        );
    }

    #[test]
    fn assigning_a_constant_allocates() {
        let lowered = lower_source("x = 10", 0);
        check!(
            lowered.instructions
                == [Instruction::Binary {
                    op: BinaryOp::Assign,
                    left: Operand::Identifier("x".into()),
                    right: constant(10.0),
                    out: Some(Register(0)),
                }]
        );
        check!(lowered.result == reg(0));
    }

    #[test]
    fn assigning_a_register_renames_it() {
        let lowered = lower_source("x = x + 1", 1);
        check!(
            lowered.instructions
                == [
                    Instruction::Binary {
                        op: BinaryOp::Add,
                        left: Operand::Identifier("x".into()),
                        right: constant(1.0),
                        out: Some(Register(1)),
                    },
                    Instruction::Binary {
                        op: BinaryOp::Assign,
                        left: Operand::Identifier("x".into()),
                        right: reg(1),
                        out: None,
                    },
                ]
        );
        check!(lowered.result == reg(1));
        check!(lowered.registers == 2);
    }

    #[test]
    fn chained_assignment_renames_the_inner_register() {
        let lowered = lower_source("x = y = 3", 0);
        check!(lowered.instructions.len() == 2);
        check!(lowered.instructions[0].out() == Some(Register(0)));
        check!(
            lowered.instructions[1]
                == Instruction::Binary {
                    op: BinaryOp::Assign,
                    left: Operand::Identifier("x".into()),
                    right: reg(0),
                    out: None,
                }
        );
    }

    #[test]
    fn print_lowers_to_one_call() {
        let lowered = lower_source("print(1, 2, 3)", 0);
        check!(
            lowered.instructions
                == [Instruction::Binary {
                    op: BinaryOp::Call,
                    left: Operand::Identifier("print".into()),
                    right: Operand::ArgList(Box::new([
                        constant(1.0),
                        constant(2.0),
                        constant(3.0)
                    ])),
                    out: Some(Register(0)),
                }]
        );
    }

    #[test]
    fn argument_lists_flatten() {
        let lowered = lower_source("f(g(1,2), 3)", 0);
        check!(lowered.instructions.len() == 2);
        let_assert!(
            Instruction::Binary {
                op: BinaryOp::Call,
                right: Operand::ArgList(args),
                out: Some(Register(1)),
                ..
            } = &lowered.instructions[1]
        );
        check!(args.to_vec() == [reg(0), constant(3.0)]);
        check!(!args.iter().any(|arg| matches!(arg, Operand::ArgList(_))));
    }

    #[test]
    fn register_numbers_can_run_out() {
        let_assert!(Ok(ast) = Parser::new("1 + 2").parse_statement());
        check!(lower(&ast, u32::MAX) == Err(LowerError::RegisterOverflow { line: 1 }));
    }
}
