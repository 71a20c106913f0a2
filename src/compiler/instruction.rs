use core::fmt;

use arbitrary::Arbitrary;

/// Index of a slot in the interpreter's register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Arbitrary)]
pub struct Register(pub u32);

impl Register {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Arbitrary)]
pub enum Operand {
    Constant(f64),
    Register(Register),
    /// Resolved by name when the instruction runs
    Identifier(Box<str>),
    /// Only ever the right side of a call, and never nested
    ArgList(Box<[Operand]>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{value:.6}"),
            Self::Register(register) => write!(f, "{register}"),
            Self::Identifier(name) => write!(f, "'{name}'"),
            Self::ArgList(args) => {
                write!(f, "arglist(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Arbitrary)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Call,
    Assign,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::Mul => write!(f, "*"),
            Self::Div => write!(f, "/"),
            Self::Call => write!(f, "(call)"),
            Self::Assign => write!(f, "="),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Arbitrary)]
pub enum UnaryOp {
    Negate,
    Plus,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negate => write!(f, "-"),
            Self::Plus => write!(f, "+"),
        }
    }
}

/// One step of a program.
///
/// An output of `None` means the instruction allocates no register; lowering
/// uses this for assignments whose right side is already a register. A
/// [`Instruction::Set`] without an output would do nothing, so its output is
/// not optional.
#[derive(Debug, Clone, PartialEq, Arbitrary)]
pub enum Instruction {
    Binary {
        op: BinaryOp,
        left: Operand,
        right: Operand,
        out: Option<Register>,
    },
    Unary {
        op: UnaryOp,
        operand: Operand,
        out: Option<Register>,
    },
    Set {
        value: Operand,
        out: Register,
    },
}

impl Instruction {
    pub fn out(&self) -> Option<Register> {
        match self {
            Self::Binary { out, .. } | Self::Unary { out, .. } => *out,
            Self::Set { out, .. } => Some(*out),
        }
    }
}

struct Output(Option<Register>);

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(register) => write!(f, "{register}"),
            None => write!(f, "_"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ", Output(self.out()))?;
        match self {
            Self::Binary {
                op, left, right, ..
            } => write!(f, "{left} {op} {right}"),
            Self::Unary { op, operand, .. } => write!(f, "{op} {operand}"),
            Self::Set { value, .. } => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BinaryOp, Instruction, Operand, Register, UnaryOp};
    use assert2::check;

    #[test]
    fn instruction_dump() {
        let call = Instruction::Binary {
            op: BinaryOp::Call,
            left: Operand::Identifier("print".into()),
            right: Operand::ArgList(Box::new([
                Operand::Constant(1.0),
                Operand::Register(Register(0)),
            ])),
            out: Some(Register(1)),
        };
        check!(call.to_string() == "%1 = 'print' (call) arglist(1.000000, %0)");

        let assign = Instruction::Binary {
            op: BinaryOp::Assign,
            left: Operand::Identifier("x".into()),
            right: Operand::Register(Register(3)),
            out: None,
        };
        check!(assign.to_string() == "_ = 'x' = %3");

        let negate = Instruction::Unary {
            op: UnaryOp::Negate,
            operand: Operand::Constant(2.5),
            out: Some(Register(0)),
        };
        check!(negate.to_string() == "%0 = - 2.500000");

        let set = Instruction::Set {
            value: Operand::Identifier("y".into()),
            out: Register(7),
        };
        check!(set.to_string() == "%7 = 'y'");
    }
}
