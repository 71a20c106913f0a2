//! Owned syntax tree produced by the [`Parser`](super::Parser).
//!
//! Every node owns its children, so a tree can only ever be dropped as a
//! whole from its root ([`Ast`]).
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Positive,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Assign,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Identifier(Box<str>),
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: ArgList,
    },
}

impl Expr {
    pub fn unary(op: UnaryOperator, operand: Expr) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee: Expr, args: ArgList) -> Self {
        Self::Call {
            callee: Box::new(callee),
            args,
        }
    }
}

/// Right-linked chain of call arguments.
///
/// An argument list is not an [`Expr`], so one can never appear as an
/// argument of another.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgList {
    pub value: Box<Expr>,
    pub next: Option<Box<ArgList>>,
}

impl ArgList {
    pub fn new(value: Expr, next: Option<ArgList>) -> Self {
        Self {
            value: Box::new(value),
            next: next.map(Box::new),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> ArgIter<'_> {
        ArgIter { next: Some(self) }
    }
}

pub struct ArgIter<'a> {
    next: Option<&'a ArgList>,
}

impl<'a> Iterator for ArgIter<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next.as_deref();
        Some(&current.value)
    }
}

/// Top-level node of one parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub root: Expr,
    /// Line the statement starts on
    pub line: u32,
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tree(f, &self.root, 0)
    }
}

fn write_rails(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for i in 0..depth {
        if i == depth - 1 {
            write!(f, " |-")?;
        } else {
            write!(f, " | ")?;
        }
    }
    Ok(())
}

fn write_tree(f: &mut fmt::Formatter<'_>, expr: &Expr, depth: usize) -> fmt::Result {
    write_rails(f, depth)?;
    match expr {
        Expr::Number(n) => writeln!(f, "Number: {n:.6}"),
        Expr::Identifier(name) => writeln!(f, "Identifier: {name}"),
        Expr::Unary { op, operand } => {
            match op {
                UnaryOperator::Positive => writeln!(f, "Positive:")?,
                UnaryOperator::Negate => writeln!(f, "Negative:")?,
            }
            write_tree(f, operand, depth + 1)
        }
        Expr::Binary { op, left, right } => {
            let label = match op {
                BinaryOperator::Add => "Add",
                BinaryOperator::Sub => "Sub",
                BinaryOperator::Mul => "Mul",
                BinaryOperator::Div => "Div",
                BinaryOperator::Assign => "Assign",
            };
            writeln!(f, "{label}:")?;
            write_tree(f, left, depth + 1)?;
            write_tree(f, right, depth + 1)
        }
        Expr::Call { callee, args } => {
            writeln!(f, "Call:")?;
            write_tree(f, callee, depth + 1)?;
            write_args(f, args, depth + 1)
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &ArgList, depth: usize) -> fmt::Result {
    write_rails(f, depth)?;
    writeln!(f, "Args:")?;
    write_tree(f, &args.value, depth + 1)?;
    match &args.next {
        Some(next) => write_args(f, next, depth + 1),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{ArgList, Ast, BinaryOperator, Expr, UnaryOperator};
    use assert2::check;

    #[test]
    fn arg_list_walks_the_chain() {
        let args = ArgList::new(
            Expr::Number(1.0),
            Some(ArgList::new(
                Expr::Identifier("x".into()),
                Some(ArgList::new(Expr::Number(3.0), None)),
            )),
        );
        check!(args.len() == 3);
        check!(args.iter().nth(1) == Some(&Expr::Identifier("x".into())));
    }

    #[test]
    fn tree_dump() {
        let ast = Ast {
            root: Expr::binary(
                BinaryOperator::Assign,
                Expr::Identifier("x".into()),
                Expr::binary(
                    BinaryOperator::Mul,
                    Expr::unary(UnaryOperator::Negate, Expr::Number(2.0)),
                    Expr::call(
                        Expr::Identifier("f".into()),
                        ArgList::new(Expr::Number(1.5), None),
                    ),
                ),
            ),
            line: 1,
        };
        let expected = "\
Assign:
 |-Identifier: x
 |-Mul:
 | |-Negative:
 | | |-Number: 2.000000
 | |-Call:
 | | |-Identifier: f
 | | |-Args:
 | | | |-Number: 1.500000
";
        check!(ast.to_string() == expected);
    }
}
