//! Precedence-climbing parser. One [`Parser`] handles exactly one statement
//! and either yields a whole [`Ast`] or the first error it ran into; there is
//! no recovery.
pub mod ast;

use crate::lexer::{LexerError, Span, Token, TokenKind, Tokenizer};
use ast::{ArgList, Ast, BinaryOperator, Expr, UnaryOperator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Min,
    Assign,
    Term,
    Factor,
}

impl Precedence {
    fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Assign => Self::Assign,
            TokenKind::Plus | TokenKind::Minus => Self::Term,
            TokenKind::Star | TokenKind::Slash => Self::Factor,
            _ => Self::Min,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: {error}")]
    Lexical {
        error: LexerError,
        line: u32,
        span: Span,
    },
    #[error("line {line}: expected expression")]
    ExpectedExpression { line: u32, span: Span },
    #[error("line {line}: unexpected ','")]
    UnexpectedComma { line: u32, span: Span },
    #[error("line {line}: expected ')', found {found}")]
    ExpectedRParen {
        found: TokenKind,
        line: u32,
        span: Span,
    },
    #[error("line {line}: expected number, identifier, '(' or unary operator, found {found}")]
    ExpectedTerminal {
        found: TokenKind,
        line: u32,
        span: Span,
    },
    #[error("line {line}: expressions nest too deeply")]
    NestingTooDeep { line: u32, span: Span },
    #[error("line {line}: unexpected {found} after expression")]
    TrailingInput {
        found: TokenKind,
        line: u32,
        span: Span,
    },
}

impl ParseError {
    pub fn line(&self) -> u32 {
        match self {
            Self::Lexical { line, .. }
            | Self::ExpectedExpression { line, .. }
            | Self::UnexpectedComma { line, .. }
            | Self::ExpectedRParen { line, .. }
            | Self::ExpectedTerminal { line, .. }
            | Self::NestingTooDeep { line, .. }
            | Self::TrailingInput { line, .. } => *line,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Self::Lexical { span, .. }
            | Self::ExpectedExpression { span, .. }
            | Self::UnexpectedComma { span, .. }
            | Self::ExpectedRParen { span, .. }
            | Self::ExpectedTerminal { span, .. }
            | Self::NestingTooDeep { span, .. }
            | Self::TrailingInput { span, .. } => span,
        }
    }
}

/// How deep operators, parentheses and argument lists may nest in one
/// statement.
pub const MAX_NESTING: u32 = 256;

pub struct Parser<'src> {
    tokens: Tokenizer<'src>,
    current: Token<'src>,
    line: u32,
    depth: u32,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::from_tokenizer(Tokenizer::new(source))
    }

    pub fn from_tokenizer(mut tokens: Tokenizer<'src>) -> Self {
        let line = tokens.line();
        let current = tokens.next_token();
        Self {
            tokens,
            current,
            line,
            depth: 0,
        }
    }

    /// Parse the whole input as one statement.
    pub fn parse_statement(mut self) -> Result<Ast, ParseError> {
        self.check_lexical()?;
        let line = match self.current.kind {
            TokenKind::Eof => self.line,
            _ => self.current.line,
        };
        let root = self.parse_expr(Precedence::Min)?;
        match self.current.kind {
            TokenKind::Eof => Ok(Ast { root, line }),
            found => Err(ParseError::TrailingInput {
                found,
                line: self.current.line,
                span: self.current.span.clone(),
            }),
        }
    }

    fn check_lexical(&self) -> Result<(), ParseError> {
        match self.current.kind {
            TokenKind::Error(error) => Err(ParseError::Lexical {
                error,
                line: self.current.line,
                span: self.current.span.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.tokens.next_token();
        self.check_lexical()
    }

    /// Go one level deeper. Callers restore `depth` once they return
    /// successfully; a failed parse is abandoned whole.
    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::NestingTooDeep {
                line: self.current.line,
                span: self.current.span.clone(),
            });
        }
        Ok(())
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.current.kind {
            TokenKind::RParen => self.advance(),
            found => Err(ParseError::ExpectedRParen {
                found,
                line: self.current.line,
                span: self.current.span.clone(),
            }),
        }
    }

    fn parse_expr(&mut self, min: Precedence) -> Result<Expr, ParseError> {
        match self.current.kind {
            TokenKind::Eof => Err(ParseError::ExpectedExpression {
                line: self.current.line,
                span: self.current.span.clone(),
            })?,
            TokenKind::Comma => Err(ParseError::UnexpectedComma {
                line: self.current.line,
                span: self.current.span.clone(),
            })?,
            _ => {}
        }

        let left = self.parse_terminal()?;
        self.climb(left, min)
    }

    /// Fold binary operators binding tighter than `min` onto `left`.
    fn climb(&mut self, mut left: Expr, min: Precedence) -> Result<Expr, ParseError> {
        let depth = self.depth;
        loop {
            let op = self.current.kind;
            let precedence = Precedence::of(op);
            if precedence == Precedence::Min || precedence <= min {
                break;
            }
            // every operator folded in here puts `left` one level further down
            self.descend()?;
            self.advance()?;
            left = self.parse_infix(op, precedence, left)?;
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_infix(
        &mut self,
        op: TokenKind,
        precedence: Precedence,
        left: Expr,
    ) -> Result<Expr, ParseError> {
        let op = match op {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Sub,
            TokenKind::Star => BinaryOperator::Mul,
            TokenKind::Slash => BinaryOperator::Div,
            TokenKind::Assign => BinaryOperator::Assign,
            // only operators with a precedence above `Min` get here
            _ => unreachable!(),
        };
        // assignment binds to the right: `x = y = 1` is `x = (y = 1)`
        let right = match op {
            BinaryOperator::Assign => self.parse_expr(Precedence::Min)?,
            _ => self.parse_expr(precedence)?,
        };
        Ok(Expr::binary(op, left, right))
    }

    fn parse_terminal(&mut self) -> Result<Expr, ParseError> {
        self.descend()?;
        let node = match self.current.kind {
            TokenKind::Number(value) => {
                self.advance()?;
                Expr::Number(value)
            }
            TokenKind::Identifier => {
                let name = Box::from(self.current.text);
                self.advance()?;
                Expr::Identifier(name)
            }
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_expr(Precedence::Min)?;
                self.expect_rparen()?;
                inner
            }
            TokenKind::Plus => {
                self.advance()?;
                Expr::unary(UnaryOperator::Positive, self.parse_terminal()?)
            }
            TokenKind::Minus => {
                self.advance()?;
                Expr::unary(UnaryOperator::Negate, self.parse_terminal()?)
            }
            found => Err(ParseError::ExpectedTerminal {
                found,
                line: self.current.line,
                span: self.current.span.clone(),
            })?,
        };
        let node = self.parse_call(node)?;
        self.depth -= 1;
        Ok(node)
    }

    /// A terminal directly followed by something that starts an operand is
    /// called with the argument list that follows.
    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        if !self.current.kind.starts_operand() {
            return Ok(callee);
        }
        let args = self.parse_args()?;
        Ok(Expr::call(callee, args))
    }

    /// Arguments after a callee.
    ///
    /// A leading `(` is ambiguous: `f (1 + 2) * 3` groups the first argument,
    /// while `f(1, 2)` wraps the whole list. The first expression inside
    /// decides: a `)` right after it closes a group and the argument goes on
    /// as an ordinary operand, a `,` makes it a parenthesised list that has
    /// to end in `)`.
    fn parse_args(&mut self) -> Result<ArgList, ParseError> {
        if self.current.kind != TokenKind::LParen {
            return self.parse_arg_chain();
        }

        self.descend()?;
        let depth = self.depth - 1;
        self.advance()?;
        let first = self.parse_expr(Precedence::Min)?;

        let args = if self.current.kind == TokenKind::Comma {
            self.advance()?;
            let rest = self.parse_arg_chain()?;
            self.expect_rparen()?;
            ArgList::new(first, Some(rest))
        } else {
            self.expect_rparen()?;
            let first = self.parse_call(first)?;
            let first = self.climb(first, Precedence::Min)?;
            ArgList::new(first, self.parse_more_args()?)
        };
        self.depth = depth;
        Ok(args)
    }

    /// `expr (',' expr)*`
    fn parse_arg_chain(&mut self) -> Result<ArgList, ParseError> {
        self.descend()?;
        let depth = self.depth - 1;
        let value = self.parse_expr(Precedence::Min)?;
        let next = self.parse_more_args()?;
        self.depth = depth;
        Ok(ArgList::new(value, next))
    }

    fn parse_more_args(&mut self) -> Result<Option<ArgList>, ParseError> {
        if self.current.kind != TokenKind::Comma {
            return Ok(None);
        }
        self.advance()?;
        self.parse_arg_chain().map(Some)
    }
}
