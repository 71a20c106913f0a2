use core::fmt;

pub use logos::Span;
use logos::{Lexer, Logos, Skip};

/// Extends a run of digits over a fractional part, but only when the dot is
/// followed by at least one digit (`1.` stays `1` and leaves the dot behind).
fn read_number(lexer: &mut Lexer<RawToken>) -> Result<f64, LexerError> {
    let rest = lexer.remainder().as_bytes();
    if rest.first() == Some(&b'.') && rest.get(1).is_some_and(u8::is_ascii_digit) {
        let fraction = rest[1..].iter().take_while(|b| b.is_ascii_digit()).count();
        lexer.bump(1 + fraction);
    }

    lexer
        .slice()
        .parse()
        .map_err(|_| LexerError::MalformedNumber)
}

fn newline(lexer: &mut Lexer<RawToken>) -> Skip {
    lexer.extras += 1;
    Skip
}

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum LexerError {
    #[default]
    #[error("invalid token encountered")]
    Invalid,
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("malformed number")]
    MalformedNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Logos)]
#[logos(error = LexerError, extras = u32)]
#[logos(skip r"[ \t\r]+")]
enum RawToken {
    #[token("\n", newline)]
    Newline,
    #[regex("[0-9]+", read_number)]
    Number(f64),
    #[regex("[a-zA-Z]+")]
    Identifier,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("=")]
    Assign,
}

/// The tag of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Eof,
    Error(LexerError),
    Identifier,
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
    Assign,
}

impl TokenKind {
    /// Can this token begin a terminal expression without a prefix operator?
    pub fn starts_operand(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Identifier | Self::LParen)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eof => write!(f, "end of input"),
            Self::Error(err) => write!(f, "{err}"),
            Self::Identifier => write!(f, "identifier"),
            Self::Number(_) => write!(f, "number"),
            Self::Plus => write!(f, "'+'"),
            Self::Minus => write!(f, "'-'"),
            Self::Star => write!(f, "'*'"),
            Self::Slash => write!(f, "'/'"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Comma => write!(f, "','"),
            Self::Assign => write!(f, "'='"),
        }
    }
}

/// Tokens borrow their text from the source they were lexed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    /// Byte range, absolute within the whole input.
    pub span: Span,
    pub line: u32,
}

/// Pull-based tokenizer over a single source string.
///
/// Once the input runs out every further call to [`Tokenizer::next_token`]
/// yields another [`TokenKind::Eof`].
pub struct Tokenizer<'src> {
    lexer: Lexer<'src, RawToken>,
    offset: usize,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::starting_at(source, 0, 1)
    }

    /// Tokenize `source` as if it started `offset` bytes and `line - 1`
    /// newlines into a larger input.
    pub fn starting_at(source: &'src str, offset: usize, line: u32) -> Self {
        Self {
            lexer: RawToken::lexer_with_extras(source, line),
            offset,
        }
    }

    pub fn line(&self) -> u32 {
        self.lexer.extras
    }

    pub fn next_token(&mut self) -> Token<'src> {
        let Some(raw) = self.lexer.next() else {
            let end = self.offset + self.lexer.source().len();
            return Token {
                kind: TokenKind::Eof,
                text: "",
                span: end..end,
                line: self.lexer.extras,
            };
        };

        let text = self.lexer.slice();
        let kind = match raw {
            Ok(RawToken::Number(value)) => TokenKind::Number(value),
            Ok(RawToken::Identifier) => TokenKind::Identifier,
            Ok(RawToken::Plus) => TokenKind::Plus,
            Ok(RawToken::Minus) => TokenKind::Minus,
            Ok(RawToken::Star) => TokenKind::Star,
            Ok(RawToken::Slash) => TokenKind::Slash,
            Ok(RawToken::LParen) => TokenKind::LParen,
            Ok(RawToken::RParen) => TokenKind::RParen,
            Ok(RawToken::Comma) => TokenKind::Comma,
            Ok(RawToken::Assign) => TokenKind::Assign,
            // newlines are always skipped by their callback
            Ok(RawToken::Newline) => unreachable!(),
            Err(LexerError::Invalid) => match text.chars().next() {
                Some(c) => TokenKind::Error(LexerError::UnexpectedCharacter(c)),
                None => TokenKind::Error(LexerError::Invalid),
            },
            Err(err) => TokenKind::Error(err),
        };
        let span = self.lexer.span();

        Token {
            kind,
            text,
            span: span.start + self.offset..span.end + self.offset,
            line: self.lexer.extras,
        }
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}
