//! Lexer for Apache configuration arguments
//!
//! The parser splits a file into logical lines; this lexer breaks the
//! argument part of one line into words.
//!
//! Key features:
//! - Whitespace separates arguments
//! - `\` followed by a newline continues the line and counts as whitespace
//! - "..." and '...' quote arguments containing whitespace
//! - `\"` and `\\` are unescaped inside quotes

use logos::{Logos, Span};
use std::fmt;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub start: usize,
    pub end: usize,
    /// 1-based line number
    pub line: usize,
}

impl Location {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Location,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Location) -> Self {
        Self { value, span }
    }
}

/// Argument tokens
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Spaces, tabs and line continuations
    #[regex(r"([ \t\f]|\\\r?\n)+", logos::skip)]
    Whitespace,

    /// Double-quoted argument: "..."
    #[regex(r#""([^"\\]|\\(.|\n))*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len()-1], '"')
    })]
    DoubleQuoted(String),

    /// Single-quoted argument: '...'
    #[regex(r#"'([^'\\]|\\(.|\n))*'"#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len()-1], '\'')
    })]
    SingleQuoted(String),

    /// Bare word: paths, host names, numbers, `*:80` ...
    /// Quotes only start a quoted argument at the beginning of a word.
    #[regex(r#"([^ \t\f\r\n"'\\]|\\[^\r\n])([^ \t\f\r\n\\]|\\[^\r\n])*"#, |lex| lex.slice().to_string())]
    Word(String),
}

impl Token {
    /// The argument text with quoting removed
    pub fn into_value(self) -> String {
        match self {
            Token::DoubleQuoted(s) | Token::SingleQuoted(s) | Token::Word(s) => s,
            Token::Whitespace => String::new(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::DoubleQuoted(s) => write!(f, "\"{}\"", s),
            Token::SingleQuoted(s) => write!(f, "'{}'", s),
            Token::Word(s) => write!(f, "{}", s),
            Token::Whitespace => write!(f, " "),
        }
    }
}

/// Unescape a quoted argument. Only the quote character and the backslash
/// itself are escapable; any other backslash is kept as written.
fn unescape(s: &str, quote: char) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if next == quote || next == '\\' => {
                    result.push(next);
                    chars.next();
                }
                Some('\n') => {
                    // Line continuation inside quotes
                    chars.next();
                    result.push(' ');
                }
                _ => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Lexer result type
pub type LexResult = Result<Vec<Spanned<Token>>, LexError>;

/// Lexer error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("Unterminated quote on line {}", .span.line)]
    UnterminatedQuote { span: Location },

    #[error("Unexpected character on line {}", .span.line)]
    UnexpectedChar { span: Location },
}

impl LexError {
    pub fn span(&self) -> Location {
        match self {
            LexError::UnterminatedQuote { span } | LexError::UnexpectedChar { span } => *span,
        }
    }
}

/// Tokenize the argument text of one logical line.
///
/// `offset` is the byte position of `source` in the file and `line` its
/// line number; both end up in the token spans.
pub fn tokenize(source: &str, offset: usize, line: usize) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    for (result, span) in lexer.spanned() {
        let location = locate(&span, offset, line);
        match result {
            Ok(Token::Whitespace) => continue,
            Ok(token) => tokens.push(Spanned::new(token, location)),
            Err(_) => {
                let rest = &source[span.start..];
                return Err(if rest.starts_with('"') || rest.starts_with('\'') {
                    LexError::UnterminatedQuote {
                        span: Location::new(location.start, offset + source.len(), line),
                    }
                } else {
                    LexError::UnexpectedChar { span: location }
                });
            }
        }
    }

    Ok(tokens)
}

fn locate(span: &Span, offset: usize, line: usize) -> Location {
    Location::new(offset + span.start, offset + span.end, line)
}
