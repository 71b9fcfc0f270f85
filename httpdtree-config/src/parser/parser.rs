//! Apache configuration parser
//!
//! Line-oriented recursive descent: the source is split into logical lines
//! (joining `\` continuations), each line is classified as comment, block
//! open, block close or directive, and its arguments are tokenized.

use crate::parser::ast::{Statement, StatementKind};
use crate::parser::lexer::{tokenize, LexError, Location, Token};
use httpdtree_core::Verbatim;
use thiserror::Error;

/// Parser error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Lexer error: {0}")]
    Lex(#[from] LexError),

    #[error("Unexpected </{found}> on line {}", .span.line)]
    UnexpectedClose { found: String, span: Location },

    #[error("Mismatched close on line {}: expected </{expected}>, found </{found}>", .span.line)]
    MismatchedClose {
        expected: String,
        found: String,
        span: Location,
    },

    #[error("Unclosed <{name}> opened on line {}", .span.line)]
    Unclosed { name: String, span: Location },

    #[error("Invalid syntax on line {}: {message}", .span.line)]
    InvalidSyntax { message: String, span: Location },
}

impl ParseError {
    /// Where in the source the error occurred
    pub fn span(&self) -> Location {
        match self {
            ParseError::Lex(e) => e.span(),
            ParseError::UnexpectedClose { span, .. }
            | ParseError::MismatchedClose { span, .. }
            | ParseError::Unclosed { span, .. }
            | ParseError::InvalidSyntax { span, .. } => *span,
        }
    }

    /// Short description used as a diagnostic label
    pub fn label(&self) -> &'static str {
        match self {
            ParseError::Lex(LexError::UnterminatedQuote { .. }) => "quote never closed",
            ParseError::Lex(LexError::UnexpectedChar { .. }) => "unexpected character",
            ParseError::UnexpectedClose { .. } => "no block is open here",
            ParseError::MismatchedClose { .. } => "closes the wrong block",
            ParseError::Unclosed { .. } => "opened here",
            ParseError::InvalidSyntax { .. } => "here",
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// One logical line: a byte range of the source possibly spanning several
/// physical lines joined by `\`
#[derive(Debug, Clone, Copy)]
struct Line {
    start: usize,
    /// End of the content, before any line terminator
    end: usize,
    /// Start of the following line
    next: usize,
    number: usize,
}

/// Parser state
pub struct Parser<'a> {
    source: &'a str,
    lines: Vec<Line>,
    pos: usize,
    /// End of the text already attributed to a statement
    cursor: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser from source text
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lines: split_lines(source),
            pos: 0,
            cursor: 0,
        }
    }

    /// Parse the entire file
    pub fn parse(&mut self) -> ParseResult<Vec<Statement>> {
        let (mut body, _) = self.parse_body(None)?;
        if let Some(last) = body.last_mut() {
            last.verbatim.trailing = self.source[self.cursor..].to_string();
        }
        Ok(body)
    }

    /// Parse statements up to the close of `open` (or the end of input),
    /// returning them with the raw text of the closing line
    fn parse_body(
        &mut self,
        open: Option<(&str, Location)>,
    ) -> ParseResult<(Vec<Statement>, String)> {
        let source = self.source;
        let mut body = Vec::new();

        while let Some(line) = self.advance() {
            let raw = &source[line.start..line.end];
            let text = raw.trim_start();
            let indent = raw.len() - text.len();
            let text = text.trim_end();
            let start = line.start + indent;
            let span = Location::new(start, start + text.len(), line.number);

            if text.is_empty() {
                continue;
            }

            let verbatim = Verbatim {
                leading: source[self.cursor..start].to_string(),
                text: Some(source[start..line.next].to_string()),
                ..Verbatim::default()
            };

            if let Some(comment) = text.strip_prefix('#') {
                let comment = comment.replace("\\\r\n", " ").replace("\\\n", " ");
                body.push(
                    Statement::new(StatementKind::Comment(comment.trim().to_string()), span)
                        .with_verbatim(verbatim),
                );
                self.cursor = line.next;
            } else if let Some(close) = text.strip_prefix("</") {
                let found = close.strip_suffix('>').unwrap_or(close).trim().to_string();
                return match open {
                    None => Err(ParseError::UnexpectedClose { found, span }),
                    Some((expected, _)) if !expected.eq_ignore_ascii_case(&found) => {
                        Err(ParseError::MismatchedClose {
                            expected: expected.to_string(),
                            found,
                            span,
                        })
                    }
                    Some(_) => {
                        let close = source[self.cursor..line.next].to_string();
                        self.cursor = line.next;
                        Ok((body, close))
                    }
                };
            } else if let Some(header) = text.strip_prefix('<') {
                let Some(header) = header.strip_suffix('>') else {
                    return Err(ParseError::InvalidSyntax {
                        message: "block header is missing its closing '>'".to_string(),
                        span,
                    });
                };
                let (name, args) = self.words(header, start + 1, line.number, span)?;
                self.cursor = line.next;
                let (inner, close) = self.parse_body(Some((&name, span)))?;
                body.push(
                    Statement::new(
                        StatementKind::Block {
                            name,
                            args,
                            body: inner,
                        },
                        span,
                    )
                    .with_verbatim(Verbatim {
                        close: Some(close),
                        ..verbatim
                    }),
                );
            } else {
                let (name, args) = self.words(text, start, line.number, span)?;
                body.push(
                    Statement::new(StatementKind::Directive { name, args }, span)
                        .with_verbatim(verbatim),
                );
                self.cursor = line.next;
            }
        }

        match open {
            Some((name, span)) => Err(ParseError::Unclosed {
                name: name.to_string(),
                span,
            }),
            None => Ok((body, String::new())),
        }
    }

    /// Split a directive or block header into name and arguments
    fn words(
        &self,
        text: &str,
        offset: usize,
        line: usize,
        span: Location,
    ) -> ParseResult<(String, Vec<String>)> {
        let mut tokens = tokenize(text, offset, line)?.into_iter();
        let name = match tokens.next().map(|t| t.value) {
            Some(Token::Word(name)) => name,
            Some(other) => {
                return Err(ParseError::InvalidSyntax {
                    message: format!("expected a name, found {}", other),
                    span,
                });
            }
            None => {
                return Err(ParseError::InvalidSyntax {
                    message: "expected a name".to_string(),
                    span,
                });
            }
        };
        let args = tokens.map(|t| t.value.into_value()).collect();
        Ok((name, args))
    }

    fn advance(&mut self) -> Option<Line> {
        let line = self.lines.get(self.pos).copied();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }
}

/// Split the source into logical lines. A physical line ending in `\`
/// continues onto the next one.
fn split_lines(source: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut number = 1;
    let mut first = 1;

    for (i, b) in source.bytes().enumerate() {
        if b != b'\n' {
            continue;
        }
        let content = source[start..i].trim_end_matches('\r');
        number += 1;
        if content.ends_with('\\') {
            continue;
        }
        lines.push(Line {
            start,
            end: start + content.len(),
            next: i + 1,
            number: first,
        });
        start = i + 1;
        first = number;
    }

    if start < source.len() {
        let content = source[start..].trim_end_matches('\r');
        lines.push(Line {
            start,
            end: start + content.len(),
            next: source.len(),
            number: first,
        });
    }

    lines
}

/// Parse Apache configuration source into statements
pub fn parse(source: &str) -> ParseResult<Vec<Statement>> {
    Parser::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vhost() {
        let source = r#"
# Default site
<VirtualHost *:80>
    ServerName example.com
    ServerAlias www.example.com "other example"
    <Directory /var/www/html>
        Require all granted
    </Directory>
</VirtualHost>
"#;
        let statements = parse(source).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].kind,
            StatementKind::Comment("Default site".to_string())
        );
        assert_eq!(statements[0].span.line, 2);

        let StatementKind::Block { name, args, body } = &statements[1].kind else {
            panic!("expected a block");
        };
        assert_eq!(name, "VirtualHost");
        assert_eq!(args, &["*:80"]);
        assert_eq!(body.len(), 3);
        assert_eq!(
            body[1].kind,
            StatementKind::Directive {
                name: "ServerAlias".to_string(),
                args: vec!["www.example.com".to_string(), "other example".to_string()],
            }
        );
        assert_eq!(body[2].name(), Some("Directory"));
        assert_eq!(body[2].span.line, 6);
    }

    #[test]
    fn test_source_text_is_kept() {
        let source = "#Managed\n\nListen 80\n\n<VirtualHost *:80>\n\tServerName   a\n\n</VirtualHost>\n\n";
        let statements = parse(source).unwrap();
        assert_eq!(statements.len(), 3);

        assert_eq!(statements[0].verbatim.leading, "");
        assert_eq!(statements[0].verbatim.text.as_deref(), Some("#Managed\n"));
        assert_eq!(statements[1].verbatim.leading, "\n");
        assert_eq!(statements[1].verbatim.text.as_deref(), Some("Listen 80\n"));

        let block = &statements[2];
        assert_eq!(block.verbatim.text.as_deref(), Some("<VirtualHost *:80>\n"));
        assert_eq!(block.verbatim.close.as_deref(), Some("\n</VirtualHost>\n"));
        assert_eq!(block.verbatim.trailing, "\n");
        let StatementKind::Block { body, .. } = &block.kind else {
            panic!("expected a block");
        };
        assert_eq!(body[0].verbatim.leading, "\t");
        assert_eq!(body[0].verbatim.text.as_deref(), Some("ServerName   a\n"));
    }

    #[test]
    fn test_close_is_case_insensitive() {
        let statements = parse("<ifmodule mod_ssl.c>\nListen 443\n</IfModule>\n").unwrap();
        assert_eq!(statements[0].name(), Some("ifmodule"));
    }

    #[test]
    fn test_continuation_lines() {
        let source = "ServerAlias a.example \\\n    b.example\nListen 80\n";
        let statements = parse(source).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].kind,
            StatementKind::Directive {
                name: "ServerAlias".to_string(),
                args: vec!["a.example".to_string(), "b.example".to_string()],
            }
        );
        assert_eq!(statements[1].span.line, 3);
    }

    #[test]
    fn test_crlf() {
        let statements = parse("<VirtualHost *:80>\r\nServerName a\r\n</VirtualHost>\r\n").unwrap();
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_mismatched_close() {
        let err = parse("<VirtualHost *:80>\n</Directory>\n").unwrap_err();
        assert!(matches!(err, ParseError::MismatchedClose { .. }));
        assert_eq!(err.span().line, 2);
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse("<VirtualHost *:80>\nServerName a\n").unwrap_err();
        assert!(matches!(err, ParseError::Unclosed { ref name, .. } if name == "VirtualHost"));
        assert_eq!(err.span().line, 1);
    }

    #[test]
    fn test_unexpected_close() {
        let err = parse("Listen 80\n</VirtualHost>\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClose { .. }));
    }

    #[test]
    fn test_missing_angle() {
        let err = parse("<VirtualHost *:80\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn test_lex_error_propagates() {
        let err = parse("Listen 80\nServerName \"broken\n").unwrap_err();
        assert!(matches!(err, ParseError::Lex(LexError::UnterminatedQuote { .. })));
        assert_eq!(err.span().line, 2);
        assert_eq!(err.label(), "quote never closed");
    }
}
