//! Parser module for Apache configuration files
//!
//! This module provides the lexer, syntax tree, and parser, plus the
//! evaluation of conditional blocks.

pub mod ast;
pub mod conditions;
pub mod lexer;
pub mod parser;

pub use ast::{Statement, StatementKind};
pub use lexer::{tokenize, LexError, Location, Spanned, Token};
pub use parser::{parse, ParseError, Parser};
