//! Syntax tree for Apache configuration files
//!
//! This is the direct result of parsing: statements in document order with
//! their source locations, before conditions are evaluated and the
//! statements are attached to a [`httpdtree_core::Tree`].

use crate::parser::lexer::Location;
use httpdtree_core::Verbatim;

/// One statement with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Location,
    /// Exact source text, used to write unchanged statements back as-is
    pub verbatim: Verbatim,
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `# text`
    Comment(String),

    /// `Name arg arg ...`
    Directive { name: String, args: Vec<String> },

    /// `<Name arg ...>` ... `</Name>`
    Block {
        name: String,
        args: Vec<String>,
        body: Vec<Statement>,
    },
}

impl Statement {
    pub fn new(kind: StatementKind, span: Location) -> Self {
        Self {
            kind,
            span,
            verbatim: Verbatim::default(),
        }
    }

    pub fn with_verbatim(mut self, verbatim: Verbatim) -> Self {
        self.verbatim = verbatim;
        self
    }

    /// Name of a directive or block
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            StatementKind::Comment(_) => None,
            StatementKind::Directive { name, .. } | StatementKind::Block { name, .. } => Some(name),
        }
    }
}

/// Count every statement, nested ones included
pub fn count(statements: &[Statement]) -> usize {
    statements
        .iter()
        .map(|s| match &s.kind {
            StatementKind::Block { body, .. } => 1 + count(body),
            _ => 1,
        })
        .sum()
}
