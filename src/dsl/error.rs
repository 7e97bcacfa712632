//! Error types for the Cadenza compiler.

use std::fmt;

/// An error that occurred while compiling a Cadenza program.
///
/// Lex and parse errors abort compilation immediately; semantic errors are
/// collected so a program reports all of them in one pass.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    SemanticError(SemanticErrorKind),
}

/// The distinct semantic checks, each its own error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    UndeclaredIdentifier,
    DuplicateDeclaration,
    TypeMismatch,
    UnknownComponent,
    ArityMismatch,
    InvalidOutputInInit,
    UndeclaredInstrument,
}

impl CompileError {
    pub fn lex(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::LexError,
        }
    }

    pub fn parse(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::ParseError,
        }
    }

    pub fn semantic(
        kind: SemanticErrorKind,
        message: impl Into<String>,
        line: usize,
        col: usize,
    ) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::SemanticError(kind),
        }
    }

    /// The semantic error kind, if this is a semantic error.
    pub fn semantic_kind(&self) -> Option<SemanticErrorKind> {
        match self.kind {
            ErrorKind::SemanticError(k) => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::LexError => write!(f, "LexError"),
            ErrorKind::ParseError => write!(f, "ParseError"),
            ErrorKind::SemanticError(kind) => write!(f, "{kind:?}"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {}: {}",
            self.line, self.col, self.kind, self.message
        )
    }
}

impl std::error::Error for CompileError {}
