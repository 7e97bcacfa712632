//! Token types for the Cadenza lexer.

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Instruments,
    Score,
    Init,
    Perf,
    Print,
    Println,
    Output,
    Local,

    // Type names
    TyInt,
    TyFloat,
    TyString,
    TyAudio,

    // Literals
    Ident(String),
    Int(i64),
    Float(f32),
    Str(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Eq,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Comma,
    Semicolon,

    Eof,
}
