//! Lexer for the Cadenza language.
//!
//! Converts source text into a stream of [`Token`]s. Whitespace is
//! insignificant; `//` starts a line comment.

use super::error::CompileError;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();
            let token = match ch {
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                ':' => self.single_char(TokenKind::Colon),
                ',' => self.single_char(TokenKind::Comma),
                ';' => self.single_char(TokenKind::Semicolon),
                '=' => self.single_char(TokenKind::Eq),
                '+' => self.single_char(TokenKind::Plus),
                '-' => self.single_char(TokenKind::Minus),
                '*' => self.single_char(TokenKind::Star),
                '/' => self.single_char(TokenKind::Slash),
                '"' => self.lex_string()?,
                '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
                '0'..='9' => self.lex_number()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident_or_keyword(),
                _ => {
                    return Err(CompileError::lex(
                        format!("unexpected character: '{ch}'"),
                        self.line,
                        self.col,
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while !self.is_at_end() && self.peek().is_whitespace() {
                self.advance();
            }
            if !self.is_at_end() && self.peek() == '/' && self.peek_next() == Some('/') {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
                continue;
            }
            break;
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        Token { kind, line, col }
    }

    /// String contents are taken verbatim until the closing quote; there is
    /// no escape handling in the grammar.
    fn lex_string(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;
        self.advance(); // consume opening '"'
        let mut s = String::new();
        while !self.is_at_end() && self.peek() != '"' {
            s.push(self.advance());
        }
        if self.is_at_end() {
            return Err(CompileError::lex("unterminated string literal", line, col));
        }
        self.advance(); // consume closing '"'
        Ok(Token {
            kind: TokenKind::Str(s),
            line,
            col,
        })
    }

    /// A float requires a digit after the `.`; `1.` lexes as the integer `1`
    /// followed by a stray dot, which is then rejected as an unexpected
    /// character. `.5` is accepted.
    fn lex_number(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }

        let is_float = !self.is_at_end()
            && self.peek() == '.'
            && self.peek_next().is_some_and(|c| c.is_ascii_digit());

        if is_float {
            s.push(self.advance()); // consume '.'
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
            let val: f32 = s
                .parse()
                .map_err(|_| CompileError::lex(format!("invalid float literal: {s}"), line, col))?;
            Ok(Token {
                kind: TokenKind::Float(val),
                line,
                col,
            })
        } else {
            let val: i64 = s.parse().map_err(|_| {
                CompileError::lex(format!("invalid integer literal: {s}"), line, col)
            })?;
            Ok(Token {
                kind: TokenKind::Int(val),
                line,
                col,
            })
        }
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            s.push(self.advance());
        }

        let kind = match s.as_str() {
            "instruments" => TokenKind::Instruments,
            "score" => TokenKind::Score,
            "init" => TokenKind::Init,
            "perf" => TokenKind::Perf,
            "print" => TokenKind::Print,
            "println" => TokenKind::Println,
            "output" => TokenKind::Output,
            "local" => TokenKind::Local,
            "Int" => TokenKind::TyInt,
            "Float" => TokenKind::TyFloat,
            "String" => TokenKind::TyString,
            "Audio" => TokenKind::TyAudio,
            _ => TokenKind::Ident(s),
        };

        Token { kind, line, col }
    }
}
