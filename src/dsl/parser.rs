//! Parser for the Cadenza language.
//!
//! Recursive descent over the token stream. Produces one [`Program`] per
//! source file: an optional instruments block and an optional score block.
//! `*` and `/` bind tighter than `+` and `-`; both groups are
//! left-associative. A single parse failure aborts compilation — there is
//! no error recovery.

use super::ast::*;
use super::error::CompileError;
use super::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_call_site: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            next_call_site: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Program, CompileError> {
        let mut instruments = Vec::new();
        let mut score = Vec::new();

        while !self.check(TokenKind::Eof) {
            match &self.peek().kind {
                TokenKind::Instruments => {
                    self.advance();
                    self.expect(TokenKind::LBrace, "expected '{' after 'instruments'")?;
                    while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
                        instruments.push(self.parse_instrument()?);
                    }
                    self.expect(TokenKind::RBrace, "expected '}' to close instruments block")?;
                }
                TokenKind::Score => {
                    self.advance();
                    self.expect(TokenKind::LBrace, "expected '{' after 'score'")?;
                    while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
                        score.push(self.parse_score_event()?);
                    }
                    self.expect(TokenKind::RBrace, "expected '}' to close score block")?;
                }
                _ => {
                    let t = self.peek();
                    return Err(CompileError::parse(
                        format!("expected 'instruments' or 'score', got {:?}", t.kind),
                        t.line,
                        t.col,
                    ));
                }
            }
        }

        Ok(Program { instruments, score })
    }

    // ---- instruments ----------------------------------------------------

    fn parse_instrument(&mut self) -> Result<InstrumentDef, CompileError> {
        let (name, line, col) = self.expect_ident("expected instrument name")?;
        self.expect(TokenKind::LBrace, "expected '{' after instrument name")?;

        let mut members = Vec::new();
        let mut init = None;
        let mut perf = None;

        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            match &self.peek().kind {
                TokenKind::Init => {
                    let t = self.advance();
                    if init.is_some() {
                        return Err(CompileError::parse(
                            format!("instrument '{name}' already has an init function"),
                            t.line,
                            t.col,
                        ));
                    }
                    init = Some(self.parse_function(t.line, t.col)?);
                }
                TokenKind::Perf => {
                    let t = self.advance();
                    if perf.is_some() {
                        return Err(CompileError::parse(
                            format!("instrument '{name}' already has a perf function"),
                            t.line,
                            t.col,
                        ));
                    }
                    perf = Some(self.parse_function(t.line, t.col)?);
                }
                TokenKind::Ident(_) => {
                    members.push(self.parse_member()?);
                }
                _ => {
                    let t = self.peek();
                    return Err(CompileError::parse(
                        format!(
                            "expected member declaration, 'init' or 'perf', got {:?}",
                            t.kind
                        ),
                        t.line,
                        t.col,
                    ));
                }
            }
        }

        self.expect(TokenKind::RBrace, "expected '}' to close instrument body")?;

        Ok(InstrumentDef {
            name,
            members,
            init,
            perf,
            line,
            col,
        })
    }

    fn parse_member(&mut self) -> Result<MemberVar, CompileError> {
        let (name, line, col) = self.expect_ident("expected member name")?;
        self.expect(TokenKind::Colon, "expected ':' after member name")?;
        let ty = self.expect_type()?;
        self.expect(TokenKind::Semicolon, "expected ';' after member declaration")?;
        Ok(MemberVar {
            name,
            ty,
            line,
            col,
        })
    }

    fn parse_function(&mut self, line: usize, col: usize) -> Result<FunctionDef, CompileError> {
        self.expect(TokenKind::LParen, "expected '(' after function keyword")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let (name, pline, pcol) = self.expect_ident("expected parameter name")?;
                self.expect(TokenKind::Colon, "expected ':' after parameter name")?;
                let ty = self.expect_type()?;
                if ty == Type::Audio {
                    return Err(CompileError::parse(
                        format!("parameter '{name}' may not be Audio"),
                        pline,
                        pcol,
                    ));
                }
                params.push(Param {
                    name,
                    ty,
                    line: pline,
                    col: pcol,
                });
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after parameter list")?;
        self.expect(TokenKind::LBrace, "expected '{' to open function body")?;

        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            body.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace, "expected '}' to close function body")?;

        Ok(FunctionDef {
            params,
            body,
            line,
            col,
        })
    }

    // ---- statements -----------------------------------------------------

    fn parse_stmt(&mut self) -> Result<Stmt, CompileError> {
        match &self.peek().kind {
            TokenKind::Local => self.parse_local(),
            TokenKind::Print => self.parse_print(false),
            TokenKind::Println => self.parse_print(true),
            TokenKind::Output => self.parse_output(),
            TokenKind::Ident(_) if self.peek_next_is(TokenKind::Eq) => {
                let (name, line, col) = self.expect_ident("expected identifier")?;
                self.advance(); // consume '='
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, "expected ';' after assignment")?;
                Ok(Stmt::Assign {
                    name,
                    value,
                    line,
                    col,
                })
            }
            _ => {
                // A component call (or any expression) used as a statement;
                // its value is discarded.
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, "expected ';' after expression")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_local(&mut self) -> Result<Stmt, CompileError> {
        let kw = self.advance(); // consume 'local'
        let mut names = Vec::new();
        loop {
            let (name, _, _) = self.expect_ident("expected local variable name")?;
            names.push(name);
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::Colon, "expected ':' after local variable names")?;
        let ty = self.expect_type()?;
        self.expect(TokenKind::Eq, "expected '=' in local declaration")?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "expected ';' after local declaration")?;
        Ok(Stmt::Local {
            names,
            ty,
            init,
            line: kw.line,
            col: kw.col,
        })
    }

    fn parse_print(&mut self, newline: bool) -> Result<Stmt, CompileError> {
        let kw = self.advance(); // consume 'print' / 'println'
        self.expect(TokenKind::LParen, "expected '(' after print")?;
        let arg = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RParen, "expected ')' after print argument")?;
        self.expect(TokenKind::Semicolon, "expected ';' after print statement")?;
        Ok(Stmt::Print {
            arg,
            newline,
            line: kw.line,
            col: kw.col,
        })
    }

    fn parse_output(&mut self) -> Result<Stmt, CompileError> {
        let kw = self.advance(); // consume 'output'
        self.expect(TokenKind::LParen, "expected '(' after 'output'")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if args.is_empty() {
            return Err(CompileError::parse(
                "output requires at least one argument",
                kw.line,
                kw.col,
            ));
        }
        self.expect(TokenKind::RParen, "expected ')' after output arguments")?;
        self.expect(TokenKind::Semicolon, "expected ';' after output statement")?;
        Ok(Stmt::Output {
            args,
            line: kw.line,
            col: kw.col,
        })
    }

    // ---- expressions ----------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            let (line, col) = (lhs.line, lhs.col);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                line,
                col,
            );
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_factor()?;
            let (line, col) = (lhs.line, lhs.col);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                line,
                col,
            );
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, CompileError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Int(v) => {
                self.advance();
                Ok(Expr::new(ExprKind::Int(v), t.line, t.col))
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(Expr::new(ExprKind::Float(v), t.line, t.col))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::new(ExprKind::Str(s), t.line, t.col))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "expected ')' to close expression")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.check(TokenKind::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "expected ')' after call arguments")?;
                    let site = CallSiteId(self.next_call_site);
                    self.next_call_site += 1;
                    Ok(Expr::new(ExprKind::Call { name, args, site }, t.line, t.col))
                } else {
                    Ok(Expr::new(ExprKind::Var(name), t.line, t.col))
                }
            }
            _ => Err(CompileError::parse(
                format!("expected expression, got {:?}", t.kind),
                t.line,
                t.col,
            )),
        }
    }

    // ---- score ----------------------------------------------------------

    /// `Name(start duration init(args) perf(args));` — the `init`/`perf`
    /// argument lists may be omitted when the function takes no arguments,
    /// and may appear in either order.
    fn parse_score_event(&mut self) -> Result<ScoreEvent, CompileError> {
        let (instrument, line, col) = self.expect_ident("expected instrument name")?;
        self.expect(TokenKind::LParen, "expected '(' after instrument name")?;

        let start = self.expect_seconds("start time")?;
        let (duration, dline, dcol) = self.expect_seconds_at("duration")?;
        if duration <= 0.0 {
            return Err(CompileError::parse(
                format!("duration must be positive, got {duration}"),
                dline,
                dcol,
            ));
        }

        let mut init_args = None;
        let mut perf_args = None;

        while !self.check(TokenKind::RParen) {
            match &self.peek().kind {
                TokenKind::Init => {
                    let t = self.advance();
                    if init_args.is_some() {
                        return Err(CompileError::parse(
                            "duplicate init argument list in score event",
                            t.line,
                            t.col,
                        ));
                    }
                    init_args = Some(self.parse_score_args()?);
                }
                TokenKind::Perf => {
                    let t = self.advance();
                    if perf_args.is_some() {
                        return Err(CompileError::parse(
                            "duplicate perf argument list in score event",
                            t.line,
                            t.col,
                        ));
                    }
                    perf_args = Some(self.parse_score_args()?);
                }
                _ => {
                    let t = self.peek();
                    return Err(CompileError::parse(
                        format!("expected 'init', 'perf' or ')', got {:?}", t.kind),
                        t.line,
                        t.col,
                    ));
                }
            }
        }

        self.expect(TokenKind::RParen, "expected ')' to close score event")?;
        self.expect(TokenKind::Semicolon, "expected ';' after score event")?;

        Ok(ScoreEvent {
            instrument,
            start,
            duration,
            init_args: init_args.unwrap_or_default(),
            perf_args: perf_args.unwrap_or_default(),
            line,
            col,
        })
    }

    fn parse_score_args(&mut self) -> Result<Vec<ScoreArg>, CompileError> {
        self.expect(TokenKind::LParen, "expected '(' after init/perf")?;
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) {
            let t = self.peek().clone();
            let value = match t.kind {
                TokenKind::Int(v) => Literal::Int(v),
                TokenKind::Float(v) => Literal::Float(v),
                TokenKind::Str(s) => Literal::Str(s),
                _ => {
                    return Err(CompileError::parse(
                        format!("expected literal score argument, got {:?}", t.kind),
                        t.line,
                        t.col,
                    ));
                }
            };
            self.advance();
            args.push(ScoreArg {
                value,
                line: t.line,
                col: t.col,
            });
            if self.check(TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after score arguments")?;
        Ok(args)
    }

    fn expect_seconds(&mut self, what: &str) -> Result<f32, CompileError> {
        self.expect_seconds_at(what).map(|(v, _, _)| v)
    }

    fn expect_seconds_at(&mut self, what: &str) -> Result<(f32, usize, usize), CompileError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Float(v) => {
                self.advance();
                Ok((v, t.line, t.col))
            }
            TokenKind::Int(v) => {
                self.advance();
                Ok((v as f32, t.line, t.col))
            }
            _ => Err(CompileError::parse(
                format!("expected number for {what}, got {:?}", t.kind),
                t.line,
                t.col,
            )),
        }
    }

    // ---- helpers --------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next_is(&self, kind: TokenKind) -> bool {
        self.tokens
            .get(self.pos + 1)
            .is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(CompileError::parse(
                format!("{message}, got {:?}", t.kind),
                t.line,
                t.col,
            ))
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<(String, usize, usize), CompileError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, t.line, t.col))
            }
            _ => Err(CompileError::parse(
                format!("{message}, got {:?}", t.kind),
                t.line,
                t.col,
            )),
        }
    }

    fn expect_type(&mut self) -> Result<Type, CompileError> {
        let t = self.peek().clone();
        let ty = match t.kind {
            TokenKind::TyInt => Type::Int,
            TokenKind::TyFloat => Type::Float,
            TokenKind::TyString => Type::Str,
            TokenKind::TyAudio => Type::Audio,
            _ => {
                return Err(CompileError::parse(
                    format!("expected type name, got {:?}", t.kind),
                    t.line,
                    t.col,
                ));
            }
        };
        self.advance();
        Ok(ty)
    }
}
