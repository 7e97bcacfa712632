//! The Cadenza language front end: lexer, parser, AST, and semantic
//! analysis, with a single [`compile`] entry point.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod sema;
pub mod token;

pub use error::{CompileError, ErrorKind, SemanticErrorKind};
pub use sema::Analysis;

use ast::Program;
use lexer::Lexer;
use parser::Parser;

/// A program that passed every compile-time check, ready to render.
#[derive(Debug)]
pub struct CompiledProgram {
    pub program: Program,
    /// Output channel count, derived from the widest `output` statement.
    pub channels: usize,
}

/// Lex and parse only; no semantic checks.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}

/// Compile a source file. Lex and parse errors abort immediately and come
/// back as a single error; semantic errors are collected and all reported.
pub fn compile(source: &str) -> Result<CompiledProgram, Vec<CompileError>> {
    let mut program = parse(source).map_err(|e| vec![e])?;
    let analysis = sema::analyze(&mut program)?;
    Ok(CompiledProgram {
        program,
        channels: analysis.channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_reports_lex_error() {
        let errors = compile("instruments { V { perf() { local x: Float = 1.; } } }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::LexError);
    }

    #[test]
    fn compile_reports_parse_error() {
        let errors = compile("instruments { V {").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ParseError);
    }

    #[test]
    fn compile_collects_semantic_errors() {
        let src = r#"
            instruments { V { perf() { output(a); output(b); } } }
            score {}
        "#;
        let errors = compile(src).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn compile_valid_program() {
        let src = r#"
            instruments {
                Tone {
                    init() {}
                    perf() { output(Sine(0.5, 440.0), Sine(0.5, 441.0)); }
                }
            }
            score { Tone(0.0 1.0 init() perf()); }
        "#;
        let compiled = compile(src).unwrap();
        assert_eq!(compiled.channels, 2);
        assert_eq!(compiled.program.instruments.len(), 1);
        assert_eq!(compiled.program.score.len(), 1);
    }
}
