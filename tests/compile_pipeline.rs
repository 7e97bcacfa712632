//! End-to-end compilation tests: source text in, compiled program or a
//! full set of diagnostics out.

use cadenza::dsl::{self, ErrorKind, SemanticErrorKind};

#[test]
fn full_program_compiles() {
    let src = r#"
        // A two-instrument program exercising most of the grammar.
        instruments {
            Lead {
                freq: Float;
                init(note: Int) {
                    freq = Mtof(note);
                }
                perf(amps: Float) {
                    local env: Float = Adsr(0.01, 0.1, 0.7, 0.2, 1.0);
                    local sig: Audio = Oscil(amps, freq, 1) * env;
                    output(sig, sig);
                }
            }
            Hat {
                perf(level: Float) {
                    output(Noise(level), Noise(level));
                }
            }
        }
        score {
            Lead(0.0 1.0 init(60) perf(0.5));
            Lead(1.0 1.0 init(64) perf(0.5));
            Hat(0.5 0.1 perf(0.2));
        }
    "#;
    let compiled = dsl::compile(src).expect("program should compile");
    assert_eq!(compiled.channels, 2);
    assert_eq!(compiled.program.instruments.len(), 2);
    assert_eq!(compiled.program.score.len(), 3);
}

#[test]
fn both_blocks_are_optional() {
    assert!(dsl::compile("").is_ok());
    assert!(dsl::compile("instruments {}").is_ok());
    assert!(dsl::compile("score {}").is_ok());
}

#[test]
fn lex_error_reports_position() {
    let errors = dsl::compile("instruments {\n  @ }").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::LexError);
    assert_eq!(errors[0].line, 2);
    assert_eq!(errors[0].col, 3);
}

#[test]
fn parse_error_aborts_before_semantic_checks() {
    // The undeclared identifier inside the body is never reached; the
    // missing brace is the only diagnostic.
    let errors = dsl::compile("instruments { V { perf() { output(ghost); }").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::ParseError);
}

#[test]
fn semantic_errors_all_reported_in_one_pass() {
    let src = r#"
        instruments {
            V {
                perf() {
                    output(nothere);
                    output(Blorp(1.0));
                    output("text");
                }
            }
        }
        score { Ghost(0.0 1.0); }
    "#;
    let errors = dsl::compile(src).unwrap_err();
    let kinds: Vec<_> = errors.iter().filter_map(|e| e.semantic_kind()).collect();
    assert_eq!(errors.len(), 4);
    assert!(kinds.contains(&SemanticErrorKind::UndeclaredIdentifier));
    assert!(kinds.contains(&SemanticErrorKind::UnknownComponent));
    assert!(kinds.contains(&SemanticErrorKind::TypeMismatch));
    assert!(kinds.contains(&SemanticErrorKind::UndeclaredInstrument));
}

#[test]
fn output_in_init_is_a_semantic_error() {
    let src = r#"
        instruments {
            V {
                init() { output(1.0); }
                perf() { output(1.0); }
            }
        }
        score { V(0.0 1.0 init() perf()); }
    "#;
    let errors = dsl::compile(src).unwrap_err();
    assert_eq!(
        errors[0].semantic_kind(),
        Some(SemanticErrorKind::InvalidOutputInInit)
    );
}

#[test]
fn score_event_argument_checking() {
    let src = r#"
        instruments {
            V {
                init(note: Int, gain: Float) {}
                perf() { output(0.0); }
            }
        }
        score { V(0.0 1.0 init(60) perf()); }
    "#;
    let errors = dsl::compile(src).unwrap_err();
    assert_eq!(
        errors[0].semantic_kind(),
        Some(SemanticErrorKind::ArityMismatch)
    );
}

#[test]
fn diagnostics_render_with_position_and_kind() {
    let errors = dsl::compile("score { Ghost(0.0 1.0); }").unwrap_err();
    let text = errors[0].to_string();
    assert!(text.starts_with("[1:9]"), "got: {text}");
    assert!(text.contains("UndeclaredInstrument"));
    assert!(text.contains("Ghost"));
}

#[test]
fn comments_are_ignored_everywhere() {
    let src = r#"
        // leading comment
        instruments { // trailing
            V { perf() { output(0.0); } } // here too
        }
        score {} // and here
    "#;
    assert!(dsl::compile(src).is_ok());
}
