//! Cadenza: a compiler and sample-accurate polyphonic renderer for a small
//! orchestra/score audio language.
//!
//! A source file has two optional blocks. `instruments` defines named
//! instruments with persistent member variables and `init`/`perf`
//! functions; `score` schedules timed events that instantiate them. The
//! engine renders the score offline into a multi-channel buffer, one perf
//! invocation per output sample, and the result is a pure function of the
//! program and the render seed.
//!
//! ```no_run
//! let source = r#"
//!     instruments {
//!         Tone {
//!             freq: Float;
//!             init(note: Int) { freq = Mtof(note); }
//!             perf(amps: Float) { output(Sine(amps, freq)); }
//!         }
//!     }
//!     score { Tone(0.0 1.0 init(69) perf(0.5)); }
//! "#;
//! let compiled = cadenza::dsl::compile(source).expect("compile");
//! let out = cadenza::engine::render(&compiled, cadenza::engine::RenderConfig::default())
//!     .expect("render");
//! assert_eq!(out.bus.len(), 44100);
//! ```

pub mod component;
pub mod dsl;
pub mod engine;
pub mod wav;
