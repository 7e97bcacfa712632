//! Runtime errors raised while rendering a score.

use thiserror::Error;

/// What went wrong inside a single evaluation step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderErrorKind {
    #[error("division by zero")]
    DivisionByZero,

    #[error("component '{0}' has no state for this call site")]
    UndefinedComponentState(String),

    #[error("{0}")]
    ScoreReference(String),
}

/// A runtime error with enough context to point at the offending score
/// event. Rendering aborts on the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event {event} ({instrument}) at sample {sample}: {kind}")]
pub struct RenderError {
    pub kind: RenderErrorKind,
    /// Zero-based index of the score event whose voice raised the error.
    pub event: usize,
    pub instrument: String,
    /// Absolute sample position in the render when the error occurred.
    pub sample: u64,
}
