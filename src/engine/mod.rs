//! The rendering engine: runtime values, the per-event voice evaluator,
//! the output bus, and the deterministic scheduler.

pub mod bus;
pub mod error;
pub mod scheduler;
pub mod value;
pub mod voice;

pub use bus::OutputBus;
pub use error::{RenderError, RenderErrorKind};
pub use scheduler::{render, RenderConfig, RenderOutput};
pub use value::Value;
pub use voice::TraceEntry;
