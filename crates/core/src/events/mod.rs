//! Relay events module.
//!
//! Provides the events the relay surfaces to JS, the sink trait every
//! emission goes through, and the listener registry backing
//! `addListener`/`removeListener`.

mod emitter;
mod relay_event;
mod sink;

pub use emitter::*;
pub use relay_event::*;
pub use sink::*;
