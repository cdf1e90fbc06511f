//! Event system: observer trait with no-op defaults, plus a dispatcher.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::{NoOpHandler, RatchetEventHandler};
pub use types::*;
