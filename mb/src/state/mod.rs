//! Durable conversation state with actor pattern
//!
//! StateManager owns the SessionStore and processes commands via channels,
//! serializing every read and write through one task. A `put` only returns
//! once the snapshot is flushed, so callers can treat a successful reply as
//! a committed transition.

mod manager;
mod messages;

pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateResponse};
