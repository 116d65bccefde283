//! Request lifecycle - the coordination engine's state machine.
//!
//! [`RequestLifecycle`] owns every transition a help request can make and
//! the guards that keep concurrent participants consistent: one active
//! request per participant, first-writer-wins acceptance, and
//! requester-only cancel/resolve. Completed transitions are broadcast as
//! [`LifecycleEvent`]s for the notification layer.
//!
//! # Components
//!
//! - [`engine`] - `RequestLifecycle` and its guarded operations
//! - [`events`] - `LifecycleEvent` broadcast payloads
//! - [`error`] - `EngineError`, the engine's whole error surface

mod engine;
mod error;
mod events;

pub use engine::{LifecycleConfig, RequestLifecycle};
pub use error::EngineError;
pub use events::LifecycleEvent;
