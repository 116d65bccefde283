//! Request store - shared source of truth for help-request state.
//!
//! All request state lives in a [`RequestStore`]: a shared, subscribable
//! collection of [`HelpRequest`] records. Production deployments back it
//! with a realtime document store; [`MemoryRequestStore`] provides the same
//! contract in-process for tests and local runs.
//!
//! # Components
//!
//! - [`types`] - `HelpRequest`, `RequestStatus`, `RequestId`, change events
//! - [`interface`] - the `RequestStore` trait and `StoreError`
//! - [`memory`] - `DashMap`-backed implementation
//!
//! No engine component writes records directly; every mutation goes through
//! the lifecycle's guarded operations, which in turn use only this
//! interface.

mod interface;
mod memory;
mod types;

pub use interface::{RequestStore, StoreError};
pub use memory::{MemoryRequestStore, MemoryStoreConfig};
pub use types::{
    HelpRequest, NewHelpRequest, RequestChange, RequestId, RequestStatus, RequestUpdate,
    DEFAULT_MESSAGE,
};
