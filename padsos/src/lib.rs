//! PadSOS - proximity help-request coordination engine
//!
//! Lets a participant in urgent need broadcast a help request to nearby
//! users and have exactly one of them accept it, while every participant's
//! approximate location is kept current for proximity ranking.
//!
//! # Architecture
//!
//! Leaf-first:
//!
//! - [`geo`] - haversine distance between coordinate pairs
//! - [`identity`] - external identity collaborator seam (ids, names)
//! - [`store`] - shared source of truth for help-request records; its
//!   conditional update is the engine's single synchronization point
//! - [`beacon`] - periodic location reporting into a shared registry
//! - [`lifecycle`] - the request state machine and its concurrency guards
//! - [`ranker`] - distance-sorted active-request views per viewer
//! - [`notify`] - best-effort translation of transitions into alerts
//! - [`logging`] - tracing subscriber setup
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use padsos::geo::Coordinates;
//! use padsos::identity::ParticipantId;
//! use padsos::lifecycle::RequestLifecycle;
//! use padsos::store::MemoryRequestStore;
//!
//! let engine = RequestLifecycle::new(Arc::new(MemoryRequestStore::new()));
//!
//! let amira = ParticipantId::from("amira");
//! let bindi = ParticipantId::from("bindi");
//!
//! let request = engine
//!     .request_help(&amira, Coordinates::new(37.788, -122.432).unwrap())
//!     .unwrap();
//! let accepted = engine.accept(request.id, &bindi).unwrap();
//! assert_eq!(accepted.accepted_by, Some(bindi));
//!
//! engine.resolve(request.id, &amira).unwrap();
//! ```

pub mod beacon;
pub mod geo;
pub mod identity;
pub mod lifecycle;
pub mod logging;
pub mod notify;
pub mod ranker;
pub mod store;

/// Version of the PadSOS library, injected from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
