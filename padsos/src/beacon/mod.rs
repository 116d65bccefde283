//! Location beacon and shared location registry.
//!
//! Every participant runs a [`LocationBeacon`] that keeps their
//! [`LocationRecord`] fresh in the shared [`LocationRegistry`]; the ranking
//! layer reads the registry to place active requests by distance.
//!
//! # Components
//!
//! - [`LocationRegistry`] trait + [`MemoryLocationRegistry`] - one record
//!   per participant, full-snapshot subscriptions
//! - [`LocationSource`] trait + [`FixedLocationSource`] - device position
//!   abstraction
//! - [`LocationBeacon`] - the 30-second report loop with a
//!   [`BeaconHandle`] for deactivation
//!
//! Records are never evicted for age; consumers treat `captured_at` as a
//! quality signal.

mod registry;
mod reporter;
mod source;

pub use registry::{
    LocationRecord, LocationRegistry, MemoryLocationRegistry, MemoryRegistryConfig,
};
pub use reporter::{BeaconConfig, BeaconHandle, LocationBeacon};
pub use source::{BeaconError, FixedLocationSource, LocationSource};
