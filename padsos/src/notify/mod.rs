//! Notification bridge - lifecycle transitions as user-facing alerts.
//!
//! Maps [`LifecycleEvent`]s to the messages participants actually see and
//! hands them to a [`NotificationSink`]. Delivery is strictly best-effort:
//! a failed delivery is logged and dropped, and never rolls back or delays
//! the state transition that produced it.
//!
//! # Components
//!
//! - [`Notification`] / [`NotificationSink`] - the delivery seam
//! - [`LogSink`] - default sink, emits via `tracing`
//! - [`NotificationBridge`] - the event-consuming task

mod bridge;
mod sink;

pub use bridge::{NotificationBridge, notifications_for};
pub use sink::{DeliveryError, LogSink, Notification, NotificationSink};
