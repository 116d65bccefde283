//! Lifecycle transition events.

use crate::store::HelpRequest;

/// A completed lifecycle transition, broadcast to subscribers.
///
/// Events carry the record as it stood after the transition; for
/// `Accepted` that means `accepted_by` is populated.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A request was created in `Pending`.
    Created { request: HelpRequest },
    /// Exactly one helper accepted the request.
    Accepted { request: HelpRequest },
    /// The requester withdrew the request before acceptance.
    Cancelled { request: HelpRequest },
    /// The requester confirmed help was received.
    Resolved { request: HelpRequest },
}

impl LifecycleEvent {
    /// The request the event is about.
    pub fn request(&self) -> &HelpRequest {
        match self {
            Self::Created { request }
            | Self::Accepted { request }
            | Self::Cancelled { request }
            | Self::Resolved { request } => request,
        }
    }
}
