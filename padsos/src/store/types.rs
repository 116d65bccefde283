//! Help-request record types.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::geo::Coordinates;
use crate::identity::ParticipantId;

/// Default message attached to a new help request.
pub const DEFAULT_MESSAGE: &str = "I need help!";

/// Store-assigned opaque request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// Wrap a raw id value assigned by the store.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Lifecycle status of a help request.
///
/// `Pending` is the only state with an outgoing forward edge
/// (`Pending -> Accepted`); `Cancelled` and `Resolved` are terminal, and
/// `Accepted` is terminal for everyone but the requester (who may still
/// resolve it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    /// Created, waiting for a helper.
    Pending,
    /// Exactly one helper has committed to this request.
    Accepted,
    /// Withdrawn by the requester before acceptance.
    Cancelled,
    /// The requester confirmed that help arrived.
    Resolved,
}

impl RequestStatus {
    /// Whether the request belongs in the active (ranked, subscribed) view.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }

    /// Whether the status permits no further mutation by this engine.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Resolved)
    }

    /// Monotonic ordering rank.
    ///
    /// Every legal transition strictly increases the rank, which is what
    /// lets subscribers assert they never observe a status regression.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Accepted => 1,
            Self::Cancelled => 2,
            Self::Resolved => 2,
        }
    }

    /// Lowercase wire name, as stored by the document collaborator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Cancelled => "cancelled",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A help request record, as held by the request store.
///
/// `coords` is a snapshot captured when the request was created; it is not
/// live-updated as the requester moves.
#[derive(Debug, Clone, PartialEq)]
pub struct HelpRequest {
    /// Store-assigned id.
    pub id: RequestId,
    /// Participant who asked for help.
    pub requester: ParticipantId,
    /// Requester position at creation time.
    pub coords: Coordinates,
    /// Free-text message shown to helpers.
    pub message: String,
    /// Current lifecycle status.
    pub status: RequestStatus,
    /// The single helper who accepted, once status is `Accepted`.
    pub accepted_by: Option<ParticipantId>,
    /// Store-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a request.
///
/// The store assigns `id`, `created_at`, and the initial `Pending` status.
#[derive(Debug, Clone)]
pub struct NewHelpRequest {
    pub requester: ParticipantId,
    pub coords: Coordinates,
    pub message: String,
}

impl NewHelpRequest {
    /// New request with the default message.
    pub fn new(requester: ParticipantId, coords: Coordinates) -> Self {
        Self {
            requester,
            coords,
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

/// A status mutation applied through the conditional update.
///
/// Modeled as an enum rather than loose fields so `accepted_by` can only be
/// written together with the `Accepted` status.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestUpdate {
    /// `Pending -> Accepted`, recording the winning helper.
    Accepted { by: ParticipantId },
    /// `Pending -> Cancelled`.
    Cancelled,
    /// `Accepted -> Resolved`.
    Resolved,
}

impl RequestUpdate {
    /// The status this update writes.
    pub fn status(&self) -> RequestStatus {
        match self {
            Self::Accepted { .. } => RequestStatus::Accepted,
            Self::Cancelled => RequestStatus::Cancelled,
            Self::Resolved => RequestStatus::Resolved,
        }
    }
}

/// One entry in the active-view change stream.
///
/// The stream covers the active view only: records enter it with `Added`,
/// change within it with `Updated`, and leave it with `Removed` (terminal
/// transition or deletion). Mirrors document-change feeds that filter on
/// status equality.
#[derive(Debug, Clone)]
pub enum RequestChange {
    /// A new pending request entered the active view.
    Added(HelpRequest),
    /// An active request changed while staying active.
    Updated(HelpRequest),
    /// A request left the active view, carrying its final status.
    Removed { id: RequestId, status: RequestStatus },
}

impl RequestChange {
    /// The id of the affected request.
    pub fn id(&self) -> RequestId {
        match self {
            Self::Added(request) | Self::Updated(request) => request.id,
            Self::Removed { id, .. } => *id,
        }
    }

    /// The status carried by this change.
    pub fn status(&self) -> RequestStatus {
        match self {
            Self::Added(request) | Self::Updated(request) => request.status,
            Self::Removed { status, .. } => *status,
        }
    }
}
