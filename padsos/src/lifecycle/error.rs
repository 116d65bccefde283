//! Engine error surface.

use thiserror::Error;

use crate::beacon::BeaconError;
use crate::geo::GeoError;
use crate::identity::{IdentityError, ParticipantId};
use crate::store::{RequestId, RequestStatus, StoreError};

/// Errors surfaced by engine operations.
///
/// The guard errors (`DuplicateActiveRequest`, `NotAuthorized`,
/// `InvalidTransition`, `AlreadyAccepted`) are expected outcomes of
/// concurrent use and must be surfaced to the caller verbatim, never
/// retried automatically. The transient ones (`LocationUnavailable`,
/// `StoreUnavailable`) leave state untouched and are retried only by the
/// schedules that own them. Nothing here is fatal to the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Coordinates were non-finite or out of range.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] GeoError),

    /// No usable position for the participant.
    #[error("location unavailable: {0}")]
    LocationUnavailable(#[from] BeaconError),

    /// The participant already has a pending or accepted request.
    #[error("participant {participant} already has an active help request")]
    DuplicateActiveRequest { participant: ParticipantId },

    /// The participant may not perform this operation on this request.
    #[error("participant {participant} is not authorized to {action} request {id}")]
    NotAuthorized {
        participant: ParticipantId,
        action: &'static str,
        id: RequestId,
    },

    /// The request is not in the status the operation requires.
    ///
    /// `found` is `None` when the record no longer exists at all.
    #[error("request {id} is {found:?}, operation requires {expected}")]
    InvalidTransition {
        id: RequestId,
        expected: RequestStatus,
        found: Option<RequestStatus>,
    },

    /// Another helper won the acceptance race. Terminal: the race is
    /// resolved and retrying would be incorrect.
    #[error("request {0} was already accepted by another helper")]
    AlreadyAccepted(RequestId),

    /// No participant id available from the identity collaborator.
    #[error(transparent)]
    Unauthenticated(#[from] IdentityError),

    /// The backing document store is unreachable.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}
