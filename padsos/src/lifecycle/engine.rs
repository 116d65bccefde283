//! Request lifecycle state machine.
//!
//! Governs every transition a help request can make:
//!
//! ```text
//! (create) -> pending -> accepted -> resolved
//!                    \-> cancelled
//! ```
//!
//! Acceptance is the only transition with true concurrent contention
//! (several nearby helpers may tap "help" within the same instant), so it
//! is the only one that needs the store's compare-and-swap for
//! correctness. Cancel and resolve are restricted to the requester by the
//! authorization guard and therefore single-writer, but they go through
//! the same CAS so a lost race (a helper accepting while the requester
//! cancels) is detected rather than overwritten.
//!
//! Accepted requests stay in the store as a real, queryable state; the
//! record leaves the active view at `resolve`, not at acceptance.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::error::EngineError;
use super::events::LifecycleEvent;
use crate::geo::Coordinates;
use crate::identity::ParticipantId;
use crate::store::{
    HelpRequest, NewHelpRequest, RequestId, RequestStatus, RequestStore, RequestUpdate,
};

/// Configuration for the lifecycle engine.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Capacity of the lifecycle event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: 64,
        }
    }
}

/// The help-request state machine.
///
/// All operations take explicit participant ids; the engine holds no
/// ambient session state. Shared via `Clone` (cheap, `Arc` inside).
#[derive(Clone)]
pub struct RequestLifecycle {
    store: Arc<dyn RequestStore>,
    event_tx: broadcast::Sender<LifecycleEvent>,
}

impl RequestLifecycle {
    /// Create an engine over the given store.
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self::with_config(store, LifecycleConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(store: Arc<dyn RequestStore>, config: LifecycleConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        Self { store, event_tx }
    }

    /// Subscribe to lifecycle transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.event_tx.subscribe()
    }

    /// Create a new help request for `requester` at `coords`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidCoordinate`] for bad coordinates
    /// - [`EngineError::DuplicateActiveRequest`] if the requester already
    ///   has a pending or accepted request
    /// - [`EngineError::StoreUnavailable`] on store partition
    pub fn request_help(
        &self,
        requester: &ParticipantId,
        coords: Coordinates,
    ) -> Result<HelpRequest, EngineError> {
        coords.validate()?;

        // One active request per participant. Enforced here, not by the
        // store: only the requester's own process runs this path, so the
        // check-then-create window is not contended.
        let already_active = self
            .store
            .active_requests()?
            .iter()
            .any(|request| request.requester == *requester);
        if already_active {
            return Err(EngineError::DuplicateActiveRequest {
                participant: requester.clone(),
            });
        }

        let record = self
            .store
            .create(NewHelpRequest::new(requester.clone(), coords))?;

        tracing::info!(
            request = %record.id,
            requester = %requester,
            coords = %coords,
            "help request created"
        );
        self.emit(LifecycleEvent::Created {
            request: record.clone(),
        });
        Ok(record)
    }

    /// Cancel a pending request. Requester only.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotAuthorized`] unless `by` is the requester
    /// - [`EngineError::InvalidTransition`] unless the request is pending
    ///   (a vanished record counts as not pending); a helper accepting
    ///   while the cancel is in flight surfaces here with the accepted
    ///   status as `found`
    pub fn cancel(&self, id: RequestId, by: &ParticipantId) -> Result<(), EngineError> {
        let record = self.require(id, RequestStatus::Pending)?;
        if record.requester != *by {
            return Err(EngineError::NotAuthorized {
                participant: by.clone(),
                action: "cancel",
                id,
            });
        }
        if record.status != RequestStatus::Pending {
            return Err(EngineError::InvalidTransition {
                id,
                expected: RequestStatus::Pending,
                found: Some(record.status),
            });
        }

        if !self
            .store
            .conditional_update(id, RequestStatus::Pending, RequestUpdate::Cancelled)?
        {
            return Err(self.transition_failure(id, RequestStatus::Pending));
        }

        let mut cancelled = record;
        cancelled.status = RequestStatus::Cancelled;

        tracing::info!(request = %id, requester = %by, "help request cancelled");
        self.emit(LifecycleEvent::Cancelled { request: cancelled });
        Ok(())
    }

    /// Accept a pending request on behalf of `by`.
    ///
    /// First writer wins: of all concurrent acceptors exactly one
    /// succeeds, and the rest get [`EngineError::AlreadyAccepted`]. That
    /// error is terminal; the race is resolved and retrying would be
    /// incorrect.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotAuthorized`] if `by` is the requester (you
    ///   cannot accept your own request)
    /// - [`EngineError::AlreadyAccepted`] when another helper won
    /// - [`EngineError::InvalidTransition`] when the request is already
    ///   terminal or gone
    pub fn accept(&self, id: RequestId, by: &ParticipantId) -> Result<HelpRequest, EngineError> {
        let record = self.require(id, RequestStatus::Pending)?;
        if record.requester == *by {
            return Err(EngineError::NotAuthorized {
                participant: by.clone(),
                action: "accept",
                id,
            });
        }

        let won = self.store.conditional_update(
            id,
            RequestStatus::Pending,
            RequestUpdate::Accepted { by: by.clone() },
        )?;
        if !won {
            return Err(self.race_outcome(id, RequestStatus::Pending));
        }

        let mut accepted = record;
        accepted.status = RequestStatus::Accepted;
        accepted.accepted_by = Some(by.clone());

        tracing::info!(
            request = %id,
            requester = %accepted.requester,
            acceptor = %by,
            "help request accepted"
        );
        self.emit(LifecycleEvent::Accepted {
            request: accepted.clone(),
        });
        Ok(accepted)
    }

    /// Mark an accepted request as resolved (help was received).
    /// Requester only; this is when the record leaves the active view.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotAuthorized`] unless `by` is the requester
    /// - [`EngineError::InvalidTransition`] unless the request is accepted
    pub fn resolve(&self, id: RequestId, by: &ParticipantId) -> Result<(), EngineError> {
        let record = self.require(id, RequestStatus::Accepted)?;
        if record.requester != *by {
            return Err(EngineError::NotAuthorized {
                participant: by.clone(),
                action: "resolve",
                id,
            });
        }
        if record.status != RequestStatus::Accepted {
            return Err(EngineError::InvalidTransition {
                id,
                expected: RequestStatus::Accepted,
                found: Some(record.status),
            });
        }

        if !self
            .store
            .conditional_update(id, RequestStatus::Accepted, RequestUpdate::Resolved)?
        {
            return Err(self.transition_failure(id, RequestStatus::Accepted));
        }

        let mut resolved = record;
        resolved.status = RequestStatus::Resolved;

        tracing::info!(request = %id, requester = %by, "help request resolved");
        self.emit(LifecycleEvent::Resolved { request: resolved });
        Ok(())
    }

    /// Fetch the record or fail with the transition error for `expected`.
    fn require(&self, id: RequestId, expected: RequestStatus) -> Result<HelpRequest, EngineError> {
        self.store
            .get(id)?
            .ok_or(EngineError::InvalidTransition {
                id,
                expected,
                found: None,
            })
    }

    /// Classify a rejected accept CAS by re-reading the record.
    ///
    /// Status is monotonic per record, so the re-read can only observe
    /// the state that beat us or a later one: `Accepted` means another
    /// helper won the race; anything else means the request is terminal
    /// or gone. `AlreadyAccepted` belongs to accept alone; cancel and
    /// resolve report their races through [`Self::transition_failure`].
    fn race_outcome(&self, id: RequestId, expected: RequestStatus) -> EngineError {
        match self.store.get(id) {
            Ok(Some(record)) if record.status == RequestStatus::Accepted => {
                EngineError::AlreadyAccepted(id)
            }
            Ok(record) => EngineError::InvalidTransition {
                id,
                expected,
                found: record.map(|r| r.status),
            },
            Err(error) => error.into(),
        }
    }

    /// Rejected CAS on a single-writer transition: report whatever status
    /// got there first.
    fn transition_failure(&self, id: RequestId, expected: RequestStatus) -> EngineError {
        match self.store.get(id) {
            Ok(record) => EngineError::InvalidTransition {
                id,
                expected,
                found: record.map(|r| r.status),
            },
            Err(error) => error.into(),
        }
    }

    fn emit(&self, event: LifecycleEvent) {
        // No subscribers is fine; events are best-effort fan-out. Sent
        // after the CAS and outside the store's entry lock, so two rapid
        // transitions can broadcast out of order here; the store's change
        // stream is the strictly ordered feed, and these events only
        // drive notifications.
        let _ = self.event_tx.send(event);
    }
}
