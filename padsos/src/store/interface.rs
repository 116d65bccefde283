//! Request store contract.
//!
//! The store is an external document-store collaborator; this trait pins
//! down exactly what the engine relies on. The one primitive with real
//! teeth is [`RequestStore::conditional_update`]: an atomic compare-and-swap
//! on the record's status. It is the single synchronization point of the
//! whole engine and what makes concurrent acceptance race-safe.

use thiserror::Error;
use tokio::sync::broadcast;

use super::types::{
    HelpRequest, NewHelpRequest, RequestChange, RequestId, RequestStatus, RequestUpdate,
};

/// Errors from the backing document store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Network partition from the store; no writes are cached across it.
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Contract for the document-store collaborator backing help requests.
///
/// Implementations must make `conditional_update` atomic with respect to
/// concurrent callers, and must keep the per-id status observed on the
/// change stream monotonic (no subscriber ever sees a status regression).
pub trait RequestStore: Send + Sync {
    /// Create a new record in `Pending` status.
    ///
    /// The store assigns the id and creation timestamp and returns the
    /// complete record.
    fn create(&self, new: NewHelpRequest) -> Result<HelpRequest, StoreError>;

    /// Compare-and-swap on the record's status.
    ///
    /// Applies `update` and returns `Ok(true)` only if the stored status
    /// currently equals `expected`; returns `Ok(false)` without any
    /// mutation otherwise. A missing record also yields `Ok(false)`.
    fn conditional_update(
        &self,
        id: RequestId,
        expected: RequestStatus,
        update: RequestUpdate,
    ) -> Result<bool, StoreError>;

    /// Delete a record outright.
    ///
    /// Retention hook for the collaborator's policy; the engine itself
    /// only requires terminal records to leave the active view.
    fn delete(&self, id: RequestId) -> Result<(), StoreError>;

    /// Fetch a single record.
    fn get(&self, id: RequestId) -> Result<Option<HelpRequest>, StoreError>;

    /// Snapshot of all records in an active status (`pending`, `accepted`).
    fn active_requests(&self) -> Result<Vec<HelpRequest>, StoreError>;

    /// Subscribe to the active-view change stream.
    ///
    /// Dropping the receiver unsubscribes; doing so is idempotent.
    fn subscribe(&self) -> broadcast::Receiver<RequestChange>;
}
