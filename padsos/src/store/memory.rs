//! In-memory request store.
//!
//! Backs the [`RequestStore`] contract with a `DashMap`. Every mutation,
//! creation included, publishes its change event while the record's entry
//! guard is still held, so the change stream's per-id order always matches
//! mutation order. That is the entire monotonicity argument: statuses only
//! move up in rank, and events per id are emitted in the order the ranks
//! were written.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::broadcast;

use super::interface::{RequestStore, StoreError};
use super::types::{
    HelpRequest, NewHelpRequest, RequestChange, RequestId, RequestStatus, RequestUpdate,
};

/// Configuration for the in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Capacity of the change-stream broadcast channel.
    pub change_channel_capacity: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            change_channel_capacity: 256,
        }
    }
}

/// In-memory implementation of the request store.
///
/// Terminal records are retained in the map (they have left the active
/// view, which is all the engine requires); [`RequestStore::delete`] is the
/// retention hook that actually drops them.
pub struct MemoryRequestStore {
    records: DashMap<RequestId, HelpRequest>,
    next_id: AtomicU64,
    change_tx: broadcast::Sender<RequestChange>,
}

impl MemoryRequestStore {
    /// Create an empty store with default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Create an empty store with custom configuration.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        let (change_tx, _) = broadcast::channel(config.change_channel_capacity);
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
            change_tx,
        }
    }

    /// Total number of records held, terminal ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStore for MemoryRequestStore {
    fn create(&self, new: NewHelpRequest) -> Result<HelpRequest, StoreError> {
        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = HelpRequest {
            id,
            requester: new.requester,
            coords: new.coords,
            message: new.message,
            status: RequestStatus::Pending,
            accepted_by: None,
            created_at: Utc::now(),
        };
        // Insert and publish under the entry guard, same as
        // conditional_update: a competitor that finds the record cannot
        // get its own change onto the stream before the Added event.
        let entry = self.records.entry(id).insert(record.clone());
        let _ = self.change_tx.send(RequestChange::Added(record.clone()));
        drop(entry);

        tracing::debug!(request = %id, requester = %record.requester, "request record created");
        Ok(record)
    }

    fn conditional_update(
        &self,
        id: RequestId,
        expected: RequestStatus,
        update: RequestUpdate,
    ) -> Result<bool, StoreError> {
        let Some(mut entry) = self.records.get_mut(&id) else {
            return Ok(false);
        };
        if entry.status != expected {
            tracing::trace!(
                request = %id,
                expected = %expected,
                found = %entry.status,
                "conditional update rejected"
            );
            return Ok(false);
        }

        match update {
            RequestUpdate::Accepted { by } => {
                entry.status = RequestStatus::Accepted;
                entry.accepted_by = Some(by);
            }
            RequestUpdate::Cancelled => entry.status = RequestStatus::Cancelled,
            RequestUpdate::Resolved => entry.status = RequestStatus::Resolved,
        }

        let change = if entry.status.is_active() {
            RequestChange::Updated(entry.value().clone())
        } else {
            RequestChange::Removed {
                id,
                status: entry.status,
            }
        };
        // Published while the entry lock is held; per-id event order is
        // therefore mutation order.
        let _ = self.change_tx.send(change);

        tracing::debug!(request = %id, status = %entry.status, "request record updated");
        Ok(true)
    }

    fn delete(&self, id: RequestId) -> Result<(), StoreError> {
        if let Some((_, record)) = self.records.remove(&id) {
            if record.status.is_active() {
                let _ = self.change_tx.send(RequestChange::Removed {
                    id,
                    status: record.status,
                });
            }
            tracing::debug!(request = %id, "request record deleted");
        }
        Ok(())
    }

    fn get(&self, id: RequestId) -> Result<Option<HelpRequest>, StoreError> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    fn active_requests(&self) -> Result<Vec<HelpRequest>, StoreError> {
        let mut active: Vec<HelpRequest> = self
            .records
            .iter()
            .filter(|entry| entry.status.is_active())
            .map(|entry| entry.value().clone())
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(active)
    }

    fn subscribe(&self) -> broadcast::Receiver<RequestChange> {
        self.change_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::identity::ParticipantId;

    fn new_request(requester: &str) -> NewHelpRequest {
        NewHelpRequest::new(
            ParticipantId::from(requester),
            Coordinates::new(0.0, 0.0).unwrap(),
        )
    }

    #[test]
    fn test_create_assigns_id_and_pending_status() {
        let store = MemoryRequestStore::new();

        let record = store.create(new_request("alice")).unwrap();
        assert_eq!(record.status, RequestStatus::Pending);
        assert_eq!(record.accepted_by, None);
        assert_eq!(record.message, crate::store::DEFAULT_MESSAGE);

        let other = store.create(new_request("bob")).unwrap();
        assert_ne!(record.id, other.id);
    }

    #[test]
    fn test_conditional_update_applies_on_match() {
        let store = MemoryRequestStore::new();
        let record = store.create(new_request("alice")).unwrap();

        let applied = store
            .conditional_update(
                record.id,
                RequestStatus::Pending,
                RequestUpdate::Accepted {
                    by: ParticipantId::from("bob"),
                },
            )
            .unwrap();
        assert!(applied);

        let stored = store.get(record.id).unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Accepted);
        assert_eq!(stored.accepted_by, Some(ParticipantId::from("bob")));
    }

    #[test]
    fn test_conditional_update_rejects_on_mismatch_without_mutation() {
        let store = MemoryRequestStore::new();
        let record = store.create(new_request("alice")).unwrap();

        store
            .conditional_update(
                record.id,
                RequestStatus::Pending,
                RequestUpdate::Accepted {
                    by: ParticipantId::from("bob"),
                },
            )
            .unwrap();

        // Second CAS against Pending must fail and leave the winner intact.
        let applied = store
            .conditional_update(
                record.id,
                RequestStatus::Pending,
                RequestUpdate::Accepted {
                    by: ParticipantId::from("carol"),
                },
            )
            .unwrap();
        assert!(!applied);

        let stored = store.get(record.id).unwrap().unwrap();
        assert_eq!(stored.accepted_by, Some(ParticipantId::from("bob")));
    }

    #[test]
    fn test_conditional_update_on_missing_record_is_false() {
        let store = MemoryRequestStore::new();
        let applied = store
            .conditional_update(
                RequestId::new(999),
                RequestStatus::Pending,
                RequestUpdate::Cancelled,
            )
            .unwrap();
        assert!(!applied);
    }

    #[test]
    fn test_active_requests_excludes_terminal() {
        let store = MemoryRequestStore::new();
        let first = store.create(new_request("alice")).unwrap();
        let second = store.create(new_request("bob")).unwrap();

        store
            .conditional_update(first.id, RequestStatus::Pending, RequestUpdate::Cancelled)
            .unwrap();

        let active = store.active_requests().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        // The cancelled record is retained until deleted.
        assert_eq!(store.len(), 2);
        store.delete(first.id).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_change_stream_added_updated_removed() {
        let store = MemoryRequestStore::new();
        let mut changes = store.subscribe();

        let record = store.create(new_request("alice")).unwrap();
        let change = changes.try_recv().unwrap();
        assert!(matches!(change, RequestChange::Added(_)));

        store
            .conditional_update(
                record.id,
                RequestStatus::Pending,
                RequestUpdate::Accepted {
                    by: ParticipantId::from("bob"),
                },
            )
            .unwrap();
        let change = changes.try_recv().unwrap();
        assert!(matches!(change, RequestChange::Updated(_)));
        assert_eq!(change.status(), RequestStatus::Accepted);

        store
            .conditional_update(record.id, RequestStatus::Accepted, RequestUpdate::Resolved)
            .unwrap();
        let change = changes.try_recv().unwrap();
        assert!(matches!(change, RequestChange::Removed { .. }));
        assert_eq!(change.status(), RequestStatus::Resolved);
    }

    #[test]
    fn test_per_id_status_is_monotonic_on_stream() {
        let store = MemoryRequestStore::new();
        let mut changes = store.subscribe();

        let record = store.create(new_request("alice")).unwrap();
        store
            .conditional_update(
                record.id,
                RequestStatus::Pending,
                RequestUpdate::Accepted {
                    by: ParticipantId::from("bob"),
                },
            )
            .unwrap();
        store
            .conditional_update(record.id, RequestStatus::Accepted, RequestUpdate::Resolved)
            .unwrap();

        let mut last_rank = None;
        while let Ok(change) = changes.try_recv() {
            let rank = change.status().rank();
            if let Some(previous) = last_rank {
                assert!(rank >= previous, "status regressed on change stream");
            }
            last_rank = Some(rank);
        }
        assert_eq!(last_rank, Some(RequestStatus::Resolved.rank()));
    }

    #[test]
    fn test_added_always_precedes_competitor_events() {
        use std::sync::Arc;
        use std::thread;

        // A helper spinning on the CAS discovers the record the instant it
        // is inserted; its Updated event must still come after Added.
        for _ in 0..200 {
            let store = Arc::new(MemoryRequestStore::new());
            let mut changes = store.subscribe();
            let id = RequestId::new(1);

            let acceptor = {
                let store = store.clone();
                thread::spawn(move || loop {
                    let won = store
                        .conditional_update(
                            id,
                            RequestStatus::Pending,
                            RequestUpdate::Accepted {
                                by: ParticipantId::from("bob"),
                            },
                        )
                        .unwrap();
                    if won {
                        break;
                    }
                })
            };
            store.create(new_request("alice")).unwrap();
            acceptor.join().unwrap();

            let first = changes.try_recv().unwrap();
            assert!(
                matches!(first, RequestChange::Added(_)),
                "stream for {id} must open with Added, got {first:?}"
            );
            let mut last_rank = first.status().rank();
            while let Ok(change) = changes.try_recv() {
                let rank = change.status().rank();
                assert!(rank >= last_rank, "status regressed on change stream");
                last_rank = rank;
            }
            assert_eq!(last_rank, RequestStatus::Accepted.rank());
        }
    }

    #[test]
    fn test_delete_of_active_record_emits_removed() {
        let store = MemoryRequestStore::new();
        let record = store.create(new_request("alice")).unwrap();

        let mut changes = store.subscribe();
        store.delete(record.id).unwrap();

        let change = changes.try_recv().unwrap();
        assert!(matches!(change, RequestChange::Removed { .. }));
        assert_eq!(change.id(), record.id);
    }
}
