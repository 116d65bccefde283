//! Shared location registry.
//!
//! One [`LocationRecord`] per participant, overwritten on every report.
//! Records never expire: age is a quality signal for consumers, not a
//! correctness condition, so the registry keeps whatever was last reported.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::geo::Coordinates;
use crate::identity::ParticipantId;
use crate::store::StoreError;

/// Latest known position of one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    /// Whose position this is.
    pub participant: ParticipantId,
    /// Reported coordinates.
    pub coords: Coordinates,
    /// When the device captured the fix.
    pub captured_at: DateTime<Utc>,
}

impl LocationRecord {
    /// Record captured now.
    pub fn new(participant: ParticipantId, coords: Coordinates) -> Self {
        Self {
            participant,
            coords,
            captured_at: Utc::now(),
        }
    }
}

/// Contract for the shared location registry.
///
/// Backed by the document-store collaborator in production (upsert-by-key
/// plus a realtime feed); [`MemoryLocationRegistry`] provides the same
/// contract in-process. Subscribers receive the full current record set on
/// every change, and unsubscribe by dropping the receiver.
pub trait LocationRegistry: Send + Sync {
    /// Insert or overwrite the record for `record.participant`.
    ///
    /// The previous record is left untouched on failure; there is no
    /// partial overwrite.
    fn upsert(&self, record: LocationRecord) -> Result<(), StoreError>;

    /// Latest record for one participant, if any was ever reported.
    fn get(&self, participant: &ParticipantId) -> Option<LocationRecord>;

    /// The full current record set.
    fn snapshot(&self) -> Vec<LocationRecord>;

    /// Subscribe to snapshots, delivered whenever any record changes.
    fn subscribe(&self) -> broadcast::Receiver<Vec<LocationRecord>>;
}

/// Configuration for the in-memory registry.
#[derive(Debug, Clone)]
pub struct MemoryRegistryConfig {
    /// Capacity of the snapshot broadcast channel.
    pub snapshot_channel_capacity: usize,
}

impl Default for MemoryRegistryConfig {
    fn default() -> Self {
        Self {
            snapshot_channel_capacity: 64,
        }
    }
}

/// In-memory implementation of the location registry.
pub struct MemoryLocationRegistry {
    records: DashMap<ParticipantId, LocationRecord>,
    snapshot_tx: broadcast::Sender<Vec<LocationRecord>>,
}

impl MemoryLocationRegistry {
    /// Create an empty registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryRegistryConfig::default())
    }

    /// Create an empty registry with custom configuration.
    pub fn with_config(config: MemoryRegistryConfig) -> Self {
        let (snapshot_tx, _) = broadcast::channel(config.snapshot_channel_capacity);
        Self {
            records: DashMap::new(),
            snapshot_tx,
        }
    }
}

impl Default for MemoryLocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationRegistry for MemoryLocationRegistry {
    fn upsert(&self, record: LocationRecord) -> Result<(), StoreError> {
        tracing::trace!(
            participant = %record.participant,
            coords = %record.coords,
            "location record upserted"
        );
        self.records.insert(record.participant.clone(), record);
        let _ = self.snapshot_tx.send(self.snapshot());
        Ok(())
    }

    fn get(&self, participant: &ParticipantId) -> Option<LocationRecord> {
        self.records.get(participant).map(|entry| entry.value().clone())
    }

    fn snapshot(&self) -> Vec<LocationRecord> {
        let mut records: Vec<LocationRecord> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| a.participant.cmp(&b.participant));
        records
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<LocationRecord>> {
        self.snapshot_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn test_upsert_overwrites_single_record() {
        let registry = MemoryLocationRegistry::new();
        let alice = ParticipantId::from("alice");

        registry
            .upsert(LocationRecord::new(alice.clone(), coords(1.0, 1.0)))
            .unwrap();
        registry
            .upsert(LocationRecord::new(alice.clone(), coords(2.0, 2.0)))
            .unwrap();

        // At most one record per participant.
        assert_eq!(registry.snapshot().len(), 1);
        assert_eq!(registry.get(&alice).unwrap().coords, coords(2.0, 2.0));
    }

    #[test]
    fn test_get_unknown_participant() {
        let registry = MemoryLocationRegistry::new();
        assert!(registry.get(&ParticipantId::from("nobody")).is_none());
    }

    #[test]
    fn test_subscribe_receives_full_snapshot() {
        let registry = MemoryLocationRegistry::new();
        let mut snapshots = registry.subscribe();

        registry
            .upsert(LocationRecord::new(
                ParticipantId::from("alice"),
                coords(1.0, 1.0),
            ))
            .unwrap();
        registry
            .upsert(LocationRecord::new(
                ParticipantId::from("bob"),
                coords(2.0, 2.0),
            ))
            .unwrap();

        let first = snapshots.try_recv().unwrap();
        assert_eq!(first.len(), 1);
        let second = snapshots.try_recv().unwrap();
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_drop_receiver_unsubscribes() {
        let registry = MemoryLocationRegistry::new();
        let snapshots = registry.subscribe();
        drop(snapshots);

        // Upsert after unsubscribe must not fail.
        registry
            .upsert(LocationRecord::new(
                ParticipantId::from("alice"),
                coords(1.0, 1.0),
            ))
            .unwrap();
    }
}
