//! Proximity ranker - distance-sorted view of active requests.
//!
//! Combines the location registry (where is the viewer?) with the request
//! store (what requests exist?) into the list a helper actually sees:
//! active requests sorted nearest-first, the viewer's own request
//! excluded.
//!
//! The view is re-derived in full on every query rather than maintained
//! incrementally; the dataset is co-located users, so it is small, and a
//! full re-sort per change is cheaper than getting incremental state
//! wrong. [`ProximityRanker::watch`] wires the re-derivation to the
//! registry and store change streams for live consumers.

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::beacon::{BeaconError, LocationRegistry};
use crate::geo::distance_km;
use crate::identity::ParticipantId;
use crate::lifecycle::EngineError;
use crate::store::{HelpRequest, RequestStore};

/// One active request as seen by a viewer, with its distance.
#[derive(Debug, Clone)]
pub struct RankedRequest {
    /// The request record (coordinates are its creation-time snapshot).
    pub request: HelpRequest,
    /// Great-circle distance from the viewer in kilometres.
    pub distance_km: f64,
}

/// Configuration for [`ProximityRanker::watch`].
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Capacity of the delivered-views channel.
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
        }
    }
}

/// Distance-sorted view of active help requests.
#[derive(Clone)]
pub struct ProximityRanker {
    registry: Arc<dyn LocationRegistry>,
    store: Arc<dyn RequestStore>,
}

impl ProximityRanker {
    /// Create a ranker over the given registry and store.
    pub fn new(registry: Arc<dyn LocationRegistry>, store: Arc<dyn RequestStore>) -> Self {
        Self { registry, store }
    }

    /// The ranked view for `viewer`, freshly derived.
    ///
    /// Requests are sorted ascending by distance from the viewer's latest
    /// registry position to each request's coordinate snapshot; ties are
    /// broken by creation order (earlier first). The viewer's own request
    /// never appears.
    ///
    /// # Errors
    ///
    /// - [`EngineError::LocationUnavailable`] when the registry has no
    ///   record for the viewer yet
    /// - [`EngineError::StoreUnavailable`] on store partition
    pub fn ranked_requests(
        &self,
        viewer: &ParticipantId,
    ) -> Result<Vec<RankedRequest>, EngineError> {
        let viewer_record = self
            .registry
            .get(viewer)
            .ok_or_else(|| BeaconError::NoKnownLocation(viewer.clone()))?;

        let mut ranked = Vec::new();
        for request in self.store.active_requests()? {
            if request.requester == *viewer {
                continue;
            }
            let distance = distance_km(viewer_record.coords, request.coords)?;
            ranked.push(RankedRequest {
                request,
                distance_km: distance,
            });
        }

        ranked.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.request.created_at.cmp(&b.request.created_at))
                .then_with(|| a.request.id.cmp(&b.request.id))
        });
        Ok(ranked)
    }

    /// Live ranked views for `viewer`.
    ///
    /// Spawns a task that re-derives the view on every registry or store
    /// change and sends it on the returned channel. Derivation errors
    /// (typically the viewer's position not being known yet) skip that
    /// update rather than ending the stream. The task stops when the
    /// token is cancelled or the receiver is dropped.
    pub fn watch(
        &self,
        viewer: ParticipantId,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<Vec<RankedRequest>> {
        self.watch_with_config(viewer, cancel, WatchConfig::default())
    }

    /// [`ProximityRanker::watch`] with custom configuration.
    pub fn watch_with_config(
        &self,
        viewer: ParticipantId,
        cancel: CancellationToken,
        config: WatchConfig,
    ) -> mpsc::Receiver<Vec<RankedRequest>> {
        let (tx, rx) = mpsc::channel(config.channel_capacity);
        let ranker = self.clone();
        let mut locations = self.registry.subscribe();
        let mut changes = self.store.subscribe();

        tokio::spawn(async move {
            tracing::debug!(viewer = %viewer, "ranked view watch started");
            loop {
                let wakeup = tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = locations.recv() => result.map(|_| ()),
                    result = changes.recv() => result.map(|_| ()),
                };

                match wakeup {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Lagging is fine: the view is re-derived from
                        // current state, not from the missed events.
                        match ranker.ranked_requests(&viewer) {
                            Ok(view) => {
                                if tx.send(view).await.is_err() {
                                    break;
                                }
                            }
                            Err(error) => {
                                tracing::trace!(
                                    viewer = %viewer,
                                    %error,
                                    "skipping ranked view update"
                                );
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!(viewer = %viewer, "ranked view watch stopped");
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::{LocationRecord, MemoryLocationRegistry};
    use crate::geo::Coordinates;
    use crate::lifecycle::RequestLifecycle;
    use crate::store::MemoryRequestStore;

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    struct Fixture {
        registry: Arc<MemoryLocationRegistry>,
        engine: RequestLifecycle,
        ranker: ProximityRanker,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(MemoryLocationRegistry::new());
        let store = Arc::new(MemoryRequestStore::new());
        let engine = RequestLifecycle::new(store.clone());
        let ranker = ProximityRanker::new(registry.clone(), store);
        Fixture {
            registry,
            engine,
            ranker,
        }
    }

    fn place(fixture: &Fixture, who: &str, lat: f64, lon: f64) -> ParticipantId {
        let id = ParticipantId::from(who);
        fixture
            .registry
            .upsert(LocationRecord::new(id.clone(), coords(lat, lon)))
            .unwrap();
        id
    }

    #[test]
    fn test_sorted_ascending_by_distance() {
        let f = fixture();
        let viewer = place(&f, "viewer", 0.0, 0.0);
        let near = place(&f, "near", 0.0, 0.01);
        let far = place(&f, "far", 0.0, 0.1);

        // Create far first so creation order cannot mask distance order.
        f.engine.request_help(&far, coords(0.0, 0.1)).unwrap();
        f.engine.request_help(&near, coords(0.0, 0.01)).unwrap();

        let ranked = f.ranker.ranked_requests(&viewer).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].request.requester, near);
        assert_eq!(ranked[1].request.requester, far);
        assert!((ranked[0].distance_km - 1.11).abs() < 0.02);
        assert!((ranked[1].distance_km - 11.12).abs() < 0.1);
    }

    #[test]
    fn test_excludes_viewers_own_request() {
        let f = fixture();
        let viewer = place(&f, "viewer", 0.0, 0.0);
        place(&f, "other", 0.0, 0.01);

        f.engine.request_help(&viewer, coords(0.0, 0.0)).unwrap();
        let ranked = f.ranker.ranked_requests(&viewer).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_distance_ties_break_by_creation_order() {
        let f = fixture();
        let viewer = place(&f, "viewer", 0.0, 0.0);
        let east = place(&f, "east", 0.0, 0.01);
        let west = place(&f, "west", 0.0, -0.01);

        // Same distance from the viewer, east created first.
        f.engine.request_help(&east, coords(0.0, 0.01)).unwrap();
        f.engine.request_help(&west, coords(0.0, -0.01)).unwrap();

        let ranked = f.ranker.ranked_requests(&viewer).unwrap();
        assert_eq!(ranked[0].request.requester, east);
        assert_eq!(ranked[1].request.requester, west);
    }

    #[test]
    fn test_unknown_viewer_location_fails() {
        let f = fixture();
        let result = f.ranker.ranked_requests(&ParticipantId::from("ghost"));
        assert!(matches!(result, Err(EngineError::LocationUnavailable(_))));
    }

    #[test]
    fn test_uses_request_coordinate_snapshot_not_live_position() {
        let f = fixture();
        let viewer = place(&f, "viewer", 0.0, 0.0);
        let mover = place(&f, "mover", 0.0, 0.01);

        f.engine.request_help(&mover, coords(0.0, 0.01)).unwrap();

        // The requester wanders off; the request stays put.
        f.registry
            .upsert(LocationRecord::new(mover.clone(), coords(10.0, 10.0)))
            .unwrap();

        let ranked = f.ranker.ranked_requests(&viewer).unwrap();
        assert!((ranked[0].distance_km - 1.11).abs() < 0.02);
    }

    #[test]
    fn test_terminal_requests_disappear() {
        let f = fixture();
        let viewer = place(&f, "viewer", 0.0, 0.0);
        let requester = place(&f, "requester", 0.0, 0.01);

        let record = f.engine.request_help(&requester, coords(0.0, 0.01)).unwrap();
        assert_eq!(f.ranker.ranked_requests(&viewer).unwrap().len(), 1);

        f.engine.cancel(record.id, &requester).unwrap();
        assert!(f.ranker.ranked_requests(&viewer).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_delivers_fresh_views() {
        let f = fixture();
        let viewer = place(&f, "viewer", 0.0, 0.0);
        let requester = place(&f, "requester", 0.0, 0.01);

        let cancel = CancellationToken::new();
        let mut views = f.ranker.watch(viewer.clone(), cancel.clone());

        let record = f.engine.request_help(&requester, coords(0.0, 0.01)).unwrap();
        let view = views.recv().await.expect("watch should deliver a view");
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].request.id, record.id);

        f.engine.cancel(record.id, &requester).unwrap();
        let view = views.recv().await.expect("watch should deliver a view");
        assert!(view.is_empty());

        cancel.cancel();
    }
}
