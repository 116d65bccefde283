//! Local multi-participant demo run.
//!
//! Simulates one requester and N helpers against the in-memory store:
//! everyone's beacon reports, the requester asks for help, all helpers
//! race to accept, the requester resolves. Exercises the full engine the
//! way the mobile clients would, just inside one process.

use std::sync::Arc;
use std::time::Duration;

use padsos::beacon::{
    BeaconConfig, BeaconHandle, FixedLocationSource, LocationBeacon, LocationRegistry,
    MemoryLocationRegistry,
};
use padsos::geo::Coordinates;
use padsos::identity::{DisplayNames, IdentityProvider, ParticipantId, StaticIdentity};
use padsos::lifecycle::{EngineError, RequestLifecycle};
use padsos::notify::{LogSink, NotificationBridge};
use padsos::ranker::ProximityRanker;
use padsos::store::MemoryRequestStore;

use crate::error::CliError;

/// Demo parameters from the command line.
pub struct DemoOptions {
    /// Number of helpers racing to accept.
    pub helpers: usize,
    /// Beacon report interval.
    pub report_interval: Duration,
    /// Requester latitude/longitude.
    pub latitude: f64,
    pub longitude: f64,
}

/// One simulated participant: identity, beacon, and position.
struct Participant {
    id: ParticipantId,
    beacon: BeaconHandle,
}

fn spawn_participant(
    name: &str,
    coords: Coordinates,
    registry: Arc<MemoryLocationRegistry>,
    interval: Duration,
) -> Participant {
    let id = ParticipantId::from(name);
    let source = Arc::new(FixedLocationSource::new(coords));
    let beacon = LocationBeacon::with_config(
        id.clone(),
        source,
        registry,
        BeaconConfig {
            report_interval: interval,
        },
    )
    .activate();
    Participant { id, beacon }
}

/// Wait until the registry has a record for every given participant.
async fn await_beacons(registry: &MemoryLocationRegistry, participants: &[&Participant]) {
    for _ in 0..200 {
        if participants.iter().all(|p| registry.get(&p.id).is_some()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tracing::warn!("not all beacons reported in time, continuing anyway");
}

/// Run the demo round. Returns once the request is resolved.
pub async fn run(options: DemoOptions) -> Result<(), CliError> {
    if options.helpers == 0 {
        return Err(CliError::Args(
            "at least one helper is required for the demo".to_string(),
        ));
    }
    let requester_coords = Coordinates::new(options.latitude, options.longitude)
        .map_err(EngineError::InvalidCoordinate)?;

    let registry = Arc::new(MemoryLocationRegistry::new());
    let store = Arc::new(MemoryRequestStore::new());
    let engine = RequestLifecycle::new(store.clone());
    let ranker = ProximityRanker::new(registry.clone(), store.clone());

    // The requester is "amira"; helpers get numbered ids and names.
    let mut identity = StaticIdentity::new(ParticipantId::from("amira"))
        .with_name(ParticipantId::from("amira"), "Amira");
    for i in 0..options.helpers {
        identity = identity.with_name(
            ParticipantId::new(format!("helper-{i}")),
            format!("Helper {i}"),
        );
    }
    let identity = Arc::new(identity);
    let requester_id = identity
        .current_participant()
        .map_err(EngineError::Unauthenticated)?;

    let names = DisplayNames::new(identity);
    let bridge = NotificationBridge::new(names, Arc::new(LogSink));
    let bridge_task = bridge.start(engine.subscribe());

    // Beacons: requester at the given position, helpers spread eastward
    // at ~1.1 km increments.
    let requester = spawn_participant(
        requester_id.as_str(),
        requester_coords,
        registry.clone(),
        options.report_interval,
    );
    let helpers: Vec<Participant> = (0..options.helpers)
        .map(|i| {
            let offset = 0.01 * (i + 1) as f64;
            let coords = Coordinates::new(
                options.latitude,
                (options.longitude + offset).clamp(-180.0, 180.0),
            )
            .expect("offset coordinates are valid");
            spawn_participant(
                &format!("helper-{i}"),
                coords,
                registry.clone(),
                options.report_interval,
            )
        })
        .collect();

    let mut all: Vec<&Participant> = vec![&requester];
    all.extend(helpers.iter());
    await_beacons(&registry, &all).await;

    // Round: request, rank, race, resolve.
    let record = engine.request_help(&requester.id, requester_coords)?;
    tracing::info!(request = %record.id, "demo request created");

    for helper in &helpers {
        let view = ranker.ranked_requests(&helper.id)?;
        for ranked in &view {
            tracing::info!(
                viewer = %helper.id,
                request = %ranked.request.id,
                distance_km = format!("{:.2}", ranked.distance_km),
                "ranked view entry"
            );
        }
    }

    let mut race = Vec::new();
    for helper in &helpers {
        let engine = engine.clone();
        let helper_id = helper.id.clone();
        let id = record.id;
        race.push(tokio::task::spawn_blocking(move || {
            engine.accept(id, &helper_id).map(|_| helper_id)
        }));
    }

    let mut winner = None;
    for task in race {
        match task.await.expect("acceptor task panicked") {
            Ok(helper_id) => {
                tracing::info!(acceptor = %helper_id, "acceptance race won");
                winner = Some(helper_id);
            }
            Err(EngineError::AlreadyAccepted(_)) => {}
            Err(error) => return Err(error.into()),
        }
    }
    let winner = winner.expect("exactly one acceptor must win");

    engine.resolve(record.id, &requester.id)?;
    tracing::info!(
        request = %record.id,
        acceptor = %winner,
        "demo round complete, request resolved"
    );

    // Shut the beacons down; in-flight reports just get discarded.
    requester.beacon.deactivate();
    for helper in &helpers {
        helper.beacon.deactivate();
    }
    requester.beacon.wait().await;
    for helper in helpers {
        helper.beacon.wait().await;
    }

    drop(engine);
    let _ = bridge_task.await;
    Ok(())
}
