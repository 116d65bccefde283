//! Location beacon - periodic position reporter.
//!
//! Keeps one participant's record fresh in the shared registry: one report
//! immediately on activation, then one per interval (30 seconds by
//! default, matching how often devices are willing to wake the GPS).
//!
//! # Failure behavior
//!
//! - Transient source failures leave the previous record untouched and are
//!   retried on the next scheduled tick, never immediately, which bounds
//!   the request rate toward the registry.
//! - `PermissionDenied` is logged once and stops the beacon; only user
//!   action can clear it, so retrying is noise.
//! - Registry upsert failures (store partition) are likewise retried on
//!   the next tick.
//!
//! Deactivation cancels the timer. An in-flight report is not forcibly
//! interrupted; it completes and its result is discarded with the task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::registry::{LocationRecord, LocationRegistry};
use super::source::{BeaconError, LocationSource};
use crate::identity::ParticipantId;

/// Configuration for the location beacon.
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    /// Interval between position reports.
    pub report_interval: Duration,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            report_interval: Duration::from_secs(30),
        }
    }
}

/// Periodic reporter of one participant's position.
pub struct LocationBeacon {
    participant: ParticipantId,
    source: Arc<dyn LocationSource>,
    registry: Arc<dyn LocationRegistry>,
    config: BeaconConfig,
}

/// Handle to a running beacon.
///
/// Dropping the handle does NOT stop the beacon; call
/// [`BeaconHandle::deactivate`].
pub struct BeaconHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl BeaconHandle {
    /// Stop the report timer. Idempotent.
    ///
    /// An in-flight report completes on its own; its result is discarded.
    pub fn deactivate(&self) {
        self.cancel.cancel();
    }

    /// Whether the beacon task is still running.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Wait for the beacon task to finish after deactivation.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

impl LocationBeacon {
    /// Create a beacon with the default 30-second interval.
    pub fn new(
        participant: ParticipantId,
        source: Arc<dyn LocationSource>,
        registry: Arc<dyn LocationRegistry>,
    ) -> Self {
        Self::with_config(participant, source, registry, BeaconConfig::default())
    }

    /// Create a beacon with custom configuration.
    pub fn with_config(
        participant: ParticipantId,
        source: Arc<dyn LocationSource>,
        registry: Arc<dyn LocationRegistry>,
        config: BeaconConfig,
    ) -> Self {
        Self {
            participant,
            source,
            registry,
            config,
        }
    }

    /// Start reporting.
    ///
    /// Spawns the report loop; the first report happens immediately.
    pub fn activate(self) -> BeaconHandle {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            self.run(task_cancel).await;
        });
        BeaconHandle { cancel, task }
    }

    async fn run(self, cancel: CancellationToken) {
        tracing::debug!(participant = %self.participant, "location beacon activated");

        let mut ticks = tokio::time::interval(self.config.report_interval);
        // A slow tick must not cause a burst of catch-up reports.
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                // First tick completes immediately: one report on activation.
                _ = ticks.tick() => {
                    if !self.report_once() {
                        break;
                    }
                }
            }
        }

        tracing::debug!(participant = %self.participant, "location beacon deactivated");
    }

    /// One report attempt. Returns false when the beacon should stop.
    fn report_once(&self) -> bool {
        match self.source.current_location() {
            Ok(coords) => {
                let record = LocationRecord::new(self.participant.clone(), coords);
                if let Err(error) = self.registry.upsert(record) {
                    tracing::warn!(
                        participant = %self.participant,
                        %error,
                        "location upsert failed, will retry on next tick"
                    );
                }
                true
            }
            Err(BeaconError::PermissionDenied) => {
                // Reported once; no automatic retry can fix a denial.
                tracing::error!(
                    participant = %self.participant,
                    "location permission denied, beacon stopping"
                );
                false
            }
            Err(error) => {
                tracing::warn!(
                    participant = %self.participant,
                    %error,
                    "location read failed, previous record left untouched"
                );
                true
            }
        }
    }
}
