//! Device location source abstraction.

use std::sync::RwLock;

use thiserror::Error;

use crate::geo::Coordinates;
use crate::identity::ParticipantId;

/// Errors from reading a participant's location.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeaconError {
    /// The user denied location access. Permanent: reported once, the
    /// beacon stops, and nothing retries until the user acts.
    #[error("permission to access device location was denied")]
    PermissionDenied,

    /// The device could not produce a fix right now. Transient: the next
    /// scheduled tick retries.
    #[error("device location unavailable: {0}")]
    Unavailable(String),

    /// The registry holds no record for this participant yet.
    #[error("no known location for participant {0}")]
    NoKnownLocation(ParticipantId),
}

/// Source of the local device's current position.
///
/// The real implementation wraps the platform location service; tests and
/// demo runs use [`FixedLocationSource`].
pub trait LocationSource: Send + Sync {
    /// Read the current position.
    fn current_location(&self) -> Result<Coordinates, BeaconError>;
}

/// A location source returning a settable fixed position.
///
/// `set` moves the participant; `fail_with` makes subsequent reads fail,
/// which is how tests exercise the beacon's retry behavior.
pub struct FixedLocationSource {
    current: RwLock<Result<Coordinates, BeaconError>>,
}

impl FixedLocationSource {
    /// Source that reports `coords` until changed.
    pub fn new(coords: Coordinates) -> Self {
        Self {
            current: RwLock::new(Ok(coords)),
        }
    }

    /// Source that fails with `error` until changed.
    pub fn failing(error: BeaconError) -> Self {
        Self {
            current: RwLock::new(Err(error)),
        }
    }

    /// Move the reported position.
    pub fn set(&self, coords: Coordinates) {
        *self.current.write().expect("location source lock poisoned") = Ok(coords);
    }

    /// Make subsequent reads fail.
    pub fn fail_with(&self, error: BeaconError) {
        *self.current.write().expect("location source lock poisoned") = Err(error);
    }
}

impl LocationSource for FixedLocationSource {
    fn current_location(&self) -> Result<Coordinates, BeaconError> {
        self.current
            .read()
            .expect("location source lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_source_reports_and_moves() {
        let source = FixedLocationSource::new(Coordinates::new(1.0, 2.0).unwrap());
        assert_eq!(
            source.current_location().unwrap(),
            Coordinates::new(1.0, 2.0).unwrap()
        );

        source.set(Coordinates::new(3.0, 4.0).unwrap());
        assert_eq!(
            source.current_location().unwrap(),
            Coordinates::new(3.0, 4.0).unwrap()
        );
    }

    #[test]
    fn test_failing_source() {
        let source = FixedLocationSource::failing(BeaconError::PermissionDenied);
        assert_eq!(
            source.current_location(),
            Err(BeaconError::PermissionDenied)
        );

        source.set(Coordinates::new(0.0, 0.0).unwrap());
        assert!(source.current_location().is_ok());
    }
}
