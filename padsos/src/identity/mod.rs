//! Identity collaborator interface.
//!
//! The engine never manages sessions itself; an external identity provider
//! owns participant ids and display names. This module defines that seam:
//!
//! - [`IdentityProvider`] - read-only id and name lookup
//! - [`DisplayNames`] - best-effort name cache with an `"Unknown"` fallback
//! - [`StaticIdentity`] - fixed in-process provider for demo runs and tests
//!
//! Engine operations take explicit [`ParticipantId`] parameters; nothing in
//! the core reads ambient "current user" state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

/// Fallback shown when a participant's display name cannot be resolved.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Opaque, stable participant identifier owned by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap an id value issued by the identity collaborator.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Errors from the identity collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentityError {
    /// No participant id is available (not signed in).
    #[error("no authenticated participant")]
    Unauthenticated,
}

/// Read-only view of the external identity collaborator.
pub trait IdentityProvider: Send + Sync {
    /// The participant id of the local session.
    ///
    /// # Errors
    ///
    /// [`IdentityError::Unauthenticated`] when no id is available.
    fn current_participant(&self) -> Result<ParticipantId, IdentityError>;

    /// Look up a participant's display name, if known.
    fn display_name(&self, id: &ParticipantId) -> Option<String>;
}

/// Fixed identity provider backed by an in-memory name table.
///
/// Stands in for the real identity collaborator in demo runs and tests.
pub struct StaticIdentity {
    current: Option<ParticipantId>,
    names: HashMap<ParticipantId, String>,
}

impl StaticIdentity {
    /// Provider authenticated as `current`.
    pub fn new(current: ParticipantId) -> Self {
        Self {
            current: Some(current),
            names: HashMap::new(),
        }
    }

    /// Provider with no authenticated session.
    pub fn signed_out() -> Self {
        Self {
            current: None,
            names: HashMap::new(),
        }
    }

    /// Register a display name for a participant.
    pub fn with_name(mut self, id: ParticipantId, name: impl Into<String>) -> Self {
        self.names.insert(id, name.into());
        self
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_participant(&self) -> Result<ParticipantId, IdentityError> {
        self.current.clone().ok_or(IdentityError::Unauthenticated)
    }

    fn display_name(&self, id: &ParticipantId) -> Option<String> {
        self.names.get(id).cloned()
    }
}

/// Cached display-name lookup.
///
/// Name resolution is best-effort: a miss caches and returns
/// [`UNKNOWN_NAME`] rather than failing the caller, matching how the
/// notification layer treats names as decoration, not data.
#[derive(Clone)]
pub struct DisplayNames {
    provider: Arc<dyn IdentityProvider>,
    cache: Arc<DashMap<ParticipantId, String>>,
}

impl DisplayNames {
    /// Create a cache over the given provider.
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Resolve a display name, falling back to [`UNKNOWN_NAME`].
    pub fn resolve(&self, id: &ParticipantId) -> String {
        if let Some(name) = self.cache.get(id) {
            return name.value().clone();
        }
        let name = match self.provider.display_name(id) {
            Some(name) => name,
            None => {
                tracing::debug!(participant = %id, "no display name, using fallback");
                UNKNOWN_NAME.to_string()
            }
        };
        self.cache.insert(id.clone(), name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_participant() {
        let identity = StaticIdentity::new(ParticipantId::from("user-1"));
        assert_eq!(
            identity.current_participant().unwrap(),
            ParticipantId::from("user-1")
        );
    }

    #[test]
    fn test_signed_out_is_unauthenticated() {
        let identity = StaticIdentity::signed_out();
        assert_eq!(
            identity.current_participant(),
            Err(IdentityError::Unauthenticated)
        );
    }

    #[test]
    fn test_resolve_known_name() {
        let id = ParticipantId::from("user-1");
        let identity = StaticIdentity::new(id.clone()).with_name(id.clone(), "Amira");
        let names = DisplayNames::new(Arc::new(identity));

        assert_eq!(names.resolve(&id), "Amira");
    }

    #[test]
    fn test_resolve_missing_name_is_unknown() {
        let identity = StaticIdentity::new(ParticipantId::from("user-1"));
        let names = DisplayNames::new(Arc::new(identity));

        assert_eq!(names.resolve(&ParticipantId::from("stranger")), UNKNOWN_NAME);
    }

    #[test]
    fn test_resolve_caches_lookups() {
        // Provider that counts lookups to prove the cache short-circuits.
        struct CountingProvider {
            lookups: std::sync::atomic::AtomicUsize,
        }

        impl IdentityProvider for CountingProvider {
            fn current_participant(&self) -> Result<ParticipantId, IdentityError> {
                Err(IdentityError::Unauthenticated)
            }

            fn display_name(&self, _id: &ParticipantId) -> Option<String> {
                self.lookups
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Some("Bindi".to_string())
            }
        }

        let provider = Arc::new(CountingProvider {
            lookups: std::sync::atomic::AtomicUsize::new(0),
        });
        let names = DisplayNames::new(provider.clone());

        let id = ParticipantId::from("user-2");
        assert_eq!(names.resolve(&id), "Bindi");
        assert_eq!(names.resolve(&id), "Bindi");
        assert_eq!(provider.lookups.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
