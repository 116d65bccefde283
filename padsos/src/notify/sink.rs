//! Notification delivery seam.

use thiserror::Error;

use crate::identity::ParticipantId;

/// A user-facing alert addressed to one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Who should see this.
    pub recipient: ParticipantId,
    /// The message text.
    pub body: String,
}

impl Notification {
    pub fn new(recipient: ParticipantId, body: impl Into<String>) -> Self {
        Self {
            recipient,
            body: body.into(),
        }
    }
}

/// Failed delivery, e.g. the recipient's device is offline.
///
/// Callers log and drop this; notification delivery never affects request
/// state.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("notification delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Delivery mechanism for notifications.
///
/// Production implementations push to devices; [`LogSink`] just logs.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification.
    fn deliver(&self, notification: Notification) -> Result<(), DeliveryError>;
}

/// Sink that emits notifications as `tracing` events.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, notification: Notification) -> Result<(), DeliveryError> {
        tracing::info!(
            recipient = %notification.recipient,
            message = %notification.body,
            "notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_always_delivers() {
        let sink = LogSink;
        let result = sink.deliver(Notification::new(ParticipantId::from("alice"), "hello"));
        assert!(result.is_ok());
    }
}
