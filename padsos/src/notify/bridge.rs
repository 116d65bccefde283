//! Bridge task from lifecycle events to notifications.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::sink::{Notification, NotificationSink};
use crate::identity::DisplayNames;
use crate::lifecycle::LifecycleEvent;

/// Map one lifecycle event to the notifications it produces.
///
/// Pure; the bridge task is just this function in a receive loop. Names
/// come from the best-effort display-name cache, so an unresolvable
/// participant shows as "Unknown" rather than blocking the notice.
pub fn notifications_for(names: &DisplayNames, event: &LifecycleEvent) -> Vec<Notification> {
    match event {
        LifecycleEvent::Created { request } => vec![Notification::new(
            request.requester.clone(),
            "Your help request has been sent to all nearby users.",
        )],
        LifecycleEvent::Accepted { request } => {
            let Some(acceptor) = request.accepted_by.clone() else {
                // Cannot happen for a well-formed event; drop rather than
                // invent an addressee.
                tracing::warn!(request = %request.id, "accepted event without acceptor");
                return Vec::new();
            };
            vec![
                Notification::new(
                    acceptor.clone(),
                    format!(
                        "You have volunteered to help {}.",
                        names.resolve(&request.requester)
                    ),
                ),
                Notification::new(
                    request.requester.clone(),
                    format!(
                        "Your help request has been accepted by {}.",
                        names.resolve(&acceptor)
                    ),
                ),
            ]
        }
        LifecycleEvent::Cancelled { request } => vec![Notification::new(
            request.requester.clone(),
            "Your help request has been cancelled.",
        )],
        LifecycleEvent::Resolved { request } => vec![Notification::new(
            request.requester.clone(),
            "You have confirmed that you received help.",
        )],
    }
}

/// Task that turns lifecycle events into sink deliveries.
pub struct NotificationBridge {
    names: DisplayNames,
    sink: Arc<dyn NotificationSink>,
}

impl NotificationBridge {
    /// Create a bridge delivering through `sink`.
    pub fn new(names: DisplayNames, sink: Arc<dyn NotificationSink>) -> Self {
        Self { names, sink }
    }

    /// Start consuming `events`.
    ///
    /// The task ends when the event channel closes. Delivery failures and
    /// lag are logged and otherwise ignored; state consistency never
    /// depends on this task.
    pub fn start(self, mut events: broadcast::Receiver<LifecycleEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::debug!("notification bridge started");
            loop {
                match events.recv().await {
                    Ok(event) => self.handle(&event),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "notification bridge lagged behind events");
                    }
                }
            }
            tracing::debug!("notification bridge stopped");
        })
    }

    fn handle(&self, event: &LifecycleEvent) {
        for notification in notifications_for(&self.names, event) {
            if let Err(error) = self.sink.deliver(notification) {
                tracing::warn!(%error, "dropping undeliverable notification");
            }
        }
    }
}
