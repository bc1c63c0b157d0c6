use chrono::{DateTime, Utc};

use super::domain::{DeliveryOutcome, Notification, NotificationId, QueuedDelivery};

/// Persistent notification queue consumed by the dispatcher.
pub trait NotificationQueue: Send + Sync {
    fn enqueue(&self, notification: Notification) -> Result<Notification, NotificationError>;
    /// Pending rows scheduled at or before `now`, joined with their recipients.
    fn due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QueuedDelivery>, NotificationError>;
    fn mark(&self, id: &NotificationId, outcome: DeliveryOutcome) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification {0:?} not found")]
    NotFound(NotificationId),
    #[error("notification queue unavailable: {0}")]
    Unavailable(String),
}
