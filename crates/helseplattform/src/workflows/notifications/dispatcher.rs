use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{DeliveryOutcome, NotificationId};
use super::queue::{NotificationError, NotificationQueue};
use super::templates::{self, OutboundMessage};

/// Provider adapter (e-mail, SMS, or push gateway).
pub trait NotificationTransport: Send + Sync {
    fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, TransportError>;
}

/// Provider acknowledgement for a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub success: bool,
    pub provider_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("provider rejected request: {0}")]
    Rejected(String),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Batch and addressing settings for queue processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub batch_size: usize,
    pub sender_address: String,
    pub public_base_url: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            sender_address: "noreply@helseplattform.no".to_string(),
            public_base_url: "https://helseplattform.no".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub id: NotificationId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub processed: usize,
    pub results: Vec<DispatchResult>,
}

impl DispatchSummary {
    pub fn delivered(&self) -> usize {
        self.results.iter().filter(|result| result.success).count()
    }
}

/// Drains due notifications through a transport and records each outcome.
pub struct NotificationDispatcher<Q, T> {
    queue: Arc<Q>,
    transport: Arc<T>,
    config: DispatchConfig,
}

impl<Q, T> NotificationDispatcher<Q, T>
where
    Q: NotificationQueue + 'static,
    T: NotificationTransport + 'static,
{
    pub fn new(queue: Arc<Q>, transport: Arc<T>, config: DispatchConfig) -> Self {
        Self {
            queue,
            transport,
            config,
        }
    }

    /// Process one batch of notifications due at `now`.
    pub fn dispatch(&self, now: DateTime<Utc>) -> Result<DispatchSummary, NotificationError> {
        let due = self.queue.due(now, self.config.batch_size)?;
        let mut results = Vec::with_capacity(due.len());

        for delivery in due {
            let id = delivery.notification.id.clone();
            let channel = delivery.notification.channel;

            let (outcome, error) = match templates::outbound_message(&delivery, &self.config) {
                None => {
                    debug!(notification = %id.0, channel = channel.label(), "channel disabled for recipient");
                    (DeliveryOutcome::Failed { at: now, error: None }, None)
                }
                Some(message) => match self.transport.send(&message) {
                    Ok(receipt) if receipt.success => (
                        DeliveryOutcome::Sent {
                            at: now,
                            provider_id: receipt.provider_id,
                        },
                        None,
                    ),
                    Ok(_) => (DeliveryOutcome::Failed { at: now, error: None }, None),
                    Err(err) => {
                        warn!(notification = %id.0, channel = channel.label(), error = %err, "notification delivery failed");
                        let detail = err.to_string();
                        (
                            DeliveryOutcome::Failed {
                                at: now,
                                error: Some(detail.clone()),
                            },
                            Some(detail),
                        )
                    }
                },
            };

            let success = matches!(outcome, DeliveryOutcome::Sent { .. });
            match self.queue.mark(&id, outcome) {
                Ok(()) => results.push(DispatchResult { id, success, error }),
                Err(err) => {
                    warn!(notification = %id.0, error = %err, "failed to record delivery outcome");
                    results.push(DispatchResult {
                        id,
                        success: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let summary = DispatchSummary {
            processed: results.len(),
            results,
        };
        info!(
            processed = summary.processed,
            delivered = summary.delivered(),
            "notification batch dispatched"
        );
        Ok(summary)
    }
}
