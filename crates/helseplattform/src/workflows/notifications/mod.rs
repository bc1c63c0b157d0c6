//! Outbound shift notifications: queue records, channel templates, and batch dispatch.
//!
//! Delivery providers stay behind [`NotificationTransport`]; queue storage stays behind
//! [`NotificationQueue`]. Nothing here guarantees delivery to any subset of recipients.

mod dispatcher;
pub mod domain;
pub mod queue;
pub mod router;
pub mod templates;


pub use dispatcher::{
    DeliveryReceipt, DispatchConfig, DispatchResult, DispatchSummary, NotificationDispatcher,
    NotificationTransport, TransportError,
};
pub use domain::{
    ChannelSelection, DeliveryOutcome, Notification, NotificationChannel, NotificationId,
    NotificationPreferences, NotificationStatus, QueuedDelivery, Recipient,
    ShiftNotificationData,
};
pub use queue::{NotificationError, NotificationQueue};
pub use router::notification_router;
pub use templates::OutboundMessage;
