use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::shifts::domain::{Shift, ShiftId, WorkerId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

/// Delivery channel for a queued notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
}

impl NotificationChannel {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
            NotificationChannel::Push => "push",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

/// Shift details carried with a notification so templates can render them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftNotificationData {
    pub shift_id: ShiftId,
    pub profession: String,
    pub start_time: DateTime<Utc>,
    pub hourly_wage: u32,
    pub municipality_name: String,
    pub department_name: String,
}

/// Queue row for a single channel delivery to a single worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: WorkerId,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Option<ShiftNotificationData>,
    pub status: NotificationStatus,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Notification {
    /// Announcement of a newly published shift, pending until `scheduled_for`.
    pub fn shift_published(
        id: NotificationId,
        recipient: WorkerId,
        channel: NotificationChannel,
        shift: &Shift,
        scheduled_for: DateTime<Utc>,
    ) -> Self {
        let title = format!("Ny vakt tilgjengelig: {}", shift.profession_required);
        let body = format!(
            "{} i {} søker {} {} kl. {}. Timelønn {} NOK.",
            shift.department.department_name,
            shift.department.municipality_name,
            shift.profession_required.to_lowercase(),
            shift.start_time.format("%d.%m.%Y"),
            shift.start_time.format("%H:%M"),
            shift.hourly_wage
        );

        Self {
            id,
            recipient,
            channel,
            title,
            body,
            data: Some(ShiftNotificationData {
                shift_id: shift.id.clone(),
                profession: shift.profession_required.clone(),
                start_time: shift.start_time,
                hourly_wage: shift.hourly_wage,
                municipality_name: shift.department.municipality_name.clone(),
                department_name: shift.department.department_name.clone(),
            }),
            status: NotificationStatus::Pending,
            scheduled_for,
            sent_at: None,
            failed_at: None,
            provider_id: None,
            error_message: None,
        }
    }

    /// Record a dispatch outcome on the row.
    pub fn apply(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Sent { at, provider_id } => {
                self.status = NotificationStatus::Sent;
                self.sent_at = Some(at);
                self.failed_at = None;
                self.provider_id = provider_id;
                self.error_message = None;
            }
            DeliveryOutcome::Failed { at, error } => {
                self.status = NotificationStatus::Failed;
                self.sent_at = None;
                self.failed_at = Some(at);
                self.provider_id = None;
                self.error_message = error;
            }
        }
    }
}

/// Result of a single dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent {
        at: DateTime<Utc>,
        provider_id: Option<String>,
    },
    Failed {
        at: DateTime<Utc>,
        error: Option<String>,
    },
}

/// Per-user channel switches and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub push_enabled: bool,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub push_token: Option<String>,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_enabled: true,
            sms_enabled: true,
            push_enabled: true,
            phone_number: None,
            push_token: None,
        }
    }
}

/// Profile fields the dispatcher needs to address a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub full_name: String,
    pub email: String,
    pub preferences: NotificationPreferences,
}

/// Pending notification joined with its recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedDelivery {
    pub notification: Notification,
    pub recipient: Recipient,
}

/// Channels a department picked for one worker when publishing a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSelection {
    #[serde(default = "enabled")]
    pub email: bool,
    #[serde(default = "enabled")]
    pub sms: bool,
    #[serde(default = "enabled")]
    pub push: bool,
}

fn enabled() -> bool {
    true
}

impl Default for ChannelSelection {
    fn default() -> Self {
        Self {
            email: true,
            sms: true,
            push: true,
        }
    }
}

impl ChannelSelection {
    pub fn channels(&self) -> Vec<NotificationChannel> {
        [
            (self.email, NotificationChannel::Email),
            (self.sms, NotificationChannel::Sms),
            (self.push, NotificationChannel::Push),
        ]
        .into_iter()
        .filter_map(|(selected, channel)| selected.then_some(channel))
        .collect()
    }
}
