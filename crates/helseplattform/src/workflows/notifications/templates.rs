//! Channel specific renderings of a queued notification.

use serde::Serialize;

use super::dispatcher::DispatchConfig;
use super::domain::{
    Notification, NotificationChannel, QueuedDelivery, Recipient, ShiftNotificationData,
};

const SENDER_NAME: &str = "HelsePlattform";

/// Provider-neutral payload handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum OutboundMessage {
    Email {
        to: String,
        to_name: String,
        from: String,
        from_name: String,
        subject: String,
        html: String,
    },
    Sms {
        to: String,
        body: String,
    },
    Push {
        token: String,
        heading: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<ShiftNotificationData>,
    },
}

impl OutboundMessage {
    pub fn channel(&self) -> NotificationChannel {
        match self {
            OutboundMessage::Email { .. } => NotificationChannel::Email,
            OutboundMessage::Sms { .. } => NotificationChannel::Sms,
            OutboundMessage::Push { .. } => NotificationChannel::Push,
        }
    }
}

/// Build the outbound message, or `None` when the recipient disabled the channel or
/// lacks an address for it.
pub fn outbound_message(
    delivery: &QueuedDelivery,
    config: &DispatchConfig,
) -> Option<OutboundMessage> {
    let notification = &delivery.notification;
    let recipient = &delivery.recipient;
    let preferences = &recipient.preferences;

    match notification.channel {
        NotificationChannel::Email if preferences.email_enabled => Some(OutboundMessage::Email {
            to: recipient.email.clone(),
            to_name: recipient.full_name.clone(),
            from: config.sender_address.clone(),
            from_name: SENDER_NAME.to_string(),
            subject: notification.title.clone(),
            html: email_html(notification, recipient, &config.public_base_url),
        }),
        NotificationChannel::Sms if preferences.sms_enabled => {
            let phone = preferences.phone_number.as_deref()?;
            Some(OutboundMessage::Sms {
                to: phone.to_string(),
                body: sms_body(notification, &config.public_base_url),
            })
        }
        NotificationChannel::Push if preferences.push_enabled => {
            let token = preferences.push_token.as_deref()?;
            Some(OutboundMessage::Push {
                token: token.to_string(),
                heading: notification.title.clone(),
                content: notification.body.clone(),
                data: notification.data.clone(),
            })
        }
        _ => None,
    }
}

pub fn sms_body(notification: &Notification, public_base_url: &str) -> String {
    format!(
        "{}\n\n{}\n\nSe mer på {}",
        notification.title,
        notification.body,
        display_host(public_base_url)
    )
}

pub fn email_html(
    notification: &Notification,
    recipient: &Recipient,
    public_base_url: &str,
) -> String {
    let details = notification
        .data
        .as_ref()
        .map(shift_details_block)
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="margin: 0; font-size: 24px;">{sender}</h1>
  <h2 style="color: #2d3748;">{title}</h2>
  <p>Hei {name},</p>
  <p>{body}</p>
{details}  <p style="text-align: center;">
    <a href="{base}/dashboard">Se vakt og søk nå</a>
  </p>
  <p style="color: #718096; font-size: 14px; text-align: center;">
    Du mottar denne e-posten fordi du har aktivert varsler for nye vakter.<br>
    <a href="{base}/settings/notifications">Endre varslingsinnstillinger</a>
  </p>
</body>
</html>
"#,
        sender = SENDER_NAME,
        title = escape_html(&notification.title),
        name = escape_html(&recipient.full_name),
        body = escape_html(&notification.body),
        details = details,
        base = public_base_url,
    )
}

fn shift_details_block(data: &ShiftNotificationData) -> String {
    format!(
        r#"  <div style="background: #f7fafc; padding: 20px; border-radius: 8px;">
    <h3>Vaktdetaljer:</h3>
    <ul style="list-style: none; padding: 0;">
      <li><strong>Yrke:</strong> {profession}</li>
      <li><strong>Dato:</strong> {date}</li>
      <li><strong>Tid:</strong> {time}</li>
      <li><strong>Timelønn:</strong> {wage} NOK</li>
    </ul>
  </div>
"#,
        profession = escape_html(&data.profession),
        date = data.start_time.format("%d.%m.%Y"),
        time = data.start_time.format("%H:%M"),
        wage = data.hourly_wage,
    )
}

fn display_host(base_url: &str) -> &str {
    base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
