//! Outbox notifier loop.
//!
//! Polls the notification outbox on an interval, renders each due row into
//! an email, and delivers it through the configured [`EmailNotifier`].
//! Delivery failures are recorded back onto the row, which the store
//! retries with backoff and eventually parks. A row whose payload carries
//! no recipient (a parent account without an email on file) is marked sent
//! and skipped.

use crate::config::NotifierConfig;
use crate::email::{Email, EmailNotifier};
use swimdesk_postgres::outbox::{NotificationKind, OutboxMessage, OutboxStore};
use tokio::sync::broadcast;
use tokio::time::{Duration, interval};

/// Runs the notifier until the shutdown channel fires.
pub async fn run<N: EmailNotifier>(
    outbox: OutboxStore,
    notifier: N,
    config: NotifierConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(Duration::from_secs(config.poll_interval));
    tracing::info!(
        poll_interval = config.poll_interval,
        batch_size = config.batch_size,
        "notifier started"
    );

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("notifier shutting down");
                break;
            }
            _ = ticker.tick() => {
                if let Err(error) = drain_once(&outbox, &notifier, config.batch_size).await {
                    tracing::warn!(%error, "outbox poll failed");
                }
            }
        }
    }
}

/// Drains one batch of due rows.
async fn drain_once<N: EmailNotifier>(
    outbox: &OutboxStore,
    notifier: &N,
    batch_size: i64,
) -> Result<(), swimdesk_postgres::StoreError> {
    let due = outbox.fetch_due(batch_size).await?;
    for message in due {
        match render(&message) {
            Ok(Some(email)) => match notifier.send(&email).await {
                Ok(()) => {
                    tracing::info!(id = message.id, kind = %message.kind, to = %email.to, "notification sent");
                    outbox.mark_sent(message.id).await?;
                }
                Err(error) => {
                    tracing::warn!(id = message.id, kind = %message.kind, %error, "notification delivery failed");
                    outbox.mark_failed(message.id, &error.to_string()).await?;
                }
            },
            Ok(None) => {
                tracing::debug!(id = message.id, kind = %message.kind, "no recipient, skipping");
                outbox.mark_sent(message.id).await?;
            }
            Err(error) => {
                tracing::warn!(id = message.id, kind = %message.kind, %error, "notification payload invalid");
                outbox.mark_failed(message.id, &error).await?;
            }
        }
    }
    Ok(())
}

fn str_field<'a>(payload: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(serde_json::Value::as_str)
}

/// Renders an outbox row into an email.
///
/// Returns `Ok(None)` when the payload legitimately has no recipient, and
/// `Err` when a field the template requires is missing.
fn render(message: &OutboxMessage) -> Result<Option<Email>, String> {
    let payload = &message.payload;
    let swimmer_name = str_field(payload, "swimmer_name").unwrap_or("your swimmer");

    let email = match message.kind {
        NotificationKind::BookingConfirmed => {
            let Some(to) = str_field(payload, "parent_email") else {
                return Ok(None);
            };
            let session_start = str_field(payload, "session_start")
                .ok_or_else(|| "missing session_start".to_string())?;
            Email {
                to: to.to_string(),
                subject: format!("Session booked for {swimmer_name}"),
                html_body: format!(
                    "<p>A swim session starting at {session_start} has been booked for \
                     {swimmer_name}.</p>\
                     <p>You can review or cancel the booking from the parent portal. \
                     Cancellations need at least 24 hours' notice.</p>"
                ),
            }
        }
        NotificationKind::BookingCancelled => {
            let Some(to) = str_field(payload, "parent_email") else {
                return Ok(None);
            };
            let session_start = str_field(payload, "session_start")
                .ok_or_else(|| "missing session_start".to_string())?;
            Email {
                to: to.to_string(),
                subject: format!("Booking cancelled for {swimmer_name}"),
                html_body: format!(
                    "<p>The swim session starting at {session_start} for {swimmer_name} \
                     has been cancelled.</p>"
                ),
            }
        }
        NotificationKind::AssessmentCompleted => {
            let Some(to) = str_field(payload, "parent_email") else {
                return Ok(None);
            };
            let outcome =
                str_field(payload, "outcome").ok_or_else(|| "missing outcome".to_string())?;
            Email {
                to: to.to_string(),
                subject: format!("Assessment result for {swimmer_name}"),
                html_body: format!(
                    "<p>{swimmer_name}'s swim assessment is complete: {outcome}.</p>\
                     <p>Sign in to the parent portal for details.</p>"
                ),
            }
        }
        NotificationKind::ParentInvitation => {
            let to = str_field(payload, "email").ok_or_else(|| "missing email".to_string())?;
            let claim_url =
                str_field(payload, "claim_url").ok_or_else(|| "missing claim_url".to_string())?;
            Email {
                to: to.to_string(),
                subject: format!("You're invited to manage {swimmer_name}'s swim lessons"),
                html_body: format!(
                    "<p>You've been invited to manage {swimmer_name}'s swim lessons.</p>\
                     <p><a href=\"{claim_url}\">Claim your account</a></p>\
                     <p>This link expires; if it has lapsed, ask the front desk to resend it.</p>"
                ),
            }
        }
        NotificationKind::InvitationExpired => {
            let to = str_field(payload, "email").ok_or_else(|| "missing email".to_string())?;
            Email {
                to: to.to_string(),
                subject: "Your swim lesson invitation has expired".to_string(),
                html_body: "<p>Your invitation to the parent portal has expired. \
                            Contact the front desk to request a new one.</p>"
                    .to_string(),
            }
        }
    };
    Ok(Some(email))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn message(kind: NotificationKind, payload: serde_json::Value) -> OutboxMessage {
        OutboxMessage {
            id: 1,
            kind,
            payload,
            attempts: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn booking_confirmation_renders_for_the_parent() {
        let email = render(&message(
            NotificationKind::BookingConfirmed,
            json!({
                "parent_email": "parent@example.com",
                "swimmer_name": "Ada",
                "session_start": "2026-09-01T16:00:00Z",
            }),
        ))
        .unwrap()
        .unwrap();
        assert_eq!(email.to, "parent@example.com");
        assert!(email.subject.contains("Ada"));
        assert!(email.html_body.contains("2026-09-01T16:00:00Z"));
    }

    #[test]
    fn missing_recipient_is_skipped_not_failed() {
        let rendered = render(&message(
            NotificationKind::AssessmentCompleted,
            json!({
                "parent_email": null,
                "swimmer_name": "Ada",
                "outcome": "approved",
            }),
        ))
        .unwrap();
        assert!(rendered.is_none());
    }

    #[test]
    fn invitation_includes_the_claim_link() {
        let email = render(&message(
            NotificationKind::ParentInvitation,
            json!({
                "email": "new-parent@example.com",
                "swimmer_name": "Ada",
                "claim_url": "http://localhost:8080/api/invitations/claim/abc123",
            }),
        ))
        .unwrap()
        .unwrap();
        assert!(email.html_body.contains("/api/invitations/claim/abc123"));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let result = render(&message(
            NotificationKind::ParentInvitation,
            json!({ "swimmer_name": "Ada" }),
        ));
        assert!(result.is_err());
    }
}
