//! Fire-and-forget notification hook.
//!
//! The core emits events and never depends on delivery success; the default
//! implementation only logs. Real transports (email, push) plug in behind
//! the [`Notifier`] trait.

use serde::Serialize;
use uuid::Uuid;

/// Events the core emits as side effects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum CircleEvent {
    InvitationRedeemed {
        circle_id: Uuid,
        invitation_code: String,
        new_member: Uuid,
        issued_by: Uuid,
    },
    RideFinished {
        circle_id: Uuid,
        ride_id: Uuid,
        offered_by: Uuid,
    },
}

/// Fire-and-forget event sink.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: CircleEvent);
}

/// Default notifier that writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: CircleEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(event = %payload, "Circle event"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize circle event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_shape() {
        let event = CircleEvent::RideFinished {
            circle_id: Uuid::nil(),
            ride_id: Uuid::nil(),
            offered_by: Uuid::nil(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "ride_finished");
        assert!(json["ride_id"].is_string());
    }

    #[tokio::test]
    async fn test_log_notifier_does_not_fail() {
        let notifier = LogNotifier;
        notifier
            .notify(CircleEvent::InvitationRedeemed {
                circle_id: Uuid::nil(),
                invitation_code: "ABCD-EFGH-JKLM".into(),
                new_member: Uuid::nil(),
                issued_by: Uuid::nil(),
            })
            .await;
    }
}
