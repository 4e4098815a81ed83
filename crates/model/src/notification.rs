use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Info,
    Error,
}

/// What triggered a notification. The wording in `Notification::message` is
/// only a suggestion for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum NotificationEvent {
    CallConnected,
    CallEnded,
    QuotaExhausted,
    RecordingStarted,
    RecordingStopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub event: NotificationEvent,
    pub message: String,
}

impl Notification {
    fn info(event: NotificationEvent, message: &str) -> Self {
        Self {
            kind: NotificationKind::Info,
            event,
            message: message.to_owned(),
        }
    }

    fn error(event: NotificationEvent, message: &str) -> Self {
        Self {
            kind: NotificationKind::Error,
            event,
            message: message.to_owned(),
        }
    }

    pub fn call_connected() -> Self {
        Self::info(NotificationEvent::CallConnected, "Call connected with driver")
    }

    pub fn call_ended() -> Self {
        Self::info(NotificationEvent::CallEnded, "Call ended")
    }

    pub fn quota_exhausted() -> Self {
        Self::error(
            NotificationEvent::QuotaExhausted,
            "Daily call limit reached. Please try again tomorrow.",
        )
    }

    pub fn recording_started() -> Self {
        Self::info(NotificationEvent::RecordingStarted, "Recording started")
    }

    pub fn recording_stopped() -> Self {
        Self::info(NotificationEvent::RecordingStopped, "Recording stopped")
    }
}
