//! Tagged JSON wire encoding for protocol messages.
//!
//! The wire form is what a message looks like when it has to leave the
//! process: a flat JSON object with a `type` discriminator, the timer `id`,
//! and, for schedule messages, the `duration` in milliseconds. The `type`
//! vocabulary is fixed:
//!
//! | direction | message                       | `type`          |
//! |-----------|-------------------------------|-----------------|
//! | to worker | schedule one-shot             | `setTimeout`    |
//! | to worker | schedule repeating            | `setInterval`   |
//! | to worker | cancel one-shot               | `clearTimeout`  |
//! | to worker | cancel repeating              | `clearInterval` |
//! | to main   | fired                         | `invoke`        |
//! | to main   | cleared (reserved)            | `clear`         |
//!
//! In-process channels carry the structured enums from [`crate::message`]
//! directly; this module is the boundary representation, also used by the
//! dispatchers when tracing message traffic.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::TimerId;
use crate::message::{MainNotification, TimerKind, WorkerRequest};

/// A wire payload that could not be decoded.
#[derive(Error, Debug)]
pub enum WireError {
    /// The payload was not valid JSON or did not match the vocabulary.
    #[error("malformed timer message: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum RequestWire {
    #[serde(rename = "setTimeout")]
    SetTimeout { id: TimerId, duration: u64 },
    #[serde(rename = "setInterval")]
    SetInterval { id: TimerId, duration: u64 },
    #[serde(rename = "clearTimeout")]
    ClearTimeout { id: TimerId },
    #[serde(rename = "clearInterval")]
    ClearInterval { id: TimerId },
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum NotificationWire {
    #[serde(rename = "invoke")]
    Invoke { id: TimerId },
    #[serde(rename = "clear")]
    Clear { id: TimerId },
}

impl From<&WorkerRequest> for RequestWire {
    fn from(request: &WorkerRequest) -> Self {
        match *request {
            WorkerRequest::Schedule {
                id,
                kind: TimerKind::OneShot,
                duration,
            } => RequestWire::SetTimeout {
                id,
                duration: duration.as_millis() as u64,
            },
            WorkerRequest::Schedule {
                id,
                kind: TimerKind::Repeating,
                duration,
            } => RequestWire::SetInterval {
                id,
                duration: duration.as_millis() as u64,
            },
            WorkerRequest::Cancel {
                id,
                kind: TimerKind::OneShot,
            } => RequestWire::ClearTimeout { id },
            WorkerRequest::Cancel {
                id,
                kind: TimerKind::Repeating,
            } => RequestWire::ClearInterval { id },
        }
    }
}

impl From<RequestWire> for WorkerRequest {
    fn from(wire: RequestWire) -> Self {
        match wire {
            RequestWire::SetTimeout { id, duration } => WorkerRequest::Schedule {
                id,
                kind: TimerKind::OneShot,
                duration: Duration::from_millis(duration),
            },
            RequestWire::SetInterval { id, duration } => WorkerRequest::Schedule {
                id,
                kind: TimerKind::Repeating,
                duration: Duration::from_millis(duration),
            },
            RequestWire::ClearTimeout { id } => WorkerRequest::Cancel {
                id,
                kind: TimerKind::OneShot,
            },
            RequestWire::ClearInterval { id } => WorkerRequest::Cancel {
                id,
                kind: TimerKind::Repeating,
            },
        }
    }
}

impl From<&MainNotification> for NotificationWire {
    fn from(notification: &MainNotification) -> Self {
        match *notification {
            MainNotification::Fired { id } => NotificationWire::Invoke { id },
            MainNotification::Cleared { id } => NotificationWire::Clear { id },
        }
    }
}

impl From<NotificationWire> for MainNotification {
    fn from(wire: NotificationWire) -> Self {
        match wire {
            NotificationWire::Invoke { id } => MainNotification::Fired { id },
            NotificationWire::Clear { id } => MainNotification::Cleared { id },
        }
    }
}

/// Encode a request for the wire.
pub fn encode_request(request: &WorkerRequest) -> String {
    // A flat struct of Copy fields cannot fail to serialize.
    serde_json::to_string(&RequestWire::from(request)).unwrap_or_default()
}

/// Decode a request from the wire.
pub fn decode_request(payload: &str) -> Result<WorkerRequest, WireError> {
    Ok(serde_json::from_str::<RequestWire>(payload)?.into())
}

/// Encode a notification for the wire.
pub fn encode_notification(notification: &MainNotification) -> String {
    serde_json::to_string(&NotificationWire::from(notification)).unwrap_or_default()
}

/// Decode a notification from the wire.
pub fn decode_notification(payload: &str) -> Result<MainNotification, WireError> {
    Ok(serde_json::from_str::<NotificationWire>(payload)?.into())
}
