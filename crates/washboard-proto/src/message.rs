//! Realtime message parsing.
//!
//! The server pushes JSON text frames. Three kinds exist:
//!
//! - `timer_sync`: periodic batch of per-machine status/timer values
//! - `room_status`: single-machine status change
//! - `notify`: single-machine event intended for a user-visible toast
//!
//! None of these carry subscription information; the caller must treat the
//! subscription state as unreported, not as `false`.

use serde_json::Value;
use thiserror::Error;

use crate::{MachineId, MachineStatus};

/// Errors from realtime message parsing.
///
/// All of these are log-and-drop at the call site; a malformed frame must
/// never take down the connection loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(String),

    /// Frame was valid JSON but not an object.
    #[error("message is not a JSON object")]
    NotAnObject,

    /// The `type` discriminator was missing or not a string.
    #[error("missing message type")]
    MissingKind,

    /// The `type` discriminator named an unknown message kind.
    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    /// A per-machine entry carried no usable machine id.
    #[error("missing machine id")]
    MissingMachineId,
}

/// A single machine's status/timer fields from a realtime frame.
///
/// Every field except the id is optional: an absent or type-mismatched
/// field means "no information", never "reset".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Target machine.
    pub machine_id: MachineId,
    /// New status, if reported.
    pub status: Option<MachineStatus>,
    /// Minutes remaining in the cycle, if reported.
    pub remaining_minutes: Option<u32>,
    /// Minutes elapsed in the cycle, if reported.
    pub elapsed_minutes: Option<u32>,
}

/// A parsed realtime message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardMessage {
    /// Periodic batch sync of machine timers.
    TimerSync {
        /// One entry per machine the server knows about. Entries without a
        /// usable machine id are dropped individually.
        machines: Vec<StatusUpdate>,
    },
    /// Single machine status change.
    RoomStatus(StatusUpdate),
    /// Single machine event that should also surface as a toast.
    Notify {
        /// The status change behind the notification.
        update: StatusUpdate,
        /// Optional server-provided display text.
        message: Option<String>,
    },
}

/// Parse a raw WebSocket text frame into a [`BoardMessage`].
pub fn parse_message(raw: &str) -> Result<BoardMessage, ProtocolError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ProtocolError::Json(e.to_string()))?;
    let obj = value.as_object().ok_or(ProtocolError::NotAnObject)?;

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingKind)?;

    match kind {
        "timer_sync" => {
            let machines = obj
                .get("machines")
                .and_then(Value::as_array)
                .map(|entries| entries.iter().filter_map(|e| status_update(e).ok()).collect())
                .unwrap_or_default();
            Ok(BoardMessage::TimerSync { machines })
        }
        "room_status" => Ok(BoardMessage::RoomStatus(status_update(&value)?)),
        "notify" => {
            let update = status_update(&value)?;
            let message = obj.get("message").and_then(Value::as_str).map(str::to_owned);
            Ok(BoardMessage::Notify { update, message })
        }
        other => Err(ProtocolError::UnknownKind(other.to_owned())),
    }
}

/// Extract a [`StatusUpdate`] from a JSON object, leniently.
fn status_update(value: &Value) -> Result<StatusUpdate, ProtocolError> {
    let obj = value.as_object().ok_or(ProtocolError::NotAnObject)?;

    let machine_id = obj
        .get("machine_id")
        .and_then(Value::as_u64)
        .and_then(|id| MachineId::try_from(id).ok())
        .ok_or(ProtocolError::MissingMachineId)?;

    Ok(StatusUpdate {
        machine_id,
        status: obj.get("status").and_then(Value::as_str).and_then(MachineStatus::from_wire),
        remaining_minutes: minutes(obj.get("remaining_minutes")),
        elapsed_minutes: minutes(obj.get("elapsed_minutes")),
    })
}

/// A non-negative minute count, or `None` for anything else.
fn minutes(value: Option<&Value>) -> Option<u32> {
    value.and_then(Value::as_u64).and_then(|m| u32::try_from(m).ok())
}
