//! Wire types for the washboard protocol.
//!
//! All realtime WebSocket messages use a top-level `type` field for
//! discriminated parsing. The three frozen message kinds are `timer_sync`,
//! `room_status` and `notify`.
//!
//! Realtime parsing is deliberately lenient: a field carrying an unexpected
//! type is treated as absent rather than failing the whole message, so a
//! server-side schema drift can never wipe client state it does not speak
//! about. Only the machine id is mandatory: an update that cannot be routed
//! is an error.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod message;
mod rest;

pub use message::{BoardMessage, ProtocolError, StatusUpdate, parse_message};
pub use rest::{
    CycleStartedResponse, MachineSnapshot, ReserveRequest, SetIndividualRequest,
    SetTokenRequest, SnapshotResponse, StartCourseRequest,
};

use serde::{Deserialize, Serialize};

/// Stable machine identifier, unique for the appliance lifetime.
pub type MachineId = u32;

/// Appliance kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineKind {
    /// Washing machine. Covered by room-wide subscriptions.
    Washer,
    /// Dryer. Never part of a room-wide subscription.
    Dryer,
}

/// Appliance status as reported by the server.
///
/// `Finished` reverts to `Off` only through an explicit subsequent status
/// push; the client never assumes the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    /// Idle, ready to start a cycle.
    Off,
    /// Washing phase of a cycle.
    Washing,
    /// Spin phase of a cycle.
    Spinning,
    /// Drying phase (dryers only).
    Drying,
    /// Cycle complete, laundry waiting for pickup.
    Finished,
}

impl MachineStatus {
    /// Whether the machine is in an active-operation state.
    ///
    /// Timer fields are only meaningful while operating.
    pub fn is_operating(self) -> bool {
        matches!(self, Self::Washing | Self::Spinning | Self::Drying)
    }

    /// Parse the wire spelling (`"WASHING"` etc.). `None` for unknown text.
    pub fn from_wire(text: &str) -> Option<Self> {
        match text {
            "OFF" => Some(Self::Off),
            "WASHING" => Some(Self::Washing),
            "SPINNING" => Some(Self::Spinning),
            "DRYING" => Some(Self::Drying),
            "FINISHED" => Some(Self::Finished),
            _ => None,
        }
    }
}
