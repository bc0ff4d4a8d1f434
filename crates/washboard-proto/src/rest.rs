//! REST request and response bodies.
//!
//! These are typed (strict serde) rather than lenient: REST exchanges are
//! initiated by this client against a known server version, and a shape
//! mismatch should fail the one call loudly instead of half-applying.

use serde::{Deserialize, Serialize};

use crate::{MachineId, MachineKind, MachineStatus};

/// One machine in the initial `POST /load` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Stable machine id.
    pub machine_id: MachineId,
    /// Washer or dryer.
    pub kind: MachineKind,
    /// Display name. Optional; the client falls back to a generated one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_name: Option<String>,
    /// Status at snapshot time.
    pub status: MachineStatus,
    /// Minutes remaining, when a cycle is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<u32>,
    /// Minutes elapsed, when a cycle is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_minutes: Option<u32>,
    /// Whether this user holds an individual subscription for the machine.
    /// Servers that do not track this omit the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<bool>,
}

/// Response body of `POST /load`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    /// All machines on this board.
    pub machine_list: Vec<MachineSnapshot>,
}

/// Request body of `POST /start_course`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCourseRequest {
    /// Target machine.
    pub machine_id: MachineId,
    /// Free-form course name (e.g. "standard").
    pub course_name: String,
}

/// Response body of `POST /start_course`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStartedResponse {
    /// Status the machine entered.
    pub status: MachineStatus,
    /// Initial remaining minutes, if the server knows the course length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<u32>,
}

/// Request body of `POST /notify_me` (individual subscription toggle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetIndividualRequest {
    /// Target machine.
    pub machine_id: MachineId,
    /// 1 to subscribe, 0 to unsubscribe. The server API predates booleans.
    pub isusing: u8,
}

impl SetIndividualRequest {
    /// Build a request from a boolean subscription intent.
    pub fn new(machine_id: MachineId, on: bool) -> Self {
        Self { machine_id, isusing: u8::from(on) }
    }
}

/// Request body of `POST /reserve` (room-wide subscription toggle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveRequest {
    /// Laundry room id. This client manages a single room.
    pub room_id: u32,
    /// 1 to activate, 0 to deactivate.
    pub isreserved: u8,
}

impl ReserveRequest {
    /// Build a request from a boolean activation intent.
    pub fn new(room_id: u32, on: bool) -> Self {
        Self { room_id, isreserved: u8::from(on) }
    }
}

/// Request body of `POST /set_fcm_token` (push capability registration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTokenRequest {
    /// Push capability token issued by the notification provider.
    pub fcm_token: String,
}
