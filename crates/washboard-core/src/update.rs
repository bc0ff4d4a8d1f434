//! Partial machine updates.

use washboard_proto::{MachineId, MachineStatus, StatusUpdate};

/// Subscription information carried by an update.
///
/// This is deliberately a tri-state rather than `Option<bool>` at the call
/// site vocabulary level: `Unknown` means "this message carries no
/// information about subscription state, do not touch it", which is a
/// different statement than "not subscribed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionUpdate {
    /// The server explicitly reported the subscription state.
    Known(bool),
    /// The message says nothing about subscription state.
    #[default]
    Unknown,
}

impl SubscriptionUpdate {
    /// Merge this update into a current value. `Unknown` preserves it.
    pub fn apply(self, current: bool) -> bool {
        match self {
            Self::Known(value) => value,
            Self::Unknown => current,
        }
    }
}

/// A partial update for one machine, from any of the four sources (REST
/// seed, `timer_sync`, `room_status`/`notify`, optimistic local edits).
///
/// Absent fields leave the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineUpdate {
    /// Target machine.
    pub id: MachineId,
    /// New status, if reported.
    pub status: Option<MachineStatus>,
    /// Minutes remaining, if reported. Applied only together with
    /// [`MachineUpdate::elapsed_minutes`].
    pub remaining_minutes: Option<u32>,
    /// Minutes elapsed, if reported.
    pub elapsed_minutes: Option<u32>,
    /// Subscription information.
    pub subscribed: SubscriptionUpdate,
}

impl MachineUpdate {
    /// An update carrying no fields at all.
    pub fn empty(id: MachineId) -> Self {
        Self {
            id,
            status: None,
            remaining_minutes: None,
            elapsed_minutes: None,
            subscribed: SubscriptionUpdate::Unknown,
        }
    }

    /// An update carrying only a status change.
    pub fn status(id: MachineId, status: MachineStatus) -> Self {
        Self { status: Some(status), ..Self::empty(id) }
    }

    /// An update carrying only explicit subscription state.
    pub fn subscription(id: MachineId, subscribed: bool) -> Self {
        Self { subscribed: SubscriptionUpdate::Known(subscribed), ..Self::empty(id) }
    }
}

/// Realtime frames never report subscription state.
impl From<&StatusUpdate> for MachineUpdate {
    fn from(wire: &StatusUpdate) -> Self {
        Self {
            id: wire.machine_id,
            status: wire.status,
            remaining_minutes: wire.remaining_minutes,
            elapsed_minutes: wire.elapsed_minutes,
            subscribed: SubscriptionUpdate::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_preserves_either_value() {
        assert!(SubscriptionUpdate::Unknown.apply(true));
        assert!(!SubscriptionUpdate::Unknown.apply(false));
    }

    #[test]
    fn known_overrides_either_value() {
        assert!(!SubscriptionUpdate::Known(false).apply(true));
        assert!(SubscriptionUpdate::Known(true).apply(false));
    }

    #[test]
    fn wire_updates_never_report_subscription() {
        let wire = StatusUpdate {
            machine_id: 2,
            status: Some(MachineStatus::Washing),
            remaining_minutes: Some(30),
            elapsed_minutes: Some(0),
        };
        let update = MachineUpdate::from(&wire);
        assert_eq!(update.subscribed, SubscriptionUpdate::Unknown);
    }
}
