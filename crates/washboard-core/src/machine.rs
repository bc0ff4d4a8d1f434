//! Machine view-model.

use washboard_proto::{MachineId, MachineKind, MachineSnapshot, MachineStatus};

/// In-memory view-model for one appliance.
///
/// Created once from the initial REST snapshot and mutated in place for the
/// lifetime of the page session; machines are never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    /// Stable machine id.
    pub id: MachineId,
    /// Washer or dryer.
    pub kind: MachineKind,
    /// Display name.
    pub name: String,
    /// Current status.
    pub status: MachineStatus,
    /// Minutes remaining in the running cycle. Display-only; never gates
    /// status transitions.
    pub remaining_minutes: Option<u32>,
    /// Minutes elapsed in the running cycle. Paired with
    /// [`Machine::remaining_minutes`]: both are used together or not at all.
    pub elapsed_minutes: Option<u32>,
    /// Whether this client believes it holds an individual completion
    /// subscription. Client-local derived state, not authoritative; only
    /// updates carrying an explicit boolean may change it.
    pub locally_subscribed: bool,
}

impl Machine {
    /// Build a view-model from a REST snapshot entry.
    ///
    /// A missing subscription flag in the snapshot means "not subscribed":
    /// at seed time there is no earlier state to preserve.
    pub fn from_snapshot(snapshot: &MachineSnapshot) -> Self {
        let name = snapshot
            .machine_name
            .clone()
            .unwrap_or_else(|| default_name(snapshot.kind, snapshot.machine_id));
        Self {
            id: snapshot.machine_id,
            kind: snapshot.kind,
            name,
            status: snapshot.status,
            remaining_minutes: snapshot.remaining_minutes,
            elapsed_minutes: snapshot.elapsed_minutes,
            locally_subscribed: snapshot.subscribed.unwrap_or(false),
        }
    }

    /// Whether the machine is in an active-operation state.
    pub fn is_operating(&self) -> bool {
        self.status.is_operating()
    }

    /// Total cycle length in minutes, when both timer fields are known.
    pub fn timer_total(&self) -> Option<u32> {
        match (self.remaining_minutes, self.elapsed_minutes) {
            (Some(remaining), Some(elapsed)) => Some(remaining + elapsed),
            _ => None,
        }
    }
}

fn default_name(kind: MachineKind, id: MachineId) -> String {
    match kind {
        MachineKind::Washer => format!("Washer {id}"),
        MachineKind::Dryer => format!("Dryer {id}"),
    }
}
