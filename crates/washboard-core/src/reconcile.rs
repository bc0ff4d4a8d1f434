//! The reconciliation state machine.
//!
//! [`reconcile`] merges a partial update into a machine view-model and
//! returns side-effect intents for the caller to execute. It is total over
//! its input domain: no update, however partial, makes it panic or return
//! an error. Field-level last-write-wins; absent fields never overwrite
//! known values.

use washboard_proto::MachineStatus;

use crate::{Machine, MachineId, MachineUpdate, SubscriptionUpdate};

/// Side-effect intents produced by reconciliation.
///
/// Reconciliation itself never performs I/O; the application layer turns
/// these into service calls and store writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEffect {
    /// The machine finished while individually subscribed: the subscription
    /// has served its purpose, cancel it server-side (fire-and-forget).
    CancelIndividual(MachineId),
    /// The machine finished while the room-wide subscription was active:
    /// a slot has freed up, deactivate room mode and restore any suspended
    /// individual subscriptions.
    DeactivateRoom,
}

/// Merge `update` into `machine` and return the side-effect intents.
///
/// `room_active` is the injected room-subscription flag; it is read here
/// only to decide whether a `Finished` transition deactivates room mode.
///
/// Rules, in order:
///
/// 1. A present status replaces the stored status.
/// 2. Timer fields apply only as a pair; a half-present pair leaves both
///    stored fields unchanged. Stored fields are never nulled out; the
///    projection hides stale timers when the machine is not operating.
/// 3. Subscription state changes only on an explicit boolean.
/// 4. A transition into `Finished` emits at most one `CancelIndividual`
///    (guarded by the subscription flag it clears) and at most one
///    `DeactivateRoom` per room activation (guarded by `room_active`,
///    which the caller flips before the next message is dispatched).
pub fn reconcile(
    machine: &mut Machine,
    update: &MachineUpdate,
    room_active: bool,
) -> Vec<ReconcileEffect> {
    debug_assert_eq!(machine.id, update.id, "update routed to wrong machine");

    if let Some(status) = update.status {
        machine.status = status;
    }

    if let (Some(remaining), Some(elapsed)) = (update.remaining_minutes, update.elapsed_minutes) {
        machine.remaining_minutes = Some(remaining);
        machine.elapsed_minutes = Some(elapsed);
    }

    machine.locally_subscribed = update.subscribed.apply(machine.locally_subscribed);

    let mut effects = Vec::new();
    if update.status == Some(MachineStatus::Finished) {
        if machine.locally_subscribed {
            // Optimistic local clear; the server call may still fail, which
            // is logged and not surfaced.
            machine.locally_subscribed = false;
            effects.push(ReconcileEffect::CancelIndividual(machine.id));
        }
        if room_active {
            effects.push(ReconcileEffect::DeactivateRoom);
        }
    }
    effects
}
