//! User-action orchestration.
//!
//! The [`ActionCoordinator`] runs one multi-step plan per control: the
//! triggering control is locked by registering the plan synchronously
//! (before any asynchronous work), each service call is issued in order,
//! and any failure rolls the UI back to the exact pre-action snapshot plus
//! explicit compensating calls for steps that had already succeeded. The
//! same snapshot/rollback path serves every action rather than being
//! duplicated per handler.

use std::collections::{BTreeSet, HashMap, VecDeque};

use washboard_core::{BoardError, Machine, MachineId};

use crate::{CapabilityGrant, CycleStarted, ServiceCall};

/// The control a plan belongs to. One in-flight plan per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKey {
    /// A machine card's primary control.
    Machine(MachineId),
    /// The room-wide subscription button.
    Room,
}

/// Successful reply from a service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallReply {
    /// Call succeeded with no payload.
    Ack,
    /// Capability token request resolved.
    Capability(CapabilityGrant),
    /// Course start confirmed.
    CycleStarted(CycleStarted),
}

/// Exact state captured before a plan's optimistic update.
///
/// Rollback restores this, not a guessed default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSnapshot {
    /// Pre-action clones of every machine the plan may touch.
    pub machines: Vec<Machine>,
    /// Persisted room flag before the action.
    pub room_active: bool,
    /// Persisted individual flags before the action.
    pub individual: Vec<(MachineId, bool)>,
    /// Suspended-subscription set before the action. `None` leaves the
    /// stored snapshot untouched on rollback.
    pub suspended: Option<BTreeSet<MachineId>>,
}

/// What a plan did next after a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanProgress {
    /// Plan accepted; issue this first call.
    Started(ServiceCall),
    /// A plan is already in flight for this control; the repeat intent is
    /// dropped (double-submit guard).
    AlreadyPending,
    /// Issue the next call in the sequence.
    Next(ServiceCall),
    /// All calls succeeded; `call`/`reply` are the final step's.
    Complete {
        /// The final call of the plan.
        call: ServiceCall,
        /// Its reply.
        reply: CallReply,
    },
    /// A step failed; restore `snapshot` and issue the compensations.
    Failed {
        /// Pre-action state to restore.
        snapshot: PlanSnapshot,
        /// Fire-and-forget calls undoing steps that already succeeded.
        compensations: Vec<ServiceCall>,
        /// Why the plan failed.
        reason: BoardError,
    },
}

#[derive(Debug)]
struct PendingPlan {
    snapshot: PlanSnapshot,
    remaining: VecDeque<ServiceCall>,
    completed: Vec<ServiceCall>,
}

/// Tracks in-flight multi-step user actions.
#[derive(Debug, Default)]
pub struct ActionCoordinator {
    pending: HashMap<PlanKey, PendingPlan>,
}

impl ActionCoordinator {
    /// Create an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a plan is in flight for this control.
    pub fn is_pending(&self, key: PlanKey) -> bool {
        self.pending.contains_key(&key)
    }

    /// Register a plan and return its first call.
    ///
    /// This runs synchronously in the event handler, so a double-click
    /// arriving before any asynchronous work observes the pending entry
    /// and is dropped.
    pub fn begin(
        &mut self,
        key: PlanKey,
        plan: Vec<ServiceCall>,
        snapshot: PlanSnapshot,
    ) -> PlanProgress {
        if self.pending.contains_key(&key) {
            return PlanProgress::AlreadyPending;
        }
        let mut remaining: VecDeque<ServiceCall> = plan.into();
        let Some(first) = remaining.pop_front() else {
            tracing::warn!(?key, "empty action plan");
            return PlanProgress::AlreadyPending;
        };
        self.pending.insert(key, PendingPlan { snapshot, remaining, completed: Vec::new() });
        PlanProgress::Started(first)
    }

    /// Advance the plan for `key` with the outcome of `call`.
    ///
    /// Returns `None` when no plan is registered for the key (a stale
    /// completion after a rollback), which is logged and ignored.
    pub fn on_reply(
        &mut self,
        key: PlanKey,
        call: ServiceCall,
        outcome: Result<CallReply, BoardError>,
    ) -> Option<PlanProgress> {
        let Some(mut plan) = self.pending.remove(&key) else {
            tracing::warn!(?key, ?call, "completion for unknown plan");
            return None;
        };

        let reply = match outcome {
            Ok(reply) => reply,
            Err(reason) => return Some(fail(plan, reason)),
        };

        // A capability grant either feeds the following registration step
        // or fails the plan with permission-specific guidance.
        if let CallReply::Capability(grant) = &reply {
            match grant {
                CapabilityGrant::Granted(token) => patch_token(&mut plan, token),
                CapabilityGrant::Blocked => {
                    return Some(fail(plan, BoardError::CapabilityBlocked));
                }
                CapabilityGrant::Declined => {
                    return Some(fail(plan, BoardError::CapabilityDeclined));
                }
            }
        }

        plan.completed.push(call.clone());
        if let Some(next) = plan.remaining.pop_front() {
            self.pending.insert(key, plan);
            return Some(PlanProgress::Next(next));
        }
        Some(PlanProgress::Complete { call, reply })
    }
}

/// Abort the plan and build the rollback instruction.
fn fail(plan: PendingPlan, reason: BoardError) -> PlanProgress {
    let compensations = compensations(&plan.completed, &plan.snapshot);
    PlanProgress::Failed { snapshot: plan.snapshot, compensations, reason }
}

/// Substitute the granted token into the upcoming registration step.
fn patch_token(plan: &mut PendingPlan, token: &str) {
    for step in &mut plan.remaining {
        if let ServiceCall::RegisterCapability { token: slot } = step {
            token.clone_into(slot);
            break;
        }
    }
}

/// Compensating calls for completed steps, newest first.
///
/// Partial success needs explicit cleanup: a subscription that succeeded
/// before a later step failed is reverted to the snapshotted flag, not
/// left for the server to self-correct.
fn compensations(completed: &[ServiceCall], snapshot: &PlanSnapshot) -> Vec<ServiceCall> {
    completed
        .iter()
        .rev()
        .filter_map(|call| match call {
            ServiceCall::SetIndividual { id, on } => {
                let prior = snapshot
                    .individual
                    .iter()
                    .find(|(machine_id, _)| machine_id == id)
                    .map_or(!on, |(_, flag)| *flag);
                Some(ServiceCall::SetIndividual { id: *id, on: prior })
            }
            ServiceCall::SetRoom { .. } => {
                Some(ServiceCall::SetRoom { on: snapshot.room_active })
            }
            // Token steps have no server state to undo; a started cycle is
            // always the final step, so nothing can fail after it.
            ServiceCall::RequestCapability
            | ServiceCall::RegisterCapability { .. }
            | ServiceCall::StartCycle { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_plan(id: MachineId) -> Vec<ServiceCall> {
        vec![
            ServiceCall::RequestCapability,
            ServiceCall::RegisterCapability { token: String::new() },
            ServiceCall::SetIndividual { id, on: true },
            ServiceCall::StartCycle { id, course: "standard".into() },
        ]
    }

    fn snapshot_with_individual(id: MachineId, flag: bool) -> PlanSnapshot {
        PlanSnapshot { individual: vec![(id, flag)], ..PlanSnapshot::default() }
    }

    #[test]
    fn double_submit_is_dropped() {
        let mut coordinator = ActionCoordinator::new();
        let key = PlanKey::Machine(2);
        let first = coordinator.begin(key, start_plan(2), PlanSnapshot::default());
        assert!(matches!(first, PlanProgress::Started(ServiceCall::RequestCapability)));

        let second = coordinator.begin(key, start_plan(2), PlanSnapshot::default());
        assert_eq!(second, PlanProgress::AlreadyPending);
    }

    #[test]
    fn granted_token_feeds_registration_step() {
        let mut coordinator = ActionCoordinator::new();
        let key = PlanKey::Machine(2);
        coordinator.begin(key, start_plan(2), PlanSnapshot::default());

        let progress = coordinator.on_reply(
            key,
            ServiceCall::RequestCapability,
            Ok(CallReply::Capability(CapabilityGrant::Granted("tok-123".into()))),
        );
        assert_eq!(
            progress,
            Some(PlanProgress::Next(ServiceCall::RegisterCapability { token: "tok-123".into() }))
        );
    }

    #[test]
    fn blocked_capability_fails_with_guidance_variant() {
        let mut coordinator = ActionCoordinator::new();
        let key = PlanKey::Machine(2);
        coordinator.begin(key, start_plan(2), PlanSnapshot::default());

        let progress = coordinator
            .on_reply(
                key,
                ServiceCall::RequestCapability,
                Ok(CallReply::Capability(CapabilityGrant::Blocked)),
            )
            .unwrap();
        let PlanProgress::Failed { reason, compensations, .. } = progress else {
            panic!("expected failure");
        };
        assert_eq!(reason, BoardError::CapabilityBlocked);
        assert!(compensations.is_empty(), "nothing succeeded, nothing to undo");
        assert!(!coordinator.is_pending(key));
    }

    #[test]
    fn late_failure_compensates_earlier_subscription() {
        let mut coordinator = ActionCoordinator::new();
        let key = PlanKey::Machine(2);
        coordinator.begin(key, start_plan(2), snapshot_with_individual(2, false));

        let grant = CallReply::Capability(CapabilityGrant::Granted("tok".into()));
        coordinator.on_reply(key, ServiceCall::RequestCapability, Ok(grant));
        coordinator
            .on_reply(key, ServiceCall::RegisterCapability { token: "tok".into() }, Ok(CallReply::Ack));
        coordinator.on_reply(key, ServiceCall::SetIndividual { id: 2, on: true }, Ok(CallReply::Ack));

        let progress = coordinator
            .on_reply(
                key,
                ServiceCall::StartCycle { id: 2, course: "standard".into() },
                Err(BoardError::ActionRejected("machine busy".into())),
            )
            .unwrap();
        let PlanProgress::Failed { compensations, .. } = progress else {
            panic!("expected failure");
        };
        assert_eq!(compensations, vec![ServiceCall::SetIndividual { id: 2, on: false }]);
    }

    #[test]
    fn full_plan_completes_with_final_reply() {
        let mut coordinator = ActionCoordinator::new();
        let key = PlanKey::Machine(2);
        coordinator.begin(key, start_plan(2), PlanSnapshot::default());

        let grant = CallReply::Capability(CapabilityGrant::Granted("tok".into()));
        coordinator.on_reply(key, ServiceCall::RequestCapability, Ok(grant));
        coordinator
            .on_reply(key, ServiceCall::RegisterCapability { token: "tok".into() }, Ok(CallReply::Ack));
        coordinator.on_reply(key, ServiceCall::SetIndividual { id: 2, on: true }, Ok(CallReply::Ack));

        let started = CycleStarted {
            status: washboard_core::MachineStatus::Washing,
            remaining_minutes: Some(42),
        };
        let progress = coordinator
            .on_reply(
                key,
                ServiceCall::StartCycle { id: 2, course: "standard".into() },
                Ok(CallReply::CycleStarted(started.clone())),
            )
            .unwrap();
        assert_eq!(
            progress,
            PlanProgress::Complete {
                call: ServiceCall::StartCycle { id: 2, course: "standard".into() },
                reply: CallReply::CycleStarted(started),
            }
        );
        assert!(!coordinator.is_pending(key));
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut coordinator = ActionCoordinator::new();
        let progress = coordinator.on_reply(
            PlanKey::Room,
            ServiceCall::SetRoom { on: true },
            Ok(CallReply::Ack),
        );
        assert!(progress.is_none());
    }
}
