//! Application state machine.
//!
//! [`App`] owns the machine registry, the persisted subscription store and
//! the in-flight action plans. It is a pure state machine: it consumes
//! [`crate::AppEvent`] inputs and produces [`crate::AppAction`] instructions
//! for the runtime to execute. All four update sources (REST seed, realtime
//! frames, user intents, call completions) are serialized through
//! [`App::handle`] on the single runtime task, so field-level last-write-wins
//! per the reconciliation rules is the only ordering discipline needed.

use std::collections::{BTreeSet, HashMap};

use washboard_core::{
    BoardError, CardProjection, KvStore, Machine, MachineId, MachineKind, MachineUpdate,
    PrimaryControl, ReconcileEffect, SubscriptionStore, SubscriptionUpdate, project, reconcile,
};
use washboard_proto::{BoardMessage, MachineSnapshot, StatusUpdate, parse_message};

use crate::{
    ActionCoordinator, AppAction, AppEvent, CallReply, ConnectionManager, CycleStarted, LinkState,
    PlanKey, PlanProgress, PlanSnapshot, ServiceCall,
};

/// Application state machine.
///
/// No I/O dependencies; fully testable without a runtime.
pub struct App {
    /// Machine registry, seeded once from the REST snapshot.
    machines: HashMap<MachineId, Machine>,
    /// Board display order (snapshot order).
    order: Vec<MachineId>,
    /// Persisted subscription flags, injected rather than read from
    /// ambient storage at arbitrary call sites.
    store: SubscriptionStore<Box<dyn KvStore + Send>>,
    /// In-flight user action plans.
    coordinator: ActionCoordinator,
    /// Realtime channel lifecycle.
    link: ConnectionManager,
    /// Transient status line. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create an app over the given persistence backend.
    pub fn new(kv: Box<dyn KvStore + Send>) -> Self {
        Self {
            machines: HashMap::new(),
            order: Vec::new(),
            store: SubscriptionStore::new(kv),
            coordinator: ActionCoordinator::new(),
            link: ConnectionManager::new(),
            status_message: None,
        }
    }

    /// Initiate the first realtime connection attempt.
    pub fn connect(&mut self) -> Vec<AppAction> {
        self.link.start();
        vec![AppAction::Connect, AppAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::SnapshotLoaded { machines } => self.seed(machines),
            AppEvent::SnapshotFailed { reason } => {
                self.status_message = Some(format!("Could not load machines: {reason}"));
                vec![AppAction::Render]
            }
            AppEvent::ChannelOpened => {
                self.link.on_opened();
                vec![AppAction::Render]
            }
            AppEvent::ChannelClosed => {
                let delay = self.link.on_closed();
                vec![AppAction::ScheduleReconnect { delay }, AppAction::Render]
            }
            AppEvent::RetryElapsed => {
                self.link.on_retry_elapsed();
                vec![AppAction::Connect, AppAction::Render]
            }
            AppEvent::MessageReceived { raw } => self.on_message(&raw),
            AppEvent::StartCycle { id, course } => self.on_start_cycle(id, course),
            AppEvent::ToggleSubscription { id } => self.on_toggle_subscription(id),
            AppEvent::ToggleRoom => self.on_toggle_room(),
            AppEvent::CallCompleted { key, call, outcome } => {
                self.on_call_completed(key, call, outcome)
            }
        }
    }

    // -----------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------

    /// Replace the registry from the REST snapshot.
    fn seed(&mut self, snapshots: Vec<MachineSnapshot>) -> Vec<AppAction> {
        self.machines.clear();
        self.order.clear();
        for snapshot in &snapshots {
            let mut machine = Machine::from_snapshot(snapshot);
            match snapshot.subscribed {
                // An authoritative server flag also refreshes persistence.
                Some(flag) => self.store.set_individual(machine.id, flag),
                // Server silent: fall back to the locally persisted flag.
                None => machine.locally_subscribed = self.store.individual(machine.id),
            }
            self.order.push(machine.id);
            self.machines.insert(machine.id, machine);
        }
        tracing::info!(count = self.order.len(), "machine registry seeded");
        vec![AppAction::Render]
    }

    /// Stored machine state. `None` for ids not on this board.
    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(&id)
    }

    /// Machines in board order with their card projections.
    pub fn board(&self) -> Vec<(&Machine, CardProjection)> {
        self.order
            .iter()
            .filter_map(|id| self.machines.get(id))
            .map(|machine| (machine, self.project_card(machine)))
            .collect()
    }

    /// Card projection for one machine. `None` for unknown ids.
    pub fn card(&self, id: MachineId) -> Option<CardProjection> {
        self.machines.get(&id).map(|machine| self.project_card(machine))
    }

    fn project_card(&self, machine: &Machine) -> CardProjection {
        let mut card = project(machine, self.store.is_room_active());
        // An in-flight plan keeps the triggering control locked until the
        // outcome (confirm or rollback) arrives.
        if self.coordinator.is_pending(PlanKey::Machine(machine.id)) {
            card.enabled = false;
        }
        card
    }

    /// Whether the room-wide subscription is active.
    pub fn room_active(&self) -> bool {
        self.store.is_room_active()
    }

    /// Whether the room button has an in-flight plan.
    pub fn room_pending(&self) -> bool {
        self.coordinator.is_pending(PlanKey::Room)
    }

    /// Realtime channel state, for the connection banner.
    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// Transient status line. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    // -----------------------------------------------------------------
    // Realtime messages
    // -----------------------------------------------------------------

    fn on_message(&mut self, raw: &str) -> Vec<AppAction> {
        let message = match parse_message(raw) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(%err, "dropping malformed realtime message");
                return Vec::new();
            }
        };

        let mut actions = Vec::new();
        match message {
            BoardMessage::TimerSync { machines } => {
                for update in &machines {
                    actions.extend(self.apply_wire(update));
                }
            }
            BoardMessage::RoomStatus(update) => {
                actions.extend(self.apply_wire(&update));
            }
            BoardMessage::Notify { update, message } => {
                actions.extend(self.apply_wire(&update));
                if let Some(text) = message.or_else(|| self.notify_text(&update)) {
                    actions.push(AppAction::Toast { text });
                }
            }
        }
        actions.push(AppAction::Render);
        actions
    }

    fn notify_text(&self, update: &StatusUpdate) -> Option<String> {
        let machine = self.machines.get(&update.machine_id)?;
        let status = update.status?;
        Some(format!("{}: {status:?}", machine.name))
    }

    /// Apply one wire update through the reconciliation engine and execute
    /// the resulting side-effect intents.
    fn apply_wire(&mut self, wire: &StatusUpdate) -> Vec<AppAction> {
        let update = MachineUpdate::from(wire);
        self.apply_update(&update)
    }

    fn apply_update(&mut self, update: &MachineUpdate) -> Vec<AppAction> {
        let Some(machine) = self.machines.get_mut(&update.id) else {
            // Appliance not on this page; logged, never thrown.
            tracing::warn!(machine_id = update.id, "dropping update for unknown machine");
            return Vec::new();
        };

        let room_active = self.store.is_room_active();
        let effects = reconcile(machine, update, room_active);

        let mut actions = Vec::new();
        for effect in effects {
            match effect {
                ReconcileEffect::CancelIndividual(id) => {
                    self.store.set_individual(id, false);
                    // Fire-and-forget; failure is logged, not surfaced.
                    actions.push(AppAction::Invoke {
                        key: None,
                        call: ServiceCall::SetIndividual { id, on: false },
                    });
                }
                ReconcileEffect::DeactivateRoom => {
                    actions.extend(self.deactivate_room());
                }
            }
        }
        actions
    }

    /// One-shot room deactivation: flip the flag, restore the suspended
    /// individual subscriptions locally, then confirm each over the
    /// network.
    fn deactivate_room(&mut self) -> Vec<AppAction> {
        self.store.set_room_active(false);
        let restored = self.store.take_snapshot();

        let mut actions = Vec::new();
        for id in restored {
            if let Some(machine) = self.machines.get_mut(&id) {
                machine.locally_subscribed = true;
            }
            self.store.set_individual(id, true);
            actions.push(AppAction::Invoke {
                key: None,
                call: ServiceCall::SetIndividual { id, on: true },
            });
        }
        self.status_message = Some("A washer is free. Room alert fulfilled.".into());
        actions
    }

    // -----------------------------------------------------------------
    // User intents
    // -----------------------------------------------------------------

    fn on_start_cycle(&mut self, id: MachineId, course: String) -> Vec<AppAction> {
        let key = PlanKey::Machine(id);
        if self.coordinator.is_pending(key) {
            return Vec::new();
        }
        let Some(card) = self.card(id) else {
            tracing::warn!(machine_id = id, "start request for unknown machine");
            return Vec::new();
        };
        if !card.enabled || card.control != PrimaryControl::StartCycle {
            tracing::debug!(machine_id = id, "start request ignored, control not startable");
            return Vec::new();
        }

        let snapshot = self.machine_snapshot(id);
        let plan = vec![
            ServiceCall::RequestCapability,
            ServiceCall::RegisterCapability { token: String::new() },
            ServiceCall::SetIndividual { id, on: true },
            ServiceCall::StartCycle { id, course },
        ];
        self.begin_plan(key, plan, snapshot, format!("Starting machine {id}…"))
    }

    fn on_toggle_subscription(&mut self, id: MachineId) -> Vec<AppAction> {
        let key = PlanKey::Machine(id);
        if self.coordinator.is_pending(key) {
            return Vec::new();
        }
        let Some(card) = self.card(id) else {
            tracing::warn!(machine_id = id, "subscription toggle for unknown machine");
            return Vec::new();
        };
        let subscribe = match card.control {
            PrimaryControl::Notify if card.enabled => true,
            PrimaryControl::CancelNotify if card.enabled => false,
            _ => {
                tracing::debug!(machine_id = id, "toggle ignored, control not actionable");
                return Vec::new();
            }
        };

        let snapshot = self.machine_snapshot(id);
        let plan = if subscribe {
            vec![
                ServiceCall::RequestCapability,
                ServiceCall::RegisterCapability { token: String::new() },
                ServiceCall::SetIndividual { id, on: true },
            ]
        } else {
            vec![ServiceCall::SetIndividual { id, on: false }]
        };

        // Optimistic flip; rollback restores the snapshot on failure.
        if let Some(machine) = self.machines.get_mut(&id) {
            machine.locally_subscribed = subscribe;
        }
        self.store.set_individual(id, subscribe);

        let message = if subscribe {
            format!("Requesting notification for machine {id}…")
        } else {
            format!("Cancelling notification for machine {id}…")
        };
        self.begin_plan(key, plan, snapshot, message)
    }

    fn on_toggle_room(&mut self) -> Vec<AppAction> {
        if self.coordinator.is_pending(PlanKey::Room) {
            return Vec::new();
        }
        if self.store.is_room_active() {
            self.room_off_intent()
        } else {
            self.room_on_intent()
        }
    }

    /// Activate room mode: suspend the currently subscribed washers into
    /// the snapshot and lock their controls.
    fn room_on_intent(&mut self) -> Vec<AppAction> {
        // Pre-action stored snapshot, restored verbatim on rollback.
        let prior_suspended = self.store.take_snapshot();

        let suspended: BTreeSet<MachineId> = self
            .machines
            .values()
            .filter(|m| m.kind == MachineKind::Washer && m.locally_subscribed)
            .map(|m| m.id)
            .collect();

        let snapshot =
            PlanSnapshot { room_active: false, suspended: Some(prior_suspended), ..PlanSnapshot::default() };

        self.store.save_snapshot(&suspended);
        self.store.set_room_active(true);

        let plan = vec![
            ServiceCall::RequestCapability,
            ServiceCall::RegisterCapability { token: String::new() },
            ServiceCall::SetRoom { on: true },
        ];
        self.begin_plan(PlanKey::Room, plan, snapshot, "Activating room alert…".into())
    }

    /// Deactivate room mode on user request: restore suspended
    /// subscriptions locally and confirm them over the network.
    fn room_off_intent(&mut self) -> Vec<AppAction> {
        let restored = self.store.take_snapshot();

        // Exact pre-action state of everything this intent mutates.
        let snapshot = PlanSnapshot {
            machines: restored
                .iter()
                .filter_map(|id| self.machines.get(id))
                .cloned()
                .collect(),
            room_active: true,
            individual: restored.iter().map(|id| (*id, self.store.individual(*id))).collect(),
            suspended: Some(restored.clone()),
        };

        self.store.set_room_active(false);
        let mut actions = Vec::new();
        for id in &restored {
            if let Some(machine) = self.machines.get_mut(id) {
                machine.locally_subscribed = true;
            }
            self.store.set_individual(*id, true);
            actions.push(AppAction::Invoke {
                key: None,
                call: ServiceCall::SetIndividual { id: *id, on: true },
            });
        }

        let plan = vec![ServiceCall::SetRoom { on: false }];
        actions.extend(self.begin_plan(
            PlanKey::Room,
            plan,
            snapshot,
            "Deactivating room alert…".into(),
        ));
        actions
    }

    /// Register a plan, remember the status line, and issue its first call.
    fn begin_plan(
        &mut self,
        key: PlanKey,
        plan: Vec<ServiceCall>,
        snapshot: PlanSnapshot,
        message: String,
    ) -> Vec<AppAction> {
        match self.coordinator.begin(key, plan, snapshot) {
            PlanProgress::Started(call) => {
                self.status_message = Some(message);
                vec![AppAction::Invoke { key: Some(key), call }, AppAction::Render]
            }
            _ => Vec::new(),
        }
    }

    /// Pre-action snapshot for a single-machine plan.
    fn machine_snapshot(&self, id: MachineId) -> PlanSnapshot {
        PlanSnapshot {
            machines: self.machines.get(&id).cloned().into_iter().collect(),
            room_active: self.store.is_room_active(),
            individual: vec![(id, self.store.individual(id))],
            suspended: None,
        }
    }

    // -----------------------------------------------------------------
    // Call completions
    // -----------------------------------------------------------------

    fn on_call_completed(
        &mut self,
        key: Option<PlanKey>,
        call: ServiceCall,
        outcome: Result<CallReply, BoardError>,
    ) -> Vec<AppAction> {
        let Some(key) = key else {
            if let Err(err) = outcome {
                tracing::warn!(%err, ?call, "background call failed");
            }
            return Vec::new();
        };

        match self.coordinator.on_reply(key, call, outcome) {
            Some(PlanProgress::Next(call)) => {
                vec![AppAction::Invoke { key: Some(key), call }]
            }
            Some(PlanProgress::Complete { call, reply }) => self.finish_plan(key, &call, reply),
            Some(PlanProgress::Failed { snapshot, compensations, reason }) => {
                self.rollback(snapshot, compensations, &reason)
            }
            Some(progress) => {
                tracing::warn!(?progress, "unexpected plan progress from completion");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Replace the optimistic placeholder with confirmed state.
    fn finish_plan(&mut self, key: PlanKey, call: &ServiceCall, reply: CallReply) -> Vec<AppAction> {
        match (key, call, reply) {
            (
                PlanKey::Machine(id),
                ServiceCall::StartCycle { .. },
                CallReply::CycleStarted(CycleStarted { status, remaining_minutes }),
            ) => {
                // Confirmation flows through the same reconciliation path
                // as any other update.
                let update = MachineUpdate {
                    id,
                    status: Some(status),
                    remaining_minutes,
                    elapsed_minutes: remaining_minutes.map(|_| 0),
                    subscribed: SubscriptionUpdate::Known(true),
                };
                self.store.set_individual(id, true);
                let mut actions = self.apply_update(&update);
                self.status_message = Some(format!("Machine {id} started."));
                actions.push(AppAction::Render);
                actions
            }
            (PlanKey::Machine(id), ServiceCall::SetIndividual { on, .. }, _) => {
                // Applied optimistically; just confirm the status line.
                self.status_message = Some(if *on {
                    format!("You'll be notified when machine {id} finishes.")
                } else {
                    format!("Notification for machine {id} cancelled.")
                });
                vec![AppAction::Render]
            }
            (PlanKey::Room, ServiceCall::SetRoom { on }, _) => {
                self.status_message = Some(if *on {
                    "Room alert active: you'll be notified when a washer frees up.".into()
                } else {
                    "Room alert off.".into()
                });
                vec![AppAction::Render]
            }
            (key, call, reply) => {
                tracing::warn!(?key, ?call, ?reply, "unmatched plan completion");
                vec![AppAction::Render]
            }
        }
    }

    /// Restore the exact pre-action snapshot and issue compensations.
    fn rollback(
        &mut self,
        snapshot: PlanSnapshot,
        compensations: Vec<ServiceCall>,
        reason: &BoardError,
    ) -> Vec<AppAction> {
        for machine in snapshot.machines {
            self.machines.insert(machine.id, machine);
        }
        self.store.set_room_active(snapshot.room_active);
        for (id, flag) in snapshot.individual {
            self.store.set_individual(id, flag);
        }
        if let Some(suspended) = snapshot.suspended {
            if suspended.is_empty() {
                self.store.clear_snapshot();
            } else {
                self.store.save_snapshot(&suspended);
            }
        }

        self.status_message = Some(match reason {
            BoardError::CapabilityBlocked => {
                "Notifications are blocked. Allow notifications for this site in your \
                 browser settings, then try again."
                    .into()
            }
            BoardError::CapabilityDeclined => "Notification permission was not granted.".into(),
            other => format!("Action failed: {other}"),
        });

        let mut actions: Vec<AppAction> = compensations
            .into_iter()
            .map(|call| AppAction::Invoke { key: None, call })
            .collect();
        actions.push(AppAction::Render);
        actions
    }
}
