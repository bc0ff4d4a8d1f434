//! Generic runtime for application orchestration.
//!
//! The runtime drives the event loop, coordinating between:
//! - [`App`]: pure UI state machine
//! - [`Driver`]: platform I/O (channel, timers, input, rendering)
//! - [`BoardServices`]: REST service and notification capability provider
//!
//! Service calls run on spawned tasks so a slow or hung request never
//! stalls the board: realtime frames and other machines' intents keep
//! flowing while a call is in flight. Completions re-enter the loop as
//! [`AppEvent::CallCompleted`], so every mutation of the registry and the
//! persisted flags is still serialized through [`App::handle`] on this one
//! task. Per-plan step ordering is unaffected: the coordinator issues the
//! next call of a plan only once the previous one completes.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use washboard_core::BoardError;

use crate::{
    ActionService, App, AppAction, AppEvent, BoardServices, CallReply, CapabilityProvider,
    ServiceCall, SnapshotLoader,
};

/// Generic runtime that orchestrates App, Driver and services.
pub struct Runtime<D, S>
where
    D: crate::Driver,
    S: BoardServices + 'static,
{
    driver: D,
    app: App,
    services: Arc<S>,
    /// Spawned service calls whose completion has not yet re-entered the
    /// app.
    in_flight: usize,
    completion_tx: UnboundedSender<AppEvent>,
    completion_rx: UnboundedReceiver<AppEvent>,
}

impl<D, S> Runtime<D, S>
where
    D: crate::Driver,
    S: BoardServices + 'static,
{
    /// Create a runtime from its parts.
    pub fn new(driver: D, app: App, services: S) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            driver,
            app,
            services: Arc::new(services),
            in_flight: 0,
            completion_tx,
            completion_rx,
        }
    }

    /// Run the main event loop until the driver shuts down.
    ///
    /// Issued service calls run to completion, there is no cancellation, so
    /// in-flight calls are drained before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error while
    /// rendering or polling.
    pub async fn run(mut self) -> Result<(), D::Error> {
        // Seed the registry from the REST snapshot, then bring the
        // realtime channel up.
        let seed_event = match self.services.load_initial_machines().await {
            Ok(machines) => AppEvent::SnapshotLoaded { machines },
            Err(err) => AppEvent::SnapshotFailed { reason: err.to_string() },
        };
        let actions = self.app.handle(seed_event);
        self.process_actions(actions).await?;

        let actions = self.app.connect();
        self.process_actions(actions).await?;

        while let Some(event) = self.next_event().await? {
            let actions = self.app.handle(event);
            self.process_actions(actions).await?;
        }

        // Driver shut down; let the remaining calls finish.
        while self.in_flight > 0 {
            let Some(event) = self.completion_rx.recv().await else { break };
            self.in_flight -= 1;
            let actions = self.app.handle(event);
            self.process_actions(actions).await?;
        }
        Ok(())
    }

    /// The next event from either the driver or a completed service call.
    /// `None` means the driver shut down.
    async fn next_event(&mut self) -> Result<Option<AppEvent>, D::Error> {
        tokio::select! {
            event = self.driver.poll_event() => event,
            completion = self.completion_rx.recv() => {
                // recv() cannot yield `None` while we hold a sender.
                if completion.is_some() {
                    self.in_flight -= 1;
                }
                Ok(completion)
            }
        }
    }

    /// Execute actions, feeding any events they produce back into the App
    /// until the queue drains. Service calls are dispatched to spawned
    /// tasks; their completions arrive through [`Runtime::next_event`].
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<(), D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Toast { text } => self.driver.toast(&text),
                    AppAction::ScheduleReconnect { delay } => self.driver.schedule_retry(delay),
                    AppAction::Connect => {
                        let event = match self.driver.connect().await {
                            Ok(()) => AppEvent::ChannelOpened,
                            Err(err) => {
                                tracing::warn!(%err, "realtime connection attempt failed");
                                AppEvent::ChannelClosed
                            }
                        };
                        pending_actions.extend(self.app.handle(event));
                    }
                    AppAction::Invoke { key, call } => {
                        self.in_flight += 1;
                        let services = Arc::clone(&self.services);
                        let tx = self.completion_tx.clone();
                        tokio::spawn(async move {
                            let outcome = execute(services.as_ref(), &call).await;
                            let _ = tx.send(AppEvent::CallCompleted { key, call, outcome });
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// The application state machine.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Mutable access for tests and embedders.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }
}

/// Dispatch one service call.
async fn execute<S: BoardServices>(
    services: &S,
    call: &ServiceCall,
) -> Result<CallReply, BoardError> {
    match call {
        ServiceCall::RequestCapability => {
            services.request_capability_token().await.map(CallReply::Capability)
        }
        ServiceCall::RegisterCapability { token } => services
            .register_notification_capability(token)
            .await
            .map(|()| CallReply::Ack),
        ServiceCall::SetIndividual { id, on } => services
            .set_individual_subscription(*id, *on)
            .await
            .map(|()| CallReply::Ack),
        ServiceCall::SetRoom { on } => {
            services.set_room_subscription(*on).await.map(|()| CallReply::Ack)
        }
        ServiceCall::StartCycle { id, course } => {
            services.start_cycle(*id, course).await.map(CallReply::CycleStarted)
        }
    }
}
