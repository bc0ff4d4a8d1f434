//! End-to-end runtime tests over a scripted driver and fake services.
//!
//! The same orchestration code that drives the production kiosk runs here
//! against an in-memory script: the driver plays back a fixed sequence of
//! events and records everything the runtime asks it to do, the services
//! record every call and answer from canned data.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{sync::Notify, time::timeout};
use washboard_app::{
    ActionService, App, AppEvent, CapabilityGrant, CapabilityProvider, CycleStarted, Driver,
    Runtime, SnapshotLoader,
};
use washboard_core::{BoardError, MachineStatus, MemoryKv, PrimaryControl};
use washboard_proto::{MachineId, MachineKind, MachineSnapshot};

/// Everything the runtime asked the driver to do, for assertions after
/// the run consumed driver and app.
#[derive(Debug, Default)]
struct Recording {
    /// Per render: `(id, status, control, enabled)` in board order.
    renders: Vec<Vec<(MachineId, MachineStatus, PrimaryControl, bool)>>,
    toasts: Vec<String>,
    retries: Vec<Duration>,
    connect_attempts: usize,
}

impl Recording {
    fn last_render(&self) -> &[(MachineId, MachineStatus, PrimaryControl, bool)] {
        self.renders.last().map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug)]
struct ScriptError;

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scripted connection failure")
    }
}

impl std::error::Error for ScriptError {}

/// Plays back a fixed event sequence and records runtime requests.
struct ScriptedDriver {
    script: VecDeque<AppEvent>,
    /// Outcome of each successive connection attempt; exhausted means
    /// success.
    connect_outcomes: VecDeque<bool>,
    recording: Arc<Mutex<Recording>>,
    /// Observes every rendered app state, for tests that react to a
    /// particular board.
    on_render: Option<Box<dyn FnMut(&App) + Send>>,
}

impl ScriptedDriver {
    fn new(script: Vec<AppEvent>, recording: Arc<Mutex<Recording>>) -> Self {
        Self {
            script: script.into(),
            connect_outcomes: VecDeque::new(),
            recording,
            on_render: None,
        }
    }

    fn with_connect_outcomes(mut self, outcomes: Vec<bool>) -> Self {
        self.connect_outcomes = outcomes.into();
        self
    }

    fn with_render_hook(mut self, hook: Box<dyn FnMut(&App) + Send>) -> Self {
        self.on_render = Some(hook);
        self
    }
}

impl Driver for ScriptedDriver {
    type Error = ScriptError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, ScriptError> {
        Ok(self.script.pop_front())
    }

    async fn connect(&mut self) -> Result<(), ScriptError> {
        let mut recording = self.recording.lock().unwrap();
        recording.connect_attempts += 1;
        match self.connect_outcomes.pop_front() {
            Some(false) => Err(ScriptError),
            _ => Ok(()),
        }
    }

    fn schedule_retry(&mut self, delay: Duration) {
        self.recording.lock().unwrap().retries.push(delay);
    }

    fn render(&mut self, app: &App) -> Result<(), ScriptError> {
        let board = app
            .board()
            .into_iter()
            .map(|(machine, card)| (machine.id, machine.status, card.control, card.enabled))
            .collect();
        self.recording.lock().unwrap().renders.push(board);
        if let Some(hook) = &mut self.on_render {
            hook(app);
        }
        Ok(())
    }

    fn toast(&mut self, text: &str) {
        self.recording.lock().unwrap().toasts.push(text.to_owned());
    }
}

/// Canned services recording every call in order.
struct FakeServices {
    machines: Vec<MachineSnapshot>,
    fail_start: bool,
    /// When set, `start_cycle` answers only after the gate is notified.
    hold_start: Option<Arc<Notify>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeServices {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn holding_start(mut self, gate: Arc<Notify>) -> Self {
        self.hold_start = Some(gate);
        self
    }
}

#[async_trait]
impl SnapshotLoader for FakeServices {
    async fn load_initial_machines(&self) -> Result<Vec<MachineSnapshot>, BoardError> {
        self.record("load".into());
        Ok(self.machines.clone())
    }
}

#[async_trait]
impl ActionService for FakeServices {
    async fn start_cycle(&self, id: MachineId, course: &str) -> Result<CycleStarted, BoardError> {
        self.record(format!("start:{id}:{course}"));
        if let Some(gate) = &self.hold_start {
            gate.notified().await;
        }
        if self.fail_start {
            return Err(BoardError::ActionRejected("machine busy".into()));
        }
        Ok(CycleStarted { status: MachineStatus::Washing, remaining_minutes: Some(39) })
    }

    async fn set_individual_subscription(
        &self,
        id: MachineId,
        on: bool,
    ) -> Result<(), BoardError> {
        self.record(format!("individual:{id}:{on}"));
        Ok(())
    }

    async fn set_room_subscription(&self, on: bool) -> Result<(), BoardError> {
        self.record(format!("room:{on}"));
        Ok(())
    }

    async fn register_notification_capability(&self, token: &str) -> Result<(), BoardError> {
        self.record(format!("register:{token}"));
        Ok(())
    }
}

#[async_trait]
impl CapabilityProvider for FakeServices {
    async fn request_capability_token(&self) -> Result<CapabilityGrant, BoardError> {
        self.record("request_token".into());
        Ok(CapabilityGrant::Granted("tok".into()))
    }
}

fn snapshot(id: MachineId, kind: MachineKind, status: MachineStatus) -> MachineSnapshot {
    MachineSnapshot {
        machine_id: id,
        kind,
        machine_name: None,
        status,
        remaining_minutes: None,
        elapsed_minutes: None,
        subscribed: Some(false),
    }
}

fn services(calls: &Arc<Mutex<Vec<String>>>, fail_start: bool) -> FakeServices {
    FakeServices {
        machines: vec![
            snapshot(1, MachineKind::Washer, MachineStatus::Off),
            snapshot(2, MachineKind::Dryer, MachineStatus::Drying),
        ],
        fail_start,
        hold_start: None,
        calls: Arc::clone(calls),
    }
}

#[tokio::test]
async fn session_seeds_syncs_and_starts_a_cycle() {
    let recording = Arc::new(Mutex::new(Recording::default()));
    let calls = Arc::new(Mutex::new(Vec::new()));

    let script = vec![
        AppEvent::MessageReceived {
            raw: r#"{"type":"timer_sync","machines":[
                {"machine_id":2,"status":"DRYING","remaining_minutes":20,"elapsed_minutes":10}
            ]}"#
            .into(),
        },
        AppEvent::StartCycle { id: 1, course: "standard".into() },
    ];
    let driver = ScriptedDriver::new(script, Arc::clone(&recording));
    let runtime =
        Runtime::new(driver, App::new(Box::new(MemoryKv::new())), services(&calls, false));
    runtime.run().await.unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            "load",
            "request_token",
            "register:tok",
            "individual:1:true",
            "start:1:standard",
        ]
    );

    let recording = recording.lock().unwrap();
    assert_eq!(recording.connect_attempts, 1);
    let board = recording.last_render();
    assert_eq!(board[0], (1, MachineStatus::Washing, PrimaryControl::CancelNotify, true));
    assert_eq!(board[1], (2, MachineStatus::Drying, PrimaryControl::Notify, true));
}

#[tokio::test]
async fn failed_cycle_start_rolls_back_and_compensates() {
    let recording = Arc::new(Mutex::new(Recording::default()));
    let calls = Arc::new(Mutex::new(Vec::new()));

    let script = vec![AppEvent::StartCycle { id: 1, course: "quick".into() }];
    let driver = ScriptedDriver::new(script, Arc::clone(&recording));
    let runtime =
        Runtime::new(driver, App::new(Box::new(MemoryKv::new())), services(&calls, true));
    runtime.run().await.unwrap();

    // The subscription taken mid-plan is explicitly undone after the
    // final step is rejected.
    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            "load",
            "request_token",
            "register:tok",
            "individual:1:true",
            "start:1:quick",
            "individual:1:false",
        ]
    );

    let recording = recording.lock().unwrap();
    let board = recording.last_render();
    assert_eq!(board[0], (1, MachineStatus::Off, PrimaryControl::StartCycle, true));
}

#[tokio::test]
async fn lost_connection_retries_after_fixed_delay() {
    let recording = Arc::new(Mutex::new(Recording::default()));
    let calls = Arc::new(Mutex::new(Vec::new()));

    let script = vec![AppEvent::RetryElapsed];
    let driver = ScriptedDriver::new(script, Arc::clone(&recording))
        .with_connect_outcomes(vec![false, true]);
    let runtime =
        Runtime::new(driver, App::new(Box::new(MemoryKv::new())), services(&calls, false));
    runtime.run().await.unwrap();

    let recording = recording.lock().unwrap();
    assert_eq!(recording.retries, vec![Duration::from_secs(5)]);
    assert_eq!(recording.connect_attempts, 2);
}

#[tokio::test]
async fn finished_notification_surfaces_a_toast() {
    let recording = Arc::new(Mutex::new(Recording::default()));
    let calls = Arc::new(Mutex::new(Vec::new()));

    let script = vec![AppEvent::MessageReceived {
        raw: r#"{"type":"notify","machine_id":2,"status":"FINISHED","message":"Dryer 2 is done"}"#
            .into(),
    }];
    let driver = ScriptedDriver::new(script, Arc::clone(&recording));
    let runtime =
        Runtime::new(driver, App::new(Box::new(MemoryKv::new())), services(&calls, false));
    runtime.run().await.unwrap();

    let recording = recording.lock().unwrap();
    assert_eq!(recording.toasts, vec!["Dryer 2 is done"]);
    let board = recording.last_render();
    assert_eq!(board[1].1, MachineStatus::Finished);
}

#[tokio::test]
async fn board_stays_live_while_a_call_is_pending() {
    let recording = Arc::new(Mutex::new(Recording::default()));
    let calls = Arc::new(Mutex::new(Vec::new()));

    // start_cycle answers only once the board has shown the dryer going
    // off. That render can only happen if the loop keeps serving realtime
    // frames while the call is in flight; a loop that awaits the call
    // inline would hang here until the timeout.
    let gate = Arc::new(Notify::new());
    let script = vec![
        AppEvent::StartCycle { id: 1, course: "standard".into() },
        AppEvent::MessageReceived {
            raw: r#"{"type":"timer_sync","machines":[{"machine_id":2,"status":"OFF"}]}"#.into(),
        },
    ];
    let release = Arc::clone(&gate);
    let driver = ScriptedDriver::new(script, Arc::clone(&recording)).with_render_hook(Box::new(
        move |app: &App| {
            let dryer_off = app
                .board()
                .into_iter()
                .any(|(machine, _)| machine.id == 2 && machine.status == MachineStatus::Off);
            if dryer_off {
                release.notify_one();
            }
        },
    ));
    let services = services(&calls, false).holding_start(Arc::clone(&gate));
    let runtime = Runtime::new(driver, App::new(Box::new(MemoryKv::new())), services);
    timeout(Duration::from_secs(5), runtime.run())
        .await
        .expect("event loop stalled behind a pending call")
        .unwrap();

    // The plan still ran to completion after the frame was served.
    let calls = calls.lock().unwrap();
    assert_eq!(calls.last().map(String::as_str), Some("start:1:standard"));
    let recording = recording.lock().unwrap();
    let board = recording.last_render();
    assert_eq!(board[0].1, MachineStatus::Washing);
    assert_eq!(board[1].1, MachineStatus::Off);
}
