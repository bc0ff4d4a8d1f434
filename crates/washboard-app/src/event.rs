//! Application input events.
//!
//! Events originate from four racing sources: the initial REST load, the
//! realtime channel, user interactions, and completions of side-effecting
//! service calls. All of them funnel through [`crate::App::handle`] on a
//! single thread, one event to completion at a time.

use washboard_core::{BoardError, MachineId};
use washboard_proto::MachineSnapshot;

use crate::{CallReply, PlanKey, ServiceCall};

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Initial REST snapshot arrived.
    SnapshotLoaded {
        /// All machines on the board.
        machines: Vec<MachineSnapshot>,
    },

    /// Initial REST snapshot failed to load.
    SnapshotFailed {
        /// Human-readable reason.
        reason: String,
    },

    /// Realtime channel is open.
    ChannelOpened,

    /// Realtime channel closed or failed to open.
    ChannelClosed,

    /// The scheduled reconnect delay elapsed.
    RetryElapsed,

    /// Raw text frame from the realtime channel.
    MessageReceived {
        /// Unparsed JSON text.
        raw: String,
    },

    /// User pressed a course button on an idle machine.
    StartCycle {
        /// Target machine.
        id: MachineId,
        /// Chosen course name.
        course: String,
    },

    /// User tapped the notify control on an operating machine.
    ToggleSubscription {
        /// Target machine.
        id: MachineId,
    },

    /// User tapped the room-wide subscription button.
    ToggleRoom,

    /// A service call issued by an [`crate::AppAction::Invoke`] finished.
    CallCompleted {
        /// Plan the call belonged to. `None` for fire-and-forget calls.
        key: Option<PlanKey>,
        /// The call that completed.
        call: ServiceCall,
        /// Its outcome.
        outcome: Result<CallReply, BoardError>,
    },
}
