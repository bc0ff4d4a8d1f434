//! Application side-effects and intents.
//!
//! [`AppAction`] instructions are produced by the [`crate::App`] state
//! machine and executed by the runtime; the state machine itself performs
//! no I/O.

use std::time::Duration;

use washboard_core::MachineId;

use crate::PlanKey;

/// A single side-effecting call against the external service.
///
/// Calls are issued one at a time; within a plan a later call assumes the
/// earlier ones succeeded (token before registration, registration before
/// subscription, subscription before cycle start).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    /// Ask the notification provider for a push-capability token.
    RequestCapability,

    /// Register the capability token with the server.
    RegisterCapability {
        /// Token from a previous `RequestCapability` step. Plans are built
        /// with a placeholder that the coordinator patches once granted.
        token: String,
    },

    /// Set or clear an individual completion subscription.
    SetIndividual {
        /// Target machine.
        id: MachineId,
        /// Desired subscription state.
        on: bool,
    },

    /// Set or clear the room-wide subscription.
    SetRoom {
        /// Desired activation state.
        on: bool,
    },

    /// Start a washing/drying course.
    StartCycle {
        /// Target machine.
        id: MachineId,
        /// Course name.
        course: String,
    },
}

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Re-render the board.
    Render,

    /// Open the realtime channel.
    Connect,

    /// Arrange for [`crate::AppEvent::RetryElapsed`] after `delay`.
    ScheduleReconnect {
        /// Fixed reconnect delay.
        delay: Duration,
    },

    /// Show a transient user-visible notification.
    Toast {
        /// Display text.
        text: String,
    },

    /// Execute a service call and feed the outcome back as
    /// [`crate::AppEvent::CallCompleted`].
    Invoke {
        /// Plan this call belongs to; `None` for fire-and-forget calls
        /// whose failure is logged, not surfaced.
        key: Option<PlanKey>,
        /// The call to execute.
        call: ServiceCall,
    },
}
