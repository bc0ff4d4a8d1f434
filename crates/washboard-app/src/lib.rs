//! Application layer for the washboard client.
//!
//! Pure state machines and a generic runtime for UI and service
//! orchestration, so the same code runs against the production transport
//! and in scripted tests.
//!
//! # Components
//!
//! - [`App`]: UI state machine (registry, room mode, connection banner)
//! - [`ActionCoordinator`]: multi-step user actions with snapshot rollback
//! - [`ConnectionManager`]: realtime channel retry state machine
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod connection;
mod coordinator;
mod driver;
mod event;
mod runtime;
mod service;

pub use action::{AppAction, ServiceCall};
pub use app::App;
pub use connection::{ConnectionManager, LinkState, RECONNECT_DELAY};
pub use coordinator::{ActionCoordinator, CallReply, PlanKey, PlanProgress, PlanSnapshot};
pub use driver::Driver;
pub use event::AppEvent;
pub use runtime::Runtime;
pub use service::{
    ActionService, BoardServices, CapabilityGrant, CapabilityProvider, CycleStarted,
    SnapshotLoader,
};
