//! Core reconciliation logic for the washboard client.
//!
//! Everything in this crate is pure and synchronous: machine view-models,
//! the partial-update merge ([`reconcile`]), the presentation projection
//! ([`project`]) and the persisted subscription flags. I/O lives in the
//! application and transport crates.
//!
//! The single most important type here is [`SubscriptionUpdate`]: incoming
//! updates report subscription state as a tri-state (known true, known
//! false, or unreported), never a plain boolean. Collapsing "unreported"
//! into `false` is the historic bug class this crate exists to prevent.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod machine;
mod projection;
mod reconcile;
mod store;
mod update;

pub use error::BoardError;
pub use machine::Machine;
pub use projection::{CardProjection, PrimaryControl, TimerDisplay, project};
pub use reconcile::{ReconcileEffect, reconcile};
pub use store::{KvStore, MemoryKv, SubscriptionStore};
pub use update::{MachineUpdate, SubscriptionUpdate};

pub use washboard_proto::{MachineId, MachineKind, MachineStatus};
