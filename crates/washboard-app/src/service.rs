//! External collaborator interfaces.
//!
//! The core consumes these seams; implementations live in the transport
//! crate (HTTP) and in test fakes. Calls run on spawned tasks and may
//! overlap across machines; steps of one plan never overlap because the
//! coordinator issues the next call only after the previous completes.

use async_trait::async_trait;
use washboard_core::{BoardError, MachineId, MachineStatus};
use washboard_proto::MachineSnapshot;

/// Result of asking for a push-capability token.
///
/// Three-valued on purpose: an explicit block and a silent decline call
/// for different user guidance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityGrant {
    /// Permission granted; the token registers with the server.
    Granted(String),
    /// Permission explicitly blocked; the user must unblock it in their
    /// browser/OS settings before retrying.
    Blocked,
    /// Permission prompt dismissed without an answer.
    Declined,
}

/// Confirmed result of starting a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStarted {
    /// Status the machine entered.
    pub status: MachineStatus,
    /// Initial remaining minutes, if the server knows the course length.
    pub remaining_minutes: Option<u32>,
}

/// Loads the initial machine snapshot.
#[async_trait]
pub trait SnapshotLoader {
    /// Fetch all machines on the board.
    async fn load_initial_machines(&self) -> Result<Vec<MachineSnapshot>, BoardError>;
}

/// Side-effecting calls against the laundry service.
#[async_trait]
pub trait ActionService {
    /// Start a course on an idle machine.
    async fn start_cycle(
        &self,
        id: MachineId,
        course: &str,
    ) -> Result<CycleStarted, BoardError>;

    /// Set or clear an individual completion subscription.
    async fn set_individual_subscription(&self, id: MachineId, on: bool)
    -> Result<(), BoardError>;

    /// Set or clear the room-wide subscription.
    async fn set_room_subscription(&self, on: bool) -> Result<(), BoardError>;

    /// Register a push-capability token with the server.
    async fn register_notification_capability(&self, token: &str) -> Result<(), BoardError>;
}

/// Provides push-capability tokens.
#[async_trait]
pub trait CapabilityProvider {
    /// Request a capability token from the platform.
    async fn request_capability_token(&self) -> Result<CapabilityGrant, BoardError>;
}

/// Everything the runtime needs from the outside world, in one bound.
pub trait BoardServices: SnapshotLoader + ActionService + CapabilityProvider + Send + Sync {}

impl<T: SnapshotLoader + ActionService + CapabilityProvider + Send + Sync> BoardServices for T {}
