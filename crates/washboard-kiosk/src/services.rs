//! Service bundle for the kiosk.
//!
//! The runtime takes one collaborator implementing every seam; this
//! bundles the REST transport with the pre-provisioned capability token.

use async_trait::async_trait;
use washboard_app::{
    ActionService, CapabilityGrant, CapabilityProvider, CycleStarted, SnapshotLoader,
};
use washboard_client::{RestService, StaticTokenProvider};
use washboard_core::BoardError;
use washboard_proto::{MachineId, MachineSnapshot};

/// REST service plus static capability provider.
pub struct KioskServices {
    rest: RestService,
    capability: StaticTokenProvider,
}

impl KioskServices {
    /// Bundle the collaborators.
    pub fn new(rest: RestService, capability: StaticTokenProvider) -> Self {
        Self { rest, capability }
    }
}

#[async_trait]
impl SnapshotLoader for KioskServices {
    async fn load_initial_machines(&self) -> Result<Vec<MachineSnapshot>, BoardError> {
        self.rest.load_initial_machines().await
    }
}

#[async_trait]
impl ActionService for KioskServices {
    async fn start_cycle(&self, id: MachineId, course: &str) -> Result<CycleStarted, BoardError> {
        self.rest.start_cycle(id, course).await
    }

    async fn set_individual_subscription(
        &self,
        id: MachineId,
        on: bool,
    ) -> Result<(), BoardError> {
        self.rest.set_individual_subscription(id, on).await
    }

    async fn set_room_subscription(&self, on: bool) -> Result<(), BoardError> {
        self.rest.set_room_subscription(on).await
    }

    async fn register_notification_capability(&self, token: &str) -> Result<(), BoardError> {
        self.rest.register_notification_capability(token).await
    }
}

#[async_trait]
impl CapabilityProvider for KioskServices {
    async fn request_capability_token(&self) -> Result<CapabilityGrant, BoardError> {
        self.capability.request_capability_token().await
    }
}
