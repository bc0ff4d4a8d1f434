//! REST transport against the laundry service.
//!
//! Every endpoint is a `POST` with a JSON body and a Bearer token. Network
//! failures surface as transient transport errors; HTTP error statuses as
//! action rejections. The application rolls back on either, but only
//! transport errors are worth retrying.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use washboard_app::{
    ActionService, CapabilityGrant, CapabilityProvider, CycleStarted, SnapshotLoader,
};
use washboard_core::BoardError;
use washboard_proto::{
    CycleStartedResponse, MachineId, MachineSnapshot, ReserveRequest, SetIndividualRequest,
    SetTokenRequest, SnapshotResponse, StartCourseRequest,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP implementation of the snapshot and action seams.
pub struct RestService {
    http: reqwest::Client,
    base_url: String,
    token: String,
    room_id: u32,
}

impl RestService {
    /// Build a client for one server and room.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(base_url: &str, token: &str, room_id: u32) -> Result<Self, BoardError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| BoardError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
            room_id,
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, BoardError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|err| BoardError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "server rejected request");
            return Err(BoardError::ActionRejected(format!("server returned {status}")));
        }
        response.json().await.map_err(|err| BoardError::Transport(err.to_string()))
    }

    /// As [`RestService::post`], for endpoints whose reply body carries
    /// nothing the client uses.
    async fn post_ack<B>(&self, path: &str, body: &B) -> Result<(), BoardError>
    where
        B: Serialize + Sync,
    {
        let _: serde_json::Value = self.post(path, body).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotLoader for RestService {
    async fn load_initial_machines(&self) -> Result<Vec<MachineSnapshot>, BoardError> {
        let response: SnapshotResponse = self.post("load", &serde_json::json!({})).await?;
        Ok(response.machine_list)
    }
}

#[async_trait]
impl ActionService for RestService {
    async fn start_cycle(&self, id: MachineId, course: &str) -> Result<CycleStarted, BoardError> {
        let request = StartCourseRequest { machine_id: id, course_name: course.to_owned() };
        let response: CycleStartedResponse = self.post("start_course", &request).await?;
        Ok(CycleStarted {
            status: response.status,
            remaining_minutes: response.remaining_minutes,
        })
    }

    async fn set_individual_subscription(
        &self,
        id: MachineId,
        on: bool,
    ) -> Result<(), BoardError> {
        self.post_ack("notify_me", &SetIndividualRequest::new(id, on)).await
    }

    async fn set_room_subscription(&self, on: bool) -> Result<(), BoardError> {
        self.post_ack("reserve", &ReserveRequest::new(self.room_id, on)).await
    }

    async fn register_notification_capability(&self, token: &str) -> Result<(), BoardError> {
        self.post_ack("set_fcm_token", &SetTokenRequest { fcm_token: token.to_owned() }).await
    }
}

/// Capability provider backed by a token provisioned at deploy time.
///
/// The kiosk has no interactive permission prompt; either a push token was
/// configured or notifications are unavailable.
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    /// Wrap an optional pre-provisioned token.
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl CapabilityProvider for StaticTokenProvider {
    async fn request_capability_token(&self) -> Result<CapabilityGrant, BoardError> {
        Ok(match &self.token {
            Some(token) => CapabilityGrant::Granted(token.clone()),
            None => CapabilityGrant::Declined,
        })
    }
}
