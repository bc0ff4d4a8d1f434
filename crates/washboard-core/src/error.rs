//! Error taxonomy for the washboard client.
//!
//! Four categories, matching how each is recovered: transport errors are
//! retried or surfaced per call, malformed messages are dropped,
//! capability errors roll back the triggering control with guidance, and
//! action failures roll back to the pre-action snapshot.

use thiserror::Error;
use washboard_proto::ProtocolError;

/// Errors surfaced by external collaborators and the realtime channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Network-level failure (channel drop, fetch failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// Unparsable or unroutable realtime message.
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] ProtocolError),

    /// The user has explicitly blocked notifications; actionable guidance
    /// belongs at the presentation layer.
    #[error("notification permission is blocked")]
    CapabilityBlocked,

    /// The user silently declined the notification permission prompt.
    #[error("notification permission was declined")]
    CapabilityDeclined,

    /// A side-effecting service call was rejected.
    #[error("action rejected: {0}")]
    ActionRejected(String),
}

impl BoardError {
    /// Whether this error may succeed on retry.
    ///
    /// Transport failures are transient; permission and rejection errors
    /// need user or server intervention first.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
