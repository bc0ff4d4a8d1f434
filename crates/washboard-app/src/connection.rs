//! Realtime channel lifecycle.
//!
//! Pure retry state machine; the runtime executes the transitions it
//! requests. The retry loop is unbounded with a fixed delay, a deliberate
//! simplicity/robustness tradeoff for an always-on display. No backoff
//! growth, no attempt cap.
//!
//! ```text
//! ┌──────────────┐ start  ┌────────────┐ opened ┌───────────┐
//! │ Disconnected │───────>│ Connecting │───────>│ Connected │
//! └──────────────┘        └────────────┘        └───────────┘
//!                               ^    │ closed         │ closed
//!                 retry elapsed │    v                v
//!                          ┌────────────────┐<────────┘
//!                          │ RetryScheduled │
//!                          └────────────────┘
//! ```

use std::time::Duration;

/// Fixed delay between reconnection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Realtime channel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection and none in progress.
    Disconnected,
    /// Connection attempt in flight.
    Connecting,
    /// Channel open, live updates flowing.
    Connected,
    /// Connection lost; a retry fires after [`RECONNECT_DELAY`].
    RetryScheduled,
}

/// Retry state machine for the realtime channel.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    state: LinkState,
    retry_delay: Duration,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Create a manager in [`LinkState::Disconnected`].
    pub fn new() -> Self {
        Self { state: LinkState::Disconnected, retry_delay: RECONNECT_DELAY }
    }

    /// Current channel state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Begin the first connection attempt.
    pub fn start(&mut self) {
        self.state = LinkState::Connecting;
    }

    /// The channel opened successfully.
    pub fn on_opened(&mut self) {
        self.state = LinkState::Connected;
    }

    /// The channel closed or a connection attempt failed. Returns the
    /// delay after which the runtime should report
    /// [`crate::AppEvent::RetryElapsed`].
    pub fn on_closed(&mut self) -> Duration {
        self.state = LinkState::RetryScheduled;
        self.retry_delay
    }

    /// The scheduled delay elapsed; the next attempt starts now.
    pub fn on_retry_elapsed(&mut self) {
        self.state = LinkState::Connecting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_loops_through_retry() {
        let mut link = ConnectionManager::new();
        assert_eq!(link.state(), LinkState::Disconnected);

        link.start();
        assert_eq!(link.state(), LinkState::Connecting);

        link.on_opened();
        assert_eq!(link.state(), LinkState::Connected);

        let delay = link.on_closed();
        assert_eq!(delay, RECONNECT_DELAY);
        assert_eq!(link.state(), LinkState::RetryScheduled);

        link.on_retry_elapsed();
        assert_eq!(link.state(), LinkState::Connecting);

        // Failed attempt goes straight back to retry.
        let delay = link.on_closed();
        assert_eq!(delay, RECONNECT_DELAY);
        assert_eq!(link.state(), LinkState::RetryScheduled);
    }
}
