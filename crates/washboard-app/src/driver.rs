//! Driver trait for platform I/O.
//!
//! The [`Driver`] decouples the [`crate::Runtime`] from a concrete
//! front-end. The production kiosk wires a WebSocket channel, timers and
//! stdin; tests use a scripted in-memory driver. The same orchestration
//! code runs in both.

use std::{future::Future, time::Duration};

use crate::{App, AppEvent};

/// Abstracts platform I/O for the application runtime.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input event.
    ///
    /// Returns `None` when the front-end has shut down (for the kiosk:
    /// stdin closed). Realtime channel opens/closes, inbound frames, user
    /// intents and elapsed reconnect timers all arrive here.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Open the realtime channel.
    ///
    /// A successful return means the channel is up; subsequent closes are
    /// reported through [`Driver::poll_event`] as
    /// [`AppEvent::ChannelClosed`].
    fn connect(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Arrange for an [`AppEvent::RetryElapsed`] after `delay`.
    fn schedule_retry(&mut self, delay: Duration);

    /// Render the board from the application state.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Show a transient user-visible notification.
    fn toast(&mut self, text: &str);
}
