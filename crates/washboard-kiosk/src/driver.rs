//! Terminal driver.
//!
//! Implements the application's platform seam over stdin, stdout, the
//! status WebSocket and tokio timers. All inputs converge on one
//! `poll_event` so the application still processes a single event at a
//! time.

use std::{future, io, time::Duration};

use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};
use washboard_app::{App, AppEvent, Driver};
use washboard_client::channel::{self, ChannelEvent};
use washboard_core::BoardError;

use crate::{input, render};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum KioskError {
    /// Reading stdin or writing stdout failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Opening the status channel failed.
    #[error("status channel: {0}")]
    Channel(BoardError),
}

/// Stdin/stdout/WebSocket driver for the kiosk.
pub struct KioskDriver {
    channel_url: String,
    token: String,
    channel: Option<UnboundedReceiver<ChannelEvent>>,
    lines: Lines<BufReader<Stdin>>,
    timer_tx: UnboundedSender<AppEvent>,
    timer_rx: UnboundedReceiver<AppEvent>,
}

impl KioskDriver {
    /// Create a driver for the given channel endpoint.
    pub fn new(channel_url: String, token: String) -> Self {
        let (timer_tx, timer_rx) = unbounded_channel();
        Self {
            channel_url,
            token,
            channel: None,
            lines: BufReader::new(tokio::io::stdin()).lines(),
            timer_tx,
            timer_rx,
        }
    }
}

impl Driver for KioskDriver {
    type Error = KioskError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, KioskError> {
        loop {
            // The channel branch parks forever while disconnected; the
            // reconnect timer is what wakes us up again.
            let channel_event = async {
                match self.channel.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => future::pending().await,
                }
            };

            tokio::select! {
                line = self.lines.next_line() => match line? {
                    None => return Ok(None),
                    Some(line) => match input::parse_intent(&line) {
                        Some(event) => return Ok(Some(event)),
                        None => println!("{}", input::HELP),
                    },
                },
                event = channel_event => {
                    let event = match event {
                        Some(ChannelEvent::Message(raw)) => AppEvent::MessageReceived { raw },
                        Some(ChannelEvent::Closed) | None => {
                            self.channel = None;
                            AppEvent::ChannelClosed
                        }
                    };
                    return Ok(Some(event));
                },
                Some(event) = self.timer_rx.recv() => return Ok(Some(event)),
            }
        }
    }

    async fn connect(&mut self) -> Result<(), KioskError> {
        let rx = channel::connect(&self.channel_url, &self.token)
            .await
            .map_err(KioskError::Channel)?;
        self.channel = Some(rx);
        Ok(())
    }

    fn schedule_retry(&mut self, delay: Duration) {
        let tx = self.timer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AppEvent::RetryElapsed);
        });
    }

    fn render(&mut self, app: &App) -> Result<(), KioskError> {
        for line in render::board_lines(app) {
            println!("{line}");
        }
        println!();
        Ok(())
    }

    fn toast(&mut self, text: &str) {
        println!("*** {text}");
    }
}
