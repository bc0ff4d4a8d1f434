//! Terminal kiosk for the washboard client.
//!
//! Wires the generic application runtime to real I/O: the status
//! WebSocket, the REST service, a file-backed flag store, stdin for user
//! intents and stdout for the board.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod driver;
pub mod input;
pub mod render;
pub mod services;
