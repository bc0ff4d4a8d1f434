//! Transport layer for the washboard client.
//!
//! Implements the application's collaborator seams against real I/O:
//!
//! - [`RestService`]: snapshot load and side-effecting calls over HTTP
//! - [`channel`]: the realtime status WebSocket
//! - [`FileKv`]: durable key/value persistence for subscription flags
//! - [`StaticTokenProvider`]: a pre-provisioned push-capability token

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod channel;
mod kv;
mod rest;

pub use kv::FileKv;
pub use rest::{RestService, StaticTokenProvider};
