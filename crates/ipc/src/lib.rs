// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! accord-ipc: framed message transport over pipes.
//!
//! Wire format: 16-byte header (payload length, command tag, message
//! id, all little-endian) followed by the payload. Queues carry framed
//! [`Message`]s over named fifos or anonymous pipes; a dispatcher
//! routes replies back to the request that asked for them.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod command;
mod dispatcher;
mod error;
mod message;
mod queue;
pub mod wire;

pub use command::Command;
pub use dispatcher::{Dispatcher, MessageHandler};
pub use error::{IpcError, MessageError, ProtocolError};
pub use message::Message;
pub use queue::{Queue, QueueState, ReplyHandler, Role};
