// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Routing incoming messages: answers back to their requests,
//! everything else to a handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::IpcError;
use crate::message::Message;
use crate::queue::{Queue, ReplyHandler};

/// Receives every message that is not the answer to an in-flight
/// request: commands from the peer, plus the synthetic `QueueHup` and
/// `QueueError` notifications.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(&self, message: Message);
}

/// One dispatch task draining one queue.
///
/// `Reply` and `ErrorReply` messages are matched against the queue's
/// in-flight table by id; the recorded handler is invoked exactly once
/// and removed. Messages within a queue are dispatched in arrival
/// order; no ordering holds across queues.
#[derive(Debug)]
pub struct Dispatcher {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start the dispatch task for `queue`. Takes over the queue's
    /// incoming channel, so there is at most one dispatcher per queue
    /// and `get_message` yields nothing afterwards.
    pub fn attach(queue: &mut Queue, handler: Arc<dyn MessageHandler>) -> Result<Self, IpcError> {
        let incoming = queue.take_receiver().ok_or(IpcError::NotConnected)?;
        let pending = queue.pending();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(dispatch_loop(incoming, pending, handler, cancel.clone()));
        Ok(Self { cancel, task: Some(task) })
    }

    /// Stop the dispatch task and wait for it to finish.
    pub async fn detach(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn dispatch_loop(
    mut incoming: UnboundedReceiver<Message>,
    pending: Arc<Mutex<HashMap<u64, ReplyHandler>>>,
    handler: Arc<dyn MessageHandler>,
    cancel: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = incoming.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        if message.is_answer() {
            let entry = pending.lock().remove(&message.id());
            match entry {
                Some(reply_handler) => reply_handler(message),
                None => {
                    warn!(id = message.id(), "answer with no request in flight, dropped");
                }
            }
        } else {
            debug!(command = ?message.command(), "dispatching");
            handler.on_message(message).await;
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
