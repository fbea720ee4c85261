// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Shared imports and helpers for the integration specs.

pub use std::sync::Arc;
pub use std::time::Duration;

pub use accord_format::{ConverterKind, Data, FormatError, FormatRegistry};
pub use accord_ipc::{Command, Dispatcher, Message, MessageHandler, Queue, QueueState, Role};

/// A fifo path inside a fresh temp dir. The dir guard must stay alive
/// for as long as the fifo is used.
pub fn fifo_path(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    (dir, path)
}

/// Connect both ends of a fifo at `path`: receiver first, then sender.
pub async fn fifo_ends(path: &std::path::Path) -> (Queue, Queue) {
    let mut receiver = Queue::new(path);
    receiver.create().expect("create fifo");
    receiver.connect(Role::Receiver).await.expect("connect receiver");

    let mut sender = Queue::new(path);
    sender.set_connect_timeout(Duration::from_secs(5));
    sender.connect(Role::Sender).await.expect("connect sender");

    (receiver, sender)
}
