// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Message queues over named fifos and anonymous pipes.
//!
//! A queue owns one end of a pipe. The receiving end runs a reader
//! task that decodes frames into an unbounded channel; the sending end
//! serializes frames under an async write lock. A peer that hangs up
//! cleanly is reported as a single `QueueHup` message after everything
//! it sent has been drained; an abnormal error is reported as a
//! `QueueError` carrying the error text. A caller never hangs: every
//! request ends in a reply, an error, or a hup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use parking_lot::Mutex;
use tokio::net::unix::pipe;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::{self, JoinHandle};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::command::Command;
use crate::error::IpcError;
use crate::message::Message;
use crate::wire;

/// Lifecycle of a queue's fifo and connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    New,
    Created,
    Connected,
    Disconnected,
    Removed,
}

/// Which end of the pipe this queue opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

/// Invoked exactly once with the answer to a request: a `Reply`, an
/// `ErrorReply` from the peer, or a synthetic `ErrorReply` if the
/// queue disconnects first.
pub type ReplyHandler = Box<dyn FnOnce(Message) + Send + 'static>;

struct ReaderTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Where the reader task gets its pipe from. A fifo is opened inside
/// the task with a blocking open that waits for a writer, so EOF on
/// the stream always means a peer existed and left.
enum ReaderSource {
    Pipe(pipe::Receiver),
    Fifo(PathBuf),
}

/// One end of a framed message pipe.
pub struct Queue {
    path: Option<PathBuf>,
    state: QueueState,
    connect_timeout: Option<Duration>,
    writer: Option<Arc<AsyncMutex<pipe::Sender>>>,
    incoming: Option<UnboundedReceiver<Message>>,
    reader: Option<ReaderTask>,
    pending: Arc<Mutex<HashMap<u64, ReplyHandler>>>,
    counter: AtomicU16,
}

impl Queue {
    /// A queue backed by a fifo at `path`. The fifo is not touched
    /// until [`create`](Queue::create) or [`connect`](Queue::connect).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::bare(Some(path.into()))
    }

    fn bare(path: Option<PathBuf>) -> Self {
        Self {
            path,
            state: QueueState::New,
            connect_timeout: None,
            writer: None,
            incoming: None,
            reader: None,
            pending: Arc::new(Mutex::new(HashMap::new())),
            counter: AtomicU16::new(0),
        }
    }

    /// A connected queue pair over an anonymous pipe, receiver first.
    /// No fifo is involved, so create/remove do not apply.
    ///
    /// Must be called from within a tokio runtime.
    pub fn pipe_pair() -> Result<(Queue, Queue), IpcError> {
        let (tx, rx) = pipe::pipe()?;

        let mut receiver = Queue::bare(None);
        receiver.install_reader(ReaderSource::Pipe(rx));
        receiver.state = QueueState::Connected;

        let mut sender = Queue::bare(None);
        sender.writer = Some(Arc::new(AsyncMutex::new(tx)));
        sender.state = QueueState::Connected;

        Ok((receiver, sender))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    /// Bound the time [`connect`](Queue::connect) will wait for a peer
    /// to open the other end. Unset, a sender retries indefinitely.
    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = Some(timeout);
    }

    /// Create the fifo on disk.
    pub fn create(&mut self) -> Result<(), IpcError> {
        let path = self.path.as_ref().ok_or(IpcError::NoFifoPath)?;
        mkfifo(path.as_path(), Mode::S_IRUSR | Mode::S_IWUSR)
            .map_err(|errno| IpcError::Io(std::io::Error::from_raw_os_error(errno as i32)))?;
        debug!(path = %path.display(), "fifo created");
        self.state = QueueState::Created;
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.path.as_ref().is_some_and(|p| p.exists())
    }

    /// Unlink the fifo. The queue must be disconnected first.
    pub fn remove(&mut self) -> Result<(), IpcError> {
        if self.state == QueueState::Connected {
            return Err(IpcError::AlreadyConnected);
        }
        let path = self.path.as_ref().ok_or(IpcError::NoFifoPath)?;
        std::fs::remove_file(path)?;
        debug!(path = %path.display(), "fifo removed");
        self.state = QueueState::Removed;
        Ok(())
    }

    /// Open the fifo as `role` and, for a receiver, start the reader
    /// task.
    ///
    /// A fifo sender cannot open before some reader has; `ENXIO` is
    /// retried with a short backoff until the connect timeout (if any)
    /// elapses. A receiver returns immediately; its reader task opens
    /// the fifo in the background, waiting for a writer to show up.
    pub async fn connect(&mut self, role: Role) -> Result<(), IpcError> {
        if self.state == QueueState::Connected {
            return Err(IpcError::AlreadyConnected);
        }
        let path = self.path.clone().ok_or(IpcError::NoFifoPath)?;

        match role {
            Role::Receiver => {
                if !path.exists() {
                    return Err(IpcError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "fifo does not exist",
                    )));
                }
                self.install_reader(ReaderSource::Fifo(path.clone()));
            }
            Role::Sender => {
                let sender = open_sender_retry(&path, self.connect_timeout).await?;
                self.writer = Some(Arc::new(AsyncMutex::new(sender)));
            }
        }

        debug!(path = %path.display(), ?role, "queue connected");
        self.state = QueueState::Connected;
        Ok(())
    }

    fn install_reader(&mut self, source: ReaderSource) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(reader_loop(source, tx, cancel.clone()));
        self.incoming = Some(rx);
        self.reader = Some(ReaderTask { cancel, handle });
    }

    /// Next decoded message, in arrival order. `None` once the channel
    /// is closed and drained, or if this queue never receives.
    pub async fn get_message(&mut self) -> Option<Message> {
        self.incoming.as_mut()?.recv().await
    }

    /// Like [`get_message`](Queue::get_message) but gives up after
    /// `timeout`.
    pub async fn get_message_timeout(&mut self, timeout: Duration) -> Option<Message> {
        time::timeout(timeout, self.get_message()).await.ok().flatten()
    }

    /// Write one message to the peer. Concurrent senders are
    /// serialized by the write lock, so frames never interleave.
    pub async fn send_message(&self, message: &Message) -> Result<(), IpcError> {
        let writer = self.writer.as_ref().ok_or(IpcError::NotConnected)?;
        let mut guard = writer.lock().await;
        wire::write_frame(&mut *guard, message).await?;
        Ok(())
    }

    /// Send a request expecting an answer. The handler is recorded in
    /// `reply_queue`'s in-flight table under a fresh correlation id
    /// before the frame is written, so the answer cannot race the
    /// bookkeeping. Returns the id.
    pub async fn send_request(
        &self,
        reply_queue: &Queue,
        mut message: Message,
        handler: ReplyHandler,
    ) -> Result<u64, IpcError> {
        let id = self.gen_id();
        message.set_id(id);
        reply_queue.pending.lock().insert(id, handler);

        if let Err(err) = self.send_message(&message).await {
            reply_queue.pending.lock().remove(&id);
            return Err(err);
        }
        Ok(id)
    }

    /// Tear the connection down: stop and join the reader task, then
    /// answer every in-flight request with a synthetic `ErrorReply` so
    /// no caller is left waiting.
    pub async fn disconnect(&mut self) -> Result<(), IpcError> {
        if self.writer.is_none() && self.reader.is_none() {
            return Err(IpcError::NotConnected);
        }

        if let Some(task) = self.reader.take() {
            task.cancel.cancel();
            let _ = task.handle.await;
            // The cancelled task may have left a blocking fifo open
            // parked waiting for a writer; a short-lived one lets the
            // pool thread exit.
            if let Some(path) = &self.path {
                let _ = pipe::OpenOptions::new().open_sender(path);
            }
        }
        self.writer = None;

        let pending = { std::mem::take(&mut *self.pending.lock()) };
        if !pending.is_empty() {
            debug!(count = pending.len(), "failing requests in flight at disconnect");
        }
        for (id, handler) in pending {
            let mut reply = synthetic(Command::ErrorReply, "queue disconnected");
            reply.set_id(id);
            handler(reply);
        }

        self.state = QueueState::Disconnected;
        Ok(())
    }

    /// Correlation id: microsecond timestamp in the high bits, a
    /// wrapping counter in the low 16 so ids minted in the same
    /// microsecond stay distinct.
    fn gen_id(&self) -> u64 {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;
        let low = u64::from(self.counter.fetch_add(1, Ordering::Relaxed));
        (micros << 16) | low
    }

    pub(crate) fn take_receiver(&mut self) -> Option<UnboundedReceiver<Message>> {
        self.incoming.take()
    }

    pub(crate) fn pending(&self) -> Arc<Mutex<HashMap<u64, ReplyHandler>>> {
        Arc::clone(&self.pending)
    }
}

async fn open_sender_retry(
    path: &Path,
    timeout: Option<Duration>,
) -> Result<pipe::Sender, IpcError> {
    let deadline = timeout.map(|t| time::Instant::now() + t);
    loop {
        match pipe::OpenOptions::new().open_sender(path) {
            Ok(sender) => return Ok(sender),
            Err(err) if err.raw_os_error() == Some(nix::errno::Errno::ENXIO as i32) => {
                if deadline.is_some_and(|d| time::Instant::now() >= d) {
                    return Err(IpcError::ConnectTimeout);
                }
                time::sleep(Duration::from_millis(10)).await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// A notification message carrying a short reason string. The reason
/// is always far below the length-prefix limit; if it somehow is not,
/// it is dropped rather than corrupting the payload.
fn synthetic(command: Command, reason: &str) -> Message {
    let mut message = Message::new(command);
    let _ = message.write_string(reason);
    message
}

/// Open a fifo for reading, parking on a pool thread until a writer
/// opens the other end.
async fn open_receiver_waiting(path: PathBuf) -> std::io::Result<pipe::Receiver> {
    let file = task::spawn_blocking(move || std::fs::File::open(path))
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))??;
    pipe::Receiver::from_file(file)
}

/// Decode frames until cancellation, hangup, or error. Hangup and
/// error are reported in-band as the final message on the channel.
///
/// A fifo source is not opened until a writer arrives, so a clean EOF
/// always means the peer left, even if it never sent a frame.
async fn reader_loop(
    source: ReaderSource,
    tx: UnboundedSender<Message>,
    cancel: CancellationToken,
) {
    let mut reader = match source {
        ReaderSource::Pipe(reader) => reader,
        ReaderSource::Fifo(path) => {
            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                opened = open_receiver_waiting(path) => opened,
            };
            match opened {
                Ok(reader) => reader,
                Err(err) => {
                    warn!(%err, "fifo open failed");
                    let _ = tx.send(synthetic(Command::QueueError, &err.to_string()));
                    return;
                }
            }
        }
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = wire::read_frame(&mut reader) => match frame {
                Ok(Some(message)) => {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("peer hung up");
                    let _ = tx.send(Message::new(Command::QueueHup));
                    break;
                }
                Err(err) => {
                    warn!(%err, "queue read failed");
                    let _ = tx.send(synthetic(Command::QueueError, &err.to_string()));
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
