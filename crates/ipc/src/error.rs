// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Error taxonomy for the transport.

use thiserror::Error;

/// A typed read ran past the message buffer or hit malformed data.
///
/// Every read accessor on [`Message`](crate::Message) is fallible;
/// out-of-bounds reads are hard errors, never silent garbage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("read of {requested} bytes at offset {at} past end of {len}-byte buffer")]
    PastEnd { at: usize, requested: usize, len: usize },

    #[error("string field is missing its NUL terminator")]
    MissingNul,

    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// A written field was too large for its `u32` length prefix.
    #[error("field of {0} bytes does not fit a u32 length prefix")]
    TooLong(usize),
}

/// The byte stream did not contain a well-formed frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown command tag {0:#010x}")]
    UnknownCommand(u32),

    /// The peer closed the stream in the middle of a frame.
    #[error("connection closed mid-frame")]
    TruncatedFrame,

    /// The payload does not fit the frame header's `u32` length field.
    #[error("payload of {0} bytes does not fit a u32 frame length")]
    FrameTooLarge(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Top-level errors from queue operations.
#[derive(Debug, Error)]
pub enum IpcError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("queue is not connected")]
    NotConnected,

    /// A fifo operation on a queue that has no fifo path, such as one
    /// half of an anonymous pipe pair.
    #[error("queue has no fifo path")]
    NoFifoPath,

    #[error("queue is already connected")]
    AlreadyConnected,

    #[error("timed out waiting for a peer to open the fifo")]
    ConnectTimeout,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Message(#[from] MessageError),
}
