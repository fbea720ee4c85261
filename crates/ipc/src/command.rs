// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Command tags carried in every frame header.

use crate::error::ProtocolError;

/// What a message asks the peer to do.
///
/// Tags are fixed on the wire; new commands get new values, existing
/// values never change meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Command {
    Noop = 0,
    Connect = 1,
    Disconnect = 2,
    GetChanges = 3,
    ReadChange = 4,
    CommitChange = 5,
    CommittedAll = 6,
    SyncDone = 7,
    CallPlugin = 8,
    NewChange = 9,
    Initialize = 10,
    Finalize = 11,
    /// Successful answer to an earlier request, correlated by id.
    Reply = 12,
    /// Failed answer to an earlier request, correlated by id.
    ErrorReply = 13,
    Error = 14,
    /// Synthesized locally when the reader hits an abnormal error.
    QueueError = 15,
    /// Synthesized locally when the peer hangs up cleanly.
    QueueHup = 16,
}

impl Command {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Decode a wire tag. Unknown tags are an error, never skipped.
    pub fn from_u32(tag: u32) -> Result<Self, ProtocolError> {
        Ok(match tag {
            0 => Command::Noop,
            1 => Command::Connect,
            2 => Command::Disconnect,
            3 => Command::GetChanges,
            4 => Command::ReadChange,
            5 => Command::CommitChange,
            6 => Command::CommittedAll,
            7 => Command::SyncDone,
            8 => Command::CallPlugin,
            9 => Command::NewChange,
            10 => Command::Initialize,
            11 => Command::Finalize,
            12 => Command::Reply,
            13 => Command::ErrorReply,
            14 => Command::Error,
            15 => Command::QueueError,
            16 => Command::QueueHup,
            other => return Err(ProtocolError::UnknownCommand(other)),
        })
    }

    /// Answers close out a pending request instead of starting work.
    pub fn is_answer(self) -> bool {
        matches!(self, Command::Reply | Command::ErrorReply)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
