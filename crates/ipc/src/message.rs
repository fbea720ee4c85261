// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Positional typed message buffers.
//!
//! A message is a command tag, a correlation id, and a flat byte
//! buffer. Writers append typed fields in order; readers consume them
//! in the same order. Both sides must agree on the field sequence per
//! command, there is no schema on the wire. Integers are fixed
//! little-endian regardless of host byte order.

use crate::command::Command;
use crate::error::MessageError;

/// One framed message.
#[derive(Debug, Clone)]
pub struct Message {
    command: Command,
    id: u64,
    buffer: Vec<u8>,
    read_pos: usize,
}

impl Message {
    pub fn new(command: Command) -> Self {
        Self { command, id: 0, buffer: Vec::new(), read_pos: 0 }
    }

    pub(crate) fn with_parts(command: Command, id: u64, buffer: Vec<u8>) -> Self {
        Self { command, id, buffer, read_pos: 0 }
    }

    /// Successful answer to `request`, carrying its correlation id.
    pub fn reply_to(request: &Message) -> Self {
        let mut reply = Message::new(Command::Reply);
        reply.id = request.id;
        reply
    }

    /// Failed answer to `request`; `reason` is the first payload field.
    pub fn error_reply_to(request: &Message, reason: &str) -> Result<Self, MessageError> {
        let mut reply = Message::new(Command::ErrorReply);
        reply.id = request.id;
        reply.write_string(reason)?;
        Ok(reply)
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    pub fn is_error(&self) -> bool {
        self.command == Command::ErrorReply
    }

    pub fn is_answer(&self) -> bool {
        self.command.is_answer()
    }

    pub fn payload(&self) -> &[u8] {
        &self.buffer
    }

    pub fn payload_len(&self) -> usize {
        self.buffer.len()
    }

    /// Rewind the read cursor to the first field.
    pub fn reset_read(&mut self) {
        self.read_pos = 0;
    }

    pub fn write_int(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_uint(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_long(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Length prefix, UTF-8 bytes, NUL. The prefix counts the NUL.
    pub fn write_string(&mut self, value: &str) -> Result<(), MessageError> {
        let len = u32::try_from(value.len() + 1).map_err(|_| MessageError::TooLong(value.len()))?;
        self.buffer.extend_from_slice(&len.to_le_bytes());
        self.buffer.extend_from_slice(value.as_bytes());
        self.buffer.push(0);
        Ok(())
    }

    /// Length prefix plus raw bytes, no terminator.
    pub fn write_data(&mut self, value: &[u8]) -> Result<(), MessageError> {
        let len = u32::try_from(value.len()).map_err(|_| MessageError::TooLong(value.len()))?;
        self.buffer.extend_from_slice(&len.to_le_bytes());
        self.buffer.extend_from_slice(value);
        Ok(())
    }

    pub fn read_int(&mut self) -> Result<i32, MessageError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_uint(&mut self) -> Result<u32, MessageError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_long(&mut self) -> Result<i64, MessageError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(raw))
    }

    pub fn read_string(&mut self) -> Result<String, MessageError> {
        self.read_const_str().map(str::to_string)
    }

    /// Borrowing variant of [`read_string`](Message::read_string).
    pub fn read_const_str(&mut self) -> Result<&str, MessageError> {
        let len = self.read_uint()? as usize;
        if len == 0 {
            return Err(MessageError::MissingNul);
        }
        let bytes = self.take(len)?;
        let (body, nul) = bytes.split_at(len - 1);
        if nul != [0u8] {
            return Err(MessageError::MissingNul);
        }
        std::str::from_utf8(body).map_err(|_| MessageError::InvalidUtf8)
    }

    pub fn read_data(&mut self) -> Result<Vec<u8>, MessageError> {
        self.read_const_data().map(<[u8]>::to_vec)
    }

    /// Borrowing variant of [`read_data`](Message::read_data).
    pub fn read_const_data(&mut self) -> Result<&[u8], MessageError> {
        let len = self.read_uint()? as usize;
        self.take(len)
    }

    fn take(&mut self, n: usize) -> Result<&[u8], MessageError> {
        let end = self.read_pos.checked_add(n).filter(|end| *end <= self.buffer.len());
        match end {
            Some(end) => {
                let slice = &self.buffer[self.read_pos..end];
                self.read_pos = end;
                Ok(slice)
            }
            None => Err(MessageError::PastEnd {
                at: self.read_pos,
                requested: n,
                len: self.buffer.len(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
