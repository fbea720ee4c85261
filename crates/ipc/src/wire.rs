// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Frame codec: 16-byte little-endian header + payload.
//!
//! Header layout: `[u32 payload_len][u32 command][u64 id]`. The length
//! counts payload bytes only. Frames are written and read with
//! `write_all`/`read_exact`, so partial transfers on a pipe are retried
//! inside the runtime and multi-megabyte payloads pass through
//! unchunked.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::command::Command;
use crate::error::ProtocolError;
use crate::message::Message;

pub const HEADER_LEN: usize = 16;

/// Write one frame.
pub async fn write_frame<W>(writer: &mut W, message: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let payload = message.payload();
    let len =
        u32::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge(payload.len()))?;
    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(&len.to_le_bytes());
    header[4..8].copy_from_slice(&message.command().as_u32().to_le_bytes());
    header[8..16].copy_from_slice(&message.id().to_le_bytes());

    writer.write_all(&header).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame.
///
/// Returns `Ok(None)` on a clean EOF between frames (the peer hung
/// up); EOF inside a frame is [`ProtocolError::TruncatedFrame`].
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Message>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::TruncatedFrame);
        }
        filled += n;
    }

    let payload_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let command = Command::from_u32(u32::from_le_bytes([
        header[4], header[5], header[6], header[7],
    ]))?;
    let mut id_bytes = [0u8; 8];
    id_bytes.copy_from_slice(&header[8..16]);
    let id = u64::from_le_bytes(id_bytes);

    let mut payload = vec![0u8; payload_len];
    reader.read_exact(&mut payload).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::TruncatedFrame
        } else {
            ProtocolError::Io(err)
        }
    })?;

    Ok(Some(Message::with_parts(command, id, payload)))
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
