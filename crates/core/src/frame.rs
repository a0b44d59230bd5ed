// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed ASCII framing for the control link: `[u16 BE length][payload]`.

use std::fmt;
use std::io::{self, Read, Write};

/// Chunk size used to drain a payload that doesn't fit the caller's buffer.
const DRAIN_CHUNK: usize = 512;

/// A frame read/write failure.
#[derive(Debug)]
pub enum FrameError {
    /// The peer closed the connection, or a read returned zero bytes.
    Closed,
    /// The payload was not valid UTF-8 (ASCII in practice).
    InvalidEncoding,
    /// Underlying I/O error.
    Io(io::Error),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Closed => write!(f, "connection closed"),
            FrameError::InvalidEncoding => write!(f, "frame payload was not valid UTF-8"),
            FrameError::Io(e) => write!(f, "frame I/O error: {e}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        FrameError::Io(e)
    }
}

/// Read exactly `buf.len()` bytes, retrying on `Interrupted` and treating a
/// zero-length read as a closed connection.
fn read_all(stream: &mut impl Read, buf: &mut [u8]) -> Result<(), FrameError> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Err(FrameError::Closed),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrameError::Io(e)),
        }
    }
    Ok(())
}

/// Write exactly `buf`, retrying on `Interrupted`.
fn write_all(stream: &mut impl Write, buf: &[u8]) -> Result<(), FrameError> {
    let mut sent = 0;
    while sent < buf.len() {
        match stream.write(&buf[sent..]) {
            Ok(0) => return Err(FrameError::Closed),
            Ok(n) => sent += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrameError::Io(e)),
        }
    }
    Ok(())
}

/// Read one frame into a freshly allocated `String`.
pub fn receive_frame(stream: &mut impl Read) -> Result<String, FrameError> {
    let mut len_buf = [0u8; 2];
    read_all(stream, &mut len_buf)?;
    let len = u16::from_be_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    read_all(stream, &mut payload)?;
    String::from_utf8(payload).map_err(|_| FrameError::InvalidEncoding)
}

/// Read one frame into `buf`. If the incoming payload is longer than
/// `buf.len() - 1`, it is truncated to fit (reserving one byte for a NUL
/// terminator) and the remainder is drained from the stream in
/// [`DRAIN_CHUNK`]-sized reads.
/// Returns the number of bytes written into `buf`.
pub fn receive_frame_into(stream: &mut impl Read, buf: &mut [u8]) -> Result<usize, FrameError> {
    let mut len_buf = [0u8; 2];
    read_all(stream, &mut len_buf)?;
    let len = u16::from_be_bytes(len_buf) as usize;

    let capacity = buf.len().saturating_sub(1);
    let take = len.min(capacity);
    read_all(stream, &mut buf[..take])?;

    let mut remaining = len - take;
    let mut drain = [0u8; DRAIN_CHUNK];
    while remaining > 0 {
        let chunk = remaining.min(DRAIN_CHUNK);
        read_all(stream, &mut drain[..chunk])?;
        remaining -= chunk;
    }
    Ok(take)
}

/// Write one frame. The payload length is clamped to `u16::MAX` rather than
/// erroring; anything beyond that is silently dropped from the wire.
pub fn send_frame(stream: &mut impl Write, payload: &str) -> Result<(), FrameError> {
    let bytes = payload.as_bytes();
    let len = bytes.len().min(u16::MAX as usize);
    write_all(stream, &(len as u16).to_be_bytes())?;
    write_all(stream, &bytes[..len])?;
    Ok(())
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
