// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error types that cross crate boundaries.

use std::fmt;

/// Failure establishing or operating the process-shared state block.
#[derive(Debug)]
pub enum ShmError {
    /// `shm_open` failed.
    Open(nix::Error),
    /// `ftruncate` failed.
    Truncate(nix::Error),
    /// `mmap` failed.
    Map(nix::Error),
    /// `munmap` failed.
    Unmap(nix::Error),
    /// `shm_unlink` failed.
    Unlink(nix::Error),
    /// A pthread primitive initialization call returned non-zero.
    PthreadInit(&'static str, i32),
    /// The block exists but is smaller than `size_of::<CarBlock>()`.
    SizeMismatch { expected: usize, found: usize },
    /// The car name cannot be turned into a shared-memory object name.
    InvalidName,
}

impl fmt::Display for ShmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShmError::Open(e) => write!(f, "shm_open failed: {e}"),
            ShmError::Truncate(e) => write!(f, "ftruncate failed: {e}"),
            ShmError::Map(e) => write!(f, "mmap failed: {e}"),
            ShmError::Unmap(e) => write!(f, "munmap failed: {e}"),
            ShmError::Unlink(e) => write!(f, "shm_unlink failed: {e}"),
            ShmError::PthreadInit(what, rc) => {
                write!(f, "pthread {what} initialization failed: errno {rc}")
            }
            ShmError::SizeMismatch { expected, found } => write!(
                f,
                "shared block size mismatch: expected {expected} bytes, found {found}"
            ),
            ShmError::InvalidName => write!(f, "car name is not a valid shared-memory object name"),
        }
    }
}

impl std::error::Error for ShmError {}

/// A wire message did not match the protocol grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError(pub String);

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed protocol message: {:?}", self.0)
    }
}

impl std::error::Error for ProtocolError {}
