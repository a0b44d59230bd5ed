// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared building blocks for the elevator control plane: the length-prefixed
//! frame codec, the floor label <-> index codec, the wire protocol grammar,
//! the process-shared car state block, and common error/logging plumbing.

pub mod error;
pub mod floor;
pub mod frame;
pub mod logging;
pub mod protocol;
pub mod shm;
