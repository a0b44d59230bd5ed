// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared `tracing` initialization for every binary in the workspace.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Initialize the process-wide tracing subscriber.
///
/// Priority: `RUST_LOG` (if set) overrides `level`; otherwise `level` is
/// used directly. `json` selects the structured JSON formatter, used when
/// a binary's output is consumed by another process rather than a human.
pub fn init(level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let result = if json {
        fmt::fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt::fmt().with_env_filter(filter).try_init()
    };
    drop(result);
}
