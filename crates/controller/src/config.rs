// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

/// Central dispatch controller: accepts car registrations and passenger
/// calls on `127.0.0.1:3000`. Takes no positional arguments.
#[derive(Debug, Parser)]
#[command(name = "controller", version, about)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "ELEVATOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON instead of the default human-readable format.
    #[arg(long, env = "ELEVATOR_LOG_JSON")]
    pub log_json: bool,
}
