// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

/// Independent safety monitor: attaches to one car's shared state block and
/// validates it on every condition-variable wakeup.
#[derive(Debug, Parser)]
#[command(name = "safety", version, about)]
pub struct Config {
    /// Car name whose shared state block (`/car<name>`) this monitor attaches to.
    pub car_name: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "ELEVATOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON instead of the default human-readable format.
    #[arg(long, env = "ELEVATOR_LOG_JSON")]
    pub log_json: bool,
}
