// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, ValueEnum};

/// One-shot technician panel write against a car's shared state block.
#[derive(Debug, Parser)]
#[command(name = "internal", version, about)]
pub struct Config {
    /// Car name whose shared state block (`/car<name>`) this panel writes to.
    pub car_name: String,

    /// The single flag or field mutation to apply.
    pub operation: Operation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Operation {
    Open,
    Close,
    Stop,
    ServiceOn,
    ServiceOff,
    Up,
    Down,
}
