// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use elevator_core::floor::FloorIndex;

/// Elevator car process: owns one shared state block and a control link to
/// the controller.
#[derive(Debug, Parser)]
#[command(name = "car", version, about)]
pub struct Config {
    /// Car name, used for both the registration frame and the shared-memory
    /// object name (`/car<name>`).
    pub name: String,

    /// Lowest serviceable floor label (e.g. `1`, `B2`).
    pub lowest_floor: String,

    /// Highest serviceable floor label.
    pub highest_floor: String,

    /// Base delay in milliseconds parameterising every timed transition.
    pub delay_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "ELEVATOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON instead of the default human-readable format.
    #[arg(long, env = "ELEVATOR_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Range {
    pub lowest: FloorIndex,
    pub highest: FloorIndex,
}

impl Config {
    /// Parse and validate the floor range. Unlike the controller's
    /// registration parsing (which swaps a misordered range), the car
    /// binary rejects `highest < lowest` outright with an
    /// "Invalid floor range." error.
    pub fn range(&self) -> Result<Range, anyhow::Error> {
        let lowest = FloorIndex::parse(&self.lowest_floor)
            .map_err(|e| anyhow::anyhow!("invalid lowest floor: {e}"))?;
        let highest = FloorIndex::parse(&self.highest_floor)
            .map_err(|e| anyhow::anyhow!("invalid highest floor: {e}"))?;
        if highest.index() < lowest.index() {
            anyhow::bail!("invalid floor range");
        }
        Ok(Range { lowest, highest })
    }
}
