// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

/// One-shot passenger call against the controller at `127.0.0.1:3000`.
#[derive(Debug, Parser)]
#[command(name = "call", version, about)]
pub struct Config {
    /// Source floor label (e.g. `1`, `B2`).
    pub src: String,

    /// Destination floor label.
    pub dst: String,
}
