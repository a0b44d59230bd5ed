// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod config;
mod connection;
mod registry;

use std::net::{SocketAddr, TcpListener};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use socket2::{Domain, Socket, Type};
use tracing::{error, info, warn};

use config::Config;
use registry::Registry;

const CONTROLLER_ADDR: &str = "127.0.0.1:3000";

/// Binds the listener with `SO_REUSEADDR` set before `bind`/`listen` —
/// without it a restarted controller can fail to bind while the prior
/// socket's connections are still draining in `TIME_WAIT`.
fn bind_with_reuse(addr: &str) -> std::io::Result<TcpListener> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;
    let socket = Socket::new(Domain::IPV4, Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;
    Ok(socket.into())
}

fn main() -> ExitCode {
    let config = Config::parse();
    elevator_core::logging::init(&config.log_level, config.log_json);

    if let Err(e) = ctrlc::set_handler(|| {
        warn!("received SIGINT, shutting down");
        std::process::exit(0);
    }) {
        error!(error = %e, "failed to install SIGINT handler");
    }

    let listener = match bind_with_reuse(CONTROLLER_ADDR) {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, addr = CONTROLLER_ADDR, "failed to bind controller socket");
            return ExitCode::FAILURE;
        }
    };
    info!(addr = CONTROLLER_ADDR, "controller listening");

    let registry = Arc::new(Registry::new());

    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let registry = Arc::clone(&registry);
        thread::spawn(move || connection::handle(stream, registry));
    }

    ExitCode::SUCCESS
}
