// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod config;
mod link;
mod motion;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use elevator_core::shm::SharedCar;
use parking_lot::Mutex;
use tracing::error;

use config::{Config, Range};
use link::TxSignal;

fn main() -> ExitCode {
    let config = Config::parse();
    elevator_core::logging::init(&config.log_level, config.log_json);

    let range = match config.range() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Invalid floor range: {e}");
            return ExitCode::FAILURE;
        }
    };

    let car = match SharedCar::create(&config.name, range.lowest) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!(error = %e, "failed to create shared state block");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        // Weak: the ctrlc handler lives for the rest of the process, and
        // must not be the reason the final `Arc::try_unwrap` below fails.
        let car_for_signal = Arc::downgrade(&car);
        if let Err(e) = ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
            if let Some(car) = car_for_signal.upgrade() {
                let guard = car.lock();
                car.notify_all(&guard);
            }
        }) {
            error!(error = %e, "failed to install SIGINT handler");
        }
    }

    let pending = Arc::new(Mutex::new(None));
    let signal = Arc::new(TxSignal::default());

    let link_car = Arc::clone(&car);
    let link_name = config.name.clone();
    let link_pending = Arc::clone(&pending);
    let link_signal = Arc::clone(&signal);
    let link_shutdown = Arc::clone(&shutdown);
    let link_range: Range = range;
    let link_handle = std::thread::spawn(move || {
        link::run(
            link_car,
            link_name,
            link_range,
            config.delay_ms,
            link_pending,
            link_signal,
            link_shutdown,
        )
    });

    motion::run(
        Arc::clone(&car),
        range,
        config.delay_ms,
        pending,
        signal,
        shutdown,
    );

    let _ = link_handle.join();

    match Arc::try_unwrap(car) {
        Ok(car) => {
            if let Err(e) = car.close() {
                error!(error = %e, "failed to tear down shared state block");
                return ExitCode::FAILURE;
            }
        }
        Err(_) => {
            error!("shared state block still referenced at shutdown");
        }
    }

    ExitCode::SUCCESS
}
