// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod config;
mod monitor;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use elevator_core::shm::SharedCar;
use tracing::{error, warn};

use config::Config;

fn main() -> ExitCode {
    let config = Config::parse();
    elevator_core::logging::init(&config.log_level, config.log_json);

    let car = match SharedCar::open(&config.car_name) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Unable to access car {}.", config.car_name);
            error!(error = %e, car = %config.car_name, "failed to attach shared state block");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
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

    // The monitor has nothing else to do between broadcasts: it blocks
    // indefinitely on the shared condition variable rather than polling.
    while !shutdown.load(Ordering::Relaxed) {
        let guard = car.lock();
        car.wait(&guard);
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let notice = monitor::evaluate(&car, &guard);
        drop(guard);
        if let Some(message) = notice.message() {
            warn!(car = %config.car_name, notice = ?notice, "safety check tripped");
            println!("{message}");
        }
    }

    ExitCode::SUCCESS
}
