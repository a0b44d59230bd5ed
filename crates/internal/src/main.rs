// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod config;

use std::process::ExitCode;

use clap::Parser;
use elevator_core::protocol::CarStatus;
use elevator_core::shm::{CarGuard, SharedCar};

use config::{Config, Operation};

/// Applies one operation to an already-locked block. Returns the
/// diagnostic to print on a precondition failure; on success the caller
/// still owes a broadcast (left to the caller so tests can observe the
/// block without requiring one).
fn apply(op: Operation, guard: &CarGuard<'_>) -> Result<(), &'static str> {
    match op {
        Operation::Open => {
            guard.set_open_button(true);
            Ok(())
        }
        Operation::Close => {
            guard.set_close_button(true);
            Ok(())
        }
        Operation::Stop => {
            guard.set_emergency_stop(true);
            Ok(())
        }
        Operation::ServiceOn => {
            guard.set_individual_service_mode(true);
            guard.set_emergency_mode(false);
            Ok(())
        }
        Operation::ServiceOff => {
            guard.set_individual_service_mode(false);
            Ok(())
        }
        Operation::Up | Operation::Down => {
            if !guard.individual_service_mode() {
                return Err("Operation only allowed in service mode.");
            }
            if guard.status() == Some(CarStatus::Between) {
                return Err("Operation not allowed while elevator is moving.");
            }
            if guard.status() != Some(CarStatus::Closed) {
                return Err("Operation not allowed while doors are open.");
            }
            if let Some(current) = guard.current_floor() {
                guard.set_destination_floor(current.adjacent(op == Operation::Up));
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let config = Config::parse();

    let car = match SharedCar::open(&config.car_name) {
        Ok(c) => c,
        Err(_) => {
            eprintln!("Unable to access car {}.", config.car_name);
            return ExitCode::FAILURE;
        }
    };

    let guard = car.lock();
    match apply(config.operation, &guard) {
        Ok(()) => {
            car.notify_all(&guard);
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
