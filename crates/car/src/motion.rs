// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The car's door/motion state machine: `Closed -> Between -> Closed` for
//! movement, `Closed -> Opening -> Open -> Closing -> Closed` for a stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use elevator_core::floor::FloorIndex;
use elevator_core::protocol::CarStatus;
use elevator_core::shm::{CarGuard, SharedCar};
use parking_lot::Mutex;
use tracing::info;

use crate::config::Range;
use crate::link::TxSignal;

/// A floor latched by the receive thread while the car is mid-step
/// (`Between`), applied once that step settles. Process-local: kept beside
/// the shared block rather than inside it.
pub type PendingFloor = Arc<Mutex<Option<FloorIndex>>>;

/// Broadcast on the shared condition variable and wake the transmit thread.
/// Every shared-block mutation in this module goes through here so the two
/// notification paths never drift apart.
fn notify(car: &SharedCar, guard: &CarGuard<'_>, signal: &TxSignal) {
    car.notify_all(guard);
    signal.raise();
}

fn fetch_status(car: &SharedCar, status: CarStatus) -> bool {
    car.lock().status() == Some(status)
}

fn is_service_mode(car: &SharedCar) -> bool {
    car.lock().individual_service_mode()
}

fn is_emergency_mode(car: &SharedCar) -> bool {
    car.lock().emergency_mode()
}

fn at_destination(car: &SharedCar) -> bool {
    let guard = car.lock();
    guard.current_floor() == guard.destination_floor()
}

/// Set `status`, notify, sleep `delay_ms`, then report whatever status is
/// current when the delay elapses (another actor, e.g. the safety monitor,
/// may have changed it in the meantime).
fn transition_and_settle(car: &SharedCar, status: CarStatus, delay_ms: u64, signal: &TxSignal) -> CarStatus {
    {
        let guard = car.lock();
        guard.set_status(status);
        notify(car, &guard, signal);
    }
    thread::sleep(Duration::from_millis(delay_ms));
    car.lock().status().unwrap_or(CarStatus::Closed)
}

fn to_close(car: &SharedCar, signal: &TxSignal) {
    let guard = car.lock();
    guard.set_status(CarStatus::Closed);
    notify(car, &guard, signal);
}

/// Run the open sequence: `Opening` (delay) -> `Open` (indefinite window,
/// extended by repeated `open_button` presses, ended immediately by
/// `close_button`) -> `Closing` (delay) -> `Closed`.
fn to_open(car: &SharedCar, delay_ms: u64, signal: &TxSignal) {
    let settled = transition_and_settle(car, CarStatus::Opening, delay_ms, signal);
    if settled != CarStatus::Opening {
        return;
    }

    {
        let guard = car.lock();
        guard.set_status(CarStatus::Open);
        notify(car, &guard, signal);
    }

    let guard = car.lock();
    let mut deadline = Instant::now() + Duration::from_millis(delay_ms);
    loop {
        if guard.close_button() {
            break;
        }
        if guard.open_button() {
            guard.set_open_button(false);
            deadline = Instant::now() + Duration::from_millis(delay_ms);
            continue;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        car.wait_timeout(&guard, remaining);
    }
    if guard.close_button() {
        guard.set_close_button(false);
    }
    guard.set_status(CarStatus::Closing);
    notify(car, &guard, signal);
    drop(guard);

    thread::sleep(Duration::from_millis(delay_ms));

    let guard = car.lock();
    if guard.status() == Some(CarStatus::Closing) {
        guard.set_status(CarStatus::Closed);
        notify(car, &guard, signal);
    }
}

/// Advance `current_floor` one step toward `destination_floor`, clamped to
/// the car's serviceable range.
fn move_one_floor(car: &SharedCar, range: &Range, delay_ms: u64, signal: &TxSignal) {
    let settled = transition_and_settle(car, CarStatus::Between, delay_ms, signal);
    if settled != CarStatus::Between {
        return;
    }
    let guard = car.lock();
    if guard.status() == Some(CarStatus::Between) {
        if let (Some(current), Some(destination)) =
            (guard.current_floor(), guard.destination_floor())
        {
            let next = current.step_toward(destination).clamp(range.lowest, range.highest);
            guard.set_current_floor(next);
        }
        guard.set_status(CarStatus::Closed);
        notify(car, &guard, signal);
    }
}

/// Apply a latched pending destination now that the car has settled.
fn apply_pending(car: &SharedCar, pending: &PendingFloor, signal: &TxSignal) {
    let floor = pending.lock().take();
    if let Some(floor) = floor {
        let guard = car.lock();
        guard.set_destination_floor(floor);
        notify(car, &guard, signal);
    }
}

/// Service-mode motion: a `FLOOR`/`destination_floor` request more than one
/// floor away is clamped to a no-op; only adjacent-floor requests move.
fn service_between(car: &SharedCar, range: &Range, delay_ms: u64, signal: &TxSignal) {
    if !is_service_mode(car) || !fetch_status(car, CarStatus::Closed) {
        return;
    }
    let (current, destination) = {
        let guard = car.lock();
        (guard.current_floor(), guard.destination_floor())
    };
    match (current, destination) {
        (Some(current), Some(destination)) if current.is_adjacent(destination) => {
            move_one_floor(car, range, delay_ms, signal);
        }
        (Some(current), Some(_)) => {
            let guard = car.lock();
            guard.set_destination_floor(current);
            notify(car, &guard, signal);
        }
        _ => {}
    }
}

/// Consume and clear the open/close button flags, returning what was set.
fn take_buttons(car: &SharedCar) -> (bool, bool) {
    let guard = car.lock();
    let open = guard.open_button();
    let close = guard.close_button();
    guard.set_open_button(false);
    guard.set_close_button(false);
    (open, close)
}

/// Run the car's main operation loop until `shutdown` is set. Blocks the
/// calling thread.
pub fn run(
    car: Arc<SharedCar>,
    range: Range,
    delay_ms: u64,
    pending: PendingFloor,
    signal: Arc<TxSignal>,
    shutdown: Arc<AtomicBool>,
) {
    let signal = signal.as_ref();
    while !shutdown.load(Ordering::Relaxed) {
        {
            let guard = car.lock();
            loop {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                let idle = !guard.open_button()
                    && !guard.close_button()
                    && !guard.individual_service_mode()
                    && !guard.emergency_mode()
                    && guard.current_floor() == guard.destination_floor();
                if !idle {
                    break;
                }
                car.wait_timeout(&guard, Duration::from_millis(200));
            }
        }
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        if is_service_mode(&car) {
            service_between(&car, &range, delay_ms, signal);
            let (open, close) = take_buttons(&car);
            if open && (fetch_status(&car, CarStatus::Closed) || fetch_status(&car, CarStatus::Closing)) {
                let settled = transition_and_settle(&car, CarStatus::Opening, delay_ms, signal);
                if settled == CarStatus::Opening {
                    let guard = car.lock();
                    guard.set_status(CarStatus::Open);
                    notify(&car, &guard, signal);
                }
            }
            if close && fetch_status(&car, CarStatus::Open) {
                transition_and_settle(&car, CarStatus::Closing, delay_ms, signal);
                to_close(&car, signal);
            }
            let guard = car.lock();
            car.wait_timeout(&guard, Duration::from_millis(100));
            continue;
        }

        if is_emergency_mode(&car) {
            let (open, close) = take_buttons(&car);
            if open && (fetch_status(&car, CarStatus::Closed) || fetch_status(&car, CarStatus::Closing)) {
                let settled = transition_and_settle(&car, CarStatus::Opening, delay_ms, signal);
                if settled == CarStatus::Opening {
                    let guard = car.lock();
                    guard.set_status(CarStatus::Open);
                    notify(&car, &guard, signal);
                }
            }
            if close {
                if fetch_status(&car, CarStatus::Open) {
                    let settled = transition_and_settle(&car, CarStatus::Closing, delay_ms, signal);
                    if settled == CarStatus::Closing {
                        let guard = car.lock();
                        guard.set_status(CarStatus::Closed);
                        notify(&car, &guard, signal);
                    }
                } else if fetch_status(&car, CarStatus::Closing) {
                    to_close(&car, signal);
                }
            }
            let guard = car.lock();
            car.wait_timeout(&guard, Duration::from_millis(100));
            continue;
        }

        // Normal operation.
        if at_destination(&car) {
            to_open(&car, delay_ms, signal);
            apply_pending(&car, &pending, signal);
        } else if fetch_status(&car, CarStatus::Closed) {
            move_one_floor(&car, &range, delay_ms, signal);
            if at_destination(&car) {
                to_open(&car, delay_ms, signal);
            }
            apply_pending(&car, &pending, signal);
        } else if fetch_status(&car, CarStatus::Closing) {
            transition_and_settle(&car, CarStatus::Closing, delay_ms, signal);
            to_close(&car, signal);
        } else if fetch_status(&car, CarStatus::Opening) {
            to_open(&car, delay_ms, signal);
        }

        let (open, close) = take_buttons(&car);
        if open && (fetch_status(&car, CarStatus::Closed) || fetch_status(&car, CarStatus::Closing)) {
            to_open(&car, delay_ms, signal);
        }
        if close && fetch_status(&car, CarStatus::Open) {
            transition_and_settle(&car, CarStatus::Closing, delay_ms, signal);
            to_close(&car, signal);
        }

        let guard = car.lock();
        car.wait_timeout(&guard, Duration::from_millis(50));
    }
    info!("motion loop exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal() -> TxSignal {
        TxSignal::default()
    }

    #[test]
    fn take_buttons_clears_both_flags() {
        let name = format!("test-motion-{}", std::process::id());
        let car = SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap();
        {
            let guard = car.lock();
            guard.set_open_button(true);
            guard.set_close_button(true);
        }
        let (open, close) = take_buttons(&car);
        assert!(open && close);
        let guard = car.lock();
        assert!(!guard.open_button());
        assert!(!guard.close_button());
        drop(guard);
        car.close().unwrap();
    }

    #[test]
    fn service_between_clamps_non_adjacent_request() {
        let name = format!("test-motion-clamp-{}", std::process::id());
        let car = SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap();
        {
            let guard = car.lock();
            guard.set_current_floor(FloorIndex::new(5).unwrap());
            guard.set_destination_floor(FloorIndex::new(9).unwrap());
            guard.set_individual_service_mode(true);
        }
        let range = Range {
            lowest: FloorIndex::new(1).unwrap(),
            highest: FloorIndex::new(10).unwrap(),
        };
        service_between(&car, &range, 1, &signal());
        let guard = car.lock();
        assert_eq!(guard.destination_floor(), Some(FloorIndex::new(5).unwrap()));
        drop(guard);
        car.close().unwrap();
    }

    #[test]
    fn service_between_allows_adjacent_move() {
        let name = format!("test-motion-adjacent-{}", std::process::id());
        let car = SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap();
        {
            let guard = car.lock();
            guard.set_current_floor(FloorIndex::new(5).unwrap());
            guard.set_destination_floor(FloorIndex::new(6).unwrap());
            guard.set_individual_service_mode(true);
        }
        let range = Range {
            lowest: FloorIndex::new(1).unwrap(),
            highest: FloorIndex::new(10).unwrap(),
        };
        service_between(&car, &range, 1, &signal());
        let guard = car.lock();
        assert_eq!(guard.current_floor(), Some(FloorIndex::new(6).unwrap()));
        assert_eq!(guard.status(), Some(CarStatus::Closed));
        drop(guard);
        car.close().unwrap();
    }

    #[test]
    fn apply_pending_writes_latched_floor_and_clears_slot() {
        let name = format!("test-motion-pending-{}", std::process::id());
        let car = SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap();
        let pending: PendingFloor = Arc::new(Mutex::new(Some(FloorIndex::new(7).unwrap())));
        apply_pending(&car, &pending, &signal());
        assert!(pending.lock().is_none());
        let guard = car.lock();
        assert_eq!(guard.destination_floor(), Some(FloorIndex::new(7).unwrap()));
        drop(guard);
        car.close().unwrap();
    }
}
