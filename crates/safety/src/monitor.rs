// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five checks run under the block's mutex on every condition-variable
//! wakeup. The first check that trips short-circuits the rest for that
//! wakeup: its notice is reported and the loop re-waits immediately rather
//! than evaluating the remaining checks.

use elevator_core::protocol::CarStatus;
use elevator_core::shm::{CarGuard, SharedCar};

/// An operator-facing notice produced by a tripped check, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    None,
    EmergencyStop,
    Overload,
    DataConsistencyError,
}

impl Notice {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Notice::None => None,
            Notice::EmergencyStop => Some("The emergency stop button has been pressed!"),
            Notice::Overload => Some("The overload sensor has been tripped!"),
            Notice::DataConsistencyError => Some("Data consistency error!"),
        }
    }
}

/// Check 1: the counter is a soft liveness token the car's transmit thread
/// increments on every missed tick; any value other than 1 means the system
/// is healthy again and should be reset.
fn reset_counter(car: &SharedCar, guard: &CarGuard<'_>) {
    if guard.safety_system() != 1 {
        guard.set_safety_system(1);
        car.notify_all(guard);
    }
}

/// Check 2: an obstruction detected mid-close reopens the doors.
fn resume_from_obstruction(car: &SharedCar, guard: &CarGuard<'_>) {
    if guard.status() == Some(CarStatus::Closing) && guard.door_obstruction() {
        guard.set_status(CarStatus::Opening);
        car.notify_all(guard);
    }
}

/// Check 3: the emergency-stop button latches emergency mode and clears itself.
fn check_emergency_stop(car: &SharedCar, guard: &CarGuard<'_>) -> bool {
    if guard.emergency_stop() && !guard.emergency_mode() {
        guard.set_emergency_mode(true);
        guard.set_emergency_stop(false);
        car.notify_all(guard);
        true
    } else {
        false
    }
}

/// Check 4: an overload sensor trip latches emergency mode.
fn check_overload(car: &SharedCar, guard: &CarGuard<'_>) -> bool {
    if guard.overload() && !guard.emergency_mode() {
        guard.set_emergency_mode(true);
        car.notify_all(guard);
        true
    } else {
        false
    }
}

/// Invariants 1-4 from the data model: status is one of the five values,
/// both floors parse, every flag byte is 0 or 1, and an obstruction flag
/// implies the doors are actively opening or closing.
fn invariants_hold(guard: &CarGuard<'_>) -> bool {
    let status_valid = guard.status().is_some();
    let cur_valid = guard.current_floor().is_some();
    let dst_valid = guard.destination_floor().is_some();
    let flags_valid = guard.raw_flag_bytes().iter().all(|b| *b == 0 || *b == 1);
    let obstruction_valid = !guard.door_obstruction()
        || matches!(guard.status(), Some(CarStatus::Opening) | Some(CarStatus::Closing));
    status_valid && cur_valid && dst_valid && flags_valid && obstruction_valid
}

/// Check 5: any invariant violation while not already in emergency mode
/// forces it.
fn check_invariants(car: &SharedCar, guard: &CarGuard<'_>) -> bool {
    if !guard.emergency_mode() && !invariants_hold(guard) {
        guard.set_emergency_mode(true);
        car.notify_all(guard);
        true
    } else {
        false
    }
}

/// Run all five checks in order against a freshly woken, locked block.
/// Returns the first tripped check's notice, or [`Notice::None`] if the
/// block was healthy. Only one check trips per wakeup: later checks are
/// skipped once an earlier one trips and forces emergency mode, since
/// emergency mode is itself the gate on checks 3-5.
pub fn evaluate(car: &SharedCar, guard: &CarGuard<'_>) -> Notice {
    reset_counter(car, guard);
    resume_from_obstruction(car, guard);
    if check_emergency_stop(car, guard) {
        return Notice::EmergencyStop;
    }
    if check_overload(car, guard) {
        return Notice::Overload;
    }
    if check_invariants(car, guard) {
        return Notice::DataConsistencyError;
    }
    Notice::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevator_core::floor::FloorIndex;

    fn fresh(suffix: &str) -> SharedCar {
        let name = format!("test-safety-{suffix}-{}", std::process::id());
        SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap()
    }

    #[test]
    fn resets_counter_when_not_one() {
        let car = fresh("counter");
        {
            let guard = car.lock();
            guard.set_safety_system(3);
        }
        let guard = car.lock();
        assert_eq!(evaluate(&car, &guard), Notice::None);
        assert_eq!(guard.safety_system(), 1);
        drop(guard);
        car.close().unwrap();
    }

    #[test]
    fn reopens_on_obstruction_during_closing() {
        let car = fresh("obstruction");
        {
            let guard = car.lock();
            guard.set_status(CarStatus::Closing);
            guard.set_door_obstruction(true);
        }
        let guard = car.lock();
        evaluate(&car, &guard);
        assert_eq!(guard.status(), Some(CarStatus::Opening));
        drop(guard);
        car.close().unwrap();
    }

    #[test]
    fn emergency_stop_latches_and_clears_itself() {
        let car = fresh("estop");
        {
            let guard = car.lock();
            guard.set_emergency_stop(true);
        }
        let guard = car.lock();
        assert_eq!(evaluate(&car, &guard), Notice::EmergencyStop);
        assert!(guard.emergency_mode());
        assert!(!guard.emergency_stop());
        drop(guard);
        car.close().unwrap();
    }

    #[test]
    fn overload_latches_emergency_mode() {
        let car = fresh("overload");
        {
            let guard = car.lock();
            guard.set_overload(true);
        }
        let guard = car.lock();
        assert_eq!(evaluate(&car, &guard), Notice::Overload);
        assert!(guard.emergency_mode());
        drop(guard);
        car.close().unwrap();
    }

    #[test]
    fn obstruction_without_active_door_trips_data_consistency() {
        let car = fresh("consistency");
        {
            let guard = car.lock();
            guard.set_status(CarStatus::Closed);
            guard.set_door_obstruction(true);
        }
        let guard = car.lock();
        assert_eq!(evaluate(&car, &guard), Notice::DataConsistencyError);
        assert!(guard.emergency_mode());
        drop(guard);
        car.close().unwrap();
    }

    #[test]
    fn already_in_emergency_mode_suppresses_further_checks() {
        let car = fresh("already-emergency");
        {
            let guard = car.lock();
            guard.set_emergency_mode(true);
            guard.set_overload(true);
            guard.set_emergency_stop(true);
        }
        let guard = car.lock();
        assert_eq!(evaluate(&car, &guard), Notice::None);
        drop(guard);
        car.close().unwrap();
    }

    #[test]
    fn healthy_block_trips_nothing() {
        let car = fresh("healthy");
        let guard = car.lock();
        assert_eq!(evaluate(&car, &guard), Notice::None);
        assert!(!guard.emergency_mode());
        drop(guard);
        car.close().unwrap();
    }
}
