use super::*;
use std::time::Duration;

fn unique_name(tag: &str) -> String {
    format!("test-{}-{}", std::process::id(), tag)
}

#[test]
fn create_then_open_shares_state() {
    let name = unique_name("create-open");
    let creator = SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap();
    let attacher = SharedCar::open(&name).unwrap();

    {
        let guard = creator.lock();
        assert_eq!(guard.current_floor(), Some(FloorIndex::new(1).unwrap()));
        assert_eq!(guard.status(), Some(CarStatus::Closed));
        guard.set_destination_floor(FloorIndex::new(5).unwrap());
    }
    {
        let guard = attacher.lock();
        assert_eq!(guard.destination_floor(), Some(FloorIndex::new(5).unwrap()));
    }

    attacher.close().unwrap();
    creator.close().unwrap();
}

#[test]
fn flags_default_to_clear() {
    let name = unique_name("flags-default");
    let block = SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap();
    let guard = block.lock();
    assert!(!guard.open_button());
    assert!(!guard.close_button());
    assert!(!guard.door_obstruction());
    assert!(!guard.overload());
    assert!(!guard.emergency_stop());
    assert!(!guard.individual_service_mode());
    assert!(!guard.emergency_mode());
    assert_eq!(guard.safety_system(), 1);
    drop(guard);
    block.close().unwrap();
}

#[test]
fn set_and_read_every_flag() {
    let name = unique_name("flags-roundtrip");
    let block = SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap();
    {
        let guard = block.lock();
        guard.set_open_button(true);
        guard.set_close_button(true);
        guard.set_door_obstruction(true);
        guard.set_overload(true);
        guard.set_emergency_stop(true);
        guard.set_individual_service_mode(true);
        guard.set_emergency_mode(true);
        guard.set_safety_system(3);
    }
    {
        let guard = block.lock();
        assert!(guard.open_button());
        assert!(guard.close_button());
        assert!(guard.door_obstruction());
        assert!(guard.overload());
        assert!(guard.emergency_stop());
        assert!(guard.individual_service_mode());
        assert!(guard.emergency_mode());
        assert_eq!(guard.safety_system(), 3);
    }
    block.close().unwrap();
}

#[test]
fn wait_timeout_returns_false_without_a_signal() {
    let name = unique_name("wait-timeout");
    let block = SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap();
    let guard = block.lock();
    let signalled = block.wait_timeout(&guard, Duration::from_millis(20));
    assert!(!signalled);
    drop(guard);
    block.close().unwrap();
}

#[test]
fn close_unlinks_name_so_it_can_be_recreated() {
    let name = unique_name("close-unlink");
    let block = SharedCar::create(&name, FloorIndex::new(1).unwrap()).unwrap();
    block.close().unwrap();
    let recreated = SharedCar::create(&name, FloorIndex::new(2).unwrap()).unwrap();
    let guard = recreated.lock();
    assert_eq!(guard.current_floor(), Some(FloorIndex::new(2).unwrap()));
    drop(guard);
    recreated.close().unwrap();
}

#[test]
fn open_of_nonexistent_name_fails() {
    let name = unique_name("does-not-exist");
    assert!(SharedCar::open(&name).is_err());
}
