use super::*;
use yare::parameterized;

#[parameterized(
    ground = { "1", 1 },
    mid = { "7", 7 },
    top = { "999", 999 },
    basement_one = { "B1", -1 },
    basement_mid = { "B42", -42 },
    basement_lower = { "b42", -42 },
)]
fn parse_accepts_valid_labels(label: &str, expected: i32) {
    let parsed = FloorIndex::parse(label).unwrap();
    assert_eq!(parsed.index(), expected);
    assert_eq!(parsed.label(), FloorIndex::new(expected).unwrap().label());
}

#[parameterized(
    empty = { "" },
    zero = { "0" },
    zero_basement = { "B0" },
    too_high = { "1000" },
    too_low = { "B100" },
    garbage = { "7th" },
    bare_b = { "B" },
    negative_literal = { "-1" },
)]
fn parse_rejects_invalid_labels(label: &str) {
    assert!(FloorIndex::parse(label).is_err());
}

#[test]
fn new_rejects_zero() {
    assert!(FloorIndex::new(0).is_err());
}

#[test]
fn label_roundtrips_through_parse() {
    for raw in [-99, -1, 1, 999] {
        let idx = FloorIndex::new(raw).unwrap();
        let label = idx.label();
        assert_eq!(FloorIndex::parse(&label).unwrap(), idx);
    }
}

#[test]
fn step_toward_skips_zero_going_up() {
    let ground_below = FloorIndex::new(-1).unwrap();
    let ground_above = FloorIndex::new(1).unwrap();
    assert_eq!(ground_below.step_toward(ground_above), ground_above);
}

#[test]
fn step_toward_skips_zero_going_down() {
    let ground_above = FloorIndex::new(1).unwrap();
    let ground_below = FloorIndex::new(-1).unwrap();
    assert_eq!(ground_above.step_toward(ground_below), ground_below);
}

#[test]
fn step_toward_is_noop_at_destination() {
    let floor = FloorIndex::new(5).unwrap();
    assert_eq!(floor.step_toward(floor), floor);
}

#[test]
fn step_toward_moves_one_floor_at_a_time() {
    let start = FloorIndex::new(1).unwrap();
    let dest = FloorIndex::new(5).unwrap();
    let mut cur = start;
    let mut hops = 0;
    while cur != dest {
        cur = cur.step_toward(dest);
        hops += 1;
        assert!(hops <= 10, "step_toward did not converge");
    }
    assert_eq!(cur, dest);
}

#[test]
fn adjacent_skips_zero() {
    let ground_below = FloorIndex::new(-1).unwrap();
    assert_eq!(ground_below.adjacent(true), FloorIndex::new(1).unwrap());
    let ground_above = FloorIndex::new(1).unwrap();
    assert_eq!(ground_above.adjacent(false), FloorIndex::new(-1).unwrap());
}

#[test]
fn clamp_bounds_to_range() {
    let low = FloorIndex::new(-2).unwrap();
    let high = FloorIndex::new(10).unwrap();
    assert_eq!(FloorIndex::new(-5).unwrap().clamp(low, high), low);
    assert_eq!(FloorIndex::new(50).unwrap().clamp(low, high), high);
    assert_eq!(FloorIndex::new(3).unwrap().clamp(low, high), FloorIndex::new(3).unwrap());
}

#[test]
fn is_adjacent_is_symmetric() {
    let a = FloorIndex::new(3).unwrap();
    let b = FloorIndex::new(4).unwrap();
    assert!(a.is_adjacent(b));
    assert!(b.is_adjacent(a));
    assert!(!a.is_adjacent(FloorIndex::new(5).unwrap()));
}
