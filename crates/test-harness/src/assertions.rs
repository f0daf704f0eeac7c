//! Test assertions for touch and key state

use platform::touch::{TouchPoint, TouchPointState};

/// Assert that no id is held by more than one active slot
pub fn assert_active_ids_unique(points: &[TouchPoint]) {
    let mut active: Vec<u32> = points.iter().filter(|p| p.is_active()).map(|p| p.id).collect();
    let count = active.len();
    active.sort_unstable();
    active.dedup();
    assert_eq!(
        active.len(),
        count,
        "active slots share an id: {:?}",
        points
    );
}

/// Assert the state of slot `id` in a snapshot
pub fn assert_slot_state(points: &[TouchPoint], id: u32, expected: TouchPointState) {
    let point = points
        .iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| panic!("no slot {} in snapshot of {} slots", id, points.len()));
    assert_eq!(
        point.state, expected,
        "slot {} should be {:?}, got {:?}",
        id, expected, point.state
    );
}

/// Assert which slots are active, in slot order
pub fn assert_active_slots(points: &[TouchPoint], expected: &[u32]) {
    let active: Vec<u32> = points.iter().filter(|p| p.is_active()).map(|p| p.id).collect();
    assert_eq!(active, expected, "unexpected active slots");
}

/// Assert two floats are within `epsilon`
pub fn assert_close(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {} (+/- {}), got {}",
        expected,
        epsilon,
        actual
    );
}
