//! Native input-stack event envelope
//!
//! Mirrors the event struct delivered by the input compatibility layer.
//! The C union becomes [`EventDetails`], switched on directly.

use serde::{Deserialize, Serialize};

/// Pointer coordinates carried by a single motion event, at most
pub const MAX_POINTER_COUNT: usize = 16;

/// Native timestamps, in nanoseconds
pub type Nsecs = i64;

/// Key actions
pub mod key_action {
    pub const DOWN: i32 = 0;
    pub const UP: i32 = 1;
    pub const MULTIPLE: i32 = 2;
}

/// Motion actions and the masks used to unpack them
pub mod motion_action {
    pub const MASK: i32 = 0xff;
    pub const POINTER_INDEX_MASK: i32 = 0xff00;
    pub const POINTER_INDEX_SHIFT: i32 = 8;

    pub const DOWN: i32 = 0;
    pub const UP: i32 = 1;
    pub const MOVE: i32 = 2;
    pub const CANCEL: i32 = 3;
    pub const OUTSIDE: i32 = 4;
    pub const POINTER_DOWN: i32 = 5;
    pub const POINTER_UP: i32 = 6;
    pub const HOVER_MOVE: i32 = 7;
    pub const SCROLL: i32 = 8;
    pub const HOVER_ENTER: i32 = 9;
    pub const HOVER_EXIT: i32 = 10;

    /// Pack a pointer index into an action code
    pub fn with_pointer_index(action: i32, index: usize) -> i32 {
        action | (((index as i32) << POINTER_INDEX_SHIFT) & POINTER_INDEX_MASK)
    }
}

/// Native event as delivered by the input stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeEvent {
    #[serde(default)]
    pub device_id: i32,
    #[serde(default)]
    pub source_id: i32,
    pub action: i32,
    #[serde(default)]
    pub flags: i32,
    /// Modifier-state snapshot at the time of the event
    #[serde(default)]
    pub meta_state: i32,
    pub details: EventDetails,
}

/// Type-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDetails {
    Key(KeyDetails),
    Motion(MotionDetails),
    HardwareSwitch(SwitchDetails),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyDetails {
    /// Key symbol (an xkb keysym value)
    pub key_code: i32,
    pub scan_code: i32,
    pub repeat_count: i32,
    pub down_time: Nsecs,
    pub event_time: Nsecs,
    pub is_system_key: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionDetails {
    pub edge_flags: i32,
    pub button_state: i32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_precision: f32,
    pub y_precision: f32,
    pub down_time: Nsecs,
    pub event_time: Nsecs,
    pub pointer_coordinates: Vec<PointerCoordinates>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerCoordinates {
    /// Touch slot assigned by the input stack
    pub id: i32,
    pub x: f32,
    pub raw_x: f32,
    pub y: f32,
    pub raw_y: f32,
    pub touch_major: f32,
    pub touch_minor: f32,
    pub size: f32,
    pub pressure: f32,
    pub orientation: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchDetails {
    pub event_time: Nsecs,
    pub policy_flags: u32,
    pub switch_values: i32,
    pub switch_mask: i32,
}

impl MotionDetails {
    /// Pointer coordinates, bounded by [`MAX_POINTER_COUNT`]
    pub fn pointers(&self) -> &[PointerCoordinates] {
        let count = self.pointer_coordinates.len().min(MAX_POINTER_COUNT);
        &self.pointer_coordinates[..count]
    }
}

impl NativeEvent {
    /// Short name of the event kind, for logging
    pub fn kind(&self) -> &'static str {
        match self.details {
            EventDetails::Key(_) => "key",
            EventDetails::Motion(_) => "motion",
            EventDetails::HardwareSwitch(_) => "hw_switch",
        }
    }

    /// Event time in nanoseconds
    pub fn event_time(&self) -> Nsecs {
        match &self.details {
            EventDetails::Key(key) => key.event_time,
            EventDetails::Motion(motion) => motion.event_time,
            EventDetails::HardwareSwitch(switch) => switch.event_time,
        }
    }
}

/// Convert a native nanosecond timestamp to toolkit milliseconds (truncating)
pub fn timestamp_ms(time: Nsecs) -> u64 {
    (time / 1_000_000).max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_truncates_to_millis() {
        assert_eq!(timestamp_ms(0), 0);
        assert_eq!(timestamp_ms(999_999), 0);
        assert_eq!(timestamp_ms(1_000_000), 1);
        assert_eq!(timestamp_ms(12_345_678_901), 12_345);
        assert_eq!(timestamp_ms(-5_000_000), 0);
    }

    #[test]
    fn pointer_index_packing() {
        let action = motion_action::with_pointer_index(motion_action::POINTER_DOWN, 1);
        assert_eq!(action & motion_action::MASK, motion_action::POINTER_DOWN);
        assert_eq!(
            (action & motion_action::POINTER_INDEX_MASK) >> motion_action::POINTER_INDEX_SHIFT,
            1
        );
    }

    #[test]
    fn pointers_are_bounded() {
        let motion = MotionDetails {
            pointer_coordinates: vec![PointerCoordinates::default(); MAX_POINTER_COUNT + 4],
            ..Default::default()
        };
        assert_eq!(motion.pointers().len(), MAX_POINTER_COUNT);
    }

    #[test]
    fn json_uses_tagged_details() {
        let json = r#"{
            "action": 0,
            "details": { "type": "key", "key_code": 97, "scan_code": 30, "event_time": 5000000 }
        }"#;
        let event: NativeEvent = serde_json::from_str(json).expect("valid event");
        assert_eq!(event.kind(), "key");
        assert_eq!(event.event_time(), 5_000_000);
        match event.details {
            EventDetails::Key(key) => {
                assert_eq!(key.key_code, 97);
                assert_eq!(key.scan_code, 30);
                assert!(!key.is_system_key);
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }
}
