//! Test fixtures for common test scenarios

use std::sync::Arc;

use platform::config::{Config, MoveMatching};
use platform::event::{
    key_action, motion_action, EventDetails, KeyDetails, MotionDetails, NativeEvent, Nsecs,
    PointerCoordinates, SwitchDetails,
};
use platform::{InputDispatcher, PlatformWindow};
use smithay::input::keyboard::Keysym;
use smithay::utils::Size;

use crate::keyboard::FakeKeyboard;
use crate::recording::RecordingToolkit;

/// Standard test window dimensions, in native pixels
pub const TEST_WIDTH: i32 = 200;
pub const TEST_HEIGHT: i32 = 400;

/// Default event time, 42 ms
pub const TEST_TIME: Nsecs = 42_000_000;

/// Default configuration with the given move matching
pub fn config(move_matching: MoveMatching) -> Config {
    let mut config = Config::default();
    config.touch.move_matching = move_matching;
    config
}

/// Toolkit, dispatcher and one window, wired together
pub struct Harness {
    pub toolkit: Arc<RecordingToolkit>,
    pub dispatcher: InputDispatcher,
    pub window: Arc<PlatformWindow>,
}

impl Harness {
    /// 200x400 window at scale 1, default configuration
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let toolkit = RecordingToolkit::new();
        let dispatcher = InputDispatcher::new(toolkit.clone(), FakeKeyboard::boxed(), config);
        let window = Arc::new(PlatformWindow::new(
            toolkit.clone(),
            Size::from((TEST_WIDTH, TEST_HEIGHT)),
            1.0,
            &config.resize,
        ));
        // Drop the device registration
        toolkit.clear();
        Self {
            toolkit,
            dispatcher,
            window,
        }
    }

    pub fn dispatch(&mut self, event: &NativeEvent) {
        self.dispatcher.dispatch_native_event(&self.window, event);
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

fn native(action: i32, details: EventDetails) -> NativeEvent {
    NativeEvent {
        device_id: 1,
        source_id: 0,
        action,
        flags: 0,
        meta_state: 0,
        details,
    }
}

/// Key event for `sym` with the given scan code
pub fn key(action: i32, sym: Keysym, scan_code: i32) -> NativeEvent {
    native(
        action,
        EventDetails::Key(KeyDetails {
            key_code: sym.raw() as i32,
            scan_code,
            event_time: TEST_TIME,
            down_time: TEST_TIME,
            ..Default::default()
        }),
    )
}

pub fn key_down(sym: Keysym, scan_code: i32) -> NativeEvent {
    key(key_action::DOWN, sym, scan_code)
}

pub fn key_up(sym: Keysym, scan_code: i32) -> NativeEvent {
    key(key_action::UP, sym, scan_code)
}

/// Contact at raw (`x`, `y`) with a 20x10 ellipse at half pressure
pub fn pointer(id: i32, x: f32, y: f32) -> PointerCoordinates {
    PointerCoordinates {
        id,
        x,
        raw_x: x,
        y,
        raw_y: y,
        touch_major: 20.0,
        touch_minor: 10.0,
        pressure: 0.64,
        ..Default::default()
    }
}

pub fn motion(action: i32, pointers: Vec<PointerCoordinates>) -> NativeEvent {
    native(
        action,
        EventDetails::Motion(MotionDetails {
            event_time: TEST_TIME,
            down_time: TEST_TIME,
            pointer_coordinates: pointers,
            ..Default::default()
        }),
    )
}

pub fn touch_down(pointer: PointerCoordinates) -> NativeEvent {
    motion(motion_action::DOWN, vec![pointer])
}

pub fn touch_up(pointer: PointerCoordinates) -> NativeEvent {
    motion(motion_action::UP, vec![pointer])
}

pub fn touch_move(pointers: Vec<PointerCoordinates>) -> NativeEvent {
    motion(motion_action::MOVE, pointers)
}

/// Secondary finger down; `index` points into `pointers`
pub fn pointer_down(index: usize, pointers: Vec<PointerCoordinates>) -> NativeEvent {
    motion(
        motion_action::with_pointer_index(motion_action::POINTER_DOWN, index),
        pointers,
    )
}

pub fn pointer_up(index: usize, pointers: Vec<PointerCoordinates>) -> NativeEvent {
    motion(
        motion_action::with_pointer_index(motion_action::POINTER_UP, index),
        pointers,
    )
}

pub fn hardware_switch() -> NativeEvent {
    native(
        0,
        EventDetails::HardwareSwitch(SwitchDetails {
            event_time: TEST_TIME,
            switch_values: 1,
            switch_mask: 1,
            ..Default::default()
        }),
    )
}
