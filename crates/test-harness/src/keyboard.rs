//! Keyboard state without a keymap
//!
//! Tracks held modifier keys by evdev scan code, so tests don't depend on
//! the xkb data installed on the machine.

use std::collections::HashSet;

use platform::modifiers::KeyboardState;

pub const SCAN_LEFT_SHIFT: i32 = 42;
pub const SCAN_RIGHT_SHIFT: i32 = 54;
pub const SCAN_LEFT_CTRL: i32 = 29;
pub const SCAN_RIGHT_CTRL: i32 = 97;
pub const SCAN_LEFT_ALT: i32 = 56;
pub const SCAN_LEFT_META: i32 = 125;
pub const SCAN_A: i32 = 30;

/// Modifier name reported for a held scan code
fn modifier_for_scan(scan_code: u32) -> Option<&'static str> {
    match scan_code as i32 {
        SCAN_LEFT_SHIFT | SCAN_RIGHT_SHIFT => Some("Shift"),
        SCAN_LEFT_CTRL | SCAN_RIGHT_CTRL => Some("Control"),
        SCAN_LEFT_ALT => Some("Mod1"),
        SCAN_LEFT_META => Some("Mod4"),
        _ => None,
    }
}

#[derive(Debug, Default, Clone)]
pub struct FakeKeyboard {
    held: HashSet<u32>,
    latched: HashSet<&'static str>,
}

impl FakeKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Box<dyn KeyboardState> {
        Box::new(Self::new())
    }

    /// Keyboard with `names` latched, as after a sticky-keys press
    pub fn latched(names: &[&'static str]) -> Self {
        Self {
            held: HashSet::new(),
            latched: names.iter().copied().collect(),
        }
    }
}

impl KeyboardState for FakeKeyboard {
    fn mod_name_is_active(&self, name: &str) -> bool {
        self.latched.contains(name)
            || self
                .held
                .iter()
                .any(|scan| modifier_for_scan(*scan) == Some(name))
    }

    fn update_key(&mut self, scan_code: u32, pressed: bool) {
        if pressed {
            self.held.insert(scan_code);
        } else {
            self.held.remove(&scan_code);
        }
    }
}
