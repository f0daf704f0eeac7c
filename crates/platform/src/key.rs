//! Key event dispatch

use serde::{Deserialize, Serialize};
use smithay::input::keyboard::Keysym;

use crate::event::{key_action, timestamp_ms, KeyDetails};
use crate::keys::{keysym_to_utf8, translate_key, KeyCode};
use crate::modifiers::{modifiers_from_state, KeyboardState, Modifiers};
use crate::toolkit::{Toolkit, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventKind {
    Press,
    Release,
}

impl KeyEventKind {
    /// Release for an up action, press for down and multiple
    pub fn from_action(action: i32) -> Self {
        if action == key_action::UP {
            Self::Release
        } else {
            Self::Press
        }
    }
}

/// Toolkit key event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub timestamp_ms: u64,
    pub kind: KeyEventKind,
    pub key: KeyCode,
    pub modifiers: Modifiers,
    pub scan_code: u32,
    pub text: String,
}

impl KeyEvent {
    /// Resolve a native key event
    ///
    /// The text comes from the raw symbol; the key code is the translated one.
    pub fn from_native(action: i32, key: &KeyDetails, modifiers: Modifiers) -> Self {
        let sym = Keysym::new(key.key_code as u32);
        let text = keysym_to_utf8(sym);
        Self {
            timestamp_ms: timestamp_ms(key.event_time),
            kind: KeyEventKind::from_action(action),
            key: translate_key(sym),
            modifiers,
            scan_code: key.scan_code as u32,
            text,
        }
    }
}

/// Turns native key events into toolkit key events
pub struct KeyEventDispatcher {
    keyboard: Box<dyn KeyboardState>,
}

impl KeyEventDispatcher {
    pub fn new(keyboard: Box<dyn KeyboardState>) -> Self {
        Self { keyboard }
    }

    /// Modifiers currently active on the tracked keyboard
    pub fn modifiers(&self) -> Modifiers {
        modifiers_from_state(self.keyboard.as_ref())
    }

    /// Resolve the event against the tracked keyboard state
    pub fn resolve(&mut self, action: i32, key: &KeyDetails) -> KeyEvent {
        let kind = KeyEventKind::from_action(action);
        if key.scan_code >= 0 {
            self.keyboard
                .update_key(key.scan_code as u32, kind == KeyEventKind::Press);
        }
        KeyEvent::from_native(action, key, self.modifiers())
    }

    pub fn dispatch(
        &mut self,
        toolkit: &dyn Toolkit,
        window: WindowId,
        action: i32,
        key: &KeyDetails,
    ) {
        tracing::trace!(
            %window,
            action,
            key_code = key.key_code,
            scan_code = key.scan_code,
            repeat_count = key.repeat_count,
            down_time = key.down_time,
            event_time = key.event_time,
            is_system_key = key.is_system_key,
            "key event"
        );

        let event = self.resolve(action, key);

        tracing::debug!(
            %window,
            kind = ?event.kind,
            key = event.key.raw(),
            modifiers = ?event.modifiers,
            text = %event.text,
            "submitting key event"
        );

        toolkit.submit_key_event(window, &event);
    }
}

impl std::fmt::Debug for KeyEventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEventDispatcher")
            .field("modifiers", &self.modifiers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ShiftTracker {
        shift_down: bool,
    }

    const SHIFT_SCAN: u32 = 42;

    impl KeyboardState for ShiftTracker {
        fn mod_name_is_active(&self, name: &str) -> bool {
            name == "Shift" && self.shift_down
        }

        fn update_key(&mut self, scan_code: u32, pressed: bool) {
            if scan_code == SHIFT_SCAN {
                self.shift_down = pressed;
            }
        }
    }

    fn details(key_code: u32, scan_code: i32, event_time: i64) -> KeyDetails {
        KeyDetails {
            key_code: key_code as i32,
            scan_code,
            event_time,
            ..Default::default()
        }
    }

    #[test]
    fn kind_from_action() {
        assert_eq!(KeyEventKind::from_action(key_action::DOWN), KeyEventKind::Press);
        assert_eq!(KeyEventKind::from_action(key_action::UP), KeyEventKind::Release);
        assert_eq!(KeyEventKind::from_action(key_action::MULTIPLE), KeyEventKind::Press);
    }

    #[test]
    fn printable_key_keeps_symbol_and_text() {
        let event = KeyEvent::from_native(
            key_action::DOWN,
            &details(Keysym::a.raw(), 30, 1_500_000_000),
            Modifiers::empty(),
        );
        assert_eq!(event.key, KeyCode(0x61));
        assert_eq!(event.text, "a");
        assert_eq!(event.scan_code, 30);
        assert_eq!(event.timestamp_ms, 1500);
    }

    #[test]
    fn special_key_is_translated_but_text_uses_raw_symbol() {
        let event = KeyEvent::from_native(
            key_action::UP,
            &details(Keysym::Left.raw(), 105, 0),
            Modifiers::empty(),
        );
        assert_eq!(event.key, KeyCode::LEFT);
        assert_eq!(event.kind, KeyEventKind::Release);
        assert!(event.text.is_empty());
    }

    #[test]
    fn modifiers_follow_tracked_keys() {
        let mut dispatcher = KeyEventDispatcher::new(Box::<ShiftTracker>::default());

        let shift = dispatcher.resolve(key_action::DOWN, &details(Keysym::Shift_L.raw(), 42, 0));
        assert_eq!(shift.key, KeyCode::SHIFT);
        assert_eq!(shift.modifiers, Modifiers::SHIFT);

        let a = dispatcher.resolve(key_action::DOWN, &details(Keysym::A.raw(), 30, 0));
        assert_eq!(a.modifiers, Modifiers::SHIFT);

        dispatcher.resolve(key_action::UP, &details(Keysym::Shift_L.raw(), 42, 0));
        assert_eq!(dispatcher.modifiers(), Modifiers::empty());
    }
}
