//! Keysym to toolkit key code translation
//!
//! The toolkit identifies keys by its own numeric codes. Printable keys use
//! their Latin-1 value, which coincides with the keysym value, so anything
//! not covered by the function-key range or the special-key table passes
//! through unchanged.

use serde::{Deserialize, Serialize};
use smithay::input::keyboard::{xkb, Keysym};

/// Toolkit key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const ESCAPE: Self = Self(0x0100_0000);
    pub const TAB: Self = Self(0x0100_0001);
    pub const BACKTAB: Self = Self(0x0100_0002);
    pub const BACKSPACE: Self = Self(0x0100_0003);
    pub const RETURN: Self = Self(0x0100_0004);
    pub const ENTER: Self = Self(0x0100_0005);
    pub const INSERT: Self = Self(0x0100_0006);
    pub const DELETE: Self = Self(0x0100_0007);
    pub const PAUSE: Self = Self(0x0100_0008);
    pub const PRINT: Self = Self(0x0100_0009);
    pub const CLEAR: Self = Self(0x0100_000b);
    pub const HOME: Self = Self(0x0100_0010);
    pub const END: Self = Self(0x0100_0011);
    pub const LEFT: Self = Self(0x0100_0012);
    pub const UP: Self = Self(0x0100_0013);
    pub const RIGHT: Self = Self(0x0100_0014);
    pub const DOWN: Self = Self(0x0100_0015);
    pub const PAGE_UP: Self = Self(0x0100_0016);
    pub const PAGE_DOWN: Self = Self(0x0100_0017);
    pub const SHIFT: Self = Self(0x0100_0020);
    pub const CONTROL: Self = Self(0x0100_0021);
    pub const META: Self = Self(0x0100_0022);
    pub const ALT: Self = Self(0x0100_0023);
    pub const CAPS_LOCK: Self = Self(0x0100_0024);
    pub const NUM_LOCK: Self = Self(0x0100_0025);
    pub const SCROLL_LOCK: Self = Self(0x0100_0026);
    pub const F1: Self = Self(0x0100_0030);
    pub const F35: Self = Self(0x0100_0052);
    pub const SUPER_L: Self = Self(0x0100_0053);
    pub const SUPER_R: Self = Self(0x0100_0054);
    pub const MENU: Self = Self(0x0100_0055);
    pub const HYPER_L: Self = Self(0x0100_0056);
    pub const HYPER_R: Self = Self(0x0100_0057);
    pub const HELP: Self = Self(0x0100_0058);
    pub const SPACE: Self = Self(0x20);
    pub const ASTERISK: Self = Self(0x2a);
    pub const PLUS: Self = Self(0x2b);
    pub const COMMA: Self = Self(0x2c);
    pub const MINUS: Self = Self(0x2d);
    pub const PERIOD: Self = Self(0x2e);
    pub const SLASH: Self = Self(0x2f);
    pub const EQUAL: Self = Self(0x3d);
    pub const ALT_GR: Self = Self(0x0100_1103);
    pub const MULTI_KEY: Self = Self(0x0100_1120);
    pub const CODEINPUT: Self = Self(0x0100_1137);
    pub const SINGLE_CANDIDATE: Self = Self(0x0100_113c);
    pub const MULTIPLE_CANDIDATE: Self = Self(0x0100_113d);
    pub const PREVIOUS_CANDIDATE: Self = Self(0x0100_113e);
    pub const MODE_SWITCH: Self = Self(0x0100_117e);

    /// Raw numeric value
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Special keys that don't map by value
static KEY_TABLE: &[(Keysym, KeyCode)] = &[
    (Keysym::Escape, KeyCode::ESCAPE),
    (Keysym::Tab, KeyCode::TAB),
    (Keysym::ISO_Left_Tab, KeyCode::BACKTAB),
    (Keysym::BackSpace, KeyCode::BACKSPACE),
    (Keysym::Return, KeyCode::RETURN),
    (Keysym::Insert, KeyCode::INSERT),
    (Keysym::Delete, KeyCode::DELETE),
    (Keysym::Clear, KeyCode::DELETE),
    (Keysym::Pause, KeyCode::PAUSE),
    (Keysym::Print, KeyCode::PRINT),
    // Navigation
    (Keysym::Home, KeyCode::HOME),
    (Keysym::End, KeyCode::END),
    (Keysym::Left, KeyCode::LEFT),
    (Keysym::Up, KeyCode::UP),
    (Keysym::Right, KeyCode::RIGHT),
    (Keysym::Down, KeyCode::DOWN),
    (Keysym::Prior, KeyCode::PAGE_UP),
    (Keysym::Next, KeyCode::PAGE_DOWN),
    // Modifiers and locks
    (Keysym::Shift_L, KeyCode::SHIFT),
    (Keysym::Shift_R, KeyCode::SHIFT),
    (Keysym::Shift_Lock, KeyCode::SHIFT),
    (Keysym::Control_L, KeyCode::CONTROL),
    (Keysym::Control_R, KeyCode::CONTROL),
    (Keysym::Meta_L, KeyCode::META),
    (Keysym::Meta_R, KeyCode::META),
    (Keysym::Alt_L, KeyCode::ALT),
    (Keysym::Alt_R, KeyCode::ALT),
    (Keysym::Caps_Lock, KeyCode::CAPS_LOCK),
    (Keysym::Num_Lock, KeyCode::NUM_LOCK),
    (Keysym::Scroll_Lock, KeyCode::SCROLL_LOCK),
    (Keysym::Super_L, KeyCode::SUPER_L),
    (Keysym::Super_R, KeyCode::SUPER_R),
    (Keysym::Menu, KeyCode::MENU),
    (Keysym::Hyper_L, KeyCode::HYPER_L),
    (Keysym::Hyper_R, KeyCode::HYPER_R),
    (Keysym::Help, KeyCode::HELP),
    // Keypad
    (Keysym::KP_Space, KeyCode::SPACE),
    (Keysym::KP_Tab, KeyCode::TAB),
    (Keysym::KP_Enter, KeyCode::ENTER),
    (Keysym::KP_Home, KeyCode::HOME),
    (Keysym::KP_Left, KeyCode::LEFT),
    (Keysym::KP_Up, KeyCode::UP),
    (Keysym::KP_Right, KeyCode::RIGHT),
    (Keysym::KP_Down, KeyCode::DOWN),
    (Keysym::KP_Prior, KeyCode::PAGE_UP),
    (Keysym::KP_Next, KeyCode::PAGE_DOWN),
    (Keysym::KP_End, KeyCode::END),
    (Keysym::KP_Begin, KeyCode::CLEAR),
    (Keysym::KP_Insert, KeyCode::INSERT),
    (Keysym::KP_Delete, KeyCode::DELETE),
    (Keysym::KP_Equal, KeyCode::EQUAL),
    (Keysym::KP_Multiply, KeyCode::ASTERISK),
    (Keysym::KP_Add, KeyCode::PLUS),
    (Keysym::KP_Separator, KeyCode::COMMA),
    (Keysym::KP_Subtract, KeyCode::MINUS),
    (Keysym::KP_Decimal, KeyCode::PERIOD),
    (Keysym::KP_Divide, KeyCode::SLASH),
    // Input method
    (Keysym::ISO_Level3_Shift, KeyCode::ALT_GR),
    (Keysym::Multi_key, KeyCode::MULTI_KEY),
    (Keysym::Codeinput, KeyCode::CODEINPUT),
    (Keysym::SingleCandidate, KeyCode::SINGLE_CANDIDATE),
    (Keysym::MultipleCandidate, KeyCode::MULTIPLE_CANDIDATE),
    (Keysym::PreviousCandidate, KeyCode::PREVIOUS_CANDIDATE),
    (Keysym::Mode_switch, KeyCode::MODE_SWITCH),
    (Keysym::script_switch, KeyCode::MODE_SWITCH),
];

/// Translate a keysym into the toolkit key code
///
/// F1..F35 map by offset, special keys go through [`KEY_TABLE`], and every
/// other symbol is passed through as-is.
pub fn translate_key(sym: Keysym) -> KeyCode {
    let raw = sym.raw();
    if (Keysym::F1.raw()..=Keysym::F35.raw()).contains(&raw) {
        return KeyCode(KeyCode::F1.0 + (raw - Keysym::F1.raw()));
    }

    KEY_TABLE
        .iter()
        .find(|(keysym, _)| *keysym == sym)
        .map(|(_, code)| *code)
        .unwrap_or(KeyCode(raw))
}

/// UTF-8 text produced by a keysym, empty for non-printing symbols
pub fn keysym_to_utf8(sym: Keysym) -> String {
    // libxkbcommon counts the terminating NUL in the returned length
    xkb::keysym_to_utf8(sym).trim_end_matches('\0').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_keys_map_by_offset() {
        assert_eq!(translate_key(Keysym::F1), KeyCode::F1);
        assert_eq!(translate_key(Keysym::F12), KeyCode(KeyCode::F1.0 + 11));
        assert_eq!(translate_key(Keysym::F35), KeyCode::F35);
    }

    #[test]
    fn special_keys_use_table() {
        assert_eq!(translate_key(Keysym::Escape), KeyCode::ESCAPE);
        assert_eq!(translate_key(Keysym::ISO_Left_Tab), KeyCode::BACKTAB);
        assert_eq!(translate_key(Keysym::Prior), KeyCode::PAGE_UP);
        assert_eq!(translate_key(Keysym::Super_R), KeyCode::SUPER_R);
    }

    #[test]
    fn aliases_share_a_code() {
        assert_eq!(translate_key(Keysym::Clear), KeyCode::DELETE);
        assert_eq!(translate_key(Keysym::KP_Begin), KeyCode::CLEAR);
        assert_eq!(translate_key(Keysym::Shift_Lock), KeyCode::SHIFT);
        assert_eq!(translate_key(Keysym::KP_Enter), KeyCode::ENTER);
        assert_eq!(translate_key(Keysym::Return), KeyCode::RETURN);
    }

    #[test]
    fn printable_symbols_pass_through() {
        assert_eq!(translate_key(Keysym::a), KeyCode(0x61));
        assert_eq!(translate_key(Keysym::A), KeyCode(0x41));
        assert_eq!(translate_key(Keysym::space), KeyCode::SPACE);
        assert_eq!(translate_key(Keysym::new(0x1234_5678)), KeyCode(0x1234_5678));
    }

    #[test]
    fn translation_is_stable() {
        for raw in [0x61, 0xff1b, 0xffbe, 0xffe1, 0xfe03, 0x0] {
            let sym = Keysym::new(raw);
            assert_eq!(translate_key(sym), translate_key(sym), "raw={raw:#x}");
        }
    }

    #[test]
    fn text_for_printable_and_control_keys() {
        assert_eq!(keysym_to_utf8(Keysym::a), "a");
        assert_eq!(keysym_to_utf8(Keysym::Shift_L), "");
    }
}
