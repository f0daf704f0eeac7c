//! Keyboard modifier tracking
//!
//! The toolkit wants a modifier mask with every key event. The mask is read
//! from an xkb state (depressed or latched modifiers) rather than from the
//! key event itself.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smithay::input::keyboard::xkb;
use thiserror::Error;

use crate::config::KeyboardConfig;

bitflags! {
    /// Toolkit modifier mask
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Modifiers: u32 {
        const SHIFT = 0x0200_0000;
        const CONTROL = 0x0400_0000;
        const ALT = 0x0800_0000;
        const META = 0x1000_0000;
    }
}

/// Meta-state bits carried in the native event envelope
const META_SHIFT_ON: i32 = 0x01;
const META_ALT_ON: i32 = 0x02;
const META_CTRL_ON: i32 = 0x1000;
const META_META_ON: i32 = 0x10000;

/// xkb modifier names and the toolkit bit each one sets
const MODIFIER_NAMES: &[(&str, Modifiers)] = &[
    ("Shift", Modifiers::SHIFT),
    ("Control", Modifiers::CONTROL),
    ("Alt", Modifiers::ALT),
    ("Mod1", Modifiers::ALT),
    ("Mod4", Modifiers::META),
];

impl Modifiers {
    /// Convert the meta-state snapshot of a native event
    ///
    /// Used where the live keyboard state can't be read, e.g. while
    /// filtering on the platform thread.
    pub fn from_meta_state(meta_state: i32) -> Self {
        let mut mods = Self::empty();
        if meta_state & META_SHIFT_ON != 0 {
            mods |= Self::SHIFT;
        }
        if meta_state & META_CTRL_ON != 0 {
            mods |= Self::CONTROL;
        }
        if meta_state & META_ALT_ON != 0 {
            mods |= Self::ALT;
        }
        if meta_state & META_META_ON != 0 {
            mods |= Self::META;
        }
        mods
    }
}

/// Keyboard layout/compose state queried for active modifiers
pub trait KeyboardState {
    /// Whether the named modifier is currently depressed or latched
    fn mod_name_is_active(&self, name: &str) -> bool;

    /// Feed a physical key transition into the state
    fn update_key(&mut self, _scan_code: u32, _pressed: bool) {}
}

impl KeyboardState for xkb::State {
    fn mod_name_is_active(&self, name: &str) -> bool {
        xkb::State::mod_name_is_active(
            self,
            name,
            xkb::STATE_MODS_DEPRESSED | xkb::STATE_MODS_LATCHED,
        )
    }

    fn update_key(&mut self, scan_code: u32, pressed: bool) {
        let direction = if pressed {
            xkb::KeyDirection::Down
        } else {
            xkb::KeyDirection::Up
        };
        xkb::State::update_key(self, xkb::Keycode::new(scan_code + EVDEV_OFFSET), direction);
    }
}

/// A fixed modifier set, for when no keymap is available
impl KeyboardState for Modifiers {
    fn mod_name_is_active(&self, name: &str) -> bool {
        MODIFIER_NAMES
            .iter()
            .any(|(known, bit)| *known == name && self.contains(*bit))
    }
}

/// Query every modifier group independently and combine the active ones
pub fn modifiers_from_state(state: &(impl KeyboardState + ?Sized)) -> Modifiers {
    MODIFIER_NAMES
        .iter()
        .filter(|(name, _)| state.mod_name_is_active(name))
        .fold(Modifiers::empty(), |mods, (_, bit)| mods | *bit)
}

/// xkb keycodes are evdev scan codes shifted by 8
const EVDEV_OFFSET: u32 = 8;

#[derive(Debug, Error)]
pub enum KeyboardError {
    #[error("failed to compile xkb keymap (rules={rules}, model={model}, layout={layout})")]
    KeymapCompile {
        rules: String,
        model: String,
        layout: String,
    },
}

/// Owns the xkb keymap and state used for modifier queries
pub struct ModifierStateTracker {
    state: xkb::State,
}

impl ModifierStateTracker {
    /// Compile a keymap from the configured rule names
    pub fn new(config: &KeyboardConfig) -> Result<Self, KeyboardError> {
        let context = xkb::Context::new(xkb::CONTEXT_NO_FLAGS);
        let options = (!config.options.is_empty()).then(|| config.options.clone());
        let keymap = xkb::Keymap::new_from_names(
            &context,
            &config.rules,
            &config.model,
            &config.layout,
            &config.variant,
            options,
            xkb::KEYMAP_COMPILE_NO_FLAGS,
        )
        .ok_or_else(|| KeyboardError::KeymapCompile {
            rules: config.rules.clone(),
            model: config.model.clone(),
            layout: config.layout.clone(),
        })?;

        tracing::debug!(
            rules = %config.rules,
            model = %config.model,
            layout = %config.layout,
            "compiled keymap"
        );

        Ok(Self {
            state: xkb::State::new(&keymap),
        })
    }

    /// Currently active modifiers
    pub fn modifiers(&self) -> Modifiers {
        modifiers_from_state(&self.state)
    }
}

impl KeyboardState for ModifierStateTracker {
    fn mod_name_is_active(&self, name: &str) -> bool {
        KeyboardState::mod_name_is_active(&self.state, name)
    }

    fn update_key(&mut self, scan_code: u32, pressed: bool) {
        KeyboardState::update_key(&mut self.state, scan_code, pressed);
    }
}

impl std::fmt::Debug for ModifierStateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModifierStateTracker")
            .field("modifiers", &self.modifiers())
            .finish()
    }
}
