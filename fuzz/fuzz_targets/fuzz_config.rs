#![no_main]
//! Fuzz target for config TOML parsing
//!
//! Feeds random bytes as TOML to the config parser to find panics in
//! deserialization and validation. Validated configs must be usable to
//! build the input state.

use libfuzzer_sys::fuzz_target;

use platform::config::{Config, MAX_TOUCH_POINTS};
use platform::motion::MotionEventDispatcher;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(mut config) = toml::from_str::<Config>(s) {
            config.validate();
            assert!((1..=MAX_TOUCH_POINTS).contains(&config.touch.max_point_count));
            assert!(config.touch.max_pressure > 0.0);
            let _ = MotionEventDispatcher::new(&config.touch);
        }
    }
});
