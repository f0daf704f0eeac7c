#![no_main]
//! Fuzz target for event scripts
//!
//! Parses random bytes as an event script and replays whatever parses
//! through the full dispatch path. Malformed input must be dropped, never
//! panic.

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;

use platform::config::Config;
use platform::key::KeyEvent;
use platform::modifiers::Modifiers;
use platform::script::{parse_script, ScriptRunner};
use platform::toolkit::{Toolkit, WindowGeometry, WindowId};
use platform::touch::{TouchDevice, TouchPoint};

struct NullToolkit;

impl Toolkit for NullToolkit {
    fn register_touch_device(&self, _: &TouchDevice) {}
    fn submit_touch_event(&self, _: WindowId, _: u64, _: &TouchDevice, points: &[TouchPoint]) {
        assert!(points.iter().all(|p| p.pressure.is_finite()));
    }
    fn submit_key_event(&self, _: WindowId, _: &KeyEvent) {}
    fn request_expose(&self, _: WindowId, _: WindowGeometry) {}
    fn flush_pending_events(&self) {}
    fn notify_geometry_changed(&self, _: WindowId, geometry: WindowGeometry) {
        assert!(geometry.size.w > 0 && geometry.size.h > 0);
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(steps) = parse_script(s) else {
        return;
    };
    let Ok(mut runner) = ScriptRunner::new(
        Arc::new(NullToolkit),
        Box::new(Modifiers::empty()),
        Config::default(),
        720,
        1280,
        1.0,
    ) else {
        return;
    };
    let _ = runner.run(&steps);
});
