//! Toolkit that prints every call as a JSON line

use std::io::{self, Write};
use std::sync::Mutex;

use platform::key::KeyEvent;
use platform::queue::PostOutcome;
use platform::script::StepReport;
use platform::toolkit::{Toolkit, WindowGeometry, WindowId};
use platform::touch::{TouchDevice, TouchPoint, TouchPointState};
use serde_json::{json, Value};

pub struct JsonToolkit {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonToolkit {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    fn emit(&self, value: Value) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{}", value) {
            tracing::error!(error = %e, "failed to write output");
        }
    }

    /// Print what happened to a step outside the toolkit
    pub fn report(&self, step: usize, report: &StepReport) {
        if let Some(outcome) = report.post {
            if outcome != PostOutcome::Queued {
                self.emit(json!({
                    "call": "post",
                    "step": step,
                    "outcome": format!("{:?}", outcome).to_lowercase(),
                }));
            }
        }
        for event in &report.observed {
            self.emit(json!({
                "call": "observed_key",
                "step": step,
                "event": key_json(event),
            }));
        }
    }
}

fn rect_json(rect: &WindowGeometry) -> Value {
    json!({
        "x": rect.loc.x,
        "y": rect.loc.y,
        "width": rect.size.w,
        "height": rect.size.h,
    })
}

fn key_json(event: &KeyEvent) -> Value {
    serde_json::to_value(event).unwrap_or(Value::Null)
}

fn point_json(point: &TouchPoint) -> Value {
    let state = match point.state {
        TouchPointState::Released => "released",
        TouchPointState::Pressed => "pressed",
        TouchPointState::Moved => "moved",
    };
    json!({
        "id": point.id,
        "state": state,
        "area": [point.area.loc.x, point.area.loc.y, point.area.size.w, point.area.size.h],
        "normalized_position": [point.normalized_position.0, point.normalized_position.1],
        "pressure": point.pressure,
    })
}

impl Toolkit for JsonToolkit {
    fn register_touch_device(&self, device: &TouchDevice) {
        self.emit(json!({
            "call": "register_touch_device",
            "name": device.name,
            "capabilities": device.capabilities.bits(),
        }));
    }

    fn submit_touch_event(
        &self,
        window: WindowId,
        timestamp_ms: u64,
        _device: &TouchDevice,
        points: &[TouchPoint],
    ) {
        let points: Vec<Value> = points
            .iter()
            .map(point_json)
            .collect();
        self.emit(json!({
            "call": "touch",
            "window": window.0,
            "timestamp_ms": timestamp_ms,
            "points": points,
        }));
    }

    fn submit_key_event(&self, window: WindowId, event: &KeyEvent) {
        self.emit(json!({
            "call": "key",
            "window": window.0,
            "event": key_json(event),
        }));
    }

    fn request_expose(&self, window: WindowId, region: WindowGeometry) {
        self.emit(json!({
            "call": "expose",
            "window": window.0,
            "region": rect_json(&region),
        }));
    }

    fn flush_pending_events(&self) {
        self.emit(json!({ "call": "flush" }));
    }

    fn notify_geometry_changed(&self, window: WindowId, geometry: WindowGeometry) {
        self.emit(json!({
            "call": "geometry_changed",
            "window": window.0,
            "geometry": rect_json(&geometry),
        }));
    }
}
