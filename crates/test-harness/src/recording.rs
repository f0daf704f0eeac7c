//! Recording toolkit

use std::sync::{Arc, Mutex, MutexGuard};

use platform::key::KeyEvent;
use platform::toolkit::{Toolkit, WindowGeometry, WindowId};
use platform::touch::{TouchDevice, TouchPoint};

/// One call into the toolkit
#[derive(Debug, Clone, PartialEq)]
pub enum ToolkitCall {
    RegisterTouchDevice(TouchDevice),
    Touch {
        window: WindowId,
        timestamp_ms: u64,
        points: Vec<TouchPoint>,
    },
    Key {
        window: WindowId,
        event: KeyEvent,
    },
    Expose {
        window: WindowId,
        region: WindowGeometry,
    },
    Flush,
    GeometryChanged {
        window: WindowId,
        geometry: WindowGeometry,
    },
}

/// Toolkit that records every call, in order
#[derive(Debug, Default)]
pub struct RecordingToolkit {
    calls: Mutex<Vec<ToolkitCall>>,
}

impl RecordingToolkit {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ToolkitCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: ToolkitCall) {
        tracing::trace!(?call, "toolkit call");
        self.lock().push(call);
    }

    /// All calls so far
    pub fn calls(&self) -> Vec<ToolkitCall> {
        self.lock().clone()
    }

    /// Drain the recorded calls
    pub fn take(&self) -> Vec<ToolkitCall> {
        std::mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Submitted key events
    pub fn key_events(&self) -> Vec<KeyEvent> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                ToolkitCall::Key { event, .. } => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// Submitted touch snapshots
    pub fn touch_events(&self) -> Vec<Vec<TouchPoint>> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                ToolkitCall::Touch { points, .. } => Some(points.clone()),
                _ => None,
            })
            .collect()
    }

    /// Geometries passed to `notify_geometry_changed`
    pub fn geometry_changes(&self) -> Vec<WindowGeometry> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                ToolkitCall::GeometryChanged { geometry, .. } => Some(*geometry),
                _ => None,
            })
            .collect()
    }

    pub fn expose_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|call| matches!(call, ToolkitCall::Expose { .. }))
            .count()
    }
}

impl Toolkit for RecordingToolkit {
    fn register_touch_device(&self, device: &TouchDevice) {
        self.record(ToolkitCall::RegisterTouchDevice(device.clone()));
    }

    fn submit_touch_event(
        &self,
        window: WindowId,
        timestamp_ms: u64,
        _device: &TouchDevice,
        points: &[TouchPoint],
    ) {
        self.record(ToolkitCall::Touch {
            window,
            timestamp_ms,
            points: points.to_vec(),
        });
    }

    fn submit_key_event(&self, window: WindowId, event: &KeyEvent) {
        self.record(ToolkitCall::Key {
            window,
            event: event.clone(),
        });
    }

    fn request_expose(&self, window: WindowId, region: WindowGeometry) {
        self.record(ToolkitCall::Expose { window, region });
    }

    fn flush_pending_events(&self) {
        self.record(ToolkitCall::Flush);
    }

    fn notify_geometry_changed(&self, window: WindowId, geometry: WindowGeometry) {
        self.record(ToolkitCall::GeometryChanged { window, geometry });
    }
}
