//! Platform window
//!
//! Owns the geometry state shared between the thread receiving compositor
//! resize notifications and the render thread reporting buffer swaps.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use smithay::utils::{Logical, Physical, Point, Rectangle, Size};

use crate::config::ResizeConfig;
use crate::resize::{to_logical, ResizeAction, ResizeReconciler, ResizeState};
use crate::toolkit::{Toolkit, WindowGeometry, WindowId};

static NEXT_WINDOW_ID: AtomicU32 = AtomicU32::new(1);

/// Geometry state guarded by the window lock
#[derive(Debug)]
struct WindowGeometryState {
    reconciler: ResizeReconciler,
    /// Geometry requested by or reported to the toolkit
    geometry: WindowGeometry,
}

/// A toolkit window backed by a compositor surface
pub struct PlatformWindow {
    id: WindowId,
    device_pixel_ratio: f64,
    toolkit: Arc<dyn Toolkit>,
    state: Mutex<WindowGeometryState>,
}

impl PlatformWindow {
    /// Create a window whose first buffer matches the surface size
    pub fn new(
        toolkit: Arc<dyn Toolkit>,
        surface_size: Size<i32, Physical>,
        device_pixel_ratio: f64,
        config: &ResizeConfig,
    ) -> Self {
        let id = WindowId(NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed));
        let geometry = Rectangle {
            loc: Point::from((0, 0)),
            size: to_logical(surface_size, device_pixel_ratio),
        };

        tracing::info!(%id, ?surface_size, device_pixel_ratio, ?geometry, "created window");

        Self {
            id,
            device_pixel_ratio,
            toolkit,
            state: Mutex::new(WindowGeometryState {
                reconciler: ResizeReconciler::new(surface_size, config),
                geometry,
            }),
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, WindowGeometryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.lock().geometry
    }

    /// Size used to normalize touch positions
    pub fn size(&self) -> Size<i32, Logical> {
        self.lock().geometry.size
    }

    /// Store the geometry the toolkit asked for
    pub fn set_geometry(&self, geometry: WindowGeometry) {
        tracing::debug!(window = %self.id, ?geometry, "set geometry");
        self.lock().geometry = geometry;
    }

    /// Authoritative buffer size in native pixels
    pub fn buffer_size(&self) -> Size<i32, Physical> {
        self.lock().reconciler.buffer_size()
    }

    pub fn resize_state(&self) -> ResizeState {
        self.lock().reconciler.state()
    }

    /// The compositor resized the surface to `width`x`height` native pixels
    pub fn notify_compositor_resize(&self, width: i32, height: i32) {
        let (action, geometry) = {
            let mut state = self.lock();
            (state.reconciler.on_compositor_resize(width, height), state.geometry)
        };

        if action == ResizeAction::RequestExpose {
            self.toolkit.request_expose(self.id, geometry);
            self.toolkit.flush_pending_events();
        }
    }

    /// The render thread swapped a `width`x`height` buffer
    ///
    /// Called from the render thread.
    pub fn notify_buffer_swapped(&self, width: i32, height: i32) {
        let (action, geometry) = {
            let mut state = self.lock();
            let action = state.reconciler.on_buffer_swapped(width, height);
            if let ResizeAction::GeometryChanged { buffer } = action {
                state.geometry.size = to_logical(buffer, self.device_pixel_ratio);
            }
            (action, state.geometry)
        };

        match action {
            ResizeAction::RequestExpose => self.toolkit.request_expose(self.id, geometry),
            ResizeAction::GeometryChanged { .. } => {
                tracing::debug!(window = %self.id, ?geometry, "geometry changed");
                self.toolkit.notify_geometry_changed(self.id, geometry);
            }
            ResizeAction::None | ResizeAction::CatchUpExhausted => {}
        }
    }
}

impl std::fmt::Debug for PlatformWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformWindow")
            .field("id", &self.id)
            .field("device_pixel_ratio", &self.device_pixel_ratio)
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}
