//! Toolkit window-system interface
//!
//! Everything the input layer hands to the GUI toolkit goes through
//! [`Toolkit`]. Implementations must be callable from the render thread
//! (geometry changes, expose requests) as well as the main thread.

use std::fmt;

use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Rectangle};

use crate::key::KeyEvent;
use crate::touch::{TouchDevice, TouchPoint};

/// Toolkit window geometry, in device-independent pixels
pub type WindowGeometry = Rectangle<i32, Logical>;

/// Platform window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Toolkit ingestion API
pub trait Toolkit: Send + Sync {
    /// Announce the touch device once, before any touch event
    fn register_touch_device(&self, device: &TouchDevice);

    /// Submit the full touch point snapshot for one native motion event
    fn submit_touch_event(
        &self,
        window: WindowId,
        timestamp_ms: u64,
        device: &TouchDevice,
        points: &[TouchPoint],
    );

    /// Submit one key press or release
    fn submit_key_event(&self, window: WindowId, event: &KeyEvent);

    /// Ask for a redraw of `region`, which makes the render thread swap again
    fn request_expose(&self, window: WindowId, region: WindowGeometry);

    /// Flush queued window-system events
    fn flush_pending_events(&self);

    /// Tell the toolkit the window geometry changed
    fn notify_geometry_changed(&self, window: WindowId, geometry: WindowGeometry);
}
