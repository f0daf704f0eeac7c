//! Touch point registry
//!
//! Fixed set of slots, one per potential concurrent contact. Slot ids come
//! from the input stack (echoed back on down/up), so slot `k` always holds
//! the contact the stack calls `k`. Slots are allocated once and never
//! reallocated.

use bitflags::bitflags;
use smithay::utils::{Physical, Point, Rectangle, Size};

bitflags! {
    /// What the touch device reports per point
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TouchCapabilities: u32 {
        const POSITION = 0x0001;
        const AREA = 0x0002;
        const PRESSURE = 0x0004;
        const NORMALIZED_POSITION = 0x0020;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchDeviceKind {
    TouchScreen,
}

/// Touch device announced to the toolkit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchDevice {
    pub name: String,
    pub kind: TouchDeviceKind,
    pub capabilities: TouchCapabilities,
}

impl TouchDevice {
    /// The built-in touch screen
    pub fn touch_screen() -> Self {
        Self {
            name: "touchscreen".to_string(),
            kind: TouchDeviceKind::TouchScreen,
            capabilities: TouchCapabilities::POSITION
                | TouchCapabilities::AREA
                | TouchCapabilities::PRESSURE
                | TouchCapabilities::NORMALIZED_POSITION,
        }
    }
}

/// Lifecycle of a slot: Released -> Pressed -> Moved* -> Released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TouchPointState {
    #[default]
    Released,
    Pressed,
    Moved,
}

/// Geometry and pressure of one contact, ready to store in a slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    /// Contact bounding box in native pixels
    pub area: Rectangle<f64, Physical>,
    /// Position relative to the window size, each axis in [0, 1] when inside
    pub normalized_position: (f64, f64),
    /// Pressure relative to the device maximum
    pub pressure: f64,
}

/// One touch slot
///
/// The area and position of a Released slot are whatever the last contact
/// left behind and carry no meaning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u32,
    pub state: TouchPointState,
    pub area: Rectangle<f64, Physical>,
    pub normalized_position: (f64, f64),
    pub pressure: f64,
}

impl TouchPoint {
    fn released(id: u32) -> Self {
        Self {
            id,
            state: TouchPointState::Released,
            area: Rectangle {
                loc: Point::from((0.0, 0.0)),
                size: Size::from((0.0, 0.0)),
            },
            normalized_position: (0.0, 0.0),
            pressure: 0.0,
        }
    }

    fn apply(&mut self, sample: &TouchSample, state: TouchPointState) {
        self.area = sample.area;
        self.normalized_position = sample.normalized_position;
        self.pressure = sample.pressure;
        self.state = state;
    }

    /// Whether a contact currently occupies this slot
    pub fn is_active(&self) -> bool {
        self.state != TouchPointState::Released
    }
}

/// Fixed-capacity touch slot array
#[derive(Debug, Clone)]
pub struct TouchPointRegistry {
    points: Vec<TouchPoint>,
}

impl TouchPointRegistry {
    /// Pre-allocate `max_point_count` released slots
    pub fn new(max_point_count: usize) -> Self {
        let points = (0..max_point_count as u32).map(TouchPoint::released).collect();
        Self { points }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    /// Slot by id
    pub fn get(&self, slot: i32) -> Option<&TouchPoint> {
        usize::try_from(slot).ok().and_then(|i| self.points.get(i))
    }

    fn slot_mut(&mut self, slot: i32) -> Option<&mut TouchPoint> {
        let capacity = self.points.len();
        let point = usize::try_from(slot).ok().and_then(|i| self.points.get_mut(i));
        if point.is_none() {
            tracing::warn!(slot, capacity, "touch slot out of range, ignoring");
        }
        point
    }

    /// Start a contact in `slot`
    ///
    /// A press on an already active slot overwrites it; the input stack
    /// reuses ids only after releasing them, so that means we missed an up.
    pub fn press(&mut self, slot: i32, sample: &TouchSample) -> bool {
        let Some(point) = self.slot_mut(slot) else {
            return false;
        };
        if point.is_active() {
            tracing::debug!(slot, state = ?point.state, "press on active slot, restarting contact");
        }
        point.apply(sample, TouchPointState::Pressed);
        true
    }

    /// Update an active contact
    ///
    /// Moves for a released slot are dropped.
    pub fn move_to(&mut self, slot: i32, sample: &TouchSample) -> bool {
        let Some(point) = self.slot_mut(slot) else {
            return false;
        };
        if !point.is_active() {
            tracing::debug!(slot, "move for released slot, ignoring");
            return false;
        }
        point.apply(sample, TouchPointState::Moved);
        true
    }

    /// End the contact in `slot`, leaving its geometry stale
    pub fn release(&mut self, slot: i32) -> bool {
        let Some(point) = self.slot_mut(slot) else {
            return false;
        };
        if !point.is_active() {
            tracing::debug!(slot, "release for released slot");
        }
        point.state = TouchPointState::Released;
        true
    }

    /// Ids of the slots currently holding a contact, in slot order
    pub fn active_slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.points.iter().filter(|p| p.is_active()).map(|p| p.id)
    }

    /// Every slot, in any state
    pub fn snapshot(&self) -> &[TouchPoint] {
        &self.points
    }
}
