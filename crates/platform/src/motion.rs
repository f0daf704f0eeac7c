//! Motion event dispatch
//!
//! Applies a native motion event to the [`TouchPointRegistry`] and submits
//! the resulting snapshot to the toolkit.

use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::config::{MoveMatching, TouchConfig};
use crate::event::{motion_action, timestamp_ms, MotionDetails, PointerCoordinates};
use crate::toolkit::{Toolkit, WindowId};
use crate::touch::{TouchDevice, TouchPointRegistry, TouchSample};

/// Decoded motion action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAction {
    Down,
    Up,
    Move,
    /// Another finger joined; `index` points into the coordinate array
    PointerDown { index: usize },
    /// A finger left while others stay down
    PointerUp { index: usize },
    Cancel { index: usize },
    /// Outside, hover, scroll and anything unknown
    Unhandled(i32),
}

impl MotionAction {
    /// Split a native action code into the action and its pointer index
    pub fn decode(action: i32) -> Self {
        let index = ((action & motion_action::POINTER_INDEX_MASK)
            >> motion_action::POINTER_INDEX_SHIFT) as usize;
        match action & motion_action::MASK {
            motion_action::DOWN => Self::Down,
            motion_action::UP => Self::Up,
            motion_action::MOVE => Self::Move,
            motion_action::POINTER_DOWN => Self::PointerDown { index },
            motion_action::POINTER_UP => Self::PointerUp { index },
            motion_action::CANCEL => Self::Cancel { index },
            other => Self::Unhandled(other),
        }
    }
}

/// Build the slot contents for one pointer
///
/// `area` is centred on the raw position and sized by the touch ellipse
/// axes; the position is normalized against the window size.
pub fn touch_sample(
    pointer: &PointerCoordinates,
    window_size: Size<i32, Logical>,
    max_pressure: f64,
) -> TouchSample {
    let x = f64::from(pointer.raw_x);
    let y = f64::from(pointer.raw_y);
    let w = f64::from(pointer.touch_major).max(0.0);
    let h = f64::from(pointer.touch_minor).max(0.0);

    TouchSample {
        area: Rectangle {
            loc: Point::from((x - w / 2.0, y - h / 2.0)),
            size: Size::from((w, h)),
        },
        normalized_position: (normalize(x, window_size.w), normalize(y, window_size.h)),
        pressure: pressure(pointer.pressure, max_pressure),
    }
}

/// Scaled pressure; out-of-range device values report no pressure
fn pressure(raw: f32, max_pressure: f64) -> f64 {
    let scaled = f64::from(raw) / max_pressure;
    if scaled.is_finite() {
        scaled
    } else {
        0.0
    }
}

fn normalize(value: f64, extent: i32) -> f64 {
    if extent > 0 {
        value / f64::from(extent)
    } else {
        0.0
    }
}

/// Touch slot state plus the rules for updating it from motion events
#[derive(Debug)]
pub struct MotionEventDispatcher {
    registry: TouchPointRegistry,
    device: TouchDevice,
    max_pressure: f64,
    move_matching: MoveMatching,
}

impl MotionEventDispatcher {
    pub fn new(config: &TouchConfig) -> Self {
        tracing::debug!(
            max_point_count = config.max_point_count,
            max_pressure = config.max_pressure,
            move_matching = ?config.move_matching,
            "creating motion dispatcher"
        );
        Self {
            registry: TouchPointRegistry::new(config.max_point_count),
            device: TouchDevice::touch_screen(),
            max_pressure: config.max_pressure,
            move_matching: config.move_matching,
        }
    }

    pub fn device(&self) -> &TouchDevice {
        &self.device
    }

    pub fn registry(&self) -> &TouchPointRegistry {
        &self.registry
    }

    /// Update the registry for one event
    ///
    /// Returns `false` when the action isn't one we track, in which case the
    /// event should be dropped.
    pub fn apply(
        &mut self,
        action: i32,
        motion: &MotionDetails,
        window_size: Size<i32, Logical>,
    ) -> bool {
        let pointers = motion.pointers();

        match MotionAction::decode(action) {
            MotionAction::Move => {
                self.apply_move(pointers, window_size);
            }
            MotionAction::Down => {
                if let Some(pointer) = pointers.first() {
                    let sample = touch_sample(pointer, window_size, self.max_pressure);
                    self.registry.press(pointer.id, &sample);
                } else {
                    tracing::warn!("down event without pointer coordinates");
                }
            }
            MotionAction::PointerDown { index } => {
                if let Some(pointer) = pointer_at(pointers, index) {
                    let sample = touch_sample(pointer, window_size, self.max_pressure);
                    self.registry.press(pointer.id, &sample);
                }
            }
            MotionAction::Up => {
                if let Some(pointer) = pointers.first() {
                    self.registry.release(pointer.id);
                } else {
                    tracing::warn!("up event without pointer coordinates");
                }
            }
            MotionAction::PointerUp { index } | MotionAction::Cancel { index } => {
                if let Some(pointer) = pointer_at(pointers, index) {
                    self.registry.release(pointer.id);
                }
            }
            MotionAction::Unhandled(code) => {
                tracing::debug!(action = code, "unhandled motion event action");
                return false;
            }
        }
        true
    }

    fn apply_move(&mut self, pointers: &[PointerCoordinates], window_size: Size<i32, Logical>) {
        match self.move_matching {
            MoveMatching::ById => {
                for pointer in pointers {
                    let sample = touch_sample(pointer, window_size, self.max_pressure);
                    self.registry.move_to(pointer.id, &sample);
                }
            }
            MoveMatching::SlotOrder => {
                // Pointer order is assumed to follow slot occupancy order
                let active: Vec<u32> = self.registry.active_slots().collect();
                if active.len() < pointers.len() {
                    tracing::debug!(
                        active = active.len(),
                        pointers = pointers.len(),
                        "more move pointers than active slots"
                    );
                }
                for (slot, pointer) in active.into_iter().zip(pointers) {
                    let sample = touch_sample(pointer, window_size, self.max_pressure);
                    self.registry.move_to(slot as i32, &sample);
                }
            }
        }
    }

    /// Apply the event and submit the full slot snapshot to the toolkit
    pub fn dispatch(
        &mut self,
        toolkit: &dyn Toolkit,
        window: WindowId,
        window_size: Size<i32, Logical>,
        action: i32,
        motion: &MotionDetails,
    ) {
        tracing::trace!(
            %window,
            action,
            edge_flags = motion.edge_flags,
            button_state = motion.button_state,
            down_time = motion.down_time,
            event_time = motion.event_time,
            pointers = ?motion.pointers(),
            "motion event"
        );

        if !self.apply(action, motion, window_size) {
            return;
        }

        toolkit.submit_touch_event(
            window,
            timestamp_ms(motion.event_time),
            &self.device,
            self.registry.snapshot(),
        );
    }
}

fn pointer_at(pointers: &[PointerCoordinates], index: usize) -> Option<&PointerCoordinates> {
    let pointer = pointers.get(index);
    if pointer.is_none() {
        tracing::warn!(index, count = pointers.len(), "pointer index out of range");
    }
    pointer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::TouchPointState;

    fn window() -> Size<i32, Logical> {
        Size::from((200, 400))
    }

    fn pointer(id: i32, x: f32, y: f32) -> PointerCoordinates {
        PointerCoordinates {
            id,
            raw_x: x,
            raw_y: y,
            x,
            y,
            touch_major: 20.0,
            touch_minor: 10.0,
            pressure: 0.64,
            ..Default::default()
        }
    }

    fn motion(pointers: Vec<PointerCoordinates>) -> MotionDetails {
        MotionDetails {
            event_time: 42_000_000,
            pointer_coordinates: pointers,
            ..Default::default()
        }
    }

    fn dispatcher(max_point_count: usize, move_matching: MoveMatching) -> MotionEventDispatcher {
        MotionEventDispatcher::new(&TouchConfig {
            max_point_count,
            max_pressure: 1.28,
            move_matching,
        })
    }

    fn state(d: &MotionEventDispatcher, slot: i32) -> Option<TouchPointState> {
        d.registry().get(slot).map(|p| p.state)
    }

    #[test]
    fn decode_actions() {
        assert_eq!(MotionAction::decode(0), MotionAction::Down);
        assert_eq!(MotionAction::decode(1), MotionAction::Up);
        assert_eq!(MotionAction::decode(2), MotionAction::Move);
        assert_eq!(MotionAction::decode(0x0105), MotionAction::PointerDown { index: 1 });
        assert_eq!(MotionAction::decode(0x0206), MotionAction::PointerUp { index: 2 });
        assert_eq!(MotionAction::decode(3), MotionAction::Cancel { index: 0 });
        assert_eq!(MotionAction::decode(8), MotionAction::Unhandled(8));
        assert_eq!(MotionAction::decode(0x42), MotionAction::Unhandled(0x42));
    }

    #[test]
    fn sample_geometry_and_pressure() {
        let sample = touch_sample(&pointer(0, 100.0, 100.0), window(), 1.28);
        assert_eq!(sample.area.loc, Point::from((90.0, 95.0)));
        assert_eq!(sample.area.size, Size::from((20.0, 10.0)));
        assert_eq!(sample.normalized_position, (0.5, 0.25));
        assert!((sample.pressure - 0.5).abs() < 1e-6);
    }

    #[test]
    fn non_finite_pressure_reads_as_zero() {
        let mut p = pointer(0, 10.0, 10.0);
        p.pressure = f32::INFINITY;
        assert_eq!(touch_sample(&p, window(), 1.28).pressure, 0.0);
        p.pressure = f32::NAN;
        assert_eq!(touch_sample(&p, window(), 1.28).pressure, 0.0);
    }

    #[test]
    fn zero_sized_window_normalizes_to_origin() {
        let sample = touch_sample(&pointer(0, 10.0, 10.0), Size::from((0, 0)), 1.28);
        assert_eq!(sample.normalized_position, (0.0, 0.0));
    }

    #[test]
    fn pointer_down_uses_coordinate_id_not_index() {
        let mut d = dispatcher(5, MoveMatching::ById);
        d.apply(motion_action::DOWN, &motion(vec![pointer(0, 10.0, 10.0)]), window());

        let action = motion_action::with_pointer_index(motion_action::POINTER_DOWN, 1);
        let event = motion(vec![pointer(0, 10.0, 10.0), pointer(3, 50.0, 50.0)]);
        assert!(d.apply(action, &event, window()));

        assert_eq!(state(&d, 3), Some(TouchPointState::Pressed));
        assert_eq!(state(&d, 1), Some(TouchPointState::Released));
    }

    #[test]
    fn pointer_up_and_cancel_release_by_index() {
        let mut d = dispatcher(5, MoveMatching::ById);
        d.apply(motion_action::DOWN, &motion(vec![pointer(1, 10.0, 10.0)]), window());
        let both = motion(vec![pointer(1, 10.0, 10.0), pointer(4, 20.0, 20.0)]);
        d.apply(
            motion_action::with_pointer_index(motion_action::POINTER_DOWN, 1),
            &both,
            window(),
        );

        d.apply(
            motion_action::with_pointer_index(motion_action::POINTER_UP, 1),
            &both,
            window(),
        );
        assert_eq!(state(&d, 4), Some(TouchPointState::Released));
        assert_eq!(state(&d, 1), Some(TouchPointState::Pressed));

        d.apply(motion_action::CANCEL, &motion(vec![pointer(1, 10.0, 10.0)]), window());
        assert_eq!(state(&d, 1), Some(TouchPointState::Released));
    }

    #[test]
    fn move_by_id_ignores_pointer_order() {
        let mut d = dispatcher(5, MoveMatching::ById);
        d.apply(motion_action::DOWN, &motion(vec![pointer(0, 10.0, 10.0)]), window());
        d.apply(
            motion_action::with_pointer_index(motion_action::POINTER_DOWN, 1),
            &motion(vec![pointer(0, 10.0, 10.0), pointer(2, 20.0, 20.0)]),
            window(),
        );

        // Reversed order relative to the slots
        d.apply(
            motion_action::MOVE,
            &motion(vec![pointer(2, 40.0, 80.0), pointer(0, 100.0, 200.0)]),
            window(),
        );

        let slot0 = d.registry().get(0).copied().expect("slot 0");
        let slot2 = d.registry().get(2).copied().expect("slot 2");
        assert_eq!(slot0.state, TouchPointState::Moved);
        assert_eq!(slot0.normalized_position, (0.5, 0.5));
        assert_eq!(slot2.normalized_position, (0.2, 0.2));
    }

    #[test]
    fn move_in_slot_order_follows_occupancy() {
        let mut d = dispatcher(5, MoveMatching::SlotOrder);
        d.apply(motion_action::DOWN, &motion(vec![pointer(0, 10.0, 10.0)]), window());
        d.apply(
            motion_action::with_pointer_index(motion_action::POINTER_DOWN, 1),
            &motion(vec![pointer(0, 10.0, 10.0), pointer(2, 20.0, 20.0)]),
            window(),
        );

        d.apply(
            motion_action::MOVE,
            &motion(vec![pointer(2, 40.0, 80.0), pointer(0, 100.0, 200.0)]),
            window(),
        );

        // First event pointer lands in the first occupied slot
        let slot0 = d.registry().get(0).copied().expect("slot 0");
        assert_eq!(slot0.normalized_position, (0.2, 0.2));
        let slot2 = d.registry().get(2).copied().expect("slot 2");
        assert_eq!(slot2.normalized_position, (0.5, 0.5));
    }

    #[test]
    fn unhandled_actions_leave_registry_alone() {
        let mut d = dispatcher(3, MoveMatching::ById);
        for action in [
            motion_action::OUTSIDE,
            motion_action::HOVER_MOVE,
            motion_action::SCROLL,
            motion_action::HOVER_ENTER,
            motion_action::HOVER_EXIT,
        ] {
            assert!(!d.apply(action, &motion(vec![pointer(0, 1.0, 1.0)]), window()));
        }
        assert_eq!(d.registry().active_slots().count(), 0);
    }

    #[test]
    fn malformed_events_do_not_panic() {
        let mut d = dispatcher(2, MoveMatching::ById);
        // No coordinates at all
        d.apply(motion_action::DOWN, &motion(vec![]), window());
        d.apply(motion_action::UP, &motion(vec![]), window());
        // Index past the coordinate array
        d.apply(
            motion_action::with_pointer_index(motion_action::POINTER_DOWN, 7),
            &motion(vec![pointer(0, 1.0, 1.0)]),
            window(),
        );
        // Slot id past the registry
        d.apply(motion_action::DOWN, &motion(vec![pointer(9, 1.0, 1.0)]), window());
        d.apply(motion_action::DOWN, &motion(vec![pointer(-3, 1.0, 1.0)]), window());
        assert_eq!(d.registry().active_slots().count(), 0);
    }
}
