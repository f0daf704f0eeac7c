//! Surface resize reconciliation
//!
//! The compositor announces a new surface size on one thread while the
//! render thread reports the size of every buffer it swaps. Neither is
//! ordered against the other, and the buffer carrying the new size may
//! only show up a couple of swaps later. The reconciler keeps the size of
//! the last swapped buffer as the authoritative one and asks for extra
//! redraws after a compositor resize until a swap catches up, bounded by a
//! retry budget.
//!
//! Only a buffer swap ever changes the authoritative size.

use smithay::utils::{Logical, Physical, Size};

use crate::config::ResizeConfig;

/// What the window should do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAction {
    /// Nothing to do
    None,

    /// Redraw at the current geometry so the render thread swaps again
    RequestExpose,

    /// The buffer size changed; update geometry and tell the toolkit
    GeometryChanged { buffer: Size<i32, Physical> },

    /// Retry budget ran out without the buffer size changing
    CatchUpExhausted,
}

/// Reconciliation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeState {
    /// Buffer size is settled
    Stable {
        /// Authoritative buffer size
        size: Size<i32, Physical>,
    },

    /// Compositor announced a different size, waiting for a matching swap
    AwaitingCatchUp {
        /// Authoritative buffer size
        size: Size<i32, Physical>,
        /// Size announced by the compositor, as reported
        target: (i32, i32),
        /// Redraws still allowed before giving up
        attempts_remaining: u32,
    },
}

/// Resize catch-up state machine
#[derive(Debug, Clone)]
pub struct ResizeReconciler {
    state: ResizeState,
    catch_up_attempts: u32,
    frame_number: u64,
}

impl ResizeReconciler {
    pub fn new(buffer_size: Size<i32, Physical>, config: &ResizeConfig) -> Self {
        Self {
            state: ResizeState::Stable { size: buffer_size },
            catch_up_attempts: config.catch_up_attempts,
            frame_number: 0,
        }
    }

    pub fn state(&self) -> ResizeState {
        self.state
    }

    /// Size of the last buffer swapped with a valid, different size
    pub fn buffer_size(&self) -> Size<i32, Physical> {
        match self.state {
            ResizeState::Stable { size } | ResizeState::AwaitingCatchUp { size, .. } => size,
        }
    }

    /// Catch-up redraws left, zero when stable
    pub fn attempts_remaining(&self) -> u32 {
        match self.state {
            ResizeState::Stable { .. } => 0,
            ResizeState::AwaitingCatchUp {
                attempts_remaining, ..
            } => attempts_remaining,
        }
    }

    /// Number of buffer swaps seen
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Handle the compositor announcing a surface size
    ///
    /// A size equal to the current buffer leaves the state alone, including
    /// any catch-up in progress.
    pub fn on_compositor_resize(&mut self, width: i32, height: i32) -> ResizeAction {
        let size = self.buffer_size();
        if (size.w, size.h) == (width, height) {
            tracing::debug!(
                frame = self.frame_number,
                ?size,
                "compositor resize matches current buffer"
            );
            return ResizeAction::None;
        }

        tracing::debug!(
            frame = self.frame_number,
            from = ?size,
            to = ?(width, height),
            attempts = self.catch_up_attempts,
            "compositor resize, redrawing to catch up"
        );

        self.state = ResizeState::AwaitingCatchUp {
            size,
            target: (width, height),
            attempts_remaining: self.catch_up_attempts,
        };
        ResizeAction::RequestExpose
    }

    /// Handle the render thread finishing a swap of a `width`x`height` buffer
    ///
    /// Non-positive dimensions mean the size is unknown and count as
    /// unchanged.
    pub fn on_buffer_swapped(&mut self, width: i32, height: i32) -> ResizeAction {
        self.frame_number += 1;

        let size = self.buffer_size();
        let size_known = width > 0 && height > 0;

        if size_known && (size.w, size.h) != (width, height) {
            let buffer = Size::from((width, height));
            tracing::debug!(
                frame = self.frame_number,
                from = ?size,
                to = ?buffer,
                "buffer size changed"
            );
            self.state = ResizeState::Stable { size: buffer };
            return ResizeAction::GeometryChanged { buffer };
        }

        match &mut self.state {
            ResizeState::Stable { .. } => ResizeAction::None,

            ResizeState::AwaitingCatchUp {
                attempts_remaining, ..
            } if *attempts_remaining > 0 => {
                *attempts_remaining -= 1;
                tracing::debug!(
                    frame = self.frame_number,
                    ?size,
                    attempts_remaining = *attempts_remaining,
                    "buffer not resized yet, redrawing"
                );
                ResizeAction::RequestExpose
            }

            ResizeState::AwaitingCatchUp { target, .. } => {
                let target = *target;
                tracing::warn!(
                    frame = self.frame_number,
                    ?size,
                    ?target,
                    "buffer never caught up with compositor resize"
                );
                self.state = ResizeState::Stable { size };
                ResizeAction::CatchUpExhausted
            }
        }
    }
}

/// Device-independent size of a `buffer`, rounding up
pub fn to_logical(buffer: Size<i32, Physical>, device_pixel_ratio: f64) -> Size<i32, Logical> {
    let scale = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    let divide = |px: i32| (f64::from(px) / scale).ceil() as i32;
    Size::from((divide(buffer.w), divide(buffer.h)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconciler(w: i32, h: i32) -> ResizeReconciler {
        ResizeReconciler::new(Size::from((w, h)), &ResizeConfig::default())
    }

    #[test]
    fn initial_state_is_stable() {
        let r = reconciler(100, 100);
        assert_eq!(
            r.state(),
            ResizeState::Stable {
                size: Size::from((100, 100))
            }
        );
        assert_eq!(r.attempts_remaining(), 0);
    }

    #[test]
    fn compositor_resize_to_same_size_is_noop() {
        let mut r = reconciler(100, 100);
        assert_eq!(r.on_compositor_resize(100, 100), ResizeAction::None);
        assert!(matches!(r.state(), ResizeState::Stable { .. }));
    }

    #[test]
    fn catch_up_converges() {
        let mut r = reconciler(100, 100);

        assert_eq!(r.on_compositor_resize(150, 150), ResizeAction::RequestExpose);
        assert_eq!(r.attempts_remaining(), 2);
        assert_eq!(r.buffer_size(), Size::from((100, 100)));

        assert_eq!(r.on_buffer_swapped(100, 100), ResizeAction::RequestExpose);
        assert_eq!(r.attempts_remaining(), 1);

        assert_eq!(
            r.on_buffer_swapped(150, 150),
            ResizeAction::GeometryChanged {
                buffer: Size::from((150, 150))
            }
        );
        assert_eq!(
            r.state(),
            ResizeState::Stable {
                size: Size::from((150, 150))
            }
        );

        // Further swaps at the new size are steady state
        assert_eq!(r.on_buffer_swapped(150, 150), ResizeAction::None);
        assert_eq!(r.frame_number(), 3);
    }

    #[test]
    fn catch_up_budget_runs_out() {
        let mut r = reconciler(100, 100);
        r.on_compositor_resize(150, 150);

        assert_eq!(r.on_buffer_swapped(100, 100), ResizeAction::RequestExpose);
        assert_eq!(r.on_buffer_swapped(100, 100), ResizeAction::RequestExpose);
        assert_eq!(r.on_buffer_swapped(100, 100), ResizeAction::CatchUpExhausted);
        assert_eq!(r.on_buffer_swapped(100, 100), ResizeAction::None);

        assert_eq!(r.buffer_size(), Size::from((100, 100)));
    }

    #[test]
    fn unknown_size_counts_as_unchanged() {
        let mut r = reconciler(100, 100);
        r.on_compositor_resize(150, 150);

        assert_eq!(r.on_buffer_swapped(0, 150), ResizeAction::RequestExpose);
        assert_eq!(r.on_buffer_swapped(-1, -1), ResizeAction::RequestExpose);
        assert_eq!(r.buffer_size(), Size::from((100, 100)));

        let mut stable = reconciler(100, 100);
        assert_eq!(stable.on_buffer_swapped(0, 0), ResizeAction::None);
    }

    #[test]
    fn unsolicited_buffer_change_updates_size() {
        let mut r = reconciler(100, 100);
        assert_eq!(
            r.on_buffer_swapped(80, 60),
            ResizeAction::GeometryChanged {
                buffer: Size::from((80, 60))
            }
        );
        assert_eq!(r.buffer_size(), Size::from((80, 60)));
    }

    #[test]
    fn repeated_compositor_resize_restarts_budget() {
        let mut r = reconciler(100, 100);
        r.on_compositor_resize(150, 150);
        r.on_buffer_swapped(100, 100);
        assert_eq!(r.attempts_remaining(), 1);

        assert_eq!(r.on_compositor_resize(200, 200), ResizeAction::RequestExpose);
        assert_eq!(r.attempts_remaining(), 2);
    }

    #[test]
    fn configured_budget() {
        let config = ResizeConfig { catch_up_attempts: 0 };
        let mut r = ResizeReconciler::new(Size::from((10, 10)), &config);
        assert_eq!(r.on_compositor_resize(20, 20), ResizeAction::RequestExpose);
        assert_eq!(r.on_buffer_swapped(10, 10), ResizeAction::CatchUpExhausted);
    }

    #[test]
    fn logical_size_rounds_up() {
        assert_eq!(to_logical(Size::from((150, 151)), 2.0), Size::from((75, 76)));
        assert_eq!(to_logical(Size::from((100, 100)), 1.0), Size::from((100, 100)));
        assert_eq!(to_logical(Size::from((100, 100)), 1.5), Size::from((67, 67)));
        assert_eq!(to_logical(Size::from((100, 100)), 0.0), Size::from((100, 100)));
    }
}
