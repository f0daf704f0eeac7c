//! Native event dispatch
//!
//! Single entry point for native events on the main thread. Each event is
//! offered to the native event filter, then routed to the motion or key
//! path by its kind.

use std::sync::Arc;

use crate::config::Config;
use crate::event::{EventDetails, NativeEvent, SwitchDetails};
use crate::key::KeyEventDispatcher;
use crate::modifiers::KeyboardState;
use crate::motion::MotionEventDispatcher;
use crate::toolkit::Toolkit;
use crate::window::PlatformWindow;

/// Hook run before any dispatch
pub trait NativeEventFilter {
    /// Return `true` to consume the event
    fn filter_native_event(&mut self, window: &PlatformWindow, event: &NativeEvent) -> bool;
}

impl<F> NativeEventFilter for F
where
    F: FnMut(&PlatformWindow, &NativeEvent) -> bool,
{
    fn filter_native_event(&mut self, window: &PlatformWindow, event: &NativeEvent) -> bool {
        self(window, event)
    }
}

/// Main-thread input state and routing
pub struct InputDispatcher {
    toolkit: Arc<dyn Toolkit>,
    motion: MotionEventDispatcher,
    keys: KeyEventDispatcher,
    native_filter: Option<Box<dyn NativeEventFilter>>,
}

impl InputDispatcher {
    /// Create the dispatcher and announce the touch device to the toolkit
    pub fn new(
        toolkit: Arc<dyn Toolkit>,
        keyboard: Box<dyn KeyboardState>,
        config: &Config,
    ) -> Self {
        let motion = MotionEventDispatcher::new(&config.touch);
        toolkit.register_touch_device(motion.device());
        tracing::info!(device = %motion.device().name, "registered touch device");

        Self {
            toolkit,
            motion,
            keys: KeyEventDispatcher::new(keyboard),
            native_filter: None,
        }
    }

    /// Install the hook consulted before dispatching each event
    pub fn set_native_event_filter(&mut self, filter: impl NativeEventFilter + 'static) {
        self.native_filter = Some(Box::new(filter));
    }

    pub fn clear_native_event_filter(&mut self) {
        self.native_filter = None;
    }

    pub fn motion(&self) -> &MotionEventDispatcher {
        &self.motion
    }

    /// Route one native event for `window`
    pub fn dispatch_native_event(&mut self, window: &PlatformWindow, event: &NativeEvent) {
        tracing::trace!(window = %window.id(), kind = event.kind(), "dispatching native event");

        if let Some(filter) = self.native_filter.as_mut() {
            if filter.filter_native_event(window, event) {
                tracing::debug!(window = %window.id(), kind = event.kind(), "event filtered out by native filter");
                return;
            }
        }

        match &event.details {
            EventDetails::Motion(motion) => self.motion.dispatch(
                self.toolkit.as_ref(),
                window.id(),
                window.size(),
                event.action,
                motion,
            ),
            EventDetails::Key(key) => {
                self.keys
                    .dispatch(self.toolkit.as_ref(), window.id(), event.action, key)
            }
            EventDetails::HardwareSwitch(switch) => dispatch_switch(window, event, switch),
        }
    }
}

fn dispatch_switch(window: &PlatformWindow, event: &NativeEvent, switch: &SwitchDetails) {
    tracing::debug!(
        window = %window.id(),
        device_id = event.device_id,
        source_id = event.source_id,
        action = event.action,
        flags = event.flags,
        meta_state = event.meta_state,
        event_time = switch.event_time,
        policy_flags = switch.policy_flags,
        switch_values = switch.switch_values,
        switch_mask = switch.switch_mask,
        "hardware switch event ignored"
    );
}

impl AsMut<InputDispatcher> for InputDispatcher {
    fn as_mut(&mut self) -> &mut InputDispatcher {
        self
    }
}

impl std::fmt::Debug for InputDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDispatcher")
            .field("motion", &self.motion)
            .field("keys", &self.keys)
            .field("native_filter", &self.native_filter.is_some())
            .finish_non_exhaustive()
    }
}
