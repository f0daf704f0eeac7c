//! Main-thread event queue
//!
//! Native events arrive on the platform thread and have to be handled on
//! the main loop. [`EventPoster`] is the platform-thread end; it runs key
//! events through the [`PluggableKeyFilter`] before queueing them, so
//! filtered keys never reach the main loop. [`EventQueue`] is the calloop
//! source draining them, in posting order, into an [`InputDispatcher`].

use std::sync::Arc;

use calloop::channel::{self, Channel, Sender};
use calloop::{LoopHandle, RegistrationToken};
use thiserror::Error;

use crate::dispatch::InputDispatcher;
use crate::event::{EventDetails, NativeEvent};
use crate::filter::PluggableKeyFilter;
use crate::key::KeyEvent;
use crate::modifiers::Modifiers;
use crate::window::PlatformWindow;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to insert event queue into event loop: {0}")]
    Insert(#[source] calloop::Error),
}

/// A native event bound for a window
#[derive(Debug)]
pub struct QueuedEvent {
    pub window: Arc<PlatformWindow>,
    pub event: NativeEvent,
}

/// What happened to a posted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Queued,
    /// Consumed by a key filter observer
    Filtered,
    /// The main loop dropped its end
    Disconnected,
}

/// Platform-thread end of the queue
#[derive(Debug, Clone)]
pub struct EventPoster {
    sender: Sender<QueuedEvent>,
    key_filter: Option<Arc<PluggableKeyFilter>>,
}

/// Main-loop end of the queue
#[derive(Debug)]
pub struct EventQueue {
    channel: Channel<QueuedEvent>,
}

/// Create a connected poster and queue
pub fn event_queue(key_filter: Option<Arc<PluggableKeyFilter>>) -> (EventPoster, EventQueue) {
    let (sender, channel) = channel::channel();
    (EventPoster { sender, key_filter }, EventQueue { channel })
}

impl EventPoster {
    /// Queue `event` for dispatch on the main loop
    ///
    /// Never blocks. The keyboard state lives on the main loop, so key
    /// filtering uses the modifier snapshot carried in the event.
    pub fn post_event(&self, window: &Arc<PlatformWindow>, event: NativeEvent) -> PostOutcome {
        tracing::trace!(window = %window.id(), kind = event.kind(), "posting native event");

        if let (EventDetails::Key(key), Some(filter)) = (&event.details, &self.key_filter) {
            let modifiers = Modifiers::from_meta_state(event.meta_state);
            let key_event = KeyEvent::from_native(event.action, key, modifiers);
            if filter.filter_key_event(&key_event) {
                return PostOutcome::Filtered;
            }
        }

        let queued = QueuedEvent {
            window: Arc::clone(window),
            event,
        };
        match self.sender.send(queued) {
            Ok(()) => PostOutcome::Queued,
            Err(_) => {
                tracing::warn!(window = %window.id(), "event loop gone, dropping native event");
                PostOutcome::Disconnected
            }
        }
    }
}

impl EventQueue {
    /// Register the queue with the main loop
    ///
    /// Each event is handed to the loop data's [`InputDispatcher`].
    pub fn insert_into<'l, D>(
        self,
        handle: &LoopHandle<'l, D>,
    ) -> Result<RegistrationToken, QueueError>
    where
        D: AsMut<InputDispatcher> + 'l,
    {
        handle
            .insert_source(self.channel, |event, _, data: &mut D| match event {
                channel::Event::Msg(QueuedEvent { window, event }) => {
                    data.as_mut().dispatch_native_event(&window, &event);
                }
                channel::Event::Closed => {
                    tracing::debug!("all event posters dropped");
                }
            })
            .map_err(|e| QueueError::Insert(e.error))
    }
}
