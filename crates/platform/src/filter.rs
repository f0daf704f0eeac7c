//! Pluggable key event filter
//!
//! Observers register interest in a key code. A key event with at least one
//! registration is posted to every interested observer and withheld from
//! normal toolkit delivery. Posting never waits for the observer.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use crate::key::KeyEvent;
use crate::keys::KeyCode;

/// Destination for filtered key events
pub trait KeyEventSink: Send + Sync {
    /// Enqueue the event for the observer; must not block
    fn post(&self, event: KeyEvent);
}

impl KeyEventSink for calloop::channel::Sender<KeyEvent> {
    fn post(&self, event: KeyEvent) {
        if self.send(event).is_err() {
            tracing::debug!("key filter observer loop is gone, dropping event");
        }
    }
}

impl KeyEventSink for mpsc::Sender<KeyEvent> {
    fn post(&self, event: KeyEvent) {
        if self.send(event).is_err() {
            tracing::debug!("key filter observer receiver dropped, dropping event");
        }
    }
}

/// Observer identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a key filter observer
///
/// Clones share identity, so a clone can be used to unregister.
#[derive(Clone)]
pub struct KeyObserver {
    id: ObserverId,
    sink: Arc<dyn KeyEventSink>,
}

impl KeyObserver {
    pub fn new(sink: impl KeyEventSink + 'static) -> Self {
        Self {
            id: ObserverId(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed)),
            sink: Arc::new(sink),
        }
    }

    /// Observer backed by a standard channel
    pub fn channel() -> (Self, mpsc::Receiver<KeyEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    fn post(&self, event: KeyEvent) {
        self.sink.post(event);
    }
}

impl PartialEq for KeyObserver {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for KeyObserver {}

impl fmt::Debug for KeyObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyObserver").field(&self.id.0).finish()
    }
}

/// Key code to observers, in registration order, duplicates kept
#[derive(Debug, Default)]
pub struct PluggableKeyFilter {
    filters: Mutex<HashMap<KeyCode, Vec<KeyObserver>>>,
}

impl PluggableKeyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fn filters(&self) -> MutexGuard<'_, HashMap<KeyCode, Vec<KeyObserver>>> {
        // A poisoned map is still structurally valid
        self.filters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Post `event` to every observer of its key
    ///
    /// Returns whether the event is suppressed from normal delivery, which
    /// is the case as soon as one observer is registered.
    pub fn filter_key_event(&self, event: &KeyEvent) -> bool {
        let filters = self.filters();
        let Some(observers) = filters.get(&event.key).filter(|o| !o.is_empty()) else {
            return false;
        };

        tracing::debug!(
            key = event.key.raw(),
            modifiers = ?event.modifiers,
            observers = observers.len(),
            "key event filtered"
        );

        for observer in observers {
            observer.post(event.clone());
        }
        true
    }

    /// Register `observer` for `key`; the same pair may be registered twice
    pub fn install_key_event_filter_object(&self, key: KeyCode, observer: &KeyObserver) -> bool {
        let mut filters = self.filters();
        filters.entry(key).or_default().push(observer.clone());
        tracing::debug!(key = key.raw(), observer = ?observer, "installed key filter");
        true
    }

    /// Remove every registration of `observer`, across all keys
    pub fn remove_key_event_filter_object(&self, observer: &KeyObserver) -> bool {
        let mut filters = self.filters();
        let mut removed = false;
        filters.retain(|_, observers| {
            let before = observers.len();
            observers.retain(|o| o != observer);
            removed |= observers.len() != before;
            !observers.is_empty()
        });
        if removed {
            tracing::debug!(observer = ?observer, "removed key filter");
        }
        removed
    }

    /// Number of registrations for `key`
    pub fn registered_count(&self, key: KeyCode) -> usize {
        self.filters().get(&key).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyEventKind;
    use crate::modifiers::Modifiers;

    fn key_event(key: u32) -> KeyEvent {
        KeyEvent {
            timestamp_ms: 7,
            kind: KeyEventKind::Press,
            key: KeyCode(key),
            modifiers: Modifiers::empty(),
            scan_code: 0,
            text: String::new(),
        }
    }

    #[test]
    fn unregistered_key_is_not_filtered() {
        let filter = PluggableKeyFilter::new();
        assert!(!filter.filter_key_event(&key_event(65)));
    }

    #[test]
    fn duplicate_registrations_each_receive_the_event() {
        let filter = PluggableKeyFilter::new();
        let (observer, rx) = KeyObserver::channel();

        assert!(filter.install_key_event_filter_object(KeyCode(65), &observer));
        assert!(filter.install_key_event_filter_object(KeyCode(65), &observer));
        assert_eq!(filter.registered_count(KeyCode(65)), 2);

        assert!(filter.filter_key_event(&key_event(65)));
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn removal_spans_all_keys_and_is_idempotent() {
        let filter = PluggableKeyFilter::new();
        let (a, _rx_a) = KeyObserver::channel();
        let (b, _rx_b) = KeyObserver::channel();

        filter.install_key_event_filter_object(KeyCode(65), &a);
        filter.install_key_event_filter_object(KeyCode(66), &a);
        filter.install_key_event_filter_object(KeyCode(66), &b);

        assert!(filter.remove_key_event_filter_object(&a));
        assert_eq!(filter.registered_count(KeyCode(65)), 0);
        assert_eq!(filter.registered_count(KeyCode(66)), 1);
        assert!(!filter.remove_key_event_filter_object(&a));

        assert!(!filter.filter_key_event(&key_event(65)));
        assert!(filter.filter_key_event(&key_event(66)));
    }

    #[test]
    fn observer_clones_share_identity() {
        let filter = PluggableKeyFilter::new();
        let (observer, _rx) = KeyObserver::channel();
        let clone = observer.clone();

        filter.install_key_event_filter_object(KeyCode(1), &observer);
        assert!(filter.remove_key_event_filter_object(&clone));
        assert_ne!(observer.id(), KeyObserver::channel().0.id());
    }

    #[test]
    fn dropped_receiver_still_counts_as_filtered() {
        let filter = PluggableKeyFilter::new();
        let (observer, rx) = KeyObserver::channel();
        filter.install_key_event_filter_object(KeyCode(65), &observer);
        drop(rx);

        assert!(filter.filter_key_event(&key_event(65)));
    }

    #[test]
    fn calloop_channel_observer_drains_on_the_loop() {
        let mut event_loop: calloop::EventLoop<'static, Vec<KeyEvent>> =
            calloop::EventLoop::try_new().unwrap();
        let (sender, channel) = calloop::channel::channel();
        event_loop
            .handle()
            .insert_source(channel, |event, _, seen: &mut Vec<KeyEvent>| {
                if let calloop::channel::Event::Msg(key) = event {
                    seen.push(key);
                }
            })
            .unwrap();

        let filter = PluggableKeyFilter::new();
        let observer = KeyObserver::new(sender);
        filter.install_key_event_filter_object(KeyCode(65), &observer);

        assert!(filter.filter_key_event(&key_event(65)));
        assert!(!filter.filter_key_event(&key_event(66)));

        let mut seen = Vec::new();
        event_loop
            .dispatch(Some(std::time::Duration::ZERO), &mut seen)
            .unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].key, KeyCode(65));
    }
}
