//! Listener registry backing the JS `addListener`/`removeListener` surface.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use log::debug;

use super::{EmitError, EventName, RelayEvent, RelayEventSink};

/// Callback receiving the event name and its JSON payload.
pub type Listener = Arc<dyn Fn(EventName, &serde_json::Value) + Send + Sync>;

/// Handle returned by [`EventEmitter::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub event: EventName,
    id: u64,
}

/// Fans relay events out to registered listeners.
///
/// Emitting with no listener registered succeeds and drops the event, the
/// same as the bridge does. Once [`EventEmitter::close`] is called every
/// emission fails with [`EmitError::BridgeClosed`].
#[derive(Default)]
pub struct EventEmitter {
    listeners: RwLock<HashMap<EventName, Vec<(u64, Listener)>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<F>(&self, event: EventName, listener: F) -> Subscription
    where
        F: Fn(EventName, &serde_json::Value) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners
            .entry(event)
            .or_default()
            .push((id, Arc::new(listener)));
        debug!("Listener {} added for {}", id, event.as_str());
        Subscription { event, id }
    }

    /// Removes one listener. Returns false if it was already gone.
    pub fn remove_listener(&self, subscription: &Subscription) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let Some(entries) = listeners.get_mut(&subscription.event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(id, _)| *id != subscription.id);
        before != entries.len()
    }

    pub fn remove_all_listeners(&self, event: EventName) {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.remove(&event);
    }

    pub fn listener_count(&self, event: EventName) -> usize {
        let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        listeners.get(&event).map(Vec::len).unwrap_or(0)
    }

    /// Marks the bridge as torn down.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl RelayEventSink for EventEmitter {
    fn emit(&self, event: RelayEvent) -> Result<(), EmitError> {
        if self.is_closed() {
            return Err(EmitError::BridgeClosed);
        }
        let name = event.name();
        let payload = event
            .payload()
            .map_err(|e| EmitError::Serialization(e.to_string()))?;

        // Snapshot so listeners may (un)subscribe while being called.
        let targets: Vec<Listener> = {
            let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
            listeners
                .get(&name)
                .map(|entries| entries.iter().map(|(_, l)| l.clone()).collect())
                .unwrap_or_default()
        };
        for listener in targets {
            listener(name, &payload);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::ChangeBatch;
    use crate::events::DataChangeSource;
    use std::sync::Mutex;

    type Seen = Arc<Mutex<Vec<serde_json::Value>>>;

    fn recorder() -> (
        Seen,
        impl Fn(EventName, &serde_json::Value) + Send + Sync + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |_name: EventName, payload: &serde_json::Value| {
            sink.lock().unwrap().push(payload.clone())
        })
    }

    #[test]
    fn test_routes_by_event_name() {
        let emitter = EventEmitter::new();
        let (tx_seen, tx_listener) = recorder();
        let (data_seen, data_listener) = recorder();
        emitter.add_listener(EventName::TransactionsChanged, tx_listener);
        emitter.add_listener(EventName::FinanceDataChanged, data_listener);

        emitter
            .emit(RelayEvent::transactions_changed(ChangeBatch::at("acc", 3)))
            .unwrap();

        assert_eq!(tx_seen.lock().unwrap().len(), 1);
        assert_eq!(tx_seen.lock().unwrap()[0]["accountId"], "acc");
        assert!(data_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_listener_stops_delivery() {
        let emitter = EventEmitter::new();
        let (seen, listener) = recorder();
        let sub = emitter.add_listener(EventName::FinanceDataChanged, listener);
        assert_eq!(emitter.listener_count(EventName::FinanceDataChanged), 1);

        assert!(emitter.remove_listener(&sub));
        assert!(!emitter.remove_listener(&sub));

        emitter
            .emit(RelayEvent::finance_data_changed(DataChangeSource::Background))
            .unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_emit_without_listeners_succeeds() {
        let emitter = EventEmitter::new();
        assert!(emitter
            .emit(RelayEvent::finance_data_changed(DataChangeSource::Extension))
            .is_ok());
    }

    #[test]
    fn test_closed_bridge_rejects() {
        let emitter = EventEmitter::new();
        emitter.close();

        let result = emitter.emit(RelayEvent::transactions_changed(ChangeBatch::at("acc", 1)));
        assert_eq!(result, Err(EmitError::BridgeClosed));
    }
}
