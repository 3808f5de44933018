//! Relay event sink trait and implementations.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::RelayEvent;

/// Why an event could not be handed to JS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("JS bridge is closed")]
    BridgeClosed,

    #[error("UI dispatcher is not running")]
    DispatcherClosed,

    #[error("Failed to serialize event payload: {0}")]
    Serialization(String),

    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Trait for handing relay events to the JS bridge.
///
/// # Design Rules
///
/// - `emit()` must be fast and non-blocking (no native calls, no disk I/O)
/// - `emit()` is only ever called from the UI-affine context
/// - `Ok(())` means the bridge accepted the event; pending batches are only
///   deleted after that
pub trait RelayEventSink: Send + Sync {
    /// Emit a single event.
    fn emit(&self, event: RelayEvent) -> Result<(), EmitError>;
}

/// No-op implementation for tests or contexts that don't need events.
#[derive(Clone, Default)]
pub struct NoOpEventSink;

impl RelayEventSink for NoOpEventSink {
    fn emit(&self, _event: RelayEvent) -> Result<(), EmitError> {
        Ok(())
    }
}

/// Mock sink for testing - collects emitted events.
///
/// Can be switched into a failing mode to simulate a bridge that rejects
/// events.
#[derive(Clone, Default)]
pub struct MockEventSink {
    events: Arc<Mutex<Vec<RelayEvent>>>,
    failure: Arc<Mutex<Option<EmitError>>>,
}

impl MockEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `emit()` fail with `error`.
    pub fn fail_with(&self, error: EmitError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Lets subsequent `emit()` calls succeed again.
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<RelayEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clears collected events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Returns the number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns true if no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl RelayEventSink for MockEventSink {
    fn emit(&self, event: RelayEvent) -> Result<(), EmitError> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
