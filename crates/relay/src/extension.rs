//! Change relay running inside the background delivery extension.
//!
//! The extension only records that a change happened and signals the main
//! app. It never fetches the delta itself: the OS may end the extension
//! before a fetch completes.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use financekit_core::constants::CHANGE_TYPE_BACKGROUND_DELIVERY;
use financekit_core::store::{SharedStateStore, SyncResource};
use financekit_core::RelayConfig;

use crate::signal::SignalCenterTrait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Notifying,
}

pub struct ExtensionRelay {
    store: Arc<SharedStateStore>,
    signals: Arc<dyn SignalCenterTrait>,
    signal_name: String,
    state: Mutex<RelayState>,
}

impl ExtensionRelay {
    pub fn new(
        store: Arc<SharedStateStore>,
        signals: Arc<dyn SignalCenterTrait>,
        signal_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            signals,
            signal_name: signal_name.into(),
            state: Mutex::new(RelayState::Idle),
        }
    }

    /// Builds a relay posting on the name derived from the app's bundle id.
    pub fn from_config(
        config: &RelayConfig,
        store: Arc<SharedStateStore>,
        signals: Arc<dyn SignalCenterTrait>,
    ) -> Self {
        Self::new(store, signals, config.signal_name())
    }

    pub fn state(&self) -> RelayState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn signal_name(&self) -> &str {
        &self.signal_name
    }

    /// Host callback: the OS reports that `resources` changed.
    ///
    /// Returns whether the signal was posted. A failed post is only logged;
    /// the change is picked up by the next callback or the next periodic
    /// background task.
    pub fn on_data_changed(&self, resources: &[SyncResource]) -> bool {
        self.set_state(RelayState::Notifying);

        for resource in resources {
            self.store.touch_marker(*resource, CHANGE_TYPE_BACKGROUND_DELIVERY);
        }

        let posted = match self.signals.post(&self.signal_name) {
            Ok(()) => {
                debug!(
                    "Extension signalled '{}' for {} resource(s)",
                    self.signal_name,
                    resources.len()
                );
                true
            }
            Err(e) => {
                warn!("Extension could not signal the app: {}", e);
                false
            }
        };

        self.set_state(RelayState::Idle);
        posted
    }

    fn set_state(&self, next: RelayState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }
}
