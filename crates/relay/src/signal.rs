//! Cross-process "data changed" signal.
//!
//! The extension posts a named, payload-less broadcast; the main app listens
//! on the same name. Delivery is best-effort and signals coalesce: a burst of
//! posts may wake a listener only once.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use thiserror::Error;
use tokio::sync::broadcast;

/// Buffered signals per name before listeners start seeing lag.
const SIGNAL_BUFFER: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Signal center refused to post '{0}'")]
    PostFailed(String),
}

/// Subscription to one signal name.
pub struct SignalReceiver {
    name: String,
    rx: broadcast::Receiver<()>,
}

impl SignalReceiver {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for the next signal. Returns `None` once the center is gone.
    pub async fn recv(&mut self) -> Option<()> {
        match self.rx.recv().await {
            Ok(()) => Some(()),
            // Missed signals carry no payload; one wake-up covers them all.
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!("Coalesced {} '{}' signal(s)", skipped, self.name);
                Some(())
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

/// Named broadcast channel shared by the app and its extension.
pub trait SignalCenterTrait: Send + Sync {
    fn post(&self, name: &str) -> Result<(), SignalError>;

    fn subscribe(&self, name: &str) -> SignalReceiver;
}

/// In-process signal center.
///
/// Stands in for the platform notification center wherever both sides run in
/// one process (tests, simulators, the inspector).
#[derive(Default)]
pub struct LocalSignalCenter {
    channels: Mutex<HashMap<String, broadcast::Sender<()>>>,
}

impl LocalSignalCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, name: &str) -> broadcast::Sender<()> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(SIGNAL_BUFFER).0)
            .clone()
    }
}

impl SignalCenterTrait for LocalSignalCenter {
    fn post(&self, name: &str) -> Result<(), SignalError> {
        // Posting with nobody listening is not a failure; the signal is lost.
        let delivered = self.sender(name).send(()).unwrap_or(0);
        debug!("Posted '{}' to {} listener(s)", name, delivered);
        Ok(())
    }

    fn subscribe(&self, name: &str) -> SignalReceiver {
        SignalReceiver {
            name: name.to_string(),
            rx: self.sender(name).subscribe(),
        }
    }
}
