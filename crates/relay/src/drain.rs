//! Pending-change drain.
//!
//! Hands every batch a background task left in the shared state store to JS,
//! deleting each file only after the bridge accepted it. A crash between the
//! two steps re-delivers the batch on the next drain: delivery is
//! at-least-once, and listeners must tolerate duplicates.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Mutex;

use financekit_core::events::RelayEvent;
use financekit_core::store::SharedStateStore;

use crate::dispatcher::UiDispatcher;

/// What one drain pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Batches handed to JS and removed from the store
    pub emitted: usize,
    /// Files that could not be parsed; left in place
    pub corrupt: Vec<String>,
    /// Files whose emission (or deletion) failed; left in place
    pub failed: Vec<String>,
}

impl DrainReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty() && self.failed.is_empty()
    }
}

pub struct PendingChangeDrain {
    store: Arc<SharedStateStore>,
    dispatcher: UiDispatcher,
    // Activation and manual triggers may overlap; one pass at a time.
    pass: Mutex<()>,
}

impl PendingChangeDrain {
    pub fn new(store: Arc<SharedStateStore>, dispatcher: UiDispatcher) -> Self {
        Self {
            store,
            dispatcher,
            pass: Mutex::new(()),
        }
    }

    /// Runs one drain pass over every pending file.
    ///
    /// Each file is visited once per pass: a corrupt or refused file is not
    /// retried until the next pass, and never deleted.
    pub async fn drain(&self) -> DrainReport {
        let _pass = self.pass.lock().await;
        let files = self.store.list_pending();
        let mut report = DrainReport::default();
        if files.is_empty() {
            debug!("No pending changes to drain");
            return report;
        }

        for file in files {
            let name = file.file_name();
            let batch = match self.store.read_pending(&file) {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("Leaving unreadable pending file {} in place: {}", name, e);
                    report.corrupt.push(name);
                    continue;
                }
            };

            let event = RelayEvent::transactions_changed(batch);
            if let Err(e) = self.dispatcher.dispatch_confirmed(event).await {
                warn!("Pending file {} not delivered, keeping it: {}", name, e);
                report.failed.push(name);
                continue;
            }

            if self.store.delete_pending(&file) {
                report.emitted += 1;
            } else {
                // Delivered but still on disk: it will be delivered again.
                report.failed.push(name);
            }
        }

        info!(
            "Drained pending changes: {} emitted, {} corrupt, {} failed",
            report.emitted,
            report.corrupt.len(),
            report.failed.len()
        );
        report
    }
}
