//! Live monitor for the foreground app.
//!
//! One task per monitored account consumes the native change stream in
//! monitoring mode and forwards each non-empty batch straight to JS. Nothing
//! goes through the shared state store.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use financekit_core::changes::ChangeBatch;
use financekit_core::events::RelayEvent;
use financekit_core::native::{ChangeStreamTrait, NativeResult};

use crate::dispatcher::UiDispatcher;

struct MonitorSession {
    account_ids: Vec<String>,
    cancel: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

pub struct LiveMonitor {
    changes: Arc<dyn ChangeStreamTrait>,
    dispatcher: UiDispatcher,
    session: Mutex<Option<MonitorSession>>,
}

impl LiveMonitor {
    pub fn new(changes: Arc<dyn ChangeStreamTrait>, dispatcher: UiDispatcher) -> Self {
        Self {
            changes,
            dispatcher,
            session: Mutex::new(None),
        }
    }

    /// Starts monitoring `account_ids`, replacing any running session.
    pub async fn start(&self, account_ids: Vec<String>) {
        let mut session = self.session.lock().await;
        if let Some(previous) = session.take() {
            debug!("Replacing monitoring session for {:?}", previous.account_ids);
            shutdown(previous).await;
        }

        let (cancel, cancel_rx) = watch::channel(false);
        let tasks = account_ids
            .iter()
            .map(|account_id| {
                let stream = self.changes.monitor_changes(account_id);
                tokio::spawn(forward_changes(
                    account_id.clone(),
                    stream,
                    cancel_rx.clone(),
                    self.dispatcher.clone(),
                ))
            })
            .collect();

        info!("Monitoring transactions for {} account(s)", account_ids.len());
        *session = Some(MonitorSession {
            account_ids,
            cancel,
            tasks,
        });
    }

    /// Cancels every open stream and waits for the account tasks to finish.
    ///
    /// Returns false when nothing was being monitored. Events queued on the
    /// dispatcher before the call may still reach JS; no new ones are queued
    /// once this returns.
    pub async fn stop(&self) -> bool {
        let Some(session) = self.session.lock().await.take() else {
            return false;
        };
        info!("Stopping transaction monitoring for {:?}", session.account_ids);
        shutdown(session).await;
        true
    }

    pub async fn is_monitoring(&self) -> bool {
        self.session.lock().await.is_some()
    }

    pub async fn monitored_accounts(&self) -> Option<Vec<String>> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.account_ids.clone())
    }
}

async fn shutdown(session: MonitorSession) {
    let _ = session.cancel.send(true);
    for task in session.tasks {
        if let Err(e) = task.await {
            warn!("Monitoring task ended abnormally: {}", e);
        }
    }
}

async fn forward_changes(
    account_id: String,
    mut stream: BoxStream<'static, NativeResult<ChangeBatch>>,
    mut cancel: watch::Receiver<bool>,
    dispatcher: UiDispatcher,
) {
    loop {
        let next = tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
                continue;
            }
            item = stream.next() => item,
        };

        // Cancellation may land while the item was being produced.
        if *cancel.borrow() {
            break;
        }

        match next {
            Some(Ok(batch)) if batch.is_empty() => {}
            Some(Ok(batch)) => {
                debug!(
                    "Live change for account {}: {} change(s)",
                    account_id,
                    batch.change_count()
                );
                if let Err(e) = dispatcher.dispatch(RelayEvent::transactions_changed(batch)) {
                    warn!("Stopping monitor for account {}: {}", account_id, e);
                    break;
                }
            }
            Some(Err(e)) => {
                warn!("Change stream for account {} failed: {}", account_id, e);
                break;
            }
            None => {
                debug!("Change stream for account {} ended", account_id);
                break;
            }
        }
    }
}
