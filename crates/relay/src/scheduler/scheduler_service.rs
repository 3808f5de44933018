use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use financekit_core::constants::CHANGE_TYPE_BACKGROUND_TASK;
use financekit_core::events::{DataChangeSource, RelayEvent};
use financekit_core::native::{ChangeStreamTrait, FinanceStoreTrait, NativeResult};
use financekit_core::store::{SharedStateStore, SyncResource};
use financekit_core::RelayConfig;

use super::{
    BackgroundTaskHostTrait, SchedulerError, TaskExpiration, TaskOutcome, TaskRequest, TaskState,
};
use crate::dispatcher::UiDispatcher;
use crate::signal::SignalReceiver;

#[derive(Default)]
struct SchedulerState {
    state: TaskState,
    running: usize,
}

/// Schedules and runs the background sync task.
///
/// Runs may overlap (the OS does not promise otherwise). Each run writes
/// uniquely named pending files, so a duplicate run only produces duplicate
/// batches, which the drain delivers at-least-once anyway.
pub struct BackgroundTaskScheduler {
    identifier: String,
    delay: Duration,
    host: Arc<dyn BackgroundTaskHostTrait>,
    finance: Arc<dyn FinanceStoreTrait>,
    changes: Arc<dyn ChangeStreamTrait>,
    store: Arc<SharedStateStore>,
    dispatcher: UiDispatcher,
    monitored: RwLock<Option<Vec<String>>>,
    state: Mutex<SchedulerState>,
}

impl BackgroundTaskScheduler {
    pub fn new(
        config: &RelayConfig,
        host: Arc<dyn BackgroundTaskHostTrait>,
        finance: Arc<dyn FinanceStoreTrait>,
        changes: Arc<dyn ChangeStreamTrait>,
        store: Arc<SharedStateStore>,
        dispatcher: UiDispatcher,
    ) -> Self {
        Self {
            identifier: config.task_identifier(),
            delay: config.reschedule_delay(),
            host,
            finance,
            changes,
            store,
            dispatcher,
            monitored: RwLock::new(None),
            state: Mutex::new(SchedulerState::default()),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> TaskState {
        self.lock_state().state
    }

    /// Registers the task handler with the host. Calling it again is a no-op.
    pub fn register(&self) -> Result<(), SchedulerError> {
        let mut state = self.lock_state();
        if state.state != TaskState::Unregistered {
            debug!("Background task '{}' already registered", self.identifier);
            return Ok(());
        }
        self.host.register(&self.identifier)?;
        state.state = TaskState::Registered;
        info!("Registered background task '{}'", self.identifier);
        Ok(())
    }

    /// Asks the OS to run the task no earlier than the reschedule delay.
    pub fn schedule(&self) -> Result<(), SchedulerError> {
        let mut state = self.lock_state();
        if state.state == TaskState::Unregistered {
            return Err(SchedulerError::NotRegistered(self.identifier.clone()));
        }
        let earliest_begin = chrono::Duration::from_std(self.delay)
            .ok()
            .and_then(|delay| Utc::now().checked_add_signed(delay))
            .ok_or_else(|| SchedulerError::DelayOutOfRange {
                identifier: self.identifier.clone(),
                delay_secs: self.delay.as_secs(),
            })?;
        let request = TaskRequest {
            identifier: self.identifier.clone(),
            earliest_begin,
            requires_network_connectivity: false,
            requires_external_power: false,
        };
        self.host.submit(request)?;
        if state.running == 0 {
            state.state = TaskState::Scheduled;
        }
        debug!("Background task '{}' scheduled in {:?}", self.identifier, self.delay);
        Ok(())
    }

    /// Host event: the extension signalled that a delta may exist.
    pub fn on_signal(&self) {
        if let Err(e) = self.schedule() {
            warn!("Could not schedule background sync after signal: {}", e);
        }
    }

    /// Accounts the next runs fetch. `None` means every account.
    pub fn set_monitored_accounts(&self, account_ids: Option<Vec<String>>) {
        *self.monitored.write().unwrap_or_else(|e| e.into_inner()) = account_ids;
    }

    pub fn monitored_accounts(&self) -> Option<Vec<String>> {
        self.monitored
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Listens for extension signals until the signal center goes away.
    ///
    /// Each signal notifies JS and schedules a background sync.
    pub fn listen(self: &Arc<Self>, mut signals: SignalReceiver) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            info!("Listening for '{}'", signals.name());
            while signals.recv().await.is_some() {
                let event = RelayEvent::finance_data_changed(DataChangeSource::Extension);
                if let Err(e) = scheduler.dispatcher.dispatch(event) {
                    debug!("Data change notification not delivered: {}", e);
                }
                scheduler.on_signal();
            }
            info!("Signal listener for '{}' stopped", signals.name());
        })
    }

    /// Host event: the OS is running the task.
    ///
    /// Re-schedules the next occurrence first so the relay keeps itself
    /// alive, then persists the delta of every account. A failing account is
    /// logged and skipped; the run still succeeds. Expiration, or failing to
    /// list accounts, marks the run failed. Batches written before an
    /// expiration are still announced.
    pub async fn run(&self, mut expiration: TaskExpiration) -> TaskOutcome {
        self.begin_run();
        let rescheduled = match self.schedule() {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not schedule next background sync: {}", e);
                false
            }
        };

        // Counts live here so work persisted before an expiration is still
        // reported and announced.
        let mut outcome = TaskOutcome {
            success: true,
            ..TaskOutcome::default()
        };
        let watcher = expiration.clone();
        let finished = tokio::select! {
            biased;
            _ = expiration.expired() => false,
            _ = self.sync_accounts(&watcher, &mut outcome) => true,
        };
        if !finished {
            warn!(
                "Background task '{}' expired after {} account(s)",
                self.identifier, outcome.accounts_processed
            );
            outcome.success = false;
            outcome.expired = true;
        }

        if outcome.batches_written > 0 {
            self.store.touch_marker(SyncResource::Transactions, CHANGE_TYPE_BACKGROUND_TASK);
            let event = RelayEvent::finance_data_changed(DataChangeSource::Background);
            if let Err(e) = self.dispatcher.dispatch(event) {
                debug!("Data change notification not delivered: {}", e);
            }
        }

        self.end_run(rescheduled);
        info!(
            "Background task '{}' finished: success={}, {} batch(es), {} failed account(s)",
            self.identifier,
            outcome.success,
            outcome.batches_written,
            outcome.failed_accounts.len()
        );
        outcome
    }

    async fn sync_accounts(&self, expiration: &TaskExpiration, outcome: &mut TaskOutcome) {
        let account_ids = match self.target_accounts().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Background sync could not list accounts: {}", e);
                outcome.success = false;
                return;
            }
        };

        for account_id in account_ids {
            if expiration.is_expired() {
                outcome.success = false;
                outcome.expired = true;
                return;
            }
            match self.changes.fetch_changes(&account_id).await {
                Ok(batch) if batch.is_empty() => {
                    debug!("No background changes for account {}", account_id);
                }
                Ok(batch) => {
                    if self.store.write_pending(&batch).is_some() {
                        outcome.batches_written += 1;
                    }
                }
                Err(e) => {
                    warn!("Background fetch for account {} failed: {}", account_id, e);
                    outcome.failed_accounts.push(account_id);
                    continue;
                }
            }
            outcome.accounts_processed += 1;
        }
    }

    async fn target_accounts(&self) -> NativeResult<Vec<String>> {
        if let Some(ids) = self.monitored_accounts().filter(|ids| !ids.is_empty()) {
            return Ok(ids);
        }
        let accounts = self.finance.accounts().await?;
        Ok(accounts.into_iter().map(|a| a.id).collect())
    }

    fn begin_run(&self) {
        let mut state = self.lock_state();
        state.running += 1;
        state.state = TaskState::Running;
    }

    fn end_run(&self, rescheduled: bool) {
        let mut state = self.lock_state();
        state.running = state.running.saturating_sub(1);
        if state.running == 0 {
            state.state = if rescheduled {
                TaskState::Scheduled
            } else {
                TaskState::Idle
            };
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
