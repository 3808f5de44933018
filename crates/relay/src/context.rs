//! Relay context: the JS-facing surface of the FinanceKit bridge.
//!
//! One [`RelayContext`] owns every main-process component (dispatcher, live
//! monitor, background task scheduler, drain) and is handed to whoever needs
//! it. Nothing here is global, so independent contexts never share state.
//!
//! Request/response methods await the native call and hand back the typed
//! records unchanged. Data methods check authorization first and reject with
//! [`Error::Unauthorized`] without touching the native layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use tokio::task::JoinHandle;

use financekit_core::accounts::{validate_account_id, Account, AccountBalance};
use financekit_core::authorization::AuthorizationStatus;
use financekit_core::constants::CHANGE_TYPE_FETCH;
use financekit_core::events::{EventEmitter, EventName, RelayEvent, Subscription};
use financekit_core::native::{ChangeStreamTrait, FinanceStoreTrait};
use financekit_core::store::{
    ContainerResolverTrait, LastSyncInfo, SharedStateStore, SyncResource,
};
use financekit_core::transactions::{TransactionQuery, TransactionRecord};
use financekit_core::{Error, RelayConfig, Result};

use crate::dispatcher::UiDispatcher;
use crate::drain::{DrainReport, PendingChangeDrain};
use crate::extension::ExtensionRelay;
use crate::monitor::LiveMonitor;
use crate::scheduler::{
    BackgroundTaskHostTrait, BackgroundTaskScheduler, SchedulerError, TaskExpiration, TaskOutcome,
};
use crate::signal::SignalCenterTrait;

/// The platform collaborators a context is wired to.
#[derive(Clone)]
pub struct RelayHost {
    pub finance: Arc<dyn FinanceStoreTrait>,
    pub changes: Arc<dyn ChangeStreamTrait>,
    pub resolver: Arc<dyn ContainerResolverTrait>,
    pub tasks: Arc<dyn BackgroundTaskHostTrait>,
    pub signals: Arc<dyn SignalCenterTrait>,
}

pub struct RelayContext {
    config: RelayConfig,
    finance: Arc<dyn FinanceStoreTrait>,
    signals: Arc<dyn SignalCenterTrait>,
    store: Arc<SharedStateStore>,
    emitter: Arc<EventEmitter>,
    dispatcher: UiDispatcher,
    monitor: LiveMonitor,
    scheduler: Arc<BackgroundTaskScheduler>,
    drain: PendingChangeDrain,
    background: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl RelayContext {
    /// Wires a context. Must be called inside a tokio runtime: the UI
    /// dispatcher task is spawned here.
    pub fn new(config: RelayConfig, host: RelayHost) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(SharedStateStore::new(
            host.resolver.clone(),
            config.group_identifier(),
        ));
        if !store.is_available() {
            warn!(
                "App group '{}' is not reachable; background changes will not be persisted",
                config.group_identifier()
            );
        }

        let emitter = Arc::new(EventEmitter::new());
        let (dispatcher, dispatcher_handle) = UiDispatcher::spawn(emitter.clone());
        let monitor = LiveMonitor::new(host.changes.clone(), dispatcher.clone());
        let scheduler = Arc::new(BackgroundTaskScheduler::new(
            &config,
            host.tasks.clone(),
            host.finance.clone(),
            host.changes.clone(),
            store.clone(),
            dispatcher.clone(),
        ));
        let drain = PendingChangeDrain::new(store.clone(), dispatcher.clone());

        info!(
            "FinanceKit relay ready for '{}' (app group '{}')",
            config.bundle_identifier,
            config.group_identifier()
        );

        Ok(Self {
            config,
            finance: host.finance,
            signals: host.signals,
            store,
            emitter,
            dispatcher,
            monitor,
            scheduler,
            drain,
            background: Mutex::new(vec![dispatcher_handle]),
            started: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SharedStateStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &Arc<BackgroundTaskScheduler> {
        &self.scheduler
    }

    /// The relay the extension process runs, sharing this context's store
    /// and signal center.
    pub fn extension_relay(&self) -> ExtensionRelay {
        ExtensionRelay::from_config(&self.config, self.store.clone(), self.signals.clone())
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Process start: registers the background task, schedules the first
    /// run and starts listening for extension signals.
    ///
    /// Does nothing when background delivery is disabled or the context was
    /// already started.
    pub fn start(&self) -> std::result::Result<(), SchedulerError> {
        if !self.config.enable_background_delivery {
            info!("Background delivery disabled; not registering background sync");
            return Ok(());
        }
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Relay already started");
            return Ok(());
        }
        if let Err(e) = self.scheduler.register() {
            self.started.store(false, Ordering::SeqCst);
            return Err(e);
        }
        if let Err(e) = self.scheduler.schedule() {
            warn!("Initial background sync not scheduled: {}", e);
        }
        let receiver = self.signals.subscribe(&self.config.signal_name());
        let listener = self.scheduler.listen(receiver);
        self.lock_background().push(listener);
        Ok(())
    }

    /// Host event: the app became active. Drains background-captured batches.
    pub async fn on_app_became_active(&self) -> DrainReport {
        debug!("App became active, draining pending changes");
        self.drain.drain().await
    }

    /// Host event: the OS runs the background task.
    pub async fn run_background_task(&self, expiration: TaskExpiration) -> TaskOutcome {
        self.scheduler.run(expiration).await
    }

    /// Stops monitoring, closes the bridge and ends background tasks.
    pub async fn shutdown(&self) {
        self.monitor.stop().await;
        self.dispatcher.flush().await;
        self.emitter.close();
        for handle in self.lock_background().drain(..) {
            handle.abort();
        }
        info!("FinanceKit relay shut down");
    }

    fn lock_background(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.background.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Listeners ────────────────────────────────────────────────────────────

    pub fn add_listener<F>(&self, event: EventName, listener: F) -> Subscription
    where
        F: Fn(EventName, &serde_json::Value) + Send + Sync + 'static,
    {
        self.emitter.add_listener(event, listener)
    }

    /// Subscribes by the event name JS passes, e.g. `onTransactionsChanged`.
    pub fn add_listener_by_name<F>(&self, event: &str, listener: F) -> Result<Subscription>
    where
        F: Fn(EventName, &serde_json::Value) + Send + Sync + 'static,
    {
        let event: EventName = event.parse()?;
        Ok(self.emitter.add_listener(event, listener))
    }

    pub fn remove_listener(&self, subscription: &Subscription) -> bool {
        self.emitter.remove_listener(subscription)
    }

    pub fn remove_all_listeners(&self, event: EventName) {
        self.emitter.remove_all_listeners(event)
    }

    /// Waits until every event queued so far has reached the listeners.
    pub async fn flush_events(&self) {
        self.dispatcher.flush().await
    }

    // ── Authorization ────────────────────────────────────────────────────────

    /// Prompts for access. Emits `onAuthorizationStatusChanged` when the
    /// outcome differs from the status before the prompt.
    pub async fn request_authorization(&self) -> Result<AuthorizationStatus> {
        let before = self.finance.authorization_status().await?;
        let after = self.finance.request_authorization().await?;
        if after != before {
            info!(
                "Authorization status changed: {} -> {}",
                before.as_str(),
                after.as_str()
            );
            if let Err(e) = self
                .dispatcher
                .dispatch(RelayEvent::authorization_status_changed(after))
            {
                warn!("Authorization change not delivered: {}", e);
            }
        }
        Ok(after)
    }

    pub async fn get_authorization_status(&self) -> Result<AuthorizationStatus> {
        Ok(self.finance.authorization_status().await?)
    }

    async fn ensure_authorized(&self) -> Result<()> {
        let status = self.finance.authorization_status().await?;
        if !status.is_authorized() {
            debug!("Rejecting data call, authorization is {}", status.as_str());
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    // ── Data ─────────────────────────────────────────────────────────────────

    pub async fn get_accounts(&self) -> Result<Vec<Account>> {
        self.ensure_authorized().await?;
        let accounts = self.finance.accounts().await?;
        self.store.touch_marker(SyncResource::Accounts, CHANGE_TYPE_FETCH);
        Ok(accounts)
    }

    pub async fn get_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Vec<TransactionRecord>> {
        query.validate()?;
        self.ensure_authorized().await?;
        let transactions = self.finance.transactions(&query).await?;
        self.store.touch_marker(SyncResource::Transactions, CHANGE_TYPE_FETCH);
        Ok(transactions)
    }

    pub async fn get_balances(&self) -> Result<Vec<AccountBalance>> {
        self.ensure_authorized().await?;
        let balances = self.finance.balances().await?;
        self.store.touch_marker(SyncResource::Balances, CHANGE_TYPE_FETCH);
        Ok(balances)
    }

    pub async fn get_balance_for_account(&self, account_id: &str) -> Result<AccountBalance> {
        validate_account_id(account_id)?;
        let balance = self
            .get_balances()
            .await?
            .into_iter()
            .find(|b| b.account_id == account_id)
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;
        Ok(balance)
    }

    // ── Monitoring ───────────────────────────────────────────────────────────

    /// Starts forwarding live changes, replacing any running session.
    ///
    /// With no ids every account is monitored. The same selection drives the
    /// background task.
    pub async fn start_monitoring_transactions(
        &self,
        account_ids: Option<Vec<String>>,
    ) -> Result<()> {
        if let Some(ids) = &account_ids {
            for id in ids {
                validate_account_id(id)?;
            }
        }
        self.ensure_authorized().await?;

        let targets = match &account_ids {
            Some(ids) => ids.clone(),
            None => self
                .finance
                .accounts()
                .await?
                .into_iter()
                .map(|a| a.id)
                .collect(),
        };
        self.scheduler.set_monitored_accounts(account_ids);
        self.monitor.start(targets).await;
        Ok(())
    }

    /// Stops live forwarding. Returns false when nothing was monitored.
    ///
    /// The background task goes back to covering every account.
    pub async fn stop_monitoring_transactions(&self) -> bool {
        self.scheduler.set_monitored_accounts(None);
        self.monitor.stop().await
    }

    pub async fn is_monitoring(&self) -> bool {
        self.monitor.is_monitoring().await
    }

    /// Drops the native resumption state of an account; its next batch is a
    /// full resync.
    pub async fn clear_history_token(&self, account_id: &str) -> Result<()> {
        validate_account_id(account_id)?;
        self.ensure_authorized().await?;
        self.finance.clear_history_token(account_id).await?;
        info!("Cleared history token for account {}", account_id);
        Ok(())
    }

    // ── Shared state ─────────────────────────────────────────────────────────

    /// Points the shared state store at another app group.
    pub fn set_app_group_identifier(&self, identifier: &str) -> Result<()> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(Error::unknown("app group identifier must not be empty"));
        }
        self.store.set_group_identifier(identifier);
        if !self.store.is_available() {
            warn!("App group '{}' is not reachable", identifier);
        }
        Ok(())
    }

    /// Manual trigger of the pending-change drain.
    pub async fn process_pending_changes(&self) -> DrainReport {
        self.drain.drain().await
    }

    pub fn get_last_sync_info(&self) -> LastSyncInfo {
        self.store.last_sync_info()
    }
}
