//! Tests for the background task scheduler, driven by synthetic host events.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::BoxStream;
use tempfile::TempDir;

use financekit_core::accounts::{Account, AccountKind};
use financekit_core::changes::ChangeBatch;
use financekit_core::events::{DataChangeSource, MockEventSink, RelayEvent};
use financekit_core::native::mock::MockFinanceKit;
use financekit_core::native::{ChangeStreamTrait, NativeResult};
use financekit_core::store::{DirectoryContainerResolver, SharedStateStore, SyncResource};
use financekit_core::RelayConfig;

use super::*;
use crate::dispatcher::UiDispatcher;
use crate::signal::{LocalSignalCenter, SignalCenterTrait};

const BUNDLE: &str = "com.example.budget";
const A1: &str = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";
const A2: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";

// --- Mock host ---
#[derive(Default)]
struct MockTaskHost {
    registered: Mutex<Vec<String>>,
    submitted: Mutex<Vec<TaskRequest>>,
    refuse_submit: Mutex<bool>,
}

impl MockTaskHost {
    fn submissions(&self) -> Vec<TaskRequest> {
        self.submitted.lock().unwrap().clone()
    }

    fn refuse_submissions(&self) {
        *self.refuse_submit.lock().unwrap() = true;
    }
}

impl BackgroundTaskHostTrait for MockTaskHost {
    fn register(&self, identifier: &str) -> Result<(), SchedulerError> {
        self.registered.lock().unwrap().push(identifier.to_string());
        Ok(())
    }

    fn submit(&self, request: TaskRequest) -> Result<(), SchedulerError> {
        if *self.refuse_submit.lock().unwrap() {
            return Err(SchedulerError::SubmissionRefused {
                identifier: request.identifier,
                reason: "too many pending requests".to_string(),
            });
        }
        self.submitted.lock().unwrap().push(request);
        Ok(())
    }
}

/// Change source whose fetch for one account never completes.
struct StallingChanges {
    inner: MockFinanceKit,
    stalled: String,
}

#[async_trait]
impl ChangeStreamTrait for StallingChanges {
    async fn fetch_changes(&self, account_id: &str) -> NativeResult<ChangeBatch> {
        if account_id == self.stalled {
            std::future::pending::<()>().await;
        }
        self.inner.fetch_changes(account_id).await
    }

    fn monitor_changes(&self, account_id: &str) -> BoxStream<'static, NativeResult<ChangeBatch>> {
        self.inner.monitor_changes(account_id)
    }
}

struct Harness {
    _tmp: TempDir,
    native: MockFinanceKit,
    host: Arc<MockTaskHost>,
    store: Arc<SharedStateStore>,
    sink: MockEventSink,
    dispatcher: UiDispatcher,
    scheduler: Arc<BackgroundTaskScheduler>,
}

fn account(id: &str) -> Account {
    Account {
        id: id.to_string(),
        display_name: "Card".to_string(),
        institution_name: "Bank".to_string(),
        account_description: None,
        currency_code: "USD".to_string(),
        kind: AccountKind::Liability,
        opening_date: None,
    }
}

fn batch(account_id: &str) -> ChangeBatch {
    ChangeBatch::new(account_id).with_deleted(vec![format!("{}-tx", account_id)])
}

fn harness() -> Harness {
    harness_with(RelayConfig::new(BUNDLE), direct_changes)
}

fn direct_changes(native: MockFinanceKit) -> Arc<dyn ChangeStreamTrait> {
    Arc::new(native)
}

/// Same wiring with a custom config; `changes` builds the change source
/// around the harness's native mock.
fn harness_with(
    config: RelayConfig,
    changes: impl FnOnce(MockFinanceKit) -> Arc<dyn ChangeStreamTrait>,
) -> Harness {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(config.group_identifier())).unwrap();
    let store = Arc::new(SharedStateStore::new(
        Arc::new(DirectoryContainerResolver::new(tmp.path())),
        config.group_identifier(),
    ));
    let native = MockFinanceKit::authorized();
    native.add_account(account(A1));
    native.add_account(account(A2));
    let host = Arc::new(MockTaskHost::default());
    let sink = MockEventSink::new();
    let (dispatcher, _handle) = UiDispatcher::spawn(Arc::new(sink.clone()));
    let changes = changes(native.clone());
    let scheduler = Arc::new(BackgroundTaskScheduler::new(
        &config,
        host.clone(),
        Arc::new(native.clone()),
        changes,
        store.clone(),
        dispatcher.clone(),
    ));
    Harness {
        _tmp: tmp,
        native,
        host,
        store,
        sink,
        dispatcher,
        scheduler,
    }
}

#[tokio::test]
async fn test_register_once() {
    let h = harness();
    assert_eq!(h.scheduler.state(), TaskState::Unregistered);

    h.scheduler.register().unwrap();
    h.scheduler.register().unwrap();

    assert_eq!(h.scheduler.state(), TaskState::Registered);
    assert_eq!(
        *h.host.registered.lock().unwrap(),
        vec!["com.example.budget.financekit.sync".to_string()]
    );
}

#[tokio::test]
async fn test_schedule_requires_registration() {
    let h = harness();
    assert!(matches!(
        h.scheduler.schedule(),
        Err(SchedulerError::NotRegistered(_))
    ));
    assert!(h.host.submissions().is_empty());
}

#[tokio::test]
async fn test_schedule_submits_delayed_unconstrained_request() {
    let h = harness();
    h.scheduler.register().unwrap();
    let before = Utc::now();

    h.scheduler.schedule().unwrap();

    let requests = h.host.submissions();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.earliest_begin >= before + chrono::Duration::seconds(15));
    assert!(!request.requires_network_connectivity);
    assert!(!request.requires_external_power);
    assert_eq!(h.scheduler.state(), TaskState::Scheduled);
}

#[tokio::test]
async fn test_run_reschedules_and_persists_non_empty_batches() {
    let h = harness();
    h.scheduler.register().unwrap();
    h.native.queue_changes(batch(A1));
    // A2 has nothing queued and yields an empty batch.

    let outcome = h.scheduler.run(TaskExpiration::never()).await;

    assert!(outcome.success);
    assert_eq!(outcome.accounts_processed, 2);
    assert_eq!(outcome.batches_written, 1);
    assert_eq!(h.host.submissions().len(), 1);
    assert_eq!(h.scheduler.state(), TaskState::Scheduled);

    let pending = h.store.list_pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].account_id, A1);
    assert!(h.store.read_marker(SyncResource::Transactions).is_some());
}

#[tokio::test]
async fn test_failed_account_is_skipped_not_fatal() {
    let h = harness();
    h.scheduler.register().unwrap();
    h.native.queue_fetch_failure(A1, "store busy");
    h.native.queue_changes(batch(A2));

    let outcome = h.scheduler.run(TaskExpiration::never()).await;

    assert!(outcome.success);
    assert_eq!(outcome.failed_accounts, vec![A1.to_string()]);
    assert_eq!(outcome.batches_written, 1);
    assert_eq!(h.store.list_pending()[0].account_id, A2);
}

#[tokio::test]
async fn test_run_prefers_monitored_accounts() {
    let h = harness();
    h.scheduler.register().unwrap();
    h.scheduler.set_monitored_accounts(Some(vec![A2.to_string()]));

    h.scheduler.run(TaskExpiration::never()).await;

    let calls = h.native.calls();
    assert!(calls.contains(&format!("fetch_changes:{}", A2)));
    assert!(!calls.contains(&format!("fetch_changes:{}", A1)));
    assert!(!calls.contains(&"accounts".to_string()));
}

#[tokio::test]
async fn test_expired_task_is_marked_failed() {
    let h = harness();
    h.scheduler.register().unwrap();
    h.native.queue_changes(batch(A1));
    let (handle, expiration) = TaskExpiration::pair();
    handle.expire();

    let outcome = h.scheduler.run(expiration).await;

    assert!(!outcome.success);
    assert!(outcome.expired);
    assert!(h.store.list_pending().is_empty());
    // The next occurrence was still requested before the work started.
    assert_eq!(h.host.submissions().len(), 1);
}

#[tokio::test]
async fn test_expiry_mid_run_keeps_written_batches() {
    let h = harness_with(RelayConfig::new(BUNDLE), |native| -> Arc<dyn ChangeStreamTrait> {
        Arc::new(StallingChanges {
            inner: native,
            stalled: A2.to_string(),
        })
    });
    h.scheduler.register().unwrap();
    h.native.queue_changes(batch(A1));
    let (handle, expiration) = TaskExpiration::pair();

    let (outcome, _) = tokio::join!(h.scheduler.run(expiration), async {
        tokio::task::yield_now().await;
        handle.expire();
    });
    h.dispatcher.flush().await;

    assert!(!outcome.success);
    assert!(outcome.expired);
    assert_eq!(outcome.accounts_processed, 1);
    assert_eq!(outcome.batches_written, 1);
    assert_eq!(h.store.list_pending().len(), 1);
    assert!(h.store.read_marker(SyncResource::Transactions).is_some());
    assert!(h.sink.events().iter().any(|e| matches!(
        e,
        RelayEvent::FinanceDataChanged(p) if p.source == DataChangeSource::Background
    )));
}

#[tokio::test]
async fn test_schedule_rejects_unrepresentable_delay() {
    for delay_secs in [10_000_000_000_000, u64::MAX] {
        let mut config = RelayConfig::new(BUNDLE);
        config.reschedule_delay_secs = delay_secs;
        let h = harness_with(config, direct_changes);
        h.scheduler.register().unwrap();

        let result = h.scheduler.schedule();

        assert_eq!(
            result,
            Err(SchedulerError::DelayOutOfRange {
                identifier: h.scheduler.identifier().to_string(),
                delay_secs,
            })
        );
        // Never degraded into an immediate run.
        assert!(h.host.submissions().is_empty());
        assert_eq!(h.scheduler.state(), TaskState::Registered);
    }
}

#[tokio::test]
async fn test_refused_reschedule_leaves_idle() {
    let h = harness();
    h.scheduler.register().unwrap();
    h.host.refuse_submissions();

    let outcome = h.scheduler.run(TaskExpiration::never()).await;

    assert!(outcome.success);
    assert_eq!(h.scheduler.state(), TaskState::Idle);
}

#[tokio::test]
async fn test_overlapping_runs_never_collide() {
    let h = harness();
    h.scheduler.register().unwrap();
    let fixed = ChangeBatch::at(A1, 1_700_000_000_000).with_deleted(vec!["tx".into()]);
    h.native.queue_changes(fixed.clone());
    h.native.queue_changes(fixed);
    h.scheduler.set_monitored_accounts(Some(vec![A1.to_string()]));

    let (first, second) = tokio::join!(
        h.scheduler.run(TaskExpiration::never()),
        h.scheduler.run(TaskExpiration::never())
    );

    assert_eq!(first.batches_written + second.batches_written, 2);
    assert_eq!(h.store.list_pending().len(), 2);
    assert_eq!(h.scheduler.state(), TaskState::Scheduled);
}

#[tokio::test]
async fn test_written_batches_notify_js() {
    let h = harness();
    h.scheduler.register().unwrap();
    h.native.queue_changes(batch(A1));

    h.scheduler.run(TaskExpiration::never()).await;
    h.dispatcher.flush().await;

    let events = h.sink.events();
    assert!(events.iter().any(|e| matches!(
        e,
        RelayEvent::FinanceDataChanged(p) if p.source == DataChangeSource::Background
    )));
    // Background runs never emit transactions directly; the drain does.
    assert!(!events
        .iter()
        .any(|e| matches!(e, RelayEvent::TransactionsChanged(_))));
}

#[tokio::test]
async fn test_signal_schedules_and_notifies() {
    let h = harness();
    h.scheduler.register().unwrap();
    let center = LocalSignalCenter::new();
    let name = RelayConfig::new(BUNDLE).signal_name();
    let listener = h.scheduler.listen(center.subscribe(&name));

    center.post(&name).unwrap();
    for _ in 0..10 {
        if !h.host.submissions().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    h.dispatcher.flush().await;

    assert_eq!(h.host.submissions().len(), 1);
    assert!(h.sink.events().iter().any(|e| matches!(
        e,
        RelayEvent::FinanceDataChanged(p) if p.source == DataChangeSource::Extension
    )));
    listener.abort();
}
