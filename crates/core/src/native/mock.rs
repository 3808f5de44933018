//! In-memory native layer for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};

use super::{ChangeStreamTrait, FinanceStoreTrait, NativeError, NativeResult};
use crate::accounts::{Account, AccountBalance};
use crate::authorization::AuthorizationStatus;
use crate::changes::ChangeBatch;
use crate::transactions::{TransactionQuery, TransactionRecord};

type StreamSender = mpsc::UnboundedSender<NativeResult<ChangeBatch>>;

#[derive(Default)]
struct MockState {
    status: AuthorizationStatus,
    status_after_request: Option<AuthorizationStatus>,
    accounts: Vec<Account>,
    transactions: Vec<TransactionRecord>,
    balances: Vec<AccountBalance>,
    queued_changes: HashMap<String, VecDeque<Result<ChangeBatch, String>>>,
    streams: HashMap<String, Vec<StreamSender>>,
    calls: Vec<String>,
}

/// Scriptable stand-in for FinanceKit.
///
/// Records every data call so tests can assert that gated methods never
/// reached the native layer. `authorization_status` is not recorded.
#[derive(Clone, Default)]
pub struct MockFinanceKit {
    state: Arc<Mutex<MockState>>,
}

impl MockFinanceKit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authorized() -> Self {
        let mock = Self::new();
        mock.set_status(AuthorizationStatus::Authorized);
        mock
    }

    pub fn set_status(&self, status: AuthorizationStatus) {
        self.state.lock().unwrap().status = status;
    }

    /// Status the user "picks" when `request_authorization` is called.
    pub fn set_status_after_request(&self, status: AuthorizationStatus) {
        self.state.lock().unwrap().status_after_request = Some(status);
    }

    pub fn add_account(&self, account: Account) {
        self.state.lock().unwrap().accounts.push(account);
    }

    pub fn add_transaction(&self, record: TransactionRecord) {
        self.state.lock().unwrap().transactions.push(record);
    }

    pub fn add_balance(&self, balance: AccountBalance) {
        self.state.lock().unwrap().balances.push(balance);
    }

    /// Queues the result of the next `fetch_changes` for an account.
    pub fn queue_changes(&self, batch: ChangeBatch) {
        let mut state = self.state.lock().unwrap();
        state
            .queued_changes
            .entry(batch.account_id.clone())
            .or_default()
            .push_back(Ok(batch));
    }

    /// Makes the next `fetch_changes` for an account fail.
    pub fn queue_fetch_failure(&self, account_id: &str, message: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .queued_changes
            .entry(account_id.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
    }

    /// Pushes a batch into every open monitoring stream of the account.
    ///
    /// Returns the number of streams that accepted it.
    pub fn push_stream(&self, batch: ChangeBatch) -> usize {
        let state = self.state.lock().unwrap();
        state
            .streams
            .get(&batch.account_id)
            .map(|senders| {
                senders
                    .iter()
                    .filter(|tx| tx.unbounded_send(Ok(batch.clone())).is_ok())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Closes every monitoring stream of the account.
    pub fn close_streams(&self, account_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.streams.remove(account_id);
    }

    pub fn open_stream_count(&self, account_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .streams
            .get(account_id)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl FinanceStoreTrait for MockFinanceKit {
    async fn authorization_status(&self) -> NativeResult<AuthorizationStatus> {
        Ok(self.state.lock().unwrap().status)
    }

    async fn request_authorization(&self) -> NativeResult<AuthorizationStatus> {
        self.record("request_authorization".to_string());
        let mut state = self.state.lock().unwrap();
        if let Some(next) = state.status_after_request.take() {
            state.status = next;
        }
        Ok(state.status)
    }

    async fn accounts(&self) -> NativeResult<Vec<Account>> {
        self.record("accounts".to_string());
        Ok(self.state.lock().unwrap().accounts.clone())
    }

    async fn transactions(&self, query: &TransactionQuery) -> NativeResult<Vec<TransactionRecord>> {
        self.record("transactions".to_string());
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn balances(&self) -> NativeResult<Vec<AccountBalance>> {
        self.record("balances".to_string());
        Ok(self.state.lock().unwrap().balances.clone())
    }

    async fn clear_history_token(&self, account_id: &str) -> NativeResult<()> {
        self.record(format!("clear_history_token:{}", account_id));
        Ok(())
    }
}

#[async_trait]
impl ChangeStreamTrait for MockFinanceKit {
    async fn fetch_changes(&self, account_id: &str) -> NativeResult<ChangeBatch> {
        self.record(format!("fetch_changes:{}", account_id));
        let next = self
            .state
            .lock()
            .unwrap()
            .queued_changes
            .get_mut(account_id)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(message)) => Err(NativeError::Other(message)),
            None => Ok(ChangeBatch::new(account_id)),
        }
    }

    fn monitor_changes(&self, account_id: &str) -> BoxStream<'static, NativeResult<ChangeBatch>> {
        self.record(format!("monitor_changes:{}", account_id));
        let (tx, rx) = mpsc::unbounded();
        self.state
            .lock()
            .unwrap()
            .streams
            .entry(account_id.to_string())
            .or_default()
            .push(tx);
        rx.boxed()
    }
}
