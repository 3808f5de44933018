//! Native capability traits.

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::NativeResult;
use crate::accounts::{Account, AccountBalance};
use crate::authorization::AuthorizationStatus;
use crate::changes::ChangeBatch;
use crate::transactions::{TransactionQuery, TransactionRecord};

/// Request/response surface of the native financial store.
#[async_trait]
pub trait FinanceStoreTrait: Send + Sync {
    async fn authorization_status(&self) -> NativeResult<AuthorizationStatus>;

    /// Prompts the user if needed and returns the resulting status.
    async fn request_authorization(&self) -> NativeResult<AuthorizationStatus>;

    async fn accounts(&self) -> NativeResult<Vec<Account>>;

    async fn transactions(&self, query: &TransactionQuery) -> NativeResult<Vec<TransactionRecord>>;

    async fn balances(&self) -> NativeResult<Vec<AccountBalance>>;

    /// Drops the native resumption state for an account so the next change
    /// call starts from a full resync.
    async fn clear_history_token(&self, account_id: &str) -> NativeResult<()>;
}

/// The native change stream for transactions.
#[async_trait]
pub trait ChangeStreamTrait: Send + Sync {
    /// Changes since the native cursor, non-monitoring mode.
    ///
    /// Returns an empty batch when nothing changed.
    async fn fetch_changes(&self, account_id: &str) -> NativeResult<ChangeBatch>;

    /// Long-lived sequence of changes, monitoring mode.
    ///
    /// The stream ends when the native layer closes it; dropping it releases
    /// the native sequence.
    fn monitor_changes(&self, account_id: &str) -> BoxStream<'static, NativeResult<ChangeBatch>>;
}
