/// Directory inside the app group container holding background-captured batches
pub const PENDING_CHANGES_DIR: &str = "pending_changes";

/// Extension of every file written to the shared state store
pub const JSON_EXTENSION: &str = "json";

/// Sync marker keys
pub const LAST_SYNC_ACCOUNTS_KEY: &str = "last_sync_accounts";
pub const LAST_SYNC_TRANSACTIONS_KEY: &str = "last_sync_transactions";
pub const LAST_SYNC_BALANCES_KEY: &str = "last_sync_balances";

/// Prefix used to derive the default app group from the bundle identifier
pub const APP_GROUP_PREFIX: &str = "group.";

/// Suffix of the cross-process broadcast name
pub const DATA_CHANGED_SUFFIX: &str = ".dataChanged";

/// Suffix of the default background task identifier
pub const BACKGROUND_TASK_SUFFIX: &str = ".financekit.sync";

/// Delay before the OS may run the next background sync
pub const DEFAULT_RESCHEDULE_DELAY_SECS: u64 = 15;
/// Longest reschedule delay accepted from configuration (one week)
pub const MAX_RESCHEDULE_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

/// JS event names
pub const EVENT_AUTHORIZATION_STATUS_CHANGED: &str = "onAuthorizationStatusChanged";
pub const EVENT_TRANSACTIONS_CHANGED: &str = "onTransactionsChanged";
pub const EVENT_FINANCE_DATA_CHANGED: &str = "onFinanceDataChanged";

/// `source` values of onFinanceDataChanged
pub const SOURCE_EXTENSION: &str = "extension";
pub const SOURCE_BACKGROUND: &str = "background";

/// `changeType` recorded in the transactions marker
pub const CHANGE_TYPE_BACKGROUND_DELIVERY: &str = "backgroundDelivery";
pub const CHANGE_TYPE_FETCH: &str = "fetch";
pub const CHANGE_TYPE_BACKGROUND_TASK: &str = "backgroundTask";

/// Upper bound on filename bumps when a pending name is already taken
pub const MAX_PENDING_NAME_ATTEMPTS: u32 = 1_000;
