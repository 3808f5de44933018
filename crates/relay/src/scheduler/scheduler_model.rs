//! Background task scheduler models.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;

/// Lifecycle of the background sync task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Unregistered,
    /// Handler registered, nothing submitted yet
    Registered,
    /// A request is waiting for the OS
    Scheduled,
    /// At least one invocation is running
    Running,
    /// Last run finished and no follow-up could be submitted
    Idle,
}

/// What the scheduler asks the OS for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub identifier: String,
    /// The OS may run the task no earlier than this
    pub earliest_begin: DateTime<Utc>,
    pub requires_network_connectivity: bool,
    pub requires_external_power: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Background task '{0}' is not registered")]
    NotRegistered(String),

    #[error("Host refused to register '{identifier}': {reason}")]
    RegistrationRefused { identifier: String, reason: String },

    #[error("Host refused to schedule '{identifier}': {reason}")]
    SubmissionRefused { identifier: String, reason: String },

    #[error("Reschedule delay of {delay_secs}s for '{identifier}' is out of range")]
    DelayOutOfRange { identifier: String, delay_secs: u64 },
}

/// Host side of a task's expiration flag.
///
/// The host flips it when the OS preempts the task.
#[derive(Debug)]
pub struct ExpirationHandle(watch::Sender<bool>);

impl ExpirationHandle {
    pub fn expire(&self) {
        let _ = self.0.send(true);
    }
}

/// Handler side of a task's expiration flag.
#[derive(Debug, Clone)]
pub struct TaskExpiration(watch::Receiver<bool>);

impl TaskExpiration {
    /// A flag pair for one task invocation.
    pub fn pair() -> (ExpirationHandle, TaskExpiration) {
        let (tx, rx) = watch::channel(false);
        (ExpirationHandle(tx), TaskExpiration(rx))
    }

    /// A flag that never fires.
    pub fn never() -> TaskExpiration {
        let (_, expiration) = Self::pair();
        expiration
    }

    pub fn is_expired(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the host expires the task. Never resolves if the host
    /// dropped its handle without expiring.
    pub async fn expired(&mut self) {
        loop {
            if *self.0.borrow() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Summary reported back to the host when a run completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutcome {
    /// What the host should mark the task as
    pub success: bool,
    pub expired: bool,
    pub accounts_processed: usize,
    pub batches_written: usize,
    /// Accounts whose fetch failed; their changes wait for a later run
    pub failed_accounts: Vec<String>,
}
