//! Host interface for OS background task scheduling.

use super::{SchedulerError, TaskRequest};

/// The OS background task facility.
///
/// The host calls back into the scheduler with
/// [`BackgroundTaskScheduler::run`](super::BackgroundTaskScheduler::run)
/// when it decides to execute a submitted request.
pub trait BackgroundTaskHostTrait: Send + Sync {
    /// Associates the identifier with the scheduler's handler. Once per
    /// process.
    fn register(&self, identifier: &str) -> Result<(), SchedulerError>;

    /// Asks the OS to run the task. Replaces any pending request with the
    /// same identifier.
    fn submit(&self, request: TaskRequest) -> Result<(), SchedulerError>;
}
