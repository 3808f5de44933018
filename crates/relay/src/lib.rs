//! FinanceKit Relay - change reconciliation and background sync.
//!
//! Moves FinanceKit transaction deltas to JS along two paths:
//!
//! - foreground: [`monitor::LiveMonitor`] forwards the native change stream
//!   straight to the listeners;
//! - background: the extension's [`extension::ExtensionRelay`] signals the
//!   main app, [`scheduler::BackgroundTaskScheduler`] persists the delta to
//!   the shared state store, and [`drain::PendingChangeDrain`] hands it to JS
//!   once the app is active again (at-least-once).
//!
//! [`RelayContext`] wires all of it behind the JS method surface.

pub mod context;
pub mod dispatcher;
pub mod drain;
pub mod extension;
pub mod monitor;
pub mod scheduler;
pub mod signal;


pub use context::{RelayContext, RelayHost};
pub use dispatcher::UiDispatcher;
pub use drain::{DrainReport, PendingChangeDrain};
pub use extension::{ExtensionRelay, RelayState};
pub use monitor::LiveMonitor;
pub use scheduler::{
    BackgroundTaskHostTrait, BackgroundTaskScheduler, ExpirationHandle, SchedulerError,
    TaskExpiration, TaskOutcome, TaskRequest, TaskState,
};
pub use signal::{LocalSignalCenter, SignalCenterTrait, SignalError, SignalReceiver};
