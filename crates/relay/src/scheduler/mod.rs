//! Background task scheduler for the main app process.
//!
//! Turns "a delta might exist" signals into OS-throttled background tasks
//! that pull the delta from the native change stream and persist it to the
//! shared state store.

mod scheduler_model;
mod scheduler_service;
mod scheduler_traits;

#[cfg(test)]
mod scheduler_service_tests;

pub use scheduler_model::*;
pub use scheduler_service::BackgroundTaskScheduler;
pub use scheduler_traits::BackgroundTaskHostTrait;
