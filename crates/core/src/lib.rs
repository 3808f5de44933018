//! FinanceKit Core - Data model, errors, native capability traits and the
//! shared state store.
//!
//! This crate is host-agnostic. It never talks to FinanceKit directly; the
//! native layer is reached through the traits in [`native`], and everything
//! the main app and the background extension share lives in [`store`].

pub mod accounts;
pub mod authorization;
pub mod changes;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod native;
pub mod store;
pub mod transactions;
pub mod utils;

pub use accounts::{Account, AccountBalance, AccountKind, BalanceKind};
pub use authorization::AuthorizationStatus;
pub use changes::ChangeBatch;
pub use config::RelayConfig;
pub use transactions::{
    CreditDebitIndicator, TransactionQuery, TransactionRecord, TransactionStatus, TransactionType,
};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
