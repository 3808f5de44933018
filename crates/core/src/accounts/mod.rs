//! Accounts module - account and balance models.

mod accounts_model;

#[cfg(test)]
mod accounts_model_tests;

// Re-export the public interface
pub use accounts_model::{validate_account_id, Account, AccountBalance, AccountKind, BalanceKind};
