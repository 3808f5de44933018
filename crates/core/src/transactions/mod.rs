//! Transactions module - transaction records and query options.

mod transactions_model;


pub use transactions_model::*;
