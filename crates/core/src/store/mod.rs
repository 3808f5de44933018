//! Shared State Store.
//!
//! A filesystem area inside the app group container that both the main app
//! and the extension process can reach. There is no lock: pending batches are
//! append-only files with unique names, and sync markers are advisory
//! last-write-wins blobs.

mod resolver;
mod shared_state_store;
mod store_errors;
mod store_model;

#[cfg(test)]
mod shared_state_store_tests;

pub use resolver::{ContainerResolverTrait, DirectoryContainerResolver};
pub use shared_state_store::SharedStateStore;
pub use store_errors::StoreError;
pub use store_model::*;
