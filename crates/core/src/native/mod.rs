//! Native capability boundary.
//!
//! FinanceKit itself lives behind these traits. The relay never reconstructs
//! or persists the native resumption cursor: both change calls below mean
//! "changes since whatever the native layer last handed out".

mod native_errors;
mod native_traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use native_errors::{NativeError, NativeResult};
pub use native_traits::{ChangeStreamTrait, FinanceStoreTrait};
