//! Change batches delivered by the native change stream.

mod change_batch_model;

pub use change_batch_model::*;
