//! Partitioning normalized bookings into batches.
//!
//! Every booking ends up in exactly one batch, batches never exceed the
//! configured size, and no property contributes more than its per-batch
//! quota to any batch.

mod batch;
mod partitioner;

pub use batch::{verify_constraints, Batch, BatchSummary};
pub use partitioner::{partition, partition_with};
