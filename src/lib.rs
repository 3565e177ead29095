//! Hotel booking batcher.
//!
//! Splits a booking export into batches bounded by a total size and by a
//! per-property quota. Rows are normalized first (property key present,
//! check-in/check-out rewritten as `YYYY-MM-DD`), then drained into batches
//! in a deterministic order and written out through a [`streaming::BatchSink`].
//!
//! ```no_run
//! use booking_batcher::config::BatchConfig;
//! use booking_batcher::job::run_job;
//! use booking_batcher::streaming::MemorySink;
//!
//! let input = b"property_id,check_in,check_out\nP1,11/12/2025,2025-12-14\n";
//! let mut sink = MemorySink::new();
//! let report = run_job(input, &BatchConfig::default(), &mut sink)?;
//! assert_eq!(report.batches.len(), 1);
//! # Ok::<(), booking_batcher::error::AppError>(())
//! ```

pub mod batching;
pub mod config;
pub mod error;
pub mod job;
pub mod normalize;
pub mod streaming;

pub use batching::{partition, partition_with, Batch, BatchSummary};
pub use config::{BatchConfig, BatchLimits, BatchProfile, PartitionStrategy};
pub use error::{AppError, ParseError, ParseErrorKind};
pub use normalize::{normalize, Booking};
