//! Batch output.
//!
//! This module renders batches to CSV with the shared header row and delivers
//! them to a [`BatchSink`]: in memory, or into a directory with atomic file
//! replacement and automatic cleanup on failure.

mod atomic_writer;
mod batch_writer;

pub use atomic_writer::{AtomicFileWriter, DirectorySink};
pub use batch_writer::{render_batch_csv, BatchSink, MemorySink};
