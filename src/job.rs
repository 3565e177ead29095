//! Batching job orchestration.
//!
//! A job reads one delimited-text document, normalizes every row (failing on
//! the first bad one), partitions the bookings, checks the batch
//! post-conditions and hands each rendered batch to a [`BatchSink`].

use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::batching::{partition_with, verify_constraints, BatchSummary};
use crate::config::BatchConfig;
use crate::error::AppError;
use crate::normalize::{normalize_record, Booking};
use crate::streaming::{render_batch_csv, BatchSink, DirectorySink};

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ─────────────────────────────────────────────────────────────────────────────
// Report Types
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one batch within a job.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// 1-based batch position.
    pub index: usize,
    /// Name the batch was stored under.
    pub file_name: String,
    #[serde(flatten)]
    pub summary: BatchSummary,
}

/// Outcome of a completed job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: Uuid,
    /// Number of data rows read from the input.
    pub total_bookings: usize,
    pub header: Vec<String>,
    pub batches: Vec<BatchReport>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Parses the header and all bookings of a document.
///
/// A leading UTF-8 BOM is ignored. Row numbers in errors are 1-based lines
/// of the document, the header being row 1, with skipped blank lines counted.
/// The header must sit on the first line.
pub fn read_bookings(
    input: &[u8],
    delimiter: u8,
) -> Result<(Vec<String>, Vec<Booking>), AppError> {
    let data = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    if std::str::from_utf8(data).is_err() {
        return Err(AppError::NotUtf8);
    }
    if data.first().is_some_and(|b| is_line_break(*b)) {
        return Err(AppError::NoHeader);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data);

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::CsvInvalid(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(String::from)
        .collect();

    if header.is_empty() {
        return Err(AppError::NoHeader);
    }

    let mut lines = LineCounter::new(data);
    let mut bookings = Vec::new();
    for result in reader.records() {
        let record = result
            .map_err(|e| AppError::CsvInvalid(format!("Failed to read CSV record: {}", e)))?;
        let row = lines.line_at(record.position().map_or(0, |p| p.byte()));
        bookings.push(normalize_record(&record, row)?);
    }

    Ok((header, bookings))
}

fn is_line_break(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n')
}

/// Maps record start offsets to physical line numbers.
///
/// The CSV reader reports a record's position as the end of the previous
/// record, before any blank lines it skipped, so those are stepped over here.
struct LineCounter<'a> {
    data: &'a [u8],
    offset: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            line: 1,
        }
    }

    /// Line on which the record read from `byte` begins. Offsets must not
    /// go backwards.
    fn line_at(&mut self, byte: u64) -> u64 {
        let from = usize::try_from(byte)
            .unwrap_or(usize::MAX)
            .clamp(self.offset, self.data.len());
        let blank = self.data[from..]
            .iter()
            .take_while(|b| is_line_break(**b))
            .count();
        let start = from + blank;

        self.line += self.data[self.offset..start]
            .iter()
            .filter(|b| **b == b'\n')
            .count() as u64;
        self.offset = start;
        self.line
    }
}

/// Runs one job over an in-memory document, writing batches to `sink`.
///
/// # Errors
///
/// - `AppError::InvalidConfig` if `config` fails validation (nothing is written)
/// - `AppError::NotUtf8`, `AppError::NoHeader`, `AppError::CsvInvalid` for
///   unreadable input
/// - `AppError::Parse` for the first row that fails normalization
/// - `AppError::Sink` if the sink rejects a batch
/// - `AppError::InvariantViolation` if partitioning broke a batch constraint
pub fn run_job(
    input: &[u8],
    config: &BatchConfig,
    sink: &mut dyn BatchSink,
) -> Result<JobReport, AppError> {
    config.validate()?;

    let job_id = Uuid::new_v4();
    let limits = config.limits();
    info!(
        %job_id,
        input_bytes = input.len(),
        max_batch_size = limits.max_batch_size,
        max_per_property = limits.max_per_property,
        strategy = ?config.strategy,
        "Starting batching job"
    );

    let (header, bookings) = read_bookings(input, config.delimiter)?;
    let total_bookings = bookings.len();

    let batches = partition_with(bookings, limits, config.strategy);
    verify_constraints(&batches, limits)?;

    let placed: usize = batches.iter().map(|b| b.len()).sum();
    if placed != total_bookings {
        tracing::error!(%job_id, placed, total_bookings, "Bookings lost during partitioning");
        return Err(AppError::InvariantViolation(format!(
            "placed {} of {} bookings",
            placed, total_bookings
        )));
    }

    let batch_name = config.batch_name.trim();
    let mut reports = Vec::with_capacity(batches.len());
    for batch in &batches {
        let file_name = format!("{}.csv", batch.file_stem(batch_name));
        let bytes = render_batch_csv(&header, batch, config.delimiter)?;
        sink.put(&file_name, &bytes)?;

        let summary = batch.summary();
        tracing::debug!(
            %job_id,
            index = batch.index(),
            file_name = %file_name,
            bookings = summary.booking_count,
            properties = summary.unique_property_count,
            "Batch written"
        );

        reports.push(BatchReport {
            index: batch.index(),
            file_name,
            summary,
        });
    }

    info!(
        %job_id,
        total_bookings,
        batch_count = reports.len(),
        "Batching job complete"
    );

    Ok(JobReport {
        job_id,
        total_bookings,
        header,
        batches: reports,
    })
}

/// Runs a job from a file on disk into `out_dir`.
///
/// Parsing and partitioning are blocking work and run on tokio's blocking
/// pool.
pub async fn run_job_file(
    source: &Path,
    out_dir: &Path,
    config: BatchConfig,
) -> Result<JobReport, AppError> {
    config.validate()?;

    let input = tokio::fs::read(source).await.map_err(|e| {
        AppError::Internal(format!("Failed to read {}: {}", source.display(), e))
    })?;

    let out_dir = out_dir.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut sink = DirectorySink::new(&out_dir)?;
        run_job(&input, &config, &mut sink)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
