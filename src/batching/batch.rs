//! Batches, their summaries and file naming.
//!
//! [`verify_constraints`] re-checks the partitioner's output against the
//! limits before anything is written.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::BatchLimits;
use crate::error::AppError;
use crate::normalize::Booking;

/// One output group of bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub(crate) index: usize,
    pub(crate) bookings: Vec<Booking>,
}

impl Batch {
    /// 1-based position of this batch in emission order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::of(&self.bookings)
    }

    /// Suggested file name without extension:
    /// `{batch_name}-{min_day}-{max_day}-{index:02}`.
    ///
    /// Batches whose rows carry no dates drop the day range.
    pub fn file_stem(&self, batch_name: &str) -> String {
        let summary = self.summary();
        match (summary.min_check_in_day(), summary.max_check_in_day()) {
            (Some(min_day), Some(max_day)) => {
                format!("{}-{}-{}-{:02}", batch_name, min_day, max_day, self.index)
            }
            _ => format!("{}-{:02}", batch_name, self.index),
        }
    }
}

/// Derived statistics for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub booking_count: usize,
    pub unique_property_count: usize,
    pub max_bookings_per_property: usize,
    /// Earliest check-in date in the batch.
    pub first_check_in: Option<NaiveDate>,
    /// Latest check-in date in the batch.
    pub last_check_in: Option<NaiveDate>,
}

impl BatchSummary {
    pub fn of(bookings: &[Booking]) -> Self {
        let counts = property_counts(bookings);
        let check_ins = || bookings.iter().filter_map(Booking::check_in);

        Self {
            booking_count: bookings.len(),
            unique_property_count: counts.len(),
            max_bookings_per_property: counts.values().copied().max().unwrap_or(0),
            first_check_in: check_ins().min(),
            last_check_in: check_ins().max(),
        }
    }

    /// Zero-padded day of month of the earliest check-in.
    pub fn min_check_in_day(&self) -> Option<String> {
        self.first_check_in.map(|d| d.format("%d").to_string())
    }

    /// Zero-padded day of month of the latest check-in.
    pub fn max_check_in_day(&self) -> Option<String> {
        self.last_check_in.map(|d| d.format("%d").to_string())
    }
}

fn property_counts(bookings: &[Booking]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for booking in bookings {
        *counts.entry(booking.property_key()).or_insert(0) += 1;
    }
    counts
}

/// Checks the post-conditions every emitted batch must satisfy.
///
/// A failure here is a partitioner defect, never a user input problem.
pub fn verify_constraints(batches: &[Batch], limits: BatchLimits) -> Result<(), AppError> {
    for batch in batches {
        let summary = batch.summary();
        let violation = if summary.booking_count == 0 {
            Some("batch is empty".to_string())
        } else if summary.booking_count > limits.max_batch_size {
            Some(format!(
                "{} bookings exceeds max_batch_size {}",
                summary.booking_count, limits.max_batch_size
            ))
        } else if summary.max_bookings_per_property > limits.max_per_property {
            Some(format!(
                "{} bookings for one property exceeds max_per_property {}",
                summary.max_bookings_per_property, limits.max_per_property
            ))
        } else {
            None
        };

        if let Some(detail) = violation {
            tracing::error!(batch_index = batch.index, %detail, "Batch constraint violated");
            return Err(AppError::InvariantViolation(format!(
                "batch {}: {}",
                batch.index, detail
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn booking(line: &str) -> Booking {
        normalize(line, 2).expect("valid test row")
    }

    fn batch(index: usize, lines: &[&str]) -> Batch {
        Batch {
            index,
            bookings: lines.iter().map(|l| booking(l)).collect(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let batch = batch(
            1,
            &[
                "A,2025-03-14,2025-03-15",
                "A,2025-03-02,2025-03-04",
                "B,2025-03-09,2025-03-10",
            ],
        );
        let summary = batch.summary();
        assert_eq!(summary.booking_count, 3);
        assert_eq!(summary.unique_property_count, 2);
        assert_eq!(summary.max_bookings_per_property, 2);
        assert_eq!(summary.first_check_in, NaiveDate::from_ymd_opt(2025, 3, 2));
        assert_eq!(summary.last_check_in, NaiveDate::from_ymd_opt(2025, 3, 14));
    }

    #[test]
    fn test_check_in_range_uses_calendar_order() {
        // Day 28 of January is earlier than day 03 of February.
        let batch = batch(
            4,
            &["A,2025-02-03,2025-02-05", "B,2025-01-28,2025-01-30"],
        );
        let summary = batch.summary();
        assert_eq!(summary.min_check_in_day().as_deref(), Some("28"));
        assert_eq!(summary.max_check_in_day().as_deref(), Some("03"));
        assert_eq!(batch.file_stem("march"), "march-28-03-04");
    }

    #[test]
    fn test_file_stem_pads_days_and_index() {
        let batch = batch(
            3,
            &["A,5/3/2025,6/3/2025", "B,2025-03-09,2025-03-10"],
        );
        assert_eq!(batch.file_stem("batch"), "batch-05-09-03");
    }

    #[test]
    fn test_file_stem_without_dates() {
        let batch = batch(12, &["A,x", "B"]);
        assert_eq!(batch.summary().first_check_in, None);
        assert_eq!(batch.file_stem("batch"), "batch-12");
    }

    #[test]
    fn test_verify_accepts_valid_batches() {
        let batches = vec![
            batch(1, &["A,2025-01-01,2025-01-02", "B,2025-01-01,2025-01-02"]),
            batch(2, &["A,2025-01-03,2025-01-04"]),
        ];
        assert!(verify_constraints(&batches, BatchLimits::new(2, 1)).is_ok());
    }

    #[test]
    fn test_verify_rejects_per_property_overflow() {
        let batches = vec![batch(
            1,
            &["A,2025-01-01,2025-01-02", "A,2025-01-03,2025-01-04"],
        )];
        let result = verify_constraints(&batches, BatchLimits::new(10, 1));
        assert!(matches!(result, Err(AppError::InvariantViolation(_))));
    }

    #[test]
    fn test_verify_rejects_oversized_and_empty_batches() {
        let oversized = vec![batch(
            1,
            &["A,2025-01-01,2025-01-02", "B,2025-01-03,2025-01-04"],
        )];
        assert!(verify_constraints(&oversized, BatchLimits::new(1, 5)).is_err());

        let empty = vec![Batch {
            index: 1,
            bookings: Vec::new(),
        }];
        assert!(verify_constraints(&empty, BatchLimits::new(1, 5)).is_err());
    }
}
