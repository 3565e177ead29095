//! Greedy partitioning of bookings into constrained batches.
//!
//! Both strategies produce batches where no batch exceeds `max_batch_size`
//! and no property contributes more than `max_per_property` bookings to a
//! single batch. Output is fully determined by input order and limits.
//!
//! If an iteration cannot place a single booking (a zero limit), partitioning
//! stops instead of looping; the caller is expected to validate limits first.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;

use crate::batching::batch::Batch;
use crate::config::{BatchLimits, PartitionStrategy};
use crate::normalize::Booking;

/// Partitions `records` by scanning the remaining pool once per batch.
pub fn partition(
    records: Vec<Booking>,
    max_batch_size: usize,
    max_per_property: usize,
) -> Vec<Batch> {
    partition_with(
        records,
        BatchLimits::new(max_batch_size, max_per_property),
        PartitionStrategy::PoolScan,
    )
}

/// Partitions `records` using the given strategy.
pub fn partition_with(
    records: Vec<Booking>,
    limits: BatchLimits,
    strategy: PartitionStrategy,
) -> Vec<Batch> {
    let total = records.len();
    let groups = match strategy {
        PartitionStrategy::PoolScan => drain_pool(records, limits),
        PartitionStrategy::RoundRobin => drain_queues(records, limits),
    };

    let placed: usize = groups.iter().map(Vec::len).sum();
    if placed < total {
        tracing::warn!(
            total,
            placed,
            max_batch_size = limits.max_batch_size,
            max_per_property = limits.max_per_property,
            "Partitioning stopped before placing every booking"
        );
    }

    #[cfg(debug_assertions)]
    tracing::debug!(
        ?strategy,
        total,
        batch_count = groups.len(),
        "Partitioning complete"
    );

    groups
        .into_iter()
        .enumerate()
        .map(|(i, bookings)| Batch {
            index: i + 1,
            bookings,
        })
        .collect()
}

/// Pool-scan strategy.
///
/// Each iteration walks the pool in its current order, takes every booking
/// that still fits, then splits the pool into the new batch and the rest.
/// Properties whose quota is used up are skipped, not removed, so their
/// remaining bookings keep their place for the next batch.
fn drain_pool(records: Vec<Booking>, limits: BatchLimits) -> Vec<Vec<Booking>> {
    let mut pool = records;
    let mut batches = Vec::new();

    while !pool.is_empty() {
        let selected = select_from_pool(&pool, limits);

        let (taken, kept): (Vec<_>, Vec<_>) = pool
            .into_iter()
            .zip(selected)
            .partition(|(_, take)| *take);
        pool = kept.into_iter().map(|(booking, _)| booking).collect();

        if taken.is_empty() {
            break;
        }
        batches.push(taken.into_iter().map(|(booking, _)| booking).collect());
    }

    batches
}

/// Marks which pool entries go into the next batch.
fn select_from_pool(pool: &[Booking], limits: BatchLimits) -> Vec<bool> {
    let mut per_property: HashMap<&str, usize> = HashMap::new();
    let mut size = 0;

    pool.iter()
        .map(|booking| {
            if size >= limits.max_batch_size {
                return false;
            }
            let count = per_property.entry(booking.property_key()).or_insert(0);
            if *count >= limits.max_per_property {
                return false;
            }
            *count += 1;
            size += 1;
            true
        })
        .collect()
}

/// Round-robin strategy.
///
/// One queue per property, in order of first appearance. Each batch pops up
/// to `max_per_property` bookings from each queue in turn until the batch is
/// full. Linear in the number of bookings.
fn drain_queues(records: Vec<Booking>, limits: BatchLimits) -> Vec<Vec<Booking>> {
    let mut queues: IndexMap<String, VecDeque<Booking>> = IndexMap::new();
    for booking in records {
        queues
            .entry(booking.property_key().to_string())
            .or_default()
            .push_back(booking);
    }

    let mut batches = Vec::new();
    while !queues.is_empty() {
        let mut batch: Vec<Booking> = Vec::new();
        for queue in queues.values_mut() {
            let room = limits.max_batch_size.saturating_sub(batch.len());
            if room == 0 {
                break;
            }
            let take = limits.max_per_property.min(room).min(queue.len());
            batch.extend(queue.drain(..take));
        }
        queues.retain(|_, queue| !queue.is_empty());

        if batch.is_empty() {
            break;
        }
        batches.push(batch);
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batching::verify_constraints;
    use crate::normalize::normalize_fields;
    use proptest::prelude::*;

    const STRATEGIES: [PartitionStrategy; 2] =
        [PartitionStrategy::PoolScan, PartitionStrategy::RoundRobin];

    /// Builds bookings for the given property keys; column 3 holds the
    /// input position so tests can track individual rows.
    fn bookings(keys: &[&str]) -> Vec<Booking> {
        keys.iter()
            .enumerate()
            .map(|(i, key)| {
                normalize_fields(
                    vec![
                        key.to_string(),
                        format!("2025-06-{:02}", i % 28 + 1),
                        format!("2025-07-{:02}", i % 28 + 1),
                        i.to_string(),
                    ],
                    i as u64 + 2,
                )
                .expect("valid test booking")
            })
            .collect()
    }

    fn keys_of(batch: &Batch) -> Vec<&str> {
        batch.bookings().iter().map(Booking::property_key).collect()
    }

    fn positions_of(batch: &Batch) -> Vec<usize> {
        batch
            .bookings()
            .iter()
            .map(|b| b.fields()[3].parse().expect("position column"))
            .collect()
    }

    #[test]
    fn test_quota_defers_third_booking() {
        let batches = partition(bookings(&["A", "A", "A", "B", "B"]), 3, 2);

        assert_eq!(batches.len(), 2);
        assert_eq!(keys_of(&batches[0]), vec!["A", "A", "B"]);
        assert_eq!(keys_of(&batches[1]), vec!["A", "B"]);
        assert_eq!(positions_of(&batches[0]), vec![0, 1, 3]);
        assert_eq!(positions_of(&batches[1]), vec![2, 4]);
    }

    #[test]
    fn test_single_property_splits_by_quota() {
        for strategy in STRATEGIES {
            let batches = partition_with(
                bookings(&["A", "A", "A", "A", "A"]),
                BatchLimits::new(1_000, 2),
                strategy,
            );
            let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
            assert_eq!(sizes, vec![2, 2, 1], "{:?}", strategy);
        }
    }

    #[test]
    fn test_round_robin_matches_scenario() {
        let batches = partition_with(
            bookings(&["A", "A", "A", "B", "B"]),
            BatchLimits::new(3, 2),
            PartitionStrategy::RoundRobin,
        );
        assert_eq!(keys_of(&batches[0]), vec!["A", "A", "B"]);
        assert_eq!(keys_of(&batches[1]), vec!["A", "B"]);
    }

    #[test]
    fn test_pool_scan_keeps_input_order_within_batches() {
        let batches = partition(bookings(&["A", "B", "A", "C", "A", "B"]), 10, 1);
        assert_eq!(keys_of(&batches[0]), vec!["A", "B", "C"]);
        assert_eq!(positions_of(&batches[0]), vec![0, 1, 3]);
        assert_eq!(keys_of(&batches[1]), vec!["A", "B"]);
        assert_eq!(positions_of(&batches[1]), vec![2, 5]);
        assert_eq!(keys_of(&batches[2]), vec!["A"]);
    }

    #[test]
    fn test_round_robin_groups_by_first_appearance() {
        let batches = partition_with(
            bookings(&["A", "B", "A", "C", "A", "B"]),
            BatchLimits::new(10, 2),
            PartitionStrategy::RoundRobin,
        );
        assert_eq!(keys_of(&batches[0]), vec!["A", "A", "B", "B", "C"]);
        assert_eq!(keys_of(&batches[1]), vec!["A"]);
    }

    #[test]
    fn test_batch_indexes_are_one_based() {
        let batches = partition(bookings(&["A", "A", "A"]), 1, 1);
        let indexes: Vec<usize> = batches.iter().map(Batch::index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        for strategy in STRATEGIES {
            assert!(partition_with(Vec::new(), BatchLimits::new(5, 2), strategy).is_empty());
        }
    }

    #[test]
    fn test_zero_limits_stop_immediately() {
        for strategy in STRATEGIES {
            for limits in [BatchLimits::new(0, 2), BatchLimits::new(5, 0)] {
                let batches = partition_with(bookings(&["A", "B", "C"]), limits, strategy);
                assert!(batches.is_empty(), "{:?} {:?}", strategy, limits);
            }
        }
    }

    #[test]
    fn test_partitioning_is_deterministic() {
        let keys = ["C", "A", "B", "A", "A", "C", "B", "A", "D", "A"];
        for strategy in STRATEGIES {
            let limits = BatchLimits::new(3, 2);
            let first = partition_with(bookings(&keys), limits, strategy);
            let second = partition_with(bookings(&keys), limits, strategy);
            assert_eq!(first, second);
        }
    }

    fn key_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec((0u8..6).prop_map(|k| format!("P{}", k)), 0..120)
    }

    proptest! {
        #[test]
        fn every_booking_lands_in_exactly_one_batch(
            keys in key_strategy(),
            max_batch_size in 1usize..12,
            max_per_property in 1usize..5,
        ) {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let limits = BatchLimits::new(max_batch_size, max_per_property);

            for strategy in STRATEGIES {
                let batches = partition_with(bookings(&keys), limits, strategy);

                let mut seen: Vec<usize> = batches.iter().flat_map(positions_of).collect();
                seen.sort_unstable();
                let expected: Vec<usize> = (0..keys.len()).collect();
                prop_assert_eq!(seen, expected);

                prop_assert!(verify_constraints(&batches, limits).is_ok());
            }
        }

        #[test]
        fn pool_scan_preserves_relative_order(
            keys in key_strategy(),
            max_batch_size in 1usize..12,
            max_per_property in 1usize..5,
        ) {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let batches = partition(bookings(&keys), max_batch_size, max_per_property);
            for batch in &batches {
                let positions = positions_of(batch);
                prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
