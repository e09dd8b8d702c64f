use log::warn;

use crate::error::Error;
use crate::perf::{AggregatedPoint, Measurement};

/// Every configuration is timed this many times in a row.
pub const TRIALS_PER_BATCH: usize = 3;

/// What to do with records left over after the last full batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrailingBatch {
    /// Discard the leftovers and report how many were dropped.
    #[default]
    DropIncompletePartialBatch,
    /// Fail with `Error::IncompleteTrailingBatch`.
    Reject,
}

/// Whether the records of a batch are checked to share one configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchConsistency {
    /// Take thread and work count from the first record of the batch.
    #[default]
    Trust,
    /// Fail with `Error::MixedBatch` when a record disagrees with the first one.
    Verify,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrialPolicy {
    pub trailing: TrailingBatch,
    pub consistency: BatchConsistency,
}

impl TrialPolicy {
    /// Fails on anything the lenient default would let through.
    pub fn strict() -> Self {
        Self {
            trailing: TrailingBatch::Reject,
            consistency: BatchConsistency::Verify,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub points: Vec<AggregatedPoint>,
    /// Records in the short final batch that produced no point.
    pub dropped: usize,
}

fn mean_of(batch: &[Measurement]) -> AggregatedPoint {
    let first = batch[0];
    let total: u128 = batch.iter().map(|m| u128::from(m.duration_ns)).sum();

    AggregatedPoint {
        thread_count: first.thread_count,
        work_count: first.work_count,
        mean_duration_ns: total as f64 / TRIALS_PER_BATCH as f64,
    }
}

fn verify_batch(index: usize, batch: &[Measurement]) -> Result<(), Error> {
    let first = batch[0];
    match batch.iter().find(|m| !m.same_config(&first)) {
        Some(other) => Err(Error::MixedBatch {
            batch: index,
            expected_threads: first.thread_count,
            expected_work: first.work_count,
            found_threads: other.thread_count,
            found_work: other.work_count,
        }),
        None => Ok(()),
    }
}

/// Reduces consecutive batches of `TRIALS_PER_BATCH` records to their mean, in input order.
pub fn aggregate(measurements: &[Measurement], policy: TrialPolicy) -> Result<Aggregation, Error> {
    let batches = measurements.chunks_exact(TRIALS_PER_BATCH);
    let remaining = batches.remainder().len();

    if remaining > 0 && policy.trailing == TrailingBatch::Reject {
        return Err(Error::IncompleteTrailingBatch {
            remaining,
            batch_size: TRIALS_PER_BATCH,
        });
    }

    let mut points = Vec::with_capacity(measurements.len() / TRIALS_PER_BATCH);
    for (index, batch) in batches.enumerate() {
        if policy.consistency == BatchConsistency::Verify {
            verify_batch(index, batch)?;
        }
        points.push(mean_of(batch));
    }

    if remaining > 0 {
        warn!(
            "dropping {} trailing record(s) that do not fill a batch of {}",
            remaining, TRIALS_PER_BATCH
        );
    }

    Ok(Aggregation {
        points,
        dropped: remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn m(thread_count: u32, work_count: u32, duration_ns: u64) -> Measurement {
        Measurement::new(thread_count, work_count, duration_ns)
    }

    #[test]
    fn mean_of_one_batch() {
        let input = [m(2, 1000, 100), m(2, 1000, 200), m(2, 1000, 300)];
        let agg = aggregate(&input, TrialPolicy::default()).unwrap();

        assert_eq!(
            agg.points,
            vec![AggregatedPoint {
                thread_count: 2,
                work_count: 1000,
                mean_duration_ns: 200.0,
            }]
        );
        assert_eq!(agg.dropped, 0);
    }

    #[test]
    fn batches_keep_input_order() {
        let input: Vec<Measurement> = [(9, 1900), (1, 1000), (5, 1500)]
            .iter()
            .flat_map(|&(t, w)| (0..3).map(move |i| m(t, w, 10 * u64::from(t) + i)))
            .collect();

        let points = aggregate(&input, TrialPolicy::default()).unwrap().points;
        let configs: Vec<(u32, u32)> = points.iter().map(|p| (p.thread_count, p.work_count)).collect();
        assert_eq!(configs, vec![(9, 1900), (1, 1000), (5, 1500)]);
        assert_relative_eq!(points[0].mean_duration_ns, 91.0);
        assert_relative_eq!(points[1].mean_duration_ns, 11.0);
        assert_relative_eq!(points[2].mean_duration_ns, 51.0);
    }

    #[test]
    fn short_trailing_batch_is_dropped() {
        let input: Vec<Measurement> = (0..7).map(|i| m(1 + i / 3, 1000, 100)).collect();
        let agg = aggregate(&input, TrialPolicy::default()).unwrap();

        assert_eq!(agg.points.len(), 2);
        assert_eq!(agg.dropped, 1);
        assert_eq!(agg.points[1].thread_count, 2);
    }

    #[test]
    fn short_trailing_batch_can_be_rejected() {
        let input: Vec<Measurement> = (0..8).map(|_| m(1, 1000, 100)).collect();
        let policy = TrialPolicy {
            trailing: TrailingBatch::Reject,
            ..TrialPolicy::default()
        };

        match aggregate(&input, policy) {
            Err(Error::IncompleteTrailingBatch { remaining, batch_size }) => {
                assert_eq!(remaining, 2);
                assert_eq!(batch_size, TRIALS_PER_BATCH);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_input_has_no_points() {
        let agg = aggregate(&[], TrialPolicy::strict()).unwrap();
        assert!(agg.points.is_empty());
        assert_eq!(agg.dropped, 0);
    }

    #[test]
    fn mixed_batches_are_trusted_by_default() {
        let input = [m(2, 1000, 30), m(3, 1000, 60), m(2, 1200, 90)];
        let points = aggregate(&input, TrialPolicy::default()).unwrap().points;

        assert_eq!(points[0].thread_count, 2);
        assert_eq!(points[0].work_count, 1000);
        assert_relative_eq!(points[0].mean_duration_ns, 60.0);
    }

    #[test]
    fn mixed_batches_fail_verification() {
        let input = [
            m(1, 1000, 1),
            m(1, 1000, 2),
            m(1, 1000, 3),
            m(4, 1500, 1),
            m(4, 1600, 2),
            m(4, 1500, 3),
        ];

        match aggregate(&input, TrialPolicy::strict()) {
            Err(Error::MixedBatch {
                batch,
                expected_work,
                found_work,
                ..
            }) => {
                assert_eq!(batch, 1);
                assert_eq!(expected_work, 1500);
                assert_eq!(found_work, 1600);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn large_durations_do_not_overflow() {
        let input = [m(1, 1000, u64::MAX), m(1, 1000, u64::MAX), m(1, 1000, u64::MAX)];
        let points = aggregate(&input, TrialPolicy::default()).unwrap().points;
        assert_relative_eq!(points[0].mean_duration_ns, u64::MAX as f64);
    }

    #[test]
    fn means_preserve_the_total() {
        let mut rng = SmallRng::seed_from_u64(0x5ca1e);

        for _ in 0..50 {
            let batches = rng.gen_range(0..40);
            let mut input = Vec::with_capacity(batches * TRIALS_PER_BATCH);
            for _ in 0..batches {
                let threads = rng.gen_range(1..=12);
                let work = rng.gen_range(1000..=2000);
                for _ in 0..TRIALS_PER_BATCH {
                    input.push(m(threads, work, rng.gen_range(0..150_000_000)));
                }
            }

            let points = aggregate(&input, TrialPolicy::strict()).unwrap().points;
            assert_eq!(points.len(), batches);

            let total: u64 = input.iter().map(|m| m.duration_ns).sum();
            let recovered: f64 = points.iter().map(|p| p.mean_duration_ns * 3.0).sum();
            assert_relative_eq!(recovered, total as f64, max_relative = 1e-9);
        }
    }
}
