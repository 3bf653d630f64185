
//! Global ordering of the encoded chunks.
//!
//! All levels compete for stream positions: the scheduler repeatedly picks
//! the chunk with the highest error reduction per byte. The produced order,
//! together with the accumulated error after every step, is what lets a
//! reader stop after the smallest byte prefix that meets its tolerance.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Error, Result};
use crate::estimate::ErrorEstimator;


/// A candidate refinement in the priority queue: consuming the next chunk
/// of `level` buys `key` error reduction per byte.
#[derive(Debug)]
struct Refinement {
    key: f64,
    sequence: u64,
    level: usize,
}

impl Refinement {
    fn new(key: f64, sequence: u64, level: usize) -> Result<Self> {
        if key.is_nan() {
            return Err(Error::inconsistent("refinement priority is not a number"));
        }

        Ok(Refinement { key, sequence, level })
    }
}

impl PartialEq for Refinement {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Refinement {}

impl PartialOrd for Refinement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Refinement {
    fn cmp(&self, other: &Self) -> Ordering {
        // highest key wins; among equal keys, the earliest insertion wins,
        // which makes the order deterministic
        self.key.total_cmp(&other.key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}


/// Schedule all chunks of all levels into one global retrieval order.
///
/// `level_errors[l]` is the per-plane residual table of level `l`, one entry
/// longer than `level_sizes[l]`. Returns one level index per scheduled chunk,
/// where the `k`-th occurrence of a level refers to its `k`-th plane, and
/// the accumulated error after each step.
///
/// Every level contributes its first chunk before any level is refined
/// further: reconstruction needs at least one chunk per level to
/// bootstrap the pyramid.
pub fn chunk_order(
    level_errors: &[Vec<f64>],
    level_sizes: &[Vec<u32>],
    estimator: &impl ErrorEstimator,
) -> Result<(Vec<u8>, Vec<f64>)>
{
    let level_count = level_sizes.len();

    if level_count == 0 || level_count > 256 {
        return Err(Error::invalid("level count"));
    }

    if level_errors.len() != level_count {
        return Err(Error::invalid("error table count"));
    }

    for (errors, sizes) in level_errors.iter().zip(level_sizes) {
        if sizes.is_empty() || errors.len() != sizes.len() + 1 {
            return Err(Error::invalid("error table length"));
        }
    }

    let chunk_count: usize = level_sizes.iter().map(Vec::len).sum();
    let mut order = Vec::with_capacity(chunk_count);
    let mut error_per_step = Vec::with_capacity(chunk_count);

    let mut next_plane = vec![0_usize; level_count];
    let mut heap = BinaryHeap::with_capacity(level_count);
    let mut sequence = 0_u64;

    let mut accumulated: f64 = (0 .. level_count)
        .map(|level| estimator.estimate(level_errors[level][0], level))
        .sum();

    let mut consume = |level: usize,
                       accumulated: &mut f64,
                       next_plane: &mut Vec<usize>,
                       order: &mut Vec<u8>,
                       error_per_step: &mut Vec<f64>| {
        let plane = next_plane[level];
        *accumulated -= estimator.estimate(level_errors[level][plane], level);
        *accumulated += estimator.estimate(level_errors[level][plane + 1], level);
        next_plane[level] = plane + 1;

        order.push(level as u8);
        error_per_step.push(*accumulated);
    };

    // every level contributes one chunk before any level is refined
    for level in 0 .. level_count {
        consume(level, &mut accumulated, &mut next_plane, &mut order, &mut error_per_step);

        if next_plane[level] < level_sizes[level].len() {
            heap.push(refinement_of(level, &next_plane, accumulated, level_errors, level_sizes, estimator, &mut sequence)?);
        }
    }

    // greedy refinement, best error reduction per byte first
    while let Some(refinement) = heap.pop() {
        let level = refinement.level;
        consume(level, &mut accumulated, &mut next_plane, &mut order, &mut error_per_step);

        if next_plane[level] < level_sizes[level].len() {
            heap.push(refinement_of(level, &next_plane, accumulated, level_errors, level_sizes, estimator, &mut sequence)?);
        }
    }

    debug_assert_eq!(order.len(), chunk_count);
    Ok((order, error_per_step))
}

fn refinement_of(
    level: usize,
    next_plane: &[usize],
    accumulated: f64,
    level_errors: &[Vec<f64>],
    level_sizes: &[Vec<u32>],
    estimator: &impl ErrorEstimator,
    sequence: &mut u64,
) -> Result<Refinement>
{
    let plane = next_plane[level];

    let gain = estimator.estimate_gain(
        accumulated,
        level_errors[level][plane],
        level_errors[level][plane + 1],
        level,
    );

    let refinement = Refinement::new(gain / level_sizes[level][plane] as f64, *sequence, level)?;
    *sequence += 1;

    Ok(refinement)
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::estimate::{ErrorMetric, MaxErrorEstimator, SquaredErrorEstimator};

    fn occurrences(order: &[u8], level: u8) -> usize {
        order.iter().filter(|&&entry| entry == level).count()
    }

    #[test]
    fn two_level_schedule(){
        let errors = vec![
            vec![8.0, 2.0, 0.0],
            vec![4.0, 3.0, 0.0],
        ];
        let sizes = vec![
            vec![4_u32, 4],
            vec![4, 4],
        ];

        let (order, steps) = chunk_order(&errors, &sizes, &MaxErrorEstimator).unwrap();

        // bootstrap emits levels 0 and 1; then level 1 refines first,
        // its remaining chunk gains 3/4 per byte against level 0's 2/4
        assert_eq!(order, vec![0, 1, 1, 0]);
        assert_eq!(steps, vec![6.0, 5.0, 2.0, 0.0]);
    }

    #[test]
    fn order_is_complete(){
        let level_count = 5;
        let plane_count = 12;

        let errors: Vec<Vec<f64>> = (0 .. level_count).map(|level| {
            (0 ..= plane_count).map(|plane| {
                (level + 1) as f64 * (2.0_f64).powi(-(plane as i32)) * (((plane_count - plane) != 0) as u8 as f64)
            }).collect()
        }).collect();

        let sizes = vec![vec![100_u32; plane_count]; level_count];

        let (order, steps) = chunk_order(&errors, &sizes, &MaxErrorEstimator).unwrap();

        assert_eq!(order.len(), level_count * plane_count);
        assert_eq!(steps.len(), order.len());

        for level in 0 .. level_count as u8 {
            assert_eq!(occurrences(&order, level), plane_count, "level {} occurrences", level);
        }
    }

    #[test]
    fn every_level_bootstraps_first(){
        let errors = vec![vec![100.0, 1.0, 0.0]; 4];
        let sizes = vec![vec![10_u32, 10]; 4];

        let (order, _) = chunk_order(&errors, &sizes, &MaxErrorEstimator).unwrap();
        assert_eq!(&order[.. 4], &[0, 1, 2, 3], "one chunk per level before any refinement");
    }

    #[test]
    fn error_decreases_monotonically(){
        let errors: Vec<Vec<f64>> = (0 .. 3).map(|level| {
            (0 ..= 16).map(|plane| 10.0 * (level + 1) as f64 * (2.0_f64).powi(-plane)).collect()
        }).collect();

        let sizes: Vec<Vec<u32>> = (0 .. 3).map(|level| vec![50_u32 * (level + 1); 16]).collect();

        for estimator in &[ErrorMetric::Max, ErrorMetric::Squared] {
            let (order, steps) = match estimator {
                ErrorMetric::Max => chunk_order(&errors, &sizes, &MaxErrorEstimator).unwrap(),
                ErrorMetric::Squared => chunk_order(&errors, &sizes, &SquaredErrorEstimator).unwrap(),
            };

            assert_eq!(order.len(), 3 * 16);

            let mut previous = f64::INFINITY;
            for &step in &steps {
                assert!(step <= previous, "steps must not increase: {} after {}", step, previous);
                previous = step;
            }
        }
    }

    #[test]
    fn terminal_error_is_zero(){
        let errors = vec![
            vec![8.0, 2.0, 0.0],
            vec![4.0, 1.0, 0.0],
        ];
        let sizes = vec![vec![4_u32, 4]; 2];

        let (_, steps) = chunk_order(&errors, &sizes, &MaxErrorEstimator).unwrap();
        assert_eq!(*steps.last().unwrap(), 0.0);
    }

    #[test]
    fn equal_keys_pop_in_insertion_order(){
        // identical tables: every refinement has the same priority,
        // so the schedule must fall back to level order
        let errors = vec![vec![4.0, 2.0, 1.0, 0.0]; 3];
        let sizes = vec![vec![8_u32, 8, 8]; 3];

        let (order, _) = chunk_order(&errors, &sizes, &MaxErrorEstimator).unwrap();
        assert_eq!(order, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn repeated_runs_are_identical(){
        let errors: Vec<Vec<f64>> = (0 .. 4).map(|level| {
            (0 ..= 8).map(|plane| ((level * 31 + plane * 17) % 23) as f64 * (2.0_f64).powi(-plane)).collect()
        }).collect();
        let sizes: Vec<Vec<u32>> = (0 .. 4).map(|level| vec![10 + level as u32; 8]).collect();

        let first = chunk_order(&errors, &sizes, &SquaredErrorEstimator).unwrap();
        let second = chunk_order(&errors, &sizes, &SquaredErrorEstimator).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nan_priority_is_an_internal_error(){
        struct BrokenEstimator;

        impl crate::estimate::ErrorEstimator for BrokenEstimator {
            fn metric(&self) -> ErrorMetric { ErrorMetric::Max }
            fn estimate(&self, level_error: f64, _level: usize) -> f64 { level_error }
            fn estimate_gain(&self, _accumulated: f64, _before: f64, _after: f64, _level: usize) -> f64 { f64::NAN }
        }

        let errors = vec![vec![1.0, 0.5, 0.0]];
        let sizes = vec![vec![4_u32, 4]];

        match chunk_order(&errors, &sizes, &BrokenEstimator) {
            Err(Error::Inconsistent(_)) => {},
            other => panic!("expected an internal invariant error, got {:?}", other),
        }
    }

    #[test]
    fn mismatched_tables_are_rejected(){
        let errors = vec![vec![1.0, 0.0]];
        let sizes = vec![vec![4_u32, 4]];
        assert!(chunk_order(&errors, &sizes, &MaxErrorEstimator).is_err());
    }
}
