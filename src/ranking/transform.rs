// Category transforms: pure, direction-aware functions over a cohort column.
//
// Every function here is deterministic and side-effect-free. Degenerate
// inputs (empty column, zero spread, zero denominator) produce zeros, never
// NaN and never an error; callers that care log the condition.

use serde::{Deserialize, Serialize};

/// Sample standard deviations below this are treated as zero spread.
pub const STDEV_EPSILON: f64 = 1e-9;

/// Whether a larger raw value is better for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Mean and sample standard deviation of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohortStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Compute mean and sample (N-1) standard deviation.
///
/// Fewer than two values cannot have a spread; stdev is 0 and downstream
/// z-scores degenerate to 0 for every member.
pub fn cohort_stats(values: &[f64]) -> CohortStats {
    let n = values.len();
    if n == 0 {
        return CohortStats { mean: 0.0, stdev: 0.0 };
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return CohortStats { mean, stdev: 0.0 };
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    CohortStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Dense rank of each value within the column: best value gets rank 1, tied
/// values share a rank, and ranks have no gaps.
pub fn dense_rank(values: &[f64], direction: Direction) -> Vec<u32> {
    let mut distinct: Vec<f64> = values.to_vec();
    distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    distinct.dedup();

    values
        .iter()
        .map(|v| {
            // Index of v among the distinct sorted values.
            let pos = distinct.partition_point(|d| d < v);
            let rank = match direction {
                Direction::HigherIsBetter => distinct.len() - pos,
                Direction::LowerIsBetter => pos + 1,
            };
            rank as u32
        })
        .collect()
}

/// Percentile of each value: the fraction of the cohort at or below it
/// (at or above when lower is better), scaled to [0, 100]. The best value
/// always scores exactly 100; tied values share a percentile.
pub fn percentile(values: &[f64], direction: Direction) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    values
        .iter()
        .map(|v| {
            let count = match direction {
                Direction::HigherIsBetter => values.iter().filter(|o| **o <= *v).count(),
                Direction::LowerIsBetter => values.iter().filter(|o| **o >= *v).count(),
            };
            count as f64 / n as f64 * 100.0
        })
        .collect()
}

/// Z-score of each value against the column's mean and sample stdev. With
/// lower-is-better categories the sign flips so a good value is still a
/// positive score. Zero spread yields 0 for every member.
pub fn zscore(values: &[f64], direction: Direction) -> Vec<f64> {
    let stats = cohort_stats(values);
    if stats.stdev < STDEV_EPSILON {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|v| match direction {
            Direction::HigherIsBetter => (v - stats.mean) / stats.stdev,
            Direction::LowerIsBetter => (stats.mean - v) / stats.stdev,
        })
        .collect()
}

/// Min-max normalization to [0, 1], with 1 always the best value. A column
/// with no spread yields 0 for every member.
pub fn min_max(values: &[f64], direction: Direction) -> Vec<f64> {
    let (min, max) = match values.iter().fold(None, |acc: Option<(f64, f64)>, v| {
        Some(match acc {
            None => (*v, *v),
            Some((lo, hi)) => (lo.min(*v), hi.max(*v)),
        })
    }) {
        Some(bounds) => bounds,
        None => return Vec::new(),
    };

    let span = max - min;
    if span.abs() < STDEV_EPSILON {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|v| match direction {
            Direction::HigherIsBetter => (v - min) / span,
            Direction::LowerIsBetter => (max - v) / span,
        })
        .collect()
}

/// Per-game rate. A player with no games has no rate; 0, not NaN.
pub fn per_game(value: f64, games_played: u32) -> f64 {
    if games_played == 0 {
        0.0
    } else {
        value / games_played as f64
    }
}
