// Ranking strategies: how category columns aggregate into a total score.

use std::collections::BTreeMap;

use tracing::warn;

use crate::ranking::category::Category;
use crate::ranking::transform::{
    cohort_stats, dense_rank, min_max, per_game, percentile, zscore, Direction, STDEV_EPSILON,
};
use crate::stats::Position;

/// A scoring methodology. Each strategy maps category columns to one total
/// score per player and declares which direction of that total is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Raw values scaled by league weights and position multipliers.
    Weighted,
    /// Sum of within-cohort percentiles.
    Percentile,
    /// Sum of z-scores against the cohort mean.
    ZScore,
    /// Sum of min-max normalized values.
    Normalized,
    /// Sum of global per-category dense ranks.
    RankSum,
    /// Sum of dense ranks computed within each position group.
    PositionAdjusted,
    /// Per-game rates, ranked globally, ranks summed.
    PerGameEfficiency,
}

impl Strategy {
    pub const ALL: &'static [Strategy] = &[
        Strategy::Weighted,
        Strategy::Percentile,
        Strategy::ZScore,
        Strategy::Normalized,
        Strategy::RankSum,
        Strategy::PositionAdjusted,
        Strategy::PerGameEfficiency,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Weighted => "weighted",
            Strategy::Percentile => "percentile",
            Strategy::ZScore => "zscore",
            Strategy::Normalized => "normalized",
            Strategy::RankSum => "rank-sum",
            Strategy::PositionAdjusted => "position-adjusted",
            Strategy::PerGameEfficiency => "per-game",
        }
    }

    pub fn parse(s: &str) -> Option<Strategy> {
        Strategy::ALL.iter().copied().find(|st| st.name() == s)
    }

    /// Direction of the aggregate score. Rank-sum style strategies count
    /// down (a smaller rank total is better).
    pub fn direction(&self) -> Direction {
        match self {
            Strategy::Weighted
            | Strategy::Percentile
            | Strategy::ZScore
            | Strategy::Normalized => Direction::HigherIsBetter,
            Strategy::RankSum | Strategy::PositionAdjusted | Strategy::PerGameEfficiency => {
                Direction::LowerIsBetter
            }
        }
    }

    /// Decimal places for total scores in text reports.
    pub fn score_decimals(&self) -> usize {
        match self {
            Strategy::Weighted | Strategy::Percentile => 1,
            Strategy::ZScore => 2,
            Strategy::Normalized => 3,
            Strategy::RankSum | Strategy::PositionAdjusted | Strategy::PerGameEfficiency => 0,
        }
    }

    /// Aggregate category columns into a total score per player.
    ///
    /// `columns[c][i]` is player `i`'s value for category `c`; positions and
    /// games played are parallel to the cohort.
    pub fn scores(
        &self,
        categories: &[Category],
        columns: &[Vec<f64>],
        positions: &[Position],
        games: &[u32],
    ) -> Vec<f64> {
        let n = positions.len();
        let mut totals = vec![0.0; n];

        for (cat, column) in categories.iter().zip(columns) {
            if cohort_stats(column).stdev < STDEV_EPSILON {
                warn!(
                    category = %cat.name,
                    "category has no spread in this cohort; contributes nothing"
                );
            }

            let contributions: Vec<f64> = match self {
                Strategy::Weighted => column
                    .iter()
                    .zip(positions)
                    .map(|(v, pos)| {
                        let mult = cat
                            .position_weights
                            .map(|w| w.multiplier(*pos))
                            .unwrap_or(1.0);
                        // An inverted raw category subtracts from the total;
                        // there is no cohort-relative transform to flip here.
                        let sign = match cat.direction {
                            Direction::HigherIsBetter => 1.0,
                            Direction::LowerIsBetter => -1.0,
                        };
                        sign * v * cat.weight * mult
                    })
                    .collect(),
                Strategy::Percentile => percentile(column, cat.direction),
                Strategy::ZScore => zscore(column, cat.direction),
                Strategy::Normalized => min_max(column, cat.direction),
                Strategy::RankSum => dense_rank(column, cat.direction)
                    .into_iter()
                    .map(|r| r as f64)
                    .collect(),
                Strategy::PositionAdjusted => rank_within_positions(column, positions, cat.direction),
                Strategy::PerGameEfficiency => {
                    let rates: Vec<f64> = column
                        .iter()
                        .zip(games)
                        .map(|(v, gp)| per_game(*v, *gp))
                        .collect();
                    dense_rank(&rates, cat.direction)
                        .into_iter()
                        .map(|r| r as f64)
                        .collect()
                }
            };

            for (total, c) in totals.iter_mut().zip(contributions) {
                *total += c;
            }
        }

        totals
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Dense-rank a column separately inside each position group, then scatter
/// the ranks back to cohort order. A center is only ever measured against
/// other centers here.
fn rank_within_positions(
    column: &[f64],
    positions: &[Position],
    direction: Direction,
) -> Vec<f64> {
    let mut groups: BTreeMap<Position, Vec<usize>> = BTreeMap::new();
    for (idx, pos) in positions.iter().enumerate() {
        groups.entry(*pos).or_default().push(idx);
    }

    let mut out = vec![0.0; column.len()];
    for indices in groups.values() {
        let values: Vec<f64> = indices.iter().map(|i| column[*i]).collect();
        let ranks = dense_rank(&values, direction);
        for (i, rank) in indices.iter().zip(ranks) {
            out[*i] = rank as f64;
        }
    }
    out
}
