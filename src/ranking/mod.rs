// Ranking engine: turns a cohort of stat records into an ordered report
// under a chosen strategy.

pub mod category;
pub mod compare;
pub mod strategy;
pub mod transform;

use thiserror::Error;
use tracing::debug;

use crate::stats::{find_duplicate, Position, StatRecord};
pub use category::{default_goalie_categories, default_skater_categories, Category};
pub use strategy::Strategy;
use transform::dense_rank;

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("unknown category '{0}' for this record type")]
    InvalidCategory(String),

    #[error("cohort is empty after filtering; nothing to rank")]
    EmptyCohort,

    #[error("duplicate player-season row: {name} / {season}")]
    DuplicateKey { name: String, season: String },
}

/// One player's line in a ranking result.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPlayer {
    pub name: String,
    pub position: Position,
    pub total_score: f64,
    pub rank: u32,
    /// Raw category values in the order the categories were supplied.
    pub category_values: Vec<f64>,
}

/// A complete ranking under one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingResult {
    pub strategy: Strategy,
    pub categories: Vec<String>,
    pub rows: Vec<RankedPlayer>,
}

impl RankingResult {
    /// Rank for a player by name, if present.
    pub fn rank_of(&self, name: &str) -> Option<u32> {
        self.rows.iter().find(|r| r.name == name).map(|r| r.rank)
    }
}

/// Rank a cohort under one strategy.
///
/// The optional filter narrows the cohort before anything is computed, so
/// every transform sees only the filtered population. Fails fast and whole:
/// an unknown category, an empty filtered cohort, or a duplicate
/// (player, season) key yields an error and no partial result.
///
/// Output rows are ordered by rank ascending, ties broken by name, so a
/// rerun over the same records is bit-identical.
pub fn rank<R: StatRecord>(
    cohort: &[R],
    categories: &[Category],
    strategy: Strategy,
    filter: Option<&dyn Fn(&R) -> bool>,
) -> Result<RankingResult, RankingError> {
    let selected: Vec<&R> = match filter {
        Some(pred) => cohort.iter().filter(|r| pred(r)).collect(),
        None => cohort.iter().collect(),
    };

    if selected.is_empty() {
        return Err(RankingError::EmptyCohort);
    }

    if let Some((name, season)) = find_duplicate(&selected) {
        return Err(RankingError::DuplicateKey { name, season });
    }

    // Validate every category against the record schema before extracting
    // anything, so failures never depend on cohort contents.
    for cat in categories {
        if !R::fields().contains(&cat.name.as_str()) {
            return Err(RankingError::InvalidCategory(cat.name.clone()));
        }
    }

    let columns: Vec<Vec<f64>> = categories
        .iter()
        .map(|cat| {
            selected
                .iter()
                .map(|r| {
                    r.stat(&cat.name)
                        .ok_or_else(|| RankingError::InvalidCategory(cat.name.clone()))
                })
                .collect::<Result<Vec<f64>, RankingError>>()
        })
        .collect::<Result<Vec<Vec<f64>>, RankingError>>()?;

    let positions: Vec<Position> = selected.iter().map(|r| r.position()).collect();
    let games: Vec<u32> = selected.iter().map(|r| r.games_played()).collect();

    let totals = strategy.scores(categories, &columns, &positions, &games);
    let ranks = dense_rank(&totals, strategy.direction());

    debug!(
        strategy = %strategy,
        players = selected.len(),
        categories = categories.len(),
        "ranking computed"
    );

    let mut rows: Vec<RankedPlayer> = selected
        .iter()
        .enumerate()
        .map(|(i, r)| RankedPlayer {
            name: r.player_name().to_string(),
            position: positions[i],
            total_score: totals[i],
            rank: ranks[i],
            category_values: columns.iter().map(|col| col[i]).collect(),
        })
        .collect();

    rows.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.name.cmp(&b.name)));

    Ok(RankingResult {
        strategy,
        categories: categories.iter().map(|c| c.name.clone()).collect(),
        rows,
    })
}
