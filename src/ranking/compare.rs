// Cross-strategy comparison: where does each notable player land under each
// methodology?

use std::collections::BTreeMap;

use crate::ranking::RankingResult;
use crate::stats::Position;

/// One player's ranks across every compared strategy. `None` means the
/// player does not appear in that strategy's result at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub name: String,
    pub position: Position,
    pub ranks: Vec<Option<u32>>,
}

/// Side-by-side ranks for the union of each strategy's top players.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub strategies: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

/// Build a comparison over every player who ranks in the top `top_k` of at
/// least one result. Rows are ordered by player name. A member's rank in a
/// strategy is reported even when it falls outside that strategy's top-k;
/// only total absence yields the sentinel.
pub fn compare(results: &[RankingResult], top_k: usize) -> ComparisonTable {
    let mut members: BTreeMap<String, Position> = BTreeMap::new();
    for result in results {
        for row in &result.rows {
            if row.rank as usize <= top_k {
                members.entry(row.name.clone()).or_insert(row.position);
            }
        }
    }

    let rows = members
        .into_iter()
        .map(|(name, position)| ComparisonRow {
            ranks: results.iter().map(|r| r.rank_of(&name)).collect(),
            name,
            position,
        })
        .collect();

    ComparisonTable {
        strategies: results.iter().map(|r| r.strategy.name().to_string()).collect(),
        rows,
    }
}
