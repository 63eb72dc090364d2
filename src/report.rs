// Report emitter: text tables for the terminal, string rows and CSV for
// everything downstream.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::ranking::compare::ComparisonTable;
use crate::ranking::RankingResult;

/// Rendered in place of a rank when a player is absent from a strategy's
/// result.
const NOT_RANKED: &str = "--";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode CSV for {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

// ---------------------------------------------------------------------------
// Ranking reports
// ---------------------------------------------------------------------------

/// Render a ranking as a fixed-width text table. Scores are rounded per the
/// strategy's convention; raw category values keep one decimal place.
pub fn render_text(result: &RankingResult) -> String {
    let decimals = result.strategy.score_decimals();
    let name_width = result
        .rows
        .iter()
        .map(|r| r.name.len())
        .chain(std::iter::once("PLAYER".len()))
        .max()
        .unwrap_or(6);
    let cat_widths: Vec<usize> = result.categories.iter().map(|c| c.len().max(8)).collect();

    let mut out = String::new();
    let _ = writeln!(out, "=== {} rankings ===", result.strategy);
    let _ = write!(out, "{:>4}  {:<name_width$}  {:>3}  {:>10}", "RANK", "PLAYER", "POS", "SCORE");
    for (cat, width) in result.categories.iter().zip(&cat_widths) {
        let _ = write!(out, "  {:>width$}", cat, width = width);
    }
    out.push('\n');

    for row in &result.rows {
        let _ = write!(
            out,
            "{:>4}  {:<name_width$}  {:>3}  {:>10.decimals$}",
            row.rank,
            row.name,
            row.position.abbrev(),
            row.total_score,
        );
        for (value, width) in row.category_values.iter().zip(&cat_widths) {
            let _ = write!(out, "  {:>width$.1}", value, width = width);
        }
        out.push('\n');
    }
    out
}

/// Ranking rows as strings with full float precision, header first. The CSV
/// writer and any tabular consumer share this layout.
pub fn to_rows(result: &RankingResult) -> Vec<Vec<String>> {
    let mut header = vec![
        "name".to_string(),
        "position".to_string(),
        "rank".to_string(),
        "total_score".to_string(),
    ];
    header.extend(result.categories.iter().cloned());

    let mut rows = vec![header];
    for row in &result.rows {
        let mut record = vec![
            row.name.clone(),
            row.position.abbrev().to_string(),
            row.rank.to_string(),
            row.total_score.to_string(),
        ];
        record.extend(row.category_values.iter().map(|v| v.to_string()));
        rows.push(record);
    }
    rows
}

/// Persist a ranking as CSV.
pub fn write_csv(result: &RankingResult, path: &Path) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    for row in to_rows(result) {
        writer.write_record(&row).map_err(|e| csv_error(path, e))?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), rows = result.rows.len(), "wrote ranking CSV");
    Ok(())
}

fn csv_error(path: &Path, source: csv::Error) -> ReportError {
    ReportError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Comparison reports
// ---------------------------------------------------------------------------

/// Render a cross-strategy comparison as a fixed-width text table.
pub fn render_comparison(table: &ComparisonTable) -> String {
    let name_width = table
        .rows
        .iter()
        .map(|r| r.name.len())
        .chain(std::iter::once("PLAYER".len()))
        .max()
        .unwrap_or(6);
    let col_widths: Vec<usize> = table.strategies.iter().map(|s| s.len().max(4)).collect();

    let mut out = String::new();
    let _ = writeln!(out, "=== strategy comparison ===");
    let _ = write!(out, "{:<name_width$}  {:>3}", "PLAYER", "POS");
    for (strategy, width) in table.strategies.iter().zip(&col_widths) {
        let _ = write!(out, "  {:>width$}", strategy, width = width);
    }
    out.push('\n');

    for row in &table.rows {
        let _ = write!(out, "{:<name_width$}  {:>3}", row.name, row.position.abbrev());
        for (rank, width) in row.ranks.iter().zip(&col_widths) {
            match rank {
                Some(r) => {
                    let _ = write!(out, "  {:>width$}", r, width = width);
                }
                None => {
                    let _ = write!(out, "  {:>width$}", NOT_RANKED, width = width);
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Comparison rows as strings, header first.
pub fn comparison_rows(table: &ComparisonTable) -> Vec<Vec<String>> {
    let mut header = vec!["name".to_string(), "position".to_string()];
    header.extend(table.strategies.iter().cloned());

    let mut rows = vec![header];
    for row in &table.rows {
        let mut record = vec![row.name.clone(), row.position.abbrev().to_string()];
        record.extend(row.ranks.iter().map(|r| match r {
            Some(rank) => rank.to_string(),
            None => NOT_RANKED.to_string(),
        }));
        rows.push(record);
    }
    rows
}

/// Persist a comparison table as CSV.
pub fn write_comparison_csv(table: &ComparisonTable, path: &Path) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    for row in comparison_rows(table) {
        writer.write_record(&row).map_err(|e| csv_error(path, e))?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
