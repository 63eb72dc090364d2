// Puckdraft entry point.
//
// Command flow:
// 1. Initialize tracing (log to stderr, reports go to stdout)
// 2. Parse CLI arguments
// 3. Load config
// 4. Open database
// 5. Dispatch the subcommand

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use puckdraft::config;
use puckdraft::db::Store;
use puckdraft::ranking::{self, compare::compare, Category, RankingResult, Strategy};
use puckdraft::report;
use puckdraft::stats::{import, Position, StatRecord};

#[derive(Parser)]
#[command(name = "puckdraft", about = "Fantasy hockey draft preparation rankings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a skater stats CSV for a season
    ImportSkaters {
        /// Path to the NHL.com-style skater summary CSV
        csv: PathBuf,
        /// Season tag, e.g. 2025
        #[arg(long)]
        season: String,
    },
    /// Import a goalie stats CSV for a season
    ImportGoalies {
        csv: PathBuf,
        #[arg(long)]
        season: String,
    },
    /// Rank a season's cohort under one strategy
    Rank {
        #[arg(long)]
        season: String,
        /// Rank goalies instead of skaters
        #[arg(long)]
        goalies: bool,
        /// weighted, percentile, zscore, normalized, rank-sum,
        /// position-adjusted, or per-game
        #[arg(long, default_value = "zscore")]
        strategy: String,
        /// Exclude players below this games-played floor
        #[arg(long)]
        min_games: Option<u32>,
        /// Only rank players at this position (C, LW, RW, D, F)
        #[arg(long)]
        position: Option<String>,
        /// Also write the ranking to a CSV file
        #[arg(long)]
        csv_out: Option<PathBuf>,
    },
    /// Compare where players land under several strategies
    Compare {
        #[arg(long)]
        season: String,
        #[arg(long)]
        goalies: bool,
        /// Include everyone in some strategy's top K
        #[arg(long, default_value_t = 10)]
        top_k: usize,
        #[arg(long)]
        min_games: Option<u32>,
        #[arg(long)]
        csv_out: Option<PathBuf>,
    },
    /// Top players for a single category
    Leaders {
        #[arg(long)]
        season: String,
        /// Category field name, e.g. goals or save_percentage
        category: String,
        #[arg(long)]
        goalies: bool,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        min_games: Option<u32>,
        #[arg(long)]
        position: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = config::load_config().context("failed to load configuration")?;
    info!(league = %config.league.name, "config loaded");

    let store = Store::open(&config.database.path).context("failed to open database")?;

    match cli.command {
        Commands::ImportSkaters { csv, season } => {
            let records = import::read_skaters(&csv, &season)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            let import_id = store.import_skaters(&records, &csv.display().to_string())?;
            store.save_meta(
                "last_import",
                &serde_json::json!({ "id": import_id, "rows": records.len() }),
            )?;
            println!(
                "Imported {} skater seasons for {} (batch {})",
                records.len(),
                season,
                import_id
            );
        }

        Commands::ImportGoalies { csv, season } => {
            let records = import::read_goalies(&csv, &season)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            let import_id = store.import_goalies(&records, &csv.display().to_string())?;
            store.save_meta(
                "last_import",
                &serde_json::json!({ "id": import_id, "rows": records.len() }),
            )?;
            println!(
                "Imported {} goalie seasons for {} (batch {})",
                records.len(),
                season,
                import_id
            );
        }

        Commands::Rank {
            season,
            goalies,
            strategy,
            min_games,
            position,
            csv_out,
        } => {
            let strategy = parse_strategy(&strategy)?;
            let result = if goalies {
                let cohort = store.load_goalies(&season)?;
                rank_cohort(&cohort, &config.goalie_categories(), strategy, min_games, position)?
            } else {
                let cohort = store.load_skaters(&season)?;
                rank_cohort(&cohort, &config.skater_categories(), strategy, min_games, position)?
            };

            print!("{}", report::render_text(&result));
            if let Some(path) = csv_out {
                report::write_csv(&result, &path)?;
                println!("Wrote {}", path.display());
            }
        }

        Commands::Compare {
            season,
            goalies,
            top_k,
            min_games,
            csv_out,
        } => {
            let results = if goalies {
                let cohort = store.load_goalies(&season)?;
                let categories = config.goalie_categories();
                GOALIE_COMPARE_STRATEGIES
                    .iter()
                    .map(|s| rank_cohort(&cohort, &categories, *s, min_games, None))
                    .collect::<anyhow::Result<Vec<_>>>()?
            } else {
                let cohort = store.load_skaters(&season)?;
                let categories = config.skater_categories();
                SKATER_COMPARE_STRATEGIES
                    .iter()
                    .map(|s| rank_cohort(&cohort, &categories, *s, min_games, None))
                    .collect::<anyhow::Result<Vec<_>>>()?
            };

            let table = compare(&results, top_k);
            print!("{}", report::render_comparison(&table));
            if let Some(path) = csv_out {
                report::write_comparison_csv(&table, &path)?;
                println!("Wrote {}", path.display());
            }
        }

        Commands::Leaders {
            season,
            category,
            goalies,
            limit,
            min_games,
            position,
        } => {
            if goalies {
                let cohort = store.load_goalies(&season)?;
                // Rate-stat leaderboards are noise without a games floor.
                let floor = min_games.unwrap_or(config.filters.min_goalie_games);
                print_leaders(&cohort, &category, limit, Some(floor), None)?;
            } else {
                let cohort = store.load_skaters(&season)?;
                print_leaders(&cohort, &category, limit, min_games, position)?;
            }
        }
    }

    Ok(())
}

/// Strategies compared side by side for skater cohorts.
const SKATER_COMPARE_STRATEGIES: &[Strategy] = &[
    Strategy::Weighted,
    Strategy::Percentile,
    Strategy::ZScore,
    Strategy::PositionAdjusted,
    Strategy::PerGameEfficiency,
];

/// Strategies compared side by side for goalie cohorts.
const GOALIE_COMPARE_STRATEGIES: &[Strategy] =
    &[Strategy::Percentile, Strategy::ZScore, Strategy::Normalized];

fn parse_strategy(name: &str) -> anyhow::Result<Strategy> {
    match Strategy::parse(name) {
        Some(s) => Ok(s),
        None => {
            let known: Vec<&str> = Strategy::ALL.iter().map(|s| s.name()).collect();
            bail!("unknown strategy '{name}'; expected one of: {}", known.join(", "))
        }
    }
}

fn parse_position(name: &str) -> anyhow::Result<Position> {
    Position::parse(name).with_context(|| format!("unknown position '{name}'"))
}

/// Apply the CLI's games-played and position filters and run the ranking.
fn rank_cohort<R: StatRecord>(
    cohort: &[R],
    categories: &[Category],
    strategy: Strategy,
    min_games: Option<u32>,
    position: Option<String>,
) -> anyhow::Result<RankingResult> {
    let position = position.as_deref().map(parse_position).transpose()?;
    let filter = move |r: &R| {
        min_games.map_or(true, |floor| r.games_played() >= floor)
            && position.map_or(true, |p| r.position() == p)
    };

    let result = ranking::rank(cohort, categories, strategy, Some(&filter))
        .with_context(|| format!("{strategy} ranking failed"))?;
    Ok(result)
}

/// Print the top players for one category, best first.
fn print_leaders<R: StatRecord>(
    cohort: &[R],
    category: &str,
    limit: usize,
    min_games: Option<u32>,
    position: Option<String>,
) -> anyhow::Result<()> {
    if !R::fields().contains(&category) {
        bail!("unknown category '{category}'");
    }
    let position = position.as_deref().map(parse_position).transpose()?;
    let cat = Category::new(category);

    let mut leaders: Vec<(&R, f64)> = cohort
        .iter()
        .filter(|r| min_games.map_or(true, |floor| r.games_played() >= floor))
        .filter(|r| position.map_or(true, |p| r.position() == p))
        .map(|r| (r, r.stat(category).unwrap_or(0.0)))
        .collect();

    if leaders.is_empty() {
        bail!("no players match the leaders filters");
    }

    leaders.sort_by(|a, b| {
        use puckdraft::ranking::transform::Direction;
        let ord = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
        match cat.direction {
            Direction::HigherIsBetter => ord.reverse(),
            Direction::LowerIsBetter => ord,
        }
        .then_with(|| a.0.player_name().cmp(b.0.player_name()))
    });

    println!("=== {category} leaders ===");
    for (i, (rec, value)) in leaders.iter().take(limit).enumerate() {
        println!(
            "{:>3}. {:<24} {:>3}  {:>8.1}",
            i + 1,
            rec.player_name(),
            rec.position().abbrev(),
            value
        );
    }
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("puckdraft=info,warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}
