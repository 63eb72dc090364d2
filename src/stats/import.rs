// CSV import: raw NHL.com-style stat exports into typed season records.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::stats::{dedupe_by_games, GoalieSeason, Position, SkaterSeason};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to read stats file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stats file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid stats row: {0}")]
    Validation(String),
}

// Column names follow the NHL.com summary export. Stats columns default to
// zero because partial-season exports omit trailing columns for some rows.

#[derive(Debug, Deserialize)]
struct RawSkaterRow {
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "Pos")]
    position: String,
    #[serde(rename = "GP", default)]
    games_played: u32,
    #[serde(rename = "G", default)]
    goals: u32,
    #[serde(rename = "A", default)]
    assists: u32,
    #[serde(rename = "P", default)]
    points: u32,
    #[serde(rename = "+/-", default)]
    plus_minus: i32,
    #[serde(rename = "PIM", default)]
    penalty_minutes: u32,
    #[serde(rename = "PPG", default)]
    power_play_goals: u32,
    #[serde(rename = "PPP", default)]
    power_play_points: u32,
    #[serde(rename = "SHG", default)]
    short_handed_goals: u32,
    #[serde(rename = "SHP", default)]
    short_handed_points: u32,
    #[serde(rename = "GWG", default)]
    game_winning_goals: u32,
    #[serde(rename = "S", default)]
    shots: u32,
    #[serde(rename = "S%", default)]
    shooting_percentage: f64,
    #[serde(rename = "FOW%", default)]
    face_off_percentage: f64,
    #[serde(rename = "FOW", default)]
    face_off_wins: u32,
    #[serde(rename = "HIT", default)]
    hits: u32,
    #[serde(rename = "BLK", default)]
    blocked_shots: u32,
}

#[derive(Debug, Deserialize)]
struct RawGoalieRow {
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "GP", default)]
    games_played: u32,
    #[serde(rename = "GS", default)]
    games_started: u32,
    #[serde(rename = "W", default)]
    wins: u32,
    #[serde(rename = "L", default)]
    losses: u32,
    #[serde(rename = "T", default)]
    ties: u32,
    #[serde(rename = "OT", default)]
    overtime_losses: u32,
    #[serde(rename = "SV", default)]
    saves: u32,
    #[serde(rename = "SA", default)]
    shots_against: u32,
    #[serde(rename = "SV%", default)]
    save_percentage: f64,
    #[serde(rename = "GAA", default)]
    goals_against_average: f64,
    #[serde(rename = "SO", default)]
    shutouts: u32,
}

/// Read a skater stats CSV, tagging every row with `season`. Duplicate
/// (player, season) rows collapse to the one with the most games played.
pub fn read_skaters(path: &Path, season: &str) -> Result<Vec<SkaterSeason>, ImportError> {
    let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();

    for row in reader.deserialize::<RawSkaterRow>() {
        let raw = row.map_err(|e| csv_error(path, e))?;
        let position = Position::parse(&raw.position).ok_or_else(|| {
            ImportError::Validation(format!(
                "unknown position '{}' for player '{}'",
                raw.position, raw.player
            ))
        })?;
        if position == Position::Goalie {
            return Err(ImportError::Validation(format!(
                "goalie '{}' found in skater file",
                raw.player
            )));
        }

        records.push(SkaterSeason {
            name: raw.player,
            position,
            season: season.to_string(),
            games_played: raw.games_played,
            goals: raw.goals,
            assists: raw.assists,
            points: raw.points,
            plus_minus: raw.plus_minus,
            penalty_minutes: raw.penalty_minutes,
            power_play_goals: raw.power_play_goals,
            power_play_points: raw.power_play_points,
            short_handed_goals: raw.short_handed_goals,
            short_handed_points: raw.short_handed_points,
            game_winning_goals: raw.game_winning_goals,
            shots: raw.shots,
            shooting_percentage: raw.shooting_percentage,
            face_off_percentage: raw.face_off_percentage,
            face_off_wins: raw.face_off_wins,
            hits: raw.hits,
            blocked_shots: raw.blocked_shots,
        });
    }

    let records = dedupe_by_games(records);
    info!(path = %path.display(), players = records.len(), season, "imported skater stats");
    Ok(records)
}

/// Read a goalie stats CSV, tagging every row with `season`. Goals against
/// is derived from shots against and saves, not read from the file.
pub fn read_goalies(path: &Path, season: &str) -> Result<Vec<GoalieSeason>, ImportError> {
    let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();

    for row in reader.deserialize::<RawGoalieRow>() {
        let raw = row.map_err(|e| csv_error(path, e))?;
        let record = GoalieSeason {
            name: raw.player,
            season: season.to_string(),
            games_played: raw.games_played,
            games_started: raw.games_started,
            wins: raw.wins,
            losses: raw.losses,
            ties: raw.ties,
            overtime_losses: raw.overtime_losses,
            saves: raw.saves,
            shots_against: raw.shots_against,
            save_percentage: raw.save_percentage,
            goals_against_average: raw.goals_against_average,
            goals_against: 0,
            shutouts: raw.shutouts,
        }
        .normalize();
        records.push(record);
    }

    let records = dedupe_by_games(records);
    info!(path = %path.display(), goalies = records.len(), season, "imported goalie stats");
    Ok(records)
}

fn csv_error(path: &Path, source: csv::Error) -> ImportError {
    ImportError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
