// Player-season statistics: typed records, positions, and cohort hygiene.

pub mod import;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// On-ice position. `Forward` covers rows where the source only reports a
/// generic forward designation instead of C/LW/RW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Center,
    LeftWing,
    RightWing,
    Defenseman,
    Forward,
    Goalie,
}

impl Position {
    /// Parse a position from either the abbreviated form ("C", "LW", ...) or
    /// the spelled-out form used by some sources ("Center", "Left Wing", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "C" | "Center" => Some(Position::Center),
            "LW" | "Left Wing" => Some(Position::LeftWing),
            "RW" | "Right Wing" => Some(Position::RightWing),
            "D" | "Defenseman" | "Defense" => Some(Position::Defenseman),
            "F" | "W" | "Forward" => Some(Position::Forward),
            "G" | "Goalie" | "Goaltender" => Some(Position::Goalie),
            _ => None,
        }
    }

    pub fn abbrev(&self) -> &'static str {
        match self {
            Position::Center => "C",
            Position::LeftWing => "LW",
            Position::RightWing => "RW",
            Position::Defenseman => "D",
            Position::Forward => "F",
            Position::Goalie => "G",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

// ---------------------------------------------------------------------------
// Record trait
// ---------------------------------------------------------------------------

/// A per-player-season stat line the ranking engine can operate on.
///
/// Categories are addressed by canonical field name through [`stat`], which
/// returns `None` for names outside the record's schema. Cross-derived fields
/// are recomputed here rather than read back from storage: `points` is always
/// `goals + assists`, and rate stats with a zero denominator are always `0.0`
/// (never NaN), so no transform downstream has to guard against either.
///
/// [`stat`]: StatRecord::stat
pub trait StatRecord {
    fn player_name(&self) -> &str;
    fn season(&self) -> &str;
    fn position(&self) -> Position;
    fn games_played(&self) -> u32;

    /// Value of a canonical statistic, or `None` if the field is not part of
    /// this record type's schema.
    fn stat(&self, field: &str) -> Option<f64>;

    /// Canonical field names this record type supports.
    fn fields() -> &'static [&'static str];
}

// ---------------------------------------------------------------------------
// Skater record
// ---------------------------------------------------------------------------

/// A skater's counting and rate statistics for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkaterSeason {
    pub name: String,
    pub position: Position,
    pub season: String,
    pub games_played: u32,
    pub goals: u32,
    pub assists: u32,
    pub points: u32,
    pub plus_minus: i32,
    pub penalty_minutes: u32,
    pub power_play_goals: u32,
    pub power_play_points: u32,
    pub short_handed_goals: u32,
    pub short_handed_points: u32,
    pub game_winning_goals: u32,
    pub shots: u32,
    pub shooting_percentage: f64,
    pub face_off_percentage: f64,
    pub face_off_wins: u32,
    pub hits: u32,
    pub blocked_shots: u32,
}

pub const SKATER_FIELDS: &[&str] = &[
    "games_played",
    "goals",
    "assists",
    "points",
    "plus_minus",
    "penalty_minutes",
    "power_play_goals",
    "power_play_points",
    "short_handed_goals",
    "short_handed_points",
    "game_winning_goals",
    "shots",
    "shooting_percentage",
    "face_off_percentage",
    "face_off_wins",
    "hits",
    "blocked_shots",
];

impl StatRecord for SkaterSeason {
    fn player_name(&self) -> &str {
        &self.name
    }

    fn season(&self) -> &str {
        &self.season
    }

    fn position(&self) -> Position {
        self.position
    }

    fn games_played(&self) -> u32 {
        self.games_played
    }

    fn stat(&self, field: &str) -> Option<f64> {
        let v = match field {
            "games_played" => self.games_played as f64,
            "goals" => self.goals as f64,
            "assists" => self.assists as f64,
            // Upstream sources disagree on the stored points column, so it is
            // never trusted; always goals + assists.
            "points" => (self.goals + self.assists) as f64,
            "plus_minus" => self.plus_minus as f64,
            "penalty_minutes" => self.penalty_minutes as f64,
            "power_play_goals" => self.power_play_goals as f64,
            "power_play_points" => self.power_play_points as f64,
            "short_handed_goals" => self.short_handed_goals as f64,
            "short_handed_points" => self.short_handed_points as f64,
            "game_winning_goals" => self.game_winning_goals as f64,
            "shots" => self.shots as f64,
            "shooting_percentage" => {
                if self.shots == 0 {
                    0.0
                } else {
                    self.shooting_percentage
                }
            }
            "face_off_percentage" => self.face_off_percentage,
            "face_off_wins" => self.face_off_wins as f64,
            "hits" => self.hits as f64,
            "blocked_shots" => self.blocked_shots as f64,
            _ => return None,
        };
        Some(v)
    }

    fn fields() -> &'static [&'static str] {
        SKATER_FIELDS
    }
}

// ---------------------------------------------------------------------------
// Goalie record
// ---------------------------------------------------------------------------

/// A goalie's statistics for one season.
///
/// `goals_against` is canonically `shots_against - saves`; the constructor
/// and import path enforce this instead of trusting a separately reported
/// column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalieSeason {
    pub name: String,
    pub season: String,
    pub games_played: u32,
    pub games_started: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub overtime_losses: u32,
    pub saves: u32,
    pub shots_against: u32,
    pub save_percentage: f64,
    pub goals_against_average: f64,
    pub goals_against: u32,
    pub shutouts: u32,
}

pub const GOALIE_FIELDS: &[&str] = &[
    "games_played",
    "games_started",
    "wins",
    "losses",
    "ties",
    "overtime_losses",
    "saves",
    "shots_against",
    "save_percentage",
    "goals_against_average",
    "goals_against",
    "shutouts",
];

impl GoalieSeason {
    /// Recompute the derived `goals_against` field from its canonical source.
    pub fn normalize(mut self) -> Self {
        self.goals_against = self.shots_against.saturating_sub(self.saves);
        self
    }
}

impl StatRecord for GoalieSeason {
    fn player_name(&self) -> &str {
        &self.name
    }

    fn season(&self) -> &str {
        &self.season
    }

    fn position(&self) -> Position {
        Position::Goalie
    }

    fn games_played(&self) -> u32 {
        self.games_played
    }

    fn stat(&self, field: &str) -> Option<f64> {
        let v = match field {
            "games_played" => self.games_played as f64,
            "games_started" => self.games_started as f64,
            "wins" => self.wins as f64,
            "losses" => self.losses as f64,
            "ties" => self.ties as f64,
            "overtime_losses" => self.overtime_losses as f64,
            "saves" => self.saves as f64,
            "shots_against" => self.shots_against as f64,
            "save_percentage" => {
                if self.shots_against == 0 {
                    0.0
                } else {
                    self.save_percentage
                }
            }
            "goals_against_average" => self.goals_against_average,
            "goals_against" => self.shots_against.saturating_sub(self.saves) as f64,
            "shutouts" => self.shutouts as f64,
            _ => return None,
        };
        Some(v)
    }

    fn fields() -> &'static [&'static str] {
        GOALIE_FIELDS
    }
}

// ---------------------------------------------------------------------------
// Cohort hygiene
// ---------------------------------------------------------------------------

/// Collapse duplicate (player, season) rows, keeping the row with the most
/// games played.
///
/// Sources emit one row per team for traded players plus a combined-total row;
/// the combined row always has the highest games-played count, so this keeps
/// the full-season line. When games played also ties, the first row wins.
/// Output preserves the input order of the surviving rows.
pub fn dedupe_by_games<R: StatRecord>(records: Vec<R>) -> Vec<R> {
    let original = records.len();
    let mut best: HashMap<(String, String), usize> = HashMap::new();

    for (idx, rec) in records.iter().enumerate() {
        let key = (rec.player_name().to_string(), rec.season().to_string());
        match best.get(&key) {
            Some(&kept) if records[kept].games_played() >= rec.games_played() => {}
            _ => {
                best.insert(key, idx);
            }
        }
    }

    let mut keep: Vec<usize> = best.into_values().collect();
    keep.sort_unstable();

    let mut kept_flags = vec![false; records.len()];
    for idx in keep {
        kept_flags[idx] = true;
    }

    let deduped: Vec<R> = records
        .into_iter()
        .zip(kept_flags)
        .filter_map(|(rec, keep)| keep.then_some(rec))
        .collect();

    if deduped.len() < original {
        info!(
            removed = original - deduped.len(),
            "collapsed duplicate player-season rows"
        );
    }
    deduped
}

/// Return the first (player, season) pair that appears more than once, if any.
pub fn find_duplicate<R: StatRecord>(cohort: &[&R]) -> Option<(String, String)> {
    let mut seen: HashMap<(&str, &str), ()> = HashMap::with_capacity(cohort.len());
    for rec in cohort {
        let key = (rec.player_name(), rec.season());
        if seen.insert(key, ()).is_some() {
            return Some((key.0.to_string(), key.1.to_string()));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
