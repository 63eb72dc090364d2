// SQLite persistence layer for imported player-season statistics.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::stats::{GoalieSeason, Position, SkaterSeason};

/// SQLite-backed store for skater seasons, goalie seasons, import history,
/// and key-value metadata.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS skater_seasons (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                name                TEXT NOT NULL,
                position            TEXT NOT NULL,
                season              TEXT NOT NULL,
                games_played        INTEGER NOT NULL,
                goals               INTEGER NOT NULL,
                assists             INTEGER NOT NULL,
                points              INTEGER NOT NULL,
                plus_minus          INTEGER NOT NULL,
                penalty_minutes     INTEGER NOT NULL,
                power_play_goals    INTEGER NOT NULL,
                power_play_points   INTEGER NOT NULL,
                short_handed_goals  INTEGER NOT NULL,
                short_handed_points INTEGER NOT NULL,
                game_winning_goals  INTEGER NOT NULL,
                shots               INTEGER NOT NULL,
                shooting_percentage REAL NOT NULL,
                face_off_percentage REAL NOT NULL,
                face_off_wins       INTEGER NOT NULL,
                hits                INTEGER NOT NULL,
                blocked_shots       INTEGER NOT NULL,
                UNIQUE(name, season)
            );

            CREATE TABLE IF NOT EXISTS goalie_seasons (
                id                    INTEGER PRIMARY KEY AUTOINCREMENT,
                name                  TEXT NOT NULL,
                season                TEXT NOT NULL,
                games_played          INTEGER NOT NULL,
                games_started         INTEGER NOT NULL,
                wins                  INTEGER NOT NULL,
                losses                INTEGER NOT NULL,
                ties                  INTEGER NOT NULL,
                overtime_losses       INTEGER NOT NULL,
                saves                 INTEGER NOT NULL,
                shots_against         INTEGER NOT NULL,
                save_percentage       REAL NOT NULL,
                goals_against_average REAL NOT NULL,
                goals_against         INTEGER NOT NULL,
                shutouts              INTEGER NOT NULL,
                UNIQUE(name, season)
            );

            CREATE TABLE IF NOT EXISTS import_log (
                import_id   TEXT PRIMARY KEY,
                kind        TEXT NOT NULL,
                source      TEXT NOT NULL,
                row_count   INTEGER NOT NULL,
                imported_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_skater_seasons_season
                ON skater_seasons(season);
            CREATE INDEX IF NOT EXISTS idx_goalie_seasons_season
                ON goalie_seasons(season);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Generate a new unique import batch ID based on the current UTC
    /// timestamp.
    ///
    /// Format: `import_YYYYMMDD_HHMMSS_SSS`. The millisecond suffix keeps
    /// two imports in the same second distinct.
    pub fn generate_import_id() -> String {
        let now = chrono::Utc::now();
        now.format("import_%Y%m%d_%H%M%S_%3f").to_string()
    }

    /// Import skater seasons in a single transaction and record the batch in
    /// the import log. Re-importing a (name, season) row overwrites it.
    /// Returns the import batch ID.
    pub fn import_skaters(&self, records: &[SkaterSeason], source: &str) -> Result<String> {
        let import_id = Self::generate_import_id();
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin import transaction")?;

        for rec in records {
            tx.execute(
                "INSERT INTO skater_seasons
                    (name, position, season, games_played, goals, assists, points,
                     plus_minus, penalty_minutes, power_play_goals, power_play_points,
                     short_handed_goals, short_handed_points, game_winning_goals,
                     shots, shooting_percentage, face_off_percentage, face_off_wins,
                     hits, blocked_shots)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                         ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
                 ON CONFLICT(name, season) DO UPDATE SET
                    position            = excluded.position,
                    games_played        = excluded.games_played,
                    goals               = excluded.goals,
                    assists             = excluded.assists,
                    points              = excluded.points,
                    plus_minus          = excluded.plus_minus,
                    penalty_minutes     = excluded.penalty_minutes,
                    power_play_goals    = excluded.power_play_goals,
                    power_play_points   = excluded.power_play_points,
                    short_handed_goals  = excluded.short_handed_goals,
                    short_handed_points = excluded.short_handed_points,
                    game_winning_goals  = excluded.game_winning_goals,
                    shots               = excluded.shots,
                    shooting_percentage = excluded.shooting_percentage,
                    face_off_percentage = excluded.face_off_percentage,
                    face_off_wins       = excluded.face_off_wins,
                    hits                = excluded.hits,
                    blocked_shots       = excluded.blocked_shots",
                params![
                    rec.name,
                    rec.position.abbrev(),
                    rec.season,
                    rec.games_played,
                    rec.goals,
                    rec.assists,
                    rec.points,
                    rec.plus_minus,
                    rec.penalty_minutes,
                    rec.power_play_goals,
                    rec.power_play_points,
                    rec.short_handed_goals,
                    rec.short_handed_points,
                    rec.game_winning_goals,
                    rec.shots,
                    rec.shooting_percentage,
                    rec.face_off_percentage,
                    rec.face_off_wins,
                    rec.hits,
                    rec.blocked_shots,
                ],
            )
            .context("failed to upsert skater season in batch")?;
        }

        tx.execute(
            "INSERT INTO import_log (import_id, kind, source, row_count)
             VALUES (?1, 'skaters', ?2, ?3)",
            params![import_id, source, records.len()],
        )
        .context("failed to record import batch")?;

        tx.commit().context("failed to commit import")?;
        Ok(import_id)
    }

    /// Import goalie seasons in a single transaction and record the batch in
    /// the import log. Returns the import batch ID.
    pub fn import_goalies(&self, records: &[GoalieSeason], source: &str) -> Result<String> {
        let import_id = Self::generate_import_id();
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin import transaction")?;

        for rec in records {
            tx.execute(
                "INSERT INTO goalie_seasons
                    (name, season, games_played, games_started, wins, losses, ties,
                     overtime_losses, saves, shots_against, save_percentage,
                     goals_against_average, goals_against, shutouts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(name, season) DO UPDATE SET
                    games_played          = excluded.games_played,
                    games_started         = excluded.games_started,
                    wins                  = excluded.wins,
                    losses                = excluded.losses,
                    ties                  = excluded.ties,
                    overtime_losses       = excluded.overtime_losses,
                    saves                 = excluded.saves,
                    shots_against         = excluded.shots_against,
                    save_percentage       = excluded.save_percentage,
                    goals_against_average = excluded.goals_against_average,
                    goals_against         = excluded.goals_against,
                    shutouts              = excluded.shutouts",
                params![
                    rec.name,
                    rec.season,
                    rec.games_played,
                    rec.games_started,
                    rec.wins,
                    rec.losses,
                    rec.ties,
                    rec.overtime_losses,
                    rec.saves,
                    rec.shots_against,
                    rec.save_percentage,
                    rec.goals_against_average,
                    rec.goals_against,
                    rec.shutouts,
                ],
            )
            .context("failed to upsert goalie season in batch")?;
        }

        tx.execute(
            "INSERT INTO import_log (import_id, kind, source, row_count)
             VALUES (?1, 'goalies', ?2, ?3)",
            params![import_id, source, records.len()],
        )
        .context("failed to record import batch")?;

        tx.commit().context("failed to commit import")?;
        Ok(import_id)
    }

    /// Load all skater seasons for a season tag, ordered by name.
    pub fn load_skaters(&self, season: &str) -> Result<Vec<SkaterSeason>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT name, position, season, games_played, goals, assists, points,
                        plus_minus, penalty_minutes, power_play_goals, power_play_points,
                        short_handed_goals, short_handed_points, game_winning_goals,
                        shots, shooting_percentage, face_off_percentage, face_off_wins,
                        hits, blocked_shots
                 FROM skater_seasons WHERE season = ?1 ORDER BY name",
            )
            .context("failed to prepare load_skaters query")?;

        let skaters = stmt
            .query_map(params![season], |row| {
                let pos: String = row.get(1)?;
                let position = Position::parse(&pos).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        format!("invalid stored position '{pos}'").into(),
                    )
                })?;
                Ok(SkaterSeason {
                    name: row.get(0)?,
                    position,
                    season: row.get(2)?,
                    games_played: row.get(3)?,
                    goals: row.get(4)?,
                    assists: row.get(5)?,
                    points: row.get(6)?,
                    plus_minus: row.get(7)?,
                    penalty_minutes: row.get(8)?,
                    power_play_goals: row.get(9)?,
                    power_play_points: row.get(10)?,
                    short_handed_goals: row.get(11)?,
                    short_handed_points: row.get(12)?,
                    game_winning_goals: row.get(13)?,
                    shots: row.get(14)?,
                    shooting_percentage: row.get(15)?,
                    face_off_percentage: row.get(16)?,
                    face_off_wins: row.get(17)?,
                    hits: row.get(18)?,
                    blocked_shots: row.get(19)?,
                })
            })
            .context("failed to query skater seasons")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to read skater season row")?;

        Ok(skaters)
    }

    /// Load all goalie seasons for a season tag, ordered by name.
    pub fn load_goalies(&self, season: &str) -> Result<Vec<GoalieSeason>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT name, season, games_played, games_started, wins, losses, ties,
                        overtime_losses, saves, shots_against, save_percentage,
                        goals_against_average, goals_against, shutouts
                 FROM goalie_seasons WHERE season = ?1 ORDER BY name",
            )
            .context("failed to prepare load_goalies query")?;

        let goalies = stmt
            .query_map(params![season], |row| {
                Ok(GoalieSeason {
                    name: row.get(0)?,
                    season: row.get(1)?,
                    games_played: row.get(2)?,
                    games_started: row.get(3)?,
                    wins: row.get(4)?,
                    losses: row.get(5)?,
                    ties: row.get(6)?,
                    overtime_losses: row.get(7)?,
                    saves: row.get(8)?,
                    shots_against: row.get(9)?,
                    save_percentage: row.get(10)?,
                    goals_against_average: row.get(11)?,
                    goals_against: row.get(12)?,
                    shutouts: row.get(13)?,
                })
            })
            .context("failed to query goalie seasons")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to read goalie season row")?;

        Ok(goalies)
    }

    /// Distinct season tags present in either table, newest-sorted last.
    pub fn seasons(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT season FROM skater_seasons
                 UNION SELECT season FROM goalie_seasons
                 ORDER BY season",
            )
            .context("failed to prepare seasons query")?;

        let seasons = stmt
            .query_map([], |row| row.get(0))
            .context("failed to query seasons")?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to read season row")?;
        Ok(seasons)
    }

    /// Import batch IDs recorded so far, oldest first.
    pub fn import_history(&self) -> Result<Vec<(String, String, usize)>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT import_id, kind, row_count FROM import_log ORDER BY import_id",
            )
            .context("failed to prepare import history query")?;

        let history = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get::<_, i64>(2)? as usize))
            })
            .context("failed to query import history")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to read import history row")?;
        Ok(history)
    }

    /// Store an arbitrary JSON value under a key.
    pub fn save_meta(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json = serde_json::to_string(value).context("failed to serialize meta value")?;
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, json],
        )
        .context("failed to save meta value")?;
        Ok(())
    }

    /// Load a JSON value by key, or `None` if absent.
    pub fn load_meta(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM meta WHERE key = ?1")
            .context("failed to prepare meta query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query meta value")?;

        match rows.next() {
            Some(json) => {
                let json = json.context("failed to read meta row")?;
                let value =
                    serde_json::from_str(&json).context("failed to deserialize meta value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> Store {
        Store::open(":memory:").expect("failed to open in-memory database")
    }

    fn sample_skater(name: &str, goals: u32) -> SkaterSeason {
        SkaterSeason {
            name: name.into(),
            position: Position::Center,
            season: "2025".into(),
            games_played: 82,
            goals,
            assists: 30,
            points: goals + 30,
            plus_minus: 10,
            penalty_minutes: 20,
            power_play_goals: 5,
            power_play_points: 15,
            short_handed_goals: 1,
            short_handed_points: 2,
            game_winning_goals: 6,
            shots: 250,
            shooting_percentage: 12.0,
            face_off_percentage: 52.5,
            face_off_wins: 700,
            hits: 90,
            blocked_shots: 45,
        }
    }

    fn sample_goalie(name: &str, wins: u32) -> GoalieSeason {
        GoalieSeason {
            name: name.into(),
            season: "2025".into(),
            games_played: 60,
            games_started: 58,
            wins,
            losses: 18,
            ties: 0,
            overtime_losses: 4,
            saves: 1600,
            shots_against: 1740,
            save_percentage: 0.920,
            goals_against_average: 2.35,
            goals_against: 140,
            shutouts: 4,
        }
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        assert!(db.load_skaters("2025").unwrap().is_empty());
        assert!(db.load_goalies("2025").unwrap().is_empty());
        assert!(db.seasons().unwrap().is_empty());
    }

    #[test]
    fn import_and_load_skaters_round_trip() {
        let db = test_db();
        let records = vec![sample_skater("Zeta", 20), sample_skater("Alpha", 40)];

        let import_id = db.import_skaters(&records, "skaters.csv").unwrap();
        assert!(import_id.starts_with("import_"));

        let loaded = db.load_skaters("2025").unwrap();
        assert_eq!(loaded.len(), 2);
        // Ordered by name.
        assert_eq!(loaded[0].name, "Alpha");
        assert_eq!(loaded[0].goals, 40);
        assert_eq!(loaded[1].name, "Zeta");
        assert_eq!(loaded[0].position, Position::Center);
    }

    #[test]
    fn reimport_overwrites_same_player_season() {
        let db = test_db();
        db.import_skaters(&[sample_skater("Same", 10)], "a.csv").unwrap();
        db.import_skaters(&[sample_skater("Same", 33)], "b.csv").unwrap();

        let loaded = db.load_skaters("2025").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].goals, 33);
    }

    #[test]
    fn seasons_are_kept_separate() {
        let db = test_db();
        let mut old = sample_skater("Veteran", 25);
        old.season = "2024".into();
        db.import_skaters(&[old, sample_skater("Veteran", 30)], "x.csv")
            .unwrap();

        assert_eq!(db.load_skaters("2024").unwrap()[0].goals, 25);
        assert_eq!(db.load_skaters("2025").unwrap()[0].goals, 30);
        assert_eq!(db.seasons().unwrap(), vec!["2024", "2025"]);
    }

    #[test]
    fn import_and_load_goalies_round_trip() {
        let db = test_db();
        db.import_goalies(
            &[sample_goalie("Netminder", 38), sample_goalie("Backup", 12)],
            "goalies.csv",
        )
        .unwrap();

        let loaded = db.load_goalies("2025").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "Backup");
        assert_eq!(loaded[1].wins, 38);
    }

    #[test]
    fn import_history_records_batches() {
        let db = test_db();
        db.import_skaters(&[sample_skater("A", 10)], "s.csv").unwrap();
        db.import_goalies(&[sample_goalie("G", 30)], "g.csv").unwrap();

        let history = db.import_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].1, "skaters");
        assert_eq!(history[0].2, 1);
        assert_eq!(history[1].1, "goalies");
    }

    #[test]
    fn save_and_load_meta_round_trip() {
        let db = test_db();
        db.save_meta("last_import", &json!({"id": "import_x", "rows": 3}))
            .unwrap();

        let value = db.load_meta("last_import").unwrap().unwrap();
        assert_eq!(value["rows"], 3);
        assert!(db.load_meta("missing").unwrap().is_none());
    }

    #[test]
    fn generate_import_id_format() {
        let id = Store::generate_import_id();
        assert!(id.starts_with("import_"));
        // import_YYYYMMDD_HHMMSS_SSS
        assert_eq!(id.len(), "import_20250101_120000_000".len());
    }
}
