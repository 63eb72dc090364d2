// Integration tests for the ranking engine.
//
// These tests exercise the full system end-to-end using the library crate's
// public API: CSV import through the SQLite store, ranking under every
// strategy, cross-strategy comparison, and report emission.

use std::io::Write as _;
use std::path::PathBuf;

use puckdraft::db::Store;
use puckdraft::ranking::compare::compare;
use puckdraft::ranking::{
    self, default_goalie_categories, default_skater_categories, Category, Strategy,
};
use puckdraft::report;
use puckdraft::stats::{import, GoalieSeason, Position, SkaterSeason, StatRecord};

// ===========================================================================
// Test helpers
// ===========================================================================

fn temp_path(name: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "puckdraft_it_{}_{}_{}.{}",
        name,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        ext
    ))
}

fn skater(name: &str, position: Position, gp: u32, goals: u32, assists: u32) -> SkaterSeason {
    SkaterSeason {
        name: name.into(),
        position,
        season: "2025".into(),
        games_played: gp,
        goals,
        assists,
        points: goals + assists,
        plus_minus: 0,
        penalty_minutes: 0,
        power_play_goals: goals / 4,
        power_play_points: (goals + assists) / 4,
        short_handed_goals: 0,
        short_handed_points: 0,
        game_winning_goals: goals / 8,
        shots: goals * 8,
        shooting_percentage: 12.5,
        face_off_percentage: 50.0,
        face_off_wins: if position == Position::Center { 600 } else { 20 },
        hits: 80,
        blocked_shots: 50,
    }
}

fn goalie(name: &str, gp: u32, wins: u32, gaa: f64, sv_pct: f64) -> GoalieSeason {
    GoalieSeason {
        name: name.into(),
        season: "2025".into(),
        games_played: gp,
        games_started: gp,
        wins,
        losses: gp.saturating_sub(wins),
        ties: 0,
        overtime_losses: 0,
        saves: gp * 25,
        shots_against: gp * 27,
        save_percentage: sv_pct,
        goals_against_average: gaa,
        goals_against: gp * 2,
        shutouts: wins / 10,
    }
}

fn sample_skaters() -> Vec<SkaterSeason> {
    vec![
        skater("Elite Center", Position::Center, 82, 52, 58),
        skater("Sniper Wing", Position::RightWing, 80, 48, 35),
        skater("Playmaker Wing", Position::LeftWing, 82, 25, 60),
        skater("Two Way Center", Position::Center, 78, 30, 42),
        skater("Offensive Dman", Position::Defenseman, 82, 15, 55),
        skater("Stay Home Dman", Position::Defenseman, 81, 4, 18),
    ]
}

// ===========================================================================
// Ranking scenarios
// ===========================================================================

#[test]
fn tied_goal_scorers_share_first_and_next_rank_is_two() {
    let cohort = vec![
        skater("A", Position::Center, 82, 50, 10),
        skater("B", Position::LeftWing, 82, 50, 12),
        skater("C", Position::RightWing, 82, 40, 14),
    ];
    let cats = vec![Category::new("goals")];

    let result = ranking::rank(&cohort, &cats, Strategy::Percentile, None).unwrap();
    assert_eq!(result.rank_of("A"), Some(1));
    assert_eq!(result.rank_of("B"), Some(1));
    assert_eq!(result.rank_of("C"), Some(2));
}

#[test]
fn lower_gaa_outranks_higher_under_zscore() {
    let cohort = vec![
        goalie("Sharp", 60, 38, 2.00, 0.930),
        goalie("Middling", 55, 28, 2.50, 0.912),
        goalie("Leaky", 50, 20, 3.00, 0.898),
    ];
    let cats = vec![Category::new("goals_against_average")];

    let result = ranking::rank(&cohort, &cats, Strategy::ZScore, None).unwrap();
    assert_eq!(result.rank_of("Sharp"), Some(1));
    assert_eq!(result.rank_of("Leaky"), Some(3));
    let sharp = result.rows.iter().find(|r| r.name == "Sharp").unwrap();
    assert!(sharp.total_score > 0.0);
}

#[test]
fn zero_games_played_yields_zero_rate_not_nan() {
    let cohort = vec![
        skater("Healthy", Position::Center, 82, 40, 40),
        skater("Injured All Year", Position::Center, 0, 0, 0),
    ];
    let cats = vec![Category::new("goals")];

    let result = ranking::rank(&cohort, &cats, Strategy::PerGameEfficiency, None).unwrap();
    let injured = result
        .rows
        .iter()
        .find(|r| r.name == "Injured All Year")
        .unwrap();
    assert!(injured.total_score.is_finite());
    assert_eq!(result.rank_of("Healthy"), Some(1));
}

#[test]
fn position_adjusted_measures_within_groups() {
    // The top defenseman trails every forward in raw points but leads his
    // own group, so his within-group rank sum beats the second forward's.
    let cohort = vec![
        skater("Best Forward", Position::Center, 82, 50, 50),
        skater("Second Forward", Position::Center, 82, 40, 40),
        skater("Best Dman", Position::Defenseman, 82, 15, 40),
        skater("Second Dman", Position::Defenseman, 82, 10, 25),
    ];
    let cats = vec![Category::new("points")];

    let result = ranking::rank(&cohort, &cats, Strategy::PositionAdjusted, None).unwrap();
    assert_eq!(result.rank_of("Best Forward"), Some(1));
    assert_eq!(result.rank_of("Best Dman"), Some(1));
    assert_eq!(result.rank_of("Second Forward"), Some(2));
}

#[test]
fn all_strategies_produce_complete_deterministic_results() {
    let cohort = sample_skaters();
    let cats = default_skater_categories();

    for strategy in Strategy::ALL {
        let first = ranking::rank(&cohort, &cats, *strategy, None).unwrap();
        let second = ranking::rank(&cohort, &cats, *strategy, None).unwrap();
        assert_eq!(first, second, "{strategy} rerun differed");
        assert_eq!(first.rows.len(), cohort.len());
        assert_eq!(first.rows[0].rank, 1);
        assert!(first.rows.iter().all(|r| r.total_score.is_finite()));
    }
}

#[test]
fn weighted_strategy_discounts_winger_face_offs() {
    // Same stat line; only the position differs. The winger's face-off wins
    // count at 0.3, so the center must score higher.
    let center = skater("Center Copy", Position::Center, 82, 30, 30);
    let mut winger = center.clone();
    winger.name = "Winger Copy".into();
    winger.position = Position::RightWing;
    let cohort = vec![center, winger];

    let cats = default_skater_categories();
    let result = ranking::rank(&cohort, &cats, Strategy::Weighted, None).unwrap();
    let center = result.rows.iter().find(|r| r.name == "Center Copy").unwrap();
    let wing = result.rows.iter().find(|r| r.name == "Winger Copy").unwrap();
    assert!(center.total_score > wing.total_score);
    assert_eq!(center.rank, 1);
}

#[test]
fn goalie_default_categories_reward_the_stronger_goalie() {
    let cohort = vec![
        goalie("Starter", 62, 40, 2.10, 0.928),
        goalie("Journeyman", 45, 20, 3.05, 0.895),
    ];

    let result =
        ranking::rank(&cohort, &default_goalie_categories(), Strategy::ZScore, None).unwrap();
    assert_eq!(result.rank_of("Starter"), Some(1));
}

#[test]
fn min_games_filter_shrinks_the_cohort() {
    let mut cohort = sample_skaters();
    cohort.push(skater("Callup", Position::Center, 9, 5, 3));

    let cats = default_skater_categories();
    let min_games = |r: &SkaterSeason| r.games_played >= 20;
    let result =
        ranking::rank(&cohort, &cats, Strategy::Percentile, Some(&min_games)).unwrap();
    assert_eq!(result.rows.len(), 6);
    assert!(result.rank_of("Callup").is_none());
}

// ===========================================================================
// Comparator
// ===========================================================================

#[test]
fn comparator_unions_top_players_and_marks_absences() {
    let cohort = sample_skaters();
    let cats = default_skater_categories();

    let full = ranking::rank(&cohort, &cats, Strategy::ZScore, None).unwrap();
    let centers_only = |r: &SkaterSeason| r.position == Position::Center;
    let centers =
        ranking::rank(&cohort, &cats, Strategy::Percentile, Some(&centers_only)).unwrap();

    let table = compare(&[full, centers], 3);
    assert_eq!(table.strategies, vec!["zscore", "percentile"]);

    // A winger in the full top-3 has no rank in the centers-only result.
    let wing_row = table
        .rows
        .iter()
        .find(|r| r.position == Position::RightWing || r.position == Position::LeftWing);
    if let Some(row) = wing_row {
        assert_eq!(row.ranks[1], None);
    }

    // Rows come back name-ordered.
    let names: Vec<&str> = table.rows.iter().map(|r| r.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

// ===========================================================================
// CSV -> store -> rank -> report pipeline
// ===========================================================================

#[test]
fn full_pipeline_from_csv_to_report() {
    // 1. Write a raw stats CSV.
    let csv_path = temp_path("skaters", "csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(
        file,
        "Player,Pos,GP,G,A,P,+/-,PIM,PPG,PPP,SHG,SHP,GWG,S,S%,FOW%,FOW,HIT,BLK"
    )
    .unwrap();
    writeln!(
        file,
        "First Star,C,82,48,52,100,20,24,14,38,1,2,8,300,16.0,55.0,820,60,45"
    )
    .unwrap();
    writeln!(
        file,
        "Second Star,LW,80,38,44,82,15,30,10,28,0,1,6,280,13.6,45.0,30,120,40"
    )
    .unwrap();
    // Traded player appears twice; only the combined row should survive.
    writeln!(
        file,
        "Traded Star,RW,28,12,10,22,2,8,3,7,0,0,2,90,13.3,40.0,10,25,12"
    )
    .unwrap();
    writeln!(
        file,
        "Traded Star,RW,79,33,31,64,8,22,9,20,0,1,5,250,13.2,42.0,25,80,30"
    )
    .unwrap();
    drop(file);

    // 2. Import and persist.
    let records = import::read_skaters(&csv_path, "2025").unwrap();
    assert_eq!(records.len(), 3);

    let store = Store::open(":memory:").unwrap();
    let import_id = store.import_skaters(&records, "skaters.csv").unwrap();
    assert!(import_id.starts_with("import_"));

    // 3. Load back and rank.
    let cohort = store.load_skaters("2025").unwrap();
    assert_eq!(cohort.len(), 3);
    let traded = cohort.iter().find(|r| r.name == "Traded Star").unwrap();
    assert_eq!(traded.games_played, 79);

    let result =
        ranking::rank(&cohort, &default_skater_categories(), Strategy::ZScore, None).unwrap();
    assert_eq!(result.rank_of("First Star"), Some(1));

    // 4. Emit reports.
    let text = report::render_text(&result);
    assert!(text.contains("First Star"));
    assert!(text.contains("RANK"));

    let out_path = temp_path("report", "csv");
    report::write_csv(&result, &out_path).unwrap();
    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(written.starts_with("name,position,rank,total_score,goals"));
    assert_eq!(written.lines().count(), 4);

    let _ = std::fs::remove_file(&csv_path);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn reimport_is_idempotent_for_rankings() {
    let store = Store::open(":memory:").unwrap();
    let records = sample_skaters();

    store.import_skaters(&records, "a.csv").unwrap();
    let first = ranking::rank(
        &store.load_skaters("2025").unwrap(),
        &default_skater_categories(),
        Strategy::Weighted,
        None,
    )
    .unwrap();

    store.import_skaters(&records, "a.csv").unwrap();
    let second = ranking::rank(
        &store.load_skaters("2025").unwrap(),
        &default_skater_categories(),
        Strategy::Weighted,
        None,
    )
    .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.import_history().unwrap().len(), 2);
}

#[test]
fn stored_points_column_never_leaks_into_rankings() {
    let store = Store::open(":memory:").unwrap();
    let mut corrupted = skater("Corrupted", Position::Center, 82, 30, 30);
    corrupted.points = 500; // bogus stored value
    let honest = skater("Honest", Position::Center, 82, 35, 35);
    store
        .import_skaters(&[corrupted, honest], "x.csv")
        .unwrap();

    let cohort = store.load_skaters("2025").unwrap();
    let cats = vec![Category::new("points")];
    let result = ranking::rank(&cohort, &cats, Strategy::Percentile, None).unwrap();
    assert_eq!(result.rank_of("Honest"), Some(1));
    assert_eq!(result.rank_of("Corrupted"), Some(2));
}

#[test]
fn goalie_pipeline_respects_min_games_predicate() {
    let store = Store::open(":memory:").unwrap();
    let cohort = vec![
        goalie("Workhorse", 62, 38, 2.20, 0.925),
        goalie("Solid", 50, 27, 2.60, 0.915),
        goalie("Five Gamer", 5, 4, 1.20, 0.960),
    ];
    store.import_goalies(&cohort, "g.csv").unwrap();

    let loaded = store.load_goalies("2025").unwrap();
    let min_games = |r: &GoalieSeason| r.games_played >= 20;
    let result = ranking::rank(
        &loaded,
        &default_goalie_categories(),
        Strategy::Percentile,
        Some(&min_games),
    )
    .unwrap();

    // The five-game wonder's sparkling rates never enter the cohort.
    assert!(result.rank_of("Five Gamer").is_none());
    assert_eq!(result.rank_of("Workhorse"), Some(1));
}

#[test]
fn goals_against_survives_the_store_round_trip() {
    let store = Store::open(":memory:").unwrap();
    let rec = goalie("Netminder", 60, 35, 2.30, 0.920).normalize();
    let expected = rec.shots_against - rec.saves;
    store.import_goalies(&[rec], "g.csv").unwrap();

    let loaded = store.load_goalies("2025").unwrap();
    assert_eq!(loaded[0].stat("goals_against"), Some(expected as f64));
}
