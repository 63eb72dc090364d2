// Category definitions: which fields a strategy scores, in which direction,
// with which weights.

use serde::{Deserialize, Serialize};

use crate::ranking::transform::Direction;
use crate::stats::Position;

/// Statistic names where a lower value is better. Everything else counts up.
const INVERTED_FIELDS: &[&str] = &[
    "goals_against_average",
    "goals_against",
    "losses",
    "overtime_losses",
];

/// Per-position multipliers for categories whose value depends on deployment.
/// Face-off wins are the canonical case: wingers take few draws and defensemen
/// almost none, so their raw totals overstate nothing but their usage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionWeights {
    pub center: f64,
    pub wing: f64,
    pub defense: f64,
}

impl Default for PositionWeights {
    fn default() -> Self {
        PositionWeights {
            center: 1.0,
            wing: 0.3,
            defense: 0.1,
        }
    }
}

impl PositionWeights {
    pub fn multiplier(&self, position: Position) -> f64 {
        match position {
            Position::Center => self.center,
            Position::LeftWing | Position::RightWing | Position::Forward => self.wing,
            Position::Defenseman => self.defense,
            Position::Goalie => 1.0,
        }
    }
}

/// One scoring category: a record field, its comparison direction, its weight
/// in weighted aggregation, and an optional position multiplier table.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub direction: Direction,
    pub weight: f64,
    pub position_weights: Option<PositionWeights>,
}

impl Category {
    /// A category with direction inferred from the field name and weight 1.0.
    pub fn new(name: &str) -> Self {
        let direction = if INVERTED_FIELDS.contains(&name) {
            Direction::LowerIsBetter
        } else {
            Direction::HigherIsBetter
        };
        Category {
            name: name.to_string(),
            direction,
            weight: 1.0,
            position_weights: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_position_weights(mut self, weights: PositionWeights) -> Self {
        self.position_weights = Some(weights);
        self
    }
}

/// Default skater category set with the default league weights.
pub fn default_skater_categories() -> Vec<Category> {
    vec![
        Category::new("goals").with_weight(3.0),
        Category::new("assists").with_weight(2.5),
        Category::new("power_play_points").with_weight(2.0),
        Category::new("shots").with_weight(1.5),
        Category::new("face_off_wins")
            .with_weight(1.0)
            .with_position_weights(PositionWeights::default()),
        Category::new("hits").with_weight(0.8),
        Category::new("blocked_shots").with_weight(0.8),
    ]
}

/// Default goalie category set. Goals-against average counts down.
pub fn default_goalie_categories() -> Vec<Category> {
    vec![
        Category::new("wins"),
        Category::new("saves"),
        Category::new("save_percentage"),
        Category::new("goals_against_average"),
    ]
}
