use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
            Direction::Flat => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Flat => "FLAT",
        }
    }

    pub fn sentiment_label(self) -> &'static str {
        match self {
            Direction::Up => "bullish",
            Direction::Down => "bearish",
            Direction::Flat => "neutral",
        }
    }

    pub fn long_bias(self) -> &'static str {
        match self {
            Direction::Up => "favored",
            Direction::Down => "disfavored",
            Direction::Flat => "balanced",
        }
    }

    pub fn short_bias(self) -> &'static str {
        match self {
            Direction::Up => "disfavored",
            Direction::Down => "favored",
            Direction::Flat => "balanced",
        }
    }

    pub fn outlook(self) -> &'static str {
        match self {
            Direction::Up => "increase",
            Direction::Down => "decrease",
            Direction::Flat => "be flat to mixed",
        }
    }
}

/// Output of one pipeline run. Built once by the blender and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub aggregate_sentiment: f64,
    pub recent_momentum: f64,
    pub combined_bias: f64,
    pub expected_move_pct: f64,
    pub direction: Direction,
    pub target_price: f64,
    pub reference_close: f64,
}
