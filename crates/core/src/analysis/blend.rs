use crate::domain::{Direction, Signal};
use serde::{Deserialize, Serialize};

/// Weighted blend of headline sentiment and price momentum.
///
/// Both inputs are normalized to `[-1, 1]` before weighting: sentiment by clamping, momentum by
/// dividing by `momentum_scale` (the daily return treated as a full-strength move) and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blender {
    pub sentiment_weight: f64,
    pub momentum_weight: f64,
    pub momentum_scale: f64,
    pub threshold: f64,
}

impl Default for Blender {
    fn default() -> Self {
        Self {
            sentiment_weight: 0.7,
            momentum_weight: 0.3,
            momentum_scale: 0.05,
            threshold: 0.15,
        }
    }
}

impl Blender {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, v) in [
            ("SENTIMENT_WEIGHT", self.sentiment_weight),
            ("MOMENTUM_WEIGHT", self.momentum_weight),
            ("DIRECTION_THRESHOLD", self.threshold),
        ] {
            anyhow::ensure!(v.is_finite() && v >= 0.0, "{name} must be finite and >= 0 (got {v})");
        }
        anyhow::ensure!(
            self.sentiment_weight + self.momentum_weight > 0.0,
            "SENTIMENT_WEIGHT and MOMENTUM_WEIGHT cannot both be 0"
        );
        anyhow::ensure!(
            self.momentum_scale.is_finite() && self.momentum_scale > 0.0,
            "MOMENTUM_SCALE must be finite and > 0 (got {})",
            self.momentum_scale
        );
        Ok(())
    }

    pub fn combined_bias(&self, aggregate_sentiment: f64, recent_momentum: f64) -> f64 {
        let sentiment = aggregate_sentiment.clamp(-1.0, 1.0);
        let momentum = (recent_momentum / self.momentum_scale).clamp(-1.0, 1.0);
        self.sentiment_weight * sentiment + self.momentum_weight * momentum
    }

    pub fn direction(&self, combined_bias: f64) -> Direction {
        if combined_bias > self.threshold {
            Direction::Up
        } else if combined_bias < -self.threshold {
            Direction::Down
        } else {
            Direction::Flat
        }
    }

    pub fn blend(
        &self,
        aggregate_sentiment: f64,
        recent_momentum: f64,
        expected_move_pct: f64,
        reference_close: f64,
    ) -> Signal {
        let combined_bias = self.combined_bias(aggregate_sentiment, recent_momentum);
        let direction = self.direction(combined_bias);
        let target_price = reference_close * (1.0 + direction.sign() * expected_move_pct);

        Signal {
            aggregate_sentiment,
            recent_momentum,
            combined_bias,
            expected_move_pct,
            direction,
            target_price,
            reference_close,
        }
    }
}
