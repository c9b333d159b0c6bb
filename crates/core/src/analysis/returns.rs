use crate::domain::{DailyReturn, PricePoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnConfig {
    /// Trailing returns averaged (in absolute value) into the expected move.
    pub lookback: usize,
    /// Trailing returns averaged into the momentum signal. 1 = most recent daily return.
    pub momentum_window: usize,
}

impl Default for ReturnConfig {
    fn default() -> Self {
        Self {
            lookback: 7,
            momentum_window: 1,
        }
    }
}

impl ReturnConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.lookback >= 1, "RETURN_LOOKBACK_DAYS must be >= 1");
        anyhow::ensure!(self.momentum_window >= 1, "MOMENTUM_WINDOW must be >= 1");
        Ok(())
    }

    /// Closes needed to produce a full lookback of returns.
    pub fn closes_needed(&self) -> usize {
        self.lookback.max(self.momentum_window) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub returns: Vec<DailyReturn>,
    /// Returns actually averaged into `expected_move_pct`.
    pub expected_move_window: usize,
    pub expected_move_pct: f64,
    pub recent_momentum: f64,
}

impl ReturnStats {
    /// `None` when the closes yield no return at all (fewer than two usable points).
    pub fn from_closes(closes: &[PricePoint], config: &ReturnConfig) -> Option<Self> {
        let returns = daily_returns(closes);
        if returns.is_empty() {
            return None;
        }

        let expected_move_window = config.lookback.clamp(1, returns.len());
        let expected_move_pct =
            trailing_mean(&returns, expected_move_window, |r| r.daily_return.abs());
        let recent_momentum = trailing_mean(&returns, config.momentum_window, |r| r.daily_return);

        Some(Self {
            returns,
            expected_move_window,
            expected_move_pct,
            recent_momentum,
        })
    }
}

/// Simple returns between consecutive closes, dated by the later close. Pairs whose earlier
/// close is not positive are skipped.
pub fn daily_returns(closes: &[PricePoint]) -> Vec<DailyReturn> {
    closes
        .windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| DailyReturn {
            date: w[1].date,
            daily_return: (w[1].close - w[0].close) / w[0].close,
        })
        .collect()
}

fn trailing_mean<F>(returns: &[DailyReturn], n: usize, value: F) -> f64
where
    F: Fn(&DailyReturn) -> f64,
{
    let n = n.clamp(1, returns.len());
    let tail = &returns[returns.len() - n..];
    tail.iter().map(value).sum::<f64>() / n as f64
}
