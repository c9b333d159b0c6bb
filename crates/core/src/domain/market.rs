use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub daily_return: f64,
}

/// Completed daily closes (ascending, all before the current UTC day) plus the in-progress
/// quote for the current day when the source reports one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub closes: Vec<PricePoint>,
    pub latest: Option<PricePoint>,
}

impl PriceHistory {
    /// Most recent completed close: the reference the target price is projected from.
    pub fn reference_close(&self) -> Option<PricePoint> {
        self.closes.last().copied()
    }
}
