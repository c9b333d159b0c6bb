use crate::domain::{PriceHistory, PricePoint};
use crate::error::PriceDataUnavailable;
use crate::time::utc_day::utc_date_of_unix;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Yahoo Finance `v8/finance/chart` response. Only the fields the pipeline consumes are modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Validates the raw bars into a [`PriceHistory`].
    ///
    /// Bars with a missing, non-finite or non-positive close are dropped. Bars are keyed by UTC
    /// date (the later timestamp wins on duplicates). The bar dated `today` is the in-progress
    /// session and becomes `latest`; at most `max_closes` completed closes before `today` are
    /// kept, and fewer than two is an error.
    pub fn into_price_history(
        self,
        symbol: &str,
        today: NaiveDate,
        max_closes: usize,
    ) -> Result<PriceHistory, PriceDataUnavailable> {
        if let Some(err) = self.chart.error {
            return Err(PriceDataUnavailable {
                symbol: symbol.to_string(),
                stage: "chart",
                detail: format!("{}: {}", err.code, err.description),
            });
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Err(PriceDataUnavailable::insufficient(symbol, 0));
        };

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let mut by_date = BTreeMap::<NaiveDate, (i64, f64)>::new();
        let mut dropped: usize = 0;
        for (ts, close) in result.timestamp.iter().copied().zip(closes) {
            let valid = close.filter(|c| c.is_finite() && *c > 0.0);
            let (Some(close), Some(date)) = (valid, utc_date_of_unix(ts)) else {
                dropped += 1;
                continue;
            };
            match by_date.get(&date) {
                Some((seen_ts, _)) if *seen_ts > ts => {}
                _ => {
                    by_date.insert(date, (ts, close));
                }
            }
        }
        if dropped > 0 {
            tracing::debug!(symbol, dropped, "dropped malformed price bars");
        }

        let latest = by_date
            .get(&today)
            .map(|(_, close)| PricePoint { date: today, close: *close });

        let mut completed: Vec<PricePoint> = by_date
            .range(..today)
            .map(|(date, (_, close))| PricePoint {
                date: *date,
                close: *close,
            })
            .collect();
        if completed.len() > max_closes {
            completed.drain(..completed.len() - max_closes);
        }

        if completed.len() < 2 {
            return Err(PriceDataUnavailable::insufficient(symbol, completed.len()));
        }

        Ok(PriceHistory {
            symbol: symbol.to_string(),
            closes: completed,
            latest,
        })
    }
}
