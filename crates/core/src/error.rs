use serde::Serialize;
use std::fmt;

/// Whole-run failure: without at least two completed daily closes no return, expected move or
/// target price can be computed.
#[derive(Debug, Clone)]
pub struct PriceDataUnavailable {
    pub symbol: String,
    pub stage: &'static str,
    pub detail: String,
}

impl PriceDataUnavailable {
    pub fn insufficient(symbol: &str, available: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            stage: "validate",
            detail: format!("need at least 2 completed daily closes, got {available}"),
        }
    }

    pub fn fetch_failed(symbol: &str, err: &anyhow::Error) -> Self {
        Self {
            symbol: symbol.to_string(),
            stage: "fetch",
            detail: format!("{err:#}"),
        }
    }
}

impl fmt::Display for PriceDataUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "price data unavailable (symbol={}, stage={}): {}",
            self.symbol, self.stage, self.detail
        )
    }
}

impl std::error::Error for PriceDataUnavailable {}

/// A headline source that could not be read this run. Logged and skipped, never fatal.
#[derive(Debug, Clone, Serialize)]
pub struct SourceUnavailable {
    pub source: String,
    pub detail: String,
}

impl fmt::Display for SourceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "headline source {} unavailable: {}", self.source, self.detail)
    }
}

impl std::error::Error for SourceUnavailable {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_error_survives_anyhow_round_trip() {
        let err: anyhow::Error = PriceDataUnavailable::insufficient("BTC-USD", 1).into();
        let diag = err.downcast_ref::<PriceDataUnavailable>().unwrap();
        assert_eq!(diag.stage, "validate");
        assert!(err.to_string().contains("got 1"));
    }
}
