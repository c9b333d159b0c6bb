use crate::config::Settings;
use crate::domain::PriceHistory;
use crate::error::PriceDataUnavailable;
use crate::ingest::types::ChartResponse;
use crate::time::utc_day::start_of_utc_day;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

const CHART_PATH: &str = "/v8/finance/chart";

// Extra calendar days requested beyond the closes we keep, so a missing bar or two at the
// provider still leaves a full window.
const REQUEST_SLACK_DAYS: i64 = 3;

const MAX_BACKOFF_SECS: u64 = 30;

#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Completed daily closes ending at the last UTC day before `now`. Fails with
    /// [`PriceDataUnavailable`] when fewer than two closes can be produced.
    async fn fetch_daily_closes(&self, now: DateTime<Utc>) -> Result<PriceHistory>;
}

#[derive(Debug, Clone)]
pub struct YahooChartClient {
    http: reqwest::Client,
    base_url: String,
    symbol: String,
    max_closes: usize,
    retries: u32,
}

impl YahooChartClient {
    pub fn from_settings(settings: &Settings, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: settings.price_base_url.clone(),
            symbol: settings.price_symbol.clone(),
            max_closes: settings.returns.closes_needed(),
            retries: settings.price_retries,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            CHART_PATH,
            self.symbol
        )
    }

    fn period(&self, now: DateTime<Utc>) -> (i64, i64) {
        let days_back = self.max_closes as i64 + REQUEST_SLACK_DAYS;
        let start = start_of_utc_day(now) - ChronoDuration::days(days_back);
        (start.timestamp(), now.timestamp())
    }

    async fn fetch_once(&self, now: DateTime<Utc>) -> Result<ChartResponse> {
        let (period1, period2) = self.period(now);

        let res = self
            .http
            .get(self.url())
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includePrePost", "false".to_string()),
            ])
            .send()
            .await
            .context("price provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read price provider response")?;

        classify_chart_response(status, &text)
    }
}

/// Yahoo reports unknown symbols as a 404 with a `chart.error` body; those are returned as
/// parsed so validation can surface them. Any other non-2xx is an error.
fn classify_chart_response(status: reqwest::StatusCode, text: &str) -> Result<ChartResponse> {
    match serde_json::from_str::<ChartResponse>(text) {
        Ok(parsed) if status.is_success() || parsed.chart.error.is_some() => Ok(parsed),
        Ok(_) => anyhow::bail!("price provider HTTP {status}"),
        Err(err) if status.is_success() => {
            Err(err).context("failed to parse price provider response into ChartResponse")
        }
        Err(_) => anyhow::bail!("price provider HTTP {status}: {}", truncate(text, 200)),
    }
}

/// 1s, 2s, 4s, ... capped at [`MAX_BACKOFF_SECS`].
fn backoff_for(attempt: u32) -> Duration {
    let secs = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

#[async_trait::async_trait]
impl PriceSource for YahooChartClient {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_daily_closes(&self, now: DateTime<Utc>) -> Result<PriceHistory> {
        let mut attempt: u32 = 0;
        let parsed = loop {
            attempt += 1;
            match self.fetch_once(now).await {
                Ok(parsed) => break parsed,
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(PriceDataUnavailable::fetch_failed(&self.symbol, &err).into());
                    }
                    let backoff = backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        ?backoff,
                        symbol = %self.symbol,
                        error = %err,
                        "price fetch failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        let history = parsed.into_price_history(&self.symbol, now.date_naive(), self.max_closes)?;
        tracing::debug!(
            symbol = %self.symbol,
            closes = history.closes.len(),
            has_latest = history.latest.is_some(),
            "fetched daily closes"
        );
        Ok(history)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::StatusCode;

    fn client(settings: &Settings) -> YahooChartClient {
        YahooChartClient::from_settings(settings, reqwest::Client::new())
    }

    #[test]
    fn builds_chart_url_for_symbol() {
        let settings = Settings {
            price_base_url: "https://quotes.example/".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            client(&settings).url(),
            "https://quotes.example/v8/finance/chart/BTC-USD"
        );
    }

    #[test]
    fn requests_enough_days_for_the_lookback() {
        let c = client(&Settings::default());
        assert_eq!(c.max_closes, 8);

        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let (period1, period2) = c.period(now);
        assert_eq!(period2, now.timestamp());
        // 8 closes + 3 slack days before midnight on Oct 18 = Oct 7 00:00 UTC
        assert_eq!(
            period1,
            Utc.with_ymd_and_hms(2026, 10, 7, 0, 0, 0).unwrap().timestamp()
        );
    }

    const CHART_OK: &str = r#"{"chart":{"result":[{"timestamp":[1791590400],
        "indicators":{"quote":[{"close":[62000.5]}]}}],"error":null}"#;

    const CHART_NOT_FOUND: &str = r#"{"chart":{"result":null,
        "error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

    #[test]
    fn success_body_is_parsed() {
        let parsed = classify_chart_response(StatusCode::OK, CHART_OK).unwrap();
        assert!(parsed.chart.error.is_none());
        assert_eq!(parsed.chart.result.map(|r| r.len()), Some(1));
    }

    #[test]
    fn chart_error_body_passes_through_on_404() {
        let parsed = classify_chart_response(StatusCode::NOT_FOUND, CHART_NOT_FOUND).unwrap();
        assert!(parsed.chart.error.is_some());
    }

    #[test]
    fn non_success_without_chart_error_fails() {
        let err = classify_chart_response(StatusCode::BAD_GATEWAY, CHART_OK).unwrap_err();
        assert!(err.to_string().contains("502"));

        let err = classify_chart_response(StatusCode::TOO_MANY_REQUESTS, "<html>slow down</html>")
            .unwrap_err();
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("slow down"));
    }

    #[test]
    fn unparseable_success_body_is_a_parse_error() {
        let err = classify_chart_response(StatusCode::OK, "not json").unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_for(1), Duration::from_secs(1));
        assert_eq!(backoff_for(2), Duration::from_secs(2));
        assert_eq!(backoff_for(4), Duration::from_secs(8));
        assert_eq!(backoff_for(6), Duration::from_secs(30));
        assert_eq!(backoff_for(100), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn unreachable_provider_is_price_data_unavailable() {
        let settings = Settings {
            price_base_url: "http://127.0.0.1:1".to_string(),
            price_retries: 1,
            ..Settings::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();

        let err = client(&settings).fetch_daily_closes(now).await.unwrap_err();
        let diag = err.downcast_ref::<PriceDataUnavailable>().unwrap();
        assert_eq!(diag.symbol, "BTC-USD");
        assert_eq!(diag.stage, "fetch");
        assert!(diag.detail.contains("price provider request failed"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }
}
