use crate::analysis::NewsWindow;
use crate::domain::{DailyReturn, PricePoint, ScoredHeadline, Signal};
use crate::error::SourceUnavailable;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write as _};
use uuid::Uuid;

/// Everything one run produced: the signal plus the supporting data a dashboard charts.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub symbol: String,
    pub news_window: NewsWindow,
    pub signal: Signal,
    pub headlines: Vec<ScoredHeadline>,
    pub unavailable_sources: Vec<SourceUnavailable>,
    pub closes: Vec<PricePoint>,
    pub returns: Vec<DailyReturn>,
    /// Trailing returns averaged into the expected move.
    pub expected_move_window: usize,
    pub latest: Option<PricePoint>,
}

impl Report {
    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn reference_date(&self) -> Option<chrono::NaiveDate> {
        self.closes.last().map(|p| p.date)
    }
}

pub fn render_text(report: &Report, headline_limit: usize) -> String {
    let mut out = String::new();
    write_report(&mut out, report, headline_limit).expect("writing to a String cannot fail");
    out
}

fn write_report(out: &mut String, report: &Report, headline_limit: usize) -> fmt::Result {
    let signal = &report.signal;
    let direction = signal.direction;
    let symbol = &report.symbol;

    writeln!(out, "Bitcoin Sentiment Report")?;
    writeln!(
        out,
        "Generated (UTC): {}",
        report.generated_at.format("%Y-%m-%d %H:%M")
    )?;
    writeln!(out, "News window used: {}", report.news_window.label())?;

    write!(
        out,
        "{symbol} reference close: {}",
        format_price(signal.reference_close)
    )?;
    match report.reference_date() {
        Some(date) => writeln!(out, " ({date} UTC)")?,
        None => writeln!(out)?,
    }
    if let Some(latest) = report.latest {
        let change = (latest.close - signal.reference_close) / signal.reference_close * 100.0;
        writeln!(
            out,
            "{symbol} latest quote: {} ({change:+.2}% since reference close)",
            format_price(latest.close)
        )?;
    }

    writeln!(
        out,
        "Expected move ({} daily returns): {:.2}%",
        report.expected_move_window,
        signal.expected_move_pct * 100.0
    )?;
    writeln!(out, "Recent momentum: {:+.2}%", signal.recent_momentum * 100.0)?;
    writeln!(out, "Aggregate sentiment: {:+.3}", signal.aggregate_sentiment)?;
    writeln!(out, "Combined signal: {:+.3}", signal.combined_bias)?;
    writeln!(out, "Overall sentiment: {}", direction.sentiment_label())?;
    writeln!(out, "Long bias: {}", direction.long_bias())?;
    writeln!(out, "Short bias: {}", direction.short_bias())?;
    writeln!(out, "Direction: {}", direction.as_str())?;
    writeln!(
        out,
        "Prediction: {symbol} is expected to {} by end of today (UTC).",
        direction.outlook()
    )?;
    writeln!(
        out,
        "Expected move vs reference close: {:+.2}%",
        direction.sign() * signal.expected_move_pct * 100.0
    )?;
    writeln!(out, "Expected price target: {}", format_price(signal.target_price))?;

    for skipped in &report.unavailable_sources {
        writeln!(out, "Skipped source: {} ({})", skipped.source, skipped.detail)?;
    }

    let shown = headline_limit.min(report.headlines.len());
    writeln!(out)?;
    writeln!(out, "Top {shown} recent headlines:")?;
    if report.headlines.is_empty() {
        writeln!(out, "- No recent items matched the filter.")?;
    }
    for item in report.headlines.iter().take(headline_limit) {
        let h = &item.headline;
        writeln!(
            out,
            "- {} {} (score {:+.2}) [{}]",
            h.published_at.format("%H:%M"),
            h.text,
            item.sentiment_score,
            h.source
        )?;
        if let Some(link) = &h.link {
            writeln!(out, "  {link}")?;
        }
    }

    Ok(())
}

/// `1234567.891` -> `"1,234,567.89"`.
pub fn format_price(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, HeadlineRecord};
    use chrono::{NaiveDate, TimeZone};

    fn report(headlines: Vec<ScoredHeadline>) -> Report {
        Report {
            run_id: Uuid::nil(),
            generated_at: Utc.with_ymd_and_hms(2026, 10, 18, 12, 5, 0).unwrap(),
            symbol: "BTC-USD".to_string(),
            news_window: NewsWindow::Today,
            signal: Signal {
                aggregate_sentiment: 0.8,
                recent_momentum: 0.01,
                combined_bias: 0.62,
                expected_move_pct: 0.02,
                direction: Direction::Up,
                target_price: 51_000.0,
                reference_close: 50_000.0,
            },
            headlines,
            unavailable_sources: vec![SourceUnavailable {
                source: "cryptopanic.com".to_string(),
                detail: "feed HTTP 403 Forbidden".to_string(),
            }],
            closes: vec![
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                    close: 49_500.0,
                },
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
                    close: 50_000.0,
                },
            ],
            returns: vec![DailyReturn {
                date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
                daily_return: 0.0101,
            }],
            expected_move_window: 1,
            latest: Some(PricePoint {
                date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
                close: 50_500.0,
            }),
        }
    }

    fn scored(text: &str, hour: u32, score: f64) -> ScoredHeadline {
        ScoredHeadline {
            headline: HeadlineRecord {
                text: text.to_string(),
                source: "www.coindesk.com".to_string(),
                published_at: Utc.with_ymd_and_hms(2026, 10, 18, hour, 30, 0).unwrap(),
                link: Some(format!("https://www.coindesk.com/{hour}")),
                summary: None,
            },
            sentiment_score: score,
        }
    }

    #[test]
    fn text_report_carries_signal_fields() {
        let r = report(vec![scored("Bitcoin rally extends", 9, 1.0)]);
        let text = render_text(&r, 10);

        assert!(text.contains("News window used: today"));
        assert!(text.contains("BTC-USD reference close: 50,000.00 (2026-10-17 UTC)"));
        assert!(text.contains("BTC-USD latest quote: 50,500.00 (+1.00% since reference close)"));
        assert!(text.contains("Expected move (1 daily returns): 2.00%"));
        assert!(text.contains("Aggregate sentiment: +0.800"));
        assert!(text.contains("Direction: UP"));
        assert!(text.contains("Overall sentiment: bullish"));
        assert!(text.contains("Expected price target: 51,000.00"));
        assert!(text.contains("Skipped source: cryptopanic.com"));
        assert!(text.contains("- 09:30 Bitcoin rally extends (score +1.00) [www.coindesk.com]"));
        assert!(text.contains("  https://www.coindesk.com/9"));
    }

    #[test]
    fn expected_move_label_counts_averaged_returns_only() {
        let mut r = report(Vec::new());
        r.returns = (1..=9)
            .map(|day| DailyReturn {
                date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
                daily_return: 0.01,
            })
            .collect();
        r.expected_move_window = 7;
        r.latest = None;

        let text = render_text(&r, 10);
        assert!(text.contains("Expected move (7 daily returns): 2.00%"));
        assert!(!text.contains("latest quote"));
    }

    #[test]
    fn headline_list_is_limited() {
        let r = report(vec![
            scored("first", 11, 0.5),
            scored("second", 10, 0.0),
            scored("third", 9, -0.5),
        ]);
        let text = render_text(&r, 2);
        assert!(text.contains("Top 2 recent headlines:"));
        assert!(text.contains("second"));
        assert!(!text.contains("third"));
    }

    #[test]
    fn empty_headlines_are_reported() {
        let text = render_text(&report(Vec::new()), 10);
        assert!(text.contains("Top 0 recent headlines:"));
        assert!(text.contains("No recent items matched the filter."));
    }

    #[test]
    fn rendering_leaves_signal_untouched() {
        let r = report(Vec::new());
        let before = r.signal.clone();
        let _ = render_text(&r, 10);
        let json = r.to_json_pretty().unwrap();
        assert_eq!(r.signal, before);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["signal"]["direction"], "UP");
        assert_eq!(value["signal"]["target_price"], 51_000.0);
        assert_eq!(value["news_window"], "today");
    }

    #[test]
    fn formats_prices_with_grouping() {
        assert_eq!(format_price(0.0), "0.00");
        assert_eq!(format_price(999.999), "1,000.00");
        assert_eq!(format_price(51_000.0), "51,000.00");
        assert_eq!(format_price(1_234_567.891), "1,234,567.89");
        assert_eq!(format_price(-1_500.5), "-1,500.50");
    }
}
