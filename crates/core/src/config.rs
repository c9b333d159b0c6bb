use crate::analysis::blend::Blender;
use crate::analysis::returns::ReturnConfig;
use anyhow::Context;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_NEWS_FEEDS: &[&str] = &[
    "https://www.coindesk.com/arc/outboundfeeds/rss/",
    "https://cointelegraph.com/rss",
    "https://cryptopanic.com/news/rss/bitcoin/",
];

const DEFAULT_PRICE_SYMBOL: &str = "BTC-USD";
const DEFAULT_PRICE_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 25;
const DEFAULT_PRICE_RETRIES: u32 = 3;
const MAX_PRICE_RETRIES: u32 = 10;
const DEFAULT_FALLBACK_HOURS: u32 = 24;
const DEFAULT_MAX_HEADLINES: usize = 40;

#[derive(Debug, Clone)]
pub struct Settings {
    pub news_feeds: Vec<String>,
    pub price_symbol: String,
    pub price_base_url: String,
    pub http_timeout_secs: u64,
    pub price_retries: u32,
    pub lexicon_path: Option<PathBuf>,
    pub blender: Blender,
    pub returns: ReturnConfig,
    pub fallback_hours: u32,
    pub max_headlines: usize,
    pub sentry_dsn: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            news_feeds: DEFAULT_NEWS_FEEDS.iter().map(|s| s.to_string()).collect(),
            price_symbol: DEFAULT_PRICE_SYMBOL.to_string(),
            price_base_url: DEFAULT_PRICE_BASE_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            price_retries: DEFAULT_PRICE_RETRIES,
            lexicon_path: None,
            blender: Blender::default(),
            returns: ReturnConfig::default(),
            fallback_hours: DEFAULT_FALLBACK_HOURS,
            max_headlines: DEFAULT_MAX_HEADLINES,
            sentry_dsn: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Unset or blank keys take their defaults;
    /// values that are set but do not parse are errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let news_feeds = match get("NEWS_FEEDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.news_feeds,
        };

        let blender = Blender {
            sentiment_weight: parse_or(&get, "SENTIMENT_WEIGHT", defaults.blender.sentiment_weight)?,
            momentum_weight: parse_or(&get, "MOMENTUM_WEIGHT", defaults.blender.momentum_weight)?,
            momentum_scale: parse_or(&get, "MOMENTUM_SCALE", defaults.blender.momentum_scale)?,
            threshold: parse_or(&get, "DIRECTION_THRESHOLD", defaults.blender.threshold)?,
        };

        let returns = ReturnConfig {
            lookback: parse_or(&get, "RETURN_LOOKBACK_DAYS", defaults.returns.lookback)?,
            momentum_window: parse_or(&get, "MOMENTUM_WINDOW", defaults.returns.momentum_window)?,
        };

        let settings = Self {
            news_feeds,
            price_symbol: get("PRICE_SYMBOL").unwrap_or(defaults.price_symbol),
            price_base_url: get("PRICE_BASE_URL").unwrap_or(defaults.price_base_url),
            http_timeout_secs: parse_or(&get, "HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            price_retries: parse_or(&get, "PRICE_RETRIES", defaults.price_retries)?,
            lexicon_path: get("LEXICON_PATH").map(PathBuf::from),
            blender,
            returns,
            fallback_hours: parse_or(&get, "HEADLINE_FALLBACK_HOURS", defaults.fallback_hours)?,
            max_headlines: parse_or(&get, "MAX_HEADLINES", defaults.max_headlines)?,
            sentry_dsn: get("SENTRY_DSN"),
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.price_symbol.trim().is_empty(),
            "PRICE_SYMBOL must be non-empty"
        );
        anyhow::ensure!(self.http_timeout_secs > 0, "HTTP_TIMEOUT_SECS must be > 0");
        anyhow::ensure!(
            (1..=MAX_PRICE_RETRIES).contains(&self.price_retries),
            "PRICE_RETRIES must be between 1 and {MAX_PRICE_RETRIES}"
        );
        anyhow::ensure!(
            self.fallback_hours >= 1,
            "HEADLINE_FALLBACK_HOURS must be >= 1"
        );
        anyhow::ensure!(self.max_headlines >= 1, "MAX_HEADLINES must be >= 1");
        self.returns.validate()?;
        self.blender.validate()?;
        Ok(())
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let s = settings_from(&[]).unwrap();
        assert_eq!(s.news_feeds.len(), 3);
        assert_eq!(s.price_symbol, "BTC-USD");
        assert_eq!(s.returns.lookback, 7);
        assert_eq!(s.fallback_hours, 24);
        assert_eq!(s.blender.sentiment_weight, 0.7);
        assert_eq!(s.blender.momentum_weight, 0.3);
        assert_eq!(s.blender.threshold, 0.15);
        assert!(s.lexicon_path.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let s = settings_from(&[
            ("NEWS_FEEDS", " https://a.example/rss , ,https://b.example/feed "),
            ("SENTIMENT_WEIGHT", "0.5"),
            ("MOMENTUM_WEIGHT", "0.5"),
            ("RETURN_LOOKBACK_DAYS", "14"),
            ("HEADLINE_FALLBACK_HOURS", "12"),
            ("LEXICON_PATH", "/etc/btc-bias/lexicon.json"),
        ])
        .unwrap();
        assert_eq!(
            s.news_feeds,
            vec!["https://a.example/rss", "https://b.example/feed"]
        );
        assert_eq!(s.blender.sentiment_weight, 0.5);
        assert_eq!(s.returns.lookback, 14);
        assert_eq!(s.fallback_hours, 12);
        assert_eq!(
            s.lexicon_path,
            Some(PathBuf::from("/etc/btc-bias/lexicon.json"))
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let s = settings_from(&[("PRICE_SYMBOL", "  "), ("MAX_HEADLINES", "")]).unwrap();
        assert_eq!(s.price_symbol, "BTC-USD");
        assert_eq!(s.max_headlines, 40);
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let err = settings_from(&[("DIRECTION_THRESHOLD", "high")]).unwrap_err();
        assert!(format!("{err:#}").contains("DIRECTION_THRESHOLD"));
    }

    #[test]
    fn rejects_zero_blend_weights() {
        assert!(settings_from(&[("SENTIMENT_WEIGHT", "0"), ("MOMENTUM_WEIGHT", "0")]).is_err());
        assert!(settings_from(&[("RETURN_LOOKBACK_DAYS", "0")]).is_err());
        assert!(settings_from(&[("PRICE_RETRIES", "0")]).is_err());
    }

    #[test]
    fn price_retries_are_bounded() {
        assert_eq!(
            settings_from(&[("PRICE_RETRIES", "10")]).unwrap().price_retries,
            10
        );
        let err = settings_from(&[("PRICE_RETRIES", "100")]).unwrap_err();
        assert!(err.to_string().contains("PRICE_RETRIES"));
    }
}
