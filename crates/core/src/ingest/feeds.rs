use crate::config::Settings;
use crate::domain::headline::normalize_text;
use crate::domain::HeadlineRecord;
use crate::error::SourceUnavailable;
use anyhow::{Context, Result};
use feed_rs::model::Entry;
use std::collections::HashSet;

#[async_trait::async_trait]
pub trait HeadlineSource: Send + Sync {
    fn name(&self) -> &str;

    /// One attempt at reading the source. Malformed entries are dropped; a source that cannot
    /// be read at all is an error.
    async fn fetch(&self) -> Result<Vec<HeadlineRecord>>;
}

/// An RSS 2.0 or Atom feed at a fixed URL.
#[derive(Debug, Clone)]
pub struct RssFeedSource {
    http: reqwest::Client,
    url: String,
    name: String,
}

impl RssFeedSource {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        let url = url.into();
        let name = source_name(&url);
        Self { http, url, name }
    }

    pub fn all_from_settings(settings: &Settings, http: &reqwest::Client) -> Vec<Self> {
        settings
            .news_feeds
            .iter()
            .map(|url| Self::new(http.clone(), url.as_str()))
            .collect()
    }
}

#[async_trait::async_trait]
impl HeadlineSource for RssFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<HeadlineRecord>> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("feed request failed")?;

        let status = res.status();
        anyhow::ensure!(status.is_success(), "feed HTTP {status}");

        let body = res.bytes().await.context("failed to read feed body")?;
        parse_feed(&self.name, &body)
    }
}

/// Host of the feed URL, or the URL itself when it has none.
pub fn source_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

pub fn parse_feed(source: &str, body: &[u8]) -> Result<Vec<HeadlineRecord>> {
    let feed = feed_rs::parser::parse(body).context("feed is not valid RSS/Atom")?;

    let total = feed.entries.len();
    let headlines: Vec<_> = feed
        .entries
        .into_iter()
        .filter_map(|entry| headline_from_entry(source, entry))
        .collect();

    let dropped = total - headlines.len();
    if dropped > 0 {
        tracing::debug!(source, dropped, total, "dropped malformed feed entries");
    }
    Ok(headlines)
}

fn headline_from_entry(source: &str, entry: Entry) -> Option<HeadlineRecord> {
    let published_at = entry.published.or(entry.updated)?;
    let text = entry
        .title
        .map(|t| normalize_text(&t.content))
        .filter(|t| !t.is_empty())?;
    let link = entry
        .links
        .into_iter()
        .map(|l| l.href.trim().to_string())
        .find(|href| !href.is_empty());
    let summary = entry
        .summary
        .map(|s| normalize_text(&s.content))
        .filter(|s| !s.is_empty());

    Some(HeadlineRecord {
        text,
        source: source.to_string(),
        published_at,
        link,
        summary,
    })
}

#[derive(Debug, Clone, Default)]
pub struct HeadlineFetch {
    pub headlines: Vec<HeadlineRecord>,
    pub unavailable: Vec<SourceUnavailable>,
}

/// Reads every source once, skipping the ones that fail, then dedupes and orders newest first.
pub async fn fetch_headlines(sources: &[Box<dyn HeadlineSource>]) -> HeadlineFetch {
    let mut all = Vec::new();
    let mut unavailable = Vec::new();

    for source in sources {
        match source.fetch().await {
            Ok(items) => {
                tracing::debug!(source = source.name(), items = items.len(), "fetched headlines");
                all.extend(items);
            }
            Err(err) => {
                let err = SourceUnavailable {
                    source: source.name().to_string(),
                    detail: format!("{err:#}"),
                };
                tracing::warn!(
                    source = %err.source,
                    error = %err,
                    "headline source unavailable; skipping"
                );
                unavailable.push(err);
            }
        }
    }

    HeadlineFetch {
        headlines: dedupe_newest_first(all),
        unavailable,
    }
}

/// Drops repeats of the same normalized headline text (first occurrence wins), then sorts by
/// publication time, newest first.
pub fn dedupe_newest_first(items: Vec<HeadlineRecord>) -> Vec<HeadlineRecord> {
    let mut seen = HashSet::new();
    let mut out: Vec<_> = items
        .into_iter()
        .filter(|h| seen.insert(h.dedupe_key()))
        .collect();
    out.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    out
}
