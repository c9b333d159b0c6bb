use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineRecord {
    pub text: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub link: Option<String>,
    pub summary: Option<String>,
}

impl HeadlineRecord {
    /// Key used to treat the same story syndicated by several feeds as one headline.
    pub fn dedupe_key(&self) -> String {
        normalize_text(&self.text).to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHeadline {
    #[serde(flatten)]
    pub headline: HeadlineRecord,
    pub sentiment_score: f64,
}

/// Collapses every whitespace run to a single space and trims the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
