use crate::config::Settings;
use crate::domain::{HeadlineRecord, ScoredHeadline};
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;

/// Built-in keyword table. Multi-word entries match consecutive tokens.
pub const DEFAULT_LEXICON: &[(&str, f64)] = &[
    // positive
    ("adoption", 1.0),
    ("all-time high", 1.5),
    ("approval", 1.0),
    ("approved", 1.0),
    ("beat", 1.0),
    ("breakout", 1.0),
    ("bull", 1.0),
    ("bullish", 1.0),
    ("buy", 1.0),
    ("demand", 1.0),
    ("gain", 1.0),
    ("gains", 1.0),
    ("green", 1.0),
    ("growth", 1.0),
    ("higher", 1.0),
    ("inflow", 1.0),
    ("inflows", 1.0),
    ("jump", 1.0),
    ("optimism", 1.0),
    ("outperform", 1.0),
    ("rally", 1.0),
    ("rallies", 1.0),
    ("recover", 1.0),
    ("resilient", 1.0),
    ("rise", 1.0),
    ("risk-on", 1.0),
    ("strong", 1.0),
    ("surge", 1.5),
    ("surges", 1.5),
    ("up", 1.0),
    // negative
    ("ban", -1.5),
    ("bear", -1.0),
    ("bearish", -1.0),
    ("crash", -1.5),
    ("decline", -1.0),
    ("drop", -1.0),
    ("fear", -1.0),
    ("hack", -1.5),
    ("hacked", -1.5),
    ("headwind", -1.0),
    ("liquidation", -1.0),
    ("liquidations", -1.0),
    ("loss", -1.0),
    ("lower", -1.0),
    ("outflow", -1.0),
    ("outflows", -1.0),
    ("plunge", -1.5),
    ("pressure", -1.0),
    ("risk-off", -1.0),
    ("sell", -1.0),
    ("sell-off", -1.5),
    ("selloff", -1.5),
    ("slump", -1.0),
    ("weak", -1.0),
    ("worse", -1.0),
];

/// Read-only keyword → weight table. Keys are stored in token form, so `"All-Time  High"` and
/// `"all-time high"` are the same entry.
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: BTreeMap<String, f64>,
    max_phrase_len: usize,
}

impl Default for Lexicon {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        let mut max_phrase_len = 1;
        for (keyword, weight) in DEFAULT_LEXICON {
            let tokens = tokenize(keyword);
            max_phrase_len = max_phrase_len.max(tokens.len());
            entries.insert(tokens.join(" "), *weight);
        }
        Self {
            entries,
            max_phrase_len,
        }
    }
}

impl Lexicon {
    pub fn from_weights(weights: BTreeMap<String, f64>) -> anyhow::Result<Self> {
        anyhow::ensure!(!weights.is_empty(), "lexicon must contain at least one keyword");

        let mut entries = BTreeMap::new();
        let mut max_phrase_len = 1;
        for (raw, weight) in weights {
            anyhow::ensure!(
                weight.is_finite() && weight != 0.0,
                "lexicon weight for {raw:?} must be finite and non-zero (got {weight})"
            );

            let tokens = tokenize(&raw);
            anyhow::ensure!(!tokens.is_empty(), "lexicon keyword {raw:?} has no tokens");
            max_phrase_len = max_phrase_len.max(tokens.len());

            let key = tokens.join(" ");
            if let Some(previous) = entries.insert(key.clone(), weight) {
                anyhow::ensure!(
                    previous == weight,
                    "lexicon keyword {key:?} listed twice with different weights"
                );
            }
        }

        Ok(Self {
            entries,
            max_phrase_len,
        })
    }

    /// Parses a JSON object of `{"keyword": weight}`.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let weights = serde_json::from_str::<BTreeMap<String, f64>>(json)
            .context("lexicon must be a JSON object of keyword -> number")?;
        Self::from_weights(weights)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lexicon file {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid lexicon file {}", path.display()))
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        match settings.lexicon_path.as_deref() {
            Some(path) => {
                let lexicon = Self::load(path)?;
                tracing::info!(path = %path.display(), keywords = lexicon.len(), "loaded lexicon");
                Ok(lexicon)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn weight(&self, keyword: &str) -> Option<f64> {
        self.entries.get(&tokenize(keyword).join(" ")).copied()
    }

    /// Signed sum of matched weights divided by the total matched magnitude, in `[-1, 1]`.
    /// Text without any lexicon match scores exactly 0.
    pub fn score(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        let mut signed = 0.0;
        let mut magnitude = 0.0;
        let mut add = |w: f64| {
            signed += w;
            magnitude += w.abs();
        };

        let mut i = 0;
        while i < tokens.len() {
            if let Some((len, w)) = self.longest_match(&tokens[i..]) {
                add(w);
                i += len;
                continue;
            }

            // "price-surge" style compounds count through their parts.
            if tokens[i].contains('-') {
                for part in tokens[i].split('-').filter(|p| !p.is_empty()) {
                    if let Some(w) = self.entries.get(part) {
                        add(*w);
                    }
                }
            }
            i += 1;
        }

        if magnitude == 0.0 {
            0.0
        } else {
            signed / magnitude
        }
    }

    pub fn score_headline(&self, headline: HeadlineRecord) -> ScoredHeadline {
        let sentiment_score = self.score(&headline.text);
        ScoredHeadline {
            headline,
            sentiment_score,
        }
    }

    pub fn score_all(&self, headlines: Vec<HeadlineRecord>) -> Vec<ScoredHeadline> {
        headlines
            .into_iter()
            .map(|h| self.score_headline(h))
            .collect()
    }

    fn longest_match(&self, tokens: &[String]) -> Option<(usize, f64)> {
        let longest = self.max_phrase_len.min(tokens.len());
        (1..=longest).rev().find_map(|len| {
            self.entries
                .get(&tokens[..len].join(" "))
                .map(|w| (len, *w))
        })
    }
}

/// Lowercased runs of alphanumerics, apostrophes and hyphens, with leading and trailing
/// apostrophes/hyphens trimmed.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String| {
        let trimmed = current.trim_matches(|c: char| c == '\'' || c == '-');
        if !trimmed.is_empty() {
            tokens.push(trimmed.to_string());
        }
        current.clear();
    };

    for c in text.chars() {
        let c = if c == '\u{2019}' { '\'' } else { c };
        if c.is_alphanumeric() || c == '\'' || c == '-' {
            current.extend(c.to_lowercase());
        } else {
            flush(&mut current);
        }
    }
    flush(&mut current);

    tokens
}

/// Mean per-headline score; 0 when there are no headlines.
pub fn aggregate_sentiment(scored: &[ScoredHeadline]) -> f64 {
    if scored.is_empty() {
        return 0.0;
    }
    scored.iter().map(|s| s.sentiment_score).sum::<f64>() / scored.len() as f64
}
