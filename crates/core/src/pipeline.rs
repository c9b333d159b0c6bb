use crate::analysis::{
    aggregate_sentiment, filter_recent, Blender, Lexicon, ReturnConfig, ReturnStats,
};
use crate::config::Settings;
use crate::error::PriceDataUnavailable;
use crate::ingest::feeds::{fetch_headlines, HeadlineSource, RssFeedSource};
use crate::ingest::http_client;
use crate::ingest::provider::{PriceSource, YahooChartClient};
use crate::report::Report;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineParams {
    pub fallback: Duration,
    pub max_headlines: usize,
    pub returns: ReturnConfig,
    pub blender: Blender,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            fallback: Duration::hours(24),
            max_headlines: 40,
            returns: ReturnConfig::default(),
            blender: Blender::default(),
        }
    }
}

impl PipelineParams {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            fallback: Duration::hours(i64::from(settings.fallback_hours)),
            max_headlines: settings.max_headlines,
            returns: settings.returns,
            blender: settings.blender,
        }
    }
}

/// fetch → filter → score → blend → report, once per [`Pipeline::run`].
pub struct Pipeline {
    headline_sources: Vec<Box<dyn HeadlineSource>>,
    price_source: Box<dyn PriceSource>,
    lexicon: Lexicon,
    params: PipelineParams,
}

impl Pipeline {
    pub fn new(
        headline_sources: Vec<Box<dyn HeadlineSource>>,
        price_source: Box<dyn PriceSource>,
        lexicon: Lexicon,
        params: PipelineParams,
    ) -> Self {
        Self {
            headline_sources,
            price_source,
            lexicon,
            params,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = http_client(settings.http_timeout_secs)?;
        let lexicon = Lexicon::from_settings(settings)?;

        let headline_sources = RssFeedSource::all_from_settings(settings, &http)
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn HeadlineSource>)
            .collect();
        let price_source = Box::new(YahooChartClient::from_settings(settings, http));

        Ok(Self::new(
            headline_sources,
            price_source,
            lexicon,
            PipelineParams::from_settings(settings),
        ))
    }

    /// Runs every stage once for the instant `now`. Headline problems never fail the run;
    /// missing price data does, as [`PriceDataUnavailable`].
    pub async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<Report> {
        let (fetched, prices) = tokio::join!(
            fetch_headlines(&self.headline_sources),
            self.price_source.fetch_daily_closes(now)
        );
        let history = prices?;

        let (mut recent, news_window) =
            filter_recent(fetched.headlines, now, self.params.fallback);
        recent.truncate(self.params.max_headlines);

        let headlines = self.lexicon.score_all(recent);
        let sentiment = aggregate_sentiment(&headlines);

        let stats = ReturnStats::from_closes(&history.closes, &self.params.returns).ok_or_else(|| {
            PriceDataUnavailable::insufficient(&history.symbol, history.closes.len())
        })?;
        let reference = history
            .reference_close()
            .ok_or_else(|| PriceDataUnavailable::insufficient(&history.symbol, 0))?;

        let signal = self.params.blender.blend(
            sentiment,
            stats.recent_momentum,
            stats.expected_move_pct,
            reference.close,
        );

        tracing::info!(
            symbol = %history.symbol,
            window = news_window.label(),
            headlines = headlines.len(),
            skipped_sources = fetched.unavailable.len(),
            sentiment = signal.aggregate_sentiment,
            bias = signal.combined_bias,
            direction = signal.direction.as_str(),
            target = signal.target_price,
            "pipeline run complete"
        );

        Ok(Report {
            run_id: Uuid::new_v4(),
            generated_at: now,
            symbol: history.symbol,
            news_window,
            signal,
            headlines,
            unavailable_sources: fetched.unavailable,
            closes: history.closes,
            returns: stats.returns,
            expected_move_window: stats.expected_move_window,
            latest: history.latest,
        })
    }
}
