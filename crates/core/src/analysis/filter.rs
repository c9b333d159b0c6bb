use crate::domain::HeadlineRecord;
use crate::time::utc_day::start_of_utc_day;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which window produced the filtered headline set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewsWindow {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "last_24h")]
    Trailing,
    #[serde(rename = "none")]
    None,
}

impl NewsWindow {
    pub fn label(self) -> &'static str {
        match self {
            NewsWindow::Today => "today",
            NewsWindow::Trailing => "last_24h",
            NewsWindow::None => "none",
        }
    }
}

/// Keeps headlines published in `[start of current UTC day, now]`. When that is empty, keeps
/// `[now - fallback, now]` instead. Input order is preserved.
pub fn filter_recent(
    items: Vec<HeadlineRecord>,
    now: DateTime<Utc>,
    fallback: Duration,
) -> (Vec<HeadlineRecord>, NewsWindow) {
    let day_start = start_of_utc_day(now);
    let in_window =
        |h: &HeadlineRecord, from: DateTime<Utc>| h.published_at >= from && h.published_at <= now;

    if items.iter().any(|h| in_window(h, day_start)) {
        let today = items
            .into_iter()
            .filter(|h| in_window(h, day_start))
            .collect();
        return (today, NewsWindow::Today);
    }

    let cutoff = now - fallback;
    let recent: Vec<_> = items
        .into_iter()
        .filter(|h| in_window(h, cutoff))
        .collect();
    if recent.is_empty() {
        (recent, NewsWindow::None)
    } else {
        (recent, NewsWindow::Trailing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn headline(text: &str, published_at: DateTime<Utc>) -> HeadlineRecord {
        HeadlineRecord {
            text: text.to_string(),
            source: "test".to_string(),
            published_at,
            link: None,
            summary: None,
        }
    }

    fn titles(items: &[HeadlineRecord]) -> Vec<&str> {
        items.iter().map(|h| h.text.as_str()).collect()
    }

    #[test]
    fn keeps_only_same_utc_day() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 15, 0, 0).unwrap();
        let items = vec![
            headline("today late", Utc.with_ymd_and_hms(2026, 10, 18, 14, 0, 0).unwrap()),
            headline("midnight", Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()),
            headline("yesterday", Utc.with_ymd_and_hms(2026, 10, 17, 23, 59, 0).unwrap()),
            headline("two days ago", Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()),
        ];

        let (kept, window) = filter_recent(items, now, Duration::hours(24));
        assert_eq!(window, NewsWindow::Today);
        assert_eq!(titles(&kept), vec!["today late", "midnight"]);
    }

    #[test]
    fn falls_back_to_trailing_window_when_today_is_empty() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 2, 0, 0).unwrap();
        let items = vec![
            headline("late yesterday", Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap()),
            headline("exactly 24h", Utc.with_ymd_and_hms(2026, 10, 17, 2, 0, 0).unwrap()),
            headline("too old", Utc.with_ymd_and_hms(2026, 10, 17, 1, 59, 0).unwrap()),
        ];

        let (kept, window) = filter_recent(items, now, Duration::hours(24));
        assert_eq!(window, NewsWindow::Trailing);
        assert_eq!(titles(&kept), vec!["late yesterday", "exactly 24h"]);
    }

    #[test]
    fn future_items_never_count() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap();
        let items = vec![headline(
            "scheduled",
            Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap(),
        )];

        let (kept, window) = filter_recent(items, now, Duration::hours(24));
        assert!(kept.is_empty());
        assert_eq!(window, NewsWindow::None);
    }

    #[test]
    fn empty_input_is_a_valid_outcome() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap();
        let (kept, window) = filter_recent(Vec::new(), now, Duration::hours(24));
        assert!(kept.is_empty());
        assert_eq!(window.label(), "none");
    }
}
