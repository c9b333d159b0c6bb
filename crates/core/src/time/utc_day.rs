use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

pub fn utc_date_of_unix(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

/// `--now` override, or the current time when absent.
pub fn resolve_now(
    now_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<DateTime<Utc>> {
    let Some(s) = now_arg else {
        return Ok(now_utc);
    };

    let parsed = DateTime::parse_from_rfc3339(s.trim())
        .with_context(|| format!("invalid RFC 3339 instant: {s}"))?;
    Ok(parsed.with_timezone(&Utc))
}
