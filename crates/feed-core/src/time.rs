//! Hour-partition naming and the retention/skew windows used at ingest.

use chrono::{DateTime, TimeZone, Timelike, Utc};

/// Posts older than this (relative to ingest time) are dropped rather than
/// stored; defends against grossly back-dated records.
pub const MAX_PAST_SKEW_HOURS: i64 = 13;

/// Posts further in the future than this are dropped; defends against clock
/// skew on the authoring client.
pub const MAX_FUTURE_SKEW_MINUTES: i64 = 10;

/// Partitions whose hour is older than this are dropped wholesale by the
/// retention sweep. Kept one hour wider than the ingest-time skew filter so a
/// partition is never dropped out from under a post still being inserted
/// into it.
pub const RETENTION_HORIZON_HOURS: i64 = 13;

/// Truncate a timestamp down to the start of its hour.
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// The partition name a post's `created_at` lives in: `posts_y{YYYY}m{MM}d{DD}h{HH}`.
pub fn partition_name(ts: DateTime<Utc>) -> String {
    let hour = floor_to_hour(ts);
    format!(
        "posts_y{:04}m{:02}d{:02}h{:02}",
        hour.format("%Y").to_string().parse::<i32>().unwrap_or(0),
        hour.format("%m").to_string().parse::<u32>().unwrap_or(0),
        hour.format("%d").to_string().parse::<u32>().unwrap_or(0),
        hour.format("%H").to_string().parse::<u32>().unwrap_or(0),
    )
}

/// Parse the hour a partition name encodes. Returns `None` for anything not
/// matching `posts_y%Ym%md%dh%H`, so a retention sweep can skip tables that
/// aren't post partitions without erroring out the whole sweep.
pub fn parse_partition_hour(name: &str) -> Option<DateTime<Utc>> {
    let rest = name.strip_prefix("posts_y")?;
    let (y, rest) = rest.split_once('m')?;
    let (mo, rest) = rest.split_once('d')?;
    let (d, h) = rest.split_once('h')?;

    let year: i32 = y.parse().ok()?;
    let month: u32 = mo.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    let hour: u32 = h.parse().ok()?;

    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single()
}

/// Whether a post's `created_at` falls within the ingest-time acceptance
/// window, evaluated against `now`.
pub fn within_ingest_window(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let earliest = now - chrono::Duration::hours(MAX_PAST_SKEW_HOURS);
    let latest = now + chrono::Duration::minutes(MAX_FUTURE_SKEW_MINUTES);
    earliest <= created_at && created_at <= latest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_name_round_trips() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 5, 14, 37, 9).unwrap();
        let name = partition_name(ts);
        assert_eq!(name, "posts_y2026m03d05h14");
        let parsed = parse_partition_hour(&name).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 5, 14, 0, 0).unwrap());
    }

    #[test]
    fn parse_rejects_non_partition_names() {
        assert_eq!(parse_partition_hour("follows"), None);
        assert_eq!(parse_partition_hour("posts_ybadname"), None);
    }

    #[test]
    fn ingest_window_bounds() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        assert!(within_ingest_window(now, now));
        assert!(!within_ingest_window(
            now - chrono::Duration::hours(14),
            now
        ));
        assert!(!within_ingest_window(
            now + chrono::Duration::minutes(11),
            now
        ));
    }
}
