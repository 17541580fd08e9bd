//! Wall-clock formatting without a date/time dependency.
//!
//! Wall-clock times are shown at a fixed +08:00 offset (China Standard
//! Time, no daylight saving).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Offset of displayed times from UTC.
pub const UTC_OFFSET_SECS: u64 = 8 * 3600;

/// Current time as `YYYY-MM-DD HH:MM:SS` at the display offset.
pub fn now_string() -> String {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format_local(since_epoch)
}

/// Render an instant at the display offset.
pub fn format_local(since_epoch: Duration) -> String {
    format_datetime(since_epoch + Duration::from_secs(UTC_OFFSET_SECS))
}

/// Render a duration since the Unix epoch as `YYYY-MM-DD HH:MM:SS`.
pub fn format_datetime(since_epoch: Duration) -> String {
    let secs = since_epoch.as_secs();
    let (year, month, day) = days_to_date((secs / 86400) as i64);
    let rem = secs % 86400;
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// `MM:SS` countdown label.
pub fn countdown_label(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Convert days since Unix epoch to (year, month, day).
fn days_to_date(days: i64) -> (i32, u32, u32) {
    // Howard Hinnant's civil_from_days
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        assert_eq!(format_datetime(Duration::ZERO), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_known_datetime() {
        // 2021-03-04 05:06:07 UTC
        assert_eq!(
            format_datetime(Duration::from_secs(1_614_834_367)),
            "2021-03-04 05:06:07"
        );
    }

    #[test]
    fn test_local_time_is_eight_hours_ahead() {
        assert_eq!(
            format_local(Duration::from_secs(1_614_834_367)),
            "2021-03-04 13:06:07"
        );
        // 2021-03-04 20:00:00 UTC is already the next day
        assert_eq!(
            format_local(Duration::from_secs(1_614_888_000)),
            "2021-03-05 04:00:00"
        );
    }

    #[test]
    fn test_leap_day() {
        assert_eq!(days_to_date(11016), (2000, 2, 29));
    }

    #[test]
    fn test_countdown_label() {
        assert_eq!(countdown_label(0), "00:00");
        assert_eq!(countdown_label(75), "01:15");
        assert_eq!(countdown_label(20), "00:20");
    }
}
