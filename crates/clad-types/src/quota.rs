use chrono::{DateTime, Utc};

/// UTC calendar-day key for daily watch counters, e.g. "2026-08-26".
pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Seconds left on the per-user cooldown, or `None` once it has elapsed.
pub fn cooldown_remaining(
    last_watch_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown_seconds: i64,
) -> Option<i64> {
    let last = last_watch_at?;
    let elapsed = (now - last).num_seconds();
    if elapsed < cooldown_seconds {
        Some(cooldown_seconds - elapsed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_day_key_is_utc_calendar_day() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 26, 23, 59, 59).unwrap();
        assert_eq!(day_key(ts), "2026-08-26");
        assert_eq!(day_key(ts + Duration::seconds(1)), "2026-08-27");
    }

    #[test]
    fn test_cooldown_remaining() {
        let now = Utc::now();
        assert_eq!(cooldown_remaining(None, now, 30), None);
        assert_eq!(
            cooldown_remaining(Some(now - Duration::seconds(10)), now, 30),
            Some(20)
        );
        assert_eq!(
            cooldown_remaining(Some(now - Duration::seconds(30)), now, 30),
            None
        );
    }
}
