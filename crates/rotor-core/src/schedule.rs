use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

/// Next tick strictly after `now`, aligned to multiples of `interval` since
/// the Unix epoch. For intervals that divide a day this matches the cron
/// schedule `0 */N * * *` in UTC.
pub fn next_tick(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let step = interval.as_secs().max(1) as i64;
    let now_secs = now.timestamp();
    let next = (now_secs.div_euclid(step) + 1) * step;
    Utc.timestamp_opt(next, 0).single().unwrap_or(now)
}

/// How long to sleep from `now` until the next tick.
pub fn until_next_tick(now: DateTime<Utc>, interval: Duration) -> Duration {
    (next_tick(now, interval) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
