use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::{format_timestamp, RotationState};

/// JSON body of the status endpoint and `rotor status --json`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub current_site_url: String,
    pub current_site_id: String,
    pub last_rotation: String,
    pub next_rotation: String,
    pub system_time: String,
    pub rotation_interval: String,
    pub store: String,
}

impl StatusReport {
    pub fn build(
        state: &RotationState,
        interval: Duration,
        now: DateTime<Utc>,
        store: impl Into<String>,
    ) -> Self {
        let next = state.last_rotation.and_then(|last| next_rotation(last, interval));
        Self {
            current_site_url: state
                .current_site_url
                .clone()
                .unwrap_or_else(|| "Not set".to_string()),
            current_site_id: state
                .current_site_id
                .clone()
                .unwrap_or_else(|| "Not set".to_string()),
            last_rotation: state
                .last_rotation
                .map(format_timestamp)
                .unwrap_or_else(|| "Never".to_string()),
            next_rotation: next
                .map(format_timestamp)
                .unwrap_or_else(|| "Unknown".to_string()),
            system_time: format_timestamp(now),
            rotation_interval: describe_interval(interval),
            store: store.into(),
        }
    }
}

pub fn next_rotation(last: DateTime<Utc>, interval: Duration) -> Option<DateTime<Utc>> {
    let step = chrono::Duration::from_std(interval).ok()?;
    last.checked_add_signed(step)
}

/// `"Every 4 hours (0 */4 * * *)"`; the cron form is shown only when the
/// interval divides a day into whole hours.
pub fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs == 0 || secs % 3600 != 0 {
        return format!("Every {secs} seconds");
    }
    let hours = secs / 3600;
    let unit = if hours == 1 { "hour" } else { "hours" };
    if 24 % hours == 0 {
        let cron = if hours == 1 {
            "0 * * * *".to_string()
        } else {
            format!("0 */{hours} * * *")
        };
        format!("Every {hours} {unit} ({cron})")
    } else {
        format!("Every {hours} {unit}")
    }
}
