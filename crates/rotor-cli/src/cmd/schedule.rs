use chrono::Utc;
use rotor_core::config::Config;
use rotor_core::schedule::{next_tick, until_next_tick};
use rotor_core::state::format_timestamp;
use rotor_core::status::describe_interval;
use serde_json::json;

use super::trigger::{invoke, request_timeout};
use crate::output::print_json;

/// Sleep to each interval boundary and trigger the server. Failed triggers are
/// logged and the loop carries on; with `once` the single result decides the
/// exit status.
pub fn run(config: &Config, server: Option<&str>, once: bool) -> anyhow::Result<()> {
    let interval = config.rotation.interval();
    if interval.is_zero() {
        anyhow::bail!("rotation.interval_hours must be at least 1");
    }
    let base = server
        .map(str::to_string)
        .unwrap_or_else(|| config.server.base_url());
    tracing::info!(server = %base, schedule = %describe_interval(interval), "scheduler started");

    loop {
        let now = Utc::now();
        let wait = until_next_tick(now, interval);
        tracing::info!(
            next = %format_timestamp(next_tick(now, interval)),
            "waiting for next rotation"
        );
        std::thread::sleep(wait);

        let relay = invoke(&base, request_timeout(config));
        let scheduled_at = format_timestamp(Utc::now());
        let report = if relay.ok {
            tracing::info!("scheduled rotation completed");
            json!({ "success": true, "rotationResult": relay.body, "scheduledAt": scheduled_at })
        } else {
            tracing::error!(details = %relay.body, "scheduled rotation failed");
            json!({ "success": false, "details": relay.body, "scheduledAt": scheduled_at })
        };
        print_json(&report)?;

        if once {
            if relay.ok {
                return Ok(());
            }
            anyhow::bail!("scheduled rotation failed");
        }
    }
}
