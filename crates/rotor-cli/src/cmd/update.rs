use anyhow::Context;
use chrono::Utc;
use rotor_core::config::Config;
use rotor_core::state::{apply_update, format_timestamp};
use rotor_core::store;

use crate::output::print_json;

pub fn run(config: &Config, url: &str, site_id: Option<&str>, json: bool) -> anyhow::Result<()> {
    let store = store::open(&config.store).context("failed to open state store")?;
    let outcome = super::runtime()?.block_on(apply_update(
        store.as_ref(),
        Some(url),
        site_id,
        Utc::now(),
    ))?;

    if json {
        return print_json(&outcome);
    }
    println!(
        "Current site set to {} (site id: {}, at {})",
        outcome.url,
        outcome.site_id.as_deref().unwrap_or("not-provided"),
        format_timestamp(outcome.last_rotation)
    );
    Ok(())
}
