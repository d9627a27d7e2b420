use anyhow::Context;
use chrono::Utc;
use rotor_core::config::Config;
use rotor_core::state::RotationState;
use rotor_core::status::StatusReport;
use rotor_core::store;

use crate::output::{print_fields, print_json};

pub fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = store::open(&config.store).context("failed to open state store")?;
    let loaded = super::runtime()?
        .block_on(RotationState::load_or_initial(store.as_ref(), &config.initial));
    let state = match loaded {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(
                error = %e,
                store = %store.describe(),
                "could not read rotation state, reporting seed values"
            );
            RotationState::from_initial(&config.initial)
        }
    };
    let report = StatusReport::build(
        &state,
        config.rotation.interval(),
        Utc::now(),
        store.describe(),
    );

    if json {
        return print_json(&report);
    }

    print_fields(&[
        ("current site", &report.current_site_url),
        ("site id", &report.current_site_id),
        ("last rotation", &report.last_rotation),
        ("next rotation", &report.next_rotation),
        ("interval", &report.rotation_interval),
        ("store", &report.store),
    ]);
    Ok(())
}
