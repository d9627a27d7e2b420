use anyhow::Context;
use hosting_api::Client;
use rotor_core::config::Config;
use rotor_core::rotation::{OldSite, Orchestrator};
use rotor_core::store;

use crate::output::print_json;

pub fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let token = config.require_token()?;
    let client = Client::new(&config.platform.api_base, token)?;
    let store = store::open(&config.store).context("failed to open state store")?;
    let request_id = format!("cli_{}", uuid::Uuid::new_v4().simple());

    let outcome = super::runtime()?.block_on(
        Orchestrator::new(&client, store.as_ref(), &config.rotation, &config.source)
            .with_initial(&config.initial)
            .rotate(&request_id),
    )?;

    if json {
        return print_json(&outcome);
    }

    println!("New site: {} ({})", outcome.new_site.url, outcome.new_site.id);
    match &outcome.old_site {
        OldSite::None => println!("No previous site."),
        OldSite::Unresolved { reason } => println!("Previous site not resolved: {reason}"),
        OldSite::SameAsNew { id } => println!("Previous site {id} is the new site; kept."),
        OldSite::Deleted { id } => println!("Deleted previous site {id}."),
        OldSite::DeleteFailed { id, error } => {
            println!("Could not delete previous site {id}: {error}")
        }
    }
    Ok(())
}
