use anyhow::Context;
use rotor_core::config::{Config, WarnLevel};
use rotor_server::AppState;

pub fn run(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    for w in config.validate() {
        match w.level {
            WarnLevel::Error => tracing::error!("{}", w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }

    let port = port.unwrap_or(config.server.port);
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let state = AppState::from_config(config).context("failed to open state store")?;
        rotor_server::serve(state, port).await
    })
}
