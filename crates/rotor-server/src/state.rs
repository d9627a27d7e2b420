use std::sync::Arc;

use hosting_api::Client;
use rotor_core::config::Config;
use rotor_core::store::{self, StateStore};
use rotor_core::RotorError;
use tokio::sync::Mutex;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn StateStore>,
    /// Held for the duration of a rotation; a second request gets 409.
    pub rotation_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Open the configured store and build state around it.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = store::open(&config.store)?;
        tracing::info!(store = %store.describe(), "state store opened");
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn StateStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            rotation_lock: Arc::new(Mutex::new(())),
        }
    }

    /// A platform client, or a configuration error when no token is set.
    pub fn client(&self) -> Result<Client, RotorError> {
        let token = self.config.require_token()?;
        Ok(Client::new(&self.config.platform.api_base, token)?)
    }
}
