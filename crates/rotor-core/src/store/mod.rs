//! Key/value persistence for the rotation record.
//!
//! Every backend implements [`StateStore`]; callers never know which one they
//! hold. [`open`] builds the configured backend, wrapped in a
//! [`FallbackStore`] when a secondary is configured.

mod blob;
mod document;
mod fallback;
mod file;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{BackendConfig, StoreConfig};

pub use blob::BlobStore;
pub use document::DocumentStore;
pub use fallback::FallbackStore;
pub use file::FileStore;
pub use memory::MemoryStore;

pub const CURRENT_SITE_URL: &str = "current-site-url";
pub const CURRENT_SITE_ID: &str = "current-site-id";
pub const LAST_ROTATION: &str = "last-rotation";
pub const STATE_VERSION: &str = "state-version";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed state data: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("{0} is read-only")]
    ReadOnly(String),
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Value for `key`, `None` when it was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write several keys together. Backends that can persist them in one
    /// operation override this.
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    /// Short label for logs and the status endpoint.
    fn describe(&self) -> String;
}

/// Build a single backend.
pub fn open_backend(cfg: &BackendConfig) -> Result<Arc<dyn StateStore>, StoreError> {
    let store: Arc<dyn StateStore> = match cfg {
        BackendConfig::Memory => Arc::new(MemoryStore::new()),
        BackendConfig::File { path } => Arc::new(FileStore::new(path.clone())),
        BackendConfig::Blob { url, token } => {
            Arc::new(BlobStore::new(url.clone(), token.clone())?)
        }
        BackendConfig::Document { url } => Arc::new(DocumentStore::new(url.clone())?),
    };
    Ok(store)
}

/// Build the configured store, with its fallback when one is set.
pub fn open(cfg: &StoreConfig) -> Result<Arc<dyn StateStore>, StoreError> {
    let primary = open_backend(&cfg.primary)?;
    let store = match &cfg.fallback {
        Some(secondary) => {
            let secondary = open_backend(secondary)?;
            Arc::new(FallbackStore::new(primary, secondary)) as Arc<dyn StateStore>
        }
        None => primary,
    };
    tracing::debug!(store = %store.describe(), "state store opened");
    Ok(store)
}
