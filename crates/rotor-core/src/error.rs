use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RotorError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Platform(#[from] hosting_api::HostingError),

    #[error("deploy for site {site_id} was not ready after {}s", waited.as_secs())]
    DeployTimeout { site_id: String, waited: Duration },

    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("rotation already in progress")]
    RotationInProgress,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RotorError>;
