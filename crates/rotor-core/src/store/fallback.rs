use std::sync::Arc;

use async_trait::async_trait;

use super::{StateStore, StoreError};

/// Primary store backed by a secondary that absorbs its failures.
///
/// Reads prefer the primary and consult the secondary when the primary errors
/// or has nothing. Writes always land in the secondary too, so a primary
/// outage later still leaves the last written values readable in-process.
pub struct FallbackStore {
    primary: Arc<dyn StateStore>,
    secondary: Arc<dyn StateStore>,
}

impl FallbackStore {
    pub fn new(primary: Arc<dyn StateStore>, secondary: Arc<dyn StateStore>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl StateStore for FallbackStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.primary.get(key).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    key,
                    store = %self.primary.describe(),
                    error = %e,
                    "primary store read failed, checking fallback"
                );
            }
        }
        self.secondary.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set_many(&[(key, value.to_string())]).await
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let primary = self.primary.set_many(entries).await;
        if let Err(e) = &primary {
            tracing::warn!(
                store = %self.primary.describe(),
                error = %e,
                "primary store write failed, keeping values in fallback"
            );
        }
        let secondary = self.secondary.set_many(entries).await;
        match (primary, secondary) {
            (Ok(()), _) | (_, Ok(())) => Ok(()),
            (Err(_), Err(e)) => Err(e),
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} (fallback: {})",
            self.primary.describe(),
            self.secondary.describe()
        )
    }
}
