use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StateStore, StoreError};
use crate::io;

/// Local JSON file holding one flat object of string values.
///
/// Writes go through a tempfile + rename so a crash mid-write never leaves a
/// truncated file behind. The mutex serializes read-modify-write cycles
/// within this process.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let path = self.path.clone();
        let data = tokio::task::spawn_blocking(move || io::read_if_exists(&path))
            .await
            .map_err(|e| StoreError::Backend(format!("task join error: {e}")))??;
        match data {
            Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(&text)?),
            _ => Ok(BTreeMap::new()),
        }
    }

    async fn write_all(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let path = self.path.clone();
        let data = serde_json::to_vec_pretty(map)?;
        tokio::task::spawn_blocking(move || io::atomic_write(&path, &data))
            .await
            .map_err(|e| StoreError::Backend(format!("task join error: {e}")))??;
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_all(&map).await
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        for (key, value) in entries {
            map.insert(key.to_string(), value.clone());
        }
        self.write_all(&map).await
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));
        assert!(store.get("current-site-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/state.json");
        FileStore::new(&path)
            .set_many(&[
                ("current-site-url", "https://b.example".into()),
                ("current-site-id", "site-b".into()),
            ])
            .await
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("current-site-id").await.unwrap().as_deref(),
            Some("site-b")
        );
        assert_eq!(
            reopened.get("current-site-url").await.unwrap().as_deref(),
            Some("https://b.example")
        );
    }

    #[tokio::test]
    async fn set_preserves_other_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(
            store.get("a").await,
            Err(StoreError::Serialisation(_))
        ));
    }
}
