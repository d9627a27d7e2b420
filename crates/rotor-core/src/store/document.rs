use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{StateStore, StoreError, CURRENT_SITE_ID, CURRENT_SITE_URL, LAST_ROTATION};

/// Published state document, e.g. a static `rotation.json` served by the
/// currently active site. Read-only.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateDocument {
    #[serde(default)]
    current_site_url: Option<String>,
    #[serde(default)]
    current_site_id: Option<String>,
    #[serde(default)]
    last_rotation: Option<String>,
}

impl DocumentStore {
    pub fn new(url: impl Into<String>) -> Result<Self, StoreError> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            url: url.into(),
        })
    }

    async fn fetch(&self) -> Result<StateDocument, StoreError> {
        let resp = self.http.get(&self.url).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(StateDocument::default()),
            s if s.is_success() => {
                let text = resp.text().await?;
                Ok(serde_json::from_str(&text)?)
            }
            s => Err(StoreError::Backend(format!(
                "state document returned {}",
                s.as_u16()
            ))),
        }
    }
}

#[async_trait]
impl StateStore for DocumentStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let doc = self.fetch().await?;
        let value = match key {
            CURRENT_SITE_URL => doc.current_site_url,
            CURRENT_SITE_ID => doc.current_site_id,
            LAST_ROTATION => doc.last_rotation,
            _ => None,
        };
        Ok(value.filter(|v| !v.is_empty()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly(self.describe()))
    }

    fn describe(&self) -> String {
        format!("document:{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_fields_from_document() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rotation.json")
            .with_status(200)
            .with_body(
                r#"{"currentSiteUrl":"https://b.example","currentSiteId":"site-b","lastRotation":"2024-01-01T00:00:00Z"}"#,
            )
            .expect_at_least(1)
            .create_async()
            .await;

        let store = DocumentStore::new(format!("{}/rotation.json", server.url())).unwrap();
        assert_eq!(
            store.get(CURRENT_SITE_URL).await.unwrap().as_deref(),
            Some("https://b.example")
        );
        assert_eq!(
            store.get(LAST_ROTATION).await.unwrap().as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
        assert!(store.get("state-version").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_document_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rotation.json")
            .with_status(404)
            .create_async()
            .await;

        let store = DocumentStore::new(format!("{}/rotation.json", server.url())).unwrap();
        assert!(store.get(CURRENT_SITE_URL).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_is_rejected() {
        let store = DocumentStore::new("http://127.0.0.1:9/rotation.json").unwrap();
        assert!(matches!(
            store.set(CURRENT_SITE_URL, "x").await,
            Err(StoreError::ReadOnly(_))
        ));
    }
}
