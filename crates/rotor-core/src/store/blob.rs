use async_trait::async_trait;
use reqwest::StatusCode;

use super::{StateStore, StoreError};

/// Managed blob store reached over HTTP: one blob per key under `base`.
///
/// `GET {base}/{key}` returns the value as text (404 when absent);
/// `PUT {base}/{key}` replaces it.
#[derive(Debug, Clone)]
pub struct BlobStore {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl BlobStore {
    pub fn new(base: impl Into<String>, token: Option<String>) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: reqwest::Method, key: &str) -> reqwest::RequestBuilder {
        let req = self.http.request(method, format!("{}/{}", self.base, key));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl StateStore for BlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let resp = self.request(reqwest::Method::GET, key).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let text = resp.text().await?;
                Ok(if text.is_empty() { None } else { Some(text) })
            }
            s => Err(StoreError::Backend(format!(
                "blob GET {key} returned {}",
                s.as_u16()
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let resp = self
            .request(reqwest::Method::PUT, key)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(value.to_string())
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Backend(format!(
                "blob PUT {key} returned {}",
                resp.status().as_u16()
            )))
        }
    }

    fn describe(&self) -> String {
        format!("blob:{}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_reads_blob_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rotation/current-site-url")
            .match_header("authorization", "Bearer blobtok")
            .with_status(200)
            .with_body("https://b.example")
            .create_async()
            .await;

        let store = BlobStore::new(format!("{}/rotation", server.url()), Some("blobtok".into()))
            .unwrap();
        assert_eq!(
            store.get("current-site-url").await.unwrap().as_deref(),
            Some("https://b.example")
        );
    }

    #[tokio::test]
    async fn missing_blob_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/current-site-id")
            .with_status(404)
            .create_async()
            .await;

        let store = BlobStore::new(server.url(), None).unwrap();
        assert!(store.get("current-site-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_puts_value() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/current-site-id")
            .match_body("site-b")
            .with_status(200)
            .create_async()
            .await;

        let store = BlobStore::new(server.url(), None).unwrap();
        store.set("current-site-id", "site-b").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_backend_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/current-site-id")
            .with_status(503)
            .create_async()
            .await;

        let store = BlobStore::new(server.url(), None).unwrap();
        assert!(matches!(
            store.get("current-site-id").await,
            Err(StoreError::Backend(_))
        ));
    }
}
