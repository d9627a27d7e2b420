use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::HostingError;
use crate::types::{Build, CreateSite, Deploy, Site, TriggerBuild};
use crate::Result;

/// Public management API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.netlify.com/api/v1";

/// Authenticated handle on the management API.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("base", &self.base).finish()
    }
}

impl Client {
    pub fn new(base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("rotor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(http, base, token))
    }

    /// Build on an existing `reqwest::Client` (shared connection pool).
    pub fn with_http(http: reqwest::Client, base: impl Into<String>, token: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            http,
            base,
            token: token.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    // -----------------------------------------------------------------------
    // Sites
    // -----------------------------------------------------------------------

    pub async fn create_site(&self, body: &CreateSite) -> Result<Site> {
        self.send_json(Method::POST, "/sites", Some(body)).await
    }

    /// Fetch one site by id or by its platform domain (`name.netlify.app`).
    pub async fn get_site(&self, id_or_domain: &str) -> Result<Site> {
        self.send_json::<(), _>(Method::GET, &format!("/sites/{id_or_domain}"), None)
            .await
    }

    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        self.send_json::<(), _>(Method::GET, "/sites", None).await
    }

    pub async fn delete_site(&self, site_id: &str) -> Result<()> {
        let endpoint = format!("/sites/{site_id}");
        self.send::<()>(Method::DELETE, &endpoint, None).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Deploys
    // -----------------------------------------------------------------------

    /// Deploys for a site, most recent first.
    pub async fn list_deploys(&self, site_id: &str) -> Result<Vec<Deploy>> {
        self.send_json::<(), _>(Method::GET, &format!("/sites/{site_id}/deploys"), None)
            .await
    }

    pub async fn trigger_build(&self, site_id: &str, clear_cache: bool) -> Result<Build> {
        let body = TriggerBuild { clear_cache };
        self.send_json(Method::POST, &format!("/sites/{site_id}/builds"), Some(&body))
            .await
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    async fn send_json<B, T>(&self, method: Method, endpoint: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.send(method, endpoint, body).await?;
        serde_json::from_str(&text).map_err(|source| HostingError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// Send a request and return the raw body text of a 2xx response.
    async fn send<B>(&self, method: Method, endpoint: &str, body: Option<&B>) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base, endpoint);
        tracing::debug!(%method, endpoint, "hosting API request");

        let mut req = self.http.request(method, &url).bearer_auth(&self.token);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            tracing::error!(endpoint, status = status.as_u16(), body = %text, "hosting API error");
            return Err(HostingError::Api {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                body: text,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(String::new());
        }
        Ok(text)
    }
}
