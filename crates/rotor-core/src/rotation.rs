//! The rotation workflow.
//!
//! ```text
//! resolve old site id ──► create site ──► trigger build ──► poll deploys
//!                                                              │ ready
//!                         delete old site ◄── write state ◄────┘
//! ```
//!
//! Anything failing before the state write leaves the store untouched and
//! deletes nothing. A failed delete is reported but does not fail the
//! rotation: the new site is already live.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hosting_api::{Client, CreateSite, RepoSource, Site};
use regex::Regex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::{InitialState, RotationConfig, SourceConfig};
use crate::error::{Result, RotorError};
use crate::state::RotationState;
use crate::store::StateStore;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewSite {
    pub id: String,
    pub name: String,
    pub url: String,
    pub admin_url: String,
}

impl From<&Site> for NewSite {
    fn from(site: &Site) -> Self {
        Self {
            id: site.id.clone(),
            name: site.name.clone(),
            url: site.public_url().to_string(),
            admin_url: site.admin_url.clone(),
        }
    }
}

/// What happened to the previously active site.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OldSite {
    /// No previous site recorded.
    None,
    /// A URL was recorded but no matching site id could be found.
    Unresolved { reason: String },
    /// The platform handed back the same id; nothing to delete.
    SameAsNew { id: String },
    Deleted { id: String },
    DeleteFailed { id: String, error: String },
}

impl OldSite {
    pub fn id(&self) -> Option<&str> {
        match self {
            OldSite::SameAsNew { id } | OldSite::Deleted { id } | OldSite::DeleteFailed { id, .. } => {
                Some(id)
            }
            OldSite::None | OldSite::Unresolved { .. } => None,
        }
    }

    pub fn was_deleted(&self) -> bool {
        matches!(self, OldSite::Deleted { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OldSite::DeleteFailed { error, .. } => Some(error),
            OldSite::Unresolved { reason } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationOutcome {
    pub new_site: NewSite,
    pub old_site: OldSite,
    pub completed_at: DateTime<Utc>,
    pub request_id: String,
}

enum Resolution {
    None,
    Found(String),
    Unresolved(String),
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a> {
    client: &'a Client,
    store: &'a dyn StateStore,
    rotation: &'a RotationConfig,
    source: &'a SourceConfig,
    initial: Option<&'a InitialState>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        client: &'a Client,
        store: &'a dyn StateStore,
        rotation: &'a RotationConfig,
        source: &'a SourceConfig,
    ) -> Self {
        Self {
            client,
            store,
            rotation,
            source,
            initial: None,
        }
    }

    /// Seed used when the store holds no record yet.
    pub fn with_initial(mut self, initial: &'a InitialState) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Run one full rotation.
    pub async fn rotate(&self, request_id: &str) -> Result<RotationOutcome> {
        let span = tracing::info_span!("rotation", request_id = %request_id);
        self.run(request_id).instrument(span).await
    }

    async fn run(&self, request_id: &str) -> Result<RotationOutcome> {
        tracing::info!(api = %self.client.base(), "site rotation started");

        // 1. Previous site.
        let previous = self.previous_state().await;
        let resolution = self.resolve_old_site(&previous).await;
        match &resolution {
            Resolution::Found(id) => tracing::info!(old_site_id = %id, "found previous site"),
            Resolution::Unresolved(reason) => {
                tracing::warn!(%reason, "previous site could not be resolved, nothing will be deleted")
            }
            Resolution::None => tracing::info!("no previous site recorded"),
        }

        // 2. New site.
        let name = site_name(&self.rotation.site_prefix, Utc::now());
        tracing::info!(site_name = %name, repo = ?self.source.repo, branch = %self.source.branch, "creating site");
        let site = self.client.create_site(&self.create_request(&name)).await?;
        tracing::info!(site_id = %site.id, url = %site.public_url(), "site created");

        // 3. Build and wait.
        if self.rotation.trigger_build {
            match self.client.trigger_build(&site.id, true).await {
                Ok(build) => tracing::info!(build_id = %build.id, "build triggered"),
                Err(e) => tracing::warn!(error = %e, "could not trigger build, site was still created"),
            }
        }
        if self.rotation.wait_for_deploy {
            self.wait_until_ready(&site.id).await?;
        }

        // 4. Repoint state before anything is destroyed.
        let mut state = previous;
        state.record_rotation(site.public_url(), Some(&site.id), Utc::now());
        state.save(self.store).await?;
        tracing::info!(version = state.version, store = %self.store.describe(), "rotation state updated");

        // 5. Old site.
        let old_site = match resolution {
            Resolution::None => OldSite::None,
            Resolution::Unresolved(reason) => OldSite::Unresolved { reason },
            Resolution::Found(id) if id == site.id => OldSite::SameAsNew { id },
            Resolution::Found(id) => match self.client.delete_site(&id).await {
                Ok(()) => {
                    tracing::info!(old_site_id = %id, "old site deleted");
                    OldSite::Deleted { id }
                }
                Err(e) => {
                    tracing::error!(old_site_id = %id, error = %e, "failed to delete old site");
                    OldSite::DeleteFailed {
                        id,
                        error: e.to_string(),
                    }
                }
            },
        };

        let outcome = RotationOutcome {
            new_site: NewSite::from(&site),
            old_site,
            completed_at: Utc::now(),
            request_id: request_id.to_string(),
        };
        tracing::info!(new_site_id = %outcome.new_site.id, "site rotation completed");
        Ok(outcome)
    }

    async fn previous_state(&self) -> RotationState {
        let loaded = match self.initial {
            Some(initial) => RotationState::load_or_initial(self.store, initial).await,
            None => RotationState::load(self.store).await,
        };
        match loaded {
            Ok(state) => state,
            Err(e) => {
                let fallback = self.initial.map(RotationState::from_initial).unwrap_or_default();
                tracing::warn!(
                    error = %e,
                    store = %self.store.describe(),
                    seeded = !fallback.is_empty(),
                    "could not read rotation state, record version restarts at 1"
                );
                fallback
            }
        }
    }

    fn create_request(&self, name: &str) -> CreateSite {
        let req = CreateSite::named(name);
        match &self.source.repo {
            Some(repo) => req.with_repo(RepoSource {
                provider: self.source.provider.clone(),
                repo: repo.clone(),
                branch: self.source.branch.clone(),
                dir: self.source.dir.clone(),
            }),
            None => req,
        }
    }

    /// Find the id of the site the record points at. State written by older
    /// deployments only carries the URL, so fall back to matching it against
    /// the platform.
    async fn resolve_old_site(&self, previous: &RotationState) -> Resolution {
        if let Some(id) = &previous.current_site_id {
            return Resolution::Found(id.clone());
        }
        let Some(url) = &previous.current_site_url else {
            return Resolution::None;
        };
        let host = url_host(url);
        let label = host.and_then(|h| h.split('.').next());

        if let Some(host) = host {
            match self.client.get_site(host).await {
                Ok(site) => return Resolution::Found(site.id),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(host, "no site answers to host, listing sites")
                }
                Err(e) => tracing::warn!(host, error = %e, "direct site lookup failed, listing sites"),
            }
        }

        match self.client.list_sites().await {
            Ok(sites) => match sites.iter().find(|s| s.matches(url, label)) {
                Some(site) => Resolution::Found(site.id.clone()),
                None => Resolution::Unresolved(format!("no site matches {url}")),
            },
            Err(e) => Resolution::Unresolved(e.to_string()),
        }
    }

    async fn wait_until_ready(&self, site_id: &str) -> Result<()> {
        let timeout = self.rotation.deploy_timeout();
        let poll = self.rotation.poll_interval();
        let started = Instant::now();
        tracing::info!(site_id, timeout_secs = timeout.as_secs(), "waiting for deploy");

        loop {
            let deploys = self.client.list_deploys(site_id).await?;
            match deploys.first() {
                Some(d) if d.is_ready() => {
                    tracing::info!(site_id, deploy_id = %d.id, "deploy is ready");
                    return Ok(());
                }
                latest => {
                    let state = latest.map(|d| d.state.as_str()).unwrap_or("unknown");
                    tracing::debug!(site_id, state, "deploy not ready yet");
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(RotorError::DeployTimeout {
                    site_id: site_id.to_string(),
                    waited: elapsed,
                });
            }
            tokio::time::sleep(poll.min(timeout - elapsed).max(Duration::from_millis(1))).await;
        }
    }
}

/// `"{prefix}-{unix millis}"`.
pub fn site_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}-{}", now.timestamp_millis())
}

fn url_host(url: &str) -> Option<&str> {
    static HOST: OnceLock<Regex> = OnceLock::new();
    let re = HOST.get_or_init(|| Regex::new(r"^https?://([^/:?#]+)").expect("valid regex"));
    re.captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|h| !h.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
