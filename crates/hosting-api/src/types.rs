use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Site
// ---------------------------------------------------------------------------

/// A deployment unit on the hosting platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ssl_url: String,
    #[serde(default)]
    pub admin_url: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl Site {
    /// The URL visitors should be sent to: the TLS URL when the platform
    /// reports one, otherwise the plain URL.
    pub fn public_url(&self) -> &str {
        if self.ssl_url.is_empty() {
            &self.url
        } else {
            &self.ssl_url
        }
    }

    /// True when `candidate` names this site by URL (either scheme) or by name.
    pub fn matches(&self, candidate_url: &str, candidate_name: Option<&str>) -> bool {
        let trimmed = candidate_url.trim_end_matches('/');
        let same_url = |u: &str| !u.is_empty() && u.trim_end_matches('/') == trimmed;
        same_url(&self.url)
            || same_url(&self.ssl_url)
            || candidate_name.is_some_and(|n| !n.is_empty() && self.name == n)
    }
}

// ---------------------------------------------------------------------------
// CreateSite
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RepoSource {
    pub provider: String,
    pub repo: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BuildSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Body of `POST /sites`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateSite {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<RepoSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_settings: Option<BuildSettings>,
}

impl CreateSite {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repo: None,
            build_settings: None,
        }
    }

    /// Bind the site to a source repository. The build directory is sent both
    /// in `repo.dir` and `build_settings.dir`; the platform reads either
    /// depending on account age.
    pub fn with_repo(mut self, repo: RepoSource) -> Self {
        self.build_settings = repo
            .dir
            .clone()
            .map(|dir| BuildSettings { dir: Some(dir) });
        self.repo = Some(repo);
        self
    }
}

// ---------------------------------------------------------------------------
// Deploy / Build
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Deploy {
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub deploy_ssl_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Deploy {
    pub fn is_ready(&self) -> bool {
        self.state == "ready"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Build {
    pub id: String,
    #[serde(default)]
    pub deploy_id: Option<String>,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TriggerBuild {
    pub clear_cache: bool,
}
