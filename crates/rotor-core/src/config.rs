use crate::error::{Result, RotorError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "rotor.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

// ---------------------------------------------------------------------------
// PlatformConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Never written back out; supply it through the environment.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

fn default_api_base() -> String {
    hosting_api::DEFAULT_API_BASE.to_string()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SourceConfig
// ---------------------------------------------------------------------------

/// Repository every new site is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_provider() -> String {
    "github".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            repo: None,
            branch: default_branch(),
            dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RotationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    #[serde(default = "default_site_prefix")]
    pub site_prefix: String,
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u32,
    #[serde(default = "default_true")]
    pub trigger_build: bool,
    #[serde(default = "default_true")]
    pub wait_for_deploy: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_deploy_timeout_secs")]
    pub deploy_timeout_secs: u64,
}

fn default_site_prefix() -> String {
    "site-rotation".to_string()
}

fn default_interval_hours() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_deploy_timeout_secs() -> u64 {
    300
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            site_prefix: default_site_prefix(),
            interval_hours: default_interval_hours(),
            trigger_build: true,
            wait_for_deploy: true,
            poll_interval_ms: default_poll_interval_ms(),
            deploy_timeout_secs: default_deploy_timeout_secs(),
        }
    }
}

impl RotationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_hours) * 3600)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deploy_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BackendConfig {
    Memory,
    File {
        path: PathBuf,
    },
    Blob {
        url: String,
        #[serde(default, skip_serializing)]
        token: Option<String>,
    },
    Document {
        url: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_primary_backend")]
    pub primary: BackendConfig,
    #[serde(default = "default_fallback_backend")]
    pub fallback: Option<BackendConfig>,
}

fn default_primary_backend() -> BackendConfig {
    BackendConfig::File {
        path: PathBuf::from(".rotor/state.json"),
    }
}

fn default_fallback_backend() -> Option<BackendConfig> {
    Some(BackendConfig::Memory)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_backend(),
            fallback: default_fallback_backend(),
        }
    }
}

// ---------------------------------------------------------------------------
// RedirectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Where to send visitors when no site is recorded. Unset means serve
    /// local content instead.
    #[serde(default)]
    pub fallback_url: Option<String>,
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

fn default_excluded_prefixes() -> Vec<String> {
    [
        "/admin.html",
        "/api/",
        "/.netlify/",
        "/.rotor/",
        "/favicon.ico",
        "/_next/",
        "/static/",
        "/assets/",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            fallback_url: None,
            excluded_prefixes: default_excluded_prefixes(),
            public_dir: default_public_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL triggers use to reach the rotate endpoint.
    #[serde(default)]
    pub url: Option<String>,
}

fn default_port() -> u16 {
    8888
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            url: None,
        }
    }
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.port))
    }
}

// ---------------------------------------------------------------------------
// InitialState
// ---------------------------------------------------------------------------

/// Values reported while the store is still empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitialState {
    #[serde(default)]
    pub current_site_url: Option<String>,
    #[serde(default)]
    pub current_site_id: Option<String>,
    #[serde(default)]
    pub last_rotation: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub redirect: RedirectConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub initial: InitialState,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load the effective configuration: the explicit file if given, else
    /// `rotor.yaml` in the working directory if present, else defaults; then
    /// process environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut cfg = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Overlay environment variables. `lookup` is `std::env::var` in
    /// production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        if let Some(v) = get(&["ROTOR_ACCESS_TOKEN", "NETLIFY_ACCESS_TOKEN"]) {
            self.platform.access_token = Some(v);
        }
        if let Some(v) = get(&["ROTOR_API_BASE"]) {
            self.platform.api_base = v;
        }
        if let Some(v) = get(&["ROTOR_SOURCE_REPO", "GITHUB_REPO"]) {
            self.source.repo = Some(v);
        }
        if let Some(v) = get(&["ROTOR_SOURCE_BRANCH", "GITHUB_BRANCH"]) {
            self.source.branch = v;
        }
        if let Some(v) = get(&["ROTOR_SOURCE_DIR"]) {
            self.source.dir = Some(v);
        }
        if let Some(v) = get(&["ROTOR_FALLBACK_URL"]) {
            self.redirect.fallback_url = Some(v);
        }
        if let Some(env) = get(&["ROTOR_ENV"]).and_then(|v| Environment::parse(&v)) {
            self.environment = env;
        }
        if let Some(v) = get(&["CURRENT_SITE_URL"]) {
            self.initial.current_site_url = Some(v);
        }
        if let Some(v) = get(&["CURRENT_SITE_ID"]) {
            self.initial.current_site_id = Some(v);
        }
        if let Some(v) = get(&["LAST_ROTATION"]) {
            self.initial.last_rotation = Some(v);
        }
    }

    /// The platform token, or a configuration error naming the variable.
    pub fn require_token(&self) -> Result<&str> {
        self.platform
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                RotorError::Configuration("ROTOR_ACCESS_TOKEN is not set".to_string())
            })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.require_token().is_err() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "no platform access token: rotations will fail".to_string(),
            });
        }

        if self.rotation.interval_hours == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "rotation.interval_hours must be at least 1".to_string(),
            });
        }

        if self.rotation.wait_for_deploy
            && self.rotation.poll_interval() >= self.rotation.deploy_timeout()
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "rotation.poll_interval_ms={} is not shorter than deploy_timeout_secs={}",
                    self.rotation.poll_interval_ms, self.rotation.deploy_timeout_secs
                ),
            });
        }

        if self.source.repo.is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "source.repo is not set: new sites are created without a repository"
                    .to_string(),
            });
        }

        if let Some(url) = &self.redirect.fallback_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("redirect.fallback_url '{url}' is not an http(s) URL"),
                });
            }
        }

        if matches!(self.store.primary, BackendConfig::Document { .. }) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "store.primary is a read-only document: rotations only persist to the fallback"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_rotation_cadence() {
        let cfg = Config::default();
        assert_eq!(cfg.rotation.interval(), Duration::from_secs(4 * 3600));
        assert_eq!(cfg.rotation.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.rotation.deploy_timeout(), Duration::from_secs(300));
        assert_eq!(cfg.platform.api_base, hosting_api::DEFAULT_API_BASE);
        assert_eq!(cfg.store.fallback, Some(BackendConfig::Memory));
        assert!(cfg.redirect.fallback_url.is_none());
    }

    #[test]
    fn yaml_parses_tagged_backends() {
        let yaml = r#"
store:
  primary:
    backend: blob
    url: https://blobs.example/rotation
    token: secret
  fallback:
    backend: file
    path: /tmp/state.json
rotation:
  interval_hours: 6
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            cfg.store.primary,
            BackendConfig::Blob {
                url: "https://blobs.example/rotation".into(),
                token: Some("secret".into()),
            }
        );
        assert_eq!(
            cfg.store.fallback,
            Some(BackendConfig::File {
                path: PathBuf::from("/tmp/state.json")
            })
        );
        assert_eq!(cfg.rotation.interval_hours, 6);
        assert_eq!(cfg.rotation.site_prefix, "site-rotation");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        let vars = env(&[
            ("NETLIFY_ACCESS_TOKEN", "legacy"),
            ("ROTOR_ACCESS_TOKEN", "tok"),
            ("GITHUB_REPO", "acme/site"),
            ("ROTOR_SOURCE_BRANCH", "release"),
            ("ROTOR_ENV", "development"),
            ("CURRENT_SITE_URL", "https://seed.example"),
        ]);
        cfg.apply_env(|k| vars.get(k).cloned());

        assert_eq!(cfg.require_token().unwrap(), "tok");
        assert_eq!(cfg.source.repo.as_deref(), Some("acme/site"));
        assert_eq!(cfg.source.branch, "release");
        assert!(cfg.environment.is_development());
        assert_eq!(
            cfg.initial.current_site_url.as_deref(),
            Some("https://seed.example")
        );
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = Config::default();
        let vars = env(&[("ROTOR_ACCESS_TOKEN", "  "), ("ROTOR_SOURCE_BRANCH", "")]);
        cfg.apply_env(|k| vars.get(k).cloned());
        assert!(cfg.platform.access_token.is_none());
        assert_eq!(cfg.source.branch, "main");
    }

    #[test]
    fn missing_token_is_configuration_error() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.require_token(),
            Err(RotorError::Configuration(_))
        ));
    }

    #[test]
    fn token_is_not_serialized() {
        let mut cfg = Config::default();
        cfg.platform.access_token = Some("secret".into());
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(!yaml.contains("secret"));
    }

    #[test]
    fn validate_flags_missing_token_as_error() {
        let cfg = Config::default();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("token")));
    }

    #[test]
    fn validate_clean_config_has_no_errors() {
        let mut cfg = Config::default();
        cfg.platform.access_token = Some("tok".into());
        cfg.source.repo = Some("acme/site".into());
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_poll_longer_than_timeout() {
        let mut cfg = Config::default();
        cfg.platform.access_token = Some("tok".into());
        cfg.source.repo = Some("acme/site".into());
        cfg.rotation.poll_interval_ms = 600_000;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
    }

    #[test]
    fn environment_parse() {
        assert_eq!(Environment::parse("DEV"), Some(Environment::Development));
        assert_eq!(Environment::parse("prod"), Some(Environment::Production));
        assert_eq!(Environment::parse("staging"), None);
    }
}
