//! Process-wide settings for a publish run.
//!
//! Everything the protocol needs from the environment is read once here and
//! handed to the release client and replacer as a plain value.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_RELEASE_TAG: &str = "msys2-gcc-pkgs";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_UPLOAD_URL: &str = "https://uploads.github.com";
pub const DEFAULT_SERVER_URL: &str = "https://github.com";
pub const DEFAULT_STABILIZATION_DELAY_MS: u64 = 5_000;

#[derive(Debug, Deserialize)]
struct EnvironmentConfig {
    github_repository: String,
    github_token: String,
    github_run_number: u64,
    #[serde(default = "default_release_tag")]
    release_tag: String,
    #[serde(default = "default_api_url")]
    github_api_url: String,
    #[serde(default = "default_upload_url")]
    github_upload_url: String,
    #[serde(default = "default_server_url")]
    github_server_url: String,
    #[serde(default = "default_stabilization_delay_ms")]
    stabilization_delay_ms: u64,
}

fn default_release_tag() -> String {
    DEFAULT_RELEASE_TAG.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_upload_url() -> String {
    DEFAULT_UPLOAD_URL.to_string()
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_stabilization_delay_ms() -> u64 {
    DEFAULT_STABILIZATION_DELAY_MS
}

#[derive(Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// `owner/repo` of the repository holding the release.
    pub repository: String,
    pub token: String,
    /// CI run number written into the release notes.
    pub build_number: u64,
    pub tag: String,
    pub api_url: String,
    pub upload_url: String,
    /// Host serving the public download URLs.
    pub server_url: String,
    /// Pause between upload and the first rename.
    pub stabilization_delay: Duration,
}

impl fmt::Debug for ReleaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseConfig")
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .field("build_number", &self.build_number)
            .field("tag", &self.tag)
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .field("server_url", &self.server_url)
            .field("stabilization_delay", &self.stabilization_delay)
            .finish()
    }
}

impl ReleaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default())
    }

    /// Same as [`ReleaseConfig::from_env`] but reads `vars` instead of the
    /// process environment.
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::default().source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?;
        let cfg: EnvironmentConfig = settings.try_deserialize()?;
        Self::validate(cfg)
    }

    pub fn user_agent(&self) -> String {
        format!("{}-actions", self.repository)
    }

    fn validate(cfg: EnvironmentConfig) -> Result<Self, ConfigError> {
        let repository = cfg.github_repository.trim().to_string();
        match repository.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "GITHUB_REPOSITORY must look like owner/repo ({repository:?} given)"
                )))
            }
        }
        if cfg.github_token.trim().is_empty() {
            return Err(ConfigError::Message("GITHUB_TOKEN is empty".to_string()));
        }
        if cfg.release_tag.trim().is_empty() {
            return Err(ConfigError::Message("RELEASE_TAG is empty".to_string()));
        }

        Ok(Self {
            repository,
            token: cfg.github_token.trim().to_string(),
            build_number: cfg.github_run_number,
            tag: cfg.release_tag,
            api_url: cfg.github_api_url.trim_end_matches('/').to_string(),
            upload_url: cfg.github_upload_url.trim_end_matches('/').to_string(),
            server_url: cfg.github_server_url.trim_end_matches('/').to_string(),
            stabilization_delay: Duration::from_millis(cfg.stabilization_delay_ms),
        })
    }
}
