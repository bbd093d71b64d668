//! Client configuration and backend factory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use athena_core::layout::Breakpoints;
use athena_core::traits::QuizBackend;

use crate::http::{HttpBackend, DEFAULT_TIMEOUT_SECS};

/// Where the client is running, which decides the default backend URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
    Docker,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown environment '{0}' (expected production, development or docker)")]
pub struct UnknownEnvironment(String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            "docker" => Ok(Environment::Docker),
            _ => Err(UnknownEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Docker => "docker",
        };
        f.write_str(name)
    }
}

/// Picks the backend base URL.
///
/// An explicit URL always wins. Otherwise docker and development use their
/// fixed hosts, and production serves the API under `/api` on the origin the
/// client was loaded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendUrlResolver {
    pub explicit: Option<String>,
    pub environment: Environment,
    pub origin: Option<String>,
}

pub const DOCKER_BACKEND_URL: &str = "http://backend:5000/api";
pub const DEVELOPMENT_BACKEND_URL: &str = "http://localhost:5000/api";
const DEFAULT_ORIGIN: &str = "http://localhost";

impl BackendUrlResolver {
    pub fn resolve(&self) -> String {
        if let Some(url) = self.explicit.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.trim().trim_end_matches('/').to_string();
        }
        match self.environment {
            Environment::Docker => DOCKER_BACKEND_URL.to_string(),
            Environment::Development => DEVELOPMENT_BACKEND_URL.to_string(),
            Environment::Production => {
                let origin = self
                    .origin
                    .as_deref()
                    .filter(|o| !o.trim().is_empty())
                    .unwrap_or(DEFAULT_ORIGIN);
                format!("{}/api", origin.trim().trim_end_matches('/'))
            }
        }
    }
}

/// Top-level athena configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthenaConfig {
    /// Full backend URL; overrides `environment` and `origin`.
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub environment: Environment,
    /// Origin the production API is served from.
    #[serde(default)]
    pub origin: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// JSON file holding local UI state (checked sets, notes draft).
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default)]
    pub breakpoints: Breakpoints,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./.athena/state.json")
}

impl Default for AthenaConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            environment: Environment::default(),
            origin: None,
            timeout_secs: default_timeout(),
            store_path: default_store_path(),
            breakpoints: Breakpoints::default(),
        }
    }
}

impl AthenaConfig {
    pub fn resolver(&self) -> BackendUrlResolver {
        BackendUrlResolver {
            explicit: self.backend_url.clone(),
            environment: self.environment,
            origin: self.origin.clone(),
        }
    }

    pub fn backend_url(&self) -> String {
        self.resolver().resolve()
    }

    /// Apply `ATHENA_BACKEND_URL` and `ATHENA_ENV` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ATHENA_BACKEND_URL") {
            self.backend_url = Some(url);
        }
        if let Some(env) = lookup("ATHENA_ENV") {
            self.environment = env.parse().context("invalid ATHENA_ENV")?;
        }
        Ok(())
    }

    fn resolve_env_refs<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.backend_url = self
            .backend_url
            .as_deref()
            .map(|u| resolve_env_vars_with(u, &lookup));
        self.origin = self
            .origin
            .as_deref()
            .map(|o| resolve_env_vars_with(o, &lookup));
    }
}

/// Starter file written by `athena init`.
pub const STARTER_CONFIG: &str = r#"# athena configuration

# Full backend URL. When unset it is derived from `environment`:
#   production  -> <origin>/api
#   development -> http://localhost:5000/api
#   docker      -> http://backend:5000/api
# backend_url = "${ATHENA_BACKEND_URL}"

environment = "production"
origin = "http://localhost"
timeout_secs = 30
store_path = "./.athena/state.json"

[breakpoints]
md = 48
"#;

/// Resolve `${VAR_NAME}` references from the process environment.
pub fn resolve_env_vars(s: &str) -> String {
    resolve_env_vars_with(s, |name| std::env::var(name).ok())
}

/// Resolve `${VAR_NAME}` references using `lookup`. Unknown variables become
/// empty; an unterminated reference is left as is.
pub fn resolve_env_vars_with<F>(s: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = lookup(&result[start + 2..start + end]).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        from = start + value.len();
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `athena.toml` in the current directory
/// 2. `~/.config/athena/config.toml`
///
/// Environment variable overrides: `ATHENA_BACKEND_URL`, `ATHENA_ENV`.
pub fn load_config() -> Result<AthenaConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AthenaConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("athena.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AthenaConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AthenaConfig::default(),
    };

    config.apply_overrides(|name| std::env::var(name).ok())?;
    config.resolve_env_refs(|name| std::env::var(name).ok());

    debug!(
        path = ?config_path,
        backend_url = %config.backend_url(),
        "configuration loaded"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("athena"))
}

/// Create the HTTP backend described by `config`.
pub fn create_backend(config: &AthenaConfig) -> Result<Arc<dyn QuizBackend>> {
    let url = config.backend_url();
    let backend = HttpBackend::with_timeout(&url, config.timeout_secs)
        .with_context(|| format!("cannot use backend at {url}"))?;
    Ok(Arc::new(backend))
}
