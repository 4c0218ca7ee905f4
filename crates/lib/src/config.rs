//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.relay/config.json`) and environment.
//! Environment variables override the assistant settings from the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var naming the remote service URL.
pub const ENV_SERVICE_URL: &str = "SERVICE_URL";
/// Env var naming the basic-auth username.
pub const ENV_SERVICE_USERNAME: &str = "SERVICE_USERNAME";
/// Env var naming the basic-auth password.
pub const ENV_SERVICE_PASSWORD: &str = "SERVICE_PASSWORD";
/// Env var naming the API key. When set, username/password are ignored.
pub const ENV_SERVICE_APIKEY: &str = "SERVICE_APIKEY";
/// Env var pinning the workspace id; skips listing and creation.
pub const ENV_WORKSPACE_ID: &str = "WORKSPACE_ID";

/// Default API version date sent as `?version=` on every remote call.
pub const DEFAULT_API_VERSION: &str = "2018-07-10";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Remote assistant service settings.
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 3000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Remote assistant settings as written in the config file. Every field may be overridden by env.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    /// Service endpoint, e.g. `https://api.us-south.assistant.watson.cloud.ibm.com/instances/...`.
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// API key. Takes precedence over username/password.
    pub apikey: Option<String>,
    /// Pinned workspace id. Trusted as-is; never checked against the remote service.
    pub workspace_id: Option<String>,
    /// API version date (default 2018-07-10).
    pub version: Option<String>,
    /// Training definition used when a workspace has to be created. Defaults to the bundled one.
    pub training_file: Option<PathBuf>,
}

/// Assistant settings after applying env overrides. Blank values are treated as unset;
/// other values are kept exactly as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantSettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub apikey: Option<String>,
    pub workspace_id: Option<String>,
    pub version: String,
    pub training_file: Option<PathBuf>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Resolve assistant settings: env vars override config.
pub fn resolve_assistant_settings(config: &Config) -> AssistantSettings {
    resolve_assistant_settings_with(config, |key| std::env::var(key).ok())
}

/// Same as [`resolve_assistant_settings`] with an explicit variable lookup (used by tests).
pub fn resolve_assistant_settings_with<F>(config: &Config, lookup: F) -> AssistantSettings
where
    F: Fn(&str) -> Option<String>,
{
    let a = &config.assistant;
    let pick = |key: &str, file: &Option<String>| {
        non_blank(lookup(key)).or_else(|| non_blank(file.clone()))
    };
    AssistantSettings {
        url: pick(ENV_SERVICE_URL, &a.url),
        username: pick(ENV_SERVICE_USERNAME, &a.username),
        password: pick(ENV_SERVICE_PASSWORD, &a.password),
        apikey: pick(ENV_SERVICE_APIKEY, &a.apikey),
        workspace_id: pick(ENV_WORKSPACE_ID, &a.workspace_id),
        version: non_blank(a.version.clone()).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        training_file: a.training_file.clone(),
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RELAY_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".relay").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the default path (or RELAY_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Resolve the training file override: relative paths are resolved against the config file's parent.
pub fn resolve_training_file(config: &Config, config_path: &Path) -> Option<PathBuf> {
    let config_parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match &config.assistant.training_file {
        Some(f) if !f.as_os_str().is_empty() => {
            if f.is_absolute() {
                Some(f.clone())
            } else {
                Some(config_parent.join(f))
            }
        }
        _ => None,
    }
}
