use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::JiraPromptError;

/// Top-level jiraprompt configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub jira: JiraConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// OpenAI-compatible completion endpoint.
///
/// The API key and model are user settings kept in the store, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Credentials and limits for talking to Jira.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Account email for basic auth (Jira Cloud API tokens).
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub api_token: String,
    /// Bearer token (Jira Data Center personal access tokens).
    /// Takes precedence over email + api_token when set.
    #[serde(default)]
    pub personal_token: String,
    /// Hosts (`host` or `host:port`) allowed to receive credentials.
    /// Empty means any https host.
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            api_token: String::new(),
            personal_token: String::new(),
            hosts: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl JiraConfig {
    /// The credentials to attach to Jira requests, if any are configured.
    pub fn credentials(&self) -> JiraCredentials {
        if !self.personal_token.is_empty() {
            JiraCredentials::Bearer(self.personal_token.clone())
        } else if !self.email.is_empty() && !self.api_token.is_empty() {
            JiraCredentials::Basic {
                user: self.email.clone(),
                token: self.api_token.clone(),
            }
        } else {
            JiraCredentials::Anonymous
        }
    }
}

/// How a request authenticates against Jira.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JiraCredentials {
    Anonymous,
    Basic { user: String, token: String },
    Bearer(String),
}

// --- Default value functions ---

fn default_log_level() -> String {
    "warn".to_string()
}
fn default_db_path() -> String {
    "~/.jiraprompt/store.db".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file, falling back to defaults when the file is absent.
///
/// Runs before logging is set up, so the caller reports the outcome.
pub fn load(path: &str) -> Result<Config, JiraPromptError> {
    let path = Path::new(path);
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| JiraPromptError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| JiraPromptError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
