/// Configuration management for HPA Console
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tabs::TabManagerOptions;

/// Environment variable holding the API token
pub const TOKEN_ENV_VAR: &str = "HPA_CONSOLE_TOKEN";

const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Main console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Which backend performs cluster context switches
    #[serde(default)]
    pub backend: BackendKind,

    /// Console API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Cluster tab behaviour
    #[serde(default)]
    pub tabs: TabsConfig,

    /// kubectl backend configuration
    #[serde(default)]
    pub kubectl: KubectlConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The console's REST API
    #[default]
    Api,
    /// Local kubeconfig via kubectl
    Kubectl,
}

/// Console API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API (e.g., "http://localhost:8080/api/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token (can also be set via HPA_CONSOLE_TOKEN env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Cluster tab settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabsConfig {
    /// Quiet period before a context switch is sent
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Switch to the first tab's cluster as soon as it is created
    #[serde(default = "default_true")]
    pub auto_switch_first_tab: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KubectlConfig {
    /// Kubeconfig path; the ambient KUBECONFIG is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            auto_switch_first_tab: true,
        }
    }
}

impl TabsConfig {
    pub fn manager_options(&self) -> TabManagerOptions {
        TabManagerOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            auto_switch_first_tab: self.auto_switch_first_tab,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ConsoleConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: ConsoleConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tabs.debounce_ms > MAX_DEBOUNCE_MS {
            anyhow::bail!(
                "tabs.debounce_ms must be at most {} (got {})",
                MAX_DEBOUNCE_MS,
                self.tabs.debounce_ms
            );
        }

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than zero");
        }

        if url::Url::parse(&self.api.base_url).is_err() {
            anyhow::bail!("Invalid api.base_url: {}", self.api.base_url);
        }

        Ok(())
    }

    /// API token from config or environment, if any
    pub fn api_token(&self) -> Option<String> {
        self.api
            .token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .filter(|token| !token.is_empty())
    }

    /// Generate an example configuration file
    pub fn example() -> Self {
        Self {
            backend: BackendKind::Api,
            api: ApiConfig::default(),
            tabs: TabsConfig::default(),
            kubectl: KubectlConfig::default(),
        }
    }
}
