//! Planwise configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main Planwise configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Planner service tier
    pub service: ServiceConfig,

    /// Ephemeral planner process tier
    pub process: ProcessConfig,

    /// Dispatcher deadline budget and diagnostics
    pub dispatch: DispatchConfig,

    /// Environment overrides handed to the planner process
    #[serde(rename = "planner-env")]
    pub planner_env: PlannerEnvConfig,

    /// HTTP API server
    pub server: ServerConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.budget_ms <= self.dispatch.safety_margin_ms {
            return Err(eyre::eyre!(
                "dispatch budget-ms ({}) must exceed safety-margin-ms ({})",
                self.dispatch.budget_ms,
                self.dispatch.safety_margin_ms
            ));
        }
        if self.process.max_concurrent == 0 {
            return Err(eyre::eyre!("process max-concurrent must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .planwise.yml
        let local_config = PathBuf::from(".planwise.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/planwise/planwise.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("planwise").join("planwise.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, for use before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Planner service tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the planner service
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Per-call request timeout in milliseconds (clipped to remaining budget)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Minimum remaining budget required to attempt this tier
    #[serde(rename = "min-viable-ms")]
    pub min_viable_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: 12_000,
            min_viable_ms: 500,
        }
    }
}

/// Ephemeral planner process tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Interpreter to launch the planner with; probed from PATH when unset
    pub interpreter: Option<String>,

    /// Module entry point passed via `-m`
    pub module: String,

    /// Working directory for the planner process
    pub workdir: Option<PathBuf>,

    /// Minimum remaining budget required to attempt this tier
    #[serde(rename = "min-viable-ms")]
    pub min_viable_ms: u64,

    /// Cap on concurrently live planner processes across requests
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Rolling cap on captured stdout bytes
    #[serde(rename = "stdout-cap-bytes")]
    pub stdout_cap_bytes: usize,

    /// Rolling cap on the captured stderr tail in bytes
    #[serde(rename = "stderr-tail-bytes")]
    pub stderr_tail_bytes: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            module: "planner.main".to_string(),
            workdir: None,
            min_viable_ms: 1_500,
            max_concurrent: 4,
            stdout_cap_bytes: 1_048_576,
            stderr_tail_bytes: 8_192,
        }
    }
}

/// Dispatcher deadline and diagnostics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Overall wall-clock budget per request in milliseconds
    #[serde(rename = "budget-ms")]
    pub budget_ms: u64,

    /// Budget slice reserved for later tiers when computing per-tier timeouts
    #[serde(rename = "safety-margin-ms")]
    pub safety_margin_ms: u64,

    /// Maximum characters of diagnostic kept in the fallback trailer
    #[serde(rename = "diagnostic-max-chars")]
    pub diagnostic_max_chars: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            budget_ms: 30_000,
            safety_margin_ms: 300,
            diagnostic_max_chars: 600,
        }
    }
}

/// Environment overrides handed to the planner process.
///
/// These are dispatcher-owned knobs layered on top of the inherited
/// environment; they always win over inherited values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerEnvConfig {
    /// Planner workflow mode selector
    pub mode: String,

    /// Cap on search results per planner sub-query
    #[serde(rename = "max-results")]
    pub max_results: u32,

    /// Planner-side per-call timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u32,

    /// Trim planner work for faster, rougher answers
    #[serde(rename = "fast-mode")]
    pub fast_mode: bool,

    /// Search backend selector
    #[serde(rename = "search-provider")]
    pub search_provider: String,

    /// Text encoding forced on the planner's stdio
    pub encoding: String,
}

impl Default for PlannerEnvConfig {
    fn default() -> Self {
        Self {
            mode: "full".to_string(),
            max_results: 5,
            request_timeout_secs: 12,
            fast_mode: false,
            search_provider: "hybrid".to_string(),
            encoding: "utf-8".to_string(),
        }
    }
}

impl PlannerEnvConfig {
    /// The override pairs applied to the child environment. A per-request
    /// fast-mode override, when present, wins over the configured value.
    pub fn overrides(&self, fast_mode: Option<bool>) -> Vec<(String, String)> {
        let fast = fast_mode.unwrap_or(self.fast_mode);
        vec![
            ("PLANNER_MODE".to_string(), self.mode.clone()),
            ("MAX_RESULTS".to_string(), self.max_results.to_string()),
            ("REQUEST_TIMEOUT".to_string(), self.request_timeout_secs.to_string()),
            ("PYTHONIOENCODING".to_string(), self.encoding.clone()),
            ("FAST_MODE".to_string(), if fast { "1" } else { "0" }.to_string()),
            ("SEARCH_PROVIDER".to_string(), self.search_provider.clone()),
        ]
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for `pw serve`
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}
