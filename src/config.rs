//! Configuration Module
//!
//! Host settings come from environment variables; optimizer policy (cache
//! regions, pattern overrides, monitoring rules) is loaded from JSON.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::{glob_match, Metric};
use crate::error::{OptimizerError, Result};

/// Host process configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Expired-entry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Optimization cycle interval in seconds
    pub optimize_interval: u64,
    /// Deadline for a single store call in milliseconds
    pub store_timeout_ms: u64,
    /// Optional path to an optimizer JSON config
    pub optimizer_config_path: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    /// - `OPTIMIZE_INTERVAL` - Optimization frequency in seconds (default: 60)
    /// - `STORE_TIMEOUT_MS` - Store call deadline in milliseconds (default: 500)
    /// - `OPTIMIZER_CONFIG` - Path to optimizer JSON config (default: built-in)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_env("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            optimize_interval: parse_env("OPTIMIZE_INTERVAL")
                .unwrap_or(defaults.optimize_interval),
            store_timeout_ms: parse_env("STORE_TIMEOUT_MS").unwrap_or(defaults.store_timeout_ms),
            optimizer_config_path: env::var("OPTIMIZER_CONFIG").ok().filter(|p| !p.is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 1,
            optimize_interval: 60,
            store_timeout_ms: 500,
            optimizer_config_path: None,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

// == Cache Config ==
/// Store-level replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    #[default]
    Lru,
    Lfu,
    Ttl,
}

/// Per-region cache policy. Replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    #[serde(default)]
    pub strategy: CacheStrategy,
    /// Capacity in bytes
    pub max_size: u64,
    /// Default TTL in seconds; 0 disables the default
    #[serde(default)]
    pub max_age: u64,
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(OptimizerError::ConfigInvalid(
                "maxSize must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Default TTL to apply on writes, if any.
    pub fn default_ttl(&self) -> Option<u64> {
        (self.max_age > 0).then_some(self.max_age)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: CacheStrategy::Lru,
            max_size: 100 * 1024 * 1024,
            max_age: 3600,
        }
    }
}

/// Key glob with a region-specific policy override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePattern {
    pub pattern: String,
    #[serde(flatten)]
    pub config: CacheConfig,
}

// == Region ==
/// A named key namespace with its own policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub name: String,
    /// Glob selecting the region's keys
    pub pattern: String,
    pub config: CacheConfig,
    /// Globs used as preload candidates when the hit rate is low
    pub preload_patterns: Vec<String>,
}

impl Region {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, config: CacheConfig) -> Self {
        let pattern = pattern.into();
        Self {
            name: name.into(),
            preload_patterns: vec![pattern.clone()],
            pattern,
            config,
        }
    }

    pub fn with_preload_patterns(mut self, patterns: Vec<String>) -> Self {
        self.preload_patterns = patterns;
        self
    }
}

// == Monitoring ==
/// Closed set of comparison operators for alert rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparison {
    #[default]
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
}

impl Comparison {
    /// True when `value` breaches `threshold` under this operator.
    pub fn breached(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Lt => value < threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Le => value <= threshold,
            Comparison::Eq => (value - threshold).abs() < f64::EPSILON,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
        }
    }
}

/// A threshold rule evaluated on every monitoring tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub metric: Metric,
    #[serde(default)]
    pub operator: Comparison,
    pub threshold: f64,
    /// Seconds a breach must persist before the rule triggers
    #[serde(default)]
    pub period: u64,
    /// Free-form label carried into logs
    #[serde(default = "default_action")]
    pub action: String,
}

fn default_action() -> String {
    "notify".to_string()
}

impl AlertRule {
    pub fn new(metric: Metric, operator: Comparison, threshold: f64) -> Self {
        Self {
            metric,
            operator,
            threshold,
            period: 0,
            action: default_action(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Tick interval in seconds
    #[serde(default = "default_monitor_interval")]
    pub interval: u64,
    /// Watched metrics; empty watches everything
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub alerts: Vec<AlertRule>,
}

fn default_monitor_interval() -> u64 {
    60
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_monitor_interval(),
            metrics: Vec::new(),
            alerts: Vec::new(),
        }
    }
}

impl MonitoringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.interval == 0 {
            return Err(OptimizerError::ConfigInvalid(
                "monitoring interval must be greater than zero".to_string(),
            ));
        }
        for rule in &self.alerts {
            if !self.metrics.is_empty() && !self.metrics.contains(&rule.metric) {
                return Err(OptimizerError::ConfigInvalid(format!(
                    "alert on '{}' is not in the watched metrics",
                    rule.metric
                )));
            }
            if !rule.threshold.is_finite() || rule.threshold < 0.0 {
                return Err(OptimizerError::ConfigInvalid(format!(
                    "alert threshold for '{}' must be a non-negative number",
                    rule.metric
                )));
            }
        }
        Ok(())
    }

    /// True if `metric` should be reported on ticks.
    pub fn watches(&self, metric: Metric) -> bool {
        self.metrics.is_empty() || self.metrics.contains(&metric)
    }
}

// == Optimizer Settings ==
/// Tunables for the optimization cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizerSettings {
    /// TTLs below this many seconds are considered too short
    pub ttl_floor: u64,
    /// Entries younger than this many seconds are protected from eviction
    pub eviction_min_age: u64,
    /// Deadline across a whole preload batch, in milliseconds
    pub preload_deadline_ms: Option<u64>,
    /// Upper bound on retained history samples
    pub history_capacity: usize,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            ttl_floor: 300,
            eviction_min_age: 300,
            preload_deadline_ms: None,
            history_capacity: 10_000,
        }
    }
}

// == Optimizer Config ==
/// Complete optimizer policy: default cache config, pattern overrides and monitoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub patterns: Vec<CachePattern>,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub settings: OptimizerSettings,
}

impl OptimizerConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| OptimizerError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OptimizerError::ConfigInvalid(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        for pattern in &self.patterns {
            if pattern.pattern.is_empty() {
                return Err(OptimizerError::ConfigInvalid(
                    "cache pattern must not be empty".to_string(),
                ));
            }
            pattern.config.validate()?;
        }
        self.monitoring.validate()?;
        if self.settings.history_capacity == 0 {
            return Err(OptimizerError::ConfigInvalid(
                "historyCapacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    // == Resolve ==
    /// Returns the policy that applies to `key`.
    ///
    /// Patterns are tried in configuration order and the first match wins;
    /// keys matching no pattern fall back to the default config.
    pub fn resolve(&self, key: &str) -> &CacheConfig {
        self.patterns
            .iter()
            .find(|p| glob_match(&p.pattern, key))
            .map(|p| &p.config)
            .unwrap_or(&self.cache)
    }

    /// The catch-all region covering every key.
    pub fn default_region(&self) -> Region {
        let preload = if self.patterns.is_empty() {
            vec!["*".to_string()]
        } else {
            self.patterns.iter().map(|p| p.pattern.clone()).collect()
        };
        Region::new("default", "*", self.cache.clone()).with_preload_patterns(preload)
    }
}
