//! Node configuration.
//!
//! Defaults, then an optional TOML file, then environment variables.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rime_core::scenario::SCENARIO_IDS;
use rime_orchestrator::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub orchestrator: OrchestratorConfig,
    pub lifecycle: LifecycleConfig,
    pub features: FeatureConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LifecycleConfig {
    pub settle_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct FeatureConfig {
    /// Serve canned scenario contexts instead of collected ones.
    pub mock: bool,
    pub mock_scenario: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2000,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            mock: false,
            mock_scenario: "coding".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Validation(format!("invalid server address `{}:{}`", self.host, self.port)))
    }
}

impl LifecycleConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl AppConfig {
    /// Load from `RIME_CONFIG` or the default file locations, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = read_env("RIME_CONFIG").map(PathBuf::from);
        Self::load_with(explicit.as_deref(), read_env)
    }

    /// Load with an explicit file path and a custom environment lookup.
    pub fn load_with(
        config_path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(config_path) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        }

        config.apply_env_overrides(lookup)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(orchestrator) = patch.orchestrator {
            if let Some(threshold) = orchestrator.confidence_threshold {
                self.orchestrator.confidence_threshold = threshold;
            }
            if let Some(max_providers) = orchestrator.max_providers {
                self.orchestrator.max_providers = max_providers;
            }
            if let Some(fallback) = orchestrator.fallback_confidence {
                self.orchestrator.fallback_confidence = fallback;
            }
            if let Some(timeout_ms) = orchestrator.provider_timeout_ms {
                self.orchestrator.provider_timeout_ms = timeout_ms;
            }
        }

        if let Some(lifecycle) = patch.lifecycle {
            if let Some(settle_delay_ms) = lifecycle.settle_delay_ms {
                self.lifecycle.settle_delay_ms = settle_delay_ms;
            }
        }

        if let Some(features) = patch.features {
            if let Some(mock) = features.mock {
                self.features.mock = mock;
            }
            if let Some(scenario) = features.mock_scenario {
                self.features.mock_scenario = scenario;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("RIME_HOST") {
            self.server.host = value;
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = parse("PORT", &value)?;
        }

        if let Some(value) = lookup("RIME_CONFIDENCE_THRESHOLD") {
            self.orchestrator.confidence_threshold = parse("RIME_CONFIDENCE_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("RIME_MAX_PROVIDERS") {
            self.orchestrator.max_providers = parse("RIME_MAX_PROVIDERS", &value)?;
        }
        if let Some(value) = lookup("RIME_PROVIDER_TIMEOUT_MS") {
            self.orchestrator.provider_timeout_ms = parse("RIME_PROVIDER_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = lookup("RIME_SETTLE_DELAY_MS") {
            self.lifecycle.settle_delay_ms = parse("RIME_SETTLE_DELAY_MS", &value)?;
        }

        if let Some(value) = lookup("ENABLE_MOCK") {
            self.features.mock = parse("ENABLE_MOCK", &value)?;
        }
        if let Some(value) = lookup("MOCK_SCENARIO") {
            self.features.mock_scenario = value;
        }

        if let Some(value) = lookup("RIME_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = lookup("RIME_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_orchestrator(&self.orchestrator)?;
        validate_features(&self.features)?;
        validate_logging(&self.logging)?;
        self.server.socket_addr()?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("rime.toml"), PathBuf::from("config/rime.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn validate_orchestrator(orchestrator: &OrchestratorConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&orchestrator.confidence_threshold) {
        return Err(ConfigError::Validation(
            "orchestrator.confidence_threshold must be within [0, 1]".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&orchestrator.fallback_confidence) {
        return Err(ConfigError::Validation(
            "orchestrator.fallback_confidence must be within [0, 1]".to_string(),
        ));
    }
    if orchestrator.max_providers == 0 {
        return Err(ConfigError::Validation(
            "orchestrator.max_providers must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_features(features: &FeatureConfig) -> Result<(), ConfigError> {
    if !SCENARIO_IDS.contains(&features.mock_scenario.as_str()) {
        return Err(ConfigError::Validation(format!(
            "features.mock_scenario must be one of {}",
            SCENARIO_IDS.join("|")
        )));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    orchestrator: Option<OrchestratorPatch>,
    lifecycle: Option<LifecyclePatch>,
    features: Option<FeaturesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct OrchestratorPatch {
    confidence_threshold: Option<f32>,
    max_providers: Option<usize>,
    fallback_confidence: Option<f32>,
    provider_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LifecyclePatch {
    settle_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FeaturesPatch {
    mock: Option<bool>,
    mock_scenario: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
