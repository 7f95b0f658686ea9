//! Runner configuration.
//!
//! Supports loading configuration from:
//! 1. A YAML file
//! 2. Environment variables (with `QEXEC_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};

/// Environment variable naming the backend.
pub const ENV_BACKEND: &str = "QEXEC_BACKEND";
/// Environment variable for the default shot count.
pub const ENV_DEFAULT_SHOTS: &str = "QEXEC_DEFAULT_SHOTS";
/// Environment variable selecting per-shot memory output.
pub const ENV_MEMORY: &str = "QEXEC_MEMORY";
/// Environment variable capping the backend qubit count.
pub const ENV_MAX_QUBITS: &str = "QEXEC_MAX_QUBITS";

/// Runner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Registry name of the backend to create.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Shots used when a sampling circuit names no shot count.
    #[serde(default = "default_shots")]
    pub default_shots: u32,

    /// Ask the backend for one outcome per shot instead of a histogram.
    #[serde(default)]
    pub memory: bool,

    /// Qubit limit handed to the backend factory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_qubits: Option<u32>,
}

fn default_backend() -> String {
    "simulator".to_string()
}

fn default_shots() -> u32 {
    100
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            default_shots: default_shots(),
            memory: false,
            max_qubits: None,
        }
    }
}

impl RunnerConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(contents: &str) -> RunnerResult<Self> {
        let config: RunnerConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| RunnerError::Configuration(format!("parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> RunnerResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RunnerError::Configuration(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> RunnerResult<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| RunnerError::Configuration(format!("serialize error: {e}")))
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> RunnerResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Only variables the lookup returns override the current values.
    pub fn merge_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> RunnerResult<Self> {
        if let Some(v) = lookup(ENV_BACKEND) {
            self.backend = v;
        }
        if let Some(v) = lookup(ENV_DEFAULT_SHOTS) {
            self.default_shots = parse_var(ENV_DEFAULT_SHOTS, &v)?;
        }
        if let Some(v) = lookup(ENV_MEMORY) {
            self.memory = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => {
                    return Err(RunnerError::Configuration(format!(
                        "{ENV_MEMORY}: expected a boolean, got '{other}'"
                    )));
                }
            };
        }
        if let Some(v) = lookup(ENV_MAX_QUBITS) {
            self.max_qubits = Some(parse_var(ENV_MAX_QUBITS, &v)?);
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> RunnerResult<()> {
        if self.backend.trim().is_empty() {
            return Err(RunnerError::Configuration("backend name is empty".into()));
        }
        if self.default_shots == 0 {
            return Err(RunnerError::Configuration(
                "default_shots must be at least 1".into(),
            ));
        }
        if self.max_qubits == Some(0) {
            return Err(RunnerError::Configuration(
                "max_qubits must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var(key: &str, value: &str) -> RunnerResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| RunnerError::Configuration(format!("{key}: expected an integer, got '{value}'")))
}
