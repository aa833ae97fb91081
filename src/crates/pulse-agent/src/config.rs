//! Agent configuration.
//!
//! Settings come from three places, lowest precedence first: built-in
//! defaults, a YAML/JSON file via [`AgentConfig::load`], and environment
//! variables via [`AgentConfig::apply_env`].
//!
//! ```yaml
//! mode: react
//! top_k: 50
//! max_iterations: 10
//! max_execution_time_secs: 120
//! ```

use crate::error::{AgentError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TOP_K: usize = 100;
pub const DEFAULT_MAX_ITERATIONS: usize = 15;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// How the agent talks to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AgentMode {
    /// Text loop: Thought / Action / Action Input / Observation.
    React,
    /// Structured function calling.
    #[default]
    ToolCalling,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::React => "react",
            AgentMode::ToolCalling => "tool-calling",
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "react" | "zero-shot-react-description" => Ok(AgentMode::React),
            "tool-calling" | "openai-tools" => Ok(AgentMode::ToolCalling),
            other => Err(AgentError::Config(format!(
                "Unsupported agent mode '{}', expected 'react' or 'tool-calling'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for AgentMode {
    type Error = AgentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AgentMode> for String {
    fn from(mode: AgentMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Tunables for building and running an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub mode: AgentMode,

    /// Result cap suggested to the model as `page_size`.
    pub top_k: usize,

    /// `None` means unbounded.
    pub max_iterations: Option<usize>,

    pub max_execution_time_secs: Option<u64>,

    /// Sampling temperature for every model call.
    pub temperature: f32,

    /// Log each step at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: AgentMode::default(),
            top_k: DEFAULT_TOP_K,
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            max_execution_time_secs: None,
            temperature: DEFAULT_TEMPERATURE,
            verbose: false,
        }
    }
}

impl AgentConfig {
    /// Defaults overridden by `PULSE_AGENT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `PULSE_AGENT_MODE`, `PULSE_AGENT_TOP_K`,
    /// `PULSE_AGENT_MAX_ITERATIONS` and `PULSE_AGENT_MAX_EXECUTION_TIME`.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(mode) = env_var("PULSE_AGENT_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(top_k) = env_parse("PULSE_AGENT_TOP_K")? {
            self.top_k = top_k;
        }
        if let Some(raw) = env_var("PULSE_AGENT_MAX_ITERATIONS") {
            self.max_iterations = parse_optional_limit("PULSE_AGENT_MAX_ITERATIONS", &raw)?;
        }
        if let Some(raw) = env_var("PULSE_AGENT_MAX_EXECUTION_TIME") {
            self.max_execution_time_secs =
                parse_optional_limit("PULSE_AGENT_MAX_EXECUTION_TIME", &raw)?;
        }
        Ok(())
    }

    /// Load from a file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = load_config_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(AgentError::Config("top_k must be at least 1".to_string()));
        }
        if self.max_execution_time_secs == Some(0) {
            return Err(AgentError::Config(
                "max_execution_time_secs must be positive when set".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    pub fn max_execution_time(&self) -> Option<Duration> {
        self.max_execution_time_secs.map(Duration::from_secs)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: fmt::Display,
{
    env_var(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| {
                AgentError::Config(format!(
                    "Failed to parse environment variable '{}': {}",
                    key, e
                ))
            })
        })
        .transpose()
}

/// `none`/`unbounded` disable a limit.
fn parse_optional_limit<T: FromStr>(key: &str, raw: &str) -> Result<Option<T>>
where
    T::Err: fmt::Display,
{
    match raw.trim().to_ascii_lowercase().as_str() {
        "none" | "unbounded" => Ok(None),
        value => value.parse::<T>().map(Some).map_err(|e| {
            AgentError::Config(format!("Failed to parse '{}' for {}: {}", raw, key, e))
        }),
    }
}

fn load_config_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| {
            AgentError::Config(format!("Unable to determine file extension for {:?}", path))
        })?;

    let content = std::fs::read_to_string(path)?;
    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| {
            AgentError::Config(format!("Failed to parse YAML config from {:?}: {}", path, e))
        }),
        "json" => serde_json::from_str(&content).map_err(|e| {
            AgentError::Config(format!("Failed to parse JSON config from {:?}: {}", path, e))
        }),
        _ => Err(AgentError::Config(format!(
            "Unsupported config file extension: {}",
            extension
        ))),
    }
}
