//! Runtime configuration loaded from JSON

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_amount() -> f64 {
    300.0
}

fn default_step_amount() -> f64 {
    100.0
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_voice_auto_interval_ms() -> u64 {
    2000
}

fn default_max_steps() -> u32 {
    20
}

fn default_boundary_check_delay_ms() -> u64 {
    100
}

fn default_history_capacity() -> usize {
    50
}

fn default_smart_top_threshold() -> f64 {
    0.1
}

fn default_smart_bottom_threshold() -> f64 {
    0.9
}

fn default_voice_profile() -> String {
    "jarvis".to_string()
}

/// Scroll engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pixels moved by a single-shot scroll without an explicit amount
    #[serde(default = "default_amount")]
    pub default_amount: f64,
    /// Pixels moved by each continuous-scroll step without an explicit amount
    #[serde(default = "default_step_amount")]
    pub step_amount: f64,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Interval used by "auto scroll" phrases without a speed qualifier
    #[serde(default = "default_voice_auto_interval_ms")]
    pub voice_auto_interval_ms: u64,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Delay before re-sampling position after a continuous step.
    ///
    /// Smooth scroll animations longer than this can make a moving page look
    /// stalled for one sample.
    #[serde(default = "default_boundary_check_delay_ms")]
    pub boundary_check_delay_ms: u64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Fraction of viewport height an element top must pass to count as "next"
    #[serde(default = "default_smart_top_threshold")]
    pub smart_top_threshold: f64,
    /// Fraction of viewport height an element bottom must stay above to count as "previous"
    #[serde(default = "default_smart_bottom_threshold")]
    pub smart_bottom_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_amount: default_amount(),
            step_amount: default_step_amount(),
            interval_ms: default_interval_ms(),
            voice_auto_interval_ms: default_voice_auto_interval_ms(),
            max_steps: default_max_steps(),
            boundary_check_delay_ms: default_boundary_check_delay_ms(),
            history_capacity: default_history_capacity(),
            smart_top_threshold: default_smart_top_threshold(),
            smart_bottom_threshold: default_smart_bottom_threshold(),
        }
    }
}

impl EngineConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn boundary_check_delay(&self) -> Duration {
        Duration::from_millis(self.boundary_check_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 || self.voice_auto_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "interval_ms",
                reason: "intervals must be greater than zero".to_string(),
            });
        }
        if self.max_steps == 0 {
            return Err(ConfigError::Invalid {
                field: "max_steps",
                reason: "continuous scrolling needs at least one step".to_string(),
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "history_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        for (field, value) in [
            ("smart_top_threshold", self.smart_top_threshold),
            ("smart_bottom_threshold", self.smart_bottom_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} is outside 0.0..=1.0", value),
                });
            }
        }
        if self.default_amount <= 0.0 || self.step_amount <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "default_amount",
                reason: "scroll amounts must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Top-level assistant configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Voice persona passed through to speech output
    #[serde(default = "default_voice_profile")]
    pub voice_profile: String,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            voice_profile: default_voice_profile(),
            engine: EngineConfig::default(),
        }
    }
}

impl AssistantConfig {
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: AssistantConfig = serde_json::from_str(content)?;
        config.engine.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Load from `path`, using defaults when the file is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "using default assistant config");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AssistantConfig::from_json_str(r#"{"engine": {"max_steps": 5}}"#).unwrap();
        assert_eq!(config.voice_profile, "jarvis");
        assert_eq!(config.engine.max_steps, 5);
        assert_eq!(config.engine.interval_ms, 1000);
        assert_eq!(config.engine.history_capacity, 50);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AssistantConfig::from_json_str(r#"{"engine": {"max_steps": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_steps", .. }));

        let err =
            AssistantConfig::from_json_str(r#"{"engine": {"smart_top_threshold": 1.5}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"voice_profile": "friday"}}"#).unwrap();
        let config = AssistantConfig::load(file.path()).unwrap();
        assert_eq!(config.voice_profile, "friday");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = AssistantConfig::load_or_default("/nonexistent/jarvis.json");
        assert_eq!(config, AssistantConfig::default());
    }
}
