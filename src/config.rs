//! Node configuration
//!
//! Plain serde structs with defaults. The binary fills them from CLI flags or a
//! JSON file; library users can build them directly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Conventional SWIM suspect period.
pub const DEFAULT_SUSPICION_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspicionConfig {
    /// How long a suspect may stay unrefuted before it is declared faulty.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for SuspicionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SUSPICION_TIMEOUT,
        }
    }
}

impl SuspicionConfig {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.timeout.is_zero(), "suspicion timeout must be non-zero");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Address this node is known by in the cluster, e.g. `10.0.0.1:3000`.
    pub local_address: String,
    pub suspicion: SuspicionConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            local_address: "127.0.0.1:3000".to_string(),
            suspicion: SuspicionConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Reads a JSON config file; missing fields fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: NodeConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.local_address.trim().is_empty() {
            anyhow::bail!("local address must not be empty");
        }
        self.suspicion.validate()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.suspicion.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NodeConfig =
            serde_json::from_str(r#"{"local_address": "10.0.0.9:3000"}"#).unwrap();

        assert_eq!(config.local_address, "10.0.0.9:3000");
        assert_eq!(config.suspicion, SuspicionConfig::default());
    }

    #[test]
    fn test_timeout_is_read_in_millis() {
        let config: NodeConfig =
            serde_json::from_str(r#"{"suspicion": {"timeout_ms": 250}}"#).unwrap();

        assert_eq!(config.suspicion.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = NodeConfig {
            suspicion: SuspicionConfig {
                timeout: Duration::ZERO,
            },
            ..NodeConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("non-zero"));
    }

    #[test]
    fn test_empty_local_address_rejected() {
        let config = NodeConfig {
            local_address: "  ".to_string(),
            ..NodeConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file_names_path() {
        let err = NodeConfig::from_json_file("/nonexistent/suspicion.json").unwrap_err();

        assert!(err.to_string().contains("failed to read config /nonexistent/suspicion.json"));
    }
}
