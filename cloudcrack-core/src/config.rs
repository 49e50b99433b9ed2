//! Tool configuration from an optional `config.json`
//!
//! A missing file or missing keys are not errors; fixed defaults apply.
//! `vCPU` and `MEMORY` are accepted as either JSON numbers or strings since
//! both appear in the wild; Batch resource requirements take string values
//! anyway.

use std::path::Path;

use serde::Deserialize;

use crate::error::ProvisionResult;
use cloudcrack_state::StoreError;

/// Default suffix used to namespace all created resource names
pub const DEFAULT_SUFFIX: &str = "-cloudcrack";
/// Default vCPU count for submitted jobs
pub const DEFAULT_VCPU: &str = "1";
/// Default memory (MiB) for submitted jobs
pub const DEFAULT_MEMORY: &str = "2048";
/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    unique_suffix: Option<String>,
    #[serde(rename = "vCPU")]
    vcpu: Option<serde_json::Value>,
    #[serde(rename = "MEMORY")]
    memory: Option<serde_json::Value>,
    region: Option<String>,
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolved tool configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Suffix appended to every created resource name
    pub unique_suffix: String,
    /// vCPU count passed as a job resource requirement
    pub vcpu: String,
    /// Memory in MiB passed as a job resource requirement
    pub memory: String,
    /// AWS region for all provider clients
    pub region: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            unique_suffix: DEFAULT_SUFFIX.to_string(),
            vcpu: DEFAULT_VCPU.to_string(),
            memory: DEFAULT_MEMORY.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl ToolConfig {
    /// Default config file path
    pub const DEFAULT_PATH: &'static str = "config.json";

    /// Load from a config file, falling back to defaults for a missing file
    /// or missing keys. A file that exists but does not parse is an error.
    pub fn load(path: impl AsRef<Path>) -> ProvisionResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let raw: RawConfig = serde_json::from_str(&content)
            .map_err(|e| StoreError::Invalid(format!("Failed to parse {}: {}", path.display(), e)))?;

        let defaults = Self::default();
        Ok(Self {
            unique_suffix: raw.unique_suffix.unwrap_or(defaults.unique_suffix),
            vcpu: raw
                .vcpu
                .and_then(value_to_string)
                .unwrap_or(defaults.vcpu),
            memory: raw
                .memory
                .and_then(value_to_string)
                .unwrap_or(defaults.memory),
            region: raw.region.unwrap_or(defaults.region),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = ToolConfig::load(dir.path().join("config.json")).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn test_partial_keys_fall_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"unique_suffix": "-lab"}"#).unwrap();

        let config = ToolConfig::load(&path).unwrap();
        assert_eq!(config.unique_suffix, "-lab");
        assert_eq!(config.vcpu, DEFAULT_VCPU);
        assert_eq!(config.memory, DEFAULT_MEMORY);
        assert_eq!(config.region, DEFAULT_REGION);
    }

    #[test]
    fn test_numeric_and_string_values_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"vCPU": 4, "MEMORY": "8192"}"#).unwrap();

        let config = ToolConfig::load(&path).unwrap();
        assert_eq!(config.vcpu, "4");
        assert_eq!(config.memory, "8192");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();

        assert!(ToolConfig::load(&path).is_err());
    }
}
