//! Configuration I/O (YAML loading)
//!
//! Schema v1:
//!
//! ```yaml
//! version: 1
//! preset: balanced
//! pta:
//!   max_field_limit: 128
//!   merge_pwc: false
//! ```
//!
//! Fields missing from `pta` are taken from the preset.

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::pta_config::PtaConfig;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

/// Supported schema versions
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Base preset
    #[serde(default)]
    pub preset: Option<String>,

    /// Overrides applied on top of the preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pta: Option<Value>,
}

impl PtaConfig {
    /// Parse and validate a v1 YAML document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        let version = file.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = match file.preset.as_deref() {
            Some(name) => {
                Preset::from_str(name).map_err(|_| ConfigError::UnknownPreset(name.to_string()))?
            }
            None => Preset::default(),
        };

        let config = match file.pta {
            Some(overrides) => merge_overrides(PtaConfig::from_preset(preset), overrides)?,
            None => PtaConfig::from_preset(preset),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from YAML file (v1 schema)
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export to YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(1),
            preset: Some(Preset::Custom.to_string()),
            pta: Some(serde_yaml::to_value(self)?),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}

/// Overlay the keys present in `overrides` onto `base`
fn merge_overrides(base: PtaConfig, overrides: Value) -> ConfigResult<PtaConfig> {
    let mut merged = serde_yaml::to_value(&base)?;
    match (&mut merged, overrides) {
        (Value::Mapping(target), Value::Mapping(source)) => {
            for (key, value) in source {
                if !target.contains_key(&key) {
                    return Err(ConfigError::Validation(format!(
                        "unknown field '{}' in pta section",
                        key.as_str().unwrap_or("<non-string key>")
                    )));
                }
                target.insert(key, value);
            }
        }
        (_, Value::Null) => {}
        _ => {
            return Err(ConfigError::Validation(
                "pta section must be a mapping".to_string(),
            ))
        }
    }
    Ok(serde_yaml::from_value(merged)?)
}
