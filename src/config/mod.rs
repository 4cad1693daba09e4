//! Override file loading for ycm-flags
//!
//! Architecture: Anti-Corruption Layer - Configuration translates the external YAML format
//! - `ycm_extra_conf.yml` is converted to a clean OverrideConfig
//! - Missing keys and null lists mean "no change", never an error

use crate::domain::flags::{FlagsError, FlagsResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Default name of the override file searched for above each source file
pub const OVERRIDE_FILE_NAME: &str = "ycm_extra_conf.yml";

/// Contents of an override file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Flag adjustments
    #[serde(default, deserialize_with = "null_as_default")]
    pub flags: FlagOverrides,
}

/// Flags to drop from and append to the database flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOverrides {
    /// Flags appended after removal, in order
    #[serde(default, deserialize_with = "null_as_default")]
    pub add: Vec<String>,
    /// Flags removed wherever they occur (exact match)
    #[serde(default, deserialize_with = "null_as_default")]
    pub remove: Vec<String>,
}

impl OverrideConfig {
    /// Load an override file from disk
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> FlagsResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            FlagsError::config(format!(
                "Failed to read override file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::parse(&contents).map_err(|e| {
            FlagsError::config(format!(
                "Failed to parse override file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Load an override configuration from string content
    pub fn load_from_str(content: &str) -> FlagsResult<Self> {
        Self::parse(content)
            .map_err(|e| FlagsError::config(format!("Failed to parse override file: {e}")))
    }

    fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(content)?;
        config.validate();
        Ok(config)
    }

    /// Warn about entries that are almost certainly mistakes
    pub fn validate(&self) {
        if self.flags.add.iter().chain(&self.flags.remove).any(|f| f.is_empty()) {
            tracing::warn!("Override file contains an empty flag");
        }

        let removed: HashSet<&str> = self.flags.remove.iter().map(String::as_str).collect();
        for flag in self.flags.add.iter().filter(|f| removed.contains(f.as_str())) {
            tracing::warn!("Flag '{}' is both added and removed; it will be present", flag);
        }
    }

    /// Whether this configuration changes anything
    pub fn is_empty(&self) -> bool {
        self.flags.add.is_empty() && self.flags.remove.is_empty()
    }

    /// Apply overrides: drop every removed flag, then append the added ones
    pub fn apply(&self, flags: &[String]) -> Vec<String> {
        let remove: HashSet<&str> = self.flags.remove.iter().map(String::as_str).collect();

        let mut result: Vec<String> =
            flags.iter().filter(|f| !remove.contains(f.as_str())).cloned().collect();
        result.extend(self.flags.add.iter().cloned());
        result
    }

    /// Convert to YAML for display
    pub fn to_yaml(&self) -> FlagsResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| FlagsError::config(format!("Failed to serialize overrides: {e}")))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Builder for programmatic override construction
#[derive(Debug, Default)]
pub struct OverrideBuilder {
    config: OverrideConfig,
}

impl OverrideBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a flag
    pub fn add(mut self, flag: impl Into<String>) -> Self {
        self.config.flags.add.push(flag.into());
        self
    }

    /// Remove a flag
    pub fn remove(mut self, flag: impl Into<String>) -> Self {
        self.config.flags.remove.push(flag.into());
        self
    }

    /// Build the final configuration
    pub fn build(self) -> OverrideConfig {
        self.config.validate();
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_schema() {
        let config = OverrideConfig::load_from_str(
            "flags:\n  add:\n    - -DY\n    - -Wextra\n  remove:\n    - -DX\n",
        )
        .unwrap();

        assert_eq!(config.flags.add, strings(&["-DY", "-Wextra"]));
        assert_eq!(config.flags.remove, strings(&["-DX"]));
    }

    #[test]
    fn test_missing_and_null_keys() {
        assert!(OverrideConfig::load_from_str("").unwrap().is_empty());
        assert!(OverrideConfig::load_from_str("flags:\n").unwrap().is_empty());

        let config = OverrideConfig::load_from_str("flags:\n  add: [-DY]\n  remove:\n").unwrap();
        assert_eq!(config.flags.add, strings(&["-DY"]));
        assert!(config.flags.remove.is_empty());
    }

    #[test]
    fn test_wrong_type_is_error() {
        let result = OverrideConfig::load_from_str("flags:\n  add: 42\n");
        assert!(matches!(result, Err(FlagsError::Configuration { .. })));
    }

    #[test]
    fn test_apply_removes_all_occurrences() {
        let config = OverrideBuilder::new().remove("-DX").build();
        let flags = strings(&["-DX", "-Wall", "-DX", "-O2"]);

        assert_eq!(config.apply(&flags), strings(&["-Wall", "-O2"]));
    }

    #[test]
    fn test_apply_appends_after_remove() {
        let config = OverrideBuilder::new().remove("-DX").add("-DY").add("-DX").build();
        let flags = strings(&["-DX", "-Wall"]);

        assert_eq!(config.apply(&flags), strings(&["-Wall", "-DY", "-DX"]));
    }

    #[test]
    fn test_empty_config_is_identity() {
        let flags = strings(&["-std=c++17", "-Iinclude"]);
        assert_eq!(OverrideConfig::default().apply(&flags), flags);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(OVERRIDE_FILE_NAME);
        fs::write(&path, "flags:\n  remove: [-Werror]\n").unwrap();

        let config = OverrideConfig::load_from_file(&path).unwrap();
        assert_eq!(config.flags.remove, strings(&["-Werror"]));

        let missing = OverrideConfig::load_from_file(temp_dir.path().join("nope.yml"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_yaml_serialization() {
        let config = OverrideBuilder::new().add("-DY").build();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(OverrideConfig::load_from_str(&yaml).unwrap(), config);
    }
}
