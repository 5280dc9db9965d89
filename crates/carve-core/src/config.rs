//! Configuration management for Carve
//!
//! Settings are read from `.carve/config.toml` in the project root. Every value
//! has a default, so a missing file (or a partial one) is always usable.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{CarveError, Result};

/// Project-level Carve configuration
///
/// Loaded from `.carve/config.toml` in the project root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarveConfig {
    /// Service map generation
    #[serde(default)]
    pub service_map: ServiceMapConfig,

    /// Decomposition validator
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Parameters used when turning boundaries into service definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMapConfig {
    /// Language used when the PRD names none
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Estimated lines of code per owned entity
    #[serde(default = "default_loc_per_entity")]
    pub loc_per_entity: u32,

    /// Lower clamp for `estimated_loc`
    #[serde(default = "default_min_loc")]
    pub min_loc: u32,

    /// Upper clamp for `estimated_loc`
    #[serde(default = "default_max_loc")]
    pub max_loc: u32,
}

/// Validator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Upper bound on DFS steps spent enumerating dependency cycles
    #[serde(default = "default_max_cycle_search_steps")]
    pub max_cycle_search_steps: usize,
}

// Default value providers
fn default_language() -> String {
    "python".to_string()
}

fn default_loc_per_entity() -> u32 {
    500
}

fn default_min_loc() -> u32 {
    100
}

fn default_max_loc() -> u32 {
    200_000
}

fn default_max_cycle_search_steps() -> usize {
    100_000
}

impl ServiceMapConfig {
    /// `clamp(entity_count * loc_per_entity, min_loc, max_loc)`
    pub fn estimate_loc(&self, entity_count: usize) -> u32 {
        let raw = (entity_count as u64).saturating_mul(self.loc_per_entity as u64);
        let max = self.max_loc.max(self.min_loc) as u64;
        raw.clamp(self.min_loc as u64, max) as u32
    }
}

impl CarveConfig {
    /// Load configuration from `.carve/config.toml` or use defaults
    pub fn load_or_default(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".carve/config.toml");

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            CarveError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Write default configuration to `.carve/config.toml`
    pub fn write_default(project_root: &Path) -> Result<()> {
        let config_dir = project_root.join(".carve");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| CarveError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

impl Default for ServiceMapConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            loc_per_entity: default_loc_per_entity(),
            min_loc: default_min_loc(),
            max_loc: default_max_loc(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_cycle_search_steps: default_max_cycle_search_steps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_loc_clamps() {
        let config = ServiceMapConfig::default();
        assert_eq!(config.estimate_loc(0), 100);
        assert_eq!(config.estimate_loc(3), 1500);
        assert_eq!(config.estimate_loc(1_000), 200_000);
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CarveConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config, CarveConfig::default());
        assert_eq!(config.service_map.default_language, "python");
    }

    #[test]
    fn test_write_then_load_default() {
        let dir = tempfile::tempdir().unwrap();
        CarveConfig::write_default(dir.path()).unwrap();
        assert!(dir.path().join(".carve/config.toml").exists());

        let config = CarveConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.validation.max_cycle_search_steps, 100_000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carve.toml");
        std::fs::write(&path, "[service_map]\ndefault_language = \"go\"\n").unwrap();

        let config = CarveConfig::load(&path).unwrap();
        assert_eq!(config.service_map.default_language, "go");
        assert_eq!(config.service_map.loc_per_entity, 500);
        assert_eq!(config.validation, ValidationConfig::default());
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "service_map = 3").unwrap();

        let err = CarveConfig::load(&path).unwrap_err();
        assert!(matches!(err, CarveError::Config(_)));
    }
}
