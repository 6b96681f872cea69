//! User configuration, stored as JSON in the platform config directory.

use crate::core::date::{DateRenderer, DEFAULT_DATE_FORMAT};
use crate::core::dirs::get_config_file;
use crate::core::error::{BlameError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlameConfig {
    /// Format for timestamps older than five days, e.g. `YYYY-MM-DD`
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for BlameConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
        }
    }
}

impl BlameConfig {
    /// Load the user's config; a missing file yields the defaults
    pub fn load() -> Result<Self> {
        let config_file = get_config_file()?;
        if config_file.exists() {
            Self::load_from(&config_file)
        } else {
            log::debug!("No config at {}, using defaults", config_file.display());
            Ok(Self::default())
        }
    }

    /// Load the user's config, writing the defaults if there is none yet
    pub fn load_or_create() -> Result<Self> {
        let config_file = get_config_file()?;
        if config_file.exists() {
            Self::load_from(&config_file)
        } else {
            let config = Self::default();
            config.save_to(&config_file)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BlameError::config_read_failed(path, e))?;
        serde_json::from_str(&content).map_err(|e| BlameError::config_parse_failed(path, e))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn date_renderer(&self) -> DateRenderer {
        DateRenderer::new(&self.date_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("config.json");
        let config = BlameConfig {
            date_format: "DD.MM.YYYY".to_string(),
        };

        config.save_to(&path)?;
        assert_eq!(BlameConfig::load_from(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_missing_field_uses_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{}")?;

        assert_eq!(BlameConfig::load_from(&path)?.date_format, "YYYY-MM-DD");
        Ok(())
    }

    #[test]
    fn test_malformed_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json")?;

        let result = BlameConfig::load_from(&path);
        assert!(matches!(result, Err(BlameError::ConfigParseFailed { .. })));
        Ok(())
    }

    #[test]
    fn test_date_renderer_uses_format() {
        let config = BlameConfig {
            date_format: "DD/MM/YYYY".to_string(),
        };
        assert_eq!(config.date_renderer().pattern(), "%d/%m/%Y");
    }
}
