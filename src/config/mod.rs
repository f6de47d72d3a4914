use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_confirm_deletes() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Member list endpoint override (CLI --source wins over this)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Ask before single or bulk delete
    #[serde(default = "default_confirm_deletes")]
    pub confirm_deletes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            confirm_deletes: true,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("kanri");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        // Treat an empty endpoint override as unset
        let mut clean_config = self.clone();
        if clean_config
            .source_url
            .as_ref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(false)
        {
            clean_config.source_url = None;
        }

        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            source_url: Some("https://example.com/members.json".to_string()),
            confirm_deletes: false,
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.source_url, deserialized.source_url);
        assert_eq!(config.confirm_deletes, deserialized.confirm_deletes);
    }

    #[test]
    fn test_confirm_deletes_defaults_on() {
        let deserialized: AppConfig = toml::from_str("").unwrap();
        assert!(deserialized.confirm_deletes);
        assert!(deserialized.source_url.is_none());
    }
}
