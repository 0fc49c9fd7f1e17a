use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::nav::{AnimPair, AnimToken, ContainerId};

/// Navigator settings shared by every navigator under one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavConfig {
    /// Container the root navigator manages
    #[serde(default = "default_root_container")]
    pub root_container: ContainerId,

    /// Prefix for the key a navigator writes into a host state bag
    #[serde(default = "default_state_key_prefix")]
    pub state_key_prefix: String,

    /// Log every committed transaction at info level instead of debug
    #[serde(default)]
    pub log_transactions: bool,

    /// Animations used by transactions that do not set their own
    #[serde(default)]
    pub default_anims: Option<AnimPair>,
}

fn default_root_container() -> ContainerId {
    ContainerId(1)
}

fn default_state_key_prefix() -> String {
    "navigator".to_string()
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            root_container: default_root_container(),
            state_key_prefix: default_state_key_prefix(),
            log_transactions: false,
            default_anims: None,
        }
    }
}

impl NavConfig {
    pub fn with_root_container(mut self, container: ContainerId) -> Self {
        self.root_container = container;
        self
    }

    pub fn with_state_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.state_key_prefix = prefix.into();
        self
    }

    pub fn with_default_anims(mut self, enter: AnimToken, exit: AnimToken) -> Self {
        self.default_anims = Some(AnimPair::new(enter, exit));
        self
    }

    pub fn with_log_transactions(mut self, enabled: bool) -> Self {
        self.log_transactions = enabled;
        self
    }

    /// Key under which the navigator for `container` stores its stack
    pub fn state_key(&self, container: ContainerId) -> String {
        format!("{}.{}", self.state_key_prefix, container.0)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("navscope")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".navscope")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: NavConfig = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        debug!("Loaded config with root container {}", config.root_container);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", config_path);

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).with_context(|| {
                    format!("Failed to create config directory: {:?}", config_dir)
                })?;
                info!("Created config directory: {:?}", config_dir);
            }
        }

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NavConfig::default();

        assert_eq!(config.root_container, ContainerId(1));
        assert_eq!(config.state_key_prefix, "navigator");
        assert!(config.default_anims.is_none());
        assert!(!config.log_transactions);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: NavConfig = toml::from_str("root_container = 7").unwrap();

        assert_eq!(config.root_container, ContainerId(7));
        assert_eq!(config.state_key_prefix, "navigator");
    }

    #[test]
    fn test_anims_table() {
        let toml = r#"
            log_transactions = true

            [default_anims]
            enter = 11
            exit = 12
        "#;
        let config: NavConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.default_anims, Some(AnimPair::new(AnimToken(11), AnimToken(12))));
        assert!(config.log_transactions);
    }

    #[test]
    fn test_builder_pattern() {
        let config = NavConfig::default()
            .with_root_container(ContainerId(3))
            .with_state_key_prefix("stack")
            .with_default_anims(AnimToken(1), AnimToken(2))
            .with_log_transactions(true);

        assert_eq!(config.state_key(ContainerId(3)), "stack.3");
        assert_eq!(config.default_anims.map(|a| a.exit), Some(AnimToken(2)));
    }
}
