//! Configuration management
//!
//! Loaded from a YAML file. Every field has a default, so a partial file or
//! no file at all is fine.

use crate::distributed::{DEFAULT_ENV_VAR, DEFAULT_PORT, DEFAULT_PROFILE, DEFAULT_TASK_TYPE};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at a config file
pub const CONFIG_ENV_VAR: &str = "DTF_CONFIG";

/// Config file looked up in the working directory when `DTF_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "dtf.yaml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distributed config generation
    pub distributed: DistributedSettings,

    /// Launch defaults
    pub launch: LaunchSettings,
}

/// Settings for [`crate::distributed::ClusterConfigBuilder`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributedSettings {
    /// Port every worker listens on
    pub port: u16,
    /// Environment variable the training framework reads
    pub env_var: String,
    /// Shell profile the export line is appended to
    pub profile: String,
    /// Role written into `task.type`
    pub task_type: String,
}

impl Default for DistributedSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            env_var: DEFAULT_ENV_VAR.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
        }
    }
}

/// Settings used when handing a task to a launcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
    /// Cluster name used when none is given explicitly
    pub cluster_name: String,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            cluster_name: "dtf".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$DTF_CONFIG`, then `./dtf.yaml`, then defaults
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(PathBuf::from(path));
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            Self::load(local)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.distributed.port == 0 {
            return Err(Error::config("distributed.port must be greater than 0"));
        }

        if self.launch.cluster_name.trim().is_empty() {
            return Err(Error::config("launch.cluster_name cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.distributed.port, 8008);
        assert_eq!(config.distributed.env_var, "TF_CONFIG");
        assert_eq!(config.distributed.profile, "~/.bashrc");
        assert_eq!(config.distributed.task_type, "worker");
        assert_eq!(config.launch.cluster_name, "dtf");
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml("distributed:\n  port: 2222\n").unwrap();
        assert_eq!(config.distributed.port, 2222);
        assert_eq!(config.distributed.env_var, "TF_CONFIG");
        assert_eq!(config.launch.cluster_name, "dtf");
    }

    #[test]
    fn test_invalid_yaml_values() {
        assert!(Config::from_yaml("distributed:\n  port: 0\n").is_err());
        assert!(Config::from_yaml("launch:\n  cluster_name: ''\n").is_err());
        assert!(matches!(
            Config::from_yaml("distributed: [1, 2]").unwrap_err(),
            Error::Yaml(_)
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dtf.yaml");

        let mut config = Config::default();
        config.launch.cluster_name = "resnet".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/dtf.yaml").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
