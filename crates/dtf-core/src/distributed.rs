//! Per-node distributed training configuration
//!
//! Training frameworks such as TensorFlow discover their peers through an
//! environment variable (`TF_CONFIG`) holding a small JSON document:
//!
//! ```text
//! {"cluster":{"worker":["10.0.0.1:8008","10.0.0.2:8008"]},"task":{"type":"worker","index":1}}
//! ```
//!
//! [`ClusterConfigBuilder`] derives one such document per node and wraps it in
//! a command that appends the matching `export` line to the node's shell
//! profile. Running those commands is the launcher's job, not this module's.

use crate::cluster::ClusterMembership;
use crate::config::DistributedSettings;
use crate::error::{Error, Result};
use crate::task::CommandMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default port the training framework listens on
pub const DEFAULT_PORT: u16 = 8008;

/// Default environment variable read by the training framework
pub const DEFAULT_ENV_VAR: &str = "TF_CONFIG";

/// Default shell initialization file the export is appended to
pub const DEFAULT_PROFILE: &str = "~/.bashrc";

/// Default role name written into `task.type`
pub const DEFAULT_TASK_TYPE: &str = "worker";

/// Cluster section of a distributed config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// `address:port` of every member, in membership order
    pub worker: Vec<String>,
}

/// Role of the node the config is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRole {
    /// Role category. Every node, the head included, is a `worker`;
    /// telling the head apart is left to the training framework.
    #[serde(rename = "type")]
    pub task_type: String,

    /// Position of this node within the cluster membership
    pub index: usize,
}

/// Distributed training config for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributedConfig {
    /// Peer list shared by all nodes
    pub cluster: ClusterSpec,
    /// This node's role
    pub task: TaskRole,
}

impl DistributedConfig {
    /// Compact JSON encoding with fixed key order
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an `export VAR='<json>'` line back into a config
    pub fn from_export_statement(line: &str) -> Result<Self> {
        let rest = line
            .trim()
            .strip_prefix("export ")
            .ok_or_else(|| Error::cluster_config("Export statement must start with 'export '"))?;

        let (var, quoted) = rest
            .split_once('=')
            .ok_or_else(|| Error::cluster_config("Export statement has no assignment"))?;
        if !is_shell_identifier(var) {
            return Err(Error::cluster_config(format!(
                "Invalid variable name in export statement: {:?}",
                var
            )));
        }

        let json = quoted
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .ok_or_else(|| Error::cluster_config("Export value must be single-quoted"))?;

        Ok(serde_json::from_str(json)?)
    }

    /// Parse a command produced by [`ClusterConfigBuilder::build`]
    pub fn from_command(command: &str) -> Result<Self> {
        let inner = command
            .strip_prefix("echo \"")
            .and_then(|s| s.rsplit_once("\" >> "))
            .map(|(inner, _profile)| inner)
            .ok_or_else(|| Error::cluster_config("Not a profile export command"))?;

        Self::from_export_statement(&unescape_double_quotes(inner))
    }
}

/// Builds the post-setup command map that installs a distributed config on
/// every node of a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfigBuilder {
    port: u16,
    env_var: String,
    profile: String,
    task_type: String,
}

impl Default for ClusterConfigBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}

impl ClusterConfigBuilder {
    /// Create a builder for the given port with default variable and profile
    pub fn new(port: u16) -> Self {
        Self {
            port,
            env_var: DEFAULT_ENV_VAR.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
        }
    }

    /// Create a builder from configuration settings
    pub fn from_settings(settings: &DistributedSettings) -> Self {
        Self {
            port: settings.port,
            env_var: settings.env_var.clone(),
            profile: settings.profile.clone(),
            task_type: settings.task_type.clone(),
        }
    }

    /// Override the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the environment variable name
    pub fn env_var(mut self, env_var: impl Into<String>) -> Self {
        self.env_var = env_var.into();
        self
    }

    /// Set the shell profile the export line is appended to
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the role name written into `task.type`
    pub fn task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    /// Port every worker listens on
    pub fn port(&self) -> u16 {
        self.port
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::cluster_config("Port must be between 1 and 65535"));
        }

        if !is_shell_identifier(&self.env_var) {
            return Err(Error::cluster_config(format!(
                "Invalid environment variable name: {:?}",
                self.env_var
            )));
        }

        if self.profile.is_empty()
            || self
                .profile
                .chars()
                .any(|c| c.is_whitespace() || "'\"`$;&|<>\\".contains(c))
        {
            return Err(Error::cluster_config(format!(
                "Invalid shell profile path: {:?}",
                self.profile
            )));
        }

        if self.task_type.is_empty()
            || !self
                .task_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::cluster_config(format!(
                "Invalid task type: {:?}",
                self.task_type
            )));
        }

        Ok(())
    }

    /// One config per node, in membership order, differing only in `task.index`
    pub fn configs(&self, cluster: &ClusterMembership) -> Result<Vec<DistributedConfig>> {
        self.validate()?;

        let worker: Vec<String> = cluster.iter().map(|node| node.with_port(self.port)).collect();

        Ok((0..cluster.len())
            .map(|index| DistributedConfig {
                cluster: ClusterSpec {
                    worker: worker.clone(),
                },
                task: TaskRole {
                    task_type: self.task_type.clone(),
                    index,
                },
            })
            .collect())
    }

    /// The line persisted into the profile: `export VAR='<json>'`
    pub fn export_statement(&self, config: &DistributedConfig) -> Result<String> {
        Ok(format!("export {}='{}'", self.env_var, config.to_json()?))
    }

    /// Shell command appending the export line for `config` to the profile
    pub fn command_for(&self, config: &DistributedConfig) -> Result<String> {
        let statement = self.export_statement(config)?;
        Ok(format!(
            "echo \"{}\" >> {}",
            statement.replace('"', "\\\""),
            self.profile
        ))
    }

    /// Map every node to the command installing its distributed config.
    ///
    /// Either every node gets a command or an error is returned.
    pub fn build(&self, cluster: &ClusterMembership) -> Result<CommandMap> {
        let configs = self.configs(cluster)?;

        let mut commands = CommandMap::new();
        for (node, config) in cluster.iter().zip(&configs) {
            let command = self.command_for(config)?;
            debug!(node = %node, index = config.task.index, "Generated distributed config command");
            commands.insert(node.clone(), command);
        }

        Ok(commands)
    }
}

pub(crate) fn is_shell_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn unescape_double_quotes(s: &str) -> String {
    s.replace("\\\"", "\"")
}
