//! Error types for dtf-core

use thiserror::Error;

/// Result type alias for dtf-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
#[derive(Error, Debug)]
pub enum Error {
    /// Cluster membership or distributed config error
    #[error("Cluster configuration error: {0}")]
    ClusterConfig(String),

    /// Task validation error
    #[error("Task validation failed: {0}")]
    TaskValidation(String),

    /// Resource validation error
    #[error("Resource validation failed: {0}")]
    ResourceValidation(String),

    /// Dataset validation error
    #[error("Data validation failed: {0}")]
    DataValidation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Launch error
    #[error("Launch error: {0}")]
    Launch(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a cluster configuration error
    pub fn cluster_config(msg: impl Into<String>) -> Self {
        Self::ClusterConfig(msg.into())
    }

    /// Create a task validation error
    pub fn task_validation(msg: impl Into<String>) -> Self {
        Self::TaskValidation(msg.into())
    }

    /// Create a resource validation error
    pub fn resource_validation(msg: impl Into<String>) -> Self {
        Self::ResourceValidation(msg.into())
    }

    /// Create a dataset validation error
    pub fn data_validation(msg: impl Into<String>) -> Self {
        Self::DataValidation(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a launch error
    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::task_validation("invalid task");
        assert!(err.to_string().contains("Task validation"));

        let err = Error::resource_validation("invalid resource");
        assert!(err.to_string().contains("Resource validation"));

        let err = Error::cluster_config("no nodes");
        assert_eq!(err.to_string(), "Cluster configuration error: no nodes");
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
