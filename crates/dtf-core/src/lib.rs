//! # DTF Core
//!
//! Declares distributed training tasks for an external cluster launcher.
//! Derives per-node `TF_CONFIG` commands from a cluster's node list and
//! assembles validated, immutable task records around them.
//!
//! ## Modules
//!
//! - [`cluster`] - Node addresses and ordered cluster membership
//! - [`distributed`] - Per-node distributed training configuration
//! - [`task`] - Task definition, builder, validation and task files
//! - [`resource`] - Cloud and accelerator requirements
//! - [`data`] - Input/output datasets with size hints
//! - [`launch`] - Launcher interface and dry-run planning
//! - [`config`] - Configuration file handling
//! - [`logging`] - Tracing subscriber setup
//! - [`error`] - Error types

#![warn(missing_docs)]

/// Module version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod cluster;
pub mod distributed;
pub mod task;
pub mod resource;
pub mod data;
pub mod launch;
pub mod config;
pub mod logging;
pub mod error;

// Re-exports for convenience
pub use cluster::{ClusterMembership, NodeAddress};
pub use distributed::{ClusterConfigBuilder, DistributedConfig};
pub use task::{CommandMap, CommandSource, Task, TaskBuilder, TaskFile};
pub use resource::{AcceleratorSpec, Cloud, ResourceRequirements, Resources};
pub use data::{Dataset, StorageType};
pub use launch::{DryRunLauncher, LaunchHandle, LaunchPlan, Launcher};
pub use config::Config;
pub use error::{Error, Result};
