//! Launcher interface and dry-run planning
//!
//! The launch engine itself lives outside this crate. It receives a [`Task`]
//! exactly once and, on every node, syncs the workdir and then runs setup,
//! post-setup and run in that order. [`LaunchPlan`] spells that order out per
//! node, and [`DryRunLauncher`] logs the plan instead of executing it.

use crate::cluster::NodeAddress;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::task::{CommandSource, Task, TaskId};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Phase of a task on one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Copy the workdir to the node
    SyncWorkdir,
    /// Setup commands
    Setup,
    /// Post-setup commands (distributed config)
    PostSetup,
    /// Training command
    Run,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SyncWorkdir => "sync_workdir",
            Self::Setup => "setup",
            Self::PostSetup => "post_setup",
            Self::Run => "run",
        };
        f.write_str(name)
    }
}

/// One step of a node's plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    /// Which phase this is
    pub phase: Phase,
    /// Command to run, or the workdir path for [`Phase::SyncWorkdir`]
    pub action: String,
}

/// Ordered steps for a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodePlan {
    /// Node address
    pub node: NodeAddress,
    /// Position in the cluster membership
    pub index: usize,
    /// Whether the node is the head
    pub is_head: bool,
    /// Steps in execution order
    pub steps: Vec<PlanStep>,
}

/// What a launcher would do for a task, node by node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    /// Task identifier
    pub task_id: TaskId,
    /// Task name
    pub task_name: String,
    /// One entry per node, in membership order
    pub nodes: Vec<NodePlan>,
}

impl LaunchPlan {
    /// Expand a task into per-node ordered steps, skipping absent phases
    pub fn from_task(task: &Task) -> Result<Self> {
        let nodes = task
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| -> Result<NodePlan> {
                let mut steps = Vec::new();

                if let Some(workdir) = task.workdir() {
                    steps.push(PlanStep {
                        phase: Phase::SyncWorkdir,
                        action: workdir.to_string(),
                    });
                }
                if let Some(setup) = task.setup() {
                    steps.push(PlanStep {
                        phase: Phase::Setup,
                        action: resolve(Phase::Setup, setup, node)?,
                    });
                }
                if let Some(post_setup) = task.post_setup() {
                    let action = post_setup.get(node).ok_or_else(|| missing(Phase::PostSetup, node))?;
                    steps.push(PlanStep {
                        phase: Phase::PostSetup,
                        action: action.to_string(),
                    });
                }
                steps.push(PlanStep {
                    phase: Phase::Run,
                    action: resolve(Phase::Run, task.run(), node)?,
                });

                Ok(NodePlan {
                    node: node.clone(),
                    index,
                    is_head: task.nodes().is_head(node),
                    steps,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            task_id: task.id().to_string(),
            task_name: task.name().to_string(),
            nodes,
        })
    }

    /// Plan for one node
    pub fn node(&self, node: &NodeAddress) -> Option<&NodePlan> {
        self.nodes.iter().find(|plan| &plan.node == node)
    }
}

fn resolve(phase: Phase, source: &CommandSource, node: &NodeAddress) -> Result<String> {
    source
        .for_node(node)
        .map(str::to_string)
        .ok_or_else(|| missing(phase, node))
}

fn missing(phase: Phase, node: &NodeAddress) -> Error {
    Error::launch(format!("No {} command for node {}", phase, node))
}

/// Returned by a launcher once it has accepted a task
#[derive(Debug, Clone, Serialize)]
pub struct LaunchHandle {
    /// Launched task
    pub task_id: TaskId,
    /// Cluster the task was launched on
    pub cluster_name: String,
    /// Steps the launcher runs on each node
    pub plan: LaunchPlan,
}

/// External cluster launch engine
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Hand a task over. The task is consumed; launchers must not expect to
    /// see it again.
    async fn launch(&self, task: Task, cluster_name: Option<&str>) -> Result<LaunchHandle>;
}

/// Launcher that only plans and logs
#[derive(Debug, Clone)]
pub struct DryRunLauncher {
    default_cluster_name: String,
}

impl DryRunLauncher {
    /// Create a dry-run launcher with a default cluster name
    pub fn new(default_cluster_name: impl Into<String>) -> Self {
        Self {
            default_cluster_name: default_cluster_name.into(),
        }
    }

    /// Create a dry-run launcher from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.launch.cluster_name.clone())
    }
}

impl Default for DryRunLauncher {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[async_trait]
impl Launcher for DryRunLauncher {
    async fn launch(&self, task: Task, cluster_name: Option<&str>) -> Result<LaunchHandle> {
        let cluster_name = cluster_name.unwrap_or(self.default_cluster_name.as_str()).to_string();
        if cluster_name.trim().is_empty() {
            return Err(Error::launch("Cluster name cannot be empty"));
        }

        let plan = LaunchPlan::from_task(&task)?;

        info!(
            task = %task.name(),
            cluster = %cluster_name,
            nodes = task.num_nodes(),
            resources = %task.resources(),
            "Dry run: task accepted"
        );
        for node in &plan.nodes {
            for step in &node.steps {
                info!(node = %node.node, index = node.index, phase = %step.phase, "{}", step.action);
            }
        }

        Ok(LaunchHandle {
            task_id: task.id().to_string(),
            cluster_name,
            plan,
        })
    }
}
