//! Task validation logic

use super::{CommandMap, CommandSource, Task};
use crate::cluster::{ClusterMembership, NodeAddress};
use crate::distributed::is_shell_identifier;
use crate::error::{Error, Result};

/// Task validator
pub struct TaskValidator;

impl TaskValidator {
    /// Validate a task
    pub fn validate(task: &Task) -> Result<()> {
        Self::validate_name(&task.name)?;
        Self::validate_workdir(task.workdir.as_deref())?;
        Self::validate_docker_image(task.docker_image.as_deref())?;
        Self::validate_env(task)?;
        if let Some(setup) = &task.setup {
            Self::validate_phase("setup", setup, &task.nodes)?;
        }
        if let Some(post_setup) = &task.post_setup {
            Self::validate_node_map("post_setup", post_setup, &task.nodes)?;
        }
        Self::validate_phase("run", &task.run, &task.nodes)?;
        Self::validate_resources(task)?;
        Self::validate_datasets(task)?;
        Ok(())
    }

    /// Validate task name
    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::task_validation("Task name cannot be empty"));
        }

        if name.len() > 255 {
            return Err(Error::task_validation(
                "Task name cannot exceed 255 characters",
            ));
        }

        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::task_validation(
                "Task name can only contain alphanumeric characters, hyphens, and underscores",
            ));
        }

        Ok(())
    }

    fn validate_workdir(workdir: Option<&str>) -> Result<()> {
        match workdir {
            Some(dir) if dir.trim().is_empty() => {
                Err(Error::task_validation("Task workdir cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    fn validate_docker_image(image: Option<&str>) -> Result<()> {
        match image {
            Some(image) if image.trim().is_empty() || image.contains(char::is_whitespace) => {
                Err(Error::task_validation(format!("Invalid docker image: {:?}", image)))
            }
            _ => Ok(()),
        }
    }

    fn validate_env(task: &Task) -> Result<()> {
        if let Some(key) = task.env.keys().find(|key| !is_shell_identifier(key)) {
            return Err(Error::task_validation(format!(
                "Invalid environment variable name: {:?}",
                key
            )));
        }
        Ok(())
    }

    /// Validate a setup or run phase
    fn validate_phase(phase: &str, source: &CommandSource, nodes: &ClusterMembership) -> Result<()> {
        match source {
            CommandSource::Uniform(cmd) => {
                if cmd.trim().is_empty() {
                    return Err(Error::task_validation(format!(
                        "Task {} command cannot be empty",
                        phase
                    )));
                }

                if cmd.len() > 65536 {
                    return Err(Error::task_validation(format!(
                        "Task {} command cannot exceed 64KB",
                        phase
                    )));
                }

                Ok(())
            }
            CommandSource::PerNode(map) => Self::validate_node_map(phase, map, nodes),
        }
    }

    /// A per-node map must cover exactly the cluster's nodes
    fn validate_node_map(phase: &str, map: &CommandMap, nodes: &ClusterMembership) -> Result<()> {
        let (missing, extra) = map.key_mismatch(nodes);
        if !missing.is_empty() || !extra.is_empty() {
            return Err(Error::task_validation(format!(
                "Per-node {} commands do not match the cluster nodes (missing: [{}], extra: [{}])",
                phase,
                join(&missing),
                join(&extra)
            )));
        }

        if let Some((node, _)) = map.iter().find(|(_, cmd)| cmd.trim().is_empty()) {
            return Err(Error::task_validation(format!(
                "Task {} command for node {} cannot be empty",
                phase, node
            )));
        }

        Ok(())
    }

    fn validate_resources(task: &Task) -> Result<()> {
        if let Some(acc) = &task.resources.accelerators {
            if acc.accelerator_type.trim().is_empty() {
                return Err(Error::resource_validation("Accelerator type cannot be empty"));
            }
            if acc.count == 0 {
                return Err(Error::resource_validation(
                    "Accelerator count must be greater than 0",
                ));
            }
        }
        Ok(())
    }

    fn validate_datasets(task: &Task) -> Result<()> {
        for data in task.inputs.iter().chain(&task.outputs) {
            data.validate()?;
        }
        Ok(())
    }
}

fn join(nodes: &[NodeAddress]) -> String {
    nodes
        .iter()
        .map(NodeAddress::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
