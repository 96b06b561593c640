//! Core task definition

use super::{CommandMap, CommandSource};
use crate::cluster::ClusterMembership;
use crate::data::Dataset;
use crate::resource::Resources;
use serde::Serialize;
use std::collections::BTreeMap;

/// Unique task identifier
pub type TaskId = String;

/// A validated, read-only task declaration.
///
/// Built through [`super::TaskBuilder`]; there is no way to change a task
/// after it has been built. Launchers read it through the accessors or its
/// JSON serialization.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub(super) id: TaskId,
    pub(super) name: String,
    pub(super) workdir: Option<String>,
    pub(super) docker_image: Option<String>,
    pub(super) env: BTreeMap<String, String>,
    pub(super) nodes: ClusterMembership,
    pub(super) setup: Option<CommandSource>,
    pub(super) post_setup: Option<CommandMap>,
    pub(super) run: CommandSource,
    pub(super) resources: Resources,
    pub(super) inputs: Vec<Dataset>,
    pub(super) outputs: Vec<Dataset>,
}

impl Task {
    /// Unique identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory synced to every node before setup
    pub fn workdir(&self) -> Option<&str> {
        self.workdir.as_deref()
    }

    /// Container image the phases run in, if any
    pub fn docker_image(&self) -> Option<&str> {
        self.docker_image.as_deref()
    }

    /// Environment variables exported for every phase
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Cluster the per-node phases were checked against
    pub fn nodes(&self) -> &ClusterMembership {
        &self.nodes
    }

    /// Number of nodes, head included
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Setup phase, run once per node before post-setup
    pub fn setup(&self) -> Option<&CommandSource> {
        self.setup.as_ref()
    }

    /// Post-setup phase, run once the cluster's nodes are known
    pub fn post_setup(&self) -> Option<&CommandMap> {
        self.post_setup.as_ref()
    }

    /// Run phase
    pub fn run(&self) -> &CommandSource {
        &self.run
    }

    /// Requested resources
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Input datasets
    pub fn inputs(&self) -> &[Dataset] {
        &self.inputs
    }

    /// Output datasets
    pub fn outputs(&self) -> &[Dataset] {
        &self.outputs
    }

    /// Sum of the known input size hints, `None` if any input size is unknown
    pub fn estimated_input_size_gb(&self) -> Option<f64> {
        self.inputs
            .iter()
            .map(|data| data.estimated_size_gb)
            .sum::<Option<f64>>()
    }

    /// JSON document handed to a launcher
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::TaskBuilder;
    use crate::cluster::ClusterMembership;
    use crate::data::Dataset;
    use crate::resource::{Cloud, Resources};

    fn task(inputs: Vec<Dataset>) -> super::Task {
        let mut builder = TaskBuilder::new()
            .name("train")
            .nodes(ClusterMembership::parse(["10.0.0.1", "10.0.0.2"]).unwrap())
            .run("python train.py")
            .resources(Resources::new(Cloud::Aws));
        for input in inputs {
            builder = builder.input(input);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_task_accessors() {
        let task = task(vec![]);
        assert_eq!(task.name(), "train");
        assert_eq!(task.num_nodes(), 2);
        assert_eq!(task.nodes().head().as_str(), "10.0.0.1");
        assert!(task.setup().is_none());
        assert!(task.post_setup().is_none());
        assert!(!task.id().is_empty());
    }

    #[test]
    fn test_estimated_input_size() {
        let known = task(vec![
            Dataset::new("gs://a").with_estimated_size_gb(70.0),
            Dataset::new("gs://b").with_estimated_size_gb(0.5),
        ]);
        assert_eq!(known.estimated_input_size_gb(), Some(70.5));

        let unknown = task(vec![
            Dataset::new("gs://a").with_estimated_size_gb(70.0),
            Dataset::new("gs://b"),
        ]);
        assert_eq!(unknown.estimated_input_size_gb(), None);
    }

    #[test]
    fn test_task_json() {
        let json = task(vec![]).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "train");
        assert_eq!(value["run"], "python train.py");
        assert_eq!(value["nodes"][0], "10.0.0.1");
        assert_eq!(value["resources"]["cloud"], "aws");
    }
}
