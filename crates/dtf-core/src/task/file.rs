//! YAML task files
//!
//! ```yaml
//! name: train
//! workdir: ~/Downloads/tpu
//! setup: pip3 install --upgrade pip
//! run: python models/official/resnet/resnet_main.py --mode=train
//! resources:
//!   cloud: aws
//!   accelerators: V100
//! inputs:
//!   - location: gs://cloud-tpu-test-datasets/fake_imagenet
//!     estimated_size_gb: 70
//! ```
//!
//! `setup` and `run` also accept a map of node address to command.

use super::{CommandSource, TaskBuilder};
use crate::cluster::ClusterMembership;
use crate::data::Dataset;
use crate::error::Result;
use crate::resource::ResourceRequirements;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Task description as written in a YAML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskFile {
    /// Task name
    pub name: String,

    /// Working directory synced to every node
    #[serde(default)]
    pub workdir: Option<String>,

    /// Container image
    #[serde(default)]
    pub docker_image: Option<String>,

    /// Environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Setup phase
    #[serde(default)]
    pub setup: Option<CommandSource>,

    /// Run phase
    pub run: CommandSource,

    /// Resource request
    pub resources: ResourcesFile,

    /// Input datasets
    #[serde(default)]
    pub inputs: Vec<Dataset>,

    /// Output datasets
    #[serde(default)]
    pub outputs: Vec<Dataset>,
}

/// `resources:` section of a task file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcesFile {
    /// Cloud provider name
    pub cloud: String,

    /// `"V100"` or `"V100:4"`
    #[serde(default)]
    pub accelerators: Option<String>,
}

impl TaskFile {
    /// Load a task file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a task file from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Turn the file into a builder bound to `nodes`.
    ///
    /// The post-setup phase is not part of the file; callers add it with
    /// [`TaskBuilder::distributed`] or [`TaskBuilder::post_setup`].
    pub fn into_builder(self, nodes: ClusterMembership) -> Result<TaskBuilder> {
        let mut resources = ResourceRequirements::new().cloud(self.resources.cloud);
        if let Some(acc) = self.resources.accelerators {
            resources = resources.accelerators(acc);
        }

        let mut builder = TaskBuilder::new()
            .name(self.name)
            .envs(self.env)
            .nodes(nodes)
            .run(self.run)
            .resources(resources.build()?);

        if let Some(workdir) = self.workdir {
            builder = builder.workdir(workdir);
        }
        if let Some(image) = self.docker_image {
            builder = builder.docker_image(image);
        }
        if let Some(setup) = self.setup {
            builder = builder.setup(setup);
        }
        for input in self.inputs {
            builder = builder.input(input);
        }
        for output in self.outputs {
            builder = builder.output(output);
        }

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::ClusterConfigBuilder;
    use crate::error::Error;
    use crate::resource::Cloud;

    const RESNET: &str = r#"
name: train
workdir: ~/Downloads/tpu
setup: pip3 install --upgrade pip
run: python models/official/resnet/resnet_main.py --mode=train
resources:
  cloud: aws
  accelerators: V100
inputs:
  - location: gs://cloud-tpu-test-datasets/fake_imagenet
    estimated_size_gb: 70
outputs:
  - location: resnet-model-dir
    estimated_size_gb: 0.1
"#;

    fn nodes() -> ClusterMembership {
        ClusterMembership::parse(["10.0.0.1", "10.0.0.2"]).unwrap()
    }

    #[test]
    fn test_parse_task_file() {
        let file = TaskFile::from_yaml(RESNET).unwrap();
        assert_eq!(file.name, "train");
        assert_eq!(file.resources.accelerators.as_deref(), Some("V100"));
        assert_eq!(file.inputs[0].estimated_size_gb, Some(70.0));
    }

    #[test]
    fn test_into_task() {
        let task = TaskFile::from_yaml(RESNET)
            .unwrap()
            .into_builder(nodes())
            .unwrap()
            .distributed(ClusterConfigBuilder::default())
            .build()
            .unwrap();

        assert_eq!(task.resources().cloud, Cloud::Aws);
        assert_eq!(task.post_setup().unwrap().len(), 2);
        assert_eq!(task.workdir(), Some("~/Downloads/tpu"));
    }

    #[test]
    fn test_per_node_run_map_checked() {
        let yaml = r#"
name: train
run:
  10.0.0.1: python train.py
resources:
  cloud: gcp
"#;
        let err = TaskFile::from_yaml(yaml)
            .unwrap()
            .into_builder(nodes())
            .unwrap()
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("missing: [10.0.0.2]"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "name: a\nrun: b\nresources:\n  cloud: aws\nnum_gpus: 3\n";
        assert!(matches!(TaskFile::from_yaml(yaml).unwrap_err(), Error::Yaml(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.yaml");
        std::fs::write(&path, RESNET).unwrap();

        assert_eq!(TaskFile::load(&path).unwrap().name, "train");
    }
}
