//! Task builder pattern for fluent task construction

use super::{CommandMap, CommandSource, Task, TaskValidator};
use crate::cluster::ClusterMembership;
use crate::data::Dataset;
use crate::distributed::ClusterConfigBuilder;
use crate::error::{Error, Result};
use crate::resource::Resources;
use std::collections::BTreeMap;
use tracing::debug;

/// Builder for constructing tasks with a fluent interface
#[derive(Debug, Default)]
pub struct TaskBuilder {
    name: Option<String>,
    workdir: Option<String>,
    docker_image: Option<String>,
    env: BTreeMap<String, String>,
    nodes: Option<ClusterMembership>,
    setup: Option<CommandSource>,
    post_setup: Option<CommandMap>,
    distributed: Option<ClusterConfigBuilder>,
    run: Option<CommandSource>,
    resources: Option<Resources>,
    inputs: Vec<Dataset>,
    outputs: Vec<Dataset>,
}

impl TaskBuilder {
    /// Create a new task builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the task name (required)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the working directory synced to every node
    pub fn workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// Run every phase inside this container image
    pub fn docker_image(mut self, image: impl Into<String>) -> Self {
        self.docker_image = Some(image.into());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add multiple environment variables
    pub fn envs(mut self, envs: BTreeMap<String, String>) -> Self {
        self.env.extend(envs);
        self
    }

    /// Set the cluster nodes the task runs on (required)
    pub fn nodes(mut self, nodes: ClusterMembership) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Set the setup phase, a command or a per-node map
    pub fn setup(mut self, setup: impl Into<CommandSource>) -> Self {
        self.setup = Some(setup.into());
        self
    }

    /// Set an explicit post-setup map
    pub fn post_setup(mut self, post_setup: CommandMap) -> Self {
        self.post_setup = Some(post_setup);
        self
    }

    /// Derive the post-setup map from the task's nodes at build time
    pub fn distributed(mut self, builder: ClusterConfigBuilder) -> Self {
        self.distributed = Some(builder);
        self
    }

    /// Set the run phase (required), a command or a per-node map
    pub fn run(mut self, run: impl Into<CommandSource>) -> Self {
        self.run = Some(run.into());
        self
    }

    /// Set the resource request (required)
    pub fn resources(mut self, resources: Resources) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Add an input dataset
    pub fn input(mut self, input: Dataset) -> Self {
        self.inputs.push(input);
        self
    }

    /// Add an output dataset
    pub fn output(mut self, output: Dataset) -> Self {
        self.outputs.push(output);
        self
    }

    /// Build the task, validating required fields and per-node maps
    pub fn build(self) -> Result<Task> {
        let name = self
            .name
            .ok_or_else(|| Error::task_validation("Task name is required"))?;

        let run = self
            .run
            .ok_or_else(|| Error::task_validation("Task run command is required"))?;

        let nodes = self
            .nodes
            .ok_or_else(|| Error::task_validation("Task cluster nodes are required"))?;

        let resources = self
            .resources
            .ok_or_else(|| Error::resource_validation("Task resources are required"))?;

        let post_setup = match (self.post_setup, self.distributed) {
            (Some(_), Some(_)) => {
                return Err(Error::task_validation(
                    "Task post-setup given both explicitly and as a distributed config",
                ))
            }
            (Some(map), None) => Some(map),
            (None, Some(builder)) => Some(builder.build(&nodes)?),
            (None, None) => None,
        };

        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            workdir: self.workdir,
            docker_image: self.docker_image,
            env: self.env,
            nodes,
            setup: self.setup,
            post_setup,
            run,
            resources,
            inputs: self.inputs,
            outputs: self.outputs,
        };

        TaskValidator::validate(&task)?;
        debug!(task = %task.name, id = %task.id, nodes = task.num_nodes(), "Built task");

        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::DistributedConfig;
    use crate::resource::{Cloud, ResourceRequirements};

    fn nodes() -> ClusterMembership {
        ClusterMembership::parse(["10.0.0.1", "10.0.0.2"]).unwrap()
    }

    #[test]
    fn test_builder_basic() {
        let task = TaskBuilder::new()
            .name("my-task")
            .nodes(nodes())
            .run("echo hello")
            .resources(Resources::new(Cloud::Gcp))
            .build()
            .unwrap();

        assert_eq!(task.name(), "my-task");
        assert_eq!(task.run(), &CommandSource::Uniform("echo hello".to_string()));
    }

    #[test]
    fn test_builder_full() {
        let resources = ResourceRequirements::new()
            .cloud("aws")
            .accelerators("V100")
            .build()
            .unwrap();

        let task = TaskBuilder::new()
            .name("train")
            .workdir("~/Downloads/tpu")
            .docker_image("rayproject/ray-ml:latest-gpu")
            .env("XLA_FLAGS", "--xla_gpu_cuda_data_dir=/usr/local/cuda/")
            .nodes(nodes())
            .setup("pip3 install --upgrade pip")
            .distributed(ClusterConfigBuilder::new(8008))
            .run(CommandMap::uniform(&nodes(), "python models/official/resnet/resnet_main.py"))
            .resources(resources)
            .input(Dataset::new("gs://cloud-tpu-test-datasets/fake_imagenet").with_estimated_size_gb(70.0))
            .output(Dataset::new("resnet-model-dir").with_estimated_size_gb(0.1))
            .build()
            .unwrap();

        assert_eq!(task.workdir(), Some("~/Downloads/tpu"));
        assert_eq!(task.docker_image(), Some("rayproject/ray-ml:latest-gpu"));
        assert_eq!(task.env().len(), 1);
        assert_eq!(task.inputs().len(), 1);
        assert_eq!(task.outputs().len(), 1);

        let post_setup = task.post_setup().unwrap();
        assert_eq!(post_setup.len(), 2);
        let head = DistributedConfig::from_command(post_setup.get(task.nodes().head()).unwrap()).unwrap();
        assert_eq!(head.task.index, 0);
    }

    #[test]
    fn test_builder_missing_required() {
        let result = TaskBuilder::new()
            .name("test")
            .nodes(nodes())
            .resources(Resources::new(Cloud::Aws))
            .build();
        assert!(result.unwrap_err().to_string().contains("run command"));

        let result = TaskBuilder::new()
            .run("echo test")
            .nodes(nodes())
            .resources(Resources::new(Cloud::Aws))
            .build();
        assert!(result.unwrap_err().to_string().contains("name"));

        let result = TaskBuilder::new()
            .name("test")
            .run("echo test")
            .resources(Resources::new(Cloud::Aws))
            .build();
        assert!(result.unwrap_err().to_string().contains("nodes"));
    }

    #[test]
    fn test_builder_requires_resources() {
        let err = TaskBuilder::new()
            .name("test")
            .nodes(nodes())
            .run("echo test")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ResourceValidation(_)));
    }

    #[test]
    fn test_builder_empty_run() {
        let result = TaskBuilder::new()
            .name("test")
            .nodes(nodes())
            .run("   ")
            .resources(Resources::new(Cloud::Aws))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_run_map_missing_node_fails() {
        let only_head = ClusterMembership::parse(["10.0.0.1"]).unwrap();

        let result = TaskBuilder::new()
            .name("train")
            .nodes(nodes())
            .distributed(ClusterConfigBuilder::new(8008))
            .run(CommandMap::uniform(&only_head, "python train.py"))
            .resources(Resources::new(Cloud::Aws))
            .build();

        let err = result.unwrap_err().to_string();
        assert!(err.contains("missing: [10.0.0.2]"));
    }

    #[test]
    fn test_post_setup_conflict() {
        let result = TaskBuilder::new()
            .name("train")
            .nodes(nodes())
            .post_setup(CommandMap::uniform(&nodes(), "true"))
            .distributed(ClusterConfigBuilder::new(8008))
            .run("python train.py")
            .resources(Resources::new(Cloud::Aws))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_distributed_error_aborts_build() {
        let result = TaskBuilder::new()
            .name("train")
            .nodes(nodes())
            .distributed(ClusterConfigBuilder::new(0))
            .run("python train.py")
            .resources(Resources::new(Cloud::Aws))
            .build();
        assert!(matches!(result.unwrap_err(), Error::ClusterConfig(_)));
    }
}
