//! Resource requirements and specifications

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cloud provider a task is launched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cloud {
    /// Amazon Web Services
    Aws,
    /// Google Cloud Platform
    Gcp,
    /// Microsoft Azure
    Azure,
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Azure => "azure",
        };
        f.write_str(name)
    }
}

impl FromStr for Cloud {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "gcp" => Ok(Self::Gcp),
            "azure" => Ok(Self::Azure),
            other => Err(Error::resource_validation(format!(
                "Unknown cloud provider: {:?}",
                other
            ))),
        }
    }
}

/// Accelerator specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceleratorSpec {
    /// Accelerator type (e.g., "V100", "A100", "tpu-v3-8")
    pub accelerator_type: String,

    /// Number of accelerators per node
    pub count: u32,
}

impl AcceleratorSpec {
    /// Create an accelerator spec
    pub fn new(accelerator_type: impl Into<String>, count: u32) -> Result<Self> {
        let accelerator_type = accelerator_type.into();
        if accelerator_type.trim().is_empty() {
            return Err(Error::resource_validation("Accelerator type cannot be empty"));
        }
        if count == 0 {
            return Err(Error::resource_validation(
                "Accelerator count must be greater than 0",
            ));
        }
        Ok(Self {
            accelerator_type,
            count,
        })
    }
}

impl fmt::Display for AcceleratorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.accelerator_type, self.count)
    }
}

/// Parses `V100` (one accelerator) or `V100:4`
impl FromStr for AcceleratorSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once(':') {
            Some((name, count)) => {
                let count = count.trim().parse::<u32>().map_err(|_| {
                    Error::resource_validation(format!("Invalid accelerator count in {:?}", s))
                })?;
                Self::new(name.trim(), count)
            }
            None => Self::new(s.trim(), 1),
        }
    }
}

/// Resource request handed to the launcher: one cloud, at most one accelerator type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Cloud provider
    pub cloud: Cloud,

    /// GPU/TPU accelerators
    pub accelerators: Option<AcceleratorSpec>,
}

impl Resources {
    /// Resources on a cloud without accelerators
    pub fn new(cloud: Cloud) -> Self {
        Self {
            cloud,
            accelerators: None,
        }
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.accelerators {
            Some(acc) => write!(f, "{}({})", self.cloud, acc),
            None => write!(f, "{}", self.cloud),
        }
    }
}

/// Resource requirements builder
#[derive(Debug, Default)]
pub struct ResourceRequirements {
    cloud: Option<String>,
    accelerators: Option<String>,
}

impl ResourceRequirements {
    /// Create new resource requirements
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cloud provider (required)
    pub fn cloud(mut self, cloud: impl Into<String>) -> Self {
        self.cloud = Some(cloud.into());
        self
    }

    /// Set accelerators, `"V100"` or `"V100:4"`
    pub fn accelerators(mut self, accelerators: impl Into<String>) -> Self {
        self.accelerators = Some(accelerators.into());
        self
    }

    /// Build the resource specification
    pub fn build(self) -> Result<Resources> {
        let cloud = self
            .cloud
            .ok_or_else(|| Error::resource_validation("A cloud provider is required"))?
            .parse::<Cloud>()?;

        let accelerators = self
            .accelerators
            .map(|acc| acc.parse::<AcceleratorSpec>())
            .transpose()?;

        Ok(Resources {
            cloud,
            accelerators,
        })
    }
}
