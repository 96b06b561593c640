//! Input and output datasets
//!
//! Size hints are advisory. The launcher may use them for placement and
//! bandwidth decisions; nothing here enforces them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Storage backend a dataset location points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageType {
    /// `s3://`
    S3,
    /// `gs://`
    GCS,
    /// `az://` or `https://<account>.blob.core.windows.net/`
    Azure,
    /// Anything else, resolved relative to the workdir
    Local,
}

/// A named dataset location with an optional size estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Bucket URL or path
    pub location: String,

    /// Estimated size in gigabytes. `None` means unknown, not zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_size_gb: Option<f64>,
}

impl Dataset {
    /// Dataset of unknown size
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            estimated_size_gb: None,
        }
    }

    /// Attach a size estimate in gigabytes
    pub fn with_estimated_size_gb(mut self, size: f64) -> Self {
        self.estimated_size_gb = Some(size);
        self
    }

    /// Storage backend inferred from the location's scheme
    pub fn storage_type(&self) -> StorageType {
        let location = self.location.trim();
        if location.starts_with("s3://") {
            StorageType::S3
        } else if location.starts_with("gs://") {
            StorageType::GCS
        } else if location.starts_with("az://") || location.contains(".blob.core.windows.net") {
            StorageType::Azure
        } else {
            StorageType::Local
        }
    }

    /// Check the location and size hint
    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(Error::data_validation("Dataset location cannot be empty"));
        }

        if let Some(size) = self.estimated_size_gb {
            if !size.is_finite() || size < 0.0 {
                return Err(Error::data_validation(format!(
                    "Estimated size for {} must be a non-negative number, got {}",
                    self.location, size
                )));
            }
        }

        Ok(())
    }
}
