use std::path::{Path, PathBuf};

use cairn_store::HostConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Configuration for a [`Storage`](crate::Storage) with the stock topology.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base for project get/create/update URLs.
    pub project_host: String,
    /// Base for generic asset downloads.
    pub asset_host: String,
    /// Base that relative asset paths (built-in extension samples) are
    /// resolved against. Without it those paths are fetched as-is.
    pub static_root: Option<String>,
    /// Priority of the remote object adapter.
    pub remote_priority: i32,
    /// Priority of the web stores.
    pub web_priority: i32,
    /// Remote object store endpoint.
    pub object_store: Option<ObjectStoreConfig>,
    /// Directory of built-in assets, laid out as `<asset-type>/<id>.<format>`.
    pub defaults_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            project_host: "https://projects.scratch.mit.edu".into(),
            asset_host: "https://assets.scratch.mit.edu".into(),
            static_root: None,
            remote_priority: 101,
            web_priority: -100,
            object_store: None,
            defaults_dir: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    pub base_url: String,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl StorageConfig {
    /// Read a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the stock topology cannot work with.
    pub fn validate(&self) -> SdkResult<()> {
        if self.remote_priority <= self.web_priority {
            return Err(SdkError::Config(format!(
                "remote_priority ({}) must be higher than web_priority ({})",
                self.remote_priority, self.web_priority
            )));
        }
        if let Some(store) = &self.object_store {
            if store.base_url.trim().is_empty() {
                return Err(SdkError::Config("object_store.base_url is empty".into()));
            }
        }
        Ok(())
    }

    pub fn hosts(&self) -> HostConfig {
        HostConfig {
            project_host: self.project_host.clone(),
            asset_host: self.asset_host.clone(),
        }
    }
}
