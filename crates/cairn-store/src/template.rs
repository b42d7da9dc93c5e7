//! URL templates for web-hosted assets.
//!
//! A template is a plain string with up to four placeholders:
//! `{project_host}`, `{asset_host}`, `{id}` and `{format}`. Rendering is
//! straight substitution with no escaping.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use cairn_types::AssetKey;

/// The two configurable base hosts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    pub project_host: String,
    pub asset_host: String,
}

/// Host configuration shared by every template of one storage instance.
///
/// Hosts may be changed after the templates are built; the next render sees
/// the new value.
#[derive(Clone, Debug, Default)]
pub struct SharedHosts(Arc<RwLock<HostConfig>>);

impl SharedHosts {
    pub fn new(hosts: HostConfig) -> Self {
        Self(Arc::new(RwLock::new(hosts)))
    }

    pub fn set_project_host(&self, host: impl Into<String>) {
        self.0.write().expect("hosts lock poisoned").project_host = host.into();
    }

    pub fn set_asset_host(&self, host: impl Into<String>) {
        self.0.write().expect("hosts lock poisoned").asset_host = host.into();
    }

    /// A copy of the current hosts.
    pub fn snapshot(&self) -> HostConfig {
        self.0.read().expect("hosts lock poisoned").clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate {
    pattern: String,
}

impl UrlTemplate {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Project download: `{project_host}/internalapi/project/{id}/get/`.
    pub fn project_get() -> Self {
        Self::new("{project_host}/internalapi/project/{id}/get/")
    }

    /// Project creation: `{project_host}/`.
    pub fn project_create() -> Self {
        Self::new("{project_host}/")
    }

    /// Project update: `{project_host}/{id}`.
    pub fn project_update() -> Self {
        Self::new("{project_host}/{id}")
    }

    /// Generic asset download: `{asset_host}/internalapi/asset/{id}.{format}/get/`.
    pub fn asset_get() -> Self {
        Self::new("{asset_host}/internalapi/asset/{id}.{format}/get/")
    }

    /// Built-in music extension samples, relative to the static root.
    pub fn music_extension() -> Self {
        Self::new("static/extension-assets/scratch3_music/{id}.{format}")
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render for an asset.
    pub fn render(&self, hosts: &HostConfig, key: &AssetKey) -> String {
        self.render_parts(hosts, Some(key.asset_id()), Some(&key.data_format().to_string()))
    }

    /// Render with optional id and format; absent parts become empty strings.
    ///
    /// Placeholders are substituted in one left-to-right pass, so braces
    /// inside a substituted value are copied through as-is.
    pub fn render_parts(&self, hosts: &HostConfig, id: Option<&str>, format: Option<&str>) -> String {
        let mut out = String::with_capacity(self.pattern.len() + 64);
        let mut rest = self.pattern.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            rest = &rest[open..];
            let value = [
                ("{project_host}", hosts.project_host.as_str()),
                ("{asset_host}", hosts.asset_host.as_str()),
                ("{id}", id.unwrap_or_default()),
                ("{format}", format.unwrap_or_default()),
            ]
            .into_iter()
            .find(|(placeholder, _)| rest.starts_with(*placeholder));

            match value {
                Some((placeholder, value)) => {
                    out.push_str(value);
                    rest = &rest[placeholder.len()..];
                }
                None => {
                    out.push('{');
                    rest = &rest[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}
