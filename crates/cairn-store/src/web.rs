//! Read-only adapter for assets hosted at templated URLs.

use std::sync::Arc;

use async_trait::async_trait;
use cairn_types::{Asset, AssetKey, AssetType, RequestDescriptor};
use tracing::debug;

use crate::fetch::BinaryFetcher;
use crate::outcome::LoadOutcome;
use crate::template::{SharedHosts, UrlTemplate};
use crate::traits::BackendAdapter;

/// A web store: a set of asset types, a GET template and optional write
/// templates, with downloads delegated to a [`BinaryFetcher`].
///
/// The adapter never writes. The create/update templates only produce
/// [`RequestDescriptor`]s for a transport outside the core.
pub struct WebStoreAdapter {
    name: String,
    types: Vec<AssetType>,
    get: UrlTemplate,
    create: Option<UrlTemplate>,
    update: Option<UrlTemplate>,
    hosts: SharedHosts,
    static_root: Option<String>,
    fetcher: Arc<dyn BinaryFetcher>,
}

impl WebStoreAdapter {
    pub fn new(
        name: impl Into<String>,
        types: impl Into<Vec<AssetType>>,
        get: UrlTemplate,
        hosts: SharedHosts,
        fetcher: Arc<dyn BinaryFetcher>,
    ) -> Self {
        Self {
            name: name.into(),
            types: types.into(),
            get,
            create: None,
            update: None,
            hosts,
            static_root: None,
            fetcher,
        }
    }

    pub fn with_create(mut self, template: UrlTemplate) -> Self {
        self.create = Some(template);
        self
    }

    pub fn with_update(mut self, template: UrlTemplate) -> Self {
        self.update = Some(template);
        self
    }

    /// Base that relative rendered URLs are joined onto.
    pub fn with_static_root(mut self, root: impl Into<String>) -> Self {
        self.static_root = Some(root.into());
        self
    }

    pub fn types(&self) -> &[AssetType] {
        &self.types
    }

    /// The download URL for `key`, resolved against the static root if the
    /// template renders a relative path.
    pub fn get_url(&self, key: &AssetKey) -> String {
        let rendered = self.get.render(&self.hosts.snapshot(), key);
        self.absolutize(rendered)
    }

    /// Descriptor for creating a new asset, if this store has a create template.
    pub fn create_request(&self) -> Option<RequestDescriptor> {
        let template = self.create.as_ref()?;
        let url = template.render_parts(&self.hosts.snapshot(), None, None);
        Some(RequestDescriptor::credentialed(self.absolutize(url)))
    }

    /// Descriptor for updating `key`, if this store has an update template.
    pub fn update_request(&self, key: &AssetKey) -> Option<RequestDescriptor> {
        let template = self.update.as_ref()?;
        let url = template.render(&self.hosts.snapshot(), key);
        Some(RequestDescriptor::credentialed(self.absolutize(url)))
    }

    fn absolutize(&self, url: String) -> String {
        match &self.static_root {
            Some(root) if !url.contains("://") => {
                format!("{}/{}", root.trim_end_matches('/'), url.trim_start_matches('/'))
            }
            _ => url,
        }
    }
}

#[async_trait]
impl BackendAdapter for WebStoreAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, asset_type: AssetType) -> bool {
        self.types.contains(&asset_type)
    }

    async fn load(&self, key: &AssetKey) -> LoadOutcome {
        if !self.supports(key.asset_type()) {
            return LoadOutcome::NotFound;
        }

        let url = self.get_url(key);
        match self.fetcher.get(&url).await {
            Ok(response) if response.is_success() => {
                LoadOutcome::Found(Asset::with_data(key.clone(), response.body))
            }
            Ok(response) => {
                debug!(store = %self.name, %url, status = response.status, "web store miss");
                LoadOutcome::NotFound
            }
            Err(err) => LoadOutcome::TransientError(err.into()),
        }
    }
}
