//! The consumer-facing storage facade.

use std::sync::{Arc, RwLock};

use bytes::Bytes;
use cairn_store::{
    BackendAdapter, BinaryFetcher, HostConfig, LocalCacheStore, ObjectBackend, RemoteObjectAdapter,
    SharedHosts, StoreResult, UrlTemplate, WebStoreAdapter, REMOTE_ASSET_TYPES,
};
use cairn_types::{Asset, AssetKey, AssetType, DataFormat, RequestDescriptor};
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::defaults::{DefaultAssetSource, NoDefaults, Translator};
use crate::error::{SdkError, SdkResult};
use crate::observer::ResolutionObserver;
use crate::registry::ResolutionRegistry;
use crate::write::{AuthoritativeWrite, WriteStrategy};

/// Asset storage for one application.
///
/// Reads go through the [`ResolutionRegistry`]; writes go through a single
/// [`WriteStrategy`]. There is no global instance: build one with
/// [`Storage::builder`] or [`Storage::with_default_stores`] and pass it to
/// whoever needs it.
pub struct Storage {
    registry: ResolutionRegistry,
    writer: Arc<dyn WriteStrategy>,
    hosts: SharedHosts,
    web_stores: Vec<Arc<WebStoreAdapter>>,
    defaults: Arc<dyn DefaultAssetSource>,
    translator: RwLock<Option<Translator>>,
}

impl Storage {
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    /// A storage with the stock topology; see [`StorageBuilder::default_stores`].
    pub fn with_default_stores<B>(
        config: &StorageConfig,
        backend: Arc<B>,
        fetcher: Arc<dyn BinaryFetcher>,
        defaults: Arc<dyn DefaultAssetSource>,
    ) -> SdkResult<Self>
    where
        B: ObjectBackend + BinaryFetcher + 'static,
    {
        Storage::builder()
            .defaults(defaults)
            .default_stores(config, backend, fetcher)?
            .build()
    }

    // ---- Reads ----

    /// Resolve an asset. `None` means no source has it; an empty id is
    /// never found.
    pub async fn load(
        &self,
        asset_type: AssetType,
        asset_id: &str,
        data_format: DataFormat,
    ) -> Option<Asset> {
        match AssetKey::new(asset_type, asset_id, data_format) {
            Ok(key) => self.registry.load(&key).await,
            Err(err) => {
                debug!(%asset_type, %data_format, %err, "load with invalid key");
                None
            }
        }
    }

    pub async fn load_key(&self, key: &AssetKey) -> Option<Asset> {
        self.registry.load(key).await
    }

    // ---- Writes ----

    /// Persist an asset through the write strategy and return its id.
    ///
    /// `data_format` defaults to the type's runtime format. On error nothing
    /// was persisted and the cache is unchanged.
    pub async fn store(
        &self,
        asset_type: AssetType,
        data_format: Option<DataFormat>,
        data: impl Into<Bytes>,
        asset_id: &str,
    ) -> StoreResult<String> {
        let format = data_format.unwrap_or_else(|| asset_type.runtime_format());
        let key = AssetKey::new(asset_type, asset_id, format)?;
        self.writer.write(&key, data.into()).await?;
        Ok(key.asset_id().to_string())
    }

    // ---- Hosts ----

    pub fn set_project_host(&self, host: impl Into<String>) {
        self.hosts.set_project_host(host);
    }

    pub fn set_asset_host(&self, host: impl Into<String>) {
        self.hosts.set_asset_host(host);
    }

    pub fn hosts(&self) -> HostConfig {
        self.hosts.snapshot()
    }

    /// Descriptor for creating a project on the project host.
    pub fn project_create_request(&self) -> Option<RequestDescriptor> {
        self.web_stores.iter().find_map(|s| s.create_request())
    }

    /// Descriptor for updating project `asset_id` on the project host.
    pub fn project_update_request(&self, asset_id: &str) -> Option<RequestDescriptor> {
        let key = AssetKey::new(AssetType::Project, asset_id, AssetType::Project.runtime_format()).ok()?;
        self.web_stores.iter().find_map(|s| s.update_request(&key))
    }

    /// `(store name, download URL)` for every web store that would be asked
    /// for `key`, in scan order.
    pub fn web_urls(&self, key: &AssetKey) -> Vec<(String, String)> {
        self.registry
            .eligible(key.asset_type())
            .filter_map(|r| {
                self.web_stores
                    .iter()
                    .find(|s| s.name() == r.adapter.name())
                    .map(|s| (s.name().to_string(), s.get_url(key)))
            })
            .collect()
    }

    // ---- Built-in assets ----

    /// Install a new translator and re-seed the built-in assets with it.
    /// Returns the number of assets seeded.
    pub fn set_translator(&self, translator: Translator) -> SdkResult<usize> {
        *self.translator.write().expect("lock poisoned") = Some(translator);
        self.reseed()
    }

    /// Re-seed the built-in assets with the current translator. Seeded keys
    /// are overwritten; other cache entries are left alone.
    pub fn reseed(&self) -> SdkResult<usize> {
        let translator = self.translator.read().expect("lock poisoned").clone();
        let assets = self.defaults.default_assets(translator.as_ref());
        let count = self.registry.cache().seed(assets)?;
        info!(count, translated = translator.is_some(), "seeded built-in assets");
        Ok(count)
    }

    // ---- Accessors ----

    pub fn cache(&self) -> &Arc<LocalCacheStore> {
        self.registry.cache()
    }

    pub fn registry(&self) -> &ResolutionRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("registry", &self.registry)
            .field("hosts", &self.hosts.snapshot())
            .finish()
    }
}

/// Assembles a [`Storage`].
pub struct StorageBuilder {
    registry: ResolutionRegistry,
    writer: Option<Arc<dyn WriteStrategy>>,
    hosts: SharedHosts,
    web_stores: Vec<Arc<WebStoreAdapter>>,
    defaults: Arc<dyn DefaultAssetSource>,
    translator: Option<Translator>,
}

impl StorageBuilder {
    pub fn new() -> Self {
        Self {
            registry: ResolutionRegistry::new(Arc::new(LocalCacheStore::new())),
            writer: None,
            hosts: SharedHosts::default(),
            web_stores: Vec::new(),
            defaults: Arc::new(NoDefaults),
            translator: None,
        }
    }

    /// Replace the host configuration. Call before building web stores from
    /// [`shared_hosts`](Self::shared_hosts).
    pub fn hosts(mut self, hosts: HostConfig) -> Self {
        self.hosts = SharedHosts::new(hosts);
        self
    }

    /// The host handle web stores should render with.
    pub fn shared_hosts(&self) -> SharedHosts {
        self.hosts.clone()
    }

    pub fn cache(&self) -> Arc<LocalCacheStore> {
        self.registry.cache().clone()
    }

    pub fn observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.registry.set_observer(observer);
        self
    }

    /// Install the stock topology:
    ///
    /// | adapter            | types              | priority                |
    /// |--------------------|--------------------|-------------------------|
    /// | `remote-object`    | bitmap, vector     | `remote_priority` (101) |
    /// | `project-web`      | project            | `web_priority` (-100)   |
    /// | `image-web`        | vector, bitmap     | `web_priority`          |
    /// | `sound-web`        | sound              | `web_priority`          |
    /// | `music-extension`  | sound              | `web_priority`          |
    ///
    /// The remote object adapter is also the authoritative writer, and it
    /// downloads through `backend` so that the object store's credentials
    /// cover reads too. The web stores use `fetcher`. Hosts are taken from
    /// `config`.
    pub fn default_stores<B>(
        self,
        config: &StorageConfig,
        backend: Arc<B>,
        fetcher: Arc<dyn BinaryFetcher>,
    ) -> SdkResult<Self>
    where
        B: ObjectBackend + BinaryFetcher + 'static,
    {
        config.validate()?;
        let builder = self.hosts(config.hosts());
        let hosts = builder.shared_hosts();

        let remote = Arc::new(RemoteObjectAdapter::new(backend.clone(), backend));

        let project = WebStoreAdapter::new(
            "project-web",
            [AssetType::Project],
            UrlTemplate::project_get(),
            hosts.clone(),
            fetcher.clone(),
        )
        .with_create(UrlTemplate::project_create())
        .with_update(UrlTemplate::project_update());

        let images = WebStoreAdapter::new(
            "image-web",
            [AssetType::ImageVector, AssetType::ImageBitmap],
            UrlTemplate::asset_get(),
            hosts.clone(),
            fetcher.clone(),
        );

        let sounds = WebStoreAdapter::new(
            "sound-web",
            [AssetType::Sound],
            UrlTemplate::asset_get(),
            hosts.clone(),
            fetcher.clone(),
        );

        let mut music = WebStoreAdapter::new(
            "music-extension",
            [AssetType::Sound],
            UrlTemplate::music_extension(),
            hosts,
            fetcher,
        );
        if let Some(root) = &config.static_root {
            music = music.with_static_root(root.clone());
        }

        Ok(builder
            .authoritative(REMOTE_ASSET_TYPES, config.remote_priority, remote)
            .web_store(config.web_priority, project)
            .web_store(config.web_priority, images)
            .web_store(config.web_priority, sounds)
            .web_store(config.web_priority, music))
    }

    /// Register a read-only adapter.
    pub fn adapter(
        mut self,
        types: impl Into<Vec<AssetType>>,
        priority: i32,
        adapter: Arc<dyn BackendAdapter>,
    ) -> Self {
        self.registry.register(types, priority, adapter);
        self
    }

    /// Register a web store for its own asset types.
    pub fn web_store(mut self, priority: i32, store: WebStoreAdapter) -> Self {
        let store = Arc::new(store);
        self.registry
            .register(store.types().to_vec(), priority, store.clone());
        self.web_stores.push(store);
        self
    }

    /// Register `adapter` for reads and make it the authoritative writer.
    pub fn authoritative(
        mut self,
        types: impl Into<Vec<AssetType>>,
        priority: i32,
        adapter: Arc<dyn BackendAdapter>,
    ) -> Self {
        self.registry.register(types, priority, adapter.clone());
        let cache = self.registry.cache().clone();
        self.writer = Some(Arc::new(AuthoritativeWrite::new(adapter, cache)));
        self
    }

    /// Use a custom write strategy.
    pub fn write_strategy(mut self, writer: Arc<dyn WriteStrategy>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn defaults(mut self, defaults: Arc<dyn DefaultAssetSource>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Finish and seed the built-in assets.
    pub fn build(self) -> SdkResult<Storage> {
        let writer = self
            .writer
            .ok_or_else(|| SdkError::Config("no write strategy configured".into()))?;

        let storage = Storage {
            registry: self.registry,
            writer,
            hosts: self.hosts,
            web_stores: self.web_stores,
            defaults: self.defaults,
            translator: RwLock::new(self.translator),
        };
        storage.reseed()?;
        Ok(storage)
    }
}

impl Default for StorageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cairn_store::{FetchResponse, FetchResult, InMemoryObjectBackend};

    use super::*;
    use crate::defaults::StaticDefaults;

    struct Unreachable;

    #[async_trait::async_trait]
    impl BinaryFetcher for Unreachable {
        async fn get(&self, _url: &str) -> FetchResult<FetchResponse> {
            Ok(FetchResponse::new(503, Bytes::new()))
        }
    }

    fn stock(config: &StorageConfig) -> Storage {
        Storage::with_default_stores(
            config,
            Arc::new(InMemoryObjectBackend::default()),
            Arc::new(Unreachable),
            Arc::new(NoDefaults),
        )
        .unwrap()
    }

    #[test]
    fn builder_requires_a_writer() {
        let err = Storage::builder().build().unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn stock_topology_scan_order() {
        let storage = stock(&StorageConfig::default());
        let registry = storage.registry();
        assert_eq!(registry.adapters_for(AssetType::ImageBitmap), vec!["remote-object", "image-web"]);
        assert_eq!(registry.adapters_for(AssetType::ImageVector), vec!["remote-object", "image-web"]);
        assert_eq!(registry.adapters_for(AssetType::Sound), vec!["sound-web", "music-extension"]);
        assert_eq!(registry.adapters_for(AssetType::Project), vec!["project-web"]);
    }

    #[test]
    fn host_changes_reach_templates() {
        let config = StorageConfig {
            static_root: Some("https://app.example/".into()),
            ..Default::default()
        };
        let storage = stock(&config);
        storage.set_asset_host("https://cdn.example");
        storage.set_project_host("https://p.example");

        let key = AssetKey::new(AssetType::Sound, "c4", DataFormat::Mp3).unwrap();
        assert_eq!(
            storage.web_urls(&key),
            vec![
                (
                    "sound-web".to_string(),
                    "https://cdn.example/internalapi/asset/c4.mp3/get/".to_string()
                ),
                (
                    "music-extension".to_string(),
                    "https://app.example/static/extension-assets/scratch3_music/c4.mp3".to_string()
                ),
            ]
        );

        let create = storage.project_create_request().unwrap();
        assert_eq!(create.url, "https://p.example/");
        assert!(create.with_credentials);
        let update = storage.project_update_request("77").unwrap();
        assert_eq!(update.url, "https://p.example/77");
        assert!(storage.project_update_request("").is_none());
    }

    #[tokio::test]
    async fn empty_id_loads_nothing_and_stores_fail() {
        let storage = stock(&StorageConfig::default());
        assert!(storage.load(AssetType::ImageBitmap, "", DataFormat::Png).await.is_none());
        let err = storage
            .store(AssetType::ImageBitmap, None, &b"x"[..], "")
            .await
            .unwrap_err();
        assert!(matches!(err, cairn_store::StoreError::Type(_)));
    }

    #[test]
    fn build_seeds_defaults() {
        let key = AssetKey::new(AssetType::Sound, "meow", DataFormat::Wav).unwrap();
        let storage = Storage::builder()
            .authoritative(
                REMOTE_ASSET_TYPES,
                101,
                Arc::new(RemoteObjectAdapter::new(
                    Arc::new(InMemoryObjectBackend::default()),
                    Arc::new(Unreachable),
                )),
            )
            .defaults(Arc::new(StaticDefaults::new().with_asset(key.clone(), &b"RIFF"[..])))
            .build()
            .unwrap();
        assert!(storage.cache().contains(&key));
    }
}
