//! Priority-ordered fallback search across the local cache and adapters.

use std::cmp::Reverse;
use std::sync::Arc;

use cairn_store::{BackendAdapter, LoadOutcome, LocalCacheStore};
use cairn_types::{Asset, AssetKey, AssetType};

use crate::observer::{ResolutionObserver, TracingObserver};

/// One adapter registered for a set of asset types at a priority.
#[derive(Clone)]
pub struct Registration {
    pub types: Vec<AssetType>,
    pub priority: i32,
    pub seq: u64,
    pub adapter: Arc<dyn BackendAdapter>,
}

impl Registration {
    pub fn handles(&self, asset_type: AssetType) -> bool {
        self.types.contains(&asset_type)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("adapter", &self.adapter.name())
            .field("types", &self.types)
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .finish()
    }
}

/// The read path.
///
/// A load runs as a small state machine:
///
/// 1. **CacheCheck** -- a hit in the [`LocalCacheStore`] ends the load.
/// 2. **AdapterScan** -- adapters registered for the asset type are asked one
///    at a time, highest priority first, ties in registration order. The
///    first `Found` stops the scan.
/// 3. **PopulateCache** -- the found asset is written to the cache unless a
///    store filled the key while the adapter was fetching, and the cached
///    entry is returned.
/// 4. **Exhausted** -- nobody had it; the load yields `None`.
///
/// The scan is sequential on purpose: the first hit wins and later adapters
/// must not be touched.
pub struct ResolutionRegistry {
    cache: Arc<LocalCacheStore>,
    registrations: Vec<Registration>,
    next_seq: u64,
    observer: Arc<dyn ResolutionObserver>,
}

impl ResolutionRegistry {
    /// An empty registry over `cache`, logging through [`TracingObserver`].
    pub fn new(cache: Arc<LocalCacheStore>) -> Self {
        Self {
            cache,
            registrations: Vec::new(),
            next_seq: 0,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn set_observer(&mut self, observer: Arc<dyn ResolutionObserver>) {
        self.observer = observer;
    }

    /// Register `adapter` for `types` at `priority`. Higher priorities are
    /// asked first; equal priorities keep registration order.
    pub fn register(
        &mut self,
        types: impl Into<Vec<AssetType>>,
        priority: i32,
        adapter: Arc<dyn BackendAdapter>,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.registrations.push(Registration {
            types: types.into(),
            priority,
            seq,
            adapter,
        });
        self.registrations
            .sort_by_key(|r| (Reverse(r.priority), r.seq));
    }

    /// Registrations eligible for `asset_type`, in scan order.
    pub fn eligible(&self, asset_type: AssetType) -> impl Iterator<Item = &Registration> {
        self.registrations
            .iter()
            .filter(move |r| r.handles(asset_type))
    }

    /// Names of the adapters a load of `asset_type` would ask, in order.
    pub fn adapters_for(&self, asset_type: AssetType) -> Vec<&str> {
        self.eligible(asset_type).map(|r| r.adapter.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn cache(&self) -> &Arc<LocalCacheStore> {
        &self.cache
    }

    /// Resolve `key`. Never fails: absence everywhere is `None`.
    pub async fn load(&self, key: &AssetKey) -> Option<Asset> {
        if let Some(hit) = self.cache.get(key) {
            self.observer.on_cache_hit(key);
            return Some(hit);
        }

        for registration in self.eligible(key.asset_type()) {
            let adapter = registration.adapter.name();
            match registration.adapter.load(key).await {
                LoadOutcome::Found(asset) => {
                    // An adapter handing back an empty asset is a failure,
                    // not a hit: the cache only holds loaded assets. A store
                    // that landed while this fetch was in flight wins.
                    match self.cache.populate(asset) {
                        Ok(cached) => {
                            self.observer.on_resolved(adapter, key);
                            return Some(cached);
                        }
                        Err(err) => self.observer.on_adapter_failure(adapter, key, &err),
                    }
                }
                LoadOutcome::NotFound => self.observer.on_adapter_miss(adapter, key),
                LoadOutcome::TransientError(err) => {
                    self.observer.on_adapter_failure(adapter, key, &err)
                }
            }
        }

        self.observer.on_exhausted(key);
        None
    }
}

impl std::fmt::Debug for ResolutionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionRegistry")
            .field("cache", &self.cache)
            .field("registrations", &self.registrations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use cairn_store::StoreError;
    use cairn_types::DataFormat;
    use proptest::prelude::*;

    use super::*;

    /// Answers every load with a fixed outcome and counts calls.
    struct Scripted {
        name: &'static str,
        outcome: fn(&AssetKey) -> LoadOutcome,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, outcome: fn(&AssetKey) -> LoadOutcome) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BackendAdapter for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, _asset_type: AssetType) -> bool {
            true
        }

        async fn load(&self, key: &AssetKey) -> LoadOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)(key)
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ResolutionObserver for Recorder {
        fn on_cache_hit(&self, _key: &AssetKey) {
            self.events.lock().unwrap().push("hit".into());
        }
        fn on_adapter_miss(&self, adapter: &str, _key: &AssetKey) {
            self.events.lock().unwrap().push(format!("miss:{adapter}"));
        }
        fn on_adapter_failure(&self, adapter: &str, _key: &AssetKey, error: &StoreError) {
            self.events.lock().unwrap().push(format!("fail:{adapter}:{error}"));
        }
        fn on_resolved(&self, adapter: &str, _key: &AssetKey) {
            self.events.lock().unwrap().push(format!("resolved:{adapter}"));
        }
        fn on_exhausted(&self, _key: &AssetKey) {
            self.events.lock().unwrap().push("exhausted".into());
        }
    }

    fn found_high(k: &AssetKey) -> LoadOutcome {
        LoadOutcome::Found(Asset::with_data(k.clone(), Bytes::from_static(b"high")))
    }

    fn found_low(k: &AssetKey) -> LoadOutcome {
        LoadOutcome::Found(Asset::with_data(k.clone(), Bytes::from_static(b"low")))
    }

    fn not_found(_: &AssetKey) -> LoadOutcome {
        LoadOutcome::NotFound
    }

    fn broken(_: &AssetKey) -> LoadOutcome {
        LoadOutcome::TransientError(StoreError::Transport("boom".into()))
    }

    fn empty(k: &AssetKey) -> LoadOutcome {
        LoadOutcome::Found(Asset::new(k.clone()))
    }

    fn key() -> AssetKey {
        AssetKey::new(AssetType::ImageBitmap, "abc", DataFormat::Png).unwrap()
    }

    fn registry() -> (Arc<Recorder>, ResolutionRegistry) {
        let recorder = Arc::new(Recorder::default());
        let registry = ResolutionRegistry::new(Arc::new(LocalCacheStore::new()))
            .with_observer(recorder.clone());
        (recorder, registry)
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn higher_priority_wins_and_lower_is_not_asked() {
        let (_, mut registry) = registry();
        let low = Scripted::new("low", found_low);
        let high = Scripted::new("high", found_high);
        registry.register([AssetType::ImageBitmap], 1, low.clone());
        registry.register([AssetType::ImageBitmap], 10, high.clone());

        let asset = registry.load(&key()).await.unwrap();
        assert_eq!(asset.data().unwrap().as_ref(), b"high");
        assert_eq!(high.calls(), 1);
        assert_eq!(low.calls(), 0);
    }

    #[test]
    fn ties_keep_registration_order() {
        let (_, mut registry) = registry();
        registry.register([AssetType::Sound], 0, Scripted::new("first", not_found));
        registry.register([AssetType::Sound], 5, Scripted::new("top", not_found));
        registry.register([AssetType::Sound], 0, Scripted::new("second", not_found));
        registry.register([AssetType::ImageBitmap], 100, Scripted::new("images", not_found));
        assert_eq!(registry.adapters_for(AssetType::Sound), vec!["top", "first", "second"]);
        assert_eq!(registry.adapters_for(AssetType::ImageBitmap), vec!["images"]);
        assert!(registry.adapters_for(AssetType::Project).is_empty());
        assert_eq!(registry.len(), 4);
    }

    // -----------------------------------------------------------------------
    // Fallback
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn failures_and_misses_fall_through() {
        let (recorder, mut registry) = registry();
        registry.register([AssetType::ImageBitmap], 3, Scripted::new("broken", broken));
        registry.register([AssetType::ImageBitmap], 2, Scripted::new("empty", not_found));
        registry.register([AssetType::ImageBitmap], 1, Scripted::new("last", found_low));

        let asset = registry.load(&key()).await.unwrap();
        assert_eq!(asset.data().unwrap().as_ref(), b"low");
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![
                "fail:broken:transport error: boom".to_string(),
                "miss:empty".to_string(),
                "resolved:last".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn exhaustion_is_none() {
        let (recorder, mut registry) = registry();
        registry.register([AssetType::ImageBitmap], 0, Scripted::new("broken", broken));
        assert!(registry.load(&key()).await.is_none());
        assert_eq!(recorder.events.lock().unwrap().last().unwrap(), "exhausted");
    }

    #[tokio::test]
    async fn ineligible_adapters_are_skipped() {
        let (_, mut registry) = registry();
        let sounds = Scripted::new("sounds", found_low);
        registry.register([AssetType::Sound], 0, sounds.clone());
        assert!(registry.load(&key()).await.is_none());
        assert_eq!(sounds.calls(), 0);
    }

    #[tokio::test]
    async fn empty_found_asset_is_treated_as_failure() {
        let (recorder, mut registry) = registry();
        registry.register([AssetType::ImageBitmap], 2, Scripted::new("liar", empty));
        registry.register([AssetType::ImageBitmap], 1, Scripted::new("honest", found_low));
        let asset = registry.load(&key()).await.unwrap();
        assert_eq!(asset.data().unwrap().as_ref(), b"low");
        assert!(recorder.events.lock().unwrap()[0].starts_with("fail:liar"));
    }

    // -----------------------------------------------------------------------
    // Cache interaction
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn second_load_is_served_from_cache() {
        let (recorder, mut registry) = registry();
        let remote = Scripted::new("remote", found_high);
        registry.register([AssetType::ImageBitmap], 0, remote.clone());

        registry.load(&key()).await.unwrap();
        let again = registry.load(&key()).await.unwrap();
        assert_eq!(again.data().unwrap().as_ref(), b"high");
        assert_eq!(remote.calls(), 1);
        assert_eq!(recorder.events.lock().unwrap().last().unwrap(), "hit");
        assert!(registry.cache().contains(&key()));
    }

    #[tokio::test]
    async fn seeded_cache_short_circuits() {
        let (_, mut registry) = registry();
        let remote = Scripted::new("remote", found_high);
        registry.register([AssetType::ImageBitmap], 0, remote.clone());
        registry.cache().insert(key(), Bytes::from_static(b"seed"));

        let asset = registry.load(&key()).await.unwrap();
        assert_eq!(asset.data().unwrap().as_ref(), b"seed");
        assert_eq!(remote.calls(), 0);
    }

    proptest! {
        #[test]
        fn scan_order_is_descending_priority_then_registration(
            priorities in proptest::collection::vec(-5i32..5, 1..12)
        ) {
            let mut registry = ResolutionRegistry::new(Arc::new(LocalCacheStore::new()));
            for (i, p) in priorities.iter().enumerate() {
                let name: &'static str = Box::leak(format!("a{i}").into_boxed_str());
                registry.register([AssetType::Sound], *p, Scripted::new(name, not_found));
            }

            let mut expected: Vec<(i32, usize)> =
                priorities.iter().copied().enumerate().map(|(i, p)| (p, i)).collect();
            expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            let expected: Vec<String> = expected.iter().map(|(_, i)| format!("a{i}")).collect();

            let actual: Vec<String> = registry
                .adapters_for(AssetType::Sound)
                .into_iter()
                .map(str::to_string)
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
