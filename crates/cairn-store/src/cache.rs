//! Synchronous in-memory mirror of resolved and written assets.
//!
//! [`LocalCacheStore`] is the fast path of every load. It is written by
//! default-asset seeding, by successful remote loads, and by successful
//! authoritative stores. Reads never suspend and a miss is simply `None`.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use cairn_types::{Asset, AssetKey};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// In-memory, HashMap-based asset cache.
///
/// Holds only assets whose payload is populated; [`populate`](Self::populate)
/// and [`seed`](Self::seed) reject anything else.
///
/// Writes come in two strengths. [`insert`](Self::insert) and `seed` are
/// authoritative and overwrite. `populate` is the load path: it only fills
/// a missing entry, so a fetch that was already in flight when a store
/// completed cannot replace the stored bytes with stale ones.
pub struct LocalCacheStore {
    entries: RwLock<HashMap<AssetKey, Asset>>,
}

impl LocalCacheStore {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up an asset. A miss returns `None`.
    pub fn get(&self, key: &AssetKey) -> Option<Asset> {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    /// Cache a freshly loaded asset unless the key is already present.
    ///
    /// Returns the entry that is cached afterwards: `asset` itself, or the
    /// entry that got there first.
    pub fn populate(&self, asset: Asset) -> StoreResult<Asset> {
        if !asset.is_loaded() {
            return Err(StoreError::EmptyPayload(asset.key().to_string()));
        }
        let mut map = self.entries.write().expect("cache lock poisoned");
        Ok(map.entry(asset.key().clone()).or_insert(asset).clone())
    }

    /// Insert or replace a single entry from a key and its bytes.
    pub fn insert(&self, key: AssetKey, data: Bytes) {
        let mut map = self.entries.write().expect("cache lock poisoned");
        map.insert(key.clone(), Asset::with_data(key, data));
    }

    /// Bulk write. Every seeded key is overwritten; keys not in `assets` are
    /// left untouched. Returns the number of entries written.
    ///
    /// The batch is validated before anything is written, so a rejected seed
    /// leaves the cache unchanged.
    pub fn seed(&self, assets: impl IntoIterator<Item = Asset>) -> StoreResult<usize> {
        let assets: Vec<Asset> = assets.into_iter().collect();
        if let Some(empty) = assets.iter().find(|a| !a.is_loaded()) {
            return Err(StoreError::EmptyPayload(empty.key().to_string()));
        }
        let count = assets.len();
        let mut map = self.entries.write().expect("cache lock poisoned");
        for asset in assets {
            map.insert(asset.key().clone(), asset);
        }
        debug!(count, "seeded local cache");
        Ok(count)
    }

    pub fn contains(&self, key: &AssetKey) -> bool {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .contains_key(key)
    }

    /// Number of cached assets.
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("cache lock poisoned").is_empty()
    }

    /// Sorted list of all cached keys.
    pub fn keys(&self) -> Vec<AssetKey> {
        let map = self.entries.read().expect("cache lock poisoned");
        let mut keys: Vec<AssetKey> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for LocalCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCacheStore")
            .field("entry_count", &self.len())
            .finish()
    }
}
