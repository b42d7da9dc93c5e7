//! The write path.
//!
//! Writes do not scan the registry. A [`WriteStrategy`] decides where bytes
//! go; the stock one, [`AuthoritativeWrite`], sends them to a single
//! authoritative adapter and mirrors them into the local cache only after
//! that adapter accepted them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use cairn_store::{BackendAdapter, LocalCacheStore, StoreResult};
use cairn_types::AssetKey;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

/// Policy for persisting an asset.
#[async_trait]
pub trait WriteStrategy: Send + Sync {
    /// Persist `data` under `key`. An error means nothing was persisted and
    /// the local cache was not touched.
    async fn write(&self, key: &AssetKey, data: Bytes) -> StoreResult<()>;
}

/// One async mutex per asset key.
///
/// Entries are dropped again once nobody holds or waits on them.
#[derive(Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<AssetKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn acquire(&self, key: &AssetKey) -> KeyGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().expect("lock poisoned");
            slots.entry(key.clone()).or_default().clone()
        };
        let guard = slot.lock_owned().await;
        KeyGuard {
            owner: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys with a live slot.
    pub fn active(&self) -> usize {
        self.slots.lock().expect("lock poisoned").len()
    }

    fn release(&self, key: &AssetKey) {
        let mut slots = self.slots.lock().expect("lock poisoned");
        // Only the map itself still references the slot: nobody is waiting.
        if slots.get(key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(key);
        }
    }
}

impl std::fmt::Debug for KeyedLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedLocks")
            .field("active", &self.active())
            .finish()
    }
}

/// Held while a key is locked.
pub struct KeyGuard<'a> {
    owner: &'a KeyedLocks,
    key: AssetKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Release the mutex first so the slot's refcount drops.
        self.guard.take();
        self.owner.release(&self.key);
    }
}

/// Write to one authoritative adapter, then mirror into the cache.
pub struct AuthoritativeWrite {
    adapter: Arc<dyn BackendAdapter>,
    cache: Arc<LocalCacheStore>,
    locks: KeyedLocks,
}

impl AuthoritativeWrite {
    pub fn new(adapter: Arc<dyn BackendAdapter>, cache: Arc<LocalCacheStore>) -> Self {
        Self {
            adapter,
            cache,
            locks: KeyedLocks::new(),
        }
    }
}

#[async_trait]
impl WriteStrategy for AuthoritativeWrite {
    async fn write(&self, key: &AssetKey, data: Bytes) -> StoreResult<()> {
        let _guard = self.locks.acquire(key).await;
        let size = data.len();

        match self.adapter.store(key, data.clone()).await {
            Ok(()) => {
                self.cache.insert(key.clone(), data);
                info!(adapter = self.adapter.name(), %key, size, "asset stored");
                Ok(())
            }
            Err(err) => {
                warn!(adapter = self.adapter.name(), %key, %err, "authoritative store rejected");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for AuthoritativeWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthoritativeWrite")
            .field("adapter", &self.adapter.name())
            .field("locks", &self.locks)
            .finish()
    }
}
