//! Hook for watching the resolution scan.
//!
//! The scan treats adapter failures as misses so that the next adapter gets
//! a chance. The cause is not thrown away: it is handed to the registry's
//! [`ResolutionObserver`].

use cairn_store::StoreError;
use cairn_types::AssetKey;
use tracing::{debug, warn};

/// Receives one callback per resolution step. Every method defaults to a no-op.
pub trait ResolutionObserver: Send + Sync {
    /// The local cache answered.
    fn on_cache_hit(&self, _key: &AssetKey) {}

    /// An adapter reported the asset absent.
    fn on_adapter_miss(&self, _adapter: &str, _key: &AssetKey) {}

    /// An adapter failed internally; the scan moves on.
    fn on_adapter_failure(&self, _adapter: &str, _key: &AssetKey, _error: &StoreError) {}

    /// An adapter produced the asset and the scan stopped.
    fn on_resolved(&self, _adapter: &str, _key: &AssetKey) {}

    /// No source had the asset.
    fn on_exhausted(&self, _key: &AssetKey) {}
}

/// Logs every step through `tracing`. This is the registry default.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl ResolutionObserver for TracingObserver {
    fn on_cache_hit(&self, key: &AssetKey) {
        debug!(%key, "cache hit");
    }

    fn on_adapter_miss(&self, adapter: &str, key: &AssetKey) {
        debug!(adapter, %key, "adapter miss");
    }

    fn on_adapter_failure(&self, adapter: &str, key: &AssetKey, error: &StoreError) {
        if error.is_absence() {
            debug!(adapter, %key, %error, "adapter could not locate asset");
        } else {
            warn!(adapter, %key, %error, "adapter failed, trying next");
        }
    }

    fn on_resolved(&self, adapter: &str, key: &AssetKey) {
        debug!(adapter, %key, "resolved");
    }

    fn on_exhausted(&self, key: &AssetKey) {
        debug!(%key, "no source has asset");
    }
}
