//! The authoritative remote object adapter.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use cairn_types::{Asset, AssetKey, AssetType};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::fetch::BinaryFetcher;
use crate::object::ObjectBackend;
use crate::outcome::LoadOutcome;
use crate::traits::BackendAdapter;

/// Asset types the remote object store serves. Everything else is left to
/// other adapters.
pub const REMOTE_ASSET_TYPES: [AssetType; 2] = [AssetType::ImageBitmap, AssetType::ImageVector];

/// [`BackendAdapter`] over an [`ObjectBackend`] plus a [`BinaryFetcher`].
///
/// Loads resolve a download URL and then fetch it:
/// - an unsupported asset type is `NotFound` without touching the backend;
/// - a failed URL resolution is `TransientError` (the object may well exist
///   elsewhere);
/// - a transport error or a non-2xx status is `NotFound`;
/// - a 2xx response becomes the asset payload.
///
/// Stores upload under the same key and wait for the upload's terminal
/// signal.
pub struct RemoteObjectAdapter {
    backend: Arc<dyn ObjectBackend>,
    fetcher: Arc<dyn BinaryFetcher>,
}

impl RemoteObjectAdapter {
    pub fn new(backend: Arc<dyn ObjectBackend>, fetcher: Arc<dyn BinaryFetcher>) -> Self {
        Self { backend, fetcher }
    }
}

#[async_trait]
impl BackendAdapter for RemoteObjectAdapter {
    fn name(&self) -> &str {
        "remote-object"
    }

    fn supports(&self, asset_type: AssetType) -> bool {
        REMOTE_ASSET_TYPES.contains(&asset_type)
    }

    async fn load(&self, key: &AssetKey) -> LoadOutcome {
        if !self.supports(key.asset_type()) {
            return LoadOutcome::NotFound;
        }

        let object = key.storage_key();
        let url = match self.backend.download_url(&object).await {
            Ok(url) => url,
            Err(err) => return LoadOutcome::TransientError(err),
        };

        let response = match self.fetcher.get(&url).await {
            Ok(response) => response,
            Err(err) => {
                debug!(%object, error = %err, "remote fetch failed");
                return LoadOutcome::NotFound;
            }
        };
        if !response.is_success() {
            debug!(%object, status = response.status, "remote fetch returned non-success");
            return LoadOutcome::NotFound;
        }

        let mut asset = Asset::new(key.clone());
        match asset.set_data(response.body) {
            Ok(()) => LoadOutcome::Found(asset),
            Err(err) => LoadOutcome::TransientError(err.into()),
        }
    }

    async fn store(&self, key: &AssetKey, data: Bytes) -> StoreResult<()> {
        if !self.supports(key.asset_type()) {
            return Err(StoreError::Unsupported {
                asset_type: key.asset_type(),
                operation: "store",
            });
        }

        let object = key.storage_key();
        let bytes = data.len();
        match self.backend.upload(&object, data).await.wait().await {
            Ok(()) => {
                info!(%object, bytes, "uploaded to remote object store");
                Ok(())
            }
            Err(err) => {
                warn!(%object, error = %err, "remote upload failed");
                Err(err)
            }
        }
    }
}
