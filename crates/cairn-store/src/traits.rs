use async_trait::async_trait;
use bytes::Bytes;
use cairn_types::{AssetKey, AssetType};

use crate::error::{StoreError, StoreResult};
use crate::outcome::LoadOutcome;

/// A pluggable source (and possibly sink) of assets.
///
/// Implementations must satisfy these rules:
/// - `load` never fails for absence. A missing asset, an asset type the
///   adapter does not serve, or a non-2xx fetch is [`LoadOutcome::NotFound`].
/// - Internal failures are [`LoadOutcome::TransientError`] so that callers can
///   fall back to the next adapter without special-casing.
/// - `store` surfaces the underlying cause of any failure. It never reports
///   success for a write that was not accepted.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Whether this adapter serves assets of the given type.
    fn supports(&self, asset_type: AssetType) -> bool;

    /// Fetch an asset by key.
    async fn load(&self, key: &AssetKey) -> LoadOutcome;

    /// Persist an asset under `key`.
    ///
    /// The default implementation rejects the write: most adapters are
    /// read-only fallbacks.
    async fn store(&self, _key: &AssetKey, _data: Bytes) -> StoreResult<()> {
        Err(StoreError::ReadOnly {
            adapter: self.name().to_string(),
        })
    }
}
