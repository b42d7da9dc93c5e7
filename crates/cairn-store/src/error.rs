use cairn_types::{AssetType, TypeError};

/// Errors from backend adapter operations.
///
/// `StoreError` is `Clone` so a single failure can be reported to an
/// observer and still be returned to the caller.
#[derive(Clone, Debug, thiserror::Error)]
pub enum StoreError {
    /// The adapter does not handle this asset type for this operation.
    #[error("{operation} is not supported for asset type {asset_type}")]
    Unsupported {
        asset_type: AssetType,
        operation: &'static str,
    },

    /// The adapter only serves reads.
    #[error("adapter {adapter} is read-only")]
    ReadOnly { adapter: String },

    /// The remote object store has no object under this key.
    #[error("object not found in remote store: {key}")]
    ObjectMissing { key: String },

    /// Network or protocol failure talking to a backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upload reported an error or ended without completing.
    #[error("upload failed: {0}")]
    Upload(String),

    /// An asset without a payload was offered to the local cache.
    #[error("refusing to cache asset without data: {0}")]
    EmptyPayload(String),

    /// Invalid asset identity or payload state.
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl StoreError {
    /// Returns `true` for failures that mean "nothing there" rather than
    /// "something broke".
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::ObjectMissing { .. } | Self::Unsupported { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from a [`BinaryFetcher`](crate::fetch::BinaryFetcher).
#[derive(Clone, Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("request failed: {0}")]
    Transport(String),
}

impl From<FetchError> for StoreError {
    fn from(err: FetchError) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// Result alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
