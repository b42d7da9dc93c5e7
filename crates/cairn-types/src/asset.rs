use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::kind::{AssetType, DataFormat};

/// The identity of an asset: `(asset_type, asset_id, data_format)`.
///
/// Two assets with equal keys are the same asset. The key is also the cache
/// key, and its [`storage_key`](Self::storage_key) names the object in the
/// remote object store.
///
/// Fields are private so every key goes through [`AssetKey::new`],
/// deserialization included.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "KeyParts")]
pub struct AssetKey {
    asset_type: AssetType,
    asset_id: String,
    data_format: DataFormat,
}

#[derive(Deserialize)]
struct KeyParts {
    asset_type: AssetType,
    asset_id: String,
    data_format: DataFormat,
}

impl TryFrom<KeyParts> for AssetKey {
    type Error = TypeError;

    fn try_from(parts: KeyParts) -> Result<Self, Self::Error> {
        AssetKey::new(parts.asset_type, parts.asset_id, parts.data_format)
    }
}

impl AssetKey {
    /// Build a key. The id must be non-empty.
    pub fn new(
        asset_type: AssetType,
        asset_id: impl Into<String>,
        data_format: DataFormat,
    ) -> Result<Self, TypeError> {
        let asset_id = asset_id.into();
        if asset_id.is_empty() {
            return Err(TypeError::EmptyAssetId);
        }
        Ok(Self {
            asset_type,
            asset_id,
            data_format,
        })
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn data_format(&self) -> DataFormat {
        self.data_format
    }

    /// The object name: `"{asset_id}.{data_format}"`.
    pub fn storage_key(&self) -> String {
        format!("{}.{}", self.asset_id, self.data_format)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.asset_type, self.asset_id, self.data_format)
    }
}

/// One stored item: an [`AssetKey`] plus its payload.
///
/// The payload is either supplied at construction or filled in exactly once
/// by [`set_data`](Self::set_data) after a fetch completes. It is never
/// partially populated and never replaced.
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
    key: AssetKey,
    data: Option<Bytes>,
}

impl Asset {
    /// An asset whose payload has not been fetched yet.
    pub fn new(key: AssetKey) -> Self {
        Self { key, data: None }
    }

    /// An asset with its payload already present.
    pub fn with_data(key: AssetKey, data: impl Into<Bytes>) -> Self {
        Self {
            key,
            data: Some(data.into()),
        }
    }

    /// Populate the payload. Fails if it has already been set.
    pub fn set_data(&mut self, data: impl Into<Bytes>) -> Result<(), TypeError> {
        if self.data.is_some() {
            return Err(TypeError::DataAlreadySet(self.key.to_string()));
        }
        self.data = Some(data.into());
        Ok(())
    }

    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    pub fn asset_type(&self) -> AssetType {
        self.key.asset_type()
    }

    pub fn asset_id(&self) -> &str {
        self.key.asset_id()
    }

    pub fn data_format(&self) -> DataFormat {
        self.key.data_format()
    }

    /// The payload, if it has been populated.
    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// Returns `true` once the payload is present.
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// The payload viewed as UTF-8 text (JSON projects, SVG).
    ///
    /// Returns `None` if the payload is absent or not valid UTF-8.
    pub fn decode_text(&self) -> Option<&str> {
        self.data
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("key", &self.key)
            .field("bytes", &self.data.as_ref().map(Bytes::len))
            .finish()
    }
}
