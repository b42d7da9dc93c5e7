use cairn_types::Asset;

use crate::error::StoreError;

/// Result of asking one adapter for an asset.
///
/// `NotFound` and `TransientError` are treated the same way by the
/// resolution scan (move on to the next adapter); the error is kept so it can
/// be reported.
#[derive(Clone, Debug)]
pub enum LoadOutcome {
    /// The adapter produced the asset, payload populated.
    Found(Asset),
    /// The asset does not exist here, or this adapter does not serve the type.
    NotFound,
    /// The adapter failed internally. The scan continues.
    TransientError(StoreError),
}

impl LoadOutcome {
    /// Borrow the asset if one was found.
    pub fn found(&self) -> Option<&Asset> {
        match self {
            Self::Found(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Take the asset if one was found.
    pub fn into_asset(self) -> Option<Asset> {
        match self {
            Self::Found(asset) => Some(asset),
            _ => None,
        }
    }

    /// The failure cause, if this outcome is a transient error.
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Self::TransientError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Option<Asset>> for LoadOutcome {
    fn from(asset: Option<Asset>) -> Self {
        asset.map_or(Self::NotFound, Self::Found)
    }
}
