use thiserror::Error;

/// Errors produced by type operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("asset id must not be empty")]
    EmptyAssetId,

    #[error("unknown asset type: {0}")]
    UnknownAssetType(String),

    #[error("unknown data format: {0}")]
    UnknownDataFormat(String),

    #[error("asset {0} already has data")]
    DataAlreadySet(String),
}
