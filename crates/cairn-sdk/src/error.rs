use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("type error: {0}")]
    Type(#[from] cairn_types::TypeError),

    #[error("store error: {0}")]
    Store(#[from] cairn_store::StoreError),
}

pub type SdkResult<T> = Result<T, SdkError>;
