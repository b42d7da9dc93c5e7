//! High-level SDK for Cairn asset storage.
//!
//! [`Storage`] is the entry point for applications: it resolves assets
//! through a priority-ordered [`ResolutionRegistry`] backed by the local
//! cache, and persists them through a single authoritative
//! [`WriteStrategy`].

pub mod config;
pub mod defaults;
pub mod error;
pub mod observer;
pub mod registry;
pub mod storage;
pub mod write;

pub use config::{ObjectStoreConfig, StorageConfig};
pub use defaults::{render_template, DefaultAssetSource, NoDefaults, StaticDefaults, Translator};
pub use error::{SdkError, SdkResult};
pub use observer::{ResolutionObserver, TracingObserver};
pub use registry::{Registration, ResolutionRegistry};
pub use storage::{Storage, StorageBuilder};
pub use write::{AuthoritativeWrite, KeyGuard, KeyedLocks, WriteStrategy};

// Re-export key types
pub use cairn_store::{BackendAdapter, LoadOutcome, LocalCacheStore, StoreError, StoreResult};
pub use cairn_types::{Asset, AssetKey, AssetType, DataFormat, RequestDescriptor};
