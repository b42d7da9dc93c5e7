//! Backend adapters for Cairn.
//!
//! Every source an asset can come from implements [`BackendAdapter`]. This
//! crate provides the adapters and the stores behind them; choosing between
//! them is the job of the resolution registry in `cairn-sdk`.
//!
//! # Adapters
//!
//! - [`RemoteObjectAdapter`] -- the authoritative object store (bitmaps and
//!   vectors), read through time-limited download URLs and written through
//!   monitored uploads
//! - [`WebStoreAdapter`] -- read-only stores at [`UrlTemplate`] URLs
//!
//! # Stores and ports
//!
//! - [`LocalCacheStore`] -- synchronous in-memory mirror, the fast path
//! - [`ObjectBackend`] -- the remote object store port, with
//!   [`InMemoryObjectBackend`] and [`HttpObjectBackend`]
//! - [`BinaryFetcher`] -- the HTTP GET port, with [`HttpFetcher`]
//!
//! # Design Rules
//!
//! 1. Absence is never an error on the read path: adapters answer
//!    [`LoadOutcome::NotFound`].
//! 2. Internal read failures are [`LoadOutcome::TransientError`] and carry
//!    their cause.
//! 3. Write failures are returned verbatim; nothing reports success for a
//!    write the backend did not accept.
//! 4. The local cache never holds an asset without data.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod http;
pub mod memory;
pub mod object;
pub mod outcome;
pub mod remote;
pub mod template;
pub mod traits;
pub mod web;

pub use cache::LocalCacheStore;
pub use error::{FetchError, FetchResult, StoreError, StoreResult};
pub use fetch::{BinaryFetcher, FetchResponse, HttpFetcher};
pub use http::HttpObjectBackend;
pub use memory::InMemoryObjectBackend;
pub use object::{ObjectBackend, UploadEvent, UploadReporter, UploadTask};
pub use outcome::LoadOutcome;
pub use remote::{RemoteObjectAdapter, REMOTE_ASSET_TYPES};
pub use template::{HostConfig, SharedHosts, UrlTemplate};
pub use traits::BackendAdapter;
pub use web::WebStoreAdapter;
