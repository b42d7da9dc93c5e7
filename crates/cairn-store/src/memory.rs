//! In-memory object backend for tests and embedding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{FetchError, FetchResult, StoreError, StoreResult};
use crate::fetch::{BinaryFetcher, FetchResponse};
use crate::object::{ObjectBackend, UploadTask};

const SCHEME: &str = "memory://";

/// HashMap-based [`ObjectBackend`] that also serves its own download URLs.
///
/// Download URLs have the form `memory://{bucket}/{key}` and are answered by
/// the [`BinaryFetcher`] impl on the same value, so a single
/// `Arc<InMemoryObjectBackend>` can play both roles. Failures can be
/// injected for URL resolution, fetches, and uploads, and every call is
/// counted.
pub struct InMemoryObjectBackend {
    bucket: String,
    objects: RwLock<HashMap<String, Bytes>>,
    upload_failure: RwLock<Option<StoreError>>,
    resolve_failure: RwLock<Option<StoreError>>,
    forced_status: RwLock<Option<u16>>,
    resolutions: AtomicUsize,
    fetches: AtomicUsize,
    uploads: AtomicUsize,
}

impl InMemoryObjectBackend {
    /// Create an empty backend named `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
            upload_failure: RwLock::new(None),
            resolve_failure: RwLock::new(None),
            forced_status: RwLock::new(None),
            resolutions: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
        }
    }

    /// Put an object directly, bypassing the upload path.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(key.into(), data.into());
    }

    /// Read an object directly.
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.read().expect("lock poisoned").get(key).cloned()
    }

    /// Number of objects stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Make every subsequent upload fail with `err` (or succeed again with `None`).
    pub fn fail_uploads(&self, err: Option<StoreError>) {
        *self.upload_failure.write().expect("lock poisoned") = err;
    }

    /// Make every subsequent URL resolution fail with `err`.
    pub fn fail_url_resolution(&self, err: Option<StoreError>) {
        *self.resolve_failure.write().expect("lock poisoned") = err;
    }

    /// Answer every subsequent fetch with `status` and an empty body.
    pub fn force_fetch_status(&self, status: Option<u16>) {
        *self.forced_status.write().expect("lock poisoned") = status;
    }

    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    fn url_for(&self, key: &str) -> String {
        format!("{SCHEME}{}/{key}", self.bucket)
    }
}

impl Default for InMemoryObjectBackend {
    fn default() -> Self {
        Self::new("default")
    }
}

#[async_trait]
impl ObjectBackend for InMemoryObjectBackend {
    async fn download_url(&self, key: &str) -> StoreResult<String> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        let injected = self.resolve_failure.read().expect("lock poisoned").clone();
        if let Some(err) = injected {
            return Err(err);
        }
        if !self.objects.read().expect("lock poisoned").contains_key(key) {
            return Err(StoreError::ObjectMissing {
                key: key.to_string(),
            });
        }
        Ok(self.url_for(key))
    }

    async fn upload(&self, key: &str, data: Bytes) -> UploadTask {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let (reporter, task) = UploadTask::channel();
        let total = data.len() as u64;
        reporter.progress(0, total);

        let injected = self.upload_failure.read().expect("lock poisoned").clone();
        if let Some(err) = injected {
            reporter.fail(err);
            return task;
        }

        self.insert(key, data);
        reporter.progress(total, total);
        reporter.complete();
        task
    }
}

#[async_trait]
impl BinaryFetcher for InMemoryObjectBackend {
    async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let rest = url
            .strip_prefix(SCHEME)
            .ok_or_else(|| FetchError::UnsupportedScheme(url.to_string()))?;
        let (bucket, key) = rest.split_once('/').ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "missing object key".to_string(),
        })?;
        if bucket != self.bucket {
            return Err(FetchError::Transport(format!("unknown bucket {bucket}")));
        }
        let forced = *self.forced_status.read().expect("lock poisoned");
        if let Some(status) = forced {
            return Ok(FetchResponse::new(status, Bytes::new()));
        }
        match self.object(key) {
            Some(body) => Ok(FetchResponse::new(200, body)),
            None => Ok(FetchResponse::new(404, Bytes::new())),
        }
    }
}

impl std::fmt::Debug for InMemoryObjectBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectBackend")
            .field("bucket", &self.bucket)
            .field("object_count", &self.len())
            .finish()
    }
}
