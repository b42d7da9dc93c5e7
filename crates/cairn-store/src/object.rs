//! The remote object backend port.
//!
//! Objects are named by [`AssetKey::storage_key`](cairn_types::AssetKey::storage_key).
//! Reads go through a time-limited download URL; writes are monitored
//! uploads that end in exactly one terminal signal.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{StoreError, StoreResult};

/// Binary object store holding the authoritative copy of written assets.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Resolve a URL from which the object can be downloaded.
    ///
    /// Fails with [`StoreError::ObjectMissing`] if no such object exists.
    async fn download_url(&self, key: &str) -> StoreResult<String>;

    /// Start uploading `data` under `key`. Failures are delivered through the
    /// returned task, never by panicking or dropping the task silently.
    async fn upload(&self, key: &str, data: Bytes) -> UploadTask;
}

/// A signal emitted by a running upload.
#[derive(Clone, Debug)]
pub enum UploadEvent {
    /// Bytes transferred so far. Informational only.
    Progress { transferred: u64, total: u64 },
    /// Terminal: the upload failed.
    Error(StoreError),
    /// Terminal: the backend accepted the object.
    Complete,
}

/// Receiving side of a monitored upload.
#[derive(Debug)]
pub struct UploadTask {
    events: mpsc::UnboundedReceiver<UploadEvent>,
}

impl UploadTask {
    /// A connected reporter/task pair.
    pub fn channel() -> (UploadReporter, UploadTask) {
        let (tx, rx) = mpsc::unbounded_channel();
        (UploadReporter { events: tx }, UploadTask { events: rx })
    }

    /// Wait for the first terminal signal. Progress events are skipped.
    ///
    /// If the reporter goes away without sending a terminal signal the
    /// upload is treated as failed: there is no partial success.
    pub async fn wait(mut self) -> StoreResult<()> {
        while let Some(event) = self.events.recv().await {
            match event {
                UploadEvent::Progress { transferred, total } => {
                    trace!(transferred, total, "upload progress");
                }
                UploadEvent::Error(err) => return Err(err),
                UploadEvent::Complete => return Ok(()),
            }
        }
        Err(StoreError::Upload(
            "upload ended without completing".to_string(),
        ))
    }
}

/// Sending side of a monitored upload, held by the backend.
#[derive(Clone, Debug)]
pub struct UploadReporter {
    events: mpsc::UnboundedSender<UploadEvent>,
}

impl UploadReporter {
    pub fn progress(&self, transferred: u64, total: u64) {
        // A dropped task means nobody is waiting; nothing to do.
        let _ = self.events.send(UploadEvent::Progress { transferred, total });
    }

    pub fn fail(self, err: StoreError) {
        let _ = self.events.send(UploadEvent::Error(err));
    }

    pub fn complete(self) {
        let _ = self.events.send(UploadEvent::Complete);
    }
}
