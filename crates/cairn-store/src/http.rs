//! [`ObjectBackend`] over a plain HTTP object service.
//!
//! The service exposes each object at `{base_url}/{key}`: `HEAD` tells
//! whether it exists, `GET` downloads it and `PUT` replaces it. An optional
//! bearer token is sent with every request to the service, downloads
//! included, so the backend doubles as the [`BinaryFetcher`] for its own
//! download URLs.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult, StoreError, StoreResult};
use crate::fetch::{BinaryFetcher, FetchResponse};
use crate::object::{ObjectBackend, UploadTask};

#[derive(Clone, Debug)]
pub struct HttpObjectBackend {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpObjectBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            bearer_token: None,
        }
    }

    /// Authenticate requests to the service with `token`.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// The URL an object lives at.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    fn owns(&self, url: &str) -> bool {
        url.strip_prefix(&self.base_url).is_some_and(|rest| rest.starts_with('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectBackend for HttpObjectBackend {
    async fn download_url(&self, key: &str) -> StoreResult<String> {
        let url = self.object_url(key);
        let response = self
            .authorize(self.client.head(&url))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(url),
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(StoreError::ObjectMissing {
                key: key.to_string(),
            }),
            status => Err(StoreError::Transport(format!(
                "probe of {key} returned {status}"
            ))),
        }
    }

    async fn upload(&self, key: &str, data: Bytes) -> UploadTask {
        let (reporter, task) = UploadTask::channel();
        let total = data.len() as u64;
        let request = self.authorize(self.client.put(self.object_url(key))).body(data);
        let key = key.to_string();

        tokio::spawn(async move {
            reporter.progress(0, total);
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(%key, bytes = total, "upload accepted");
                    reporter.progress(total, total);
                    reporter.complete();
                }
                Ok(response) => {
                    let status = response.status();
                    warn!(%key, %status, "upload rejected");
                    reporter.fail(StoreError::Upload(format!("{key}: server returned {status}")));
                }
                Err(e) => {
                    warn!(%key, error = %e, "upload transport failure");
                    reporter.fail(StoreError::Transport(e.to_string()));
                }
            }
        });

        task
    }
}

#[async_trait]
impl BinaryFetcher for HttpObjectBackend {
    /// Download `url`. The bearer token is attached only to URLs under the
    /// service's base URL.
    async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        let request = self.client.get(url);
        let request = if self.owns(url) {
            self.authorize(request)
        } else {
            request
        };
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(FetchResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use cairn_types::{AssetKey, AssetType, DataFormat};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::outcome::LoadOutcome;
    use crate::remote::RemoteObjectAdapter;
    use crate::traits::BackendAdapter;

    /// One request as seen by the local test server.
    #[derive(Clone, Debug)]
    struct Seen {
        method: String,
        path: String,
        authorization: Option<String>,
        body: Vec<u8>,
    }

    type Log = Arc<Mutex<Vec<Seen>>>;

    async fn read_request(socket: &mut TcpStream) -> Seen {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break buf.len();
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next().unwrap_or_default().split_whitespace();
        let method = request_line.next().unwrap_or_default().to_string();
        let path = request_line.next().unwrap_or_default().to_string();

        let mut authorization = None;
        let mut length = 0usize;
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                match name.trim().to_ascii_lowercase().as_str() {
                    "authorization" => authorization = Some(value.trim().to_string()),
                    "content-length" => length = value.trim().parse().unwrap_or(0),
                    _ => {}
                }
            }
        }

        let mut body = buf[header_end..].to_vec();
        while body.len() < length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }

        Seen {
            method,
            path,
            authorization,
            body,
        }
    }

    /// Start a one-response-per-connection HTTP server on a free local port.
    async fn serve(respond: fn(&Seen) -> (u16, &'static [u8])) -> (String, Log) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let log: Log = Arc::default();
        let seen = log.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                let (status, body) = respond(&request);
                let is_head = request.method == "HEAD";
                seen.lock().unwrap().push(request);

                let head = format!(
                    "HTTP/1.1 {status} X\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                if !is_head {
                    let _ = socket.write_all(body).await;
                }
                let _ = socket.shutdown().await;
            }
        });

        (base, log)
    }

    fn requests(log: &Log) -> Vec<Seen> {
        log.lock().unwrap().clone()
    }

    /// Serves `/bucket/abc.png` only to callers holding the token.
    fn protected(req: &Seen) -> (u16, &'static [u8]) {
        if req.authorization.as_deref() != Some("Bearer secret") {
            return (401, b"");
        }
        match req.path.as_str() {
            "/bucket/abc.png" => (200, b"PNG"),
            _ => (404, b""),
        }
    }

    fn bitmap(id: &str) -> AssetKey {
        AssetKey::new(AssetType::ImageBitmap, id, DataFormat::Png).unwrap()
    }

    // -----------------------------------------------------------------------
    // URL construction
    // -----------------------------------------------------------------------

    #[test]
    fn object_url_trims_trailing_slash() {
        let backend = HttpObjectBackend::new("https://objects.example/bucket/");
        assert_eq!(
            backend.object_url("abc.png"),
            "https://objects.example/bucket/abc.png"
        );
    }

    #[test]
    fn bearer_token_is_optional() {
        let backend = HttpObjectBackend::new("https://objects.example");
        assert!(backend.bearer_token.is_none());
        let backend = backend.with_bearer_token("secret");
        assert_eq!(backend.bearer_token.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let backend = HttpObjectBackend::new("http://127.0.0.1:9");
        let err = backend.download_url("a.png").await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));

        let err = backend
            .upload("a.png", Bytes::from_static(b"x"))
            .await
            .wait()
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[test]
    fn only_own_urls_are_authorized() {
        let backend = HttpObjectBackend::new("https://objects.example/bucket");
        assert!(backend.owns("https://objects.example/bucket/a.png"));
        assert!(!backend.owns("https://objects.example/bucketeer/a.png"));
        assert!(!backend.owns("https://cdn.example/bucket/a.png"));
    }

    // -----------------------------------------------------------------------
    // Probes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn probe_success_yields_object_url_and_sends_token() {
        let (base, log) = serve(protected).await;
        let backend = HttpObjectBackend::new(format!("{base}/bucket")).with_bearer_token("secret");

        let url = backend.download_url("abc.png").await.unwrap();
        assert_eq!(url, format!("{base}/bucket/abc.png"));

        let seen = requests(&log);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "HEAD");
        assert_eq!(seen[0].path, "/bucket/abc.png");
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret"));
    }

    #[tokio::test]
    async fn probe_status_classification() {
        fn by_path(req: &Seen) -> (u16, &'static [u8]) {
            match req.path.as_str() {
                "/missing.png" => (404, b""),
                "/gone.png" => (410, b""),
                _ => (500, b""),
            }
        }
        let (base, _log) = serve(by_path).await;
        let backend = HttpObjectBackend::new(base);

        for key in ["missing.png", "gone.png"] {
            let err = backend.download_url(key).await.unwrap_err();
            assert!(matches!(err, StoreError::ObjectMissing { key: ref k } if k == key));
        }
        let err = backend.download_url("broken.png").await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(ref m) if m.contains("500")));
    }

    // -----------------------------------------------------------------------
    // Uploads
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn accepted_upload_completes() {
        let (base, log) = serve(|_| (201, b"")).await;
        let backend = HttpObjectBackend::new(base).with_bearer_token("secret");

        backend
            .upload("abc.png", Bytes::from_static(b"PNGDATA"))
            .await
            .wait()
            .await
            .unwrap();

        let seen = requests(&log);
        assert_eq!(seen[0].method, "PUT");
        assert_eq!(seen[0].path, "/abc.png");
        assert_eq!(seen[0].body, b"PNGDATA");
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret"));
    }

    #[tokio::test]
    async fn rejected_upload_fails() {
        let (base, _log) = serve(|_| (403, b"")).await;
        let backend = HttpObjectBackend::new(base);

        let err = backend
            .upload("abc.png", Bytes::from_static(b"x"))
            .await
            .wait()
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Upload(ref m) if m.contains("403")));
    }

    // -----------------------------------------------------------------------
    // Downloads
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn download_carries_token() {
        let (base, _log) = serve(protected).await;
        let url = format!("{base}/bucket/abc.png");

        let with_token = HttpObjectBackend::new(format!("{base}/bucket")).with_bearer_token("secret");
        let response = with_token.get(&url).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), b"PNG");

        let without_token = HttpObjectBackend::new(format!("{base}/bucket"));
        assert_eq!(without_token.get(&url).await.unwrap().status, 401);
    }

    #[tokio::test]
    async fn token_is_not_sent_to_other_hosts() {
        let (other, log) = serve(|_| (200, b"elsewhere")).await;
        let backend =
            HttpObjectBackend::new("http://127.0.0.1:9/bucket").with_bearer_token("secret");

        let response = backend.get(&format!("{other}/bucket/abc.png")).await.unwrap();
        assert_eq!(response.body.as_ref(), b"elsewhere");
        assert_eq!(requests(&log)[0].authorization, None);
    }

    #[tokio::test]
    async fn remote_adapter_reads_protected_store() {
        let (base, _log) = serve(protected).await;
        let backend =
            Arc::new(HttpObjectBackend::new(format!("{base}/bucket")).with_bearer_token("secret"));
        let adapter = RemoteObjectAdapter::new(backend.clone(), backend);

        match adapter.load(&bitmap("abc")).await {
            LoadOutcome::Found(asset) => assert_eq!(asset.data().unwrap().as_ref(), b"PNG"),
            other => panic!("expected Found, got {other:?}"),
        }
        assert!(matches!(
            adapter.load(&bitmap("absent")).await,
            LoadOutcome::TransientError(StoreError::ObjectMissing { .. })
        ));
    }
}
