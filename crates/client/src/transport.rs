//! Part transport: `PUT` of one part's bytes to a signed URL.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream;
use partwise_protocol::constants::ETAG_HEADER;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tracing::trace;

use crate::{ClientError, ClientFuture};

/// Receives the absolute number of bytes of the current part sent so far.
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Sends part bytes to the object store.
pub trait PartTransport: Send + Sync {
    /// Uploads `body` to `url` and returns the storage identifier from the
    /// response, or `None` when the store sent none.
    ///
    /// `progress` is called with non-decreasing absolute byte counts for
    /// this attempt.
    fn put_part(
        &self,
        url: String,
        content_type: String,
        body: Bytes,
        progress: ProgressFn,
    ) -> ClientFuture<'_, Option<String>>;
}

/// [`PartTransport`] that streams the body in fixed-size slices so
/// progress can be observed while the request is in flight.
#[derive(Debug, Clone)]
pub struct HttpPartTransport {
    http: reqwest::Client,
    chunk_size: usize,
}

impl HttpPartTransport {
    pub fn new(chunk_size: usize) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            chunk_size: chunk_size.max(1),
        })
    }
}

/// Splits `body` into zero-copy slices of at most `chunk_size` bytes.
fn slices(body: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut out = Vec::with_capacity(body.len().div_ceil(chunk_size));
    let mut offset = 0;
    while offset < body.len() {
        let end = (offset + chunk_size).min(body.len());
        out.push(body.slice(offset..end));
        offset = end;
    }
    out
}

impl PartTransport for HttpPartTransport {
    fn put_part(
        &self,
        url: String,
        content_type: String,
        body: Bytes,
        progress: ProgressFn,
    ) -> ClientFuture<'_, Option<String>> {
        Box::pin(async move {
            let total = body.len() as u64;
            let mut sent = 0u64;
            let chunks = stream::iter(slices(&body, self.chunk_size).into_iter().map(move |chunk| {
                sent += chunk.len() as u64;
                progress(sent);
                Ok::<_, std::io::Error>(chunk)
            }));

            let resp = self
                .http
                .put(&url)
                .header(CONTENT_TYPE, content_type)
                .header(CONTENT_LENGTH, total)
                .body(reqwest::Body::wrap_stream(chunks))
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ClientError::Storage {
                    status: status.as_u16(),
                    body,
                });
            }

            let etag = resp
                .headers()
                .get(ETAG_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            trace!(bytes = total, has_etag = etag.is_some(), "part stored");
            Ok(etag)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_http::serve_once;
    use std::sync::Mutex;

    fn recorder() -> (ProgressFn, Arc<Mutex<Vec<u64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressFn = Arc::new(move |n| sink.lock().unwrap().push(n));
        (progress, seen)
    }

    #[test]
    fn slices_cover_body() {
        let body = Bytes::from_static(b"0123456789");
        let parts = slices(&body, 4);
        assert_eq!(parts.len(), 3);
        assert_eq!(&parts[2][..], b"89");
        assert!(slices(&Bytes::new(), 4).is_empty());
    }

    #[tokio::test]
    async fn put_returns_etag_and_reports_progress() {
        let (url, handle) = serve_once(200, &[("ETag", "\"abc123\"")], "").await;
        let (progress, seen) = recorder();

        let transport = HttpPartTransport::new(4).unwrap();
        let etag = transport
            .put_part(url, "video/mp4".into(), Bytes::from_static(b"0123456789"), progress)
            .await
            .unwrap();
        assert_eq!(etag.as_deref(), Some("\"abc123\""));

        let req = handle.await.unwrap();
        assert_eq!(req.method, "PUT");
        assert_eq!(req.header("content-type"), Some("video/mp4"));
        assert_eq!(req.body, b"0123456789");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&10));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn missing_etag_is_none() {
        let (url, handle) = serve_once(200, &[], "").await;
        let (progress, _) = recorder();

        let etag = HttpPartTransport::new(1024)
            .unwrap()
            .put_part(url, "application/octet-stream".into(), Bytes::from_static(b"xy"), progress)
            .await
            .unwrap();
        assert!(etag.is_none());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn storage_rejection_is_error() {
        let (url, handle) = serve_once(403, &[], "SignatureDoesNotMatch").await;
        let (progress, _) = recorder();

        let err = HttpPartTransport::new(1024)
            .unwrap()
            .put_part(url, "application/octet-stream".into(), Bytes::from_static(b"xy"), progress)
            .await
            .unwrap_err();
        match err {
            ClientError::Storage { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("SignatureDoesNotMatch"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        handle.abort();
    }
}
