//! Control-plane client.
//!
//! All four actions share one endpoint; the `action` tag in the JSON body
//! selects the operation.

use std::time::Duration;

use partwise_protocol::{
    AbortUploadRequest, AbortUploadResponse, Action, CompleteUploadRequest,
    CompleteUploadResponse, ControlRequest, CreateSessionRequest, CreateSessionResponse,
    ErrorResponse, PresignPartRequest, PresignPartResponse,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{ClientError, ClientFuture};

/// The control-plane actions used by an upload session.
pub trait SessionClient: Send + Sync {
    /// Opens a multipart session and returns its storage key and upload id.
    fn create_session(&self, req: CreateSessionRequest) -> ClientFuture<'_, CreateSessionResponse>;

    /// Obtains a short-lived signed URL for one part.
    fn request_part_url(&self, req: PresignPartRequest) -> ClientFuture<'_, PresignPartResponse>;

    /// Finalizes the object from the ordered manifest.
    fn complete(&self, req: CompleteUploadRequest) -> ClientFuture<'_, CompleteUploadResponse>;

    /// Releases the session and its uploaded parts.
    fn abort(&self, req: AbortUploadRequest) -> ClientFuture<'_, AbortUploadResponse>;
}

/// [`SessionClient`] speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpSessionClient {
    /// Creates a client for `endpoint`. `timeout` bounds each call.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<R: DeserializeOwned>(&self, request: ControlRequest) -> Result<R, ClientError> {
        let action = request.action();
        request
            .validate()
            .map_err(|message| ClientError::InvalidRequest { action, message })?;

        debug!(%action, endpoint = %self.endpoint, "control-plane call");
        let resp = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(ClientError::Status {
                action,
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

fn require(action: Action, field: &'static str, value: &str) -> Result<(), ClientError> {
    if value.is_empty() {
        return Err(ClientError::MissingField { action, field });
    }
    Ok(())
}

impl SessionClient for HttpSessionClient {
    fn create_session(&self, req: CreateSessionRequest) -> ClientFuture<'_, CreateSessionResponse> {
        Box::pin(async move {
            let resp: CreateSessionResponse = self.call(ControlRequest::Create(req)).await?;
            require(Action::Create, "uploadId", &resp.upload_id)?;
            require(Action::Create, "key", &resp.key)?;
            Ok(resp)
        })
    }

    fn request_part_url(&self, req: PresignPartRequest) -> ClientFuture<'_, PresignPartResponse> {
        Box::pin(async move {
            let resp: PresignPartResponse = self.call(ControlRequest::Presign(req)).await?;
            require(Action::Presign, "url", &resp.url)?;
            Ok(resp)
        })
    }

    fn complete(&self, req: CompleteUploadRequest) -> ClientFuture<'_, CompleteUploadResponse> {
        Box::pin(self.call(ControlRequest::Complete(req)))
    }

    fn abort(&self, req: AbortUploadRequest) -> ClientFuture<'_, AbortUploadResponse> {
        Box::pin(self.call(ControlRequest::Abort(req)))
    }
}
