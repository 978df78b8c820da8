//! HTTP transport for the chat backend.
//!
//! The backend exposes three endpoints:
//!
//! - `POST /chat/stream`: streaming reply, one `data: <json>` line per event
//! - `POST /chat`: non-streaming reply as a single JSON object
//! - `GET /`: health check
//!
//! [`ChatTransport`] is the seam the turn loop talks to; [`HttpChatClient`] is
//! the reqwest implementation.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::BackendConfig;
use crate::error::{ChatError, Result};
use crate::stream;

/// Raw response body as it arrives from the network.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Request body shared by the chat endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User message content.
    pub message: String,
    /// Thread the message belongs to.
    pub thread_id: String,
}

/// Reply from the non-streaming chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Full assistant reply.
    pub message: String,
    /// Thread the reply belongs to.
    pub thread_id: String,
}

/// Reply from the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Human-readable status line.
    pub message: String,
    /// Machine-readable status, `healthy` when up.
    pub status: String,
}

impl HealthStatus {
    /// Whether the backend reported itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Something that can open a streaming chat response.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one chat request and return the response body stream.
    ///
    /// Implementations fail here for connection errors and non-success
    /// statuses; errors while reading the body come through the stream.
    async fn open_stream(&self, req: &ChatRequest) -> Result<ByteStream>;

    /// Send one chat request and wait for the whole reply.
    ///
    /// The default reads the streaming response to its end.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatReply> {
        let body = self.open_stream(req).await?;
        let message = stream::collect_reply(stream::events(body)).await?;
        Ok(ChatReply {
            message,
            thread_id: req.thread_id.clone(),
        })
    }
}

/// HTTP client for the chat backend.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: Url,
    stream_path: String,
    chat_path: String,
}

impl HttpChatClient {
    /// Create a client from backend settings.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(config: &BackendConfig, http: reqwest::Client) -> Result<Self> {
        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            stream_path: config.stream_path.clone(),
            chat_path: config.chat_path.clone(),
        })
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Query the backend health endpoint.
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.http.get(self.url("/")?).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpChatClient {
    async fn open_stream(&self, req: &ChatRequest) -> Result<ByteStream> {
        let url = self.url(&self.stream_path)?;
        tracing::debug!(url = %url, thread_id = %req.thread_id, "Opening chat stream");

        let response = self.http.post(url).json(req).send().await?;
        let response = check_status(response).await?;

        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(ChatError::from)),
        ))
    }

    async fn chat(&self, req: &ChatRequest) -> Result<ChatReply> {
        let response = self
            .http
            .post(self.url(&self.chat_path)?)
            .json(req)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".into());
    Err(ChatError::Status {
        status: status.as_u16(),
        body,
    })
}
