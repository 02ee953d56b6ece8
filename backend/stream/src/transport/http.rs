use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use inkstream_core::{ChatRequestBody, InkError};

use super::{ByteStream, Transport};

/// Chat endpoint reached over HTTP with a single JSON `POST`.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn open(&self, body: &ChatRequestBody) -> Result<Option<ByteStream>, InkError> {
        debug!(url = %self.url, "Sending chat stream request");

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| InkError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            // The body is still read, as a browser fetch would.
            warn!(%status, url = %self.url, "Chat endpoint returned non-success status");
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| InkError::Read(e.to_string()));
        Ok(Some(Box::pin(stream)))
    }
}
