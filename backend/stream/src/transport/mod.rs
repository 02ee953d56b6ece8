pub mod http;
pub mod scripted;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use inkstream_core::{ChatRequestBody, InkError};

pub use http::HttpTransport;
pub use scripted::ScriptedTransport;

/// Response body as a sequence of raw reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, InkError>> + Send>>;

/// Sends the chat request and hands back the response body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logs (e.g., "http").
    fn name(&self) -> &str;

    /// Send the request. `Ok(None)` means the response carried no readable body.
    async fn open(&self, body: &ChatRequestBody) -> Result<Option<ByteStream>, InkError>;
}
