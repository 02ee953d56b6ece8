//! Chat stream ingestion.
//!
//! Sends a prompt to the chat endpoint and turns the `data: {json}\n` response
//! body into lifecycle events for a [`StreamHandler`](inkstream_core::StreamHandler).

pub mod decoder;
pub mod frame;
pub mod ingestor;
pub mod transport;

pub use decoder::Utf8StreamDecoder;
pub use frame::{parse_frames, Frame, FrameParser};
pub use ingestor::StreamIngestor;
pub use transport::{ByteStream, HttpTransport, ScriptedTransport, Transport};
