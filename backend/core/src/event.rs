use serde::{Deserialize, Serialize};

/// Lifecycle signals of one streamed turn, in the order they are emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The request is about to be sent.
    Start { prompt: String },
    /// The first complete frame of the response was parsed.
    FirstContent,
    /// A non-empty `content` value, in stream order.
    Chunk(String),
    /// The response body ended.
    Done,
}

/// Non-fatal problems observed while streaming. Reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    TransportFailed { reason: String },
    MalformedFrame { payload: String, error: String },
    ReadFailed { reason: String },
}

/// How a call to the ingestor ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The body was read to the end and `Done` fired.
    Completed { chunks: usize },
    /// No readable body; only `Start` fired.
    Abandoned,
}

impl std::fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamEvent::Start { .. } => write!(f, "start"),
            StreamEvent::FirstContent => write!(f, "first_content"),
            StreamEvent::Chunk(_) => write!(f, "chunk"),
            StreamEvent::Done => write!(f, "done"),
        }
    }
}
