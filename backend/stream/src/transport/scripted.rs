use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};

use inkstream_core::{ChatRequestBody, InkError};

use super::{ByteStream, Transport};

/// How a scripted body ends after its reads are delivered.
#[derive(Debug, Clone)]
enum Ending {
    Close,
    Stall,
    Fail(String),
}

#[derive(Debug, Clone)]
enum Script {
    Body { reads: Vec<Bytes>, ending: Ending },
    NoBody,
    Refuse(String),
}

/// A transport that replays canned reads. Used to drive turns without a server.
pub struct ScriptedTransport {
    script: Script,
    requests: Mutex<Vec<ChatRequestBody>>,
}

impl ScriptedTransport {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Deliver each element as one read, then close the body.
    pub fn reads<I, B>(reads: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::with_script(Script::Body {
            reads: reads.into_iter().map(Into::into).collect(),
            ending: Ending::Close,
        })
    }

    /// Deliver the reads, then never resolve again.
    pub fn stalled<I, B>(reads: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::with_script(Script::Body {
            reads: reads.into_iter().map(Into::into).collect(),
            ending: Ending::Stall,
        })
    }

    /// Deliver the reads, then fail the next one.
    pub fn failing_after<I, B>(reads: I, reason: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::with_script(Script::Body {
            reads: reads.into_iter().map(Into::into).collect(),
            ending: Ending::Fail(reason.into()),
        })
    }

    /// Respond without a readable body.
    pub fn no_body() -> Self {
        Self::with_script(Script::NoBody)
    }

    /// Fail before any response arrives.
    pub fn refused(reason: impl Into<String>) -> Self {
        Self::with_script(Script::Refuse(reason.into()))
    }

    /// Request bodies received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequestBody> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, body: &ChatRequestBody) -> Result<Option<ByteStream>, InkError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(body.clone());

        let (reads, ending) = match &self.script {
            Script::Refuse(reason) => return Err(InkError::Transport(reason.clone())),
            Script::NoBody => return Ok(None),
            Script::Body { reads, ending } => (reads.clone(), ending.clone()),
        };

        let head = stream::iter(reads.into_iter().map(Ok));
        let tail: ByteStream = match ending {
            Ending::Close => Box::pin(stream::empty()),
            Ending::Stall => Box::pin(stream::pending()),
            Ending::Fail(reason) => Box::pin(stream::once(async move { Err(InkError::Read(reason)) })),
        };
        Ok(Some(Box::pin(head.chain(tail))))
    }
}
