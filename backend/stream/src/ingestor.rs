//! Stream ingestor: one request in, lifecycle events out.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use inkstream_core::{Diagnostic, StreamEvent, StreamHandler, StreamRequest, TurnOutcome};

use crate::frame::{Frame, FrameParser};
use crate::transport::{HttpTransport, Transport};

/// Drives one streamed turn per [`stream`](Self::stream) call.
///
/// Calls on the same ingestor must not overlap; each call owns its own buffer,
/// but interleaved turns would interleave their events at the handler.
pub struct StreamIngestor<T = HttpTransport> {
    transport: T,
}

impl<T: Transport> StreamIngestor<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` and feed the parsed response to `handler`.
    ///
    /// Transport failures and malformed frames are logged and reported through
    /// `on_diagnostic`; they never abort the caller.
    pub async fn stream<H>(&self, request: &StreamRequest, handler: &mut H) -> TurnOutcome
    where
        H: StreamHandler + ?Sized,
    {
        info!(
            transport = self.transport.name(),
            session_id = ?request.session_id.map(|id| id.to_string()),
            prompt_len = request.prompt.len(),
            "Starting turn"
        );
        handler.on_start(&request.prompt);

        let mut body = match self.transport.open(&request.to_body()).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                warn!(transport = self.transport.name(), "No readable response body; abandoning turn");
                return TurnOutcome::Abandoned;
            }
            Err(e) => {
                warn!(transport = self.transport.name(), error = %e, "Transport failed; abandoning turn");
                handler.on_diagnostic(Diagnostic::TransportFailed {
                    reason: e.to_string(),
                });
                return TurnOutcome::Abandoned;
            }
        };

        let mut parser = FrameParser::new();
        let mut first_content = false;
        let mut chunks = 0usize;

        while let Some(read) = body.next().await {
            let bytes = match read {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "Response read failed; ending turn");
                    handler.on_diagnostic(Diagnostic::ReadFailed {
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            let Some(frames) = parser.feed(&bytes) else {
                continue;
            };

            for frame in frames {
                match frame {
                    Frame::Content(text) => {
                        chunks += 1;
                        handler.on_chunk(&text);
                    }
                    Frame::Empty => {}
                    Frame::Malformed { payload, error } => {
                        warn!(%error, %payload, "Skipping malformed frame");
                        handler.on_diagnostic(Diagnostic::MalformedFrame { payload, error });
                    }
                }
            }

            // Signalled after the first complete cycle's chunks, once per turn.
            if !first_content {
                first_content = true;
                debug!("First complete read cycle processed");
                handler.on_first_content();
            }
        }

        let leftover = parser.into_remainder();
        if !leftover.is_empty() {
            debug!(len = leftover.len(), "Discarding unterminated trailing data");
        }

        handler.on_done();
        info!(chunks, "Turn complete");
        TurnOutcome::Completed { chunks }
    }
}

impl<T: Transport + 'static> StreamIngestor<T> {
    /// Run one turn on a spawned task and expose its signals as tagged events.
    pub fn events(self: Arc<Self>, request: StreamRequest) -> UnboundedReceiverStream<StreamEvent> {
        let (mut tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            self.stream(&request, &mut tx).await;
        });
        UnboundedReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use inkstream_core::SessionId;

    use crate::transport::ScriptedTransport;

    #[derive(Default)]
    struct Recorder {
        events: Vec<StreamEvent>,
        diagnostics: Vec<Diagnostic>,
    }

    impl Recorder {
        fn chunks(&self) -> Vec<&str> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    StreamEvent::Chunk(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, wanted: &StreamEvent) -> usize {
            self.events.iter().filter(|e| *e == wanted).count()
        }
    }

    impl StreamHandler for Recorder {
        fn on_start(&mut self, prompt: &str) {
            self.events.push(StreamEvent::Start {
                prompt: prompt.to_string(),
            });
        }
        fn on_first_content(&mut self) {
            self.events.push(StreamEvent::FirstContent);
        }
        fn on_chunk(&mut self, text: &str) {
            self.events.push(StreamEvent::Chunk(text.to_string()));
        }
        fn on_done(&mut self) {
            self.events.push(StreamEvent::Done);
        }
        fn on_diagnostic(&mut self, diagnostic: Diagnostic) {
            self.diagnostics.push(diagnostic);
        }
    }

    async fn run(transport: ScriptedTransport) -> (TurnOutcome, Recorder) {
        let ingestor = StreamIngestor::new(transport);
        let mut rec = Recorder::default();
        let outcome = ingestor.stream(&StreamRequest::new("hello"), &mut rec).await;
        (outcome, rec)
    }

    #[tokio::test]
    async fn test_empty_content_is_not_emitted() {
        let (outcome, rec) = run(ScriptedTransport::reads([
            "data: {\"content\":\"Hi\"}\ndata: {\"content\":\"\"}\ndata: {\"content\":\" there\"}\n",
        ]))
        .await;

        assert_eq!(outcome, TurnOutcome::Completed { chunks: 2 });
        assert_eq!(
            rec.events,
            vec![
                StreamEvent::Start { prompt: "hello".into() },
                StreamEvent::Chunk("Hi".into()),
                StreamEvent::Chunk(" there".into()),
                StreamEvent::FirstContent,
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_first_content_fires_once_across_reads() {
        let (_, rec) = run(ScriptedTransport::reads([
            "data: {\"content\":\"a\"}\n",
            "data: {\"content\":\"b\"}\n",
            "data: {\"content\":\"c\"}\n",
        ]))
        .await;
        assert_eq!(rec.count(&StreamEvent::FirstContent), 1);
        assert_eq!(rec.events[1], StreamEvent::Chunk("a".into()));
        assert_eq!(rec.events[2], StreamEvent::FirstContent);
        assert_eq!(rec.chunks(), vec!["a", "b", "c"]);
        assert_eq!(rec.count(&StreamEvent::Done), 1);
    }

    #[tokio::test]
    async fn test_split_reads_match_unsplit() {
        let body = "data: {\"content\":\"caf\u{e9} \"}\ndata: {\"content\":\"\u{4e16}\u{754c}\"}\n";
        let bytes = body.as_bytes().to_vec();
        let (_, whole) = run(ScriptedTransport::reads([bytes.clone()])).await;

        // Split inside the two-byte "é" and inside the second frame's JSON.
        let e_start = body.find('\u{e9}').unwrap();
        let json_mid = body.rfind("content").unwrap();
        let parts = vec![
            bytes[..e_start + 1].to_vec(),
            bytes[e_start + 1..json_mid].to_vec(),
            bytes[json_mid..].to_vec(),
        ];
        let (_, split) = run(ScriptedTransport::reads(parts)).await;

        assert_eq!(whole.chunks(), vec!["caf\u{e9} ", "\u{4e16}\u{754c}"]);
        assert_eq!(split.chunks(), whole.chunks());
    }

    #[tokio::test]
    async fn test_malformed_frame_is_reported_and_skipped() {
        let (outcome, rec) = run(ScriptedTransport::reads([
            "data: {\"content\":\"one\"}\ndata: {not json}\ndata: {\"content\":\"two\"}\n",
        ]))
        .await;
        assert_eq!(outcome, TurnOutcome::Completed { chunks: 2 });
        assert_eq!(rec.chunks(), vec!["one", "two"]);
        assert!(matches!(
            rec.diagnostics.as_slice(),
            [Diagnostic::MalformedFrame { payload, .. }] if payload == "{not json}"
        ));
    }

    #[tokio::test]
    async fn test_trailing_partial_frame_is_discarded() {
        let (_, rec) = run(ScriptedTransport::reads([
            "data: {\"content\":\"kept\"}\ndata: {\"content\":\"lost\"}",
        ]))
        .await;
        assert_eq!(rec.chunks(), vec!["kept"]);
        assert_eq!(rec.events.last(), Some(&StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_first_content_fires_for_cycle_without_chunks() {
        let (_, rec) = run(ScriptedTransport::reads([
            "data: {\"content\":\"\"}\n",
            "data: {\"content\":\"late\"}\n",
        ]))
        .await;
        assert_eq!(
            rec.events,
            vec![
                StreamEvent::Start { prompt: "hello".into() },
                StreamEvent::FirstContent,
                StreamEvent::Chunk("late".into()),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_body_without_newline_never_fires_first_content() {
        let (outcome, rec) = run(ScriptedTransport::reads(["data: {\"content\":\"x\"}"])).await;
        assert_eq!(outcome, TurnOutcome::Completed { chunks: 0 });
        assert_eq!(
            rec.events,
            vec![StreamEvent::Start { prompt: "hello".into() }, StreamEvent::Done]
        );
    }

    #[tokio::test]
    async fn test_no_body_abandons_after_start() {
        let (outcome, rec) = run(ScriptedTransport::no_body()).await;
        assert_eq!(outcome, TurnOutcome::Abandoned);
        assert_eq!(rec.events, vec![StreamEvent::Start { prompt: "hello".into() }]);
        assert!(rec.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_silent() {
        let (outcome, rec) = run(ScriptedTransport::refused("connection refused")).await;
        assert_eq!(outcome, TurnOutcome::Abandoned);
        assert_eq!(rec.events.len(), 1);
        assert_eq!(
            rec.diagnostics,
            vec![Diagnostic::TransportFailed {
                reason: "transport error: connection refused".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_read_error_closes_turn() {
        let (outcome, rec) = run(ScriptedTransport::failing_after(
            ["data: {\"content\":\"partial\"}\n"],
            "reset by peer",
        ))
        .await;
        assert_eq!(outcome, TurnOutcome::Completed { chunks: 1 });
        assert_eq!(rec.chunks(), vec!["partial"]);
        assert_eq!(rec.events.last(), Some(&StreamEvent::Done));
        assert!(matches!(rec.diagnostics.as_slice(), [Diagnostic::ReadFailed { .. }]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_body_never_fires_done() {
        let ingestor = StreamIngestor::new(ScriptedTransport::stalled(["data: {\"content\":\"a\"}\n"]));
        let mut rec = Recorder::default();
        let result = tokio::time::timeout(
            Duration::from_secs(30),
            ingestor.stream(&StreamRequest::new("hello"), &mut rec),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(rec.chunks(), vec!["a"]);
        assert_eq!(rec.count(&StreamEvent::Done), 0);
    }

    #[tokio::test]
    async fn test_request_body_carries_session() {
        let id = SessionId::generate();
        let ingestor = StreamIngestor::new(ScriptedTransport::reads(Vec::<&'static str>::new()));
        let mut rec = Recorder::default();
        let request = StreamRequest::new("hi").with_session(id).with_topic("greetings");
        ingestor.stream(&request, &mut rec).await;

        let sent = ingestor.transport().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_message, "hi");
        assert_eq!(sent[0].session_id.as_deref(), Some(id.to_string().as_str()));
        assert_eq!(sent[0].topic.as_deref(), Some("greetings"));
    }

    #[tokio::test]
    async fn test_events_stream_preserves_order() {
        let ingestor = Arc::new(StreamIngestor::new(ScriptedTransport::reads([
            "data: {\"content\":\"x\"}\n",
            "data: {\"content\":\"y\"}\n",
        ])));
        let events: Vec<StreamEvent> = ingestor.events(StreamRequest::new("go")).collect().await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Start { prompt: "go".into() },
                StreamEvent::Chunk("x".into()),
                StreamEvent::FirstContent,
                StreamEvent::Chunk("y".into()),
                StreamEvent::Done,
            ]
        );
    }
}
