use tokio::sync::mpsc;
use tracing::debug;

use crate::event::{Diagnostic, StreamEvent};

/// Receiver of the lifecycle signals of a streamed turn.
///
/// For one `stream` call the ingestor calls `on_start` once, then zero or more
/// `on_chunk`, and finally one `on_done` if the response produced a body.
/// `on_first_content` fires at most once, right after the chunks of the first
/// read that completed a line.
pub trait StreamHandler: Send {
    fn on_start(&mut self, prompt: &str);

    fn on_first_content(&mut self);

    fn on_chunk(&mut self, text: &str);

    fn on_done(&mut self);

    /// Optional hook for degraded-but-recovered conditions.
    fn on_diagnostic(&mut self, _diagnostic: Diagnostic) {}
}

/// Forwards every signal as a tagged event. A dropped receiver is ignored.
impl StreamHandler for mpsc::UnboundedSender<StreamEvent> {
    fn on_start(&mut self, prompt: &str) {
        forward(
            self,
            StreamEvent::Start {
                prompt: prompt.to_string(),
            },
        );
    }

    fn on_first_content(&mut self) {
        forward(self, StreamEvent::FirstContent);
    }

    fn on_chunk(&mut self, text: &str) {
        forward(self, StreamEvent::Chunk(text.to_string()));
    }

    fn on_done(&mut self) {
        forward(self, StreamEvent::Done);
    }
}

fn forward(tx: &mpsc::UnboundedSender<StreamEvent>, event: StreamEvent) {
    if tx.send(event).is_err() {
        debug!("Stream event receiver dropped");
    }
}
