//! Chat session state and turn wiring.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};

use inkstream_config::InkstreamConfig;
use inkstream_core::{
    Diagnostic, InkError, Message, SessionId, StreamHandler, StreamRequest, TurnOutcome,
};
use inkstream_stream::{HttpTransport, StreamIngestor, Transport};
use inkstream_typewriter::{PacingConfig, Typewriter};

/// Mutable state of one conversation.
#[derive(Debug, Default)]
struct SessionState {
    session_id: Option<SessionId>,
    /// Finalized messages, oldest first.
    messages: Vec<Message>,
    /// Text revealed so far in the current turn.
    streaming_text: String,
    streaming: bool,
    /// Bumped for every turn and by `new_session`; stale turns compare against it.
    turn: u64,
}

/// One conversation with the chat endpoint.
///
/// Each turn's response is paced through a [`Typewriter`] into
/// `streaming_text` and, once the stream ends, appended to the log as a
/// system message.
pub struct ChatSession<T = HttpTransport> {
    ingestor: StreamIngestor<T>,
    typewriter: Typewriter,
    state: Arc<Mutex<SessionState>>,
    text_tx: Arc<watch::Sender<String>>,
}

impl ChatSession<HttpTransport> {
    /// Build a session that talks HTTP to the configured endpoint.
    pub fn from_config(config: &InkstreamConfig) -> Result<Self, InkError> {
        let url = config
            .endpoint
            .url()
            .map_err(|e| InkError::Config(e.to_string()))?;
        let pacing = PacingConfig {
            max_delay: config.typewriter.max_delay(),
            budget: config.typewriter.budget(),
        };
        info!(
            url = %url,
            environment = ?config.endpoint.environment(),
            "Chat session configured"
        );
        Ok(Self::new(StreamIngestor::new(HttpTransport::new(url)), pacing))
    }
}

impl<T: Transport> ChatSession<T> {
    pub fn new(ingestor: StreamIngestor<T>, pacing: PacingConfig) -> Self {
        let state = Arc::new(Mutex::new(SessionState::default()));
        let (text_tx, _) = watch::channel(String::new());
        let text_tx = Arc::new(text_tx);

        let typewriter = {
            let state = Arc::clone(&state);
            let text_tx = Arc::clone(&text_tx);
            Typewriter::with_config(pacing, move |s: &str| {
                if s.is_empty() {
                    return;
                }
                let mut state = lock(&state);
                state.streaming_text.push_str(s);
                text_tx.send_replace(state.streaming_text.clone());
            })
        };

        Self {
            ingestor,
            typewriter,
            state,
            text_tx,
        }
    }

    pub fn ingestor(&self) -> &StreamIngestor<T> {
        &self.ingestor
    }

    /// Run one turn. Creates the session id on first use.
    ///
    /// Returns [`InkError::TurnInFlight`] if a turn is already streaming.
    /// Dropping the returned future ends the turn: the user message stays,
    /// pending text is discarded and the session accepts the next turn.
    pub async fn stream(&self, mut request: StreamRequest) -> Result<TurnOutcome, InkError> {
        let (session_id, turn) = {
            let mut state = lock(&self.state);
            if state.streaming {
                return Err(InkError::TurnInFlight);
            }
            state.streaming = true;
            state.turn += 1;
            let id = *state.session_id.get_or_insert_with(|| {
                let id = SessionId::generate();
                info!(session_id = %id, "Created session");
                id
            });
            (id, state.turn)
        };
        request.session_id = Some(session_id);

        let _guard = TurnGuard {
            typewriter: &self.typewriter,
            state: &self.state,
            text_tx: &self.text_tx,
            turn,
        };
        let mut handler = TurnHandler {
            typewriter: &self.typewriter,
            state: &self.state,
            text_tx: &self.text_tx,
            turn,
        };
        Ok(self.ingestor.stream(&request, &mut handler).await)
    }

    /// Start over: empty log, no pending text, fresh session id.
    ///
    /// A turn still in flight is detached; its remaining signals are ignored.
    pub fn new_session(&self) -> SessionId {
        self.typewriter.reset();
        let id = SessionId::generate();
        {
            let mut state = lock(&self.state);
            state.messages.clear();
            state.streaming_text.clear();
            state.streaming = false;
            state.turn += 1;
            state.session_id = Some(id);
        }
        self.text_tx.send_replace(String::new());
        info!(session_id = %id, "Started new session");
        id
    }

    pub fn session_id(&self) -> Option<SessionId> {
        lock(&self.state).session_id
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).messages.clone()
    }

    pub fn streaming_text(&self) -> String {
        lock(&self.state).streaming_text.clone()
    }

    pub fn is_streaming(&self) -> bool {
        lock(&self.state).streaming
    }

    /// Watch the text revealed in the current turn.
    pub fn subscribe_text(&self) -> watch::Receiver<String> {
        self.text_tx.subscribe()
    }
}

/// Lifecycle wiring for one turn.
///
/// Lock order is typewriter before session state: the typewriter consumer
/// takes the state lock, so the state lock is never held while calling it.
struct TurnHandler<'a> {
    typewriter: &'a Typewriter,
    state: &'a Mutex<SessionState>,
    text_tx: &'a watch::Sender<String>,
    turn: u64,
}

impl TurnHandler<'_> {
    fn is_current(&self) -> bool {
        lock(self.state).turn == self.turn
    }
}

impl StreamHandler for TurnHandler<'_> {
    fn on_start(&mut self, prompt: &str) {
        let mut state = lock(self.state);
        if state.turn != self.turn {
            return;
        }
        state.streaming = true;
        state.messages.push(Message::user(prompt));
    }

    fn on_first_content(&mut self) {
        if self.is_current() {
            self.typewriter.start();
        }
    }

    fn on_chunk(&mut self, text: &str) {
        if self.is_current() {
            self.typewriter.add(text);
        }
    }

    fn on_done(&mut self) {
        if !self.is_current() {
            debug!(turn = self.turn, "Ignoring end of a detached turn");
            return;
        }
        self.typewriter.done();
        {
            let mut state = lock(self.state);
            if state.turn != self.turn {
                return;
            }
            state.streaming = false;
            let content = std::mem::take(&mut state.streaming_text);
            state.messages.push(Message::system(content));
        }
        self.text_tx.send_replace(String::new());
    }

    fn on_diagnostic(&mut self, diagnostic: Diagnostic) {
        debug!(?diagnostic, "Turn diagnostic");
    }
}

/// Ends the turn when `stream` returns or its future is dropped.
///
/// A turn that never reached `on_done` loses its pending text; the user
/// message stays in the log.
struct TurnGuard<'a> {
    typewriter: &'a Typewriter,
    state: &'a Mutex<SessionState>,
    text_tx: &'a watch::Sender<String>,
    turn: u64,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        {
            let state = lock(self.state);
            if state.turn != self.turn || !state.streaming {
                return;
            }
        }
        self.typewriter.reset();
        {
            let mut state = lock(self.state);
            if state.turn != self.turn {
                return;
            }
            state.streaming = false;
            state.streaming_text.clear();
        }
        self.text_tx.send_replace(String::new());
        info!(turn = self.turn, "Turn ended without a reply");
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
