//! Typewriter release loop.
//!
//! Characters are queued by [`Typewriter::add`] and handed to the consumer one
//! at a time, with the gap between releases recomputed from the backlog before
//! every step. [`Typewriter::done`] ends pacing and flushes the rest at once.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::pacing::{pacing_delay, PacingConfig};

type Consumer = Box<dyn FnMut(&str) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No step scheduled.
    Idle,
    /// A step is scheduled or running.
    Active,
}

struct Inner {
    queue: VecDeque<char>,
    phase: Phase,
    /// Bumped by `done`/`reset` so a step that already woke up cannot deliver.
    generation: u64,
    timer: Option<JoinHandle<()>>,
    consumer: Consumer,
}

/// Paced emitter of queued characters.
///
/// The consumer runs while the queue lock is held, which keeps delivery in
/// order when `done` races a pending step. It must not call back into the same
/// `Typewriter`. The release loop runs on the ambient tokio runtime, so `add`
/// and `start` must be called from within one.
#[derive(Clone)]
pub struct Typewriter {
    inner: Arc<Mutex<Inner>>,
    config: PacingConfig,
}

impl Typewriter {
    pub fn new(consumer: impl FnMut(&str) + Send + 'static) -> Self {
        Self::with_config(PacingConfig::default(), consumer)
    }

    pub fn with_config(config: PacingConfig, consumer: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                queue: VecDeque::new(),
                phase: Phase::Idle,
                generation: 0,
                timer: None,
                consumer: Box::new(consumer),
            })),
            config,
        }
    }

    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Queue every character of `text`, starting the release loop if idle.
    pub fn add(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut inner = lock(&self.inner);
        inner.queue.extend(text.chars());
        self.start_locked(&mut inner);
    }

    /// Begin releasing queued characters. No-op while already active.
    pub fn start(&self) {
        let mut inner = lock(&self.inner);
        self.start_locked(&mut inner);
    }

    /// Stop pacing and deliver everything still queued as one string.
    ///
    /// Always calls the consumer, with an empty string if nothing is queued.
    pub fn done(&self) {
        let mut inner = lock(&self.inner);
        cancel(&mut inner);
        let rest: String = inner.queue.drain(..).collect();
        debug!(flushed = rest.chars().count(), "Typewriter done");
        (inner.consumer)(&rest);
    }

    /// Stop pacing and drop everything still queued without delivering it.
    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        cancel(&mut inner);
        let dropped = inner.queue.len();
        inner.queue.clear();
        debug!(dropped, "Typewriter reset");
    }

    /// Number of characters waiting to be released.
    pub fn pending(&self) -> usize {
        lock(&self.inner).queue.len()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.inner).phase == Phase::Active
    }

    fn start_locked(&self, inner: &mut Inner) {
        if inner.phase == Phase::Active {
            return;
        }
        inner.phase = Phase::Active;
        // The first character goes out immediately; later ones are paced.
        if let Some(delay) = step(inner, &self.config) {
            self.schedule(inner, delay);
        }
    }

    fn schedule(&self, inner: &mut Inner, first_delay: Duration) {
        let shared = Arc::clone(&self.inner);
        let config = self.config;
        let generation = inner.generation;

        inner.timer = Some(tokio::spawn(async move {
            let mut delay = first_delay;
            loop {
                tokio::time::sleep(delay).await;
                let next = {
                    let mut inner = lock(&shared);
                    if inner.generation != generation {
                        return;
                    }
                    let next = step(&mut inner, &config);
                    if next.is_none() {
                        inner.timer = None;
                    }
                    next
                };
                match next {
                    Some(d) => delay = d,
                    None => return,
                }
            }
        }));
    }
}

/// Release one character. Returns the delay before the next step, or `None`
/// once the queue is empty and the loop has gone idle.
fn step(inner: &mut Inner, config: &PacingConfig) -> Option<Duration> {
    let Some(ch) = inner.queue.pop_front() else {
        inner.phase = Phase::Idle;
        return None;
    };
    let mut buf = [0u8; 4];
    (inner.consumer)(ch.encode_utf8(&mut buf));

    if inner.queue.is_empty() {
        inner.phase = Phase::Idle;
        return None;
    }
    Some(pacing_delay(inner.queue.len(), config))
}

fn cancel(inner: &mut Inner) {
    inner.generation = inner.generation.wrapping_add(1);
    if let Some(timer) = inner.timer.take() {
        timer.abort();
    }
    inner.phase = Phase::Idle;
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
