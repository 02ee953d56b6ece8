//! Typewriter: smooths bursty text arrival into a steady per-character reveal.

pub mod pacing;
pub mod typewriter;

pub use pacing::{pacing_delay, PacingConfig};
pub use typewriter::Typewriter;
