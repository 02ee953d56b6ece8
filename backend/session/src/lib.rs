//! Chat session orchestration.
//!
//! Wires the stream ingestor's lifecycle to the typewriter and keeps the
//! message log, session id, and streaming state a UI reads from.

pub mod session;

pub use session::ChatSession;
