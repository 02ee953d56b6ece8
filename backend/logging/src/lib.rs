//! Structured logging for inkstream.
//!
//! Console output plus an optional NDJSON rolling file, with `RUST_LOG` control.

pub mod logger;

pub use logger::{init_from_config, init_logger, LOG_FILE_PREFIX};
