use thiserror::Error;

/// Top-level error type for the inkstream runtime.
#[derive(Debug, Error)]
pub enum InkError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("stream read error: {0}")]
    Read(String),

    #[error("a turn is already streaming for this session")]
    TurnInFlight,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InkError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "transport error: connection refused");
        assert_eq!(
            InkError::TurnInFlight.to_string(),
            "a turn is already streaming for this session"
        );
    }

    #[test]
    fn test_from_anyhow() {
        let err: InkError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, InkError::Other(_)));
        assert_eq!(err.to_string(), "boom");
    }
}
