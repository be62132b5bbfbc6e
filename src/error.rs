use std::fmt;

/// Failure reported by a [`crate::transport::Transport`].
///
/// `Cancelled` is the expected way a stream ends after a local stop request;
/// everything else is terminal for the stream and surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Cancelled,
    Failed(String)
}

impl TransportError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Cancelled => write!(f, "stream cancelled by local request"),
            TransportError::Failed(msg) => write!(f, "stream failed: {}", msg)
        }
    }
}

impl std::error::Error for TransportError {}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> TransportError {
        TransportError::Failed(err.to_string())
    }
}

#[derive(Debug)]
pub enum InvestError {
    HttpError(String),
    JsonError(String),
    Transport(TransportError),
    InstrumentNotFound(String),
    InvalidRange(String),
    InvalidRequest(String),
    ExportError(String),
    StreamClosed
}

impl fmt::Display for InvestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            InvestError::JsonError(msg) => write!(f, "JSON parsing error: {}", msg),
            InvestError::Transport(err) => write!(f, "Transport error: {}", err),
            InvestError::InstrumentNotFound(id) => write!(f, "Instrument {} not found", id),
            InvestError::InvalidRange(msg) => write!(f, "Invalid time range: {}", msg),
            InvestError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            InvestError::ExportError(msg) => write!(f, "Export error: {}", msg),
            InvestError::StreamClosed => write!(f, "Stream is already closed")
        }
    }
}

impl std::error::Error for InvestError {}

impl From<TransportError> for InvestError {
    fn from(err: TransportError) -> InvestError {
        InvestError::Transport(err)
    }
}

impl From<serde_json::Error> for InvestError {
    fn from(err: serde_json::Error) -> InvestError {
        InvestError::JsonError(err.to_string())
    }
}

impl From<reqwest::Error> for InvestError {
    fn from(err: reqwest::Error) -> InvestError {
        InvestError::HttpError(err.to_string())
    }
}

impl From<anyhow::Error> for InvestError {
    fn from(err: anyhow::Error) -> InvestError {
        match err.downcast::<serde_json::Error>() {
            Ok(json) => InvestError::from(json),
            Err(other) => InvestError::HttpError(other.to_string())
        }
    }
}

impl From<csv::Error> for InvestError {
    fn from(err: csv::Error) -> InvestError {
        InvestError::ExportError(err.to_string())
    }
}

impl From<std::io::Error> for InvestError {
    fn from(err: std::io::Error) -> InvestError {
        InvestError::ExportError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_classification() {
        assert!(TransportError::Cancelled.is_cancelled());
        assert!(!TransportError::Failed("reset".to_string()).is_cancelled());
    }

    #[test]
    fn test_display() {
        let err = InvestError::from(TransportError::Failed("connection reset".to_string()));
        assert_eq!(
            err.to_string(),
            "Transport error: stream failed: connection reset"
        );
        assert_eq!(
            InvestError::InstrumentNotFound("BBG004730N88".to_string()).to_string(),
            "Instrument BBG004730N88 not found"
        );
    }

    #[test]
    fn test_anyhow_conversion_keeps_json_failures() {
        let decode = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = InvestError::from(anyhow::Error::from(decode));
        assert!(matches!(err, InvestError::JsonError(_)));

        let status = anyhow::anyhow!("API request failed with status 500: oops");
        match InvestError::from(status) {
            InvestError::HttpError(msg) => {
                assert_eq!(msg, "API request failed with status 500: oops")
            }
            other => panic!("unexpected error {:?}", other)
        }
    }
}
