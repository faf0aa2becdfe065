use std::sync::Arc;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur while opening a connection
///
/// Cloneable, since every caller waiting on the same opening attempt receives it.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    #[error("invalid endpoint url {0}")]
    Url(String),
    #[error("WebSocket error: {source}")]
    Websocket { source: Arc<tungstenite::Error> },
    #[error("transport closed before the connection was open")]
    ClosedDuringOpen,
}

impl From<tungstenite::Error> for ConnectionError {
    fn from(error: tungstenite::Error) -> Self {
        ConnectionError::Websocket {
            source: Arc::new(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed before a response was received")]
    Closed,
    #[error("WebSockets error")]
    Websocket {
        #[from]
        source: tungstenite::Error,
    },
}
