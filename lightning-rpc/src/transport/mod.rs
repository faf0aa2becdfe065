mod error;
#[cfg(test)]
pub(crate) mod testing;
mod websocket;

pub use self::{
    error::{ConnectionError, TransportError},
    websocket::WebSocketConnector,
};
use crate::messages::ClientMessage;
use async_trait::async_trait;

/// Opens transports to a remote endpoint.
///
/// An implementation owns whatever drives the underlying socket and talks to the
/// [`Connection`](crate::Connection) only through the returned channels.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Resolves once the transport is open, or fails if it errors before that.
    async fn connect(&self, endpoint: &str) -> Result<TransportChannels, ConnectionError>;
}

/// Both directions of an open transport.
pub struct TransportChannels {
    /// Frames to put on the wire, in order.
    pub outbound: flume::Sender<ClientMessage>,
    /// Frames and lifecycle events read from the wire, in delivery order.
    pub inbound: flume::Receiver<TransportEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Message(ClientMessage),
    Error(String),
    Closed {
        clean: bool,
        code: Option<u16>,
        reason: String,
    },
}

impl TransportEvent {
    pub fn clean_close() -> Self {
        TransportEvent::Closed {
            clean: true,
            code: Some(1000),
            reason: String::new(),
        }
    }

    pub fn sudden_close(reason: impl ToString) -> Self {
        TransportEvent::Closed {
            clean: false,
            code: None,
            reason: reason.to_string(),
        }
    }
}
