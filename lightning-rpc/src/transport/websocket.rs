use super::{error::TransportError, ConnectionError, Connector, TransportChannels, TransportEvent};
use crate::messages::ClientMessage;
use async_trait::async_trait;
use futures::{select, FutureExt, SinkExt, StreamExt};
use std::fmt::Display;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    tungstenite::{client::IntoClientRequest, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::*;

type WebSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`Connector`] speaking text frames over a WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    buffer: usize,
}

impl WebSocketConnector {
    pub fn new() -> Self {
        WebSocketConnector { buffer: 100 }
    }

    /// Capacity of the channels between the socket pump and the connection.
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        WebSocketConnector::new()
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &str) -> Result<TransportChannels, ConnectionError> {
        let request = endpoint
            .into_client_request()
            .map_err(|_| ConnectionError::Url(endpoint.to_owned()))?;

        let (websocket, _) = tokio_tungstenite::connect_async(request).await?;

        let (outbound, messages_to_send) = flume::bounded::<ClientMessage>(self.buffer);
        let (events, inbound) = flume::bounded::<TransportEvent>(self.buffer);

        tokio::spawn(websocket_pump(websocket, messages_to_send, events));

        event!(Level::DEBUG, endpoint, "websocket open");

        Ok(TransportChannels { outbound, inbound })
    }
}

enum Incoming {
    Forward(ClientMessage),
    Close(TransportEvent),
    None,
}

pub(crate) async fn websocket_pump(
    mut websocket: WebSocket,
    messages_to_send: flume::Receiver<ClientMessage>,
    events: flume::Sender<TransportEvent>,
) {
    let mut messages_to_send = messages_to_send.into_stream().fuse();

    let closed = loop {
        let span = debug_span!("websocket");
        select! {
            to_send = messages_to_send.next() => {
                let Some(message) = to_send else {
                    debug!("connection dropped, closing websocket");
                    if let Err(error) = websocket.close(None).await {
                        incoming_message_error(error);
                    }
                    break TransportEvent::clean_close();
                };

                if let Err(error) = send_message(&mut websocket, message).instrument(span).await {
                    error!("{}", error);
                }
            },
            received = websocket.next().fuse() => {
                let message = match received {
                    Some(Ok(message)) => message,
                    Some(Err(error)) => {
                        incoming_message_error(&error);
                        let _ = events.send_async(TransportEvent::Error(error.to_string())).await;
                        break TransportEvent::sudden_close(error);
                    }
                    None => break TransportEvent::sudden_close("websocket stream ended"),
                };

                match incoming_message(&mut websocket, message).instrument(span).await {
                    Incoming::Forward(message) => {
                        if events.send_async(TransportEvent::Message(message)).await.is_err() {
                            debug!("connection dropped, closing websocket");
                            let _ = websocket.close(None).await;
                            break TransportEvent::clean_close();
                        }
                    }
                    Incoming::Close(event) => break event,
                    Incoming::None => {}
                }
            }
        }
    };

    let _ = events.send_async(closed).await;

    async fn send_message(
        websocket: &mut WebSocket,
        message: ClientMessage,
    ) -> Result<(), TransportError> {
        let text = message.into_text();
        event!(Level::TRACE, text = %text, "text message sent");
        websocket.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn incoming_message(websocket: &mut WebSocket, message: Message) -> Incoming {
        match message {
            Message::Text(text) => {
                event!(Level::TRACE, text = %text, "text message received");
                Incoming::Forward(ClientMessage::Json(text))
            }
            Message::Binary(bytes) => {
                warn!(length = bytes.len(), "binary message ignored");
                Incoming::None
            }
            Message::Ping(payload) => {
                if let Err(error) = websocket.send(Message::Pong(payload)).await {
                    error!("{}", error)
                }
                Incoming::None
            }
            Message::Pong(_) => Incoming::None,
            Message::Close(frame) => {
                let (code, reason) = match frame {
                    Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
                    None => (None, String::new()),
                };
                Incoming::Close(TransportEvent::Closed {
                    clean: true,
                    code,
                    reason,
                })
            }
            Message::Frame(_) => {
                /* apparently impossible to get while reading */
                Incoming::None
            }
        }
    }

    fn incoming_message_error(error: impl Display) {
        error!("error during reception of message: {}", error)
    }
}
