//! In-process JSON-RPC backend used by the integration tests
//!
//! Serves the handful of methods the lightning backend exposes, plus a few
//! that exist only to provoke failures:
//! - `echo(text)` answers `text`
//! - `authenticate(jwt)`, `cancel_feed{feed_id}` answer `"ok"`
//! - `select_feed{feed_type}` answers `1` and then pushes one `feed` notification
//! - `create_invoice{amount_requested}` answers invoice `42` for that amount
//! - `hang` never answers
//! - `drop` closes the socket without answering
//! - anything else answers error `-32601`

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_tungstenite::tungstenite::Message;
use tracing::*;

pub struct EchoServer {
    address: SocketAddr,
    accepted: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl EchoServer {
    pub async fn start() -> std::io::Result<EchoServer> {
        let socket = TcpListener::bind("127.0.0.1:0").await?;
        let address = socket.local_addr()?;
        let accepted = Arc::new(AtomicUsize::new(0));

        let handle = tokio::spawn({
            let accepted = Arc::clone(&accepted);
            async move {
                while let Ok((tcp_stream, _addr)) = socket.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        if let Err(error) = serve(tcp_stream).await {
                            debug!("connection ended: {}", error);
                        }
                    });
                }
            }
        });

        Ok(EchoServer {
            address,
            accepted,
            handle,
        })
    }

    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// Number of WebSocket connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    tcp_stream: tokio::net::TcpStream,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let (mut outgoing, mut incoming) = tokio_tungstenite::accept_async(tcp_stream).await?.split();

    while let Some(message) = incoming.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Ping(payload) => {
                outgoing.send(Message::Pong(payload)).await?;
                continue;
            }
            Message::Close(_) => break,
            _ => continue,
        };

        let Ok(request) = serde_json::from_str::<Value>(&text) else {
            let response = error(Value::Null, -32700, "Failed to parse the json request");
            outgoing.send(Message::Text(response.to_string())).await?;
            continue;
        };

        let id = request["id"].clone();
        let params = &request["params"];

        let response = match request["method"].as_str() {
            Some("echo") => result(id, params[0].clone()),
            Some("authenticate") | Some("cancel_feed") => result(id, json!("ok")),
            Some("select_feed") => {
                outgoing.send(Message::Text(result(id, json!(1)).to_string())).await?;
                json!({
                    "jsonrpc": "2.0",
                    "method": "feed",
                    "params": {"feed_id": 1, "feed": [{"invoice_id": 42, "status": "paid"}]}
                })
            }
            Some("create_invoice") => result(
                id,
                json!({
                    "invoice_id": 42,
                    "encoded_invoice": "lnbc1echoserver",
                    "amount_requested": params["amount_requested"],
                    "exchange_rate": 3500,
                    "expired_at": 1_700_003_600
                }),
            ),
            Some("hang") => continue,
            Some("drop") => return Ok(()),
            _ => error(id, -32601, "method not found"),
        };

        outgoing.send(Message::Text(response.to_string())).await?;
    }

    Ok(())
}

fn result(id: Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "result": result, "id": id})
}

fn error(id: Value, code: i64, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "error": {"code": code, "message": message}, "id": id})
}
