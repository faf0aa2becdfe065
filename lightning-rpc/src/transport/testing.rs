use super::{ConnectionError, Connector, TransportChannels, TransportEvent};
use crate::messages::ClientMessage;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::Notify;

/// Channel-backed [`Connector`] handing the far end of every transport to the test.
#[derive(Clone)]
pub(crate) struct TestConnector {
    connects: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
    refuse: bool,
    remotes: flume::Sender<TestRemote>,
}

pub(crate) struct TestRemote {
    pub sent: flume::Receiver<ClientMessage>,
    pub events: flume::Sender<TransportEvent>,
}

impl TestConnector {
    pub fn new() -> (TestConnector, flume::Receiver<TestRemote>) {
        let (remotes, rx) = flume::unbounded();
        let connector = TestConnector {
            connects: Default::default(),
            gate: None,
            refuse: false,
            remotes,
        };
        (connector, rx)
    }

    /// Connects only after [`release`](TestConnector::release) is called.
    pub fn gated() -> (TestConnector, flume::Receiver<TestRemote>) {
        let (mut connector, rx) = Self::new();
        connector.gate = Some(Arc::new(Notify::new()));
        (connector, rx)
    }

    pub fn refusing() -> TestConnector {
        let (mut connector, _) = Self::new();
        connector.refuse = true;
        connector
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for TestConnector {
    async fn connect(&self, _endpoint: &str) -> Result<TransportChannels, ConnectionError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.refuse {
            return Err(ConnectionError::ClosedDuringOpen);
        }

        let (outbound, sent) = flume::unbounded();
        let (events, inbound) = flume::unbounded();
        let _ = self.remotes.send(TestRemote { sent, events });

        Ok(TransportChannels { outbound, inbound })
    }
}

impl TestRemote {
    pub async fn next_request(&self) -> Value {
        let message = tokio::time::timeout(Duration::from_secs(3), self.sent.recv_async())
            .await
            .expect("no request sent in time")
            .expect("connection dropped");
        message.deserialize().expect("request is not JSON")
    }

    pub fn push(&self, value: Value) {
        self.push_text(value.to_string());
    }

    pub fn push_text(&self, text: impl ToString) {
        self.events
            .send(TransportEvent::Message(ClientMessage::Json(text.to_string())))
            .expect("connection stopped listening");
    }

    pub fn close(&self) {
        let _ = self.events.send(TransportEvent::sudden_close("remote went away"));
    }

    /// Answers every request with its first positional argument.
    pub fn echo(self) {
        tokio::spawn(async move {
            while let Ok(message) = self.sent.recv_async().await {
                let Ok(request) = message.deserialize::<Value>() else {
                    continue;
                };
                let response = json!({
                    "jsonrpc": "2.0",
                    "result": request["params"][0],
                    "id": request["id"],
                });
                if self
                    .events
                    .send(TransportEvent::Message(ClientMessage::Json(response.to_string())))
                    .is_err()
                {
                    break;
                }
            }
        });
    }
}
