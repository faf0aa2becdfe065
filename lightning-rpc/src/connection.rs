use crate::{
    error::{ClientError, RpcError},
    messages::ClientMessage,
    protocol::{Id, Inbound, Notification, Params, Request, RoutingData},
    transport::{TransportChannels, TransportError, TransportEvent},
};
use flume::Sender;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::{oneshot, watch};
use tracing::*;

/// Lifecycle of an opened [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Open,
    Closed,
}

/// One logical link to the remote endpoint
///
/// Requests are correlated with responses by id, so any number of calls can be in flight at once
/// and each resolves only with its own response, whatever order those arrive in.
pub struct Connection {
    invocations: Invocations,
    notifications: Notifications,
    transport_handle: Sender<ClientMessage>,
    state: watch::Receiver<LinkState>,
}

type Completion = Result<Value, ClientError>;

#[derive(Default, Clone)]
pub(crate) struct Invocations {
    inner: Arc<Mutex<InvocationTable>>,
}

#[derive(Default)]
struct InvocationTable {
    pending: HashMap<Id, oneshot::Sender<Completion>>,
    closed: bool,
}

#[derive(Default, Clone)]
struct Notifications {
    subscribers: Arc<Mutex<Vec<Sender<Notification>>>>,
}

/// Consumes transport events on behalf of a [`Connection`].
pub(crate) struct TransportClientHandle {
    invocations: Invocations,
    notifications: Notifications,
}

/// Removes the pending entry if the call future is dropped before completion.
struct PendingGuard<'a> {
    invocations: &'a Invocations,
    id: &'a Id,
}

impl Connection {
    /// Wraps an open transport and starts dispatching its inbound events.
    pub(crate) fn spawn(channels: TransportChannels) -> Arc<Connection> {
        let TransportChannels { outbound, inbound } = channels;

        let invocations = Invocations::default();
        let notifications = Notifications::default();
        let (state_tx, state) = watch::channel(LinkState::Open);

        let handle = TransportClientHandle {
            invocations: invocations.clone(),
            notifications: notifications.clone(),
        };

        tokio::spawn(
            receive_events(inbound, handle, state_tx).instrument(debug_span!("connection")),
        );

        Arc::new(Connection {
            invocations,
            notifications,
            transport_handle: outbound,
            state,
        })
    }

    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state() == LinkState::Open
    }

    /// Resolves once the transport has closed.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        while *state.borrow() == LinkState::Open {
            if state.changed().await.is_err() {
                break;
            }
        }
    }

    /// Number of calls still waiting for a response.
    pub fn pending(&self) -> usize {
        self.invocations.lock().pending.len()
    }

    /// Sends a request and waits for the correlated response.
    pub async fn call(
        &self,
        method: impl ToString,
        params: impl Into<Params>,
    ) -> Result<Value, ClientError> {
        let id = Id::random();
        let request = Request::new(method, params.into(), id.clone());
        let message = ClientMessage::json(&request).map_err(ClientError::malformed_request)?;

        self.invoke(id, message).await
    }

    /// Sends a notification; no response is expected.
    pub async fn notify(
        &self,
        method: impl ToString,
        params: impl Into<Params>,
    ) -> Result<(), ClientError> {
        let request = Request::notification(method, params.into());
        let message = ClientMessage::json(&request).map_err(ClientError::malformed_request)?;

        self.send_message(message).await
    }

    /// Server pushed requests and notifications, from now on.
    pub fn notifications(&self) -> flume::Receiver<Notification> {
        let (tx, rx) = flume::unbounded();
        let mut subscribers = self.notifications.lock();
        subscribers.retain(|subscriber| !subscriber.is_disconnected());
        subscribers.push(tx);
        rx
    }

    pub(crate) async fn invoke(
        &self,
        id: Id,
        message: ClientMessage,
    ) -> Result<Value, ClientError> {
        let rx = self.invocations.insert(id.clone())?;
        let _guard = PendingGuard {
            invocations: &self.invocations,
            id: &id,
        };

        self.send_message(message).await?;

        let completion = rx.await.map_err(|_| TransportError::Closed)?;

        event!(Level::DEBUG, %id, "response received");

        completion
    }

    pub(crate) async fn send_message(&self, message: ClientMessage) -> Result<(), ClientError> {
        self.transport_handle
            .send_async(message)
            .await
            .map_err(|_| TransportError::Closed)?;

        event!(Level::DEBUG, "message sent");

        Ok(())
    }
}

async fn receive_events(
    events: flume::Receiver<TransportEvent>,
    handle: TransportClientHandle,
    state: watch::Sender<LinkState>,
) {
    loop {
        match events.recv_async().await {
            Ok(TransportEvent::Message(message)) => handle.receive_messages(message),
            Ok(TransportEvent::Error(error)) => error!("transport error: {}", error),
            Ok(TransportEvent::Closed {
                clean,
                code,
                reason,
            }) => {
                if clean {
                    info!("connection close was clean");
                } else {
                    error!("connection suddenly closed");
                }
                info!(?code, reason = %reason, "connection closed");
                break;
            }
            Err(_) => {
                error!("transport stopped without closing");
                break;
            }
        }
    }

    let failed = handle.invocations.close();
    if failed > 0 {
        warn!(failed, "calls failed by closed connection");
    }

    state.send_replace(LinkState::Closed);
}

impl TransportClientHandle {
    pub(crate) fn receive_messages(&self, message: ClientMessage) {
        let value = match message.deserialize::<Value>() {
            Ok(value) => value,
            Err(error) => {
                warn!(%message, "malformed message ignored: {}", error);
                return;
            }
        };

        match value {
            Value::Array(batch) if batch.is_empty() => warn!("empty batch ignored"),
            Value::Array(batch) => batch.into_iter().for_each(|value| self.receive_message(value)),
            value => self.receive_message(value),
        }
    }

    fn receive_message(&self, value: Value) {
        let routing = match serde_json::from_value::<RoutingData>(value) {
            Ok(routing) => routing,
            Err(error) => {
                warn!("malformed message ignored: {}", error);
                return;
            }
        };

        match Inbound::from(routing) {
            Inbound::Response { id, outcome } => {
                self.receive_response(id, outcome.map_err(RpcError::from))
            }
            Inbound::Notification(notification) => self.receive_notification(notification),
            Inbound::Invalid(reason) => warn!("invalid message ignored: {}", reason),
        }
    }

    fn receive_response(&self, id: Option<Id>, outcome: Result<Value, RpcError>) {
        let Some(id) = id else {
            match outcome {
                Err(error) => warn!("received error without id: {}", error),
                Ok(_) => warn!("received response without id"),
            }
            return;
        };

        let Some(sender) = self.invocations.remove(&id) else {
            warn!(%id, "received response with unknown id");
            return;
        };

        if sender.send(outcome.map_err(ClientError::from)).is_err() {
            warn!(%id, "received response for a dropped invocation");
        }
    }

    fn receive_notification(&self, notification: Notification) {
        let mut subscribers = self.notifications.lock();
        subscribers.retain(|subscriber| subscriber.send(notification.clone()).is_ok());

        if subscribers.is_empty() {
            debug!(method = %notification.method, "notification without subscribers dropped");
        }
    }
}

impl Invocations {
    fn lock(&self) -> MutexGuard<'_, InvocationTable> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, id: Id) -> Result<oneshot::Receiver<Completion>, TransportError> {
        let mut table = self.lock();
        if table.closed {
            return Err(TransportError::Closed);
        }

        let (tx, rx) = oneshot::channel();
        table.pending.insert(id, tx);
        Ok(rx)
    }

    fn remove(&self, id: &Id) -> Option<oneshot::Sender<Completion>> {
        self.lock().pending.remove(id)
    }

    /// Fails every pending call and refuses new ones. Returns how many were failed.
    fn close(&self) -> usize {
        let pending = {
            let mut table = self.lock();
            table.closed = true;
            std::mem::take(&mut table.pending)
        };

        let failed = pending.len();
        for (_, sender) in pending {
            let _ = sender.send(Err(TransportError::Closed.into()));
        }

        failed
    }
}

impl Notifications {
    fn lock(&self) -> MutexGuard<'_, Vec<Sender<Notification>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.invocations.remove(self.id);
    }
}
