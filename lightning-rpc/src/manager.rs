use crate::{
    builder::ClientBuilder,
    connection::{Connection, LinkState},
    error::ClientError,
    invocation::InvocationBuilder,
    protocol::Params,
    transport::{ConnectionError, Connector},
};
use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::*;

type Opening = Shared<BoxFuture<'static, Result<Arc<Connection>, ConnectionError>>>;

/// Owns the single connection to the configured endpoint
///
/// The connection is opened lazily by the first call and reused by every call after it.
/// Callers arriving while it is still opening wait for that same attempt, so at most one
/// transport is ever created at a time. Cloning the manager shares the connection.
///
/// # Example
/// ```rust, no_run
/// use lightning_rpc::ConnectionManager;
/// use serde_json::json;
///
/// # async fn function() -> anyhow::Result<()> {
/// let manager = ConnectionManager::builder("localhost")
///     .use_port(8000)
///     .use_unencrypted_connection()
///     .build();
///
/// let echo = manager.call("echo", vec![json!("echo text 1939")]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    endpoint: String,
    connector: Arc<dyn Connector>,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    phase: PhaseSlot,
    attempts: u64,
}

#[derive(Default)]
enum PhaseSlot {
    #[default]
    Unopened,
    Connecting {
        attempt: u64,
        opening: Opening,
    },
    Open(Arc<Connection>),
}

/// Lifecycle phase as seen by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unopened,
    Connecting,
    Open,
    Closed,
}

impl ConnectionManager {
    pub fn builder(domain: impl ToString) -> ClientBuilder {
        ClientBuilder::new(domain)
    }

    pub(crate) fn new(endpoint: String, connector: Arc<dyn Connector>) -> Self {
        ConnectionManager {
            inner: Arc::new(ManagerInner {
                endpoint,
                connector,
                slot: Default::default(),
            }),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn phase(&self) -> Phase {
        match &self.inner.lock().phase {
            PhaseSlot::Unopened => Phase::Unopened,
            PhaseSlot::Connecting { .. } => Phase::Connecting,
            PhaseSlot::Open(connection) => match connection.state() {
                LinkState::Open => Phase::Open,
                LinkState::Closed => Phase::Closed,
            },
        }
    }

    /// Returns the connection, opening it first if needed.
    ///
    /// A closed connection stays memoized and keeps failing calls until
    /// [`reset`](ConnectionManager::reset).
    pub async fn connection(&self) -> Result<Arc<Connection>, ConnectionError> {
        let (attempt, opening) = {
            let mut slot = self.inner.lock();
            match &slot.phase {
                PhaseSlot::Open(connection) => return Ok(Arc::clone(connection)),
                PhaseSlot::Connecting { attempt, opening } => (*attempt, opening.clone()),
                PhaseSlot::Unopened => {
                    slot.attempts += 1;
                    let attempt = slot.attempts;
                    let opening = open(
                        Arc::clone(&self.inner.connector),
                        self.inner.endpoint.clone(),
                    )
                    .boxed()
                    .shared();

                    slot.phase = PhaseSlot::Connecting {
                        attempt,
                        opening: opening.clone(),
                    };
                    (attempt, opening)
                }
            }
        };

        let result = opening.await;

        let mut slot = self.inner.lock();
        let current = matches!(
            &slot.phase,
            PhaseSlot::Connecting { attempt: current, .. } if *current == attempt
        );
        if current {
            slot.phase = match &result {
                Ok(connection) => PhaseSlot::Open(Arc::clone(connection)),
                Err(_) => PhaseSlot::Unopened,
            };
        }

        result
    }

    /// Forgets the memoized connection; the next call opens a new one.
    pub fn reset(&self) {
        let previous = std::mem::take(&mut self.inner.lock().phase);
        if !matches!(previous, PhaseSlot::Unopened) {
            info!(endpoint = self.endpoint(), "connection reset");
        }
    }

    /// Calls `method` with `params` and waits for the result.
    pub async fn call(
        &self,
        method: impl ToString,
        params: impl Into<Params>,
    ) -> Result<Value, ClientError> {
        let connection = self.connection().await?;
        connection.call(method, params).await
    }

    /// Sends a notification, opening the connection if needed.
    pub async fn notify(
        &self,
        method: impl ToString,
        params: impl Into<Params>,
    ) -> Result<(), ClientError> {
        let connection = self.connection().await?;
        connection.notify(method, params).await
    }

    /// Starts building a call with typed arguments.
    pub fn method(&self, method: impl ToString) -> InvocationBuilder<'_> {
        InvocationBuilder::new(self, method)
    }
}

impl ManagerInner {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn open(
    connector: Arc<dyn Connector>,
    endpoint: String,
) -> Result<Arc<Connection>, ConnectionError> {
    event!(Level::DEBUG, endpoint = %endpoint, "opening connection");

    let channels = connector.connect(&endpoint).await.map_err(|error| {
        error!(endpoint = %endpoint, "connection failed: {}", error);
        error
    })?;

    let connection = Connection::spawn(channels);

    info!(endpoint = %endpoint, "connection open");

    Ok(connection)
}
