//! Connection manager builder

use crate::{
    manager::ConnectionManager,
    transport::{Connector, WebSocketConnector},
};
use std::sync::Arc;

/// [`ConnectionManager`] builder.
///
/// Allows configuring the endpoint and the transport used to reach it.
/// Building never connects; the first call does.
///
/// # Example
/// ```rust, no_run
/// use lightning_rpc::ConnectionManager;
///
/// let manager = ConnectionManager::builder("example.com")
///     .use_port(8080)
///     .use_path("rpc")
///     .build();
/// ```
pub struct ClientBuilder {
    domain: String,
    secure_connection: bool,
    port: Option<u16>,
    path: Option<String>,
    query_string: Option<String>,
    connector: Option<Arc<dyn Connector>>,
}

impl ClientBuilder {
    pub fn new(domain: impl ToString) -> Self {
        ClientBuilder {
            domain: domain.to_string(),
            secure_connection: true,
            port: None,
            path: None,
            query_string: None,
            connector: None,
        }
    }

    /// Specifies port on the server to connect to.
    pub fn use_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// If used, client will use unencrypted connection
    ///
    /// WS will be used instead of WSS.
    /// **Use only when necessary and for local development.**
    pub fn use_unencrypted_connection(mut self) -> Self {
        self.secure_connection = false;
        self
    }

    /// Specifies path of the endpoint on the server, without the leading `/`.
    pub fn use_path(mut self, path: impl ToString) -> Self {
        self.path = Some(path.to_string());
        self
    }

    /// Specifies query string to attach to the WebSocket handshake.
    pub fn use_query_string(mut self, query: impl ToString) -> Self {
        self.query_string = Some(query.to_string());
        self
    }

    /// Replaces the WebSocket transport.
    pub fn use_connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    pub fn build(self) -> ConnectionManager {
        let endpoint = self.get_endpoint();
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WebSocketConnector::new()));

        ConnectionManager::new(endpoint, connector)
    }

    fn get_ws_scheme(&self) -> &str {
        if self.secure_connection {
            "wss"
        } else {
            "ws"
        }
    }

    fn get_domain_with_path(&self) -> String {
        match (&self.path, &self.port) {
            (None, None) => self.domain.clone(),
            (None, Some(port)) => format!("{}:{}", self.domain, port),
            (Some(path), None) => format!("{}/{}", self.domain, path),
            (Some(path), Some(port)) => format!("{}:{}/{}", self.domain, port, path),
        }
    }

    fn get_endpoint(&self) -> String {
        let base = format!("{}://{}", self.get_ws_scheme(), self.get_domain_with_path());
        match &self.query_string {
            Some(query) if !query.is_empty() => format!("{}?{}", base, query),
            _ => base,
        }
    }
}

/// Points at `ws://localhost:8000`, where the lightning backend listens by default.
impl Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder::new("localhost")
            .use_port(8000)
            .use_unencrypted_connection()
    }
}
