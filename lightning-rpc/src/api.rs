//! Typed calls exposed by the lightning backend

use crate::{error::ClientError, manager::ConnectionManager, protocol::Notification};
use futures::{future, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::*;

pub const FEED_NOTIFICATION: &str = "feed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedType {
    FinalizedInvoices,
}

/// Batch of items pushed by the server for a selected feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedUpdate {
    pub feed_id: u64,
    pub feed: Vec<FeedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub invoice_id: i64,
    pub status: String,
}

/// Invoice issued by the backend, waiting to be paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedInvoice {
    pub invoice_id: i64,
    pub encoded_invoice: String,
    pub amount_requested: i64,
    pub exchange_rate: i64,
    pub expired_at: i64,
}

impl FeedUpdate {
    pub fn from_notification(notification: &Notification) -> Option<FeedUpdate> {
        if notification.method != FEED_NOTIFICATION {
            return None;
        }

        let params = serde_json::to_value(notification.params.as_ref()?).ok()?;
        match serde_json::from_value(params) {
            Ok(update) => Some(update),
            Err(error) => {
                warn!("malformed feed update ignored: {}", error);
                None
            }
        }
    }
}

/// Client for the methods the lightning backend serves.
#[derive(Clone)]
pub struct LightningApi {
    manager: ConnectionManager,
}

impl LightningApi {
    pub fn new(manager: ConnectionManager) -> Self {
        LightningApi { manager }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub async fn echo(&self, text: &str) -> Result<String, ClientError> {
        let response = self
            .manager
            .method("echo")
            .arg(text)?
            .invoke::<String>()
            .await?;

        debug!(response = %response, "echo");

        Ok(response)
    }

    /// Establishes the identity of this connection with a JWT.
    pub async fn authenticate(&self, jwt_token: &str) -> Result<(), ClientError> {
        let response = self
            .manager
            .method("authenticate")
            .arg(jwt_token)?
            .invoke::<String>()
            .await?;

        debug!(response = %response, "authenticated");

        Ok(())
    }

    /// Asks the server to start pushing `feed_type`; returns the feed id.
    pub async fn select_feed(&self, feed_type: FeedType) -> Result<u64, ClientError> {
        self.manager
            .method("select_feed")
            .named_arg("feed_type", feed_type)?
            .invoke::<u64>()
            .await
    }

    pub async fn cancel_feed(&self, feed_id: u64) -> Result<(), ClientError> {
        self.manager
            .method("cancel_feed")
            .named_arg("feed_id", feed_id)?
            .invoke_unit()
            .await
    }

    /// Requests a new invoice for `amount_requested`.
    ///
    /// Requires an authenticated connection. The backend answers once the invoice is encoded.
    pub async fn create_invoice(
        &self,
        amount_requested: i64,
    ) -> Result<CreatedInvoice, ClientError> {
        let invoice = self
            .manager
            .method("create_invoice")
            .named_arg("amount_requested", amount_requested)?
            .invoke::<CreatedInvoice>()
            .await?;

        debug!(invoice_id = invoice.invoice_id, "invoice created");

        Ok(invoice)
    }

    /// Feed updates pushed on the current connection from now on.
    pub async fn feed_updates(&self) -> Result<impl Stream<Item = FeedUpdate>, ClientError> {
        let connection = self.manager.connection().await?;

        Ok(connection
            .notifications()
            .into_stream()
            .filter_map(|notification| future::ready(FeedUpdate::from_notification(&notification))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{protocol::Params, transport::testing::TestConnector};
    use serde_json::json;

    fn api() -> (LightningApi, flume::Receiver<crate::transport::testing::TestRemote>) {
        let (connector, remotes) = TestConnector::new();
        let manager = ConnectionManager::builder("localhost")
            .use_connector(connector)
            .build();
        (LightningApi::new(manager), remotes)
    }

    #[tokio::test]
    async fn echo_returns_the_text() {
        let (api, remotes) = api();

        let call = tokio::spawn({
            let api = api.clone();
            async move { api.echo("echo text 1939").await }
        });
        remotes.recv_async().await.unwrap().echo();

        assert_eq!("echo text 1939", call.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn select_feed_passes_feed_type_by_name() {
        let (api, remotes) = api();

        let call = tokio::spawn({
            let api = api.clone();
            async move { api.select_feed(FeedType::FinalizedInvoices).await }
        });
        let remote = remotes.recv_async().await.unwrap();
        let request = remote.next_request().await;
        assert_eq!(json!({"feed_type": "finalized_invoices"}), request["params"]);
        remote.push(json!({"jsonrpc": "2.0", "result": 1, "id": request["id"]}));

        assert_eq!(1, call.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn feed_updates_are_decoded() {
        let (api, remotes) = api();

        let updates = api.feed_updates().await.unwrap();
        let remote = remotes.recv_async().await.unwrap();
        remote.push(json!({"jsonrpc": "2.0", "method": "other", "params": []}));
        remote.push(json!({
            "jsonrpc": "2.0",
            "method": "feed",
            "params": {"feed_id": 1, "feed": [{"invoice_id": 9, "status": "paid"}]}
        }));

        let update = updates.boxed().next().await.unwrap();
        assert_eq!(
            FeedUpdate {
                feed_id: 1,
                feed: vec![FeedItem {
                    invoice_id: 9,
                    status: "paid".into()
                }]
            },
            update
        );
    }

    #[tokio::test]
    async fn create_invoice_decodes_backend_reply() {
        let (api, remotes) = api();

        let call = tokio::spawn({
            let api = api.clone();
            async move { api.create_invoice(1000).await }
        });
        let remote = remotes.recv_async().await.unwrap();
        let request = remote.next_request().await;
        assert_eq!("create_invoice", request["method"]);
        assert_eq!(json!({"amount_requested": 1000}), request["params"]);
        remote.push(json!({
            "jsonrpc": "2.0",
            "result": {
                "invoice_id": 7,
                "encoded_invoice": "lnbc10u1...",
                "amount_requested": 1000,
                "exchange_rate": 3500,
                "expired_at": 1_700_003_600
            },
            "id": request["id"]
        }));

        assert_eq!(
            CreatedInvoice {
                invoice_id: 7,
                encoded_invoice: "lnbc10u1...".into(),
                amount_requested: 1000,
                exchange_rate: 3500,
                expired_at: 1_700_003_600,
            },
            call.await.unwrap().unwrap()
        );
    }

    #[tokio::test]
    async fn create_invoice_surfaces_backend_error() {
        let (api, remotes) = api();

        let call = tokio::spawn({
            let api = api.clone();
            async move { api.create_invoice(1000).await }
        });
        let remote = remotes.recv_async().await.unwrap();
        let request = remote.next_request().await;
        remote.push(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32600, "message": "JWT Token has expired"},
            "id": request["id"]
        }));

        let error = call.await.unwrap().unwrap_err();
        assert_eq!(Some(-32600), error.as_rpc().map(|rpc| rpc.code));
    }

    #[test]
    fn positional_feed_params_are_ignored() {
        let notification = Notification {
            method: FEED_NOTIFICATION.into(),
            params: Some(Params::Positional(vec![json!(1)])),
            id: None,
        };

        assert_eq!(None, FeedUpdate::from_notification(&notification));
    }
}
