use serde::{Deserialize, Serialize};

/// Session credentials of the logged in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub jwt_token: String,
    pub refresh_token: String,
    pub expired_on: i64,
}

/// Billing record of a lightning invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_id: i64,
    pub status: String,
    pub encoded_invoice: String,
    pub created_at: i64,
    pub amount_requested: i64,
    pub exchange_rate: i64,
    pub expired_at: i64,
}
