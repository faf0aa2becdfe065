use crate::model::{Invoice, User};
use serde::{Deserialize, Serialize};

/// Snapshot of the application state
///
/// Snapshots are never modified once published; every [`transition`](crate::transition)
/// builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub user: Option<User>,
    pub invoice: Option<Invoice>,
    #[serde(rename = "dummyText")]
    pub dummy_text: String,
    /// Written by `SET_INVOICE` instead of `invoice`.
    #[serde(rename = "loginURL", default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<Invoice>,
}

impl AppState {
    pub fn initial() -> Self {
        AppState::default()
    }
}
