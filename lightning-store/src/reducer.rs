use crate::{action::Action, state::AppState};
use tracing::*;

/// Computes the snapshot following `state` once `action` happened.
///
/// The result is always a fresh copy of `state` with at most one field replaced.
/// `SET_INVOICE` writes `loginURL`, not `invoice`.
pub fn transition(state: &AppState, action: &Action) -> AppState {
    let mut result = state.clone();

    match action {
        Action::SetInvoice { invoice } => result.login_url = invoice.clone(),
        Action::SetUser { user } => result.user = user.clone(),
        Action::SetDummyText { dummy_text } => result.dummy_text = dummy_text.clone(),
        Action::Unrecognized => {}
    }

    debug!(action = action.kind(), state = ?result, "store update");

    result
}
