use crate::model::{Invoice, User};
use serde::{Deserialize, Serialize};

/// Things that can happen to the store
///
/// Decoded from `{"type": "SET_USER", "user": ...}` style objects. Any other `type`
/// decodes to [`Action::Unrecognized`], which leaves the state as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// A user logged in or out
    SetUser { user: Option<User> },

    /// An invoice was created or cleared
    SetInvoice { invoice: Option<Invoice> },

    /// Placeholder text changed
    SetDummyText {
        #[serde(rename = "dummyText")]
        dummy_text: String,
    },

    #[serde(other)]
    Unrecognized,
}

impl Action {
    pub fn from_json(json: &str) -> Result<Action, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetUser { .. } => "SET_USER",
            Action::SetInvoice { .. } => "SET_INVOICE",
            Action::SetDummyText { .. } => "SET_DUMMY_TEXT",
            Action::Unrecognized => "UNRECOGNIZED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"type": "SET_DUMMY_TEXT", "dummyText": "hi"}"#, Action::SetDummyText { dummy_text: "hi".into() })]
    #[case(r#"{"type": "SET_USER", "user": null}"#, Action::SetUser { user: None })]
    #[case(r#"{"type": "SET_INVOICE"}"#, Action::SetInvoice { invoice: None })]
    #[case(r#"{"type": "SET_LOGIN_URL", "loginURL": "x"}"#, Action::Unrecognized)]
    fn actions_decode_from_tagged_json(#[case] json: &str, #[case] expected: Action) {
        assert_eq!(expected, Action::from_json(json).unwrap());
    }

    #[test]
    fn user_payload_decodes() {
        let action = Action::from_json(
            r#"{"type": "SET_USER", "user": {"jwt_token": "a", "refresh_token": "b", "expired_on": 10}}"#,
        )
        .unwrap();

        assert_eq!(
            Action::SetUser {
                user: Some(User {
                    jwt_token: "a".into(),
                    refresh_token: "b".into(),
                    expired_on: 10,
                })
            },
            action
        );
    }

    #[test]
    fn untagged_object_is_an_error() {
        assert!(Action::from_json(r#"{"dummyText": "hi"}"#).is_err());
    }
}
