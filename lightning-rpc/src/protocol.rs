//! JSON-RPC 2.0 envelopes
//!
//! Outbound requests carry `{jsonrpc, method, params, id}`, notifications omit the `id`.
//! Inbound messages are either responses carrying `result` or `error` for a known `id`,
//! or requests and notifications pushed by the server.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;
use uuid::Uuid;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Request identifier used for correlation.
///
/// Requests sent by this client always use random UUID strings,
/// but the server is free to answer or push messages with numeric ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    String(String),
}

impl Id {
    pub fn random() -> Self {
        Id::String(Uuid::new_v4().to_string())
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Id::Number(number) => write!(f, "{}", number),
            Id::String(string) => write!(f, "{}", string),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Number(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::String(value.to_owned())
    }
}

/// Parameters of a call, either by position or by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Params {
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Positional(values) => values.is_empty(),
            Params::Named(values) => values.is_empty(),
        }
    }

    /// Argument at `position` when positional, `name` when named.
    pub fn get(&self, position: usize, name: &str) -> Option<&Value> {
        match self {
            Params::Positional(values) => values.get(position),
            Params::Named(values) => values.get(name),
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(values: Map<String, Value>) -> Self {
        Params::Named(values)
    }
}

/// Sent by the client to invoke a remote method. Without an `id` it is a notification.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    jsonrpc: &'static str,
    method: String,
    params: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Id>,
}

impl Request {
    pub fn new(method: impl ToString, params: Params, id: Id) -> Self {
        Request {
            jsonrpc: JSONRPC_VERSION,
            method: method.to_string(),
            params,
            id: Some(id),
        }
    }

    pub fn notification(method: impl ToString, params: Params) -> Self {
        Request {
            jsonrpc: JSONRPC_VERSION,
            method: method.to_string(),
            params,
            id: None,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }
}

/// Error payload reported by the remote side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Well-known error code classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    Other(i64),
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            PARSE_ERROR => ErrorCode::ParseError,
            INVALID_REQUEST => ErrorCode::InvalidRequest,
            METHOD_NOT_FOUND => ErrorCode::MethodNotFound,
            INVALID_PARAMS => ErrorCode::InvalidParams,
            INTERNAL_ERROR => ErrorCode::InternalError,
            other => ErrorCode::Other(other),
        }
    }
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ErrorCode::ParseError => PARSE_ERROR,
            ErrorCode::InvalidRequest => INVALID_REQUEST,
            ErrorCode::MethodNotFound => METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => INVALID_PARAMS,
            ErrorCode::InternalError => INTERNAL_ERROR,
            ErrorCode::Other(code) => *code,
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::ParseError => write!(f, "parse error"),
            ErrorCode::InvalidRequest => write!(f, "invalid request"),
            ErrorCode::MethodNotFound => write!(f, "method not found"),
            ErrorCode::InvalidParams => write!(f, "invalid params"),
            ErrorCode::InternalError => write!(f, "internal error"),
            ErrorCode::Other(code) => write!(f, "error {}", code),
        }
    }
}

/// Request or notification pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub method: String,
    pub params: Option<Params>,
    pub id: Option<Id>,
}

pub(crate) enum Inbound {
    Response {
        id: Option<Id>,
        outcome: Result<Value, ErrorObject>,
    },
    Notification(Notification),
    Invalid(&'static str),
}

#[derive(Deserialize)]
pub(crate) struct RoutingData {
    #[serde(default)]
    id: Option<Id>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Params>,
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

/// Keeps `"result": null` apart from a missing `result`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl From<RoutingData> for Inbound {
    fn from(data: RoutingData) -> Self {
        let RoutingData {
            id,
            method,
            params,
            result,
            error,
        } = data;

        if let Some(method) = method {
            return Inbound::Notification(Notification { method, params, id });
        }

        match (result, error) {
            (_, Some(error)) => Inbound::Response {
                id,
                outcome: Err(error),
            },
            (Some(result), None) => Inbound::Response {
                id,
                outcome: Ok(result),
            },
            (None, None) => Inbound::Invalid("message carries neither method, result nor error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn classify(value: Value) -> Inbound {
        match serde_json::from_value::<RoutingData>(value) {
            Ok(data) => data.into(),
            Err(_) => Inbound::Invalid("undecodable"),
        }
    }

    #[test]
    fn request_carries_version_method_params_and_id() {
        let request = Request::new("echo", vec![json!("echo text 1939")].into(), "1".into());

        let actual = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json!({
                "jsonrpc": "2.0",
                "method": "echo",
                "params": ["echo text 1939"],
                "id": "1"
            }),
            actual
        );
    }

    #[test]
    fn notification_omits_id_and_keeps_empty_params() {
        let request = Request::notification("ping", Params::default());

        let actual = serde_json::to_value(&request).unwrap();

        assert_eq!(json!({"jsonrpc": "2.0", "method": "ping", "params": []}), actual);
    }

    #[test]
    fn null_result_is_a_result() {
        let inbound = classify(json!({"jsonrpc": "2.0", "result": null, "id": 7}));

        match inbound {
            Inbound::Response { id, outcome } => {
                assert_eq!(Some(Id::Number(7)), id);
                assert_eq!(Value::Null, outcome.unwrap());
            }
            _ => panic!("expected response"),
        }
    }

    #[test]
    fn error_wins_over_result() {
        let inbound = classify(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32601, "message": "method not found"},
            "id": "a"
        }));

        match inbound {
            Inbound::Response { outcome, .. } => {
                let error = outcome.unwrap_err();
                assert_eq!(ErrorCode::MethodNotFound, ErrorCode::from(error.code));
            }
            _ => panic!("expected response"),
        }
    }

    #[test]
    fn message_with_method_is_a_notification() {
        let inbound = classify(json!({
            "jsonrpc": "2.0",
            "method": "feed",
            "params": {"feed_id": 1, "feed": []}
        }));

        match inbound {
            Inbound::Notification(notification) => {
                assert_eq!("feed", notification.method);
                assert_eq!(None, notification.id);
                assert_eq!(
                    Some(&json!(1)),
                    notification.params.as_ref().and_then(|p| p.get(0, "feed_id"))
                );
            }
            _ => panic!("expected notification"),
        }
    }

    #[test]
    fn empty_object_is_invalid() {
        assert!(matches!(classify(json!({"id": 1})), Inbound::Invalid(_)));
    }

    #[rstest]
    #[case(-32700, ErrorCode::ParseError)]
    #[case(-32600, ErrorCode::InvalidRequest)]
    #[case(-32601, ErrorCode::MethodNotFound)]
    #[case(-32602, ErrorCode::InvalidParams)]
    #[case(-32603, ErrorCode::InternalError)]
    #[case(-1, ErrorCode::Other(-1))]
    fn error_codes_round_trip(#[case] code: i64, #[case] expected: ErrorCode) {
        let actual = ErrorCode::from(code);

        assert_eq!(expected, actual);
        assert_eq!(code, actual.code());
    }
}
