use crate::{
    messages::SerializationError,
    protocol::{ErrorCode, ErrorObject},
    transport::{ConnectionError, TransportError},
};
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced to callers of the connection manager
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection could not be opened
    #[error("connection error")]
    Connection {
        #[from]
        source: ConnectionError,
    },

    /// Connection broke while the call was in flight
    #[error("transport error")]
    Transport {
        #[from]
        source: TransportError,
    },

    /// Remote side answered with an error payload
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Request could not be serialized
    #[error("malformed request")]
    MalformedRequest {
        #[source]
        source: SerializationError,
    },

    /// Response did not have the expected shape
    #[error("malformed response")]
    MalformedResponse {
        #[source]
        source: SerializationError,
    },

    #[error("positional and named arguments cannot be mixed in one call")]
    MixedArguments,
}

impl ClientError {
    pub fn malformed_request(error: impl Into<SerializationError>) -> Self {
        ClientError::MalformedRequest {
            source: error.into(),
        }
    }

    pub fn malformed_response(error: impl Into<SerializationError>) -> Self {
        ClientError::MalformedResponse {
            source: error.into(),
        }
    }

    /// Remote error payload, if this is one.
    pub fn as_rpc(&self) -> Option<&RpcError> {
        match self {
            ClientError::Rpc(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            ClientError::Transport {
                source: TransportError::Closed
            }
        )
    }
}

/// Error payload returned by the remote for a call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("remote returned {kind} ({code}): {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
    kind: ErrorCode,
}

impl RpcError {
    pub fn new(code: i64, message: impl ToString, data: Option<Value>) -> Self {
        RpcError {
            code,
            message: message.to_string(),
            data,
            kind: code.into(),
        }
    }

    pub fn kind(&self) -> ErrorCode {
        self.kind
    }
}

impl From<ErrorObject> for RpcError {
    fn from(error: ErrorObject) -> Self {
        RpcError::new(error.code, error.message, error.data)
    }
}
