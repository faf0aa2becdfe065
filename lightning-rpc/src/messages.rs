use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// Frame exchanged between a [`Connection`](crate::Connection) and its transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Json(String),
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON error occured: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl ClientMessage {
    pub fn json<T>(value: &T) -> Result<ClientMessage, SerializationError>
    where
        T: ?Sized + Serialize,
    {
        Ok(ClientMessage::Json(serde_json::to_string(value)?))
    }

    pub fn deserialize<T>(&self) -> Result<T, SerializationError>
    where
        T: DeserializeOwned,
    {
        match self {
            ClientMessage::Json(value) => Ok(serde_json::from_str(value)?),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ClientMessage::Json(value) => value,
        }
    }
}

impl Display for ClientMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientMessage::Json(value) => write!(f, "{}", value),
        }
    }
}

pub fn to_json_value<T>(value: &T) -> Result<serde_json::Value, SerializationError>
where
    T: ?Sized + Serialize,
{
    Ok(serde_json::to_value(value)?)
}
