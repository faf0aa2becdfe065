#![deny(unsafe_code)]

pub mod api;
mod builder;
mod connection;
mod error;
mod invocation;
mod manager;
mod messages;
pub mod protocol;
pub mod transport;

pub use self::{
    api::LightningApi,
    builder::ClientBuilder,
    connection::{Connection, LinkState},
    error::{ClientError, RpcError},
    invocation::InvocationBuilder,
    manager::{ConnectionManager, Phase},
    messages::{ClientMessage, SerializationError},
    transport::{ConnectionError, TransportError},
};
