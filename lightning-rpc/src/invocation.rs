//! Call builder

use crate::{
    error::ClientError,
    manager::ConnectionManager,
    messages,
    protocol::Params,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Request builder for the [`ConnectionManager`]
///
/// Arguments are either all positional ([`arg`](InvocationBuilder::arg))
/// or all named ([`named_arg`](InvocationBuilder::named_arg)).
pub struct InvocationBuilder<'a> {
    manager: &'a ConnectionManager,
    method: String,
    positional: Vec<Value>,
    named: Map<String, Value>,
}

impl<'a> InvocationBuilder<'a> {
    pub(crate) fn new(manager: &'a ConnectionManager, method: impl ToString) -> Self {
        InvocationBuilder {
            manager,
            method: method.to_string(),
            positional: Default::default(),
            named: Default::default(),
        }
    }

    /// Adds ordered argument to the call
    ///
    /// Order of arguments matters, they need to be passed in exactly the same order
    /// server expects them.
    ///
    /// # Example
    /// ```rust,no_run
    /// use lightning_rpc::ConnectionManager;
    ///
    /// # async fn function(manager: ConnectionManager) -> anyhow::Result<()> {
    /// let echoed = manager.method("echo")
    ///     .arg("echo text 1939")?
    ///     .invoke::<String>()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn arg<A: Serialize>(mut self, arg: A) -> Result<Self, ClientError> {
        if !self.named.is_empty() {
            return Err(ClientError::MixedArguments);
        }

        self.positional
            .push(messages::to_json_value(&arg).map_err(ClientError::malformed_request)?);

        Ok(self)
    }

    /// Adds argument passed by name
    pub fn named_arg<A: Serialize>(
        mut self,
        name: impl ToString,
        arg: A,
    ) -> Result<Self, ClientError> {
        if !self.positional.is_empty() {
            return Err(ClientError::MixedArguments);
        }

        self.named.insert(
            name.to_string(),
            messages::to_json_value(&arg).map_err(ClientError::malformed_request)?,
        );

        Ok(self)
    }

    /// Sends the call as a notification and does not expect any response
    ///
    /// As soon as the message is handed to the transport it returns to the caller.
    pub async fn send(self) -> Result<(), ClientError> {
        let (manager, method, params) = self.into_parts();
        manager.notify(method, params).await
    }

    /// Sends the call and awaits a response whose value is irrelevant
    pub async fn invoke_unit(self) -> Result<(), ClientError> {
        let (manager, method, params) = self.into_parts();
        manager.call(method, params).await?;
        Ok(())
    }

    /// Sends the call and awaits meaningful, single response
    ///
    /// The result has to deserialize into `T`, otherwise the call fails as malformed.
    pub async fn invoke<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let (manager, method, params) = self.into_parts();
        let result = manager.call(method, params).await?;

        serde_json::from_value(result).map_err(ClientError::malformed_response)
    }

    fn into_parts(self) -> (&'a ConnectionManager, String, Params) {
        let params = if self.named.is_empty() {
            Params::Positional(self.positional)
        } else {
            Params::Named(self.named)
        };

        (self.manager, self.method, params)
    }
}
