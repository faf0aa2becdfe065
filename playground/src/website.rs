use lightning_rpc::{ClientError, LightningApi};
use lightning_store::{Action, StoreContext};
use tracing::*;

pub const ECHO_TEXT: &str = "echo text 1939";

/// The landing page: a greeting, the store's placeholder text and the echoed text.
pub struct Website {
    store: StoreContext,
    api: LightningApi,
    some_text: String,
    echo: String,
}

impl Website {
    pub fn new(store: StoreContext, api: LightningApi) -> Self {
        Website {
            store,
            api,
            some_text: String::new(),
            echo: String::new(),
        }
    }

    /// Runs the page's first-render effects.
    pub async fn mount(&mut self) -> Result<(), ClientError> {
        if self.some_text.is_empty() {
            self.some_text = "some text".into();
        }

        if self.store.store().dummy_text.is_empty() {
            self.store.dispatch(Action::SetDummyText {
                dummy_text: "some dummy text".into(),
            });
        }

        self.echo = self.api.echo(ECHO_TEXT).await?;
        debug!(echo = %self.echo, "echo received");

        Ok(())
    }

    pub fn render(&self) -> String {
        format!(
            "Hello {}\n{}\n{}",
            self.some_text,
            self.store.store().dummy_text,
            self.echo
        )
    }
}
