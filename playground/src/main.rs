mod website;

use lightning_rpc::{ClientBuilder, LightningApi};
use lightning_store::StoreContext;
use tracing::*;
use tracing_subscriber::{self, filter, prelude::*};
use website::Website;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    set_tracing_subscriber();

    let store = StoreContext::default();
    let mut updates = store.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            info!(?state, "store updated");
        }
    });

    let api = LightningApi::new(ClientBuilder::default().build());
    info!(endpoint = api.manager().endpoint(), "starting");

    let mut page = Website::new(store, api);
    page.mount().await?;

    info!("rendered:\n{}", page.render());

    Ok(())
}

fn set_tracing_subscriber() {
    let targets_filter = filter::Targets::new()
        .with_target("lightning_rpc", Level::TRACE)
        .with_target("lightning_store", Level::DEBUG)
        .with_target("tokio_tungstenite", Level::DEBUG)
        .with_default(Level::INFO);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_line_number(false)
        .with_file(false)
        .without_time()
        .compact();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(targets_filter)
        .init();
}
