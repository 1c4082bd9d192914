use std::sync::Arc;
use vcloud_common::prelude::Result;
use vcloud_common::telemetry;
use vcloud_server::app::App;
use vcloud_server::config::Config;
use vcloud_server::model::store::MemoryStore;
use vcloud_server::state::AppState;
use vcloud_server::vcloud::client::VcloudClient;

/// The main entry point for the server application.
///
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    let subscriber = telemetry::get_subscriber("info", std::io::stdout);
    telemetry::init_subscriber(subscriber)?;
    tracing::info!(target: "server", "Start!");

    let config = Config::from_env()?;
    let address = config.get_address()?;
    let app_state = AppState {
        store: Arc::new(MemoryStore::from_catalog(config.catalog.clone())),
        vcloud: Arc::new(VcloudClient::new(config.vcloud.clone())),
        token: Arc::new(config.token.clone()),
    };
    let app = App::build(app_state, address, &config.cors).await?;
    tracing::info!(target: "server", "Listening on '{}'\n", app.get_url()?);

    app.run().await
}
