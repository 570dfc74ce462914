// HTTP API server binary: serves flattened rows, gallery cards, exports and
// cached images.

use anyhow::Result;
use catalog_flat::api::ApiServer;
use catalog_flat::logging::{init_tracing, SERVER_FILTER};
use catalog_flat::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing(SERVER_FILTER)?;

    tracing::info!("Initializing catalog API server");

    env_util::bootstrap_cli("api_server");

    let server = ApiServer::from_env()?;
    server.run().await?;

    Ok(())
}
