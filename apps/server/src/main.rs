use board_core::{AppConfigTrait, Environment};
use board_http::{
    build_router, init_logging, log_shutdown_info, log_startup_info, start_server, AppState,
    HttpConfig, LoggingConfig,
};
use board_share::WebSocketConfig;
use board_store::{JsonFileStore, StoreConfig};
use std::sync::Arc;
use tracing::info;

const SERVICE_NAME: &str = "board-server";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let environment = Environment::from_env()?;
    init_logging(
        LoggingConfig::for_environment(environment)
            .with_service(SERVICE_NAME, env!("CARGO_PKG_VERSION")),
    )?;

    let http_config = HttpConfig::from_env()?;
    let ws_config = WebSocketConfig::from_env()?;
    let store_config = StoreConfig::from_env()?;

    log_startup_info(SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", environment);
    info!("Documents stored in {}", store_config.data_file.display());

    let store = JsonFileStore::from_config(&store_config).await?;
    let state = AppState::new(Arc::new(store), ws_config);
    let router = build_router(state, &http_config)?;

    start_server(&http_config, router).await?;

    log_shutdown_info(SERVICE_NAME);
    Ok(())
}
