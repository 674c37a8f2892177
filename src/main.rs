//! WRENCH server
//!
//! Boots the in-memory store (default community + default admin) and serves
//! the REST API. State lives only as long as the process.
//!
//! Usage:
//!   cargo run --bin wrench          # start server (WRENCH_BIND, default 0.0.0.0:8080)
//!   cargo run --bin wrench-cli -- bootstrap

use tokio::net::TcpListener;
use tracing::info;

use wrench::config::Config;
use wrench::rest::create_router;
use wrench::store::Store;
use wrench::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let _log_guard = init_tracing(&config);

    let store = Store::bootstrap(&config)?;
    let app = create_router(store);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, platform = %config.platform_name, "server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
}
