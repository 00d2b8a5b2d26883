use tracing_subscriber::EnvFilter;

use paddock_server::config::ServerConfig;
use paddock_server::{build_app, spawn_auto_refresh};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("PADDOCK_LOG_FORMAT").is_ok_and(|v| v == "json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = ServerConfig::load();
    config.validate();
    let listen_addr = config.listen_addr.clone();

    tracing::info!(
        addr = %listen_addr,
        source = %config.live_timing.url,
        "Paddock server starting"
    );

    let (app, state) = match build_app(config) {
        Ok(built) => built,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build snapshot source");
            std::process::exit(1);
        },
    };
    spawn_auto_refresh(state);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %listen_addr, error = %e, "Failed to bind");
            std::process::exit(1);
        },
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
