use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};

use educa::logging::init_tracing;
use educa::metrics::{init_metrics, metrics_app};
use educa::router::init_router;
use educa::state::init_app_state;
use educa_config::env_flag;

const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

fn env_port(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    init_tracing().context("failed to initialize logging")?;

    let state = init_app_state().await;

    if env_flag("RUN_MIGRATIONS", false) {
        educa_db::run_migrations(&state.db)
            .await
            .context("failed to run database migrations")?;
    }

    if let Some(handle) = init_metrics() {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], env_port("METRICS_PORT", 9090)));
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(metrics_addr).await {
                Ok(listener) => {
                    info!(address = %metrics_addr, "Metrics endpoint listening");
                    if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                        warn!(error = %e, "Metrics server stopped");
                    }
                }
                Err(e) => warn!(error = %e, address = %metrics_addr, "Could not bind metrics port"),
            }
        });
    }

    state.login_limiter.spawn_pruning(LIMITER_PRUNE_INTERVAL);

    let app = init_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], env_port("PORT", 3000)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(address = %addr, "Server running");
    info!("Swagger UI available at http://localhost:{}/swagger-ui", addr.port());
    info!("Scalar UI available at http://localhost:{}/scalar", addr.port());

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
