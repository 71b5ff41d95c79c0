mod api;
mod middleware;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use ordergate_shopify::AdminClient;

use crate::api::{build_app, AppState};
use crate::middleware::OriginPolicy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(ordergate_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if config.shop.is_none() || config.admin_token.is_none() {
        tracing::warn!("SHOP and/or ADMIN_TOKEN not set; lookups answer 500 until configured");
    }

    let policy = OriginPolicy::from_config(&config);
    if policy.is_permissive() {
        tracing::warn!("ALLOWED_ORIGIN is empty; accepting every origin (unsafe outside local testing)");
    }

    let client = AdminClient::from_config(&config)?.map(Arc::new);
    let app = build_app(
        AppState {
            config: Arc::clone(&config),
            client,
        },
        policy,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, backend = %config.backend, env = %config.env, "ordergate listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
