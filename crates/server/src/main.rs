use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::auth::TokenVerifier;
use server::config::Settings;
use server::http::router::build_router;
use server::state::AppState;
use service::CommentService;
use storage::{Db, Registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;
    if settings.uses_dev_secret() {
        warn!(
            "Using the built-in development JWT secret; set RECIPES_SECURITY__JWT_SECRET in production"
        );
    }

    let db = Db::new(&settings.database.comments_url)
        .await
        .context("Failed to open comment store")?;
    let registry = Arc::new(
        Registry::new(&settings.database.registry_url)
            .await
            .context("Failed to open recipe registry")?,
    );

    let comments = CommentService::new(db, registry.clone(), registry, settings.request_timeout());

    let state = AppState {
        comments,
        tokens: TokenVerifier::new(&settings.security.jwt_secret),
        max_page_size: settings.pagination.max_limit,
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
