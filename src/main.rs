use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use pawlens_analyzer::{
    ai_client::AiServiceClient,
    config::Config,
    pipeline::DiagnosisPipeline,
    repository::SupabaseRepository,
    routes::{router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("invalid configuration")?;

    let analyzer = AiServiceClient::new(config.ai_api_key.clone(), config.ai_base_url.clone(), config.ai_model.clone())?;
    tracing::info!(model = %config.ai_model, gateway = %config.ai_base_url, "Using AI gateway");

    let repository = SupabaseRepository::new(&config.supabase_url, config.supabase_service_role_key.clone());
    tracing::info!(url = %config.supabase_url, "Persisting diagnoses to Supabase");

    let state = AppState {
        pipeline: Arc::new(DiagnosisPipeline::new(Arc::new(analyzer), Arc::new(repository))),
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix, which is what container runtimes send.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, finishing in-flight analyses"),
        () = terminate => tracing::info!("Received SIGTERM, finishing in-flight analyses"),
    }
}
