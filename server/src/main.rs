use adsizer::{
    routes,
    setup::{setup_sentry, setup_tracing},
    AppState,
};
use color_eyre::eyre::WrapErr as _;
use tracing::info;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Initialize Sentry for error tracking
    let _sentry_guard = setup_sentry();

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?
        .block_on(async { run_application().await })
}

async fn run_application() -> color_eyre::Result<()> {
    setup_tracing("adsizer")?;

    println!("\n========== ADSIZER STARTING ==========");
    let app_state = AppState::from_env()?;

    if !is_feature_enabled("SERVER") {
        info!("Server Disabled");
        return Ok(());
    }

    run_server(app_state).await
}

async fn run_server(app_state: AppState) -> color_eyre::Result<()> {
    let port = app_state.config.port;
    let app = routes::routes(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .wrap_err_with(|| format!("Failed to bind port {port}"))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server exited with an error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Check if a feature is enabled based on environment variables
fn is_feature_enabled(feature: &str) -> bool {
    std::env::var(format!("{}_DISABLED", feature)).unwrap_or_else(|_| "false".to_string()) != "true"
}
