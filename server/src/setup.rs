use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};
use tracing_tree::HierarchicalLayer;

/// Install the global subscriber. `RUST_LOG` overrides the default `info` level.
pub fn setup_tracing(crate_name: &str) -> color_eyre::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{crate_name}=info,tower_http=debug")));

    let tree_layer = HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tree_layer)
        .with(sentry::integrations::tracing::layer())
        .try_init()?;

    Ok(())
}

/// Start the Sentry client when `SENTRY_DSN` is set. Keep the guard alive for the process lifetime.
pub fn setup_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    let environment = std::env::var("SENTRY_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    println!("Sentry enabled for environment {environment}");

    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(environment.into()),
            traces_sample_rate: 0.5,
            ..Default::default()
        },
    )))
}
